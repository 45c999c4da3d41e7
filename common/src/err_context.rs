/// A module for attaching context to errors.

/// An error (E) together with a human readable context string.
pub struct ErrorContext<E>(pub String, pub E);

/// Extends `Result` with a `context` method turning the error side
/// into an `ErrorContext`.
pub trait ErrorContextExt<T, E> {
    fn context<C: AsRef<str> + 'static>(self, c: C) -> Result<T, ErrorContext<E>>;
}

impl<T, E> ErrorContextExt<T, E> for Result<T, E> {
    fn context<C: AsRef<str> + 'static>(self, c: C) -> Result<T, ErrorContext<E>> {
        let s = c.as_ref();
        self.map_err(|e| ErrorContext(s.into(), e))
    }
}
