use common::err_context::ErrorContext;
use std::fmt;

use super::listener::Error as ListenerError;
use super::server::Error as ServerError;
use crate::domain::ports::secondary::{EmailError, PageError};
use crate::services::postgres::Error as PostgresError;

#[derive(Debug)]
pub enum Error {
    Listener {
        context: String,
        source: ListenerError,
    },
    Postgres {
        context: String,
        source: PostgresError,
    },
    Email {
        context: String,
        source: EmailError,
    },
    Site {
        context: String,
        source: PageError,
    },
    Router {
        context: String,
        source: ServerError,
    },
    Server {
        context: String,
        source: hyper::Error,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, fmt: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Listener { context, source } => {
                write!(fmt, "Could not build TCP listener: {context} | {source}")
            }
            Error::Postgres { context, source } => {
                write!(fmt, "Storage Error: {context} | {source}")
            }
            Error::Email { context, source } => {
                write!(fmt, "Email Error: {context} | {source}")
            }
            Error::Site { context, source } => {
                write!(fmt, "Site Error: {context} | {source}")
            }
            Error::Router { context, source } => {
                write!(fmt, "Router Error: {context} | {source}")
            }
            Error::Server { context, source } => {
                write!(fmt, "Application Server Error: {context} | {source}")
            }
        }
    }
}

impl std::error::Error for Error {}

impl From<ErrorContext<ListenerError>> for Error {
    fn from(err: ErrorContext<ListenerError>) -> Self {
        Error::Listener {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<PostgresError>> for Error {
    fn from(err: ErrorContext<PostgresError>) -> Self {
        Error::Postgres {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<EmailError>> for Error {
    fn from(err: ErrorContext<EmailError>) -> Self {
        Error::Email {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<PageError>> for Error {
    fn from(err: ErrorContext<PageError>) -> Self {
        Error::Site {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<ServerError>> for Error {
    fn from(err: ErrorContext<ServerError>) -> Self {
        Error::Router {
            context: err.0,
            source: err.1,
        }
    }
}

impl From<ErrorContext<hyper::Error>> for Error {
    fn from(err: ErrorContext<hyper::Error>) -> Self {
        Error::Server {
            context: err.0,
            source: err.1,
        }
    }
}
