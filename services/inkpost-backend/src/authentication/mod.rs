/// Keyed-hash tokens gating the unsubscribe action.
///
/// A token is the first 16 hex characters of HMAC-SHA256 over the
/// lowercased, trimmed address, keyed with a server-held secret. Tokens
/// are never stored; verification recomputes them on demand.
use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, Secret};
use sha2::Sha256;

const TOKEN_LEN: usize = 16;

pub fn issue_unsubscribe_token(secret: &Secret<String>, email: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.expose_secret().as_bytes())
        .expect("HMAC accepts keys of any size");
    mac.update(email.trim().to_lowercase().as_bytes());
    let digest = hex::encode(mac.finalize().into_bytes());
    digest[..TOKEN_LEN].to_string()
}

/// Checks a supplied token against a freshly recomputed one, with exact
/// string equality. Without a configured secret there is nothing to key
/// the hash with, so verification is skipped and unsubscribe is open.
/// That weak mode is intentional and documented in the settings.
pub fn verify_unsubscribe_token(
    secret: Option<&Secret<String>>,
    email: &str,
    token: Option<&str>,
) -> bool {
    let Some(secret) = secret else {
        return true;
    };
    match token {
        Some(token) => issue_unsubscribe_token(secret, email) == token,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    fn secret(s: &str) -> Secret<String> {
        Secret::new(s.to_string())
    }

    #[test]
    fn issued_tokens_should_be_deterministic() {
        let secret = secret("s3cret");
        let one = issue_unsubscribe_token(&secret, "jane@example.com");
        let two = issue_unsubscribe_token(&secret, "jane@example.com");
        assert_that(&one).is_equal_to(&two);
        assert_that(&one.len()).is_equal_to(16);
    }

    #[test]
    fn tokens_should_not_depend_on_address_case_or_whitespace() {
        let secret = secret("s3cret");
        let canonical = issue_unsubscribe_token(&secret, "jane@example.com");
        let shouty = issue_unsubscribe_token(&secret, "  Jane@Example.COM ");
        assert_that(&canonical).is_equal_to(&shouty);
    }

    #[test]
    fn changing_address_or_secret_should_change_the_token() {
        let one = issue_unsubscribe_token(&secret("s3cret"), "jane@example.com");
        let other_address = issue_unsubscribe_token(&secret("s3cret"), "john@example.com");
        let other_secret = issue_unsubscribe_token(&secret("other"), "jane@example.com");
        assert_that(&one).is_not_equal_to(&other_address);
        assert_that(&one).is_not_equal_to(&other_secret);
    }

    #[test]
    fn verification_should_reject_any_mutation_of_a_valid_token() {
        let secret = secret("s3cret");
        let token = issue_unsubscribe_token(&secret, "jane@example.com");

        assert_that(&verify_unsubscribe_token(
            Some(&secret),
            "jane@example.com",
            Some(&token),
        ))
        .is_true();

        // Flip each character in turn; none of the mutants may verify.
        for (i, c) in token.char_indices() {
            let replacement = if c == '0' { '1' } else { '0' };
            let mut mutated = token.clone();
            mutated.replace_range(i..i + 1, &replacement.to_string());
            assert_that(&verify_unsubscribe_token(
                Some(&secret),
                "jane@example.com",
                Some(&mutated),
            ))
            .is_false();
        }
    }

    #[test]
    fn missing_token_should_be_rejected_when_a_secret_is_configured() {
        let secret = secret("s3cret");
        assert_that(&verify_unsubscribe_token(
            Some(&secret),
            "jane@example.com",
            None,
        ))
        .is_false();
    }

    #[test]
    fn verification_should_be_skipped_without_a_secret() {
        assert_that(&verify_unsubscribe_token(None, "jane@example.com", None)).is_true();
        assert_that(&verify_unsubscribe_token(
            None,
            "jane@example.com",
            Some("whatever"),
        ))
        .is_true();
    }
}
