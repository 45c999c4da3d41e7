use serde::{Deserialize, Serialize};

/// Accumulated result of one dispatch run. Created when the run starts,
/// mutated by the loop, returned once at the end. Never persisted.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DispatchOutcome {
    pub sent: u64,
    pub failed: u64,
    pub errors: Vec<DispatchFailure>,
}

/// One recipient the delivery service refused, kept as data rather than
/// propagated as an error: a bad address must not block the rest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DispatchFailure {
    pub email: String,
    pub error: String,
}

impl DispatchOutcome {
    pub fn record_sent(&mut self) {
        self.sent += 1;
    }

    pub fn record_failure(&mut self, email: &str, error: &str) {
        self.failed += 1;
        self.errors.push(DispatchFailure {
            email: email.to_string(),
            error: error.to_string(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use speculoos::prelude::*;

    #[test]
    fn failures_should_be_appended_in_order() {
        let mut outcome = DispatchOutcome::default();
        outcome.record_sent();
        outcome.record_failure("a@example.com", "mailbox full");
        outcome.record_sent();
        outcome.record_failure("b@example.com", "rejected");

        assert_that(&outcome.sent).is_equal_to(2);
        assert_that(&outcome.failed).is_equal_to(2);
        assert_that(&outcome.errors[0].email.as_str()).is_equal_to("a@example.com");
        assert_that(&outcome.errors[1].email.as_str()).is_equal_to("b@example.com");
    }
}
