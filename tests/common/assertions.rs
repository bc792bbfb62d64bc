//! Custom assertion macros and utilities
//!
//! Provides assertions over poll counts and error bodies with more
//! descriptive failure output.

/// Assert the per-option counts of a poll or snapshot, and that the total
/// matches their sum
#[macro_export]
macro_rules! assert_counts {
    ($poll:expr, [$($count:expr),* $(,)?]) => {
        match &$poll {
            poll => {
                let counts: Vec<u64> = poll.options.iter().map(|o| o.votes).collect();
                let expected: Vec<u64> = vec![$($count as u64),*];
                pretty_assertions::assert_eq!(counts, expected, "option counts");
                assert_eq!(
                    poll.total_votes,
                    counts.iter().sum::<u64>(),
                    "total_votes must equal the sum of option counts"
                );
            }
        }
    };
}

/// Assert that a result is ok and return the value
#[macro_export]
macro_rules! assert_ok {
    ($result:expr) => {
        match $result {
            Ok(value) => value,
            Err(e) => panic!("Expected Ok, got Err: {:?}", e),
        }
    };
}

/// Assert the `kind` and `status` of a REST error body
pub fn assert_error_body(body: &serde_json::Value, status: u16, kind: &str) {
    assert_eq!(body["status"], status, "unexpected status in {}", body);
    assert_eq!(body["kind"], kind, "unexpected kind in {}", body);
    assert!(
        body["error"].as_str().is_some_and(|e| !e.is_empty()),
        "error body without a message: {}",
        body
    );
}

#[cfg(test)]
mod tests {
    use pollroom::shared::poll::validate_new_poll;
    use pollroom::shared::Poll;

    #[test]
    fn test_assert_counts_reads_its_argument_once() {
        let options = super::super::opts(&["Coffee", "Tea"]);
        let mut reads = 0;
        let mut next_update = || {
            reads += 1;
            let mut poll = Poll::new(
                "abcdefghij".to_string(),
                validate_new_poll("Coffee or tea?", &options).unwrap(),
            );
            poll.record_vote(reads - 1);
            poll
        };

        assert_counts!(next_update(), [1, 0]);
        assert_eq!(reads, 1);
    }
}
