//! Property-based tests for the poll service

use std::collections::HashMap;

use pollroom::backend::polls::PollService;
use pollroom::shared::{PollError, ServerEvent};
use proptest::prelude::*;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// Any mix of valid, invalid and repeated votes leaves counts that match
    /// the first valid vote of each voter
    #[test]
    fn test_counts_match_first_valid_vote_per_voter(
        votes in prop::collection::vec((0usize..6, -1i64..4), 1..40),
    ) {
        runtime().block_on(async {
            let service = PollService::default();
            let options: Vec<String> = ["a", "b", "c"].iter().map(|s| s.to_string()).collect();
            let poll = service.create_poll("Pick", &options).await.unwrap();

            let mut expected = [0u64; 3];
            let mut first_votes: HashMap<usize, i64> = HashMap::new();
            let mut last_total = 0;

            for (voter, option) in votes {
                let voter_id = format!("voter_{}", voter);
                let result = service.submit_vote(&poll.share_id, option, &voter_id).await;

                match (first_votes.get(&voter), (0..3).contains(&option)) {
                    (Some(first), _) => {
                        let err = result.unwrap_err();
                        let duplicate = PollError::duplicate_vote(*first);
                        prop_assert_eq!(err.as_poll_error(), Some(&duplicate));
                    }
                    (None, true) => {
                        let outcome = result.unwrap();
                        prop_assert_eq!(outcome.voted_option_index, option);
                        first_votes.insert(voter, option);
                        expected[option as usize] += 1;
                    }
                    (None, false) => {
                        let err = result.unwrap_err();
                        prop_assert!(
                            matches!(err.as_poll_error(), Some(PollError::InvalidOption { .. })),
                            "expected an invalid option error, got {:?}",
                            err
                        );
                    }
                }

                let snapshot = service.snapshot(&poll.share_id).await.unwrap();
                prop_assert!(snapshot.total_votes >= last_total);
                last_total = snapshot.total_votes;
            }

            let snapshot = service.snapshot(&poll.share_id).await.unwrap();
            let counts: Vec<u64> = snapshot.options.iter().map(|o| o.votes).collect();
            prop_assert_eq!(counts, expected.to_vec());
            prop_assert_eq!(snapshot.total_votes, first_votes.len() as u64);
            Ok(())
        })?;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_distinct_voters_are_all_counted_in_order() {
    const VOTERS: usize = 200;

    let service = PollService::default();
    let options: Vec<String> = ["a", "b", "c", "d"].iter().map(|s| s.to_string()).collect();
    let poll = service.create_poll("Pick", &options).await.unwrap();
    let mut updates = service.rooms().subscribe(&poll.share_id);

    let mut tasks = Vec::new();
    for i in 0..VOTERS {
        let service = service.clone();
        let share_id = poll.share_id.clone();
        tasks.push(tokio::spawn(async move {
            service
                .submit_vote(&share_id, (i % 4) as i64, &format!("voter_{}", i))
                .await
        }));
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let snapshot = service.snapshot(&poll.share_id).await.unwrap();
    assert_eq!(snapshot.total_votes, VOTERS as u64);
    assert!(snapshot.options.iter().all(|o| o.votes == (VOTERS / 4) as u64));

    // Broadcasts leave in commit order: totals climb by exactly one.
    for expected in 1..=VOTERS as u64 {
        match updates.recv().await.unwrap() {
            ServerEvent::PollUpdated(update) => {
                assert_eq!(update.total_votes, expected);
                assert_eq!(update.options.iter().map(|o| o.votes).sum::<u64>(), expected);
            }
            other => panic!("Expected poll-updated, got {:?}", other),
        }
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_duplicates_count_once() {
    let service = PollService::default();
    let options: Vec<String> = ["a", "b"].iter().map(|s| s.to_string()).collect();
    let poll = service.create_poll("Pick", &options).await.unwrap();

    let mut tasks = Vec::new();
    for i in 0..50 {
        let service = service.clone();
        let share_id = poll.share_id.clone();
        tasks.push(tokio::spawn(async move {
            service.submit_vote(&share_id, i % 2, "same_voter").await.is_ok()
        }));
    }

    let mut accepted = 0;
    for task in tasks {
        if task.await.unwrap() {
            accepted += 1;
        }
    }

    assert_eq!(accepted, 1);
    assert_eq!(service.snapshot(&poll.share_id).await.unwrap().total_votes, 1);
}
