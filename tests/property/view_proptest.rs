//! Property-based tests for the poll view reducer

use pollroom::client::{Effect, PollView, ViewAction};
use pollroom::shared::event::VoteAccepted;
use pollroom::shared::poll::{validate_new_poll, GetPollResponse};
use pollroom::shared::{Poll, PollError, PollOption, PollSnapshot, ServerEvent};
use proptest::prelude::*;

const SHARE_ID: &str = "aB3dE5fG7h";
const OPTIONS: usize = 3;

fn fresh_poll() -> Poll {
    let options: Vec<String> = (0..OPTIONS).map(|i| format!("option {}", i)).collect();
    Poll::new(SHARE_ID.to_string(), validate_new_poll("Pick one", &options).unwrap())
}

fn loaded_view(poll: Poll) -> PollView {
    let mut view = PollView::new(SHARE_ID);
    view.apply(ViewAction::SnapshotLoaded {
        response: GetPollResponse {
            poll,
            has_voted: false,
            voted_option_index: None,
        },
        local_vote: None,
    });
    view
}

fn snapshot(counts: &[u64]) -> PollSnapshot {
    PollSnapshot {
        share_id: SHARE_ID.to_string(),
        options: counts
            .iter()
            .enumerate()
            .map(|(i, votes)| PollOption {
                text: format!("option {}", i),
                votes: *votes,
            })
            .collect(),
        total_votes: counts.iter().sum(),
    }
}

/// Cumulative counts after each vote in `votes`
fn count_history(votes: &[usize]) -> Vec<Vec<u64>> {
    let mut counts = vec![0u64; OPTIONS];
    votes
        .iter()
        .map(|option| {
            counts[*option] += 1;
            counts.clone()
        })
        .collect()
}

fn action() -> impl Strategy<Value = ViewAction> {
    prop_oneof![
        (0..OPTIONS + 1).prop_map(ViewAction::Select),
        Just(ViewAction::SubmitVote),
        Just(ViewAction::ConnectionLost),
        Just(ViewAction::ConnectionRestored),
        (0..OPTIONS as i64).prop_map(|i| ViewAction::Server(ServerEvent::VoteSuccess(VoteAccepted {
            share_id: SHARE_ID.to_string(),
            voted_option_index: i,
        }))),
        (0..OPTIONS as i64).prop_map(|i| ViewAction::Server(ServerEvent::vote_error(
            SHARE_ID,
            &PollError::duplicate_vote(i)
        ))),
        Just(ViewAction::Server(ServerEvent::vote_error(
            SHARE_ID,
            &PollError::transport("connection reset")
        ))),
    ]
}

proptest! {
    #[test]
    fn test_pushed_counts_replace_local_counts(
        votes in prop::collection::vec(0..OPTIONS, 1..30),
    ) {
        let mut view = loaded_view(fresh_poll());
        let history = count_history(&votes);
        for counts in &history {
            view.apply(ViewAction::Server(ServerEvent::PollUpdated(snapshot(counts))));
        }

        let poll = view.poll().unwrap();
        let last = history.last().unwrap();
        let counts: Vec<u64> = poll.options.iter().map(|o| o.votes).collect();
        prop_assert_eq!(&counts, last);
        prop_assert_eq!(poll.total_votes, votes.len() as u64);
    }

    #[test]
    fn test_early_push_and_snapshot_keep_the_newer_counts(
        votes in prop::collection::vec(0..OPTIONS, 1..30),
        rest_at in any::<prop::sample::Index>(),
        push_at in any::<prop::sample::Index>(),
    ) {
        let history = count_history(&votes);
        let rest_counts = &history[rest_at.index(history.len())];
        let push_counts = &history[push_at.index(history.len())];

        let mut rest_poll = fresh_poll();
        rest_poll.apply_snapshot(&snapshot(rest_counts));

        let mut view = PollView::new(SHARE_ID);
        view.apply(ViewAction::Server(ServerEvent::PollData(snapshot(push_counts))));
        view.apply(ViewAction::SnapshotLoaded {
            response: GetPollResponse {
                poll: rest_poll,
                has_voted: false,
                voted_option_index: None,
            },
            local_vote: None,
        });

        let newer = std::cmp::max(rest_counts.iter().sum::<u64>(), push_counts.iter().sum::<u64>());
        let poll = view.poll().unwrap();
        prop_assert_eq!(poll.total_votes, newer);
        prop_assert_eq!(poll.counted_votes(), poll.total_votes);
    }

    #[test]
    fn test_voted_state_is_sticky(
        actions in prop::collection::vec(action(), 0..40),
    ) {
        let mut view = loaded_view(fresh_poll());
        for action in actions {
            let was_voted = view.has_voted();
            let effects = view.apply(action);

            let emits = effects.iter().filter(|e| matches!(e, Effect::EmitVote { .. })).count();
            if emits > 0 {
                prop_assert!(!was_voted, "emitted a vote after voting");
                prop_assert_eq!(emits, 1);
            }

            if was_voted {
                prop_assert!(view.has_voted(), "voted state was lost");
            }
            prop_assert_eq!(view.has_voted(), view.voted_option_index().is_some());
            if view.has_voted() {
                prop_assert!(view.pending_vote().is_none());
                prop_assert!(!view.can_vote());
            }
        }
    }
}
