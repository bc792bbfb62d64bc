/**
 * PostgreSQL Poll Store
 *
 * Database operations for persisting polls, options and vote records.
 *
 * # Vote Atomicity
 *
 * A vote runs in one transaction:
 * 1. `SELECT ... FOR UPDATE` on the poll row serializes votes per poll
 * 2. the option index is checked against the option count
 * 3. `INSERT ... ON CONFLICT DO NOTHING RETURNING` on the
 *    `(poll_id, voter_id)` primary key records the vote; an empty result
 *    means the voter already voted, and the transaction is rolled back
 * 4. the option counter and `total_votes` are incremented
 *
 * Schema lives in `migrations/` and is applied at startup.
 */
use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::backend::error::BackendError;
use crate::shared::error::PollError;
use crate::shared::poll::{
    generate_share_id, validate_new_poll, validate_voter_id, GetPollResponse, Poll, PollOption,
    PollSnapshot,
};

use super::repository::VoteOutcome;

/// Attempts at finding a free share id before giving up
const SHARE_ID_ATTEMPTS: usize = 5;

#[derive(sqlx::FromRow)]
struct PollRow {
    id: Uuid,
    share_id: String,
    question: String,
    total_votes: i64,
    created_at: DateTime<Utc>,
}

#[derive(sqlx::FromRow)]
struct OptionRow {
    text: String,
    votes: i64,
}

fn count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

/// Load a poll with its options, ordered by position
async fn load_poll(conn: &mut PgConnection, share_id: &str) -> Result<Option<Poll>, sqlx::Error> {
    let row = sqlx::query_as::<_, PollRow>(
        r#"
        SELECT id, share_id, question, total_votes, created_at
        FROM polls
        WHERE share_id = $1
        "#,
    )
    .bind(share_id)
    .fetch_optional(&mut *conn)
    .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let options = sqlx::query_as::<_, OptionRow>(
        r#"
        SELECT text, votes
        FROM poll_options
        WHERE poll_id = $1
        ORDER BY position ASC
        "#,
    )
    .bind(row.id)
    .fetch_all(&mut *conn)
    .await?;

    Ok(Some(Poll {
        id: row.id,
        share_id: row.share_id,
        question: row.question,
        options: options
            .into_iter()
            .map(|o| PollOption {
                text: o.text,
                votes: count(o.votes),
            })
            .collect(),
        total_votes: count(row.total_votes),
        created_at: row.created_at,
    }))
}

/// Poll store backed by PostgreSQL
#[derive(Debug, Clone)]
pub struct PgPollStore {
    pool: PgPool,
}

impl PgPollStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_poll(&self, question: &str, options: &[String]) -> Result<Poll, BackendError> {
        let input = validate_new_poll(question, options)?;

        for _ in 0..SHARE_ID_ATTEMPTS {
            let poll = Poll::new(generate_share_id(), input.clone());
            let mut tx = self.pool.begin().await?;

            let inserted = sqlx::query(
                r#"
                INSERT INTO polls (id, share_id, question, total_votes, created_at)
                VALUES ($1, $2, $3, 0, $4)
                ON CONFLICT (share_id) DO NOTHING
                "#,
            )
            .bind(poll.id)
            .bind(&poll.share_id)
            .bind(&poll.question)
            .bind(poll.created_at)
            .execute(&mut *tx)
            .await?;

            if inserted.rows_affected() == 0 {
                tracing::warn!("[Polls] Share id collision on {}, regenerating", poll.share_id);
                tx.rollback().await?;
                continue;
            }

            for (position, option) in poll.options.iter().enumerate() {
                sqlx::query(
                    r#"
                    INSERT INTO poll_options (poll_id, position, text, votes)
                    VALUES ($1, $2, $3, 0)
                    "#,
                )
                .bind(poll.id)
                .bind(position as i32)
                .bind(&option.text)
                .execute(&mut *tx)
                .await?;
            }

            tx.commit().await?;
            return Ok(poll);
        }

        Err(BackendError::handler(
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            "Could not allocate a share id",
        ))
    }

    pub async fn get_poll(
        &self,
        share_id: &str,
        voter_id: Option<&str>,
    ) -> Result<GetPollResponse, BackendError> {
        let mut conn = self.pool.acquire().await?;
        let poll = load_poll(&mut conn, share_id)
            .await?
            .ok_or_else(|| PollError::not_found(share_id))?;

        let voted_option_index = match voter_id {
            Some(voter_id) => sqlx::query_scalar::<_, i32>(
                r#"
                SELECT option_index
                FROM poll_votes
                WHERE poll_id = $1 AND voter_id = $2
                "#,
            )
            .bind(poll.id)
            .bind(voter_id)
            .fetch_optional(&mut *conn)
            .await?
            .map(i64::from),
            None => None,
        };

        Ok(GetPollResponse {
            poll,
            has_voted: voted_option_index.is_some(),
            voted_option_index,
        })
    }

    pub async fn cast_vote(
        &self,
        share_id: &str,
        option_index: i64,
        voter_id: &str,
    ) -> Result<VoteOutcome, BackendError> {
        let mut tx = self.pool.begin().await?;

        let poll_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id FROM polls WHERE share_id = $1 FOR UPDATE
            "#,
        )
        .bind(share_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| PollError::not_found(share_id))?;

        validate_voter_id(voter_id)?;

        let option_count = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COUNT(*) FROM poll_options WHERE poll_id = $1
            "#,
        )
        .bind(poll_id)
        .fetch_one(&mut *tx)
        .await?;

        let option_count = usize::try_from(option_count).unwrap_or(0);
        let position = usize::try_from(option_index)
            .ok()
            .filter(|p| *p < option_count)
            .ok_or_else(|| PollError::invalid_option(option_index, option_count))?;

        let inserted = sqlx::query_scalar::<_, i32>(
            r#"
            INSERT INTO poll_votes (poll_id, voter_id, option_index, voted_at)
            VALUES ($1, $2, $3, NOW())
            ON CONFLICT (poll_id, voter_id) DO NOTHING
            RETURNING option_index
            "#,
        )
        .bind(poll_id)
        .bind(voter_id)
        .bind(position as i32)
        .fetch_optional(&mut *tx)
        .await?;

        if inserted.is_none() {
            let existing = sqlx::query_scalar::<_, i32>(
                r#"
                SELECT option_index FROM poll_votes WHERE poll_id = $1 AND voter_id = $2
                "#,
            )
            .bind(poll_id)
            .bind(voter_id)
            .fetch_one(&mut *tx)
            .await?;
            tx.rollback().await?;
            return Err(PollError::duplicate_vote(i64::from(existing)).into());
        }

        sqlx::query(
            r#"
            UPDATE poll_options SET votes = votes + 1 WHERE poll_id = $1 AND position = $2
            "#,
        )
        .bind(poll_id)
        .bind(position as i32)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE polls SET total_votes = total_votes + 1 WHERE id = $1
            "#,
        )
        .bind(poll_id)
        .execute(&mut *tx)
        .await?;

        let poll = load_poll(&mut tx, share_id)
            .await?
            .ok_or_else(|| PollError::not_found(share_id))?;
        tx.commit().await?;

        Ok(VoteOutcome {
            poll,
            voted_option_index: option_index,
        })
    }

    pub async fn snapshot(&self, share_id: &str) -> Result<PollSnapshot, BackendError> {
        let mut conn = self.pool.acquire().await?;
        let poll = load_poll(&mut conn, share_id)
            .await?
            .ok_or_else(|| PollError::not_found(share_id))?;
        Ok(poll.snapshot())
    }
}
