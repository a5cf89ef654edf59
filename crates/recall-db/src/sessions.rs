//! Review session repository implementation.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use recall_core::{Error, Result, ReviewSession, SessionRepository};

const SESSION_COLUMNS: &str =
    "id, user_id, total_cards, cards_reviewed, cards_correct, started_at_utc, completed_at_utc";

/// PostgreSQL implementation of [`SessionRepository`].
pub struct PgReviewSessionRepository {
    pool: Pool<Postgres>,
}

impl PgReviewSessionRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_session(row: &PgRow) -> Result<ReviewSession> {
    Ok(ReviewSession {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        total_cards: row.try_get("total_cards")?,
        cards_reviewed: row.try_get("cards_reviewed")?,
        cards_correct: row.try_get("cards_correct")?,
        started_at_utc: row.try_get("started_at_utc")?,
        completed_at_utc: row.try_get("completed_at_utc")?,
    })
}

#[async_trait]
impl SessionRepository for PgReviewSessionRepository {
    async fn create(&self, user_id: Uuid, total_cards: i32) -> Result<ReviewSession> {
        let row = sqlx::query(&format!(
            "INSERT INTO review_session (user_id, total_cards) \
             VALUES ($1, $2) \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(user_id)
        .bind(total_cards)
        .fetch_one(&self.pool)
        .await?;

        map_session(&row)
    }

    async fn fetch(&self, id: Uuid) -> Result<ReviewSession> {
        let row = sqlx::query(&format!(
            "SELECT {SESSION_COLUMNS} FROM review_session WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => map_session(&row),
            None => Err(Error::SessionNotFound(id)),
        }
    }

    async fn record_review(&self, id: Uuid, correct: bool) -> Result<ReviewSession> {
        // Single-statement increment: concurrent submissions to the same
        // session cannot lose a count.
        let row = sqlx::query(&format!(
            "UPDATE review_session \
             SET cards_reviewed = cards_reviewed + 1, \
                 cards_correct = cards_correct + CASE WHEN $2 THEN 1 ELSE 0 END \
             WHERE id = $1 \
             RETURNING {SESSION_COLUMNS}"
        ))
        .bind(id)
        .bind(correct)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => map_session(&row),
            None => Err(Error::SessionNotFound(id)),
        }
    }

    async fn mark_completed(&self, id: Uuid) -> Result<()> {
        // No-op if already stamped; completion is never cleared.
        sqlx::query(
            "UPDATE review_session SET completed_at_utc = now() \
             WHERE id = $1 AND completed_at_utc IS NULL",
        )
        .bind(id)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}
