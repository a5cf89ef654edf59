//! Append-only review-event log.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use recall_core::{NewReviewEvent, Result, ReviewEvent, ReviewEventRepository};

const EVENT_COLUMNS: &str = "id, session_id, user_id, highlight_id, quality, \
     new_interval_days, new_ease_factor, new_status, reviewed_at_utc";

/// PostgreSQL implementation of [`ReviewEventRepository`].
///
/// Rows are only ever inserted; there is no update or delete path.
pub struct PgReviewEventRepository {
    pool: Pool<Postgres>,
}

impl PgReviewEventRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_event(row: &PgRow) -> Result<ReviewEvent> {
    let status: String = row.try_get("new_status")?;
    Ok(ReviewEvent {
        id: row.try_get("id")?,
        session_id: row.try_get("session_id")?,
        user_id: row.try_get("user_id")?,
        highlight_id: row.try_get("highlight_id")?,
        quality: row.try_get("quality")?,
        new_interval_days: row.try_get("new_interval_days")?,
        new_ease_factor: row.try_get("new_ease_factor")?,
        new_status: status.parse()?,
        reviewed_at_utc: row.try_get("reviewed_at_utc")?,
    })
}

#[async_trait]
impl ReviewEventRepository for PgReviewEventRepository {
    async fn append(&self, event: NewReviewEvent) -> Result<Uuid> {
        let id: Uuid = sqlx::query_scalar(
            "INSERT INTO review_event \
                 (session_id, user_id, highlight_id, quality, \
                  new_interval_days, new_ease_factor, new_status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING id",
        )
        .bind(event.session_id)
        .bind(event.user_id)
        .bind(event.highlight_id)
        .bind(event.quality)
        .bind(event.new_interval_days)
        .bind(event.new_ease_factor)
        .bind(event.new_status.as_str())
        .fetch_one(&self.pool)
        .await?;

        Ok(id)
    }

    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<ReviewEvent>> {
        let rows = sqlx::query(&format!(
            "SELECT {EVENT_COLUMNS} FROM review_event \
             WHERE session_id = $1 \
             ORDER BY reviewed_at_utc ASC"
        ))
        .bind(session_id)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(map_event).collect()
    }
}
