//! Highlight repository implementation.

use async_trait::async_trait;
use chrono::Utc;
use sqlx::postgres::PgRow;
use sqlx::{Pool, Postgres, Row};
use uuid::Uuid;

use recall_core::scheduler::INITIAL_EASE_FACTOR;
use recall_core::{
    CreateHighlightRequest, DueCards, Error, Highlight, HighlightRepository, Result,
    ScheduleUpdate,
};

const HIGHLIGHT_COLUMNS: &str = "id, user_id, document_id, content, note, color, \
     created_at_utc, sr_due_at, sr_interval_days, sr_ease_factor, sr_repetitions, sr_status";

/// PostgreSQL implementation of [`HighlightRepository`].
pub struct PgHighlightRepository {
    pool: Pool<Postgres>,
}

impl PgHighlightRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

fn map_highlight(row: &PgRow) -> Result<Highlight> {
    let status: String = row.try_get("sr_status")?;
    Ok(Highlight {
        id: row.try_get("id")?,
        user_id: row.try_get("user_id")?,
        document_id: row.try_get("document_id")?,
        content: row.try_get("content")?,
        note: row.try_get("note")?,
        color: row.try_get("color")?,
        created_at_utc: row.try_get("created_at_utc")?,
        sr_due_at: row.try_get("sr_due_at")?,
        sr_interval_days: row.try_get("sr_interval_days")?,
        sr_ease_factor: row.try_get("sr_ease_factor")?,
        sr_repetitions: row.try_get("sr_repetitions")?,
        sr_status: status.parse()?,
    })
}

#[async_trait]
impl HighlightRepository for PgHighlightRepository {
    async fn insert(&self, user_id: Uuid, req: CreateHighlightRequest) -> Result<Highlight> {
        // New highlights enter the rotation immediately: status 'new',
        // due now, interval 0, ease 2.5, repetitions 0.
        let row = sqlx::query(&format!(
            "INSERT INTO highlight \
                 (user_id, document_id, content, note, color, \
                  sr_due_at, sr_interval_days, sr_ease_factor, sr_repetitions, sr_status) \
             VALUES ($1, $2, $3, $4, $5, $6, 0, $7, 0, 'new') \
             RETURNING {HIGHLIGHT_COLUMNS}"
        ))
        .bind(user_id)
        .bind(req.document_id)
        .bind(&req.content)
        .bind(&req.note)
        .bind(&req.color)
        .bind(Utc::now())
        .bind(INITIAL_EASE_FACTOR)
        .fetch_one(&self.pool)
        .await?;

        map_highlight(&row)
    }

    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Highlight> {
        let row = sqlx::query(&format!(
            "SELECT {HIGHLIGHT_COLUMNS} FROM highlight WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        match row {
            Some(row) => map_highlight(&row),
            None => Err(Error::HighlightNotFound(id)),
        }
    }

    async fn update_schedule(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &ScheduleUpdate,
    ) -> Result<()> {
        let result = sqlx::query(
            "UPDATE highlight \
             SET sr_interval_days = $3, sr_ease_factor = $4, sr_repetitions = $5, \
                 sr_status = $6, sr_due_at = $7 \
             WHERE id = $1 AND user_id = $2",
        )
        .bind(id)
        .bind(user_id)
        .bind(update.interval_days)
        .bind(update.ease_factor)
        .bind(update.repetitions)
        .bind(update.status.as_str())
        .bind(update.due_at)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::HighlightNotFound(id));
        }
        Ok(())
    }

    async fn list_due(&self, user_id: Uuid, limit: i64) -> Result<DueCards> {
        // Inclusive boundary: a card due exactly "now" is selected.
        let rows = sqlx::query(&format!(
            "SELECT {HIGHLIGHT_COLUMNS} FROM highlight \
             WHERE user_id = $1 AND sr_due_at IS NOT NULL AND sr_due_at <= now() \
             ORDER BY sr_due_at ASC \
             LIMIT $2"
        ))
        .bind(user_id)
        .bind(limit.max(0))
        .fetch_all(&self.pool)
        .await?;

        let cards = rows
            .iter()
            .map(map_highlight)
            .collect::<Result<Vec<_>>>()?;

        // Full count, independent of the page size.
        let total_due: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM highlight \
             WHERE user_id = $1 AND sr_due_at IS NOT NULL AND sr_due_at <= now()",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(DueCards { cards, total_due })
    }
}
