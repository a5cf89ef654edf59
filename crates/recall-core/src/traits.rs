//! Repository trait definitions.
//!
//! These traits are the seam between the review pipeline and the backing
//! store. `recall-db` provides the PostgreSQL implementations; tests drive
//! the coordinator through in-memory fakes.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::{
    ApiKey, CreateHighlightRequest, DueCards, Highlight, IssuedApiKey, NewReviewEvent,
    ReviewEvent, ReviewSession, ScheduleUpdate,
};

/// Repository for highlights and their scheduling state.
///
/// Every operation is scoped to the owning user; a highlight belonging to a
/// different user behaves exactly like a missing one.
#[async_trait]
pub trait HighlightRepository: Send + Sync {
    /// Insert a new highlight, seeding its initial review state
    /// (status `new`, due immediately, interval 0, ease 2.5).
    async fn insert(&self, user_id: Uuid, req: CreateHighlightRequest) -> Result<Highlight>;

    /// Fetch a highlight by id, scoped to the owning user.
    async fn fetch(&self, user_id: Uuid, id: Uuid) -> Result<Highlight>;

    /// Write back the scheduling fields after a review submission.
    async fn update_schedule(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &ScheduleUpdate,
    ) -> Result<()>;

    /// List due highlights: `sr_due_at` non-null and not in the future,
    /// most overdue first. `total_due` is the full matching count,
    /// independent of `limit`.
    async fn list_due(&self, user_id: Uuid, limit: i64) -> Result<DueCards>;
}

/// Repository for review-session aggregates.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Create a session with a due-count snapshot and zeroed counters.
    async fn create(&self, user_id: Uuid, total_cards: i32) -> Result<ReviewSession>;

    /// Fetch a session by id.
    async fn fetch(&self, id: Uuid) -> Result<ReviewSession>;

    /// Record one rating: increments `cards_reviewed` and, when `correct`,
    /// `cards_correct`, atomically in the store. Returns the updated row.
    async fn record_review(&self, id: Uuid, correct: bool) -> Result<ReviewSession>;

    /// Stamp `completed_at_utc` if it is not already set.
    async fn mark_completed(&self, id: Uuid) -> Result<()>;
}

/// Append-only log of rating submissions.
#[async_trait]
pub trait ReviewEventRepository: Send + Sync {
    /// Append one event. Events are never mutated or deleted.
    async fn append(&self, event: NewReviewEvent) -> Result<Uuid>;

    /// List a session's events in submission order.
    async fn list_for_session(&self, session_id: Uuid) -> Result<Vec<ReviewEvent>>;
}

/// Bearer API keys resolving to an opaque user identity.
#[async_trait]
pub trait ApiKeyRepository: Send + Sync {
    /// Look up a bearer token. `Ok(None)` means the token is unknown.
    async fn validate_key(&self, token: &str) -> Result<Option<ApiKey>>;

    /// Issue a new key for a user.
    async fn create_key(&self, user_id: Uuid, label: &str) -> Result<IssuedApiKey>;
}
