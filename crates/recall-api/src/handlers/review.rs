//! Review HTTP handlers: due-card selection, session creation, and rating
//! submission.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use recall_core::{DueCards, ReviewCoordinator, ReviewQuality, ReviewSession, SubmitOutcome};

use crate::{ApiError, AppState, RequireUser};

/// Default page size for due-card fetches. The dashboard preview uses
/// `limit=1` and relies on `total_due` for the full count.
pub const DEFAULT_DUE_LIMIT: i64 = 20;

fn default_due_limit() -> i64 {
    DEFAULT_DUE_LIMIT
}

/// Query parameters for listing due cards.
#[derive(Debug, Deserialize)]
pub struct DueQuery {
    #[serde(default = "default_due_limit")]
    pub limit: i64,
}

/// List the caller's due cards, most overdue first.
///
/// # Returns
/// - 200 OK with `{ cards, total_due }`
/// - 401 without a valid API key
pub async fn list_due(
    State(state): State<AppState>,
    user: RequireUser,
    Query(query): Query<DueQuery>,
) -> Result<Json<DueCards>, ApiError> {
    let coordinator = ReviewCoordinator::new(
        &state.db.highlights,
        &state.db.sessions,
        &state.db.events,
    );
    let due = coordinator.due_cards(user.user_id, query.limit).await?;
    Ok(Json(due))
}

/// Request body for creating a review session.
#[derive(Debug, Default, Deserialize)]
pub struct CreateSessionRequest {
    /// Snapshot of how many cards the client fetched for this session.
    #[serde(default)]
    pub total_cards: i32,
}

/// Start a review session.
///
/// # Returns
/// - 201 Created with the fresh session (counters zeroed)
/// - 401 without a valid API key
pub async fn create_session(
    State(state): State<AppState>,
    user: RequireUser,
    Json(req): Json<CreateSessionRequest>,
) -> Result<(StatusCode, Json<ReviewSession>), ApiError> {
    let coordinator = ReviewCoordinator::new(
        &state.db.highlights,
        &state.db.sessions,
        &state.db.events,
    );
    let session = coordinator
        .start_session(user.user_id, req.total_cards)
        .await?;
    Ok((StatusCode::CREATED, Json(session)))
}

/// Request body for submitting a rating.
///
/// All three fields are required; they are optional here only so the
/// handler can reject incomplete bodies with 400 instead of a framework
/// deserialization rejection.
#[derive(Debug, Deserialize)]
pub struct SubmitRatingRequest {
    pub highlight_id: Option<Uuid>,
    pub quality: Option<i16>,
    pub session_id: Option<Uuid>,
}

/// Submit one rating for a card.
///
/// # Returns
/// - 200 OK with the new schedule and next review date
/// - 400 if `highlight_id`, `quality`, or `session_id` is missing, or the
///   quality is outside 0..=5
/// - 404 if the highlight does not resolve for the caller's identity
/// - 401 without a valid API key
pub async fn submit_rating(
    State(state): State<AppState>,
    user: RequireUser,
    Json(req): Json<SubmitRatingRequest>,
) -> Result<Json<SubmitOutcome>, ApiError> {
    let (Some(highlight_id), Some(quality), Some(session_id)) =
        (req.highlight_id, req.quality, req.session_id)
    else {
        return Err(ApiError::BadRequest(
            "highlight_id, quality, and session_id are required".to_string(),
        ));
    };

    // The scheduler itself never validates; grades are bounded here.
    let quality = ReviewQuality::try_from(quality)?;

    let coordinator = ReviewCoordinator::new(
        &state.db.highlights,
        &state.db.sessions,
        &state.db.events,
    );
    let outcome = coordinator
        .submit(user.user_id, session_id, highlight_id, quality)
        .await?;
    Ok(Json(outcome))
}
