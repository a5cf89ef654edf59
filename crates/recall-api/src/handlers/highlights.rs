//! Highlight HTTP handlers.
//!
//! Only the minimal lifecycle the review rotation needs: creation (which
//! seeds the initial scheduling state) and point reads. Everything else
//! about documents and highlights lives outside this service.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use recall_core::{CreateHighlightRequest, Highlight, HighlightRepository};

use crate::{ApiError, AppState, RequireUser};

/// Create a highlight. It enters the review rotation immediately:
/// status `new`, due now.
///
/// # Returns
/// - 201 Created with the stored highlight
/// - 400 if `content` is empty
pub async fn create_highlight(
    State(state): State<AppState>,
    user: RequireUser,
    Json(req): Json<CreateHighlightRequest>,
) -> Result<(StatusCode, Json<Highlight>), ApiError> {
    if req.content.trim().is_empty() {
        return Err(ApiError::BadRequest("content must not be empty".to_string()));
    }

    let highlight = state.db.highlights.insert(user.user_id, req).await?;
    Ok((StatusCode::CREATED, Json(highlight)))
}

/// Fetch one of the caller's highlights.
///
/// # Returns
/// - 200 OK with the highlight
/// - 404 if it does not exist or belongs to another user
pub async fn get_highlight(
    State(state): State<AppState>,
    user: RequireUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Highlight>, ApiError> {
    let highlight = state.db.highlights.fetch(user.user_id, id).await?;
    Ok(Json(highlight))
}
