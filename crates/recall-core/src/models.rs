//! Core data models for recall.
//!
//! These types are shared across all recall crates and represent the
//! domain entities of the review service.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::Error;

// =============================================================================
// REVIEW STATUS
// =============================================================================

/// Lifecycle status of a highlight in the review rotation.
///
/// Stored as lowercase text in the database.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum ReviewStatus {
    /// Created but never reviewed.
    New,
    /// In the initial short-interval ladder (repetitions 1-2).
    Learning,
    /// In the exponential-interval phase (repetitions >= 3).
    Review,
    /// Lapsed on the last review (quality < 3).
    Relearning,
    /// More than ten consecutive correct reviews.
    Graduated,
}

impl ReviewStatus {
    /// Database/text representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            ReviewStatus::New => "new",
            ReviewStatus::Learning => "learning",
            ReviewStatus::Review => "review",
            ReviewStatus::Relearning => "relearning",
            ReviewStatus::Graduated => "graduated",
        }
    }
}

impl std::fmt::Display for ReviewStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ReviewStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "new" => Ok(ReviewStatus::New),
            "learning" => Ok(ReviewStatus::Learning),
            "review" => Ok(ReviewStatus::Review),
            "relearning" => Ok(ReviewStatus::Relearning),
            "graduated" => Ok(ReviewStatus::Graduated),
            other => Err(Error::Internal(format!("unknown review status: {other}"))),
        }
    }
}

// =============================================================================
// REVIEW QUALITY
// =============================================================================

/// Self-reported recall grade submitted after reviewing a card.
///
/// Grades 0-2 are failures (hard reset), 3-5 are graded successes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewQuality {
    /// Complete blank, didn't remember at all.
    Blackout,
    /// Incorrect, but saw the answer.
    Wrong,
    /// Incorrect, but easy to recall now.
    Again,
    /// Correct with significant difficulty.
    Hard,
    /// Correct after hesitation.
    Good,
    /// Perfect recall with no hesitation.
    Easy,
}

impl ReviewQuality {
    /// Numeric grade (0-5).
    pub fn value(&self) -> i16 {
        match self {
            ReviewQuality::Blackout => 0,
            ReviewQuality::Wrong => 1,
            ReviewQuality::Again => 2,
            ReviewQuality::Hard => 3,
            ReviewQuality::Good => 4,
            ReviewQuality::Easy => 5,
        }
    }

    /// Whether this grade counts as a correct answer (quality >= 3).
    pub fn is_correct(&self) -> bool {
        self.value() >= 3
    }

    /// Short UI label for the grade button.
    pub fn label(&self) -> &'static str {
        match self {
            ReviewQuality::Blackout => "Blackout",
            ReviewQuality::Wrong => "Wrong",
            ReviewQuality::Again => "Again",
            ReviewQuality::Hard => "Hard",
            ReviewQuality::Good => "Good",
            ReviewQuality::Easy => "Easy",
        }
    }

    /// Display color (hex) for the grade button.
    pub fn color(&self) -> &'static str {
        match self {
            ReviewQuality::Blackout => "#EF4444",
            ReviewQuality::Wrong => "#F97316",
            ReviewQuality::Again => "#EAB308",
            ReviewQuality::Hard => "#6366F1",
            ReviewQuality::Good => "#10B981",
            ReviewQuality::Easy => "#22C55E",
        }
    }
}

impl TryFrom<i16> for ReviewQuality {
    type Error = Error;

    fn try_from(value: i16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(ReviewQuality::Blackout),
            1 => Ok(ReviewQuality::Wrong),
            2 => Ok(ReviewQuality::Again),
            3 => Ok(ReviewQuality::Hard),
            4 => Ok(ReviewQuality::Good),
            5 => Ok(ReviewQuality::Easy),
            other => Err(Error::InvalidInput(format!(
                "quality must be between 0 and 5, got {other}"
            ))),
        }
    }
}

// =============================================================================
// HIGHLIGHT
// =============================================================================

/// A user-owned text fragment clipped from a saved document, carrying its
/// spaced-repetition scheduling state (`sr_*` fields).
///
/// Scheduling state is mutated exclusively through the review pipeline;
/// `sr_due_at = None` means the highlight was taken out of the rotation.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct Highlight {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Source document, if the highlight was clipped from a saved article.
    pub document_id: Option<Uuid>,
    /// The highlighted text itself.
    pub content: String,
    /// Optional user annotation attached to the highlight.
    pub note: Option<String>,
    /// Highlight color in the reader UI.
    pub color: Option<String>,
    pub created_at_utc: DateTime<Utc>,
    /// Next review due timestamp; `None` removes the card from rotation.
    pub sr_due_at: Option<DateTime<Utc>>,
    /// Days until the next review after a correct answer.
    pub sr_interval_days: i32,
    /// Interval growth multiplier, floored at 1.3.
    pub sr_ease_factor: f64,
    /// Consecutive correct reviews since the last lapse.
    pub sr_repetitions: i32,
    pub sr_status: ReviewStatus,
}

impl Highlight {
    /// Due predicate: scheduled and not after `now`. The boundary is
    /// inclusive; a card due at exactly `now` is selectable.
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.sr_due_at.is_some_and(|at| at <= now)
    }
}

/// Request for creating a new highlight.
///
/// Scheduling state is not caller-controlled: new highlights always enter
/// the rotation as `new`, due immediately.
#[derive(Debug, Clone, Deserialize, utoipa::ToSchema)]
pub struct CreateHighlightRequest {
    pub document_id: Option<Uuid>,
    pub content: String,
    pub note: Option<String>,
    pub color: Option<String>,
}

/// Scheduling fields written back after a review submission.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleUpdate {
    pub interval_days: i32,
    pub ease_factor: f64,
    pub repetitions: i32,
    pub status: ReviewStatus,
    pub due_at: DateTime<Utc>,
}

/// A page of due cards plus the full due count.
///
/// `total_due` counts every card matching the due predicate, independent of
/// the page size, so the dashboard can report "N cards due" from a
/// single-card preview fetch.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct DueCards {
    pub cards: Vec<Highlight>,
    pub total_due: i64,
}

// =============================================================================
// REVIEW SESSION
// =============================================================================

/// Aggregate bookkeeping for one review session.
#[derive(Debug, Clone, Serialize, Deserialize, utoipa::ToSchema)]
pub struct ReviewSession {
    pub id: Uuid,
    pub user_id: Uuid,
    /// Due-count snapshot taken when the session was created.
    pub total_cards: i32,
    pub cards_reviewed: i32,
    /// Ratings with quality >= 3.
    pub cards_correct: i32,
    pub started_at_utc: DateTime<Utc>,
    /// Set when `cards_reviewed` reaches `total_cards`; never cleared.
    pub completed_at_utc: Option<DateTime<Utc>>,
}

// =============================================================================
// REVIEW EVENT
// =============================================================================

/// Immutable record of one rating submission. Write-once.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct ReviewEvent {
    pub id: Uuid,
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub highlight_id: Uuid,
    pub quality: i16,
    pub new_interval_days: i32,
    pub new_ease_factor: f64,
    pub new_status: ReviewStatus,
    pub reviewed_at_utc: DateTime<Utc>,
}

/// Payload for appending a review event.
#[derive(Debug, Clone)]
pub struct NewReviewEvent {
    pub session_id: Uuid,
    pub user_id: Uuid,
    pub highlight_id: Uuid,
    pub quality: i16,
    pub new_interval_days: i32,
    pub new_ease_factor: f64,
    pub new_status: ReviewStatus,
}

/// Result of a rating submission, in wire format.
#[derive(Debug, Clone, Serialize, utoipa::ToSchema)]
pub struct SubmitOutcome {
    pub new_interval: i32,
    pub new_ease_factor: f64,
    pub new_repetitions: i32,
    pub new_status: ReviewStatus,
    pub next_review_date: DateTime<Utc>,
}

// =============================================================================
// API KEYS
// =============================================================================

/// A validated API key resolving to an opaque user identity.
#[derive(Debug, Clone)]
pub struct ApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub created_at_utc: DateTime<Utc>,
}

/// A freshly issued API key. The token is only available at creation time;
/// the database stores it verbatim (single-user deployment, no hashing).
#[derive(Debug, Clone, Serialize)]
pub struct IssuedApiKey {
    pub id: Uuid,
    pub user_id: Uuid,
    pub label: String,
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_status_round_trips_through_text() {
        for status in [
            ReviewStatus::New,
            ReviewStatus::Learning,
            ReviewStatus::Review,
            ReviewStatus::Relearning,
            ReviewStatus::Graduated,
        ] {
            assert_eq!(ReviewStatus::from_str(status.as_str()).unwrap(), status);
        }
    }

    #[test]
    fn test_status_rejects_unknown_text() {
        assert!(ReviewStatus::from_str("suspended").is_err());
    }

    #[test]
    fn test_status_serde_is_lowercase() {
        let json = serde_json::to_string(&ReviewStatus::Relearning).unwrap();
        assert_eq!(json, "\"relearning\"");
    }

    #[test]
    fn test_quality_try_from_accepts_full_range() {
        for q in 0..=5i16 {
            assert_eq!(ReviewQuality::try_from(q).unwrap().value(), q);
        }
    }

    #[test]
    fn test_quality_try_from_rejects_out_of_range() {
        assert!(ReviewQuality::try_from(-1).is_err());
        assert!(ReviewQuality::try_from(6).is_err());
    }

    #[test]
    fn test_quality_correct_threshold() {
        assert!(!ReviewQuality::Again.is_correct());
        assert!(ReviewQuality::Hard.is_correct());
        assert!(ReviewQuality::Easy.is_correct());
    }

    fn highlight_due_at(due: Option<DateTime<Utc>>) -> Highlight {
        Highlight {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            document_id: None,
            content: "spacing effect".to_string(),
            note: None,
            color: None,
            created_at_utc: Utc::now(),
            sr_due_at: due,
            sr_interval_days: 0,
            sr_ease_factor: 2.5,
            sr_repetitions: 0,
            sr_status: ReviewStatus::New,
        }
    }

    #[test]
    fn test_due_boundary_is_inclusive_to_the_millisecond() {
        let now = Utc::now();

        // Exactly now: due. One millisecond later: not yet.
        assert!(highlight_due_at(Some(now)).is_due_at(now));
        assert!(!highlight_due_at(Some(now + chrono::Duration::milliseconds(1))).is_due_at(now));
        assert!(highlight_due_at(Some(now - chrono::Duration::milliseconds(1))).is_due_at(now));
    }

    #[test]
    fn test_unscheduled_highlight_is_never_due() {
        assert!(!highlight_due_at(None).is_due_at(Utc::now()));
    }

    #[test]
    fn test_quality_labels() {
        assert_eq!(ReviewQuality::Blackout.label(), "Blackout");
        assert_eq!(ReviewQuality::Easy.color(), "#22C55E");
    }
}
