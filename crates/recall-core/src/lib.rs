//! # recall-core
//!
//! Core types, traits, and abstractions for the recall review service.
//!
//! This crate provides the domain model shared by the other recall crates:
//! the SM-2 scheduling algorithm, the review-session coordinator, and the
//! repository traits that the PostgreSQL layer implements.

pub mod error;
pub mod logging;
pub mod models;
pub mod review;
pub mod scheduler;
pub mod traits;

// Re-export commonly used types at crate root
pub use error::{Error, Result};
pub use models::{
    ApiKey, CreateHighlightRequest, DueCards, Highlight, IssuedApiKey, NewReviewEvent,
    ReviewEvent, ReviewQuality, ReviewSession, ReviewStatus, ScheduleUpdate, SubmitOutcome,
};
pub use review::ReviewCoordinator;
pub use scheduler::{compute_sm2, next_review_date, Sm2Outcome};
pub use traits::{
    ApiKeyRepository, HighlightRepository, ReviewEventRepository, SessionRepository,
};
