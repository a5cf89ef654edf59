//! Review session coordination.
//!
//! [`ReviewCoordinator`] is an explicit, session-scoped context object over
//! the repository traits: it selects due cards, runs each rating through
//! the SM-2 scheduler, persists the updated card state, appends the
//! immutable review event, and keeps the session aggregates current.
//!
//! The coordinator holds no state of its own; everything round-trips
//! through the repositories between calls, so concurrent requests only
//! contend inside the store.

use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::models::{
    DueCards, NewReviewEvent, ReviewQuality, ReviewSession, ScheduleUpdate, SubmitOutcome,
};
use crate::scheduler::{compute_sm2, next_review_date};
use crate::traits::{HighlightRepository, ReviewEventRepository, SessionRepository};

/// Orchestrates one user's review flow against the backing store.
pub struct ReviewCoordinator<'a> {
    highlights: &'a dyn HighlightRepository,
    sessions: &'a dyn SessionRepository,
    events: &'a dyn ReviewEventRepository,
}

impl<'a> ReviewCoordinator<'a> {
    pub fn new(
        highlights: &'a dyn HighlightRepository,
        sessions: &'a dyn SessionRepository,
        events: &'a dyn ReviewEventRepository,
    ) -> Self {
        Self {
            highlights,
            sessions,
            events,
        }
    }

    /// Page of due cards plus the full due count.
    ///
    /// Selection predicate: `sr_due_at` is set and not in the future
    /// (inclusive boundary). Ordering: most overdue first. Repeated calls
    /// with no intervening submissions return identical results for a
    /// fixed clock.
    pub async fn due_cards(&self, user_id: Uuid, limit: i64) -> Result<DueCards> {
        let due = self.highlights.list_due(user_id, limit).await?;

        debug!(
            subsystem = "review",
            component = "coordinator",
            op = "list_due",
            user_id = %user_id,
            result_count = due.cards.len(),
            total_due = due.total_due,
            "Selected due cards"
        );
        Ok(due)
    }

    /// Start a session with a due-count snapshot taken by the caller.
    ///
    /// The snapshot is the number of cards the client actually fetched,
    /// which may be smaller than `total_due` at that instant.
    pub async fn start_session(&self, user_id: Uuid, total_cards: i32) -> Result<ReviewSession> {
        let session = self.sessions.create(user_id, total_cards.max(0)).await?;

        info!(
            subsystem = "review",
            component = "coordinator",
            op = "start_session",
            user_id = %user_id,
            session_id = %session.id,
            total_cards = session.total_cards,
            "Review session started"
        );
        Ok(session)
    }

    /// Submit one rating.
    ///
    /// The session must exist and belong to the caller; anything else is
    /// `SessionNotFound`, checked before any write. Effects then run in a
    /// fixed order: load card state, compute the SM-2 transition, persist
    /// the new schedule (`sr_due_at` = now + new interval), append the
    /// review event, then bump the session aggregates. The first failing
    /// step aborts the request; earlier writes are not rolled back.
    ///
    /// A session whose `cards_reviewed` reaches its snapshot is stamped
    /// complete, but later submissions are still accepted; clients that
    /// fetched a partial page keep reviewing against the same session.
    pub async fn submit(
        &self,
        user_id: Uuid,
        session_id: Uuid,
        highlight_id: Uuid,
        quality: ReviewQuality,
    ) -> Result<SubmitOutcome> {
        // A session owned by someone else behaves exactly like a missing
        // one, same as highlights.
        let session = self.sessions.fetch(session_id).await?;
        if session.user_id != user_id {
            return Err(Error::SessionNotFound(session_id));
        }

        let highlight = self.highlights.fetch(user_id, highlight_id).await?;

        let outcome = compute_sm2(
            quality,
            highlight.sr_repetitions,
            highlight.sr_ease_factor,
            highlight.sr_interval_days,
        );
        let due_at = next_review_date(outcome.interval_days);

        self.highlights
            .update_schedule(
                user_id,
                highlight_id,
                &ScheduleUpdate {
                    interval_days: outcome.interval_days,
                    ease_factor: outcome.ease_factor,
                    repetitions: outcome.repetitions,
                    status: outcome.status,
                    due_at,
                },
            )
            .await?;

        self.events
            .append(NewReviewEvent {
                session_id,
                user_id,
                highlight_id,
                quality: quality.value(),
                new_interval_days: outcome.interval_days,
                new_ease_factor: outcome.ease_factor,
                new_status: outcome.status,
            })
            .await?;

        let session = self
            .sessions
            .record_review(session_id, quality.is_correct())
            .await?;

        if session.completed_at_utc.is_none()
            && session.total_cards > 0
            && session.cards_reviewed >= session.total_cards
        {
            self.sessions.mark_completed(session_id).await?;
            info!(
                subsystem = "review",
                component = "coordinator",
                op = "complete_session",
                session_id = %session_id,
                cards_reviewed = session.cards_reviewed,
                cards_correct = session.cards_correct,
                "Review session complete"
            );
        }

        debug!(
            subsystem = "review",
            component = "coordinator",
            op = "submit",
            session_id = %session_id,
            highlight_id = %highlight_id,
            quality = quality.value(),
            new_interval_days = outcome.interval_days,
            new_status = %outcome.status,
            "Rating recorded"
        );

        Ok(SubmitOutcome {
            new_interval: outcome.interval_days,
            new_ease_factor: outcome.ease_factor,
            new_repetitions: outcome.repetitions,
            new_status: outcome.status,
            next_review_date: due_at,
        })
    }
}
