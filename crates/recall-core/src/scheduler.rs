//! SM-2 spaced-repetition scheduler.
//!
//! Pure numeric transform: given a card's current memory state and a recall
//! grade, compute the next interval, ease factor, repetition count, and
//! lifecycle status. No I/O, no clock access except [`next_review_date`],
//! and no input validation: callers bound `quality` via
//! [`ReviewQuality`](crate::models::ReviewQuality) and persist only states
//! this module previously produced.

use chrono::{DateTime, Duration, Utc};

use crate::models::{ReviewQuality, ReviewStatus};

/// Ease factor assigned to a highlight when it is created.
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Lower bound on the ease factor. Without a floor, repeated "Hard" grades
/// would drive intervals toward a degenerate daily grind.
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Interval (days) after the first successful review.
pub const FIRST_INTERVAL_DAYS: i32 = 1;

/// Interval (days) after the second successful review.
pub const SECOND_INTERVAL_DAYS: i32 = 6;

/// A card graduates once its repetition count exceeds this.
pub const GRADUATION_REPETITIONS: i32 = 10;

/// Updated memory state produced by one application of the algorithm.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sm2Outcome {
    pub interval_days: i32,
    pub ease_factor: f64,
    pub repetitions: i32,
    pub status: ReviewStatus,
}

/// Apply one review to a card's memory state.
///
/// Failure grades (quality < 3) hard-reset the card: interval back to one
/// day, repetitions to zero, status `relearning`, ease factor untouched.
/// Success grades bump the repetition count, adjust the ease factor with
/// the classical SM-2 formula (floored at [`MIN_EASE_FACTOR`]), and pick
/// the next interval from the 1 / 6 / `round(interval * ease)` ladder.
///
/// A repetition count above [`GRADUATION_REPETITIONS`] overrides the
/// computed status with `graduated`. A graduated card that later lapses
/// drops back to `relearning`, since the lapse resets its repetitions.
pub fn compute_sm2(
    quality: ReviewQuality,
    repetitions: i32,
    ease_factor: f64,
    interval_days: i32,
) -> Sm2Outcome {
    let mut outcome = if !quality.is_correct() {
        Sm2Outcome {
            interval_days: FIRST_INTERVAL_DAYS,
            ease_factor,
            repetitions: 0,
            status: ReviewStatus::Relearning,
        }
    } else {
        // Classical SM-2 ease update: quality 5 adds 0.1, quality 4 is
        // neutral, quality 3 subtracts up to ~0.14.
        let gap = f64::from(5 - quality.value());
        let new_ease = MIN_EASE_FACTOR.max(ease_factor + (0.1 - gap * (0.08 + gap * 0.02)));
        let new_repetitions = repetitions + 1;

        let (new_interval, status) = match new_repetitions {
            1 => (FIRST_INTERVAL_DAYS, ReviewStatus::Learning),
            2 => (SECOND_INTERVAL_DAYS, ReviewStatus::Learning),
            _ => (
                round_interval(f64::from(interval_days) * new_ease),
                ReviewStatus::Review,
            ),
        };

        Sm2Outcome {
            interval_days: new_interval,
            ease_factor: new_ease,
            repetitions: new_repetitions,
            status,
        }
    };

    if outcome.repetitions > GRADUATION_REPETITIONS {
        outcome.status = ReviewStatus::Graduated;
    }

    outcome
}

/// Round an interval to whole days, half away from zero. The scheduler
/// never produces fractional days.
fn round_interval(days: f64) -> i32 {
    days.round() as i32
}

/// Next due instant for a card: the current wall-clock instant plus
/// `interval_days` whole days.
///
/// Due comparisons are instant-vs-instant; there is no truncation to
/// midnight or timezone normalization.
pub fn next_review_date(interval_days: i32) -> DateTime<Utc> {
    Utc::now() + Duration::days(i64::from(interval_days))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn quality(q: i16) -> ReviewQuality {
        ReviewQuality::try_from(q).unwrap()
    }

    #[test]
    fn test_failure_resets_regardless_of_prior_state() {
        for q in 0..=2 {
            let outcome = compute_sm2(quality(q), 7, 2.8, 42);
            assert_eq!(outcome.interval_days, 1);
            assert_eq!(outcome.repetitions, 0);
            assert_eq!(outcome.status, ReviewStatus::Relearning);
            // Ease factor survives a lapse untouched.
            assert_eq!(outcome.ease_factor, 2.8);
        }
    }

    #[test]
    fn test_ease_floor_holds_for_all_success_grades() {
        for q in 3..=5 {
            for ease in [1.3, 1.31, 1.5, 2.0, 2.5, 3.0] {
                let outcome = compute_sm2(quality(q), 5, ease, 10);
                assert!(
                    outcome.ease_factor >= MIN_EASE_FACTOR,
                    "quality {} ease {} produced {}",
                    q,
                    ease,
                    outcome.ease_factor
                );
            }
        }
    }

    #[test]
    fn test_easy_never_decreases_ease() {
        for ease in [1.3, 1.8, 2.5, 3.2] {
            let outcome = compute_sm2(ReviewQuality::Easy, 3, ease, 15);
            assert!(outcome.ease_factor >= ease);
        }
    }

    #[test]
    fn test_quality_five_adds_a_tenth() {
        let outcome = compute_sm2(ReviewQuality::Easy, 0, 2.5, 0);
        assert!((outcome.ease_factor - 2.6).abs() < 1e-9);
    }

    #[test]
    fn test_quality_four_is_ease_neutral() {
        let outcome = compute_sm2(ReviewQuality::Good, 2, 2.5, 6);
        assert!((outcome.ease_factor - 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_quality_three_decreases_ease() {
        let outcome = compute_sm2(ReviewQuality::Hard, 2, 2.5, 6);
        assert!((outcome.ease_factor - 2.36).abs() < 1e-9);
    }

    #[test]
    fn test_repetition_ladder() {
        // Fresh card, first success.
        let first = compute_sm2(ReviewQuality::Good, 0, INITIAL_EASE_FACTOR, 0);
        assert_eq!(first.interval_days, 1);
        assert_eq!(first.repetitions, 1);
        assert_eq!(first.status, ReviewStatus::Learning);

        // Feed the output back in: second success.
        let second = compute_sm2(
            ReviewQuality::Good,
            first.repetitions,
            first.ease_factor,
            first.interval_days,
        );
        assert_eq!(second.interval_days, 6);
        assert_eq!(second.status, ReviewStatus::Learning);

        // Third success switches to the multiplicative phase.
        let third = compute_sm2(
            ReviewQuality::Good,
            second.repetitions,
            second.ease_factor,
            second.interval_days,
        );
        assert_eq!(
            third.interval_days,
            (6.0 * third.ease_factor).round() as i32
        );
        assert_eq!(third.status, ReviewStatus::Review);
    }

    #[test]
    fn test_interval_rounds_half_away_from_zero() {
        assert_eq!(round_interval(13.5), 14);
        assert_eq!(round_interval(13.49), 13);
        assert_eq!(round_interval(14.5), 15);
        assert_eq!(round_interval(-0.5), -1);
    }

    #[test]
    fn test_multiplicative_interval_growth() {
        // Third review of a card on the 6-day rung: 6 * ease, whole days.
        let outcome = compute_sm2(ReviewQuality::Hard, 2, 2.5, 6);
        assert_eq!(outcome.repetitions, 3);
        assert_eq!(outcome.interval_days, 14); // round(6 * 2.36)
        assert_eq!(outcome.status, ReviewStatus::Review);
    }

    #[test]
    fn test_graduation_on_eleventh_success() {
        let mut reps = 0;
        let mut ease = INITIAL_EASE_FACTOR;
        let mut interval = 0;
        let mut last_status = ReviewStatus::New;

        for _ in 0..11 {
            let outcome = compute_sm2(ReviewQuality::Good, reps, ease, interval);
            reps = outcome.repetitions;
            ease = outcome.ease_factor;
            interval = outcome.interval_days;
            last_status = outcome.status;
        }

        assert_eq!(reps, 11);
        assert_eq!(last_status, ReviewStatus::Graduated);
    }

    #[test]
    fn test_tenth_success_does_not_graduate() {
        let outcome = compute_sm2(ReviewQuality::Good, 9, 2.5, 60);
        assert_eq!(outcome.repetitions, 10);
        assert_eq!(outcome.status, ReviewStatus::Review);
    }

    #[test]
    fn test_graduated_card_lapses_back_to_relearning() {
        let outcome = compute_sm2(ReviewQuality::Blackout, 12, 2.7, 200);
        assert_eq!(outcome.repetitions, 0);
        assert_eq!(outcome.status, ReviewStatus::Relearning);
    }

    #[test]
    fn test_interval_is_at_least_one_after_any_success() {
        for q in 3..=5 {
            for reps in 0..6 {
                let outcome = compute_sm2(quality(q), reps, 2.5, reps.max(1));
                assert!(outcome.interval_days >= 1);
            }
        }
    }

    #[test]
    fn test_next_review_date_round_trip() {
        let interval = 6;
        let before = Utc::now();
        let due = next_review_date(interval);
        let after = Utc::now();

        let expected_low = before + Duration::days(6);
        let expected_high = after + Duration::days(6);
        assert!(due >= expected_low && due <= expected_high);
    }

    #[test]
    fn test_next_review_date_zero_interval_is_now() {
        let due = next_review_date(0);
        let skew = (due - Utc::now()).num_milliseconds().abs();
        assert!(skew < 1_000);
    }
}
