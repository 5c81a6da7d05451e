//! SM-2 Review Scheduler Module
//!
//! Decides, per learner-topic pair, when the next review is due and how a
//! review outcome shifts difficulty and mastery.
//!
//! Reference: Wozniak, P. A. (1990). Optimization of learning. SuperMemo 2.
//!
//! ## Core Formulas:
//! - Interval: 1 day, then 6 days, then round(I * EF)
//! - Ease: EF' = max(1.3, EF + 0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
//! - Mastery: +8 (q >= 4), +4 (q = 3), 0 (q = 2), -6 (q <= 1), clamped to 0-100
//! - XP: +5 per quality point
//!
//! Failed reviews (q < 3) reset the interval and the review count but leave the
//! ease factor untouched: only successes recalibrate difficulty.

mod algorithm;
mod review;

pub use algorithm::{
    due_date,
    mastery_delta,
    next_ease_factor,
    next_ease_factor_with_floor,
    next_interval,
    next_interval_with_steps,
    next_mastery,
    xp_for_quality,
    // Constants
    DEFAULT_MASTERY_DELTAS,
    FIRST_INTERVAL,
    INITIAL_EASE_FACTOR,
    MAX_MASTERY,
    MAX_QUALITY,
    MIN_EASE_FACTOR,
    PASS_THRESHOLD,
    SECOND_INTERVAL,
    XP_PER_QUALITY_POINT,
};

pub use review::{
    apply_review, PreviewResults, Quality, ReviewOutcome, ReviewScheduler, ScheduleError,
    ScheduleResult, SchedulerParameters,
};
