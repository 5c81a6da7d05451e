//! SM-2 Core Formulas
//!
//! Pure functions over plain numbers. Quality arguments are assumed to be
//! validated already (0-5); see [`super::Quality`].

use chrono::{DateTime, Days, Utc};

// ============================================================================
// CONSTANTS
// ============================================================================

/// Ease factor floor; no sequence of reviews can push ease below this
pub const MIN_EASE_FACTOR: f64 = 1.3;

/// Ease factor of a freshly created record
pub const INITIAL_EASE_FACTOR: f64 = 2.5;

/// Interval after the first successful review (days)
pub const FIRST_INTERVAL: u32 = 1;

/// Interval after the second consecutive successful review (days)
pub const SECOND_INTERVAL: u32 = 6;

/// Lowest quality that counts as a successful recall (inclusive)
pub const PASS_THRESHOLD: u8 = 3;

/// Highest quality a review can report
pub const MAX_QUALITY: u8 = 5;

/// Upper bound of the mastery score
pub const MAX_MASTERY: u8 = 100;

/// XP earned per quality point
pub const XP_PER_QUALITY_POINT: u64 = 5;

/// Mastery change indexed by quality 0-5
pub const DEFAULT_MASTERY_DELTAS: [i32; 6] = [-6, -6, 0, 4, 8, 8];

// ============================================================================
// EASE FACTOR
// ============================================================================

/// Ease factor after a successful review, floored at [`MIN_EASE_FACTOR`]
///
/// q = 5 adds 0.1, q = 4 leaves ease unchanged, q = 3 subtracts 0.14.
#[inline]
pub fn next_ease_factor(ease_factor: f64, quality: u8) -> f64 {
    next_ease_factor_with_floor(ease_factor, quality, MIN_EASE_FACTOR)
}

/// Ease factor after a successful review with a custom floor
#[inline]
pub fn next_ease_factor_with_floor(ease_factor: f64, quality: u8, floor: f64) -> f64 {
    let miss = f64::from(MAX_QUALITY.saturating_sub(quality));
    (ease_factor + 0.1 - miss * (0.08 + miss * 0.02)).max(floor)
}

// ============================================================================
// INTERVAL
// ============================================================================

/// Interval after a successful review using the standard 1/6 day steps
///
/// `review_count` is the count *before* this review. Returns `None` when the
/// grown interval no longer fits in a `u32`.
#[inline]
pub fn next_interval(previous_interval: u32, ease_factor: f64, review_count: u32) -> Option<u32> {
    next_interval_with_steps(
        previous_interval,
        ease_factor,
        review_count,
        FIRST_INTERVAL,
        SECOND_INTERVAL,
    )
}

/// Interval after a successful review with custom learning steps
///
/// Growth is deliberately uncapped.
pub fn next_interval_with_steps(
    previous_interval: u32,
    ease_factor: f64,
    review_count: u32,
    first: u32,
    second: u32,
) -> Option<u32> {
    match review_count {
        0 => Some(first),
        1 => Some(second),
        _ => {
            let grown = (f64::from(previous_interval) * ease_factor).round();
            if grown.is_finite() && grown >= 0.0 && grown <= f64::from(u32::MAX) {
                Some(grown as u32)
            } else {
                None
            }
        }
    }
}

/// Timestamp `interval` calendar days after `now`
///
/// Uses calendar-day addition so month and year rollovers land on the same
/// wall-clock time. Returns `None` past the representable date range.
#[inline]
pub fn due_date(now: DateTime<Utc>, interval: u32) -> Option<DateTime<Utc>> {
    now.checked_add_days(Days::new(u64::from(interval)))
}

// ============================================================================
// MASTERY & XP
// ============================================================================

/// Mastery change for a quality using [`DEFAULT_MASTERY_DELTAS`]
#[inline]
pub fn mastery_delta(quality: u8) -> i32 {
    DEFAULT_MASTERY_DELTAS[usize::from(quality.min(MAX_QUALITY))]
}

/// Apply a mastery delta, clamping the result to 0-100
#[inline]
pub fn next_mastery(mastery_score: u8, delta: i32) -> u8 {
    let clamped = (i32::from(mastery_score) + delta).clamp(0, i32::from(MAX_MASTERY));
    // Clamped into 0..=100, fits in u8
    clamped as u8
}

/// XP earned by a review of the given quality
#[inline]
pub fn xp_for_quality(quality: u8) -> u64 {
    u64::from(quality) * XP_PER_QUALITY_POINT
}
