//! Review scheduler
//!
//! Applies one review event to a [`TopicMasteryRecord`] and returns the
//! updated record. The current time is always an explicit argument.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    due_date, next_ease_factor_with_floor, next_interval_with_steps, next_mastery,
    DEFAULT_MASTERY_DELTAS, FIRST_INTERVAL, INITIAL_EASE_FACTOR, MAX_QUALITY, MIN_EASE_FACTOR,
    PASS_THRESHOLD, SECOND_INTERVAL, XP_PER_QUALITY_POINT,
};
use crate::record::{TopicKey, TopicMasteryRecord};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Scheduling error type
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    /// Out-of-range quality, mastery, or a corrupted record field
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Interval or due date outside the representable range
    #[error("Schedule overflow: {0}")]
    Overflow(String),
}

/// Scheduling result type
pub type ScheduleResult<T> = std::result::Result<T, ScheduleError>;

// ============================================================================
// QUALITY
// ============================================================================

/// Recall quality of a single review (0-5)
///
/// - 0: Complete blackout
/// - 1: Incorrect, answer recognized once shown
/// - 2: Incorrect, answer felt easy once shown
/// - 3: Correct with serious difficulty
/// - 4: Correct after hesitation
/// - 5: Perfect recall
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Quality(u8);

impl Quality {
    /// Validate a raw quality value
    pub fn new(value: i64) -> ScheduleResult<Self> {
        match u8::try_from(value) {
            Ok(q) if q <= MAX_QUALITY => Ok(Self(q)),
            _ => Err(ScheduleError::InvalidInput(format!(
                "quality must be within 0-{}, got {}",
                MAX_QUALITY, value
            ))),
        }
    }

    /// Every quality, lowest first
    pub fn all() -> impl Iterator<Item = Quality> {
        (0..=MAX_QUALITY).map(Quality)
    }

    pub fn value(self) -> u8 {
        self.0
    }

    /// Whether this quality counts as a successful recall under the standard threshold
    pub fn is_pass(self) -> bool {
        self.0 >= PASS_THRESHOLD
    }

    /// Short human label
    pub fn label(self) -> &'static str {
        match self.0 {
            0 => "blackout",
            1 => "wrong",
            2 => "almost",
            3 => "hard",
            4 => "good",
            _ => "perfect",
        }
    }
}

impl TryFrom<i64> for Quality {
    type Error = ScheduleError;

    fn try_from(value: i64) -> ScheduleResult<Self> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> u8 {
        quality.0
    }
}

impl std::fmt::Display for Quality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({})", self.0, self.label())
    }
}

// ============================================================================
// PARAMETERS
// ============================================================================

/// Tunable constants of the scheduling model
///
/// `Default` reproduces the reference SM-2 behavior exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchedulerParameters {
    /// Ease factor floor
    pub min_ease_factor: f64,
    /// Ease factor given to new records
    pub initial_ease_factor: f64,
    /// Interval after the first success (days)
    pub first_interval: u32,
    /// Interval after the second consecutive success (days)
    pub second_interval: u32,
    /// Lowest passing quality
    pub pass_threshold: u8,
    /// Mastery change indexed by quality
    pub mastery_deltas: [i32; 6],
    /// XP per quality point
    pub xp_per_quality_point: u64,
}

impl Default for SchedulerParameters {
    fn default() -> Self {
        Self {
            min_ease_factor: MIN_EASE_FACTOR,
            initial_ease_factor: INITIAL_EASE_FACTOR,
            first_interval: FIRST_INTERVAL,
            second_interval: SECOND_INTERVAL,
            pass_threshold: PASS_THRESHOLD,
            mastery_deltas: DEFAULT_MASTERY_DELTAS,
            xp_per_quality_point: XP_PER_QUALITY_POINT,
        }
    }
}

impl SchedulerParameters {
    /// Reject parameter sets that would break record invariants
    pub fn validate(&self) -> ScheduleResult<()> {
        if !self.min_ease_factor.is_finite() || self.min_ease_factor <= 0.0 {
            return Err(ScheduleError::InvalidInput(format!(
                "minimum ease factor must be positive, got {}",
                self.min_ease_factor
            )));
        }
        if !self.initial_ease_factor.is_finite() || self.initial_ease_factor < self.min_ease_factor
        {
            return Err(ScheduleError::InvalidInput(format!(
                "initial ease factor {} is below the minimum {}",
                self.initial_ease_factor, self.min_ease_factor
            )));
        }
        if self.first_interval == 0 || self.second_interval == 0 {
            return Err(ScheduleError::InvalidInput(
                "learning intervals must be at least 1 day".to_string(),
            ));
        }
        if self.pass_threshold > MAX_QUALITY {
            return Err(ScheduleError::InvalidInput(format!(
                "pass threshold must be within 0-{}, got {}",
                MAX_QUALITY, self.pass_threshold
            )));
        }
        Ok(())
    }
}

// ============================================================================
// PREVIEW
// ============================================================================

/// What a single quality would do to a record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    pub quality: Quality,
    pub interval: u32,
    pub ease_factor: f64,
    pub mastery_score: u8,
    pub xp: u64,
    pub next_review: DateTime<Utc>,
}

impl ReviewOutcome {
    fn from_record(quality: Quality, record: &TopicMasteryRecord) -> Self {
        Self {
            quality,
            interval: record.interval,
            ease_factor: record.ease_factor,
            mastery_score: record.mastery_score,
            xp: record.xp,
            next_review: record.next_review,
        }
    }
}

/// Outcomes for every quality 0-5, lowest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub outcomes: Vec<ReviewOutcome>,
}

impl PreviewResults {
    /// Outcome for one quality
    pub fn for_quality(&self, quality: Quality) -> Option<&ReviewOutcome> {
        self.outcomes.iter().find(|o| o.quality == quality)
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// SM-2 review scheduler
///
/// Holds only its parameters; every call is a pure transformation.
#[derive(Debug, Clone, Default)]
pub struct ReviewScheduler {
    params: SchedulerParameters,
}

impl ReviewScheduler {
    /// Create a scheduler with custom parameters
    pub fn new(params: SchedulerParameters) -> ScheduleResult<Self> {
        params.validate()?;
        Ok(Self { params })
    }

    pub fn params(&self) -> &SchedulerParameters {
        &self.params
    }

    /// A never-reviewed record starting from these parameters
    pub fn new_record(&self, key: TopicKey, now: DateTime<Utc>) -> TopicMasteryRecord {
        self.with_initial_state(TopicMasteryRecord::new(key, now))
    }

    /// Register a topic with a starting mastery score
    pub fn register(
        &self,
        key: TopicKey,
        initial_mastery: i64,
        now: DateTime<Utc>,
    ) -> ScheduleResult<TopicMasteryRecord> {
        TopicMasteryRecord::register(key, initial_mastery, now)
            .map(|record| self.with_initial_state(record))
    }

    fn with_initial_state(&self, mut record: TopicMasteryRecord) -> TopicMasteryRecord {
        record.ease_factor = self.params.initial_ease_factor;
        record.interval = self.params.first_interval;
        record
    }

    /// Apply a raw quality value, rejecting anything outside 0-5
    pub fn apply(
        &self,
        record: &TopicMasteryRecord,
        quality: i64,
        now: DateTime<Utc>,
    ) -> ScheduleResult<TopicMasteryRecord> {
        self.review(record, Quality::new(quality)?, now)
    }

    /// Apply one review event and return the updated record
    pub fn review(
        &self,
        record: &TopicMasteryRecord,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> ScheduleResult<TopicMasteryRecord> {
        record.validate(self.params.min_ease_factor)?;

        let q = quality.value();
        let mut next = record.clone();

        if q >= self.params.pass_threshold {
            // Interval grows from the ease factor as it was before this review
            next.interval = next_interval_with_steps(
                record.interval,
                record.ease_factor,
                record.review_count,
                self.params.first_interval,
                self.params.second_interval,
            )
            .ok_or_else(|| {
                ScheduleError::Overflow(format!(
                    "interval {} * ease {} exceeds {} days",
                    record.interval,
                    record.ease_factor,
                    u32::MAX
                ))
            })?;
            next.ease_factor =
                next_ease_factor_with_floor(record.ease_factor, q, self.params.min_ease_factor);
            next.review_count = record.review_count.saturating_add(1);
        } else {
            next.interval = self.params.first_interval;
            next.review_count = 0;
        }

        let delta = self.params.mastery_deltas[usize::from(q)];
        next.mastery_score = next_mastery(record.mastery_score, delta);

        next.last_reviewed = Some(now);
        next.next_review = due_date(now, next.interval).ok_or_else(|| {
            ScheduleError::Overflow(format!(
                "{} + {} days is outside the calendar range",
                now, next.interval
            ))
        })?;

        next.xp = record
            .xp
            .saturating_add(u64::from(q) * self.params.xp_per_quality_point);

        Ok(next)
    }

    /// Outcome of every quality without committing any of them
    pub fn preview(
        &self,
        record: &TopicMasteryRecord,
        now: DateTime<Utc>,
    ) -> ScheduleResult<PreviewResults> {
        let outcomes = Quality::all()
            .map(|quality| {
                self.review(record, quality, now)
                    .map(|next| ReviewOutcome::from_record(quality, &next))
            })
            .collect::<ScheduleResult<Vec<_>>>()?;
        Ok(PreviewResults { outcomes })
    }
}

/// Apply one review with the reference parameters
///
/// ```
/// use chrono::Utc;
/// use revise_core::{apply_review, TopicKey, TopicMasteryRecord};
///
/// let now = Utc::now();
/// let key = TopicKey::new("learner-1", "Physics", "Optics").unwrap();
/// let record = TopicMasteryRecord::new(key, now);
///
/// let next = apply_review(&record, 5, now).unwrap();
/// assert_eq!(next.interval, 1);
/// assert_eq!(next.review_count, 1);
/// assert!(apply_review(&record, 6, now).is_err());
/// ```
pub fn apply_review(
    record: &TopicMasteryRecord,
    quality: i64,
    now: DateTime<Utc>,
) -> ScheduleResult<TopicMasteryRecord> {
    ReviewScheduler::default().apply(record, quality, now)
}
