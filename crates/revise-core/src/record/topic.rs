//! Topic Mastery Record - The fundamental unit of scheduling state
//!
//! Each record tracks one learner's progress on one topic of one subject:
//! - SM-2 scheduling state
//! - Mastery score (0-100) and XP
//! - Review timestamps

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BloomLevel, TopicKey};
use crate::scheduler::{
    ScheduleError, ScheduleResult, FIRST_INTERVAL, INITIAL_EASE_FACTOR, MAX_MASTERY,
};

/// Scheduling and mastery state for a learner-topic pair
///
/// Records are plain values: the scheduler consumes one and returns an
/// updated copy, and persistence is left to the caller.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicMasteryRecord {
    /// Unique identifier (UUID v4), stable across updates
    pub id: String,
    /// Owning learner
    pub learner_id: String,
    /// Subject the topic belongs to
    pub subject: String,
    /// Topic name
    pub topic: String,

    // ========== Mastery ==========
    /// Estimated command of the topic (0-100)
    pub mastery_score: u8,
    /// Accumulated experience points, never decreases
    pub xp: u64,

    // ========== SM-2 State ==========
    /// Days between the last review and the next one (>= 1)
    pub interval: u32,
    /// Interval growth multiplier (>= 1.3)
    pub ease_factor: f64,
    /// Consecutive successful reviews
    pub review_count: u32,

    // ========== Scheduling ==========
    /// When the topic was last reviewed
    pub last_reviewed: Option<DateTime<Utc>>,
    /// When the topic is next due
    pub next_review: DateTime<Utc>,

    /// Deepest Bloom level reached
    #[serde(default)]
    pub bloom_level: BloomLevel,
}

impl TopicMasteryRecord {
    /// Create a fresh record with default scheduling state, due immediately
    pub fn new(key: TopicKey, now: DateTime<Utc>) -> Self {
        let TopicKey {
            learner_id,
            subject,
            topic,
        } = key;
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            learner_id,
            subject,
            topic,
            mastery_score: 0,
            xp: 0,
            interval: FIRST_INTERVAL,
            ease_factor: INITIAL_EASE_FACTOR,
            review_count: 0,
            last_reviewed: None,
            next_review: now,
            bloom_level: BloomLevel::default(),
        }
    }

    /// Register a topic explicitly with a starting mastery score
    pub fn register(key: TopicKey, initial_mastery: i64, now: DateTime<Utc>) -> ScheduleResult<Self> {
        let mastery = check_mastery(initial_mastery)?;
        let mut record = Self::new(key, now);
        record.mastery_score = mastery;
        Ok(record)
    }

    /// Re-register an existing topic
    ///
    /// Resets the mastery score and makes the topic due now. Every other field,
    /// including the SM-2 state and XP, is kept.
    pub fn reregister(&self, initial_mastery: i64, now: DateTime<Utc>) -> ScheduleResult<Self> {
        let mastery = check_mastery(initial_mastery)?;
        if let Some(last) = self.last_reviewed.filter(|last| *last > now) {
            return Err(ScheduleError::InvalidInput(format!(
                "cannot re-register at {} before the last review at {}",
                now, last
            )));
        }
        let mut record = self.clone();
        record.mastery_score = mastery;
        record.next_review = now;
        Ok(record)
    }

    /// Builder-style setter for the Bloom level
    pub fn with_bloom_level(mut self, level: BloomLevel) -> Self {
        self.bloom_level = level;
        self
    }

    /// The (learner, subject, topic) key of this record
    pub fn key(&self) -> TopicKey {
        TopicKey {
            learner_id: self.learner_id.clone(),
            subject: self.subject.clone(),
            topic: self.topic.clone(),
        }
    }

    /// Check if the topic is due for review
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review <= now
    }

    /// Check the record's invariants against a minimum ease factor
    ///
    /// Corrupted records are reported, never repaired.
    pub fn validate(&self, min_ease_factor: f64) -> ScheduleResult<()> {
        if self.interval < 1 {
            return Err(ScheduleError::InvalidInput(format!(
                "interval must be at least 1 day, got {}",
                self.interval
            )));
        }
        if !self.ease_factor.is_finite() || self.ease_factor < min_ease_factor {
            return Err(ScheduleError::InvalidInput(format!(
                "ease factor must be a number >= {}, got {}",
                min_ease_factor, self.ease_factor
            )));
        }
        if self.mastery_score > MAX_MASTERY {
            return Err(ScheduleError::InvalidInput(format!(
                "mastery score must be within 0-{}, got {}",
                MAX_MASTERY, self.mastery_score
            )));
        }
        if let Some(last) = self.last_reviewed {
            if self.next_review < last {
                return Err(ScheduleError::InvalidInput(format!(
                    "next review {} precedes last review {}",
                    self.next_review, last
                )));
            }
        }
        Ok(())
    }
}

fn check_mastery(value: i64) -> ScheduleResult<u8> {
    match u8::try_from(value) {
        Ok(mastery) if mastery <= MAX_MASTERY => Ok(mastery),
        _ => Err(ScheduleError::InvalidInput(format!(
            "initial mastery must be within 0-{}, got {}",
            MAX_MASTERY, value
        ))),
    }
}
