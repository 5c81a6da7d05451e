//! Record module - Core types and data structures
//!
//! One [`TopicMasteryRecord`] exists per learner, subject, and topic. It carries:
//! - SM-2 scheduling state (interval, ease factor, review count)
//! - Mastery score and accumulated XP
//! - The Bloom's taxonomy level reached on the topic

mod topic;

pub use topic::TopicMasteryRecord;

use serde::{Deserialize, Serialize};

use crate::scheduler::{ScheduleError, ScheduleResult};

// ============================================================================
// TOPIC KEY
// ============================================================================

/// Uniqueness key of a mastery record: (learner, subject, topic)
///
/// Components are trimmed on construction and must not be empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicKey {
    learner_id: String,
    subject: String,
    topic: String,
}

impl TopicKey {
    /// Build a key, rejecting empty components
    pub fn new(
        learner_id: impl Into<String>,
        subject: impl Into<String>,
        topic: impl Into<String>,
    ) -> ScheduleResult<Self> {
        Ok(Self {
            learner_id: non_empty("learner id", learner_id.into())?,
            subject: non_empty("subject", subject.into())?,
            topic: non_empty("topic", topic.into())?,
        })
    }

    pub fn learner_id(&self) -> &str {
        &self.learner_id
    }

    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn topic(&self) -> &str {
        &self.topic
    }
}

impl std::fmt::Display for TopicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}/{}", self.learner_id, self.subject, self.topic)
    }
}

fn non_empty(field: &str, value: String) -> ScheduleResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ScheduleError::InvalidInput(format!("{} must not be empty", field)));
    }
    Ok(trimmed.to_string())
}

// ============================================================================
// BLOOM LEVEL
// ============================================================================

/// Cognitive depth reached on a topic (Bloom's revised taxonomy)
///
/// Ordered from shallow recall to original production, so comparisons
/// like `level >= BloomLevel::Apply` read naturally.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum BloomLevel {
    /// Recall facts and basic concepts
    #[default]
    Remember,
    /// Explain ideas or concepts
    Understand,
    /// Use information in new situations
    Apply,
    /// Draw connections among ideas
    Analyse,
    /// Justify a stand or decision
    Evaluate,
    /// Produce new or original work
    Create,
}

impl BloomLevel {
    /// All levels, shallowest first
    pub const ALL: [BloomLevel; 6] = [
        BloomLevel::Remember,
        BloomLevel::Understand,
        BloomLevel::Apply,
        BloomLevel::Analyse,
        BloomLevel::Evaluate,
        BloomLevel::Create,
    ];

    /// Convert to string representation
    pub fn as_str(&self) -> &'static str {
        match self {
            BloomLevel::Remember => "remember",
            BloomLevel::Understand => "understand",
            BloomLevel::Apply => "apply",
            BloomLevel::Analyse => "analyse",
            BloomLevel::Evaluate => "evaluate",
            BloomLevel::Create => "create",
        }
    }
}

impl std::fmt::Display for BloomLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for BloomLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "remember" => Ok(BloomLevel::Remember),
            "understand" => Ok(BloomLevel::Understand),
            "apply" => Ok(BloomLevel::Apply),
            "analyse" | "analyze" => Ok(BloomLevel::Analyse),
            "evaluate" => Ok(BloomLevel::Evaluate),
            "create" => Ok(BloomLevel::Create),
            _ => Err(format!("Unknown bloom level: {}", s)),
        }
    }
}
