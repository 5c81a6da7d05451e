//! Review Queue Module
//!
//! Turns a learner's full set of topic records into a prioritized worklist:
//! - **Due now**: `next_review <= now`, oldest first
//! - **Upcoming**: due within the window (7 days by default), soonest first
//! - **Subject breakdown**: topic count, average mastery, and total XP
//! - **Readiness**: mean mastery across every topic
//! - **At-risk topics**: weak (subject, topic) groups across learners
//!
//! Readiness is a plain unweighted mean. It ignores recency and exam
//! relevance.

mod at_risk;
mod progress;

pub use at_risk::{
    find_at_risk_topics, AtRiskConfig, AtRiskTopic, DEFAULT_AT_RISK_LIMIT,
    DEFAULT_AT_RISK_MIN_LEARNERS, DEFAULT_AT_RISK_THRESHOLD,
};
pub use progress::{summarize_progress, ProgressSummary, SubjectProgress, TopicSnapshot};

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::record::TopicMasteryRecord;

// ============================================================================
// CONSTANTS
// ============================================================================

/// Default cap on the due-now list
pub const DEFAULT_DUE_LIMIT: usize = 15;

/// Default cap on the upcoming list
pub const DEFAULT_UPCOMING_LIMIT: usize = 10;

/// Default length of the upcoming window in days
pub const DEFAULT_UPCOMING_WINDOW_DAYS: u32 = 7;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Queue policy: list caps and the upcoming window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueConfig {
    /// Maximum number of due-now entries
    pub due_limit: usize,
    /// Maximum number of upcoming entries
    pub upcoming_limit: usize,
    /// How far ahead "upcoming" reaches, in days
    pub upcoming_window_days: u32,
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            due_limit: DEFAULT_DUE_LIMIT,
            upcoming_limit: DEFAULT_UPCOMING_LIMIT,
            upcoming_window_days: DEFAULT_UPCOMING_WINDOW_DAYS,
        }
    }
}

// ============================================================================
// QUEUE
// ============================================================================

/// Aggregate statistics for one subject
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectSummary {
    /// Number of topics in the subject
    pub topics: usize,
    /// Mean mastery, rounded to the nearest integer
    pub average_mastery: u8,
    /// Sum of XP across the subject's topics
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
}

/// Prioritized review worklist for one learner
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewQueue {
    /// Topics whose review time has passed, oldest first
    pub due_now: Vec<TopicMasteryRecord>,
    /// Topics due within the window, soonest first
    pub upcoming: Vec<TopicMasteryRecord>,
    /// Per-subject breakdown, ordered by subject name
    pub subjects: BTreeMap<String, SubjectSummary>,
    /// Mean mastery over all topics (0 when there are none)
    pub readiness: u8,
    /// Number of topics considered
    pub total_topics: usize,
}

impl ReviewQueue {
    /// Whether nothing is due or upcoming
    pub fn is_clear(&self) -> bool {
        self.due_now.is_empty() && self.upcoming.is_empty()
    }
}

#[derive(Default)]
struct SubjectAccumulator {
    topics: usize,
    mastery_sum: u64,
    total_xp: u64,
}

/// Build the review queue for a set of records
///
/// Sorting is stable, so records with equal `next_review` keep their input
/// order. Every record counts toward the aggregates, including those outside
/// the window.
pub fn build_queue(
    records: &[TopicMasteryRecord],
    now: DateTime<Utc>,
    config: &QueueConfig,
) -> ReviewQueue {
    let horizon = now
        .checked_add_signed(Duration::days(i64::from(config.upcoming_window_days)))
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    let mut due: Vec<&TopicMasteryRecord> = Vec::new();
    let mut upcoming: Vec<&TopicMasteryRecord> = Vec::new();
    let mut by_subject: BTreeMap<&str, SubjectAccumulator> = BTreeMap::new();
    let mut mastery_sum = 0u64;

    for record in records {
        if record.next_review <= now {
            due.push(record);
        } else if record.next_review <= horizon {
            upcoming.push(record);
        }

        let acc = by_subject.entry(record.subject.as_str()).or_default();
        acc.topics += 1;
        acc.mastery_sum += u64::from(record.mastery_score);
        acc.total_xp = acc.total_xp.saturating_add(record.xp);

        mastery_sum += u64::from(record.mastery_score);
    }

    due.sort_by_key(|r| r.next_review);
    upcoming.sort_by_key(|r| r.next_review);

    let subjects = by_subject
        .into_iter()
        .map(|(subject, acc)| {
            (
                subject.to_string(),
                SubjectSummary {
                    topics: acc.topics,
                    average_mastery: rounded_mean(acc.mastery_sum, acc.topics),
                    total_xp: acc.total_xp,
                },
            )
        })
        .collect();

    ReviewQueue {
        due_now: due.into_iter().take(config.due_limit).cloned().collect(),
        upcoming: upcoming
            .into_iter()
            .take(config.upcoming_limit)
            .cloned()
            .collect(),
        subjects,
        readiness: rounded_mean(mastery_sum, records.len()),
        total_topics: records.len(),
    }
}

/// Mean of mastery scores rounded half up; 0 for an empty set
pub(crate) fn rounded_mean(sum: u64, count: usize) -> u8 {
    if count == 0 {
        return 0;
    }
    let count = count as u64;
    // Scores are 0-100, so the mean is too
    ((2 * sum + count) / (2 * count)).min(100) as u8
}
