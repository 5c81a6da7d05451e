//! Progress summary
//!
//! Dashboard view of a learner's records: total XP, overall mastery, and a
//! per-subject list of topic snapshots.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rounded_mean;
use crate::record::{BloomLevel, TopicMasteryRecord};

/// One topic as shown on the progress dashboard
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TopicSnapshot {
    pub topic: String,
    pub mastery: u8,
    pub xp: u64,
    pub bloom_level: BloomLevel,
    pub next_review: DateTime<Utc>,
}

/// Topics of one subject, in input order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectProgress {
    pub topics: Vec<TopicSnapshot>,
    pub average_mastery: u8,
}

/// Learner-wide progress
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ProgressSummary {
    #[serde(rename = "totalXP")]
    pub total_xp: u64,
    pub average_mastery: u8,
    pub total_topics: usize,
    pub subjects: BTreeMap<String, SubjectProgress>,
}

/// Summarize a learner's records
pub fn summarize_progress(records: &[TopicMasteryRecord]) -> ProgressSummary {
    let mut subjects: BTreeMap<String, SubjectProgress> = BTreeMap::new();
    let mut total_xp = 0u64;
    let mut mastery_sum = 0u64;

    for record in records {
        total_xp = total_xp.saturating_add(record.xp);
        mastery_sum += u64::from(record.mastery_score);

        subjects
            .entry(record.subject.clone())
            .or_insert_with(|| SubjectProgress {
                topics: Vec::new(),
                average_mastery: 0,
            })
            .topics
            .push(TopicSnapshot {
                topic: record.topic.clone(),
                mastery: record.mastery_score,
                xp: record.xp,
                bloom_level: record.bloom_level,
                next_review: record.next_review,
            });
    }

    for progress in subjects.values_mut() {
        let sum: u64 = progress.topics.iter().map(|t| u64::from(t.mastery)).sum();
        progress.average_mastery = rounded_mean(sum, progress.topics.len());
    }

    ProgressSummary {
        total_xp,
        average_mastery: rounded_mean(mastery_sum, records.len()),
        total_topics: records.len(),
        subjects,
    }
}
