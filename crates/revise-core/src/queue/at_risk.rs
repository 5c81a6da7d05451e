//! At-risk topics
//!
//! Cross-learner view for whoever sets the revision plan: topics that several
//! learners study and whose mean mastery stays low.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::record::TopicMasteryRecord;

/// Default mean mastery below which a topic is at risk
pub const DEFAULT_AT_RISK_THRESHOLD: u8 = 60;

/// Default number of learners a topic needs before it is judged
pub const DEFAULT_AT_RISK_MIN_LEARNERS: usize = 2;

/// Default cap on the result
pub const DEFAULT_AT_RISK_LIMIT: usize = 10;

/// Selection policy for [`find_at_risk_topics`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtRiskConfig {
    /// Mean mastery must be strictly below this
    pub mastery_threshold: u8,
    /// Minimum number of records for the topic
    pub min_learners: usize,
    /// Maximum number of topics returned
    pub limit: usize,
}

impl Default for AtRiskConfig {
    fn default() -> Self {
        Self {
            mastery_threshold: DEFAULT_AT_RISK_THRESHOLD,
            min_learners: DEFAULT_AT_RISK_MIN_LEARNERS,
            limit: DEFAULT_AT_RISK_LIMIT,
        }
    }
}

/// One (subject, topic) group that needs attention
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AtRiskTopic {
    pub subject: String,
    pub topic: String,
    /// Unrounded mean mastery across the group
    pub average_mastery: f64,
    /// Number of records in the group
    pub learners: usize,
}

struct Group {
    mastery_sum: u64,
    count: usize,
}

/// Group records by (subject, topic) and keep the weakest groups
///
/// Groups with fewer than `min_learners` records are skipped. The rest are
/// kept when their mean mastery is below the threshold, weakest first, ties
/// in (subject, topic) order.
pub fn find_at_risk_topics(
    records: &[TopicMasteryRecord],
    config: &AtRiskConfig,
) -> Vec<AtRiskTopic> {
    let mut groups: BTreeMap<(&str, &str), Group> = BTreeMap::new();
    for record in records {
        let group = groups
            .entry((record.subject.as_str(), record.topic.as_str()))
            .or_insert(Group {
                mastery_sum: 0,
                count: 0,
            });
        group.mastery_sum += u64::from(record.mastery_score);
        group.count += 1;
    }

    let threshold = u64::from(config.mastery_threshold);
    let mut weak: Vec<((&str, &str), Group)> = groups
        .into_iter()
        .filter(|(_, g)| g.count >= config.min_learners)
        // sum / count < threshold, kept in integers
        .filter(|(_, g)| g.mastery_sum < threshold * g.count as u64)
        .collect();

    weak.sort_by(|(_, a), (_, b)| compare_means(a, b));

    weak.into_iter()
        .take(config.limit)
        .map(|((subject, topic), g)| AtRiskTopic {
            subject: subject.to_string(),
            topic: topic.to_string(),
            average_mastery: g.mastery_sum as f64 / g.count as f64,
            learners: g.count,
        })
        .collect()
}

fn compare_means(a: &Group, b: &Group) -> Ordering {
    let lhs = u128::from(a.mastery_sum) * b.count as u128;
    let rhs = u128::from(b.mastery_sum) * a.count as u128;
    lhs.cmp(&rhs)
}
