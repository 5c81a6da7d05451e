//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - Topic records with chosen mastery, XP, and due dates
//! - Batch generation for queue stress tests
//! - Pre-built scenarios for common test cases

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use revise_core::{BloomLevel, TopicKey, TopicMasteryRecord, TopicStore};

/// Factory for creating test data
///
/// Records are built in memory and can be written with [`TopicStore::upsert`].
///
/// # Example
///
/// ```rust,ignore
/// let record = TestDataFactory::record("learner-1", "Physics", "Optics", fixed_now());
/// let due = TestDataFactory::due_in(record, fixed_now(), Duration::days(-2));
/// store.upsert(&due)?;
/// ```
pub struct TestDataFactory;

/// Configuration for batch record generation
#[derive(Debug, Clone)]
pub struct BatchConfig {
    /// Number of records to create
    pub count: usize,
    /// Learner owning the records
    pub learner_id: String,
    /// Subjects to cycle through
    pub subjects: Vec<String>,
    /// Hour offsets from `now` are spread across this many hours either side
    pub spread_hours: i64,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            count: 10,
            learner_id: "learner-1".to_string(),
            subjects: vec!["Physics".to_string(), "Chemistry".to_string()],
            spread_hours: 14 * 24,
        }
    }
}

/// Scenario containing related test data
#[derive(Debug)]
pub struct TestScenario {
    /// Keys of created records
    pub keys: Vec<TopicKey>,
    /// Description of the scenario
    pub description: String,
    /// Named keys for test assertions
    pub named: HashMap<String, TopicKey>,
}

impl TestScenario {
    /// Look up a named key
    pub fn key(&self, name: &str) -> &TopicKey {
        self.named
            .get(name)
            .unwrap_or_else(|| panic!("scenario has no key named {}", name))
    }
}

impl TestDataFactory {
    // ========================================================================
    // SINGLE RECORD CREATION
    // ========================================================================

    /// Build a key, panicking on invalid components
    pub fn key(learner_id: &str, subject: &str, topic: &str) -> TopicKey {
        TopicKey::new(learner_id, subject, topic).expect("valid key")
    }

    /// A fresh record, due at `now`
    pub fn record(learner_id: &str, subject: &str, topic: &str, now: DateTime<Utc>) -> TopicMasteryRecord {
        TopicMasteryRecord::new(Self::key(learner_id, subject, topic), now)
    }

    /// A record with chosen mastery and XP
    pub fn record_with_stats(
        learner_id: &str,
        subject: &str,
        topic: &str,
        mastery: u8,
        xp: u64,
        now: DateTime<Utc>,
    ) -> TopicMasteryRecord {
        let mut record = Self::record(learner_id, subject, topic, now);
        record.mastery_score = mastery;
        record.xp = xp;
        record
    }

    /// Move a record's due date relative to `now`
    pub fn due_in(
        mut record: TopicMasteryRecord,
        now: DateTime<Utc>,
        offset: Duration,
    ) -> TopicMasteryRecord {
        record.next_review = now + offset;
        record
    }

    // ========================================================================
    // BATCH CREATION
    // ========================================================================

    /// Create and store a batch of records
    pub fn create_batch(store: &TopicStore, config: &BatchConfig, now: DateTime<Utc>) -> Vec<TopicKey> {
        let mut keys = Vec::with_capacity(config.count);
        let span = (config.spread_hours * 2).max(1);

        for i in 0..config.count {
            let subject = &config.subjects[i % config.subjects.len()];
            let offset = Duration::hours((i as i64 * 17) % span - config.spread_hours);
            let record = Self::due_in(
                Self::record_with_stats(
                    &config.learner_id,
                    subject,
                    &format!("Topic {}", i),
                    (i * 7 % 101) as u8,
                    (i * 5) as u64,
                    now,
                ),
                now,
                offset,
            );

            if store.upsert(&record).is_ok() {
                keys.push(record.key());
            }
        }

        keys
    }

    // ========================================================================
    // SCENARIO CREATION
    // ========================================================================

    /// A learner a week before an exam: some topics overdue, some coming up,
    /// some far off
    pub fn create_exam_week_scenario(
        store: &TopicStore,
        learner_id: &str,
        now: DateTime<Utc>,
    ) -> TestScenario {
        let entries: [(&str, &str, &str, u8, u64, Duration); 6] = [
            ("overdue_oldest", "Physics", "Kinematics", 35, 40, Duration::days(-3)),
            ("overdue_recent", "Physics", "Optics", 60, 85, Duration::hours(-2)),
            ("due_exactly", "Chemistry", "Moles", 20, 10, Duration::zero()),
            ("upcoming_soon", "Chemistry", "Bonding", 72, 120, Duration::days(1)),
            ("upcoming_edge", "Biology", "Cells", 90, 150, Duration::days(7)),
            ("far_future", "Biology", "Genetics", 95, 200, Duration::days(21)),
        ];

        let mut keys = Vec::new();
        let mut named = HashMap::new();

        for (name, subject, topic, mastery, xp, offset) in entries {
            let mut record = Self::due_in(
                Self::record_with_stats(learner_id, subject, topic, mastery, xp, now),
                now,
                offset,
            );
            if mastery >= 90 {
                record = record.with_bloom_level(BloomLevel::Evaluate);
            }
            store.upsert(&record).expect("Failed to store scenario record");

            let key = record.key();
            named.insert(name.to_string(), key.clone());
            keys.push(key);
        }

        TestScenario {
            keys,
            description: "Exam week with overdue, upcoming, and distant topics".to_string(),
            named,
        }
    }

    /// Topics in each SM-2 phase: new, first pass, second pass, lapsed
    pub fn create_scheduling_scenario(
        store: &TopicStore,
        learner_id: &str,
        now: DateTime<Utc>,
    ) -> TestScenario {
        let mut keys = Vec::new();
        let mut named = HashMap::new();
        let mut add = |name: &str, topic: &str, qualities: &[i64]| {
            let key = Self::key(learner_id, "Maths", topic);
            store
                .register_topic(&key, 0, None, now)
                .expect("Failed to register scenario topic");
            for &quality in qualities {
                store
                    .record_review(&key, quality, now)
                    .expect("Failed to review scenario topic");
            }
            named.insert(name.to_string(), key.clone());
            keys.push(key);
        };

        add("new", "Fractions", &[]);
        add("first_pass", "Algebra", &[4]);
        add("second_pass", "Calculus", &[4, 5]);
        add("lapsed", "Vectors", &[5, 5, 1]);

        TestScenario {
            keys,
            description: "Scheduling scenario with topics in different SM-2 phases".to_string(),
            named,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::harness::{fixed_now, TestDatabaseManager};

    #[test]
    fn test_create_batch() {
        let db = TestDatabaseManager::new_temp();
        let keys = TestDataFactory::create_batch(&db.store, &BatchConfig::default(), fixed_now());

        assert_eq!(keys.len(), 10);
        assert_eq!(db.topic_count("learner-1"), 10);
    }

    #[test]
    fn test_exam_week_scenario_names() {
        let db = TestDatabaseManager::new_temp();
        let scenario = TestDataFactory::create_exam_week_scenario(&db.store, "learner-1", fixed_now());

        assert_eq!(scenario.keys.len(), 6);
        assert_eq!(scenario.key("due_exactly").topic(), "Moles");
    }
}
