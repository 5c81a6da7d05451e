//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded learners with registered and reviewed topics
//! - Database recreation for migration checks

use std::path::PathBuf;

use chrono::{DateTime, TimeZone, Utc};
use revise_core::{TopicKey, TopicMasteryRecord, TopicStore};
use tempfile::TempDir;

/// Fixed clock reading used across journeys
///
/// Tests pass time explicitly, so every run sees the same schedule.
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap()
}

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
/// let keys = db.seed_topics("learner-1", "Physics", 3, fixed_now());
/// db.store.record_review(&keys[0], 4, fixed_now())?;
/// ```
pub struct TestDatabaseManager {
    /// The store instance
    pub store: TopicStore,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory
    pub fn new_temp() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_revise.db");

        let store = TopicStore::new(Some(db_path.clone())).expect("Failed to create test store");

        Self {
            store,
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Create a test database at a specific path
    ///
    /// The database is NOT automatically deleted.
    pub fn new_at_path(path: PathBuf) -> Self {
        let store = TopicStore::new(Some(path.clone())).expect("Failed to create test store");

        Self {
            store,
            _temp_dir: None,
            db_path: path,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Number of topics stored for a learner
    pub fn topic_count(&self, learner_id: &str) -> i64 {
        self.store.count_for_learner(learner_id).unwrap_or(0)
    }

    /// Check if a learner has no topics
    pub fn is_empty(&self, learner_id: &str) -> bool {
        self.topic_count(learner_id) == 0
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Register `count` fresh topics under one subject
    pub fn seed_topics(
        &self,
        learner_id: &str,
        subject: &str,
        count: usize,
        now: DateTime<Utc>,
    ) -> Vec<TopicKey> {
        (0..count)
            .map(|i| {
                let key = TopicKey::new(learner_id, subject, format!("Topic {}", i))
                    .expect("valid key");
                self.store
                    .register_topic(&key, 0, None, now)
                    .expect("Failed to register topic");
                key
            })
            .collect()
    }

    /// Apply a sequence of qualities, one review per day starting at `start`
    pub fn review_daily(
        &self,
        key: &TopicKey,
        qualities: &[i64],
        start: DateTime<Utc>,
    ) -> TopicMasteryRecord {
        let mut last = None;
        for (day, &quality) in qualities.iter().enumerate() {
            let at = start + chrono::Duration::days(day as i64);
            last = Some(
                self.store
                    .record_review(key, quality, at)
                    .expect("Failed to record review"),
            );
        }
        last.expect("at least one quality")
    }

    // ========================================================================
    // CLEANUP
    // ========================================================================

    /// Reopen the database file, running migrations again
    pub fn reopen(&mut self) {
        self.store =
            TopicStore::new(Some(self.db_path.clone())).expect("Failed to reopen store");
    }

    /// Delete the database file and start from an empty schema
    pub fn recreate(&mut self) {
        let _ = std::fs::remove_file(&self.db_path);
        self.store =
            TopicStore::new(Some(self.db_path.clone())).expect("Failed to recreate store");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temp_database_creation() {
        let db = TestDatabaseManager::new_temp();
        assert!(db.is_empty("learner-1"));
        assert!(db.path().exists());
    }

    #[test]
    fn test_seed_topics() {
        let db = TestDatabaseManager::new_temp();
        let keys = db.seed_topics("learner-1", "Physics", 4, fixed_now());

        assert_eq!(keys.len(), 4);
        assert_eq!(db.topic_count("learner-1"), 4);
    }

    #[test]
    fn test_review_daily_accumulates() {
        let db = TestDatabaseManager::new_temp();
        let keys = db.seed_topics("learner-1", "Physics", 1, fixed_now());

        let record = db.review_daily(&keys[0], &[4, 4, 4], fixed_now());
        assert_eq!(record.review_count, 3);
        assert_eq!(record.xp, 60);
    }

    #[test]
    fn test_recreate_clears_data() {
        let mut db = TestDatabaseManager::new_temp();
        db.seed_topics("learner-1", "Physics", 3, fixed_now());

        db.recreate();
        assert!(db.is_empty("learner-1"));
    }
}
