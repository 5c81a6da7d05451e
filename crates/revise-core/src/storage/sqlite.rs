//! SQLite Storage Implementation
//!
//! Persistence boundary for the scheduling engine. The engine itself never
//! touches the database; this layer loads records, hands them to the pure
//! scheduler or queue builder, and writes the results back.

use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, OptionalExtension, TransactionBehavior};
use std::path::PathBuf;
use std::sync::Mutex;

use crate::queue::{
    build_queue, find_at_risk_topics, summarize_progress, AtRiskConfig, AtRiskTopic,
    ProgressSummary, QueueConfig, ReviewQueue,
};
use crate::record::{BloomLevel, TopicKey, TopicMasteryRecord};
use crate::scheduler::{PreviewResults, ReviewScheduler, ScheduleError};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Record not found
    #[error("Topic not found: {0}")]
    NotFound(String),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
    /// Rejected by the scheduler
    #[error(transparent)]
    Schedule(#[from] ScheduleError),
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

const RECORD_COLUMNS: &str = "id, learner_id, subject, topic, mastery_score, xp, interval_days, \
     ease_factor, review_count, last_reviewed, next_review, bloom_level";

// ============================================================================
// STORAGE
// ============================================================================

/// SQLite-backed store of topic mastery records
///
/// Uses separate reader/writer connections. All methods take `&self`, so the
/// store can be shared as `Arc<TopicStore>`. Writes go through the single
/// writer connection inside an immediate transaction, which serializes
/// concurrent reviews of the same topic.
pub struct TopicStore {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    scheduler: ReviewScheduler,
}

impl TopicStore {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("REVISE_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;",
        )?;

        Ok(())
    }

    /// Create a new store instance
    ///
    /// `None` places the database under the platform data directory.
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => {
                let proj_dirs = ProjectDirs::from("com", "revise", "core").ok_or_else(|| {
                    StorageError::Init("Could not determine project directories".to_string())
                })?;

                let data_dir = proj_dirs.data_dir();
                std::fs::create_dir_all(data_dir)?;
                // Restrict directory permissions to owner-only on Unix
                #[cfg(unix)]
                {
                    use std::os::unix::fs::PermissionsExt;
                    let perms = std::fs::Permissions::from_mode(0o700);
                    let _ = std::fs::set_permissions(data_dir, perms);
                }
                data_dir.join("revise.db")
            }
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let writer_conn = Connection::open(&path)?;
        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::info!(applied, path = %path.display(), "Database schema up to date");
        }

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            scheduler: ReviewScheduler::default(),
        })
    }

    /// Replace the scheduler used by [`TopicStore::record_review`]
    pub fn with_scheduler(mut self, scheduler: ReviewScheduler) -> Self {
        self.scheduler = scheduler;
        self
    }

    pub fn scheduler(&self) -> &ReviewScheduler {
        &self.scheduler
    }

    // ========================================================================
    // ROW MAPPING
    // ========================================================================

    fn to_micros(ts: DateTime<Utc>) -> i64 {
        ts.timestamp_micros()
    }

    /// Parse a stored timestamp
    fn parse_timestamp(value: i64, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::from_timestamp_micros(value).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Integer,
                Box::new(StorageError::InvalidTimestamp(format!(
                    "{} out of range: {}",
                    field_name, value
                ))),
            )
        })
    }

    /// Convert a row to a TopicMasteryRecord
    fn row_to_record(row: &rusqlite::Row) -> rusqlite::Result<TopicMasteryRecord> {
        let last_reviewed: Option<i64> = row.get("last_reviewed")?;
        let next_review: i64 = row.get("next_review")?;
        let bloom_level: String = row.get("bloom_level")?;

        let bloom_level = bloom_level.parse::<BloomLevel>().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(
                0,
                rusqlite::types::Type::Text,
                Box::new(std::io::Error::new(std::io::ErrorKind::InvalidData, e)),
            )
        })?;

        let key = TopicKey::new(
            row.get::<_, String>("learner_id")?,
            row.get::<_, String>("subject")?,
            row.get::<_, String>("topic")?,
        )
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

        let mut record = TopicMasteryRecord::new(key, Self::parse_timestamp(next_review, "next_review")?);
        record.id = row.get("id")?;
        record.mastery_score = row.get("mastery_score")?;
        record.xp = u64::try_from(row.get::<_, i64>("xp")?).map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Integer, Box::new(e))
        })?;
        record.interval = row.get("interval_days")?;
        record.ease_factor = row.get("ease_factor")?;
        record.review_count = row.get("review_count")?;
        record.last_reviewed = last_reviewed
            .map(|v| Self::parse_timestamp(v, "last_reviewed"))
            .transpose()?;
        record.bloom_level = bloom_level;
        Ok(record)
    }

    fn fetch(conn: &Connection, key: &TopicKey) -> rusqlite::Result<Option<TopicMasteryRecord>> {
        conn.query_row(
            &format!(
                "SELECT {} FROM topic_mastery WHERE learner_id = ?1 AND subject = ?2 AND topic = ?3",
                RECORD_COLUMNS
            ),
            params![key.learner_id(), key.subject(), key.topic()],
            Self::row_to_record,
        )
        .optional()
    }

    /// Insert or update on the unique key; an existing row keeps its id
    fn write(conn: &Connection, record: &TopicMasteryRecord) -> rusqlite::Result<()> {
        let now = Self::to_micros(Utc::now());
        let xp = i64::try_from(record.xp)
            .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
        conn.execute(
            "INSERT INTO topic_mastery (
                id, learner_id, subject, topic, mastery_score, xp, interval_days,
                ease_factor, review_count, last_reviewed, next_review, bloom_level,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?13)
            ON CONFLICT(learner_id, subject, topic) DO UPDATE SET
                mastery_score = excluded.mastery_score,
                xp = excluded.xp,
                interval_days = excluded.interval_days,
                ease_factor = excluded.ease_factor,
                review_count = excluded.review_count,
                last_reviewed = excluded.last_reviewed,
                next_review = excluded.next_review,
                bloom_level = excluded.bloom_level,
                updated_at = excluded.updated_at",
            params![
                record.id,
                record.learner_id,
                record.subject,
                record.topic,
                record.mastery_score,
                xp,
                record.interval,
                record.ease_factor,
                record.review_count,
                record.last_reviewed.map(Self::to_micros),
                Self::to_micros(record.next_review),
                record.bloom_level.as_str(),
                now,
            ],
        )?;
        Ok(())
    }

    // ========================================================================
    // READS
    // ========================================================================

    /// Fetch one record by key
    pub fn get(&self, key: &TopicKey) -> Result<Option<TopicMasteryRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        Ok(Self::fetch(&reader, key)?)
    }

    /// All records of a learner, ordered by next review then insertion
    pub fn list_for_learner(&self, learner_id: &str) -> Result<Vec<TopicMasteryRecord>> {
        self.query_records(
            "WHERE learner_id = ?1 ORDER BY next_review ASC, rowid ASC",
            params![learner_id],
        )
    }

    /// All records of a learner, most recently written first
    pub fn list_recent_for_learner(&self, learner_id: &str) -> Result<Vec<TopicMasteryRecord>> {
        self.query_records(
            "WHERE learner_id = ?1 ORDER BY updated_at DESC, rowid DESC",
            params![learner_id],
        )
    }

    /// Every learner's records, grouped by subject and topic
    pub fn list_all(&self) -> Result<Vec<TopicMasteryRecord>> {
        self.query_records("ORDER BY subject, topic, learner_id", params![])
    }

    fn query_records(
        &self,
        clause: &str,
        args: &[&dyn rusqlite::ToSql],
    ) -> Result<Vec<TopicMasteryRecord>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let mut stmt = reader.prepare(&format!(
            "SELECT {} FROM topic_mastery {}",
            RECORD_COLUMNS, clause
        ))?;

        let records = stmt
            .query_map(args, Self::row_to_record)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(records)
    }

    /// Number of records a learner has
    pub fn count_for_learner(&self, learner_id: &str) -> Result<i64> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        Ok(reader.query_row(
            "SELECT COUNT(*) FROM topic_mastery WHERE learner_id = ?1",
            params![learner_id],
            |row| row.get(0),
        )?)
    }

    // ========================================================================
    // WRITES
    // ========================================================================

    /// Atomically insert or replace the record stored under its key
    ///
    /// The record is validated first; an existing row keeps its id.
    pub fn upsert(&self, record: &TopicMasteryRecord) -> Result<()> {
        record.validate(self.scheduler.params().min_ease_factor)?;
        let writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        Self::write(&writer, record)?;
        Ok(())
    }

    /// Apply a review to the stored record (creating it on first review)
    ///
    /// Fetch, schedule, and write happen in one immediate transaction.
    pub fn record_review(
        &self,
        key: &TopicKey,
        quality: i64,
        now: DateTime<Utc>,
    ) -> Result<TopicMasteryRecord> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let current = match Self::fetch(&tx, key)? {
            Some(record) => record,
            None => {
                tracing::debug!(topic = %key, "First review creates the record");
                self.scheduler.new_record(key.clone(), now)
            }
        };

        let next = self.scheduler.apply(&current, quality, now)?;
        Self::write(&tx, &next)?;
        tx.commit()?;

        tracing::debug!(
            topic = %key,
            quality,
            interval = next.interval,
            mastery = next.mastery_score,
            next_review = %next.next_review,
            "Review recorded"
        );

        Ok(next)
    }

    /// Register a topic, or reset mastery and due date if it already exists
    pub fn register_topic(
        &self,
        key: &TopicKey,
        initial_mastery: i64,
        bloom_level: Option<BloomLevel>,
        now: DateTime<Utc>,
    ) -> Result<TopicMasteryRecord> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut record = match Self::fetch(&tx, key)? {
            Some(existing) => existing.reregister(initial_mastery, now)?,
            None => self.scheduler.register(key.clone(), initial_mastery, now)?,
        };
        if let Some(level) = bloom_level {
            record.bloom_level = level;
        }

        Self::write(&tx, &record)?;
        tx.commit()?;

        tracing::info!(topic = %key, mastery = record.mastery_score, "Topic registered");
        Ok(record)
    }

    // ========================================================================
    // DERIVED VIEWS
    // ========================================================================

    /// Build the review queue for a learner
    pub fn review_queue(
        &self,
        learner_id: &str,
        now: DateTime<Utc>,
        config: &QueueConfig,
    ) -> Result<ReviewQueue> {
        let records = self.list_for_learner(learner_id)?;
        Ok(build_queue(&records, now, config))
    }

    /// Summarize a learner's progress, recently touched topics first
    pub fn progress(&self, learner_id: &str) -> Result<ProgressSummary> {
        let records = self.list_recent_for_learner(learner_id)?;
        Ok(summarize_progress(&records))
    }

    /// Topics struggling across learners
    pub fn at_risk_topics(&self, config: &AtRiskConfig) -> Result<Vec<AtRiskTopic>> {
        let records = self.list_all()?;
        Ok(find_at_risk_topics(&records, config))
    }

    /// Preview every quality for a topic; unknown topics preview as new
    pub fn preview(&self, key: &TopicKey, now: DateTime<Utc>) -> Result<PreviewResults> {
        let record = self
            .get(key)?
            .unwrap_or_else(|| self.scheduler.new_record(key.clone(), now));
        Ok(self.scheduler.preview(&record, now)?)
    }

    /// Fetch a record that must exist
    pub fn require(&self, key: &TopicKey) -> Result<TopicMasteryRecord> {
        self.get(key)?
            .ok_or_else(|| StorageError::NotFound(key.to_string()))
    }
}
