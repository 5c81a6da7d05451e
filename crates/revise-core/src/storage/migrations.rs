//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema with SM-2 scheduling state",
        up: MIGRATION_V1_UP,
    },
    Migration {
        version: 2,
        description: "Bloom level tracking and learner due-date index",
        up: MIGRATION_V2_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
///
/// Timestamps are stored as microseconds since the Unix epoch so that
/// arbitrarily distant review dates stay sortable.
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS topic_mastery (
    id TEXT PRIMARY KEY,
    learner_id TEXT NOT NULL,
    subject TEXT NOT NULL,
    topic TEXT NOT NULL,

    -- Mastery
    mastery_score INTEGER NOT NULL DEFAULT 0 CHECK (mastery_score BETWEEN 0 AND 100),
    xp INTEGER NOT NULL DEFAULT 0,

    -- SM-2 state
    interval_days INTEGER NOT NULL DEFAULT 1 CHECK (interval_days >= 1),
    ease_factor REAL NOT NULL DEFAULT 2.5,
    review_count INTEGER NOT NULL DEFAULT 0,

    -- Scheduling
    last_reviewed INTEGER,
    next_review INTEGER NOT NULL,

    created_at INTEGER NOT NULL,
    updated_at INTEGER NOT NULL,

    UNIQUE (learner_id, subject, topic)
);

CREATE INDEX IF NOT EXISTS idx_topic_learner ON topic_mastery(learner_id);

-- Schema version tracking
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// V2: Bloom level and due-date index
const MIGRATION_V2_UP: &str = r#"
ALTER TABLE topic_mastery ADD COLUMN bloom_level TEXT NOT NULL DEFAULT 'remember';

CREATE INDEX IF NOT EXISTS idx_topic_learner_due ON topic_mastery(learner_id, next_review);

UPDATE schema_version SET version = 2, applied_at = datetime('now');
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
