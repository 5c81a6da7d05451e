//! # Revise Core
//!
//! Spaced repetition engine for exam revision:
//!
//! - **SM-2 Scheduling**: interval growth 1 → 6 → round(I × EF), ease floor 1.3
//! - **Mastery Tracking**: 0-100 mastery score and XP per learner-topic pair
//! - **Review Queues**: due-now and upcoming worklists with subject breakdowns
//! - **Readiness**: mean mastery across every topic a learner studies
//! - **At-risk topics**: topics whose mean mastery is low across learners
//! - **Persistence**: SQLite store with atomic per-topic upserts
//!
//! The scheduler and queue builder are pure functions. They take the current
//! time as an argument and return new values; [`TopicStore`] is the only part
//! that performs I/O.
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::Utc;
//! use revise_core::{apply_review, build_queue, QueueConfig, TopicKey, TopicMasteryRecord};
//!
//! let now = Utc::now();
//! let key = TopicKey::new("learner-1", "Chemistry", "Stoichiometry")?;
//! let record = TopicMasteryRecord::new(key, now);
//!
//! // A perfect first recall: due again tomorrow
//! let reviewed = apply_review(&record, 5, now)?;
//! assert_eq!(reviewed.interval, 1);
//! assert_eq!(reviewed.mastery_score, 8);
//!
//! let queue = build_queue(&[reviewed], now, &QueueConfig::default());
//! assert_eq!(queue.upcoming.len(), 1);
//! assert_eq!(queue.readiness, 8);
//! # Ok::<(), revise_core::ScheduleError>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): Compile SQLite into the crate
//! - `encryption`: SQLCipher; set `REVISE_ENCRYPTION_KEY` to enable

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod queue;
pub mod record;
pub mod scheduler;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Record types
pub use record::{BloomLevel, TopicKey, TopicMasteryRecord};

// SM-2 scheduling
pub use scheduler::{
    apply_review,
    // Core functions for advanced usage
    due_date,
    next_ease_factor,
    next_interval,
    PreviewResults,
    Quality,
    ReviewOutcome,
    ReviewScheduler,
    ScheduleError,
    ScheduleResult,
    SchedulerParameters,
};

// Review queues
pub use queue::{
    build_queue, find_at_risk_topics, summarize_progress, AtRiskConfig, AtRiskTopic,
    ProgressSummary, QueueConfig, ReviewQueue, SubjectProgress, SubjectSummary, TopicSnapshot,
};

// Storage layer
pub use storage::{Result, StorageError, TopicStore};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        apply_review, build_queue, summarize_progress, BloomLevel, ProgressSummary, Quality,
        QueueConfig, ReviewQueue, ReviewScheduler, ScheduleError, StorageError, TopicKey,
        TopicMasteryRecord, TopicStore,
    };
}
