//! Storage Module
//!
//! SQLite-based persistence for topic mastery records:
//! - Atomic upsert on the (learner, subject, topic) key
//! - Serialized read-modify-write for review events
//! - Versioned schema migrations

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{Result, StorageError, TopicStore};
