//! Environment configuration
//!
//! Queue policy and data location can be overridden with `REVISE_*`
//! variables. Unset or unparsable values fall back to the defaults.

use std::path::PathBuf;
use std::str::FromStr;

use revise_core::QueueConfig;

/// Name of the database file inside a data directory
pub const DATABASE_FILE: &str = "revise.db";

/// Settings resolved from the environment
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct EnvConfig {
    /// Directory holding the database (platform default when `None`)
    pub data_dir: Option<PathBuf>,
    /// Queue caps and window
    pub queue: QueueConfig,
}

impl EnvConfig {
    /// Read from the process environment
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read through an arbitrary lookup
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = QueueConfig::default();
        let queue = QueueConfig {
            due_limit: parse_or(&lookup, "REVISE_DUE_LIMIT", defaults.due_limit),
            upcoming_limit: parse_or(&lookup, "REVISE_UPCOMING_LIMIT", defaults.upcoming_limit),
            upcoming_window_days: parse_or(
                &lookup,
                "REVISE_UPCOMING_WINDOW_DAYS",
                defaults.upcoming_window_days,
            ),
        };

        let data_dir = lookup("REVISE_DATA_DIR")
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .map(PathBuf::from);

        Self { data_dir, queue }
    }

    /// Database path, preferring an explicit directory over the environment
    pub fn database_path(&self, data_dir: Option<PathBuf>) -> Option<PathBuf> {
        data_dir
            .or_else(|| self.data_dir.clone())
            .map(|dir| dir.join(DATABASE_FILE))
    }
}

fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, name: &str, default: T) -> T {
    match lookup(name) {
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!("Ignoring {}={:?}: not a valid number", name, raw);
            default
        }),
        None => default,
    }
}
