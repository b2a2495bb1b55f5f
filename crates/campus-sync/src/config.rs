//! Engine configuration loaded from environment variables.
//!
//! All settings have defaults so the engine can start with zero
//! configuration for local use.

use std::path::PathBuf;

use chrono::{Datelike, Utc};

use campus_shared::UserId;

/// Engine configuration.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Path of the SQLite database file.
    /// Env: `CAMPUS_DB_PATH`
    /// Default: `None`, meaning the platform data directory.
    pub db_path: Option<PathBuf>,

    /// Academic year promotions are computed from.
    /// Env: `CAMPUS_ACADEMIC_YEAR`
    /// Default: the current calendar year.
    pub academic_year: i32,

    /// Identity recorded on promotion snapshots.
    /// Env: `CAMPUS_ACTOR`
    /// Default: none.
    pub identity: Option<UserId>,

    /// Buffered notices per listener before the oldest are dropped.
    /// Env: `CAMPUS_NOTICE_CAPACITY`
    /// Default: `64`
    pub notice_capacity: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            db_path: None,
            academic_year: Utc::now().year(),
            identity: None,
            notice_capacity: 64,
        }
    }
}

impl SyncConfig {
    /// Load configuration from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(path) = lookup("CAMPUS_DB_PATH") {
            if !path.is_empty() {
                config.db_path = Some(PathBuf::from(path));
            }
        }

        if let Some(year) = lookup("CAMPUS_ACADEMIC_YEAR") {
            match year.trim().parse::<i32>() {
                Ok(parsed) => config.academic_year = parsed,
                Err(_) => tracing::warn!(value = %year, "Invalid CAMPUS_ACADEMIC_YEAR, using default"),
            }
        }

        if let Some(actor) = lookup("CAMPUS_ACTOR") {
            if !actor.is_empty() {
                config.identity = Some(UserId::new(actor));
            }
        }

        if let Some(capacity) = lookup("CAMPUS_NOTICE_CAPACITY") {
            match capacity.parse::<usize>() {
                Ok(n) if n > 0 => config.notice_capacity = n,
                _ => tracing::warn!(value = %capacity, "Invalid CAMPUS_NOTICE_CAPACITY, using default"),
            }
        }

        // RUST_LOG is handled directly by tracing-subscriber's EnvFilter.

        config
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_default_config() {
        let config = SyncConfig::default();
        assert!(config.db_path.is_none());
        assert!(config.identity.is_none());
        assert_eq!(config.notice_capacity, 64);
        assert_eq!(config.academic_year, Utc::now().year());
    }

    #[test]
    fn test_values_from_environment() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("CAMPUS_DB_PATH", "/tmp/school.db"),
            ("CAMPUS_ACADEMIC_YEAR", "2024"),
            ("CAMPUS_ACTOR", "admin-1"),
            ("CAMPUS_NOTICE_CAPACITY", "8"),
        ]));
        assert_eq!(config.db_path, Some(PathBuf::from("/tmp/school.db")));
        assert_eq!(config.academic_year, 2024);
        assert_eq!(config.identity, Some(UserId::new("admin-1")));
        assert_eq!(config.notice_capacity, 8);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = SyncConfig::from_lookup(lookup(&[
            ("CAMPUS_ACADEMIC_YEAR", "next year"),
            ("CAMPUS_NOTICE_CAPACITY", "0"),
        ]));
        assert_eq!(config.academic_year, Utc::now().year());
        assert_eq!(config.notice_capacity, 64);
    }
}
