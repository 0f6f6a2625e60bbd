//! Runtime configuration and stored settings.

use crate::error::{EnrollError, Result};
use crate::models::Semester;
use std::path::PathBuf;

/// Environment variable overriding the database location
pub const DB_ENV_VAR: &str = "ENROLL_DB";

/// Database file used when neither `--db` nor `ENROLL_DB` is given
pub const DEFAULT_DB_FILE: &str = "enroll.db";

/// Semester the roster report falls back to
pub const DEFAULT_SEMESTER_KEY: &str = "default_semester";

/// Keys accepted by `enroll config`
pub const KNOWN_SETTINGS: &[&str] = &[DEFAULT_SEMESTER_KEY];

/// How output is rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
}

/// Resolved runtime configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub db_path: PathBuf,
    pub output: OutputFormat,
}

impl Config {
    /// Resolve from CLI flags, then the environment, then defaults
    pub fn resolve(db_flag: Option<PathBuf>, json: bool) -> Self {
        Self::resolve_with(db_flag, std::env::var(DB_ENV_VAR).ok(), json)
    }

    fn resolve_with(db_flag: Option<PathBuf>, env_value: Option<String>, json: bool) -> Self {
        let db_path = db_flag
            .or_else(|| env_value.filter(|v| !v.trim().is_empty()).map(PathBuf::from))
            .unwrap_or_else(|| PathBuf::from(DEFAULT_DB_FILE));
        let output = if json {
            OutputFormat::Json
        } else {
            OutputFormat::Table
        };
        Config { db_path, output }
    }
}

/// Check that `key` is a known setting and `value` is acceptable for it
pub fn validate_setting(key: &str, value: &str) -> Result<()> {
    match key {
        DEFAULT_SEMESTER_KEY => value.parse::<Semester>().map(|_| ()),
        _ => Err(EnrollError::UnknownSetting(key.to_string())),
    }
}

/// Check that `key` is a known setting
pub fn validate_key(key: &str) -> Result<()> {
    if KNOWN_SETTINGS.contains(&key) {
        Ok(())
    } else {
        Err(EnrollError::UnknownSetting(key.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_wins_over_env() {
        let config = Config::resolve_with(
            Some(PathBuf::from("flag.db")),
            Some("env.db".to_string()),
            false,
        );
        assert_eq!(config.db_path, PathBuf::from("flag.db"));
        assert_eq!(config.output, OutputFormat::Table);
    }

    #[test]
    fn test_env_used_without_flag() {
        let config = Config::resolve_with(None, Some("env.db".to_string()), true);
        assert_eq!(config.db_path, PathBuf::from("env.db"));
        assert_eq!(config.output, OutputFormat::Json);
    }

    #[test]
    fn test_default_path() {
        let config = Config::resolve_with(None, None, false);
        assert_eq!(config.db_path, PathBuf::from(DEFAULT_DB_FILE));

        let blank = Config::resolve_with(None, Some("  ".to_string()), false);
        assert_eq!(blank.db_path, PathBuf::from(DEFAULT_DB_FILE));
    }

    #[test]
    fn test_validate_setting() {
        assert!(validate_setting(DEFAULT_SEMESTER_KEY, "2024-Fall").is_ok());
        assert!(matches!(
            validate_setting(DEFAULT_SEMESTER_KEY, "autumn"),
            Err(EnrollError::InvalidSemester(_))
        ));
        assert!(matches!(
            validate_setting("colour", "blue"),
            Err(EnrollError::UnknownSetting(_))
        ));
        assert!(validate_key(DEFAULT_SEMESTER_KEY).is_ok());
        assert!(validate_key("colour").is_err());
    }
}
