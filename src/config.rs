use anyhow::{anyhow, Result};
use config::Config;
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Duration;

use crate::database::ReviewDatabase;

/// Process-wide configuration, loaded once at startup and immutable afterwards
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewsConfig {
    /// Path to the directory holding the review database
    pub data_dir: String,

    /// Explicit database file path; defaults to `{data_dir}/reviews.sqlite3`
    pub database_path: Option<String>,

    /// How long to wait for the store lock before giving up (default: 30s)
    pub busy_timeout_secs: u64,

    /// Whether reads take the writer lock too (default: true)
    pub share_read_lock: bool,

    /// Whether a fresh store gets sample reviews (default: true)
    pub seed_sample_data: bool,

    /// Address the HTTP server binds to
    pub address: String,

    /// Port the HTTP server listens on
    pub port: u16,
}

const EMPTY_CONFIG: &str = r#"### school-reviews configuration file

### directory for the review database
# data_dir = "~/.school-reviews"

### explicit database file (overrides data_dir)
# database_path = "/var/lib/school-reviews/reviews.sqlite3"

### seconds to wait for the store lock before reporting busy
# busy_timeout_secs = 30

### serialize reads with writes (set to false to let reads run concurrently)
# share_read_lock = true

### insert sample reviews into a fresh database
# seed_sample_data = true

### HTTP server
# address = "127.0.0.1"
# port = 5000
"#;

const DEFAULT_BUSY_TIMEOUT_SECS: u64 = 30;
const DEFAULT_ADDRESS: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 5000;

fn home_dir_string() -> String {
    dirs::home_dir()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|| ".".to_string())
}

impl Default for ReviewsConfig {
    fn default() -> Self {
        Self {
            data_dir: format!("{}/.school-reviews", home_dir_string()),
            database_path: None,
            busy_timeout_secs: DEFAULT_BUSY_TIMEOUT_SECS,
            share_read_lock: true,
            seed_sample_data: true,
            address: DEFAULT_ADDRESS.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

impl ReviewsConfig {
    /// Load the configuration from file and environment.
    ///
    /// Sources, later ones overriding earlier ones:
    /// 1. the TOML file at `path`, or `$HOME/.school-reviews/school-reviews.toml`
    ///    (created from a commented template when missing)
    /// 2. `SCHOOL_REVIEWS_*` environment variables, after loading `.env`
    pub fn new(path: &Option<String>) -> Result<ReviewsConfig> {
        // A missing .env file is fine
        let _ = dotenvy::dotenv();

        let mut builder = Config::builder();

        match path {
            Some(p) => {
                let path = Path::new(p.as_str());
                if path.exists() {
                    let path_str = path
                        .to_str()
                        .ok_or_else(|| anyhow!("Could not convert path to string"))?;
                    builder = builder.add_source(config::File::with_name(path_str));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG)
                        .map_err(|e| anyhow!("Unable to create config file: {}", e))?;
                }
            }
            None => {
                let config_dir = format!("{}/.school-reviews", home_dir_string());
                std::fs::create_dir_all(config_dir.as_str())
                    .map_err(|e| anyhow!("Unable to create config directory: {}", e))?;
                let p = Self::config_file_path();
                if Path::new(p.as_str()).exists() {
                    builder = builder.add_source(config::File::with_name(p.as_str()));
                } else {
                    std::fs::write(p.as_str(), EMPTY_CONFIG).map_err(|e| {
                        anyhow!("Unable to create config file {}: {}", p.as_str(), e)
                    })?;
                }
            }
        }

        // E.g., `SCHOOL_REVIEWS_PORT=8080 school-reviews serve` would set the port
        builder = builder.add_source(config::Environment::with_prefix("SCHOOL_REVIEWS"));

        let settings = builder
            .build()
            .map_err(|e| anyhow!("Failed to build configuration: {}", e))?;

        let map = settings
            .try_deserialize::<HashMap<String, String>>()
            .map_err(|e| anyhow!("Failed to deserialize configuration: {}", e))?;

        let config = Self::from_settings(&map)?;
        std::fs::create_dir_all(config.data_dir.as_str())
            .map_err(|e| anyhow!("Unable to create data directory: {}", e))?;
        Ok(config)
    }

    /// Build a configuration from flat key/value settings, applying defaults.
    pub fn from_settings(settings: &HashMap<String, String>) -> Result<ReviewsConfig> {
        let defaults = ReviewsConfig::default();

        let data_dir = match settings.get("data_dir") {
            Some(p) => expand_home(p),
            None => defaults.data_dir,
        };

        let database_path = settings
            .get("database_path")
            .filter(|p| !p.trim().is_empty())
            .map(|p| expand_home(p));

        let busy_timeout_secs = match settings.get("busy_timeout_secs") {
            Some(s) => s
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid busy_timeout_secs '{}': {}", s, e))?,
            None => defaults.busy_timeout_secs,
        };

        let share_read_lock = match settings.get("share_read_lock") {
            Some(s) => parse_bool("share_read_lock", s)?,
            None => defaults.share_read_lock,
        };

        let seed_sample_data = match settings.get("seed_sample_data") {
            Some(s) => parse_bool("seed_sample_data", s)?,
            None => defaults.seed_sample_data,
        };

        let address = settings
            .get("address")
            .cloned()
            .unwrap_or(defaults.address);

        let port = match settings.get("port") {
            Some(s) => s
                .trim()
                .parse()
                .map_err(|e| anyhow!("Invalid port '{}': {}", s, e))?,
            None => defaults.port,
        };

        Ok(ReviewsConfig {
            data_dir,
            database_path,
            busy_timeout_secs,
            share_read_lock,
            seed_sample_data,
            address,
            port,
        })
    }

    /// Create a configuration for a specific database file, other settings default
    pub fn for_database(path: impl Into<String>) -> Self {
        let path = path.into();
        let data_dir = Path::new(&path)
            .parent()
            .map(|p| p.to_string_lossy().to_string())
            .unwrap_or_else(|| ".".to_string());
        Self {
            data_dir,
            database_path: Some(path),
            ..Self::default()
        }
    }

    /// Get the path to the SQLite database file
    pub fn database_path(&self) -> String {
        match &self.database_path {
            Some(p) => p.clone(),
            None => format!("{}/reviews.sqlite3", self.data_dir.trim_end_matches('/')),
        }
    }

    /// Get the store lock timeout as Duration
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs)
    }

    /// Get the full HTTP bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }

    /// Display configuration summary
    pub fn summary(&self) -> String {
        [
            format!("Data Directory:     {}", self.data_dir),
            format!("Database Path:      {}", self.database_path()),
            format!("Busy Timeout:       {} seconds", self.busy_timeout_secs),
            format!("Shared Read Lock:   {}", self.share_read_lock),
            format!("Seed Sample Data:   {}", self.seed_sample_data),
            format!("Listen Address:     {}", self.bind_address()),
        ]
        .join("\n")
    }

    /// Get the default config file path
    pub fn config_file_path() -> String {
        format!("{}/.school-reviews/school-reviews.toml", home_dir_string())
    }
}

fn expand_home(path: &str) -> String {
    match path.strip_prefix("~/") {
        Some(rest) => format!("{}/{}", home_dir_string(), rest),
        None if path == "~" => home_dir_string(),
        None => path.to_string(),
    }
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        other => Err(anyhow!("Invalid {} '{}': expected true or false", key, other)),
    }
}

// =============================================================================
// Database info (used by the config command and health reporting)
// =============================================================================

/// Information about the review database file
#[derive(Debug, Serialize, Clone)]
pub struct DatabaseInfo {
    pub path: String,
    pub exists: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size_bytes: Option<u64>,
    pub schema_status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_count: Option<u64>,
}

/// Inspect the configured database without creating or modifying it
pub fn get_database_info(config: &ReviewsConfig) -> DatabaseInfo {
    let path = config.database_path();
    let exists = Path::new(&path).exists();
    let size_bytes = if exists {
        std::fs::metadata(&path).ok().map(|m| m.len())
    } else {
        None
    };

    let (schema_status, review_count) = match ReviewDatabase::from_config(config).inspect() {
        Ok((status, count)) => (status.to_string(), count),
        Err(e) => (format!("error: {}", e), None),
    };

    DatabaseInfo {
        path,
        exists,
        size_bytes,
        schema_status,
        review_count,
    }
}

/// Format a byte count for display
pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_default_config() {
        let config = ReviewsConfig::default();
        assert_eq!(config.busy_timeout_secs, 30);
        assert!(config.share_read_lock);
        assert!(config.seed_sample_data);
        assert_eq!(config.bind_address(), "127.0.0.1:5000");
    }

    #[test]
    fn test_paths() {
        let config = ReviewsConfig {
            data_dir: "/test/dir/".to_string(),
            ..ReviewsConfig::default()
        };
        assert_eq!(config.database_path(), "/test/dir/reviews.sqlite3");

        let config = ReviewsConfig::for_database("/srv/reviews/app.db");
        assert_eq!(config.database_path(), "/srv/reviews/app.db");
        assert_eq!(config.data_dir, "/srv/reviews");
    }

    #[test]
    fn test_from_settings() {
        let config = ReviewsConfig::from_settings(&settings(&[
            ("data_dir", "/data"),
            ("busy_timeout_secs", "5"),
            ("share_read_lock", "false"),
            ("seed_sample_data", "0"),
            ("port", "8080"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, "/data");
        assert_eq!(config.busy_timeout(), Duration::from_secs(5));
        assert!(!config.share_read_lock);
        assert!(!config.seed_sample_data);
        assert_eq!(config.bind_address(), "127.0.0.1:8080");
    }

    #[test]
    fn test_from_settings_rejects_bad_values() {
        assert!(ReviewsConfig::from_settings(&settings(&[("port", "http")])).is_err());
        assert!(
            ReviewsConfig::from_settings(&settings(&[("share_read_lock", "maybe")])).is_err()
        );
        assert!(
            ReviewsConfig::from_settings(&settings(&[("busy_timeout_secs", "-1")])).is_err()
        );
    }

    #[test]
    fn test_expand_home() {
        let home = home_dir_string();
        assert_eq!(expand_home("~/reviews"), format!("{}/reviews", home));
        assert_eq!(expand_home("/abs/path"), "/abs/path");
    }

    #[test]
    fn test_database_info_for_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.sqlite3");
        let config = ReviewsConfig::for_database(path.to_string_lossy().to_string());

        let info = get_database_info(&config);
        assert!(!info.exists);
        assert_eq!(info.review_count, None);
        assert!(!path.exists());
    }

    #[test]
    fn test_database_info_keeps_journal_mode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("reviews.sqlite3");
        {
            let conn = rusqlite::Connection::open(&path).unwrap();
            crate::database::SchemaManager::new(&conn)
                .initialize(false)
                .unwrap();
        }
        let config = ReviewsConfig::for_database(path.to_string_lossy().to_string());

        let info = get_database_info(&config);
        assert!(info.exists);
        assert_eq!(info.review_count, Some(0));
        assert!(info.schema_status.starts_with("current"));

        let conn = rusqlite::Connection::open(&path).unwrap();
        let mode: String = conn
            .query_row("PRAGMA journal_mode", [], |r| r.get(0))
            .unwrap();
        assert_eq!(mode.to_lowercase(), "delete");
    }

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(512), "512 B");
        assert_eq!(format_size(2048), "2.00 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.00 MB");
    }
}
