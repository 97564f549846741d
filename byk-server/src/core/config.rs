use chrono_tz::Tz;
use std::path::PathBuf;

/// Database file name inside the work directory
pub const DATABASE_FILE: &str = "booking.redb";

/// Server configuration
///
/// # Environment variables
///
/// Every field can be overridden from the environment:
///
/// | Variable | Default | Meaning |
/// |----------|---------|---------|
/// | WORK_DIR | ./data | data directory (holds the database) |
/// | HTTP_PORT | 3000 | HTTP API port |
/// | ENVIRONMENT | development | development / staging / production |
/// | TIMEZONE | UTC | business timezone for reservation dates |
/// | SLOT_DURATION_MINUTES | 120 | reservation slot length |
/// | MAX_PARTY_SIZE | 20 | largest accepted party |
/// | TABLES_SEED_FILE | - | JSON table export loaded at startup |
/// | LOG_LEVEL | info | default log level |
/// | LOG_DIR | - | enables daily rolling log files |
/// | SHUTDOWN_TIMEOUT_MS | 10000 | graceful shutdown grace period |
///
/// # Example
///
/// ```ignore
/// WORK_DIR=/data/byk HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// Work directory, holds the database file
    pub work_dir: String,
    /// HTTP API port
    pub http_port: u16,
    /// Runtime environment: development | staging | production
    pub environment: String,
    /// Business timezone, reservation date/time are local to it
    pub timezone: Tz,
    /// Fixed reservation window length in minutes
    pub slot_duration_minutes: u32,
    /// Upper bound on reservation party size
    pub max_party_size: i32,
    /// Optional JSON file with the tables to seed
    pub tables_seed_file: Option<String>,
    /// Default log level when RUST_LOG is unset
    pub log_level: String,
    /// Directory for rolling log files
    pub log_dir: Option<String>,
    /// Graceful shutdown timeout (milliseconds)
    pub shutdown_timeout_ms: u64,
}

impl Config {
    /// Load configuration from the environment, falling back to defaults
    pub fn from_env() -> Self {
        Self {
            work_dir: std::env::var("WORK_DIR").unwrap_or_else(|_| "./data".into()),
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            timezone: std::env::var("TIMEZONE")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(chrono_tz::UTC),
            slot_duration_minutes: std::env::var("SLOT_DURATION_MINUTES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &u32| *v > 0)
                .unwrap_or(120),
            max_party_size: std::env::var("MAX_PARTY_SIZE")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &i32| *v > 0)
                .unwrap_or(20),
            tables_seed_file: std::env::var("TABLES_SEED_FILE")
                .ok()
                .filter(|v| !v.is_empty()),
            log_level: std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".into()),
            log_dir: std::env::var("LOG_DIR").ok().filter(|v| !v.is_empty()),
            shutdown_timeout_ms: std::env::var("SHUTDOWN_TIMEOUT_MS")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(10000),
        }
    }

    /// Override the work directory and port, keeping everything else
    ///
    /// Used by tests.
    pub fn with_overrides(work_dir: impl Into<String>, http_port: u16) -> Self {
        let mut config = Self::from_env();
        config.work_dir = work_dir.into();
        config.http_port = http_port;
        config
    }

    /// Path of the redb database file
    pub fn database_path(&self) -> PathBuf {
        PathBuf::from(&self.work_dir).join(DATABASE_FILE)
    }

    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::from_env()
    }
}
