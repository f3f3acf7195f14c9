use std::path::PathBuf;

use chrono_tz::Tz;

use crate::error::{PosError, PosResult};

pub const DEFAULT_TIMEZONE: &str = "Europe/Madrid";

/// Runtime configuration.
///
/// | Variable | Default | |
/// |----------|---------|---|
/// | COMANDA_DATA_DIR | ./data | SQLite file and log directory |
/// | COMANDA_DB_FILE | comanda.db | database file name |
/// | COMANDA_TIMEZONE | Europe/Madrid | reporting timezone |
/// | COMANDA_REMOTE_URL | (unset) | record API base URL |
/// | COMANDA_REMOTE_COLLECTION | orders | remote collection |
/// | COMANDA_HTTP_TIMEOUT_SECS | 15 | remote request timeout |
/// | COMANDA_LOG_FILE | false | write daily rolling log files |
#[derive(Debug, Clone)]
pub struct Config {
    pub data_dir: PathBuf,
    pub db_file: String,
    pub timezone: Tz,
    pub remote_url: Option<String>,
    pub remote_collection: String,
    pub http_timeout_secs: u64,
    pub log_to_file: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("./data"),
            db_file: "comanda.db".into(),
            timezone: chrono_tz::Europe::Madrid,
            remote_url: None,
            remote_collection: "orders".into(),
            http_timeout_secs: 15,
            log_to_file: false,
        }
    }
}

impl Config {
    /// Load from environment variables, falling back to defaults.
    pub fn from_env() -> PosResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub(crate) fn from_lookup<F>(lookup: F) -> PosResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let timezone = match lookup("COMANDA_TIMEZONE") {
            Some(name) => parse_timezone(&name)?,
            None => defaults.timezone,
        };

        Ok(Self {
            data_dir: lookup("COMANDA_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.data_dir),
            db_file: lookup("COMANDA_DB_FILE").unwrap_or(defaults.db_file),
            timezone,
            remote_url: lookup("COMANDA_REMOTE_URL")
                .map(|u| u.trim().trim_end_matches('/').to_string())
                .filter(|u| !u.is_empty()),
            remote_collection: lookup("COMANDA_REMOTE_COLLECTION")
                .unwrap_or(defaults.remote_collection),
            http_timeout_secs: lookup("COMANDA_HTTP_TIMEOUT_SECS")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.http_timeout_secs),
            log_to_file: lookup("COMANDA_LOG_FILE")
                .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
                .unwrap_or(defaults.log_to_file),
        })
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(&self.db_file)
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

pub fn parse_timezone(name: &str) -> PosResult<Tz> {
    name.trim()
        .parse::<Tz>()
        .map_err(|_| PosError::Config(format!("unknown timezone: {name}")))
}
