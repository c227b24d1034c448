use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

pub const HTTP_ADDR_VAR: &str = "TURN_SCHEDULER_HTTP_ADDR";
pub const DATABASE_VAR: &str = "TURN_SCHEDULER_DB";
pub const ROSTER_VAR: &str = "TURN_SCHEDULER_ROSTER";
pub const HOLIDAYS_VAR: &str = "TURN_SCHEDULER_HOLIDAYS";
pub const LOG_VAR: &str = "TURN_SCHEDULER_LOG";

const DEFAULT_HTTP_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub http_addr: SocketAddr,
    /// SQLite file; an in-memory store is used when unset.
    pub database_path: Option<PathBuf>,
    /// JSON roster seeded into the store at startup.
    pub roster_path: Option<PathBuf>,
    /// JSON holiday table replacing the built-in one.
    pub holidays_path: Option<PathBuf>,
    pub log_level: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{var} must be a socket address like 127.0.0.1:3000 (got '{value}')")]
    InvalidAddr { var: &'static str, value: String },
}

impl AppConfig {
    /// Reads `.env` when present, then the process environment.
    pub fn load() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let raw_addr = non_empty(HTTP_ADDR_VAR).unwrap_or_else(|| DEFAULT_HTTP_ADDR.to_string());
        let http_addr: SocketAddr = raw_addr
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidAddr {
                var: HTTP_ADDR_VAR,
                value: raw_addr.clone(),
            })?;

        Ok(Self {
            http_addr,
            database_path: non_empty(DATABASE_VAR).map(PathBuf::from),
            roster_path: non_empty(ROSTER_VAR).map(PathBuf::from),
            holidays_path: non_empty(HOLIDAYS_VAR).map(PathBuf::from),
            log_level: non_empty(LOG_VAR).unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string()),
        })
    }
}
