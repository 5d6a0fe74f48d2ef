//! Worker configuration loaded from environment variables.

use std::env;
use std::time::Duration;

/// Worker schedule configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// SQLite database URL.
    pub database_url: String,
    /// How often to reconcile the extension roster.
    pub extension_sync_interval: Duration,
    /// How often to reconcile the CRM user list.
    pub owner_sync_interval: Duration,
    /// How often to ingest call logs.
    pub call_sync_interval: Duration,
    /// How far back each call ingestion window reaches.
    pub call_lookback: Duration,
    /// How often to sync unprocessed calls into CRM leads.
    pub lead_sync_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// | Variable | Description | Default |
    /// |----------|-------------|---------|
    /// | `DATABASE_URL` | SQLite database URL | `sqlite:callbridge.db?mode=rwc` |
    /// | `EXTENSION_SYNC_INTERVAL_SECS` | Extension roster reconciliation | `86400` |
    /// | `OWNER_SYNC_INTERVAL_SECS` | CRM user reconciliation | `86400` |
    /// | `CALL_SYNC_INTERVAL_SECS` | Call log ingestion | `3600` |
    /// | `CALL_LOOKBACK_SECS` | Ingestion window length | `3600` |
    /// | `LEAD_SYNC_INTERVAL_SECS` | Lead synchronization | `900` |
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite:callbridge.db?mode=rwc".to_string()),
            extension_sync_interval: interval_var("EXTENSION_SYNC_INTERVAL_SECS", 86_400)?,
            owner_sync_interval: interval_var("OWNER_SYNC_INTERVAL_SECS", 86_400)?,
            call_sync_interval: interval_var("CALL_SYNC_INTERVAL_SECS", 3_600)?,
            call_lookback: interval_var("CALL_LOOKBACK_SECS", 3_600)?,
            lead_sync_interval: interval_var("LEAD_SYNC_INTERVAL_SECS", 900)?,
        })
    }
}

fn interval_var(name: &'static str, default_secs: u64) -> Result<Duration, ConfigError> {
    match env::var(name) {
        Err(_) => Ok(Duration::from_secs(default_secs)),
        Ok(raw) => raw
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|secs| *secs > 0)
            .map(Duration::from_secs)
            .ok_or(ConfigError::InvalidInterval(name)),
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be a positive number of seconds")]
    InvalidInterval(&'static str),
}
