//! Scheduled worker for the telephony-to-CRM sync pipeline.
//!
//! Runs four jobs on independent timers: extension roster reconciliation,
//! CRM user reconciliation, call log ingestion, and lead synchronization.
//! Every timer fires once at startup, so a fresh deployment syncs
//! immediately.

mod config;
mod jobs;

use database::{Database, SecretCipher};
use tokio::time::{interval, MissedTickBehavior};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::Config;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = Config::from_env()?;
    info!(database_url = %config.database_url, "Starting sync worker");

    let db = Database::connect(&config.database_url).await?;
    db.migrate().await?;

    let cipher = SecretCipher::from_env()?;

    let mut extension_sync = interval(config.extension_sync_interval);
    let mut owner_sync = interval(config.owner_sync_interval);
    let mut call_ingest = interval(config.call_sync_interval);
    let mut lead_sync = interval(config.lead_sync_interval);
    for timer in [
        &mut extension_sync,
        &mut owner_sync,
        &mut call_ingest,
        &mut lead_sync,
    ] {
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
    }

    info!(
        extension_sync = ?config.extension_sync_interval,
        owner_sync = ?config.owner_sync_interval,
        call_ingest = ?config.call_sync_interval,
        lead_sync = ?config.lead_sync_interval,
        "Worker schedule loaded"
    );

    loop {
        tokio::select! {
            _ = extension_sync.tick() => jobs::run_extension_sync(&db, &cipher).await,
            _ = owner_sync.tick() => jobs::run_owner_sync(&db, &cipher).await,
            _ = call_ingest.tick() => jobs::run_call_ingest(&db, &cipher, config.call_lookback).await,
            _ = lead_sync.tick() => jobs::run_lead_sync(&db, &cipher).await,
            _ = tokio::signal::ctrl_c() => {
                info!("Shutdown signal received, closing database");
                db.close().await;
                return Ok(());
            }
        }
    }
}
