//! The scheduled sync jobs.
//!
//! Each job builds its platform clients fresh from the credential store, so
//! rotated credentials take effect on the next tick without a restart. Job
//! failures are logged and absorbed; the schedule keeps running.

use std::time::Duration;

use chrono::Utc;
use database::{Database, SecretCipher};
use pipeline::{ingest, leads, reconcile};
use pipeline_core::SyncError;
use ringcentral::{RingCentralClient, RingCentralConfig};
use tracing::{error, info};
use zoho::{ZohoClient, ZohoConfig};

pub async fn run_extension_sync(db: &Database, cipher: &SecretCipher) {
    let client = match telephony_client(db, cipher).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "extension sync: no telephony client");
            return;
        }
    };

    match reconcile::sync_extensions(db.pool(), &client).await {
        Ok(stats) => info!(?stats, "extension sync finished"),
        Err(e) => error!(error = %e, "extension sync failed"),
    }
}

pub async fn run_owner_sync(db: &Database, cipher: &SecretCipher) {
    let client = match crm_client(db, cipher).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "owner sync: no CRM client");
            return;
        }
    };

    match reconcile::sync_lead_owners(db.pool(), &client).await {
        Ok(stats) => info!(?stats, "lead owner sync finished"),
        Err(e) => error!(error = %e, "lead owner sync failed"),
    }
}

pub async fn run_call_ingest(db: &Database, cipher: &SecretCipher, lookback: Duration) {
    let client = match telephony_client(db, cipher).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "call ingest: no telephony client");
            return;
        }
    };

    let to = Utc::now();
    let from = to - chrono::Duration::from_std(lookback).unwrap_or(chrono::Duration::hours(1));

    match ingest::ingest_calls(db.pool(), &client, from, to).await {
        Ok(stats) => info!(?stats, "call ingest finished"),
        Err(e) => error!(error = %e, "call ingest failed"),
    }
}

pub async fn run_lead_sync(db: &Database, cipher: &SecretCipher) {
    let telephony = match telephony_client(db, cipher).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "lead sync: no telephony client");
            return;
        }
    };
    let crm = match crm_client(db, cipher).await {
        Ok(client) => client,
        Err(e) => {
            error!(error = %e, "lead sync: no CRM client");
            return;
        }
    };

    match leads::sync_unprocessed(db.pool(), &telephony, &crm).await {
        Ok(stats) => info!(?stats, "lead sync finished"),
        Err(e) => error!(error = %e, "lead sync failed"),
    }
}

async fn telephony_client(
    db: &Database,
    cipher: &SecretCipher,
) -> Result<RingCentralClient, SyncError> {
    let config = RingCentralConfig::load(db.pool(), cipher).await?;
    RingCentralClient::new(config)
}

async fn crm_client(db: &Database, cipher: &SecretCipher) -> Result<ZohoClient, SyncError> {
    let config = ZohoConfig::load(db.pool(), cipher).await?;
    ZohoClient::new(config)
}
