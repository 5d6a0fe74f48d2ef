//! Call ingestion: fetch call logs for enabled extensions, qualify events,
//! store new call records.
//!
//! A failing extension is logged and skipped; the pass continues with the
//! rest of the roster. Re-running a window is idempotent, duplicate call ids
//! count as skips.

use chrono::{DateTime, Utc};
use database::{call_record, extension, DatabaseError, Extension, NewCallRecord};
use pipeline_core::{qualify, Qualification, Telephony};
use sqlx::SqlitePool;
use tracing::{info, warn};

use crate::error::Result;
use crate::stats::IngestStats;

/// Ingest qualified calls for every enabled extension in the time window.
pub async fn ingest_calls(
    pool: &SqlitePool,
    telephony: &dyn Telephony,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<IngestStats> {
    let extensions = extension::list_enabled(pool).await?;
    let mut stats = IngestStats::default();

    for ext in &extensions {
        if let Err(e) = ingest_extension(pool, telephony, ext, from, to, &mut stats).await {
            warn!(
                extension_id = %ext.extension_id,
                error = %e,
                "call ingest failed for extension"
            );
            stats.extensions_failed += 1;
        }
    }

    info!(
        extensions = extensions.len(),
        fetched = stats.fetched,
        ingested = stats.ingested,
        accepted = stats.accepted,
        missed = stats.missed,
        skipped = stats.skipped,
        failed = stats.extensions_failed,
        "call ingestion complete"
    );
    Ok(stats)
}

async fn ingest_extension(
    pool: &SqlitePool,
    telephony: &dyn Telephony,
    ext: &Extension,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
    stats: &mut IngestStats,
) -> Result<()> {
    let events = telephony
        .list_call_log(&ext.extension_id, from, to)
        .await?;
    stats.fetched += events.len();

    for event in events {
        if event.id.is_empty() {
            warn!(extension_id = %ext.extension_id, "call event without id, skipping");
            stats.skipped += 1;
            continue;
        }

        let qualification = qualify(&event);
        let Some(call_type) = qualification.call_type() else {
            stats.skipped += 1;
            continue;
        };

        let record = NewCallRecord {
            call_id: event.id.clone(),
            extension_id: ext.extension_id.clone(),
            call_type: call_type.to_string(),
            direction: event.direction.clone(),
            caller_number: event.from.phone_number.clone(),
            caller_name: event.from.name.clone(),
            start_time: event.start_time.unwrap_or_else(Utc::now),
            end_time: event.end_time,
            duration: event.duration,
            recording_id: event.recording.as_ref().map(|r| r.id.clone()),
            recording_url: event.recording.as_ref().and_then(|r| r.content_uri.clone()),
            raw_payload: serde_json::to_string(&event.raw).ok(),
        };

        match call_record::try_insert(pool, &record).await {
            Ok(()) => {
                stats.ingested += 1;
                match qualification {
                    Qualification::Accepted => stats.accepted += 1,
                    Qualification::Missed => stats.missed += 1,
                    Qualification::Unqualified => {}
                }
            }
            Err(DatabaseError::AlreadyExists { .. }) => stats.skipped += 1,
            Err(e) => return Err(e.into()),
        }
    }

    Ok(())
}
