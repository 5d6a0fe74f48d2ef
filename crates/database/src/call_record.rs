//! Call record operations.

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{CallRecord, NewCallRecord};

const COLUMNS: &str = "id, call_id, extension_id, call_type, direction, caller_number, \
                       caller_name, start_time, end_time, duration, recording_id, \
                       recording_url, raw_payload, processed, processing_time";

/// Insert a freshly ingested call.
///
/// A repeated external call id maps to [`DatabaseError::AlreadyExists`] so
/// the ingestor can count an idempotent skip instead of failing.
pub async fn try_insert(pool: &SqlitePool, record: &NewCallRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO call_records (
            call_id, extension_id, call_type, direction, caller_number,
            caller_name, start_time, end_time, duration, recording_id,
            recording_url, raw_payload, processed
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0)
        "#,
    )
    .bind(&record.call_id)
    .bind(&record.extension_id)
    .bind(&record.call_type)
    .bind(&record.direction)
    .bind(&record.caller_number)
    .bind(&record.caller_name)
    .bind(record.start_time)
    .bind(record.end_time)
    .bind(record.duration)
    .bind(&record.recording_id)
    .bind(&record.recording_url)
    .bind(&record.raw_payload)
    .execute(pool)
    .await
    .map_err(|e| {
        if let sqlx::Error::Database(ref db_err) = e {
            if db_err.is_unique_violation() {
                return DatabaseError::AlreadyExists {
                    entity: "CallRecord",
                    id: record.call_id.clone(),
                };
            }
        }
        DatabaseError::Sqlx(e)
    })?;

    Ok(())
}

/// Whether a call with this external id was already ingested.
pub async fn exists(pool: &SqlitePool, call_id: &str) -> Result<bool> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM call_records WHERE call_id = ?
        "#,
    )
    .bind(call_id)
    .fetch_one(pool)
    .await?;

    Ok(count > 0)
}

/// Get a call record by row id.
pub async fn get(pool: &SqlitePool, id: i64) -> Result<CallRecord> {
    sqlx::query_as::<_, CallRecord>(&format!(
        "SELECT {COLUMNS} FROM call_records WHERE id = ?"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "CallRecord",
        id: id.to_string(),
    })
}

/// List calls not yet evaluated for a lead.
pub async fn list_unprocessed(pool: &SqlitePool) -> Result<Vec<CallRecord>> {
    let records = sqlx::query_as::<_, CallRecord>(&format!(
        "SELECT {COLUMNS} FROM call_records WHERE processed = 0 ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(records)
}

/// Atomically claim an unprocessed call for this run.
///
/// The check-and-update is a single statement, so two overlapping lead-sync
/// runs can never both claim the same call. Returns false when the call was
/// already processed or claimed.
pub async fn claim(pool: &SqlitePool, id: i64, when: DateTime<Utc>) -> Result<bool> {
    let result = sqlx::query(
        r#"
        UPDATE call_records
        SET processed = 1, processing_time = ?
        WHERE id = ? AND processed = 0
        "#,
    )
    .bind(when)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected() == 1)
}

/// Return a claimed call to the unprocessed set after a failure, so the next
/// pass retries it.
pub async fn release(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE call_records
        SET processed = 0, processing_time = NULL
        WHERE id = ?
        "#,
    )
    .bind(id)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Database;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        db
    }

    fn record(call_id: &str) -> NewCallRecord {
        NewCallRecord {
            call_id: call_id.to_string(),
            extension_id: "101".to_string(),
            call_type: "Missed".to_string(),
            direction: "Inbound".to_string(),
            caller_number: "+15551234567".to_string(),
            caller_name: Some("Jane Doe".to_string()),
            start_time: Utc::now(),
            end_time: None,
            duration: Some(12),
            recording_id: None,
            recording_url: None,
            raw_payload: Some("{}".to_string()),
        }
    }

    #[tokio::test]
    async fn test_duplicate_call_id_is_already_exists() {
        let db = test_db().await;

        try_insert(db.pool(), &record("c1")).await.unwrap();
        let result = try_insert(db.pool(), &record("c1")).await;
        assert!(matches!(
            result,
            Err(DatabaseError::AlreadyExists { entity: "CallRecord", .. })
        ));

        assert!(exists(db.pool(), "c1").await.unwrap());
        assert!(!exists(db.pool(), "c2").await.unwrap());
    }

    #[tokio::test]
    async fn test_claim_is_exclusive() {
        let db = test_db().await;
        try_insert(db.pool(), &record("c1")).await.unwrap();
        let call = &list_unprocessed(db.pool()).await.unwrap()[0];

        assert!(claim(db.pool(), call.id, Utc::now()).await.unwrap());
        // Second claim loses.
        assert!(!claim(db.pool(), call.id, Utc::now()).await.unwrap());

        let reloaded = get(db.pool(), call.id).await.unwrap();
        assert!(reloaded.processed);
        assert!(reloaded.processing_time.is_some());
    }

    #[tokio::test]
    async fn test_release_returns_call_to_unprocessed() {
        let db = test_db().await;
        try_insert(db.pool(), &record("c1")).await.unwrap();
        let call = &list_unprocessed(db.pool()).await.unwrap()[0];

        claim(db.pool(), call.id, Utc::now()).await.unwrap();
        assert!(list_unprocessed(db.pool()).await.unwrap().is_empty());

        release(db.pool(), call.id).await.unwrap();
        let unprocessed = list_unprocessed(db.pool()).await.unwrap();
        assert_eq!(unprocessed.len(), 1);
        assert!(unprocessed[0].processing_time.is_none());
    }
}
