//! Lead projection operations.

use sqlx::SqlitePool;

use crate::error::{DatabaseError, Result};
use crate::models::{Lead, LeadUpsert};

const COLUMNS: &str = "id, crm_lead_id, call_record_id, lead_owner_id, phone_number, \
                       first_name, last_name, email, lead_source, lead_status, \
                       recording_attached, note_added, synced_at";

/// Create or refresh the local projection of a CRM lead.
///
/// Keyed by the external lead id; a later call for the same lead moves the
/// projection to the newest call record and sync timestamp.
pub async fn upsert(pool: &SqlitePool, lead: &LeadUpsert) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO leads (
            crm_lead_id, call_record_id, lead_owner_id, phone_number,
            first_name, last_name, email, lead_source, lead_status,
            note_added, synced_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(crm_lead_id) DO UPDATE SET
            call_record_id = excluded.call_record_id,
            lead_owner_id = excluded.lead_owner_id,
            lead_status = excluded.lead_status,
            note_added = excluded.note_added,
            synced_at = excluded.synced_at,
            updated_at = datetime('now')
        "#,
    )
    .bind(&lead.crm_lead_id)
    .bind(lead.call_record_id)
    .bind(lead.lead_owner_id)
    .bind(&lead.phone_number)
    .bind(&lead.first_name)
    .bind(&lead.last_name)
    .bind(&lead.email)
    .bind(&lead.lead_source)
    .bind(&lead.lead_status)
    .bind(lead.note_added)
    .bind(lead.synced_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a lead projection by external CRM lead id.
pub async fn get_by_crm_id(pool: &SqlitePool, crm_lead_id: &str) -> Result<Lead> {
    sqlx::query_as::<_, Lead>(&format!(
        "SELECT {COLUMNS} FROM leads WHERE crm_lead_id = ?"
    ))
    .bind(crm_lead_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "Lead",
        id: crm_lead_id.to_string(),
    })
}

/// Flag that the call recording was attached in the CRM.
pub async fn set_recording_attached(pool: &SqlitePool, crm_lead_id: &str) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE leads
        SET recording_attached = 1, updated_at = datetime('now')
        WHERE crm_lead_id = ?
        "#,
    )
    .bind(crm_lead_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "Lead",
            id: crm_lead_id.to_string(),
        });
    }

    Ok(())
}

/// Count stored lead projections.
pub async fn count(pool: &SqlitePool) -> Result<i64> {
    let count = sqlx::query_scalar::<_, i64>(
        r#"
        SELECT COUNT(*) FROM leads
        "#,
    )
    .fetch_one(pool)
    .await?;

    Ok(count)
}
