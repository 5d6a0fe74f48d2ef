//! Database models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// An encrypted API credential for an external service.
#[derive(Debug, Clone, PartialEq, Eq, FromRow)]
pub struct ApiCredential {
    /// Auto-incrementing ID.
    pub id: i64,
    /// Service the credential belongs to ("ringcentral", "zoho").
    pub service: String,
    /// Credential name (e.g. "client_id", "refresh_token").
    pub name: String,
    /// AES-256-GCM encrypted value in compact form.
    pub encrypted_value: String,
    /// Whether the credential should be used.
    pub is_active: bool,
}

/// Local mirror of a PBX extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Extension {
    /// Auto-incrementing ID.
    pub id: i64,
    /// External extension id (unique).
    pub extension_id: String,
    /// Display name.
    pub name: String,
    /// Dialable extension number, if any.
    pub extension_number: Option<String>,
    /// Extension kind ("User", "Department", ...).
    pub kind: Option<String>,
    /// False once the extension disappears from a roster fetch.
    pub enabled: bool,
}

/// Local mirror of a CRM user eligible to own leads.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct LeadOwner {
    /// Auto-incrementing ID.
    pub id: i64,
    /// External CRM user id (unique).
    pub crm_id: String,
    /// Full name.
    pub name: String,
    /// Email address.
    pub email: String,
    /// CRM role name, if any.
    pub role: Option<String>,
    /// False once the user disappears from the CRM or is deactivated there.
    pub is_active: bool,
    /// When this owner last received a lead via round-robin assignment.
    pub last_assignment: Option<DateTime<Utc>>,
}

/// An ingested call event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct CallRecord {
    /// Auto-incrementing ID.
    pub id: i64,
    /// External call id (unique, the sole dedup key).
    pub call_id: String,
    /// Extension the call was fetched for.
    pub extension_id: String,
    /// "Accepted" or "Missed".
    pub call_type: String,
    /// Call direction as reported by the platform.
    pub direction: String,
    /// Caller phone number; may be empty.
    pub caller_number: String,
    /// Caller display name, if any.
    pub caller_name: Option<String>,
    /// Call start time.
    pub start_time: DateTime<Utc>,
    /// Call end time, if reported.
    pub end_time: Option<DateTime<Utc>>,
    /// Duration in seconds, if reported.
    pub duration: Option<i64>,
    /// Recording id, if the call was recorded.
    pub recording_id: Option<String>,
    /// Recording content URI, if the call was recorded.
    pub recording_url: Option<String>,
    /// Original wire record, retained for audit.
    pub raw_payload: Option<String>,
    /// True once the call has been evaluated for a lead. Monotonic.
    pub processed: bool,
    /// When the call was processed.
    pub processing_time: Option<DateTime<Utc>>,
}

/// Insert payload for a call record.
#[derive(Debug, Clone)]
pub struct NewCallRecord {
    pub call_id: String,
    pub extension_id: String,
    pub call_type: String,
    pub direction: String,
    pub caller_number: String,
    pub caller_name: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub recording_id: Option<String>,
    pub recording_url: Option<String>,
    pub raw_payload: Option<String>,
}

/// Local projection of a CRM lead touched by the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct Lead {
    /// Auto-incrementing ID.
    pub id: i64,
    /// External CRM lead id (unique).
    pub crm_lead_id: String,
    /// Call record that last touched this lead.
    pub call_record_id: Option<i64>,
    /// Local row id of the owning lead owner, when resolvable.
    pub lead_owner_id: Option<i64>,
    /// Lead phone number.
    pub phone_number: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub lead_source: Option<String>,
    pub lead_status: Option<String>,
    /// True once a recording was attached in the CRM.
    pub recording_attached: bool,
    /// True once a call note was added in the CRM.
    pub note_added: bool,
    /// When the lead was last synchronized.
    pub synced_at: Option<DateTime<Utc>>,
}

/// Upsert payload for a lead projection, keyed by `crm_lead_id`.
#[derive(Debug, Clone)]
pub struct LeadUpsert {
    pub crm_lead_id: String,
    pub call_record_id: Option<i64>,
    pub lead_owner_id: Option<i64>,
    pub phone_number: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub lead_source: Option<String>,
    pub lead_status: Option<String>,
    pub note_added: bool,
    pub synced_at: DateTime<Utc>,
}
