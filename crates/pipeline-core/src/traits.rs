//! Trait seams between the sync engine and the external platforms.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::call::{CallEvent, ExtensionEntry, RecordingContent};
use crate::crm::{CrmLead, CrmUser, NewLead};
use crate::error::SyncError;

/// The telephony platform boundary.
///
/// Implementations drain pagination fully and honor server-directed rate
/// limits internally; callers see complete result sets or a [`SyncError`].
#[async_trait]
pub trait Telephony: Send + Sync {
    /// The full extension roster, all pages.
    async fn list_extensions(&self) -> Result<Vec<ExtensionEntry>, SyncError>;

    /// Inbound voice call events for one extension in a time range, all pages.
    async fn list_call_log(
        &self,
        extension_id: &str,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<CallEvent>, SyncError>;

    /// Recorded audio for a call, with its content type.
    async fn fetch_recording(&self, recording_id: &str) -> Result<RecordingContent, SyncError>;
}

/// The CRM platform boundary.
#[async_trait]
pub trait Crm: Send + Sync {
    /// All CRM users, all pages.
    async fn list_users(&self) -> Result<Vec<CrmUser>, SyncError>;

    /// First lead whose phone number equals `phone`, if any.
    async fn search_lead_by_phone(&self, phone: &str) -> Result<Option<CrmLead>, SyncError>;

    /// Create a lead; returns the new lead's external id.
    async fn create_lead(&self, lead: &NewLead) -> Result<String, SyncError>;

    /// Update the status field of an existing lead.
    async fn update_lead_status(&self, lead_id: &str, status: &str) -> Result<(), SyncError>;

    /// Append a note to a lead.
    async fn add_note(&self, lead_id: &str, title: &str, content: &str) -> Result<(), SyncError>;

    /// Upload a file attachment to a lead.
    async fn attach_file(
        &self,
        lead_id: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), SyncError>;
}
