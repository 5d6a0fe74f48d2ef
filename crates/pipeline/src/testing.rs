//! Scriptable platform mocks for pass-level tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use pipeline_core::{
    async_trait, CallEvent, Crm, CrmLead, CrmUser, ExtensionEntry, NewLead, RecordingContent,
    SyncError, Telephony,
};

/// Telephony mock backed by scripted rosters, call logs and recordings.
///
/// Extensions without a scripted call log fail their fetch, which is how
/// tests exercise the per-extension failure isolation of the ingest pass.
#[derive(Default)]
pub struct MockTelephony {
    extensions: Vec<ExtensionEntry>,
    calls: HashMap<String, Vec<CallEvent>>,
    recordings: HashMap<String, RecordingContent>,
}

impl MockTelephony {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_extensions(mut self, extensions: Vec<ExtensionEntry>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn with_calls(mut self, extension_id: &str, events: Vec<CallEvent>) -> Self {
        self.calls.insert(extension_id.to_string(), events);
        self
    }

    pub fn with_recording(mut self, recording_id: &str, content: RecordingContent) -> Self {
        self.recordings.insert(recording_id.to_string(), content);
        self
    }
}

#[async_trait]
impl Telephony for MockTelephony {
    async fn list_extensions(&self) -> Result<Vec<ExtensionEntry>, SyncError> {
        Ok(self.extensions.clone())
    }

    async fn list_call_log(
        &self,
        extension_id: &str,
        _from: DateTime<Utc>,
        _to: DateTime<Utc>,
    ) -> Result<Vec<CallEvent>, SyncError> {
        self.calls
            .get(extension_id)
            .cloned()
            .ok_or_else(|| SyncError::Transient(format!("no call log for {extension_id}")))
    }

    async fn fetch_recording(&self, recording_id: &str) -> Result<RecordingContent, SyncError> {
        self.recordings
            .get(recording_id)
            .cloned()
            .ok_or_else(|| SyncError::Transient(format!("no recording {recording_id}")))
    }
}

/// CRM mock recording every mutation it is asked to perform.
#[derive(Default)]
pub struct MockCrm {
    users: Vec<CrmUser>,
    leads_by_phone: HashMap<String, CrmLead>,
    fail_create: bool,
    next_lead_id: AtomicUsize,
    pub created: Mutex<Vec<NewLead>>,
    pub status_updates: Mutex<Vec<(String, String)>>,
    pub notes: Mutex<Vec<(String, String, String)>>,
    pub attachments: Mutex<Vec<(String, String, String, usize)>>,
}

impl MockCrm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_users(mut self, users: Vec<CrmUser>) -> Self {
        self.users = users;
        self
    }

    pub fn with_lead(mut self, phone: &str, lead: CrmLead) -> Self {
        self.leads_by_phone.insert(phone.to_string(), lead);
        self
    }

    pub fn failing_creates(mut self) -> Self {
        self.fail_create = true;
        self
    }

    pub fn user(id: &str, full_name: &str, status: &str) -> CrmUser {
        serde_json::from_value(serde_json::json!({
            "id": id,
            "full_name": full_name,
            "email": format!("{id}@example.com"),
            "role": {"name": "Sales Rep"},
            "status": status,
        }))
        .unwrap()
    }

    pub fn lead(id: &str, first_name: &str, last_name: &str, owner_id: Option<&str>) -> CrmLead {
        let mut value = serde_json::json!({
            "id": id,
            "First_Name": first_name,
            "Last_Name": last_name,
            "Lead_Source": "Unknown",
            "Lead_Status": "Missed Call",
        });
        if let Some(owner_id) = owner_id {
            value["Owner"] = serde_json::json!({"id": owner_id});
        }
        serde_json::from_value(value).unwrap()
    }
}

#[async_trait]
impl Crm for MockCrm {
    async fn list_users(&self) -> Result<Vec<CrmUser>, SyncError> {
        Ok(self.users.clone())
    }

    async fn search_lead_by_phone(&self, phone: &str) -> Result<Option<CrmLead>, SyncError> {
        Ok(self.leads_by_phone.get(phone).cloned())
    }

    async fn create_lead(&self, lead: &NewLead) -> Result<String, SyncError> {
        if self.fail_create {
            return Err(SyncError::Transient("lead create rejected".to_string()));
        }
        let id = format!("L{}", self.next_lead_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.created.lock().unwrap().push(lead.clone());
        Ok(id)
    }

    async fn update_lead_status(&self, lead_id: &str, status: &str) -> Result<(), SyncError> {
        self.status_updates
            .lock()
            .unwrap()
            .push((lead_id.to_string(), status.to_string()));
        Ok(())
    }

    async fn add_note(&self, lead_id: &str, title: &str, content: &str) -> Result<(), SyncError> {
        self.notes.lock().unwrap().push((
            lead_id.to_string(),
            title.to_string(),
            content.to_string(),
        ));
        Ok(())
    }

    async fn attach_file(
        &self,
        lead_id: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<(), SyncError> {
        self.attachments.lock().unwrap().push((
            lead_id.to_string(),
            filename.to_string(),
            content_type.to_string(),
            bytes.len(),
        ));
        Ok(())
    }
}
