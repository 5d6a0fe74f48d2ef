//! Telephony-side wire types.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::Value;

/// One entry of the PBX extension roster.
///
/// Extension ids are numeric on the wire; the pipeline keys its local mirror
/// by their decimal string form.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtensionEntry {
    pub id: i64,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub extension_number: Option<String>,
    /// "User", "Department", "Announcement", "Voicemail", ...
    #[serde(rename = "type", default)]
    pub kind: Option<String>,
}

impl ExtensionEntry {
    /// External id as stored in the local mirror.
    pub fn external_id(&self) -> String {
        self.id.to_string()
    }
}

/// Caller party of a call event.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerInfo {
    #[serde(default)]
    pub phone_number: String,
    #[serde(default)]
    pub name: Option<String>,
}

/// A single leg of a call event.
#[derive(Debug, Clone, Deserialize)]
pub struct CallLeg {
    #[serde(default)]
    pub result: String,
}

/// Recording reference attached to a call event.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordingInfo {
    pub id: String,
    #[serde(default)]
    pub content_uri: Option<String>,
}

/// A raw call event from the telephony platform's call log.
///
/// The original JSON record is retained in `raw` for audit storage; the typed
/// fields cover everything the qualifier and ingestor read.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub direction: String,
    #[serde(default)]
    pub result: String,
    #[serde(default)]
    pub from: CallerInfo,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub duration: Option<i64>,
    pub recording: Option<RecordingInfo>,
    #[serde(default)]
    pub legs: Vec<CallLeg>,
    /// The untouched wire record, kept for audit.
    #[serde(skip)]
    pub raw: Value,
}

impl CallEvent {
    /// Parse a call event from a raw JSON record, retaining the original.
    pub fn from_raw(raw: Value) -> Result<Self, serde_json::Error> {
        let mut event: CallEvent = serde_json::from_value(raw.clone())?;
        event.raw = raw;
        Ok(event)
    }
}

/// Downloaded recording audio.
#[derive(Debug, Clone)]
pub struct RecordingContent {
    pub bytes: Vec<u8>,
    pub content_type: String,
}
