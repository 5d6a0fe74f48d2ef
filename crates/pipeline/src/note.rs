//! CRM text formatting: call notes, lead fields, attachment filenames.

use chrono::{DateTime, Utc};
use database::CallRecord;

/// Title of the note appended to a lead for every synced call.
pub const NOTE_TITLE: &str = "Call Information";

/// CRM lead status for a stored call type.
pub fn lead_status_for(call_type: &str) -> &'static str {
    if call_type == "Missed" {
        "Missed Call"
    } else {
        "Accepted Call"
    }
}

/// The note body recorded against a lead for one call.
pub fn format_call_note(call: &CallRecord) -> String {
    let call_time = call.start_time.format("%Y-%m-%d %H:%M:%S");
    let duration = match call.duration {
        Some(secs) if secs != 0 => format!("{secs} seconds"),
        _ => "unknown duration".to_string(),
    };
    let caller_name = call
        .caller_name
        .as_deref()
        .filter(|name| !name.is_empty())
        .unwrap_or("Unknown");
    let recording = if call.recording_id.is_some() { "Yes" } else { "No" };

    format!(
        "{call_type} call received on {call_time}\n\
         ---\n\
         Call time: {call_time}\n\
         Call direction: {direction}\n\
         Call duration: {duration}\n\
         Caller number: {caller_number}\n\
         Caller name: {caller_name}\n\
         Extension ID: {extension_id}\n\
         Recording available: {recording}\n\
         Call ID: {call_id}",
        call_type = call.call_type,
        direction = call.direction,
        caller_number = call.caller_number,
        extension_id = call.extension_id,
        call_id = call.call_id,
    )
}

/// Lead description for the create path.
pub fn lead_description(call: &CallRecord) -> String {
    format!(
        "Lead created from {} call received on {}",
        call.call_type.to_lowercase(),
        call.start_time.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Split a caller display name into CRM first/last name fields.
///
/// A single-token name becomes the first name; absent or empty names fall
/// back to the "Unknown Caller" placeholders.
pub fn split_caller_name(name: Option<&str>) -> (String, String) {
    match name.filter(|n| !n.trim().is_empty()) {
        Some(name) => match name.split_once(' ') {
            Some((first, rest)) => (first.to_string(), rest.to_string()),
            None => (name.to_string(), "Caller".to_string()),
        },
        None => ("Unknown".to_string(), "Caller".to_string()),
    }
}

/// File extension for a recording's content type.
pub fn file_extension_for(content_type: &str) -> &str {
    match content_type {
        "audio/mpeg" => "mp3",
        "audio/wav" => "wav",
        other => other.split_once('/').map(|(_, sub)| sub).unwrap_or("bin"),
    }
}

/// Attachment filename for a downloaded recording.
pub fn recording_filename(
    start_time: DateTime<Utc>,
    recording_id: &str,
    content_type: &str,
) -> String {
    format!(
        "{}_recording_{}.{}",
        start_time.format("%Y%m%d_%H%M%S"),
        recording_id,
        file_extension_for(content_type)
    )
}
