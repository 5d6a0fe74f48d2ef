//! Wire types for the Zoho CRM REST API.

use serde::Deserialize;

/// OAuth refresh-grant response. A success body without `access_token`
/// happens on some Zoho error shapes and is treated as a failed attempt.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: Option<String>,
    pub expires_in: Option<i64>,
}

/// One page of the users listing.
#[derive(Debug, Deserialize)]
pub(crate) struct UserPage {
    #[serde(default)]
    pub users: Vec<pipeline_core::CrmUser>,
}

/// The `{"data": [...]}` envelope wrapping most record endpoints. Responses
/// without records answer 204 and never reach deserialization.
#[derive(Debug, Deserialize)]
pub(crate) struct DataEnvelope<T> {
    pub data: Vec<T>,
}

/// One record of a create/update response.
#[derive(Debug, Deserialize)]
pub(crate) struct MutationRecord {
    #[serde(default)]
    pub details: Option<RecordDetails>,
    #[serde(default)]
    pub id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(crate) struct RecordDetails {
    #[serde(default)]
    pub id: Option<String>,
}

impl MutationRecord {
    /// The created or updated record's id, wherever the response put it.
    pub fn record_id(self) -> Option<String> {
        self.details.and_then(|d| d.id).or(self.id)
    }
}
