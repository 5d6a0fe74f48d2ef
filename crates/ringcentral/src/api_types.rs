//! Wire types for the RingCentral REST API.

use serde::Deserialize;
use serde_json::Value;

/// OAuth token exchange response.
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    pub expires_in: Option<i64>,
}

/// One page of a paginated listing.
#[derive(Debug, Deserialize)]
pub(crate) struct RecordPage {
    #[serde(default)]
    pub records: Vec<Value>,
    #[serde(default)]
    pub paging: Paging,
}

#[derive(Debug, Deserialize)]
pub(crate) struct Paging {
    #[serde(rename = "totalPages", default = "default_total_pages")]
    pub total_pages: i64,
}

impl Default for Paging {
    fn default() -> Self {
        Self { total_pages: 1 }
    }
}

fn default_total_pages() -> i64 {
    1
}
