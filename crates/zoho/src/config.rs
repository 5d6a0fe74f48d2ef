//! Zoho credential loading.

use database::{credential, SecretCipher};
use pipeline_core::SyncError;
use sqlx::SqlitePool;

/// Credential service name in the store and env fallback prefix.
pub const SERVICE: &str = "zoho";

const DEFAULT_API_URL: &str = "https://www.zohoapis.com/crm/v7";
const DEFAULT_ACCOUNTS_URL: &str = "https://accounts.zoho.com";

/// Connection settings for the Zoho CRM API.
#[derive(Debug, Clone)]
pub struct ZohoConfig {
    /// Base URL for CRM record endpoints, version path included.
    pub api_url: String,
    /// Base URL for the OAuth accounts server.
    pub accounts_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Long-lived refresh token used to mint access tokens.
    pub refresh_token: String,
}

impl ZohoConfig {
    /// Load credentials from the store, falling back to `ZOHO_*` environment
    /// variables for entries with no active row.
    pub async fn load(pool: &SqlitePool, cipher: &SecretCipher) -> Result<Self, SyncError> {
        let client_id = required(pool, cipher, "client_id").await?;
        let client_secret = required(pool, cipher, "client_secret").await?;
        let refresh_token = required(pool, cipher, "refresh_token").await?;
        let api_url = optional(pool, cipher, "api_url")
            .await?
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let accounts_url = optional(pool, cipher, "accounts_url")
            .await?
            .unwrap_or_else(|| DEFAULT_ACCOUNTS_URL.to_string());

        Ok(Self {
            api_url,
            accounts_url,
            client_id,
            client_secret,
            refresh_token,
        })
    }
}

async fn optional(
    pool: &SqlitePool,
    cipher: &SecretCipher,
    name: &str,
) -> Result<Option<String>, SyncError> {
    credential::secret(pool, cipher, SERVICE, name)
        .await
        .map_err(|e| SyncError::Credential(format!("credential lookup failed for {SERVICE}/{name}: {e}")))
}

async fn required(pool: &SqlitePool, cipher: &SecretCipher, name: &str) -> Result<String, SyncError> {
    optional(pool, cipher, name)
        .await?
        .ok_or_else(|| SyncError::Credential(format!("missing credential {SERVICE}/{name}")))
}
