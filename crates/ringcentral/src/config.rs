//! RingCentral credential loading.

use database::{credential, SecretCipher};
use pipeline_core::SyncError;
use sqlx::SqlitePool;

/// Credential service name in the store and env fallback prefix.
pub const SERVICE: &str = "ringcentral";

const DEFAULT_API_URL: &str = "https://platform.ringcentral.com";
const DEFAULT_MEDIA_URL: &str = "https://media.ringcentral.com";

/// Connection settings for the RingCentral REST API.
#[derive(Debug, Clone)]
pub struct RingCentralConfig {
    /// Base URL for REST and OAuth endpoints.
    pub api_url: String,
    /// Base URL for recording content downloads.
    pub media_url: String,
    pub client_id: String,
    pub client_secret: String,
    /// Signed JWT assertion for the token exchange.
    pub jwt_token: String,
    /// Account selector; "~" means the account the credentials belong to.
    pub account_id: String,
}

impl RingCentralConfig {
    /// Load credentials from the store, falling back to `RINGCENTRAL_*`
    /// environment variables for entries with no active row.
    pub async fn load(pool: &SqlitePool, cipher: &SecretCipher) -> Result<Self, SyncError> {
        let client_id = required(pool, cipher, "client_id").await?;
        let client_secret = required(pool, cipher, "client_secret").await?;
        let jwt_token = required(pool, cipher, "jwt_token").await?;
        let account_id = optional(pool, cipher, "account_id")
            .await?
            .unwrap_or_else(|| "~".to_string());
        let api_url = optional(pool, cipher, "api_url")
            .await?
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());
        let media_url = optional(pool, cipher, "media_url")
            .await?
            .unwrap_or_else(|| DEFAULT_MEDIA_URL.to_string());

        Ok(Self {
            api_url,
            media_url,
            client_id,
            client_secret,
            jwt_token,
            account_id,
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

#[cfg(test)]
mod tests {
    use super::*;
    use database::Database;

    #[tokio::test]
    async fn test_load_missing_required() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let cipher = SecretCipher::new([7u8; 32]);

        let result = RingCentralConfig::load(db.pool(), &cipher).await;
        assert!(matches!(result, Err(SyncError::Credential(_))));
    }

    #[tokio::test]
    async fn test_load_from_store_with_defaults() {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        let cipher = SecretCipher::new([7u8; 32]);

        for (name, value) in [
            ("client_id", "cid"),
            ("client_secret", "shh"),
            ("jwt_token", "signed.jwt"),
        ] {
            credential::upsert_credential(db.pool(), &cipher, SERVICE, name, value, true)
                .await
                .unwrap();
        }

        let config = RingCentralConfig::load(db.pool(), &cipher).await.unwrap();
        assert_eq!(config.client_id, "cid");
        assert_eq!(config.account_id, "~");
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }
}
