//! Credential store operations.
//!
//! Secrets live encrypted in `api_credentials` and are decrypted only in
//! memory. When no active database row exists for a (service, name) pair the
//! lookup falls back to the `{SERVICE}_{NAME}` environment variable, so a
//! deployment can run without administrative setup.

use sqlx::SqlitePool;

use crate::crypto::SecretCipher;
use crate::error::Result;
use crate::models::ApiCredential;

/// Create or update a credential, encrypting the value at rest.
pub async fn upsert_credential(
    pool: &SqlitePool,
    cipher: &SecretCipher,
    service: &str,
    name: &str,
    value: &str,
    is_active: bool,
) -> Result<()> {
    let encrypted = cipher.encrypt(value)?;

    sqlx::query(
        r#"
        INSERT INTO api_credentials (service, name, encrypted_value, is_active)
        VALUES (?, ?, ?, ?)
        ON CONFLICT(service, name) DO UPDATE SET
            encrypted_value = excluded.encrypted_value,
            is_active = excluded.is_active,
            updated_at = datetime('now')
        "#,
    )
    .bind(service)
    .bind(name)
    .bind(&encrypted)
    .bind(is_active)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get a credential row by (service, name), active or not.
pub async fn get_credential(
    pool: &SqlitePool,
    service: &str,
    name: &str,
) -> Result<Option<ApiCredential>> {
    let record = sqlx::query_as::<_, ApiCredential>(
        r#"
        SELECT id, service, name, encrypted_value, is_active
        FROM api_credentials
        WHERE service = ? AND name = ?
        "#,
    )
    .bind(service)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    Ok(record)
}

/// Resolve a secret value for (service, name).
///
/// An active database row wins; otherwise the `{SERVICE}_{NAME}` environment
/// variable (uppercased) is consulted. Returns `None` when neither source has
/// a value.
pub async fn secret(
    pool: &SqlitePool,
    cipher: &SecretCipher,
    service: &str,
    name: &str,
) -> Result<Option<String>> {
    let record = sqlx::query_as::<_, ApiCredential>(
        r#"
        SELECT id, service, name, encrypted_value, is_active
        FROM api_credentials
        WHERE service = ? AND name = ? AND is_active = 1
        "#,
    )
    .bind(service)
    .bind(name)
    .fetch_optional(pool)
    .await?;

    if let Some(record) = record {
        return Ok(Some(cipher.decrypt(&record.encrypted_value)?));
    }

    let env_var = format!(
        "{}_{}",
        service.to_uppercase(),
        name.to_uppercase()
    );
    Ok(std::env::var(&env_var).ok().filter(|v| !v.is_empty()))
}
