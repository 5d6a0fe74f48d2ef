//! Extension mirror operations.
//!
//! Write operations take a `SqliteConnection` so a reconciliation pass can
//! apply all of its mutations inside one transaction.

use sqlx::{SqliteConnection, SqlitePool};

use crate::error::Result;
use crate::models::Extension;

/// List all mirrored extensions.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<Extension>> {
    let extensions = sqlx::query_as::<_, Extension>(
        r#"
        SELECT id, extension_id, name, extension_number, kind, enabled
        FROM extensions
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(extensions)
}

/// List extensions currently enabled.
pub async fn list_enabled(pool: &SqlitePool) -> Result<Vec<Extension>> {
    let extensions = sqlx::query_as::<_, Extension>(
        r#"
        SELECT id, extension_id, name, extension_number, kind, enabled
        FROM extensions
        WHERE enabled = 1
        ORDER BY id
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(extensions)
}

/// Insert a newly seen extension, enabled.
pub async fn insert(
    conn: &mut SqliteConnection,
    extension_id: &str,
    name: &str,
    extension_number: Option<&str>,
    kind: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO extensions (extension_id, name, extension_number, kind, enabled)
        VALUES (?, ?, ?, ?, 1)
        "#,
    )
    .bind(extension_id)
    .bind(name)
    .bind(extension_number)
    .bind(kind)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update the mutable fields of a mirrored extension and re-enable it.
pub async fn update_fields(
    conn: &mut SqliteConnection,
    extension_id: &str,
    name: &str,
    extension_number: Option<&str>,
    kind: Option<&str>,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE extensions
        SET name = ?, extension_number = ?, kind = ?, enabled = 1,
            updated_at = datetime('now')
        WHERE extension_id = ?
        "#,
    )
    .bind(name)
    .bind(extension_number)
    .bind(kind)
    .bind(extension_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Disable an extension that disappeared from the roster.
pub async fn disable(conn: &mut SqliteConnection, extension_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE extensions
        SET enabled = 0, updated_at = datetime('now')
        WHERE extension_id = ?
        "#,
    )
    .bind(extension_id)
    .execute(conn)
    .await?;

    Ok(())
}
