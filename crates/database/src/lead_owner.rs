//! Lead owner mirror operations.
//!
//! Reconciliation writes take a `SqliteConnection` for transactional
//! application; `touch_assignment` commits on its own so round-robin state
//! survives a mid-run failure.

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};

use crate::error::{DatabaseError, Result};
use crate::models::LeadOwner;

const COLUMNS: &str = "id, crm_id, name, email, role, is_active, last_assignment";

/// List all mirrored lead owners.
pub async fn list_all(pool: &SqlitePool) -> Result<Vec<LeadOwner>> {
    let owners = sqlx::query_as::<_, LeadOwner>(&format!(
        "SELECT {COLUMNS} FROM lead_owners ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(owners)
}

/// List active lead owners in stable (insertion) order.
pub async fn list_active(pool: &SqlitePool) -> Result<Vec<LeadOwner>> {
    let owners = sqlx::query_as::<_, LeadOwner>(&format!(
        "SELECT {COLUMNS} FROM lead_owners WHERE is_active = 1 ORDER BY id"
    ))
    .fetch_all(pool)
    .await?;

    Ok(owners)
}

/// Get a lead owner by external CRM id.
pub async fn get_by_crm_id(pool: &SqlitePool, crm_id: &str) -> Result<LeadOwner> {
    sqlx::query_as::<_, LeadOwner>(&format!(
        "SELECT {COLUMNS} FROM lead_owners WHERE crm_id = ?"
    ))
    .bind(crm_id)
    .fetch_optional(pool)
    .await?
    .ok_or_else(|| DatabaseError::NotFound {
        entity: "LeadOwner",
        id: crm_id.to_string(),
    })
}

/// Insert a newly seen CRM user.
pub async fn insert(
    conn: &mut SqliteConnection,
    crm_id: &str,
    name: &str,
    email: &str,
    role: Option<&str>,
    is_active: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO lead_owners (crm_id, name, email, role, is_active)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(crm_id)
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(is_active)
    .execute(conn)
    .await?;

    Ok(())
}

/// Update the mutable fields of a mirrored lead owner.
pub async fn update_fields(
    conn: &mut SqliteConnection,
    crm_id: &str,
    name: &str,
    email: &str,
    role: Option<&str>,
    is_active: bool,
) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE lead_owners
        SET name = ?, email = ?, role = ?, is_active = ?,
            updated_at = datetime('now')
        WHERE crm_id = ?
        "#,
    )
    .bind(name)
    .bind(email)
    .bind(role)
    .bind(is_active)
    .bind(crm_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Deactivate an owner that disappeared from the CRM.
pub async fn deactivate(conn: &mut SqliteConnection, crm_id: &str) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE lead_owners
        SET is_active = 0, updated_at = datetime('now')
        WHERE crm_id = ?
        "#,
    )
    .bind(crm_id)
    .execute(conn)
    .await?;

    Ok(())
}

/// Record that an owner was just assigned a lead. Persisted immediately so
/// round-robin fairness survives a mid-run failure.
pub async fn touch_assignment(
    pool: &SqlitePool,
    crm_id: &str,
    when: DateTime<Utc>,
) -> Result<()> {
    let result = sqlx::query(
        r#"
        UPDATE lead_owners
        SET last_assignment = ?, updated_at = datetime('now')
        WHERE crm_id = ?
        "#,
    )
    .bind(when)
    .bind(crm_id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound {
            entity: "LeadOwner",
            id: crm_id.to_string(),
        });
    }

    Ok(())
}
