//! Directory reconciliation: mirror the extension roster and the CRM user
//! list into local tables.
//!
//! Remote entries are inserted or updated; local rows missing from the
//! remote directory are flagged inactive, never deleted. Each pass applies
//! its writes in one transaction.

use std::collections::{HashMap, HashSet};

use database::{extension, lead_owner, DatabaseError, Extension, LeadOwner};
use pipeline_core::{Crm, ExtensionEntry, Telephony};
use sqlx::SqlitePool;
use tracing::info;

use crate::error::Result;
use crate::stats::ReconcileStats;

/// Extension kinds mirrored locally; announcement, voicemail and similar
/// system extensions never take calls that matter here.
const MIRRORED_KINDS: [&str; 2] = ["User", "Department"];

/// Reconcile the local extension mirror against the PBX roster.
pub async fn sync_extensions(
    pool: &SqlitePool,
    telephony: &dyn Telephony,
) -> Result<ReconcileStats> {
    let roster: Vec<ExtensionEntry> = telephony
        .list_extensions()
        .await?
        .into_iter()
        .filter(|entry| {
            entry
                .kind
                .as_deref()
                .is_some_and(|kind| MIRRORED_KINDS.contains(&kind))
        })
        .collect();

    let existing = extension::list_all(pool).await?;
    let known: HashMap<&str, &Extension> = existing
        .iter()
        .map(|ext| (ext.extension_id.as_str(), ext))
        .collect();

    let mut stats = ReconcileStats {
        fetched: roster.len(),
        ..Default::default()
    };
    let mut seen = HashSet::new();

    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;
    for entry in &roster {
        let external = entry.external_id();
        let number = entry.extension_number.as_deref();
        let kind = entry.kind.as_deref();
        seen.insert(external.clone());

        match known.get(external.as_str()) {
            None => {
                extension::insert(&mut *tx, &external, &entry.name, number, kind).await?;
                stats.inserted += 1;
            }
            Some(current) => {
                let changed = current.name != entry.name
                    || current.extension_number.as_deref() != number
                    || current.kind.as_deref() != kind
                    || !current.enabled;
                if changed {
                    extension::update_fields(&mut *tx, &external, &entry.name, number, kind)
                        .await?;
                    stats.updated += 1;
                }
            }
        }
    }
    for current in &existing {
        if current.enabled && !seen.contains(&current.extension_id) {
            extension::disable(&mut *tx, &current.extension_id).await?;
            stats.deactivated += 1;
        }
    }
    tx.commit().await.map_err(DatabaseError::from)?;

    info!(
        fetched = stats.fetched,
        inserted = stats.inserted,
        updated = stats.updated,
        disabled = stats.deactivated,
        "extension reconciliation complete"
    );
    Ok(stats)
}

/// Reconcile the local lead-owner mirror against the CRM user list.
pub async fn sync_lead_owners(pool: &SqlitePool, crm: &dyn Crm) -> Result<ReconcileStats> {
    let users = crm.list_users().await?;

    let existing = lead_owner::list_all(pool).await?;
    let known: HashMap<&str, &LeadOwner> = existing
        .iter()
        .map(|owner| (owner.crm_id.as_str(), owner))
        .collect();

    let mut stats = ReconcileStats {
        fetched: users.len(),
        ..Default::default()
    };
    let mut seen = HashSet::new();

    let mut tx = pool.begin().await.map_err(DatabaseError::from)?;
    for user in &users {
        let role = user.role_name();
        let active = user.is_active();
        seen.insert(user.id.clone());

        match known.get(user.id.as_str()) {
            None => {
                lead_owner::insert(&mut *tx, &user.id, &user.full_name, &user.email, role, active)
                    .await?;
                stats.inserted += 1;
            }
            Some(current) => {
                let changed = current.name != user.full_name
                    || current.email != user.email
                    || current.role.as_deref() != role
                    || current.is_active != active;
                if changed {
                    lead_owner::update_fields(
                        &mut *tx,
                        &user.id,
                        &user.full_name,
                        &user.email,
                        role,
                        active,
                    )
                    .await?;
                    stats.updated += 1;
                }
            }
        }
    }
    for current in &existing {
        if current.is_active && !seen.contains(&current.crm_id) {
            lead_owner::deactivate(&mut *tx, &current.crm_id).await?;
            stats.deactivated += 1;
        }
    }
    tx.commit().await.map_err(DatabaseError::from)?;

    info!(
        fetched = stats.fetched,
        inserted = stats.inserted,
        updated = stats.updated,
        deactivated = stats.deactivated,
        "lead owner reconciliation complete"
    );
    Ok(stats)
}
