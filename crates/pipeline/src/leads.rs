//! Lead synchronization: turn unprocessed call records into CRM activity.
//!
//! Each call is atomically claimed before any CRM traffic, so overlapping
//! runs never double-process it. A call whose sync fails is released back to
//! the unprocessed set; calls without a caller number stay claimed, there is
//! nothing to retry.

use chrono::Utc;
use database::{call_record, lead, lead_owner, CallRecord, DatabaseError, LeadUpsert};
use pipeline_core::{Crm, NewLead, OwnerRef, Telephony};
use sqlx::SqlitePool;
use tracing::{error, info, warn};

use crate::assign::AssignmentTracker;
use crate::error::Result;
use crate::note::{
    format_call_note, lead_description, lead_status_for, recording_filename, split_caller_name,
    NOTE_TITLE,
};
use crate::stats::LeadSyncStats;

enum Outcome {
    Created,
    Updated,
}

/// Sync every unprocessed call record into the CRM.
pub async fn sync_unprocessed(
    pool: &SqlitePool,
    telephony: &dyn Telephony,
    crm: &dyn Crm,
) -> Result<LeadSyncStats> {
    let owners = lead_owner::list_active(pool).await?;
    if owners.is_empty() {
        warn!("no active lead owners, skipping lead sync");
        return Ok(LeadSyncStats::default());
    }

    let calls = call_record::list_unprocessed(pool).await?;
    if calls.is_empty() {
        return Ok(LeadSyncStats::default());
    }

    let mut stats = LeadSyncStats {
        total: calls.len(),
        ..Default::default()
    };
    let mut tracker = AssignmentTracker::new(owners);

    for call in calls {
        if !call_record::claim(pool, call.id, Utc::now()).await? {
            // A concurrent run got there first.
            stats.processed += 1;
            continue;
        }

        if call.caller_number.is_empty() {
            warn!(call_id = %call.call_id, "call has no caller number, nothing to sync");
            stats.processed += 1;
            continue;
        }

        match sync_one(pool, telephony, crm, &call, &mut tracker).await {
            Ok(Outcome::Created) => {
                stats.created += 1;
                stats.processed += 1;
            }
            Ok(Outcome::Updated) => {
                stats.updated += 1;
                stats.processed += 1;
            }
            Err(e) => {
                error!(call_id = %call.call_id, error = %e, "lead sync failed, releasing call");
                call_record::release(pool, call.id).await?;
                stats.failed += 1;
            }
        }
    }

    info!(
        total = stats.total,
        processed = stats.processed,
        created = stats.created,
        updated = stats.updated,
        failed = stats.failed,
        "lead synchronization complete"
    );
    Ok(stats)
}

async fn sync_one(
    pool: &SqlitePool,
    telephony: &dyn Telephony,
    crm: &dyn Crm,
    call: &CallRecord,
    tracker: &mut AssignmentTracker,
) -> Result<Outcome> {
    let status = lead_status_for(&call.call_type);

    match crm.search_lead_by_phone(&call.caller_number).await? {
        Some(existing) => {
            crm.update_lead_status(&existing.id, status).await?;
            crm.add_note(&existing.id, NOTE_TITLE, &format_call_note(call)).await?;

            let owner_row_id = match &existing.owner {
                Some(owner) => match lead_owner::get_by_crm_id(pool, &owner.id).await {
                    Ok(local) => Some(local.id),
                    Err(DatabaseError::NotFound { .. }) => None,
                    Err(e) => return Err(e.into()),
                },
                None => None,
            };

            lead::upsert(
                pool,
                &LeadUpsert {
                    crm_lead_id: existing.id.clone(),
                    call_record_id: Some(call.id),
                    lead_owner_id: owner_row_id,
                    phone_number: call.caller_number.clone(),
                    first_name: existing.first_name.clone(),
                    last_name: existing.last_name.clone(),
                    email: existing.email.clone(),
                    lead_source: existing.lead_source.clone(),
                    lead_status: Some(status.to_string()),
                    note_added: true,
                    synced_at: Utc::now(),
                },
            )
            .await?;

            maybe_attach_recording(pool, telephony, crm, call, &existing.id).await;
            Ok(Outcome::Updated)
        }
        None => {
            let owner = tracker.next_owner(pool).await?;
            let (first_name, last_name) = split_caller_name(call.caller_name.as_deref());

            let new_lead = NewLead {
                first_name: first_name.clone(),
                last_name: last_name.clone(),
                phone: call.caller_number.clone(),
                lead_source: "Unknown".to_string(),
                lead_status: status.to_string(),
                description: lead_description(call),
                owner: OwnerRef {
                    id: owner.crm_id.clone(),
                },
            };

            let lead_id = crm.create_lead(&new_lead).await?;
            crm.add_note(&lead_id, NOTE_TITLE, &format_call_note(call)).await?;

            lead::upsert(
                pool,
                &LeadUpsert {
                    crm_lead_id: lead_id.clone(),
                    call_record_id: Some(call.id),
                    lead_owner_id: Some(owner.id),
                    phone_number: call.caller_number.clone(),
                    first_name: Some(first_name),
                    last_name: Some(last_name),
                    email: None,
                    lead_source: Some("Unknown".to_string()),
                    lead_status: Some(status.to_string()),
                    note_added: true,
                    synced_at: Utc::now(),
                },
            )
            .await?;

            maybe_attach_recording(pool, telephony, crm, call, &lead_id).await;
            Ok(Outcome::Created)
        }
    }
}

/// Attach the call recording to the lead, for accepted calls that have one.
///
/// Attachment failures are logged and swallowed; the call still counts as
/// processed and the projection keeps `recording_attached` false.
async fn maybe_attach_recording(
    pool: &SqlitePool,
    telephony: &dyn Telephony,
    crm: &dyn Crm,
    call: &CallRecord,
    lead_id: &str,
) {
    let Some(recording_id) = call.recording_id.as_deref() else {
        return;
    };
    if call.call_type != "Accepted" {
        return;
    }

    match attach_recording(pool, telephony, crm, call, lead_id, recording_id).await {
        Ok(()) => info!(lead_id, recording_id, "recording attached to lead"),
        Err(e) => warn!(lead_id, recording_id, error = %e, "failed to attach recording"),
    }
}

async fn attach_recording(
    pool: &SqlitePool,
    telephony: &dyn Telephony,
    crm: &dyn Crm,
    call: &CallRecord,
    lead_id: &str,
    recording_id: &str,
) -> Result<()> {
    let content = telephony.fetch_recording(recording_id).await?;
    let filename = recording_filename(call.start_time, recording_id, &content.content_type);
    crm.attach_file(lead_id, &filename, &content.content_type, content.bytes)
        .await?;
    lead::set_recording_attached(pool, lead_id).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{MockCrm, MockTelephony};
    use database::{extension, Database, NewCallRecord};
    use pipeline_core::RecordingContent;

    async fn test_db() -> Database {
        let db = Database::connect("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        {
            let mut conn = db.pool().acquire().await.unwrap();
            extension::insert(&mut conn, "101", "Front Desk", Some("11"), Some("User"))
                .await
                .unwrap();
        }
        db
    }

    async fn seed_owners(db: &Database, crm_ids: &[&str]) {
        let mut conn = db.pool().acquire().await.unwrap();
        for crm_id in crm_ids {
            lead_owner::insert(&mut conn, crm_id, crm_id, "x@example.com", Some("Rep"), true)
                .await
                .unwrap();
        }
    }

    async fn seed_call(db: &Database, call_id: &str, phone: &str, call_type: &str) {
        seed_call_full(db, call_id, phone, call_type, None, None).await;
    }

    async fn seed_call_full(
        db: &Database,
        call_id: &str,
        phone: &str,
        call_type: &str,
        caller_name: Option<&str>,
        recording_id: Option<&str>,
    ) {
        call_record::try_insert(
            db.pool(),
            &NewCallRecord {
                call_id: call_id.to_string(),
                extension_id: "101".to_string(),
                call_type: call_type.to_string(),
                direction: "Inbound".to_string(),
                caller_number: phone.to_string(),
                caller_name: caller_name.map(str::to_string),
                start_time: Utc::now(),
                end_time: None,
                duration: Some(25),
                recording_id: recording_id.map(str::to_string),
                recording_url: None,
                raw_payload: Some("{}".to_string()),
            },
        )
        .await
        .unwrap();
    }

    #[tokio::test]
    async fn test_new_leads_rotate_through_owners() {
        let db = test_db().await;
        seed_owners(&db, &["alice", "bob"]).await;
        seed_call(&db, "c1", "+15550001111", "Missed").await;
        seed_call(&db, "c2", "+15550002222", "Missed").await;
        seed_call(&db, "c3", "+15550003333", "Accepted").await;

        let telephony = MockTelephony::new();
        let crm = MockCrm::new();
        let stats = sync_unprocessed(db.pool(), &telephony, &crm).await.unwrap();

        assert_eq!(stats.total, 3);
        assert_eq!(stats.created, 3);
        assert_eq!(stats.processed, 3);
        assert_eq!(stats.failed, 0);

        let created = crm.created.lock().unwrap();
        let owners: Vec<&str> = created.iter().map(|l| l.owner.id.as_str()).collect();
        assert_eq!(owners, ["alice", "bob", "alice"]);
        assert_eq!(created[0].lead_status, "Missed Call");
        assert_eq!(created[2].lead_status, "Accepted Call");
        assert_eq!(created[0].first_name, "Unknown");
        assert_eq!(created[0].last_name, "Caller");
        drop(created);

        // One note per call, titled consistently.
        let notes = crm.notes.lock().unwrap();
        assert_eq!(notes.len(), 3);
        assert!(notes.iter().all(|(_, title, _)| title == NOTE_TITLE));
        drop(notes);

        // Everything processed, projections stored, fairness persisted.
        assert!(call_record::list_unprocessed(db.pool()).await.unwrap().is_empty());
        assert_eq!(lead::count(db.pool()).await.unwrap(), 3);
        let alice = lead_owner::get_by_crm_id(db.pool(), "alice").await.unwrap();
        assert!(alice.last_assignment.is_some());
    }

    #[tokio::test]
    async fn test_existing_lead_is_updated_not_created() {
        let db = test_db().await;
        seed_owners(&db, &["alice"]).await;
        seed_call_full(&db, "c1", "+15550001111", "Accepted", Some("Jane Doe"), None).await;

        let telephony = MockTelephony::new();
        let crm = MockCrm::new().with_lead(
            "+15550001111",
            MockCrm::lead("L77", "Jane", "Doe", Some("alice")),
        );

        let stats = sync_unprocessed(db.pool(), &telephony, &crm).await.unwrap();
        assert_eq!(stats.updated, 1);
        assert_eq!(stats.created, 0);
        assert!(crm.created.lock().unwrap().is_empty());

        let updates = crm.status_updates.lock().unwrap();
        assert_eq!(updates.as_slice(), &[("L77".to_string(), "Accepted Call".to_string())]);
        drop(updates);

        // Projection links back to the local owner mirror.
        let projection = lead::get_by_crm_id(db.pool(), "L77").await.unwrap();
        let alice = lead_owner::get_by_crm_id(db.pool(), "alice").await.unwrap();
        assert_eq!(projection.lead_owner_id, Some(alice.id));
        assert_eq!(projection.lead_status.as_deref(), Some("Accepted Call"));
        assert!(projection.note_added);

        // The update path must not consume a round-robin slot.
        assert!(alice.last_assignment.is_none());
    }

    #[tokio::test]
    async fn test_no_active_owners_skips_the_pass() {
        let db = test_db().await;
        seed_call(&db, "c1", "+15550001111", "Missed").await;

        let telephony = MockTelephony::new();
        let crm = MockCrm::new();
        let stats = sync_unprocessed(db.pool(), &telephony, &crm).await.unwrap();

        assert_eq!(stats, LeadSyncStats::default());
        // Call left untouched for a later pass.
        assert_eq!(call_record::list_unprocessed(db.pool()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_call_without_caller_number_is_terminal() {
        let db = test_db().await;
        seed_owners(&db, &["alice"]).await;
        seed_call(&db, "c1", "", "Missed").await;

        let telephony = MockTelephony::new();
        let crm = MockCrm::new();
        let stats = sync_unprocessed(db.pool(), &telephony, &crm).await.unwrap();

        assert_eq!(stats.processed, 1);
        assert_eq!(stats.created, 0);
        assert!(crm.created.lock().unwrap().is_empty());
        // Claimed and never released: the pass will not see it again.
        assert!(call_record::list_unprocessed(db.pool()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_failed_sync_releases_the_call() {
        let db = test_db().await;
        seed_owners(&db, &["alice"]).await;
        seed_call(&db, "c1", "+15550001111", "Missed").await;

        let telephony = MockTelephony::new();
        let crm = MockCrm::new().failing_creates();
        let stats = sync_unprocessed(db.pool(), &telephony, &crm).await.unwrap();

        assert_eq!(stats.failed, 1);
        assert_eq!(stats.processed, 0);

        // Released for retry on the next pass.
        let unprocessed = call_record::list_unprocessed(db.pool()).await.unwrap();
        assert_eq!(unprocessed.len(), 1);
        assert_eq!(unprocessed[0].call_id, "c1");
        assert_eq!(lead::count(db.pool()).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_recording_attached_for_accepted_calls_only() {
        let db = test_db().await;
        seed_owners(&db, &["alice"]).await;
        seed_call_full(&db, "c1", "+15550001111", "Accepted", None, Some("rec-1")).await;
        seed_call_full(&db, "c2", "+15550002222", "Missed", None, Some("rec-2")).await;

        let telephony = MockTelephony::new().with_recording(
            "rec-1",
            RecordingContent {
                bytes: b"AUDIO".to_vec(),
                content_type: "audio/mpeg".to_string(),
            },
        );
        let crm = MockCrm::new();
        let stats = sync_unprocessed(db.pool(), &telephony, &crm).await.unwrap();
        assert_eq!(stats.created, 2);

        let attachments = crm.attachments.lock().unwrap();
        assert_eq!(attachments.len(), 1);
        let (lead_id, filename, content_type, size) = &attachments[0];
        assert_eq!(lead_id, "L1");
        assert!(filename.ends_with("_recording_rec-1.mp3"));
        assert_eq!(content_type, "audio/mpeg");
        assert_eq!(*size, 5);
        drop(attachments);

        let projection = lead::get_by_crm_id(db.pool(), "L1").await.unwrap();
        assert!(projection.recording_attached);
        let projection = lead::get_by_crm_id(db.pool(), "L2").await.unwrap();
        assert!(!projection.recording_attached);
    }

    #[tokio::test]
    async fn test_recording_fetch_failure_does_not_fail_the_call() {
        let db = test_db().await;
        seed_owners(&db, &["alice"]).await;
        seed_call_full(&db, "c1", "+15550001111", "Accepted", None, Some("rec-gone")).await;

        // No scripted recording: the fetch fails, the call still processes.
        let telephony = MockTelephony::new();
        let crm = MockCrm::new();
        let stats = sync_unprocessed(db.pool(), &telephony, &crm).await.unwrap();

        assert_eq!(stats.created, 1);
        assert_eq!(stats.failed, 0);
        assert!(call_record::list_unprocessed(db.pool()).await.unwrap().is_empty());
        let projection = lead::get_by_crm_id(db.pool(), "L1").await.unwrap();
        assert!(!projection.recording_attached);
    }
}
