//! Round-robin lead owner assignment.

use chrono::Utc;
use database::{lead_owner, DatabaseError, LeadOwner};
use sqlx::SqlitePool;

/// Rotates lead ownership through the active owners in stable order.
///
/// The cursor starts just past the owner with the most recent persisted
/// assignment, so fairness carries across runs and restarts. Each handout is
/// written back through [`lead_owner::touch_assignment`] before the lead is
/// created; a failed create still advances the rotation.
#[derive(Debug)]
pub struct AssignmentTracker {
    owners: Vec<LeadOwner>,
    cursor: usize,
}

impl AssignmentTracker {
    pub fn new(owners: Vec<LeadOwner>) -> Self {
        let cursor = owners
            .iter()
            .enumerate()
            .filter_map(|(i, owner)| owner.last_assignment.map(|at| (i, at)))
            .max_by_key(|&(_, at)| at)
            .map(|(i, _)| (i + 1) % owners.len())
            .unwrap_or(0);

        Self { owners, cursor }
    }

    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    /// Hand out the next owner in rotation, persisting the assignment time.
    pub async fn next_owner(&mut self, pool: &SqlitePool) -> Result<LeadOwner, DatabaseError> {
        if self.owners.is_empty() {
            return Err(DatabaseError::NotFound {
                entity: "LeadOwner",
                id: "no active owners".to_string(),
            });
        }

        let index = self.cursor;
        self.cursor = (self.cursor + 1) % self.owners.len();

        let when = Utc::now();
        lead_owner::touch_assignment(pool, &self.owners[index].crm_id, when).await?;
        self.owners[index].last_assignment = Some(when);

        Ok(self.owners[index].clone())
    }
}
