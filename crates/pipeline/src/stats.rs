//! Per-pass counters, logged by the worker after each run.

/// Outcome of one directory reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReconcileStats {
    /// Entries fetched from the platform after filtering.
    pub fetched: usize,
    pub inserted: usize,
    pub updated: usize,
    /// Local rows flagged inactive because they left the remote directory.
    pub deactivated: usize,
}

/// Outcome of one call ingestion pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Call events fetched across all enabled extensions.
    pub fetched: usize,
    /// New call records stored.
    pub ingested: usize,
    pub accepted: usize,
    pub missed: usize,
    /// Events dropped as unqualified or already ingested.
    pub skipped: usize,
    /// Extensions whose call-log fetch failed; the pass continues past them.
    pub extensions_failed: usize,
}

/// Outcome of one lead synchronization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LeadSyncStats {
    /// Unprocessed call records picked up at the start of the pass.
    pub total: usize,
    /// Records that reached a terminal processed state this pass.
    pub processed: usize,
    pub created: usize,
    pub updated: usize,
    /// Records released back to the unprocessed set after a failure.
    pub failed: usize,
}
