//! The sync engine between the telephony platform and the CRM.
//!
//! Three passes, each runnable on its own schedule:
//!
//! - [`reconcile`] - mirror the extension roster and CRM user list locally
//! - [`ingest`] - fetch call logs, qualify events, store new call records
//! - [`leads`] - turn unprocessed call records into CRM lead activity
//!
//! All passes talk to the platforms through the [`pipeline_core::Telephony`]
//! and [`pipeline_core::Crm`] seams, so they can be driven against mocks.

pub mod assign;
pub mod error;
pub mod ingest;
pub mod leads;
pub mod note;
pub mod reconcile;
pub mod stats;

#[cfg(test)]
pub(crate) mod testing;

pub use error::{PipelineError, Result};
pub use stats::{IngestStats, LeadSyncStats, ReconcileStats};
