//! Error taxonomy for pipeline operations.

use thiserror::Error;

/// Errors surfaced by external-platform calls and the sync pipeline.
///
/// The variants carry the propagation policy of the pipeline:
///
/// - [`SyncError::Credential`] is fatal to the job invocation; the pipeline
///   never retries it internally, the scheduler may retry the whole job.
/// - [`SyncError::Transient`] means bounded or server-directed retries were
///   already exhausted; it surfaces as a per-entity failure.
/// - [`SyncError::AuthExpired`] means a request stayed unauthorized after the
///   single token refresh-and-retry.
/// - [`SyncError::Data`] marks a malformed external payload; the affected
///   entity is skipped or counted as failed, never crashing the pass.
#[derive(Debug, Error)]
pub enum SyncError {
    /// Missing or invalid secrets, or a failed token exchange.
    #[error("credential error: {0}")]
    Credential(String),

    /// Connection failure, 5xx, or rate limiting after retries.
    #[error("transient network error: {0}")]
    Transient(String),

    /// Request rejected as unauthorized after one token refresh.
    #[error("authorization expired: {0}")]
    AuthExpired(String),

    /// Malformed or incomplete payload from an external platform.
    #[error("malformed payload: {0}")]
    Data(String),
}
