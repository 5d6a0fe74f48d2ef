//! Pipeline error type.

use thiserror::Error;

/// Errors surfaced by a sync pass.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Database(#[from] database::DatabaseError),

    #[error(transparent)]
    Sync(#[from] pipeline_core::SyncError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;
