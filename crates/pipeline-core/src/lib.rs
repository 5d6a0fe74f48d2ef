//! Core traits and types for the call-to-lead synchronization pipeline.
//!
//! This crate provides the shared interface between the sync engine and the
//! two external platforms it talks to:
//!
//! - [`Telephony`] - the PBX side: extension roster, call logs, recordings
//! - [`Crm`] - the CRM side: users, leads, notes, attachments
//! - [`CallEvent`] / [`qualify`] - raw call events and their classification
//! - [`TokenCache`] - near-expiry-aware bearer token caching
//! - [`SyncError`] - the error taxonomy shared by all pipeline operations
//!
//! # Example
//!
//! ```rust
//! use pipeline_core::{qualify, CallEvent, Qualification};
//!
//! let event: CallEvent = serde_json::from_str(
//!     r#"{"id":"c1","direction":"Inbound","result":"Missed","legs":[{"result":"Missed"}]}"#,
//! ).unwrap();
//! assert_eq!(qualify(&event), Qualification::Missed);
//! ```

mod call;
mod crm;
mod error;
mod qualifier;
mod token;
mod traits;

pub use call::{CallEvent, CallLeg, CallerInfo, ExtensionEntry, RecordingContent, RecordingInfo};
pub use crm::{CrmLead, CrmUser, NewLead, OwnerRef, RoleRef};
pub use error::SyncError;
pub use qualifier::{qualify, Qualification};
pub use token::TokenCache;
pub use traits::{Crm, Telephony};

// Re-export async_trait for implementors.
pub use async_trait::async_trait;
