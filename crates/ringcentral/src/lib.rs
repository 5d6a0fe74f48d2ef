//! RingCentral telephony client.
//!
//! Implements the [`pipeline_core::Telephony`] seam: signed-assertion token
//! exchange with near-expiry caching, paginated extension and call-log
//! listing with server-directed rate-limit handling, and recording downloads
//! with bounded backoff.

mod api_types;
mod client;
mod config;

pub use client::RingCentralClient;
pub use config::RingCentralConfig;
