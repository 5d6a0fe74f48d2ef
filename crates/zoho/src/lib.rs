//! Zoho CRM client.
//!
//! Implements the [`pipeline_core::Crm`] seam: refresh-grant token renewal
//! with bounded retries, one automatic refresh-and-retry on unauthorized
//! responses, lead search and mutation, notes with content-limit truncation,
//! and multipart file attachment.

mod api_types;
mod client;
mod config;

pub use client::ZohoClient;
pub use config::ZohoConfig;
