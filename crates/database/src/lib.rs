//! SQLite persistence layer for the call-to-lead sync pipeline.
//!
//! This crate provides async database operations for the credential store,
//! the extension and lead-owner mirrors, ingested call records, and local
//! lead projections, using SQLx with SQLite.
//!
//! # Example
//!
//! ```no_run
//! use database::{Database, extension};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     // Connect and run migrations
//!     let db = Database::connect("sqlite:callbridge.db?mode=rwc").await?;
//!     db.migrate().await?;
//!
//!     let enabled = extension::list_enabled(db.pool()).await?;
//!     println!("{} enabled extensions", enabled.len());
//!
//!     Ok(())
//! }
//! ```

pub mod call_record;
pub mod credential;
pub mod crypto;
pub mod error;
pub mod extension;
pub mod lead;
pub mod lead_owner;
pub mod models;

pub use crypto::SecretCipher;
pub use error::{DatabaseError, Result};
pub use models::{
    ApiCredential, CallRecord, Extension, Lead, LeadOwner, LeadUpsert, NewCallRecord,
};

use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use std::str::FromStr;

/// Database connection wrapper.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
}

impl Database {
    /// Default pool size for database connections.
    /// Sync jobs run sequentially, so a small pool is plenty.
    const DEFAULT_POOL_SIZE: u32 = 5;

    /// Connect to a SQLite database.
    ///
    /// The URL should be in the format `sqlite:path/to/db.sqlite?mode=rwc`.
    /// Use `sqlite::memory:` for tests.
    pub async fn connect(url: &str) -> Result<Self> {
        Self::connect_with_pool_size(url, Self::DEFAULT_POOL_SIZE).await
    }

    /// Connect to a SQLite database with a custom pool size.
    pub async fn connect_with_pool_size(url: &str, pool_size: u32) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .foreign_keys(true);

        let pool = SqlitePoolOptions::new()
            .max_connections(pool_size)
            .acquire_timeout(std::time::Duration::from_secs(30))
            .connect_with(options)
            .await?;

        tracing::info!(
            "Connected to database: {} (pool size: {})",
            url,
            pool_size
        );

        Ok(Self { pool })
    }

    /// Run database migrations.
    ///
    /// This should be called once after connecting to ensure the schema is up to date.
    pub async fn migrate(&self) -> Result<()> {
        tracing::info!("Running database migrations...");

        sqlx::migrate!("./migrations").run(&self.pool).await?;

        tracing::info!("Migrations complete");
        Ok(())
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Close the database connection pool.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
