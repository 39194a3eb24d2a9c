//! Domain persistence.
//!
//! Backend-agnostic storage interface with two implementations:
//! - `MemoryStore`: single-process, used in tests and development
//! - `SqliteStore`: durable, via sqlx
//!
//! Every targeted mutation reports a missing row as `StoreError::NotFound`
//! so callers can turn it into a negative result instead of a failure.

mod memory;
mod sqlite;

pub use memory::MemoryStore;
pub use sqlite::SqliteStore;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::config::{StoreBackend, StoreConfig};
use crate::domain::{Domain, DomainPatch};

/// Errors from storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("domain not found: {0}")]
    NotFound(Uuid),

    #[error("domain already exists: {0}")]
    Conflict(String),

    #[error("invalid state: {0}")]
    InvalidState(String),

    #[error("database error: {0}")]
    Database(String),

    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, StoreError>;

/// Durable record of every domain.
#[async_trait]
pub trait DomainStore: Send + Sync {
    /// Insert a new domain. Fails with `Conflict` if the name is taken.
    async fn create(&self, domain: &Domain) -> Result<()>;

    async fn get(&self, id: Uuid) -> Result<Option<Domain>>;

    async fn get_by_name(&self, name: &str) -> Result<Option<Domain>>;

    /// All domains of a tenant, newest first.
    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Domain>>;

    /// Custom domains awaiting verification, oldest first.
    async fn list_unverified_custom(&self) -> Result<Vec<Domain>>;

    /// Every verified domain, ordered by name.
    async fn list_verified(&self) -> Result<Vec<Domain>>;

    /// Verified custom domains whose route was never confirmed, oldest first.
    async fn list_unactivated(&self) -> Result<Vec<Domain>>;

    /// Set `verified` and stamp `verified_at`.
    async fn mark_verified(&self, id: Uuid) -> Result<()>;

    /// Set `ssl_issued`. Refused with `InvalidState` for unverified rows.
    async fn mark_ssl_issued(&self, id: Uuid) -> Result<()>;

    /// Apply auxiliary attribute changes and return the updated record.
    async fn update(&self, id: Uuid, patch: &DomainPatch) -> Result<Domain>;

    /// Make `id` the tenant's only primary domain, atomically.
    async fn set_primary(&self, tenant_id: Uuid, id: Uuid) -> Result<()>;

    async fn delete(&self, id: Uuid) -> Result<()>;
}

/// Open the store selected by configuration.
pub async fn open_store(config: &StoreConfig) -> Result<Arc<dyn DomainStore>> {
    match config.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory domain store; state is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Sqlite => {
            let store = SqliteStore::connect(&config.database_url, config.max_connections).await?;
            Ok(Arc::new(store))
        }
    }
}

#[cfg(test)]
mod tests;
