//! Service-level error type shared by the domain service, the worker and
//! the admin API.

use thiserror::Error;
use uuid::Uuid;

use crate::dns::VerifyError;
use crate::domain::NameError;
use crate::proxy::ProxyError;
use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("domain not found: {0}")]
    NotFound(Uuid),

    #[error("domain already exists: {0}")]
    Conflict(String),

    #[error("domain belongs to another tenant")]
    Forbidden,

    #[error("invalid domain name: {0}")]
    InvalidName(#[from] NameError),

    #[error("domain is not verified: {0}")]
    NotVerified(String),

    #[error("domain needs no DNS setup: {0}")]
    NotCustom(String),

    #[error("operation cancelled")]
    Cancelled,

    #[error("storage failure: {0}")]
    Store(StoreError),

    #[error("proxy update failed: {0}")]
    Proxy(#[from] ProxyError),
}

impl From<StoreError> for GatewayError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => GatewayError::NotFound(id),
            StoreError::Conflict(name) => GatewayError::Conflict(name),
            other => GatewayError::Store(other),
        }
    }
}

impl From<VerifyError> for GatewayError {
    fn from(err: VerifyError) -> Self {
        match err {
            VerifyError::Cancelled => GatewayError::Cancelled,
        }
    }
}

pub type Result<T> = std::result::Result<T, GatewayError>;
