//! Tenant-facing domain lifecycle operations.
//!
//! Composes the store, the DNS verifier, the route synchronizer and the
//! verification worker. Every operation on an existing domain checks that
//! it belongs to the calling tenant first.

use std::sync::Arc;

use serde::Serialize;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use super::model::{Domain, DomainKind, DomainPatch, VerificationInfo};
use super::name::{classify, normalize_name};
use crate::dns::DnsVerifier;
use crate::error::{GatewayError, Result};
use crate::proxy::RouteSynchronizer;
use crate::reconcile::{VerificationWorker, VerifyOutcome};
use crate::store::DomainStore;

/// A newly created domain plus DNS setup for custom domains.
#[derive(Debug, Clone, Serialize)]
pub struct CreatedDomain {
    pub domain: Domain,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_info: Option<VerificationInfo>,
}

pub struct DomainService {
    store: Arc<dyn DomainStore>,
    verifier: Arc<DnsVerifier>,
    routes: Arc<RouteSynchronizer>,
    worker: Arc<VerificationWorker>,
    base_domain: String,
}

impl DomainService {
    pub fn new(
        store: Arc<dyn DomainStore>,
        verifier: Arc<DnsVerifier>,
        routes: Arc<RouteSynchronizer>,
        worker: Arc<VerificationWorker>,
        base_domain: impl Into<String>,
    ) -> Self {
        Self {
            store,
            verifier,
            routes,
            worker,
            base_domain: base_domain.into(),
        }
    }

    async fn owned(&self, tenant_id: Uuid, id: Uuid) -> Result<Domain> {
        let domain = self.store.get(id).await?.ok_or(GatewayError::NotFound(id))?;
        if domain.tenant_id != tenant_id {
            tracing::warn!(domain_id = %id, tenant_id = %tenant_id, "Cross-tenant access denied");
            return Err(GatewayError::Forbidden);
        }
        Ok(domain)
    }

    /// Register a domain. Subdomains are live immediately; custom domains
    /// wait for DNS verification.
    pub async fn create(
        &self,
        tenant_id: Uuid,
        raw_name: &str,
        kind: Option<DomainKind>,
    ) -> Result<CreatedDomain> {
        let name = normalize_name(raw_name)?;
        let kind = classify(&name, &self.base_domain, kind)?;

        if self.store.get_by_name(&name).await?.is_some() {
            return Err(GatewayError::Conflict(name));
        }

        let domain = match kind {
            DomainKind::Subdomain => Domain::new_subdomain(tenant_id, name),
            DomainKind::Custom => Domain::new_custom(tenant_id, name),
        };
        self.store.create(&domain).await?;

        let verification_info = match domain.kind {
            DomainKind::Custom => Some(self.verifier.instructions(&domain)),
            DomainKind::Subdomain => {
                if let Err(error) = self.routes.add_route(&domain).await {
                    tracing::warn!(domain = %domain.name, error = %error, "Failed to add domain to proxy");
                }
                None
            }
        };

        tracing::info!(
            domain = %domain.name,
            kind = %domain.kind,
            verified = domain.verified,
            tenant_id = %tenant_id,
            "Domain created"
        );

        Ok(CreatedDomain {
            domain,
            verification_info,
        })
    }

    pub async fn get(&self, tenant_id: Uuid, id: Uuid) -> Result<Domain> {
        self.owned(tenant_id, id).await
    }

    /// Tenant's domains, newest first.
    pub async fn list(&self, tenant_id: Uuid) -> Result<Vec<Domain>> {
        Ok(self.store.list_by_tenant(tenant_id).await?)
    }

    pub async fn update(&self, tenant_id: Uuid, id: Uuid, patch: &DomainPatch) -> Result<Domain> {
        let domain = self.owned(tenant_id, id).await?;
        if patch.is_empty() {
            return Ok(domain);
        }
        let updated = self.store.update(id, patch).await?;
        tracing::info!(domain = %updated.name, "Domain updated");
        Ok(updated)
    }

    /// Remove a domain. The proxy route goes first so no route outlives
    /// its record.
    pub async fn delete(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
        let domain = self.owned(tenant_id, id).await?;

        if domain.verified {
            self.routes.remove_route(id).await;
        }
        self.store.delete(id).await?;

        tracing::info!(domain = %domain.name, tenant_id = %tenant_id, "Domain deleted");
        Ok(())
    }

    /// Make a verified domain the tenant's primary.
    pub async fn set_primary(&self, tenant_id: Uuid, id: Uuid) -> Result<Domain> {
        let domain = self.owned(tenant_id, id).await?;
        if !domain.verified {
            return Err(GatewayError::NotVerified(domain.name));
        }

        self.store.set_primary(tenant_id, id).await?;
        tracing::info!(domain = %domain.name, tenant_id = %tenant_id, "Primary domain updated");

        Ok(Domain {
            is_primary: true,
            ..domain
        })
    }

    pub async fn verify(
        &self,
        tenant_id: Uuid,
        id: Uuid,
        cancel: &CancellationToken,
    ) -> Result<VerifyOutcome> {
        self.owned(tenant_id, id).await?;
        self.worker.verify_now(id, cancel).await
    }

    /// Current DNS setup instructions for a custom domain.
    pub async fn instructions(&self, tenant_id: Uuid, id: Uuid) -> Result<VerificationInfo> {
        let domain = self.owned(tenant_id, id).await?;
        if domain.kind != DomainKind::Custom {
            return Err(GatewayError::NotCustom(domain.name));
        }
        Ok(self.verifier.instructions(&domain))
    }

    pub async fn route_count(&self) -> usize {
        self.routes.route_count().await
    }
}
