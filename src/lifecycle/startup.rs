//! Startup orchestration.
//!
//! # Order
//! ```text
//! store → verifier → synchronizer → bootstrap rebuild → worker → admin listener
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal, including the bootstrap rebuild
//! - Subsystems initialize in order, not concurrently
//! - The listener starts last (traffic only when routes are in place)

use std::sync::Arc;

use thiserror::Error;
use tokio::net::TcpListener;

use super::Shutdown;
use crate::admin::AppState;
use crate::config::GatewayConfig;
use crate::dns::{DnsLookup, DnsVerifier, HickoryLookup, LookupError};
use crate::domain::DomainService;
use crate::http::HttpServer;
use crate::proxy::{CaddyAdminClient, ProxyAdmin, ProxyError, RouteSynchronizer};
use crate::reconcile::VerificationWorker;
use crate::store::{open_store, DomainStore, StoreError};

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("resolver: {0}")]
    Resolver(#[from] LookupError),

    #[error("proxy: {0}")]
    Proxy(#[from] ProxyError),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

/// Fully wired gateway components.
pub struct Gateway {
    pub store: Arc<dyn DomainStore>,
    pub verifier: Arc<DnsVerifier>,
    pub routes: Arc<RouteSynchronizer>,
    pub worker: Arc<VerificationWorker>,
    pub service: Arc<DomainService>,
}

impl Gateway {
    /// Wire components around the given collaborators.
    pub fn assemble(
        config: &GatewayConfig,
        store: Arc<dyn DomainStore>,
        lookup: Arc<dyn DnsLookup>,
        admin: Arc<dyn ProxyAdmin>,
    ) -> Self {
        let verifier = Arc::new(DnsVerifier::new(lookup, &config.dns));
        let routes = Arc::new(RouteSynchronizer::new(admin, &config.proxy, &config.dns));
        let worker = Arc::new(VerificationWorker::new(
            store.clone(),
            verifier.clone(),
            routes.clone(),
            &config.worker,
        ));
        let service = Arc::new(DomainService::new(
            store.clone(),
            verifier.clone(),
            routes.clone(),
            worker.clone(),
            config.proxy.base_domain.clone(),
        ));

        Self {
            store,
            verifier,
            routes,
            worker,
            service,
        }
    }

    /// Production wiring: configured store, system resolver, Caddy client.
    pub async fn from_config(config: &GatewayConfig) -> Result<Self, StartupError> {
        let store = open_store(&config.store).await?;
        let lookup = Arc::new(HickoryLookup::from_system_conf()?);
        let admin = Arc::new(CaddyAdminClient::new(&config.proxy)?);
        tracing::info!(
            admin_url = %config.proxy.admin_url,
            cname_target = %config.dns.cname_target,
            "Gateway components initialized"
        );
        Ok(Self::assemble(config, store, lookup, admin))
    }

    /// Push the full route set so the proxy matches the store.
    pub async fn bootstrap(&self) -> Result<usize, StartupError> {
        let verified = self.store.list_verified().await?;
        self.routes.rebuild(&verified).await?;
        tracing::info!(routes = verified.len(), "Proxy bootstrapped from store");
        Ok(verified.len())
    }

    /// Run the worker and the admin API until `shutdown` fires.
    pub async fn serve(
        self,
        config: &GatewayConfig,
        listener: TcpListener,
        shutdown: Shutdown,
    ) -> Result<(), StartupError> {
        let worker = if config.worker.enabled {
            Some(self.worker.clone().start(&shutdown.token()))
        } else {
            tracing::info!("Verification worker disabled");
            None
        };

        let state = AppState {
            service: self.service.clone(),
            api_key: Arc::from(config.admin.api_key.as_str()),
            shutdown: shutdown.token(),
        };
        let server = HttpServer::new(&config.admin, state);
        let result = server.run(listener, shutdown.token()).await;

        // The server may also end on its own (I/O error).
        shutdown.trigger();
        if let Some(handle) = worker {
            handle.stop().await;
        }

        result.map_err(StartupError::from)
    }
}
