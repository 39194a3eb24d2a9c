//! Route synchronization with the proxy control plane.
//!
//! # Responsibilities
//! - Translate verified domains into the proxy's JSON config
//! - Push full rebuilds and incremental add/remove updates
//! - Keep a local table of routes believed active
//!
//! # Design Decisions
//! - The table lock covers bookkeeping only; admin calls run unlocked
//! - Table entries change only after the proxy accepted the change,
//!   except removal, which always drops the entry
//! - Removal never fails: a route already gone is the desired state
//! - An incremental add replaces any route carrying the same `@id`, since
//!   the proxy rejects duplicate ids; adds are serialized so two callers
//!   cannot both append

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use tokio::sync::{Mutex, RwLock};
use uuid::Uuid;

use super::client::{ProxyAdmin, ProxyError};
use super::schema::{
    Apps, Automation, CaddyConfig, Challenges, DnsChallenge, DnsProvider, HttpApp, HttpServer,
    Issuer, Route, TlsApp, TlsPolicy,
};
use crate::config::{DnsConfig, ProxyAdminConfig};
use crate::domain::model::route_id;
use crate::domain::{Domain, DomainKind};
use crate::observability::metrics;

/// A route the proxy is believed to be serving.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveRoute {
    pub domain: String,
    pub tenant_id: Uuid,
    pub upstream: String,
}

/// Keeps the proxy's routes in step with verified domains.
pub struct RouteSynchronizer {
    admin: Arc<dyn ProxyAdmin>,
    proxy: ProxyAdminConfig,
    dns_provider: String,
    dns_api_token: String,
    routes: RwLock<HashMap<Uuid, ActiveRoute>>,
    push: Mutex<()>,
}

impl RouteSynchronizer {
    pub fn new(admin: Arc<dyn ProxyAdmin>, proxy: &ProxyAdminConfig, dns: &DnsConfig) -> Self {
        Self {
            admin,
            proxy: proxy.clone(),
            dns_provider: dns.provider.clone(),
            dns_api_token: dns.api_token.clone(),
            routes: RwLock::new(HashMap::new()),
            push: Mutex::new(()),
        }
    }

    fn wildcard(&self) -> Option<String> {
        if self.proxy.base_domain.is_empty() {
            None
        } else {
            Some(format!("*.{}", self.proxy.base_domain))
        }
    }

    /// Route for a single domain, tagged `route-<id>`.
    pub fn domain_route(&self, domain: &Domain) -> Route {
        Route::reverse_proxy(Some(domain.route_id()), &domain.name, &self.proxy.upstream())
    }

    /// Full proxy document for `domains`. Unverified entries are skipped.
    pub fn build_config(&self, domains: &[Domain]) -> CaddyConfig {
        let upstream = self.proxy.upstream();
        let verified = domains.iter().filter(|d| d.verified);

        let mut routes: Vec<Route> = verified.clone().map(|d| self.domain_route(d)).collect();
        let mut subjects: Vec<String> = verified
            .filter(|d| d.kind == DomainKind::Custom)
            .map(|d| d.name.clone())
            .collect();

        if let Some(wildcard) = self.wildcard() {
            routes.push(Route::reverse_proxy(None, &wildcard, &upstream));
            subjects.push(wildcard);
        }

        let mut servers = BTreeMap::new();
        servers.insert(
            self.proxy.server_name.clone(),
            HttpServer {
                listen: self.proxy.listen.clone(),
                routes,
            },
        );

        CaddyConfig {
            apps: Apps {
                http: HttpApp { servers },
                tls: Some(TlsApp {
                    automation: Automation {
                        policies: vec![TlsPolicy {
                            subjects,
                            issuers: vec![Issuer {
                                module: "acme".to_string(),
                                email: self.proxy.acme_email.clone(),
                                challenges: Challenges {
                                    dns: DnsChallenge {
                                        provider: DnsProvider {
                                            name: self.dns_provider.clone(),
                                            api_token: self.dns_api_token.clone(),
                                        },
                                    },
                                },
                            }],
                        }],
                    },
                }),
            },
        }
    }

    fn active(&self, domain: &Domain) -> ActiveRoute {
        ActiveRoute {
            domain: domain.name.clone(),
            tenant_id: domain.tenant_id,
            upstream: self.proxy.upstream(),
        }
    }

    /// Replace the proxy's whole configuration with routes for `domains`.
    pub async fn rebuild(&self, domains: &[Domain]) -> Result<(), ProxyError> {
        let config = self.build_config(domains);

        let result = self.admin.load(&config).await;
        metrics::record_proxy_push("load", result.is_ok());
        result?;

        let table: HashMap<Uuid, ActiveRoute> = domains
            .iter()
            .filter(|d| d.verified)
            .map(|d| (d.id, self.active(d)))
            .collect();
        let count = table.len();
        *self.routes.write().await = table;

        metrics::set_active_routes(count);
        tracing::info!(routes = count, "Proxy configuration loaded");
        Ok(())
    }

    /// Push one domain's route. Safe to repeat for the same domain.
    pub async fn add_route(&self, domain: &Domain) -> Result<(), ProxyError> {
        let route = self.domain_route(domain);
        let id = domain.route_id();
        let _push = self.push.lock().await;

        match self.admin.delete_route(&id).await {
            Ok(()) => tracing::debug!(route_id = %id, "Replacing existing route"),
            Err(ProxyError::Status { status: 404, .. }) => {}
            Err(error) => {
                metrics::record_proxy_push("add", false);
                return Err(error);
            }
        }

        let result = self.admin.add_route(&self.proxy.server_name, &route).await;
        metrics::record_proxy_push("add", result.is_ok());
        result?;

        let count = {
            let mut routes = self.routes.write().await;
            routes.insert(domain.id, self.active(domain));
            routes.len()
        };

        metrics::set_active_routes(count);
        tracing::info!(domain = %domain.name, route_id = %id, "Domain route added");
        Ok(())
    }

    /// Remove the route for `domain_id`. Failures are logged, never returned.
    pub async fn remove_route(&self, domain_id: Uuid) {
        let id = route_id(domain_id);

        let result = self.admin.delete_route(&id).await;
        metrics::record_proxy_push("remove", result.is_ok());
        if let Err(error) = result {
            tracing::warn!(route_id = %id, error = %error, "Route might not exist");
        }

        let count = {
            let mut routes = self.routes.write().await;
            routes.remove(&domain_id);
            routes.len()
        };

        metrics::set_active_routes(count);
        tracing::info!(route_id = %id, "Domain route removed");
    }

    pub async fn route_count(&self) -> usize {
        self.routes.read().await.len()
    }

    pub async fn route(&self, domain_id: Uuid) -> Option<ActiveRoute> {
        self.routes.read().await.get(&domain_id).cloned()
    }
}
