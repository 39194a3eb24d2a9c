//! In-process `ProxyAdmin` that records calls.
//!
//! Tracks live `@id`s the way Caddy indexes them: a second route with the
//! same id is rejected and deleting an unknown id answers 404.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use super::client::{ProxyAdmin, ProxyError};
use super::schema::{CaddyConfig, Route};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminCall {
    Load(CaddyConfig),
    Add { server: String, route: Route },
    Delete(String),
}

#[derive(Default)]
pub struct FakeAdmin {
    calls: Mutex<Vec<AdminCall>>,
    fail_load: AtomicBool,
    fail_delete: AtomicBool,
    fail_hosts: Mutex<Vec<String>>,
    live: Mutex<BTreeSet<String>>,
}

impl FakeAdmin {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<AdminCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn fail_load(&self, fail: bool) {
        self.fail_load.store(fail, Ordering::SeqCst);
    }

    pub fn fail_delete(&self, fail: bool) {
        self.fail_delete.store(fail, Ordering::SeqCst);
    }

    /// Reject incremental adds for `host`.
    pub fn fail_host(&self, host: &str) {
        self.fail_hosts.lock().unwrap().push(host.to_string());
    }

    pub fn heal_host(&self, host: &str) {
        self.fail_hosts.lock().unwrap().retain(|h| h != host);
    }

    pub fn added_hosts(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter_map(|c| match c {
                AdminCall::Add { route, .. } => route.hosts().next().map(str::to_string),
                _ => None,
            })
            .collect()
    }

    /// Route ids currently installed.
    pub fn live_routes(&self) -> Vec<String> {
        self.live.lock().unwrap().iter().cloned().collect()
    }

    fn record(&self, call: AdminCall) {
        self.calls.lock().unwrap().push(call);
    }
}

fn rejected() -> ProxyError {
    ProxyError::Status {
        status: 500,
        body: "injected failure".into(),
    }
}

#[async_trait]
impl ProxyAdmin for FakeAdmin {
    async fn load(&self, config: &CaddyConfig) -> Result<(), ProxyError> {
        self.record(AdminCall::Load(config.clone()));
        if self.fail_load.load(Ordering::SeqCst) {
            return Err(rejected());
        }
        *self.live.lock().unwrap() = config
            .apps
            .http
            .servers
            .values()
            .flat_map(|s| s.routes.iter().filter_map(|r| r.id.clone()))
            .collect();
        Ok(())
    }

    async fn add_route(&self, server: &str, route: &Route) -> Result<(), ProxyError> {
        self.record(AdminCall::Add {
            server: server.to_string(),
            route: route.clone(),
        });
        let failing = self.fail_hosts.lock().unwrap().clone();
        if route.hosts().any(|h| failing.iter().any(|f| f == h)) {
            return Err(rejected());
        }
        if let Some(id) = &route.id {
            if !self.live.lock().unwrap().insert(id.clone()) {
                return Err(ProxyError::Status {
                    status: 400,
                    body: format!("duplicate ID '{}' found", id),
                });
            }
        }
        Ok(())
    }

    async fn delete_route(&self, route_id: &str) -> Result<(), ProxyError> {
        self.record(AdminCall::Delete(route_id.to_string()));
        let known = self.live.lock().unwrap().remove(route_id);
        if !known || self.fail_delete.load(Ordering::SeqCst) {
            return Err(ProxyError::Status {
                status: 404,
                body: format!("unknown object ID '{}'", route_id),
            });
        }
        Ok(())
    }
}
