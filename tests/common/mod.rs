//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU16, Ordering};
use std::sync::{Arc, Mutex};

use axum::{
    body::Bytes,
    extract::State,
    http::{Method, StatusCode, Uri},
    Router,
};
use serde_json::Value;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use domain_gateway::config::{GatewayConfig, StoreBackend};
use domain_gateway::dns::StaticLookup;
use domain_gateway::lifecycle::{Gateway, Shutdown, StartupError};
use domain_gateway::proxy::CaddyAdminClient;
use domain_gateway::store::{DomainStore, MemoryStore};

pub const API_KEY: &str = "test-admin-key";
pub const CNAME_TARGET: &str = "cname.panaroid.com";

/// One request received by the mock Caddy admin endpoint.
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub path: String,
    pub body: Option<Value>,
}

/// Fake Caddy admin API that records every request.
///
/// Keeps Caddy's `@id` index: appending a route whose id is already live
/// answers 400, deleting an unknown id answers 404.
#[derive(Clone)]
pub struct MockCaddy {
    pub addr: SocketAddr,
    requests: Arc<Mutex<Vec<Recorded>>>,
    ids: Arc<Mutex<BTreeSet<String>>>,
    /// 0 means answer 200.
    fail_status: Arc<AtomicU16>,
}

impl MockCaddy {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let mock = Self {
            addr: listener.local_addr().unwrap(),
            requests: Arc::new(Mutex::new(Vec::new())),
            ids: Arc::new(Mutex::new(BTreeSet::new())),
            fail_status: Arc::new(AtomicU16::new(0)),
        };

        let app = Router::new().fallback(record).with_state(mock.clone());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        mock
    }

    pub fn url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn paths(&self) -> Vec<String> {
        self.requests()
            .into_iter()
            .map(|r| format!("{} {}", r.method, r.path))
            .collect()
    }

    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
    }

    /// Route ids currently installed.
    pub fn live_ids(&self) -> Vec<String> {
        self.ids.lock().unwrap().iter().cloned().collect()
    }

    /// Answer every following request with `status` (0 restores 200).
    pub fn fail_with(&self, status: u16) {
        self.fail_status.store(status, Ordering::SeqCst);
    }

    /// Body of the most recent `POST /load`.
    pub fn last_load(&self) -> Option<Value> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| r.method == Method::POST && r.path == "/load")
            .and_then(|r| r.body)
    }
}

async fn record(
    State(mock): State<MockCaddy>,
    method: Method,
    uri: Uri,
    body: Bytes,
) -> (StatusCode, String) {
    let path = uri.path().to_string();
    let body: Option<Value> = serde_json::from_slice(&body).ok();
    mock.requests.lock().unwrap().push(Recorded {
        method: method.clone(),
        path: path.clone(),
        body: body.clone(),
    });

    match mock.fail_status.load(Ordering::SeqCst) {
        0 => {}
        code => {
            return (
                StatusCode::from_u16(code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                r#"{"error":"injected failure"}"#.to_string(),
            )
        }
    }

    let mut ids = mock.ids.lock().unwrap();
    if method == Method::POST && path == "/load" {
        *ids = body
            .iter()
            .flat_map(|b| b["apps"]["http"]["servers"].as_object().cloned())
            .flat_map(|servers| servers.into_iter())
            .flat_map(|(_, server)| server["routes"].as_array().cloned().unwrap_or_default())
            .filter_map(|route| route["@id"].as_str().map(str::to_string))
            .collect();
    } else if method == Method::POST && path.ends_with("/routes") {
        if let Some(id) = body.as_ref().and_then(|b| b["@id"].as_str()) {
            if !ids.insert(id.to_string()) {
                return (
                    StatusCode::BAD_REQUEST,
                    format!(r#"{{"error":"indexing config: duplicate ID '{}' found"}}"#, id),
                );
            }
        }
    } else if method == Method::DELETE {
        if let Some(id) = path.strip_prefix("/id/") {
            if !ids.remove(id) {
                return (
                    StatusCode::NOT_FOUND,
                    format!(r#"{{"error":"unknown object ID '{}'"}}"#, id),
                );
            }
        }
    }
    (StatusCode::OK, String::new())
}

/// Configuration pointing at `caddy`, with a slow worker and fast retries.
pub fn test_config(caddy: &MockCaddy) -> GatewayConfig {
    let mut config = GatewayConfig::default();
    config.admin.api_key = API_KEY.to_string();
    config.admin.bind_address = "127.0.0.1:0".to_string();
    config.proxy.admin_url = caddy.url();
    config.proxy.base_domain = "base.tld".to_string();
    config.proxy.acme_email = "ops@base.tld".to_string();
    config.proxy.request_timeout_secs = 2;
    config.dns.cname_target = CNAME_TARGET.to_string();
    config.dns.api_token = "dns-token".to_string();
    config.worker.interval_secs = 3600;
    config.worker.max_retries = 1;
    config.worker.retry_base_delay_ms = 10;
    config.store.backend = StoreBackend::Memory;
    config.observability.metrics_enabled = false;
    config
}

/// A gateway serving its admin API on an ephemeral port.
pub struct TestGateway {
    pub base: String,
    pub caddy: MockCaddy,
    pub dns: Arc<StaticLookup>,
    pub store: Arc<dyn DomainStore>,
    pub shutdown: Shutdown,
    handle: JoinHandle<Result<(), StartupError>>,
}

impl TestGateway {
    pub async fn start(caddy: MockCaddy, config: GatewayConfig) -> Self {
        Self::start_with_store(caddy, config, Arc::new(MemoryStore::new())).await
    }

    pub async fn start_with_store(
        caddy: MockCaddy,
        config: GatewayConfig,
        store: Arc<dyn DomainStore>,
    ) -> Self {
        let dns = Arc::new(StaticLookup::new());
        let admin = Arc::new(CaddyAdminClient::new(&config.proxy).unwrap());
        let gateway = Gateway::assemble(&config, store.clone(), dns.clone(), admin);
        gateway.bootstrap().await.unwrap();

        let listener = TcpListener::bind(&config.admin.bind_address).await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());

        let shutdown = Shutdown::new();
        let serve_shutdown = shutdown.clone();
        let handle = tokio::spawn(async move { gateway.serve(&config, listener, serve_shutdown).await });

        Self {
            base,
            caddy,
            dns,
            store,
            shutdown,
            handle,
        }
    }

    pub fn domains_url(&self, tenant: uuid::Uuid) -> String {
        format!("{}/api/tenants/{}/domains", self.base, tenant)
    }

    pub async fn stop(self) -> Result<(), StartupError> {
        self.shutdown.trigger();
        self.handle.await.unwrap()
    }
}

/// reqwest client sending the admin bearer key.
pub fn authed_client() -> reqwest::Client {
    let mut headers = reqwest::header::HeaderMap::new();
    headers.insert(
        reqwest::header::AUTHORIZATION,
        format!("Bearer {}", API_KEY).parse().unwrap(),
    );
    reqwest::Client::builder()
        .default_headers(headers)
        .build()
        .unwrap()
}
