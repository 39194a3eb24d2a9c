//! Caddy admin API client.

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;
use url::Url;

use super::schema::{CaddyConfig, Route};
use crate::config::ProxyAdminConfig;

#[derive(Debug, Error)]
pub enum ProxyError {
    #[error("proxy admin unreachable: {0}")]
    Transport(String),

    #[error("proxy admin returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("invalid proxy admin request: {0}")]
    Request(String),
}

impl From<reqwest::Error> for ProxyError {
    fn from(err: reqwest::Error) -> Self {
        ProxyError::Transport(err.to_string())
    }
}

/// Proxy control-plane operations.
#[async_trait]
pub trait ProxyAdmin: Send + Sync {
    /// Replace the entire running configuration.
    async fn load(&self, config: &CaddyConfig) -> Result<(), ProxyError>;

    /// Append one route to a server's route list.
    async fn add_route(&self, server: &str, route: &Route) -> Result<(), ProxyError>;

    /// Delete the config object tagged with `@id`.
    async fn delete_route(&self, route_id: &str) -> Result<(), ProxyError>;
}

/// HTTP client for Caddy's admin endpoint.
pub struct CaddyAdminClient {
    client: reqwest::Client,
    base: Url,
}

impl CaddyAdminClient {
    pub fn new(config: &ProxyAdminConfig) -> Result<Self, ProxyError> {
        let base = Url::parse(&config.admin_url)
            .map_err(|e| ProxyError::Request(format!("admin_url: {}", e)))?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;
        Ok(Self { client, base })
    }

    fn endpoint(&self, path: &str) -> Result<Url, ProxyError> {
        self.base
            .join(path)
            .map_err(|e| ProxyError::Request(format!("{}: {}", path, e)))
    }

    async fn send_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<(), ProxyError> {
        let response = self
            .client
            .post(self.endpoint(path)?)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }
}

async fn check_status(response: reqwest::Response) -> Result<(), ProxyError> {
    let status = response.status();
    if status.is_success() {
        return Ok(());
    }
    let body = response.text().await.unwrap_or_default();
    Err(ProxyError::Status {
        status: status.as_u16(),
        body: body.trim().to_string(),
    })
}

#[async_trait]
impl ProxyAdmin for CaddyAdminClient {
    async fn load(&self, config: &CaddyConfig) -> Result<(), ProxyError> {
        self.send_json("/load", config).await
    }

    async fn add_route(&self, server: &str, route: &Route) -> Result<(), ProxyError> {
        let path = format!("/config/apps/http/servers/{}/routes", server);
        self.send_json(&path, route).await
    }

    async fn delete_route(&self, route_id: &str) -> Result<(), ProxyError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/id/{}", route_id))?)
            .send()
            .await?;
        check_status(response).await
    }
}
