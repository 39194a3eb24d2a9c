//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the domain gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Operator admin API (domain CRUD, health).
    pub admin: AdminConfig,

    /// Reverse proxy control plane and routing target.
    pub proxy: ProxyAdminConfig,

    /// DNS verification and certificate challenge settings.
    pub dns: DnsConfig,

    /// Background verification worker.
    pub worker: WorkerConfig,

    /// Domain store backend.
    pub store: StoreConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Admin API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdminConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// API key for authentication (Bearer token).
    pub api_key: String,

    /// Request timeout in seconds.
    pub request_timeout_secs: u64,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            // WARNING: This is a placeholder! Change this in production.
            api_key: "CHANGE_ME_IN_PRODUCTION".to_string(),
            request_timeout_secs: 60,
        }
    }
}

/// Reverse proxy (Caddy) admin endpoint configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProxyAdminConfig {
    /// Base URL of the admin endpoint.
    pub admin_url: String,

    /// Name of the HTTP server block routes are installed into.
    pub server_name: String,

    /// Listen addresses for the HTTP server block.
    pub listen: Vec<String>,

    /// Host of the shared tenant backend.
    pub backend_host: String,

    /// Port of the shared tenant backend.
    pub backend_port: u16,

    /// Platform base domain; subdomains of it are served by a wildcard route.
    pub base_domain: String,

    /// ACME account email.
    pub acme_email: String,

    /// Timeout for admin API calls in seconds.
    pub request_timeout_secs: u64,
}

impl ProxyAdminConfig {
    /// Dial address of the shared backend.
    pub fn upstream(&self) -> String {
        format!("{}:{}", self.backend_host, self.backend_port)
    }
}

impl Default for ProxyAdminConfig {
    fn default() -> Self {
        Self {
            admin_url: "http://localhost:2019".to_string(),
            server_name: "main".to_string(),
            listen: vec![":80".to_string(), ":443".to_string()],
            backend_host: "localhost".to_string(),
            backend_port: 3000,
            base_domain: String::new(),
            acme_email: String::new(),
            request_timeout_secs: 10,
        }
    }
}

/// Language used for tenant-facing DNS instructions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    En,
    Ar,
}

/// DNS verification configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DnsConfig {
    /// Canonical name custom domains must CNAME to.
    pub cname_target: String,

    /// DNS provider module used for the ACME DNS challenge.
    pub provider: String,

    /// API token for the DNS provider.
    pub api_token: String,

    /// Language of generated instructions.
    pub locale: Locale,

    /// Also require a TXT record carrying the verification token.
    pub require_txt_token: bool,

    /// Label prepended to the domain for the TXT ownership record.
    pub txt_prefix: String,
}

impl Default for DnsConfig {
    fn default() -> Self {
        Self {
            cname_target: "cname.panaroid.com".to_string(),
            provider: "cloudflare".to_string(),
            api_token: String::new(),
            locale: Locale::En,
            require_txt_token: false,
            txt_prefix: "_gateway-verify".to_string(),
        }
    }
}

/// Verification worker configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WorkerConfig {
    /// Run the background reconciliation loop.
    pub enabled: bool,

    /// Interval between reconciliation passes in seconds.
    pub interval_secs: u64,

    /// Maximum attempts for on-demand verification.
    pub max_retries: u32,

    /// Base delay for on-demand retry backoff in milliseconds.
    pub retry_base_delay_ms: u64,

    /// Maximum delay for on-demand retry backoff in milliseconds.
    pub retry_max_delay_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_secs: 300,
            max_retries: 3,
            retry_base_delay_ms: 1_000,
            retry_max_delay_ms: 30_000,
        }
    }
}

/// Which store implementation to use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Memory,
    #[default]
    Sqlite,
}

/// Domain store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    pub backend: StoreBackend,

    /// SQLite connection URL (e.g., "sqlite://domains.db").
    pub database_url: String,

    /// Maximum pooled connections.
    pub max_connections: u32,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            backend: StoreBackend::Sqlite,
            database_url: "sqlite://domains.db".to_string(),
            max_connections: 8,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: true,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config: GatewayConfig = toml::from_str(
            r#"
            [proxy]
            base_domain = "base.tld"

            [dns]
            locale = "ar"
            "#,
        )
        .unwrap();

        assert_eq!(config.proxy.base_domain, "base.tld");
        assert_eq!(config.proxy.admin_url, "http://localhost:2019");
        assert_eq!(config.dns.locale, Locale::Ar);
        assert_eq!(config.worker.interval_secs, 300);
        assert_eq!(config.store.backend, StoreBackend::Sqlite);
    }

    #[test]
    fn test_upstream() {
        let config = ProxyAdminConfig::default();
        assert_eq!(config.upstream(), "localhost:3000");
    }
}
