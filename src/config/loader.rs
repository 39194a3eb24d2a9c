//! Configuration loading from disk and environment.

use std::fs;
use std::path::Path;

use crate::config::schema::GatewayConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Env { var: &'static str, value: String },
    Validation(Vec<ValidationError>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Env { var, value } => {
                write!(f, "Invalid value for {}: {:?}", var, value)
            }
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Load and validate configuration from a TOML file.
///
/// Environment overrides are applied after the file is parsed and before
/// validation, so secrets never need to live in the file.
pub fn load_config(path: &Path) -> Result<GatewayConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    let config: GatewayConfig = toml::from_str(&content).map_err(ConfigError::Parse)?;
    finish(config)
}

/// Load from `path` when it exists, otherwise start from defaults.
pub fn load_or_default(path: Option<&Path>) -> Result<GatewayConfig, ConfigError> {
    match path {
        Some(p) if p.exists() => load_config(p),
        Some(p) => {
            tracing::info!(path = %p.display(), "No config file found, using defaults and environment");
            finish(GatewayConfig::default())
        }
        None => finish(GatewayConfig::default()),
    }
}

fn finish(mut config: GatewayConfig) -> Result<GatewayConfig, ConfigError> {
    apply_env_overrides(&mut config, |key| std::env::var(key).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Overlay environment variables onto `config`.
///
/// `lookup` abstracts the environment so tests need not mutate process state.
pub fn apply_env_overrides<F>(config: &mut GatewayConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let get = |primary: &str, alias: Option<&str>| {
        lookup(primary).or_else(|| alias.and_then(&lookup))
    };

    if let Some(v) = get("GATEWAY_ADMIN_BIND_ADDRESS", None) {
        config.admin.bind_address = v;
    }
    if let Some(v) = get("GATEWAY_ADMIN_API_KEY", Some("ADMIN_API_KEY")) {
        config.admin.api_key = v;
    }
    if let Some(v) = get("GATEWAY_PROXY_ADMIN_URL", None) {
        config.proxy.admin_url = v;
    }
    if let Some(v) = get("GATEWAY_PROXY_BACKEND_HOST", None) {
        config.proxy.backend_host = v;
    }
    if let Some(v) = get("GATEWAY_PROXY_BACKEND_PORT", None) {
        config.proxy.backend_port = v.parse().map_err(|_| ConfigError::Env {
            var: "GATEWAY_PROXY_BACKEND_PORT",
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("GATEWAY_PROXY_BASE_DOMAIN", Some("BASE_DOMAIN")) {
        config.proxy.base_domain = v;
    }
    if let Some(v) = get("GATEWAY_PROXY_ACME_EMAIL", Some("ACME_EMAIL")) {
        config.proxy.acme_email = v;
    }
    if let Some(v) = get("GATEWAY_DNS_API_TOKEN", Some("DNS_API_TOKEN")) {
        config.dns.api_token = v;
    }
    if let Some(v) = get("GATEWAY_DNS_CNAME_TARGET", None) {
        config.dns.cname_target = v;
    }
    if let Some(v) = get("GATEWAY_STORE_DATABASE_URL", Some("DATABASE_URL")) {
        config.store.database_url = v;
    }
    if let Some(v) = get("GATEWAY_WORKER_INTERVAL_SECS", None) {
        config.worker.interval_secs = v.parse().map_err(|_| ConfigError::Env {
            var: "GATEWAY_WORKER_INTERVAL_SECS",
            value: v.clone(),
        })?;
    }
    if let Some(v) = get("GATEWAY_LOG_LEVEL", None) {
        config.observability.log_level = v;
    }

    Ok(())
}
