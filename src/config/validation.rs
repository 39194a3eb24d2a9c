//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, ports valid)
//! - Check addresses and URLs parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: GatewayConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::net::SocketAddr;

use thiserror::Error;

use crate::config::schema::{GatewayConfig, StoreBackend};
use crate::domain::name::normalize_name;

/// A single semantic problem with the configuration.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} must not be empty")]
    Empty { field: &'static str },

    #[error("{field} is not a valid domain name: {value}")]
    InvalidDomain { field: &'static str, value: String },

    #[error("{field} is not a valid socket address: {value}")]
    InvalidAddress { field: &'static str, value: String },

    #[error("{field} is not a valid http(s) URL: {value}")]
    InvalidUrl { field: &'static str, value: String },

    #[error("{field} must be greater than zero")]
    Zero { field: &'static str },

    #[error("worker.retry_max_delay_ms ({max}) is below worker.retry_base_delay_ms ({base})")]
    DelayRange { base: u64, max: u64 },
}

/// Validate a loaded configuration, collecting every error.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.admin.api_key.trim().is_empty() {
        errors.push(ValidationError::Empty { field: "admin.api_key" });
    }
    check_socket_addr(&mut errors, "admin.bind_address", &config.admin.bind_address);

    match url::Url::parse(&config.proxy.admin_url) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {}
        _ => errors.push(ValidationError::InvalidUrl {
            field: "proxy.admin_url",
            value: config.proxy.admin_url.clone(),
        }),
    }
    if config.proxy.server_name.is_empty() {
        errors.push(ValidationError::Empty { field: "proxy.server_name" });
    }
    if config.proxy.listen.is_empty() {
        errors.push(ValidationError::Empty { field: "proxy.listen" });
    }
    if config.proxy.backend_host.is_empty() {
        errors.push(ValidationError::Empty { field: "proxy.backend_host" });
    }
    if config.proxy.backend_port == 0 {
        errors.push(ValidationError::Zero { field: "proxy.backend_port" });
    }
    if config.proxy.request_timeout_secs == 0 {
        errors.push(ValidationError::Zero { field: "proxy.request_timeout_secs" });
    }
    check_domain(&mut errors, "proxy.base_domain", &config.proxy.base_domain);

    check_domain(&mut errors, "dns.cname_target", &config.dns.cname_target);
    if config.dns.provider.is_empty() {
        errors.push(ValidationError::Empty { field: "dns.provider" });
    }
    if config.dns.require_txt_token && config.dns.txt_prefix.is_empty() {
        errors.push(ValidationError::Empty { field: "dns.txt_prefix" });
    }

    if config.worker.interval_secs == 0 {
        errors.push(ValidationError::Zero { field: "worker.interval_secs" });
    }
    if config.worker.max_retries == 0 {
        errors.push(ValidationError::Zero { field: "worker.max_retries" });
    }
    if config.worker.retry_base_delay_ms == 0 {
        errors.push(ValidationError::Zero { field: "worker.retry_base_delay_ms" });
    } else if config.worker.retry_max_delay_ms < config.worker.retry_base_delay_ms {
        errors.push(ValidationError::DelayRange {
            base: config.worker.retry_base_delay_ms,
            max: config.worker.retry_max_delay_ms,
        });
    }

    if config.store.backend == StoreBackend::Sqlite {
        if config.store.database_url.is_empty() {
            errors.push(ValidationError::Empty { field: "store.database_url" });
        }
        if config.store.max_connections == 0 {
            errors.push(ValidationError::Zero { field: "store.max_connections" });
        }
    }

    if config.observability.metrics_enabled {
        check_socket_addr(
            &mut errors,
            "observability.metrics_address",
            &config.observability.metrics_address,
        );
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_domain(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.is_empty() {
        errors.push(ValidationError::Empty { field });
    } else if normalize_name(value).is_err() {
        errors.push(ValidationError::InvalidDomain {
            field,
            value: value.to_string(),
        });
    }
}

fn check_socket_addr(errors: &mut Vec<ValidationError>, field: &'static str, value: &str) {
    if value.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::InvalidAddress {
            field,
            value: value.to_string(),
        });
    }
}
