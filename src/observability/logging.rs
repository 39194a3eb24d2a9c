//! Structured logging.
//!
//! # Design Decisions
//! - `RUST_LOG` wins when set; otherwise `observability.log_level` applies
//! - Human-readable fmt output; fields carry the machine-relevant data

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Filter directives used when `RUST_LOG` is absent.
pub fn default_directives(level: &str) -> String {
    format!("domain_gateway={},tower_http={},sqlx=warn", level, level)
}

/// Install the global subscriber. Calling twice is harmless.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.log_level)));

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
