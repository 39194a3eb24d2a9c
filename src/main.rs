//! Domain Gateway
//!
//! Verifies tenant-owned domains via DNS and keeps a Caddy reverse proxy's
//! routes in step with the verified set.
//!
//! # Architecture Overview
//!
//! ```text
//!                      ┌──────────────────────────────────────────────────────┐
//!                      │                   DOMAIN GATEWAY                      │
//!                      │                                                       │
//!   Operator / CLI     │  ┌──────────┐    ┌──────────────┐    ┌────────────┐  │
//!   ───────────────────┼─▶│  admin   │───▶│    domain    │───▶│   store    │  │
//!                      │  │   API    │    │   service    │    │ sqlite/mem │  │
//!                      │  └──────────┘    └──────┬───────┘    └─────▲──────┘  │
//!                      │                         │                  │         │
//!                      │                         ▼                  │         │
//!                      │                  ┌──────────────┐   ┌──────┴──────┐  │
//!   DNS resolvers  ◀───┼──────────────────│ dns verifier │◀──│  reconcile  │  │
//!                      │                  └──────────────┘   │   worker    │  │
//!                      │                                     └──────┬──────┘  │
//!                      │                                            ▼         │
//!   Caddy admin API ◀──┼─────────────────────────────────── route synchronizer │
//!                      └──────────────────────────────────────────────────────┘
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::net::TcpListener;

use domain_gateway::config::load_or_default;
use domain_gateway::lifecycle::{spawn_signal_handler, Gateway, Shutdown};
use domain_gateway::observability::{logging, metrics};

#[derive(Parser)]
#[command(name = "domain-gateway", version)]
#[command(about = "Custom domain verification and proxy route reconciliation", long_about = None)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(short, long, default_value = "gateway.toml")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = load_or_default(Some(&args.config))?;
    logging::init_logging(&config.observability);

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "domain-gateway starting");
    tracing::info!(
        bind_address = %config.admin.bind_address,
        base_domain = %config.proxy.base_domain,
        store = ?config.store.backend,
        worker_interval_secs = config.worker.interval_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse::<SocketAddr>() {
            Ok(addr) => metrics::init_metrics(addr)?,
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let gateway = Gateway::from_config(&config).await?;
    gateway.bootstrap().await?;

    let listener = TcpListener::bind(&config.admin.bind_address).await?;

    let shutdown = Shutdown::new();
    spawn_signal_handler(shutdown.clone());

    gateway.serve(&config, listener, shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
