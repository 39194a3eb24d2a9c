//! Metrics collection and exposition.
//!
//! # Metrics
//! - `gateway_reconcile_passes_total` (counter): completed reconciliation passes
//! - `gateway_reconcile_pass_duration_seconds` (histogram): pass latency
//! - `gateway_reconcile_domains_total` (counter): domains processed, by outcome
//! - `gateway_verifications_total` (counter): single DNS checks, by result
//! - `gateway_proxy_pushes_total` (counter): admin API calls, by kind and result
//! - `gateway_active_routes` (gauge): entries in the route table
//!
//! # Design Decisions
//! - Without an installed recorder every call is a no-op, so tests need no setup
//! - Labels are small closed sets; never a domain name

use std::net::SocketAddr;
use std::time::Duration;

use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

/// Install the Prometheus recorder with an HTTP listener on `addr`.
pub fn init_metrics(addr: SocketAddr) -> Result<(), String> {
    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| format!("Failed to install metrics recorder: {}", e))?;

    tracing::info!(address = %addr, "Metrics exporter listening");
    Ok(())
}

/// Record a single DNS check. `result` is `verified` or `pending`.
pub fn record_verification(result: &'static str) {
    counter!("gateway_verifications_total", "result" => result).increment(1);
}

/// Record a proxy admin call. `kind` is `load`, `add` or `remove`.
pub fn record_proxy_push(kind: &'static str, success: bool) {
    let result = if success { "success" } else { "failure" };
    counter!("gateway_proxy_pushes_total", "kind" => kind, "result" => result).increment(1);
}

pub fn set_active_routes(count: usize) {
    gauge!("gateway_active_routes").set(count as f64);
}

/// Record a finished reconciliation pass.
pub fn record_pass(checked: usize, verified: usize, failed: usize, duration: Duration) {
    counter!("gateway_reconcile_passes_total").increment(1);
    histogram!("gateway_reconcile_pass_duration_seconds").record(duration.as_secs_f64());

    let pending = checked.saturating_sub(verified + failed);
    counter!("gateway_reconcile_domains_total", "outcome" => "verified").increment(verified as u64);
    counter!("gateway_reconcile_domains_total", "outcome" => "failed").increment(failed as u64);
    counter!("gateway_reconcile_domains_total", "outcome" => "pending").increment(pending as u64);
}
