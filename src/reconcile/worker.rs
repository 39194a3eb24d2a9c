//! Background verification worker.
//!
//! # Responsibilities
//! - Periodically check pending custom domains against DNS
//! - Promote verified domains: store, then proxy route, then SSL flag
//! - Retry activation of domains verified earlier whose route push failed
//! - Serve on-demand verification with bounded retry
//!
//! # Design Decisions
//! - Stateless between passes; the store is the only memory
//! - A failure on one domain never aborts the rest of the pass
//! - Stop is cooperative: a pass in progress runs to completion

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde::Serialize;
use tokio::task::JoinHandle;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::config::WorkerConfig;
use crate::dns::DnsVerifier;
use crate::domain::{Domain, DomainKind};
use crate::error::{GatewayError, Result};
use crate::observability::metrics;
use crate::proxy::RouteSynchronizer;
use crate::resilience::BackoffPolicy;
use crate::store::{DomainStore, StoreError};

/// Counts from one reconciliation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PassReport {
    /// Pending domains checked against DNS.
    pub checked: usize,
    /// Domains newly verified and activated.
    pub verified: usize,
    /// Domains whose promotion or re-activation failed.
    pub failed: usize,
    /// Previously stranded domains activated this pass.
    pub activated: usize,
}

/// Result of an on-demand verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerifyOutcome {
    AlreadyVerified,
    Verified,
    Pending,
}

pub struct VerificationWorker {
    store: Arc<dyn DomainStore>,
    verifier: Arc<DnsVerifier>,
    routes: Arc<RouteSynchronizer>,
    interval: Duration,
    policy: BackoffPolicy,
}

impl VerificationWorker {
    pub fn new(
        store: Arc<dyn DomainStore>,
        verifier: Arc<DnsVerifier>,
        routes: Arc<RouteSynchronizer>,
        config: &WorkerConfig,
    ) -> Self {
        Self {
            store,
            verifier,
            routes,
            interval: Duration::from_secs(config.interval_secs),
            policy: BackoffPolicy::from_config(config),
        }
    }

    pub fn policy(&self) -> &BackoffPolicy {
        &self.policy
    }

    /// Route push, then SSL flag. The domain must already be verified.
    ///
    /// A record deleted while its route was in flight gets the route
    /// withdrawn again, so no route outlives its record.
    async fn activate(&self, domain: &Domain) -> Result<()> {
        self.routes.add_route(domain).await?;
        if let Err(error) = self.store.mark_ssl_issued(domain.id).await {
            if let StoreError::NotFound(_) = error {
                tracing::warn!(domain = %domain.name, "Domain deleted during activation, withdrawing route");
                self.routes.remove_route(domain.id).await;
            }
            return Err(error.into());
        }
        Ok(())
    }

    async fn promote(&self, domain: &Domain) -> Result<()> {
        self.store.mark_verified(domain.id).await?;
        let mut verified = domain.clone();
        verified.verified = true;
        self.activate(&verified).await
    }

    async fn retry_stranded(&self, report: &mut PassReport) {
        let stranded = match self.store.list_unactivated().await {
            Ok(domains) => domains,
            Err(error) => {
                tracing::warn!(error = %error, "Failed to list unactivated domains");
                return;
            }
        };

        for domain in stranded {
            match self.activate(&domain).await {
                Ok(()) => {
                    report.activated += 1;
                    tracing::info!(domain = %domain.name, "Stranded domain activated");
                }
                Err(error) => {
                    report.failed += 1;
                    tracing::warn!(domain = %domain.name, error = %error, "Domain activation still failing");
                }
            }
        }
    }

    /// One reconciliation pass over the store.
    pub async fn run_pass(&self) -> std::result::Result<PassReport, StoreError> {
        let started = Instant::now();
        let mut report = PassReport::default();

        self.retry_stranded(&mut report).await;

        let pending = self.store.list_unverified_custom().await?;
        tracing::debug!(count = pending.len(), "Checking pending domains");

        for domain in pending {
            report.checked += 1;
            if !self.verifier.verify(&domain).await {
                continue;
            }

            match self.promote(&domain).await {
                Ok(()) => {
                    report.verified += 1;
                    tracing::info!(domain = %domain.name, tenant_id = %domain.tenant_id, "Domain verified and routed");
                }
                Err(error) => {
                    report.failed += 1;
                    tracing::error!(domain = %domain.name, error = %error, "Failed to activate verified domain");
                }
            }
        }

        let elapsed = started.elapsed();
        metrics::record_pass(report.checked, report.verified, report.failed, elapsed);
        tracing::info!(
            checked = report.checked,
            verified = report.verified,
            failed = report.failed,
            activated = report.activated,
            duration_ms = elapsed.as_millis() as u64,
            "Verification pass complete"
        );
        Ok(report)
    }

    /// Verify one domain now, retrying with the worker's backoff policy.
    pub async fn verify_now(&self, id: Uuid, cancel: &CancellationToken) -> Result<VerifyOutcome> {
        let domain = self.store.get(id).await?.ok_or(GatewayError::NotFound(id))?;

        if domain.verified {
            if domain.kind == DomainKind::Custom && !domain.ssl_issued {
                self.activate(&domain).await?;
            }
            return Ok(VerifyOutcome::AlreadyVerified);
        }

        if !self
            .verifier
            .verify_with_retry(&domain, &self.policy, cancel)
            .await?
        {
            return Ok(VerifyOutcome::Pending);
        }

        self.promote(&domain).await?;
        tracing::info!(domain = %domain.name, "Domain verified on demand");
        Ok(VerifyOutcome::Verified)
    }

    /// Spawn the periodic loop under a child of `parent`.
    pub fn start(self: Arc<Self>, parent: &CancellationToken) -> WorkerHandle {
        let cancel = parent.child_token();
        let join = tokio::spawn(self.run(cancel.clone()));
        WorkerHandle { cancel, join }
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Verification worker starting");

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::info!("Verification worker received shutdown signal, exiting loop");
                    break;
                }
                _ = ticker.tick() => {
                    if let Err(error) = self.run_pass().await {
                        tracing::error!(error = %error, "Verification pass failed");
                    }
                }
            }
        }
    }
}

/// Handle to a running worker.
pub struct WorkerHandle {
    cancel: CancellationToken,
    join: JoinHandle<()>,
}

impl WorkerHandle {
    /// Cancel the loop and wait for it to exit.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(error) = self.join.await {
            tracing::error!(error = %error, "Verification worker task failed");
        }
        tracing::info!("Verification worker stopped");
    }

    pub fn is_finished(&self) -> bool {
        self.join.is_finished()
    }
}
