//! CNAME delegation checks.
//!
//! # Responsibilities
//! - Decide whether a domain's DNS points at the platform target
//! - Optionally require the TXT ownership token
//! - Bounded retry with cancellation
//!
//! # Design Decisions
//! - A missing record and a failing resolver both mean "not verified";
//!   only the latter is logged at warn
//! - Cancellation is observed between attempts and during sleeps, never
//!   inside a lookup

use std::sync::Arc;

use thiserror::Error;
use tokio_util::sync::CancellationToken;

use super::instructions;
use super::lookup::{DnsLookup, LookupError};
use crate::config::{DnsConfig, Locale};
use crate::domain::name::{lookup_name, names_match};
use crate::domain::{Domain, VerificationInfo};
use crate::observability::metrics;
use crate::resilience::BackoffPolicy;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VerifyError {
    #[error("verification cancelled")]
    Cancelled,
}

/// Checks domains against the configured CNAME target.
pub struct DnsVerifier {
    lookup: Arc<dyn DnsLookup>,
    cname_target: String,
    require_txt_token: bool,
    txt_prefix: String,
    locale: Locale,
}

impl DnsVerifier {
    pub fn new(lookup: Arc<dyn DnsLookup>, config: &DnsConfig) -> Self {
        Self {
            lookup,
            cname_target: config.cname_target.clone(),
            require_txt_token: config.require_txt_token,
            txt_prefix: config.txt_prefix.clone(),
            locale: config.locale,
        }
    }

    pub fn cname_target(&self) -> &str {
        &self.cname_target
    }

    /// Single check. Never fails: errors are logged and count as pending.
    pub async fn verify(&self, domain: &Domain) -> bool {
        let lookup = lookup_name(&domain.name);
        tracing::debug!(domain = %domain.name, lookup = %lookup, "Looking up CNAME record");

        let verified = match self.lookup.lookup_cname(&lookup).await {
            Ok(targets) => {
                if targets.iter().any(|t| names_match(t, &self.cname_target)) {
                    self.check_txt(domain).await
                } else {
                    tracing::debug!(
                        domain = %domain.name,
                        found = ?targets,
                        expected = %self.cname_target,
                        "CNAME does not match target"
                    );
                    false
                }
            }
            Err(LookupError::NotFound) => {
                tracing::debug!(domain = %domain.name, "CNAME record not found");
                false
            }
            Err(LookupError::Failed(error)) => {
                tracing::warn!(domain = %domain.name, error = %error, "DNS lookup error");
                false
            }
        };

        if verified {
            tracing::info!(domain = %domain.name, "Domain verification successful");
        }
        metrics::record_verification(if verified { "verified" } else { "pending" });
        verified
    }

    async fn check_txt(&self, domain: &Domain) -> bool {
        if !self.require_txt_token {
            return true;
        }
        let Some((name, token)) = self.txt_record(domain) else {
            return false;
        };

        match self.lookup.lookup_txt(&name).await {
            Ok(values) => {
                let found = values.iter().any(|v| v.trim() == token);
                if !found {
                    tracing::debug!(domain = %domain.name, record = %name, "Verification token not found in TXT");
                }
                found
            }
            Err(LookupError::NotFound) => {
                tracing::debug!(domain = %domain.name, record = %name, "TXT record not found");
                false
            }
            Err(LookupError::Failed(error)) => {
                tracing::warn!(domain = %domain.name, error = %error, "DNS TXT lookup error");
                false
            }
        }
    }

    /// Up to `policy.max_attempts` checks with backoff between them.
    ///
    /// Returns `Err(Cancelled)` if `cancel` fires before a positive answer.
    pub async fn verify_with_retry(
        &self,
        domain: &Domain,
        policy: &BackoffPolicy,
        cancel: &CancellationToken,
    ) -> Result<bool, VerifyError> {
        let attempts = policy.max_attempts.max(1);

        for attempt in 1..=attempts {
            if cancel.is_cancelled() {
                return Err(VerifyError::Cancelled);
            }

            if self.verify(domain).await {
                return Ok(true);
            }

            if attempt < attempts {
                let delay = policy.delay(attempt);
                tracing::debug!(
                    domain = %domain.name,
                    attempt,
                    delay_ms = delay.as_millis() as u64,
                    "Verification pending, retrying"
                );
                tokio::select! {
                    biased;
                    _ = cancel.cancelled() => return Err(VerifyError::Cancelled),
                    _ = tokio::time::sleep(delay) => {}
                }
            }
        }

        Ok(false)
    }

    /// Setup instructions in the configured locale.
    pub fn instructions(&self, domain: &Domain) -> VerificationInfo {
        instructions::build(
            domain,
            &self.cname_target,
            self.txt_record(domain),
            self.require_txt_token,
            self.locale,
        )
    }

    fn txt_record(&self, domain: &Domain) -> Option<(String, String)> {
        domain
            .verification_token
            .as_ref()
            .map(|token| (format!("{}.{}", self.txt_prefix, domain.name), token.clone()))
    }
}
