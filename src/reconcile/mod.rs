//! Verification reconciliation.
//!
//! # Data Flow
//! ```text
//! ticker (immediately, then every worker.interval_secs)
//!     → store.list_unactivated → proxy add → mark_ssl_issued
//!     → store.list_unverified_custom
//!     → verifier.verify per domain
//!     → mark_verified → proxy add → mark_ssl_issued
//!     → PassReport
//! ```

pub mod worker;

pub use worker::{PassReport, VerificationWorker, VerifyOutcome, WorkerHandle};
