//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! DNS check / proxy push fails:
//!     → backoff.rs (next delay from the policy)
//!     → caller sleeps, racing its cancellation token
//! ```
//!
//! # Design Decisions
//! - Every external call has a deadline (resolver and HTTP client timeouts)
//! - Retries are bounded; the reconciliation pass is the outer retry loop
//! - Jitter is opt-in so timer-driven tests stay deterministic

pub mod backoff;

pub use backoff::{calculate_backoff, BackoffPolicy};
