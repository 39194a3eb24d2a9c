//! Domain model subsystem.
//!
//! # Lifecycle
//! ```text
//! Subdomain: created ─────────────────────────────▶ verified + ssl_issued
//! Custom:    created (token) ─▶ verified ─▶ routed ─▶ ssl_issued
//!                               (DNS check)  (proxy)
//! ```
//!
//! # Invariants
//! - `verified == false` implies `ssl_issued == false`
//! - Only custom domains are ever unverified
//! - Names are stored in canonical form (see `name.rs`)

pub mod model;
pub mod name;
pub mod service;

pub use model::{Domain, DomainKind, DomainPatch, VerificationInfo};
pub use name::NameError;
pub use service::{CreatedDomain, DomainService};
