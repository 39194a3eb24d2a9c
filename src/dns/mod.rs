//! DNS verification subsystem.
//!
//! # Data Flow
//! ```text
//! Domain (custom, unverified)
//!     → verifier.rs (lookup name: www.<root> or the name itself)
//!     → lookup.rs (CNAME / TXT via hickory or a static table)
//!     → match against dns.cname_target → bool
//!
//! Tenant asks how to configure DNS:
//!     → instructions.rs (record name, target, localized prose)
//! ```

pub mod instructions;
pub mod lookup;
pub mod verifier;

pub use lookup::{DnsLookup, HickoryLookup, LookupError, StaticLookup};
pub use verifier::{DnsVerifier, VerifyError};
