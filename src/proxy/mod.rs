//! Proxy control-plane subsystem.
//!
//! # Data Flow
//! ```text
//! Verified domains
//!     → synchronizer.rs (route table, config document)
//!     → client.rs (Caddy admin API over HTTP)
//!         POST   /load                                   full rebuild
//!         POST   /config/apps/http/servers/<srv>/routes  incremental add
//!         DELETE /id/route-<domain id>                   incremental remove
//! ```

pub mod client;
pub mod schema;
pub mod synchronizer;

#[cfg(test)]
pub(crate) mod fake;

pub use client::{CaddyAdminClient, ProxyAdmin, ProxyError};
pub use schema::CaddyConfig;
pub use synchronizer::{ActiveRoute, RouteSynchronizer};
