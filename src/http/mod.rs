//! HTTP serving subsystem.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (Axum, trace + timeout layers)
//!     → admin/ (auth middleware, handlers)
//!     → DomainService
//! ```

pub mod server;

pub use server::HttpServer;
