//! Domain Gateway Library

pub mod admin;
pub mod config;
pub mod dns;
pub mod domain;
pub mod error;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod proxy;
pub mod reconcile;
pub mod resilience;
pub mod store;

pub use config::GatewayConfig;
pub use domain::DomainService;
pub use error::GatewayError;
pub use http::HttpServer;
pub use lifecycle::{Gateway, Shutdown};
