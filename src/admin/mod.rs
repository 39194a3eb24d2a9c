//! Operator admin API.
//!
//! # Routes
//! ```text
//! GET    /health                                         (no auth)
//! GET    /api/tenants/{tenant}/domains
//! POST   /api/tenants/{tenant}/domains
//! GET    /api/tenants/{tenant}/domains/{id}
//! PATCH  /api/tenants/{tenant}/domains/{id}
//! DELETE /api/tenants/{tenant}/domains/{id}
//! GET    /api/tenants/{tenant}/domains/{id}/instructions
//! POST   /api/tenants/{tenant}/domains/{id}/verify
//! POST   /api/tenants/{tenant}/domains/{id}/primary
//! ```

pub mod auth;
pub mod error;
pub mod handlers;

use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use tokio_util::sync::CancellationToken;

use self::auth::admin_auth_middleware;
use self::handlers::*;
use crate::domain::DomainService;

pub use error::ApiError;

/// State shared by admin handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<DomainService>,
    pub api_key: Arc<str>,
    /// Process shutdown; in-flight verifications observe it.
    pub shutdown: CancellationToken,
}

pub fn setup_admin_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/api/tenants/{tenant}/domains",
            get(list_domains).post(create_domain),
        )
        .route(
            "/api/tenants/{tenant}/domains/{id}",
            get(get_domain).patch(update_domain).delete(delete_domain),
        )
        .route(
            "/api/tenants/{tenant}/domains/{id}/instructions",
            get(get_instructions),
        )
        .route("/api/tenants/{tenant}/domains/{id}/verify", post(verify_domain))
        .route("/api/tenants/{tenant}/domains/{id}/primary", post(set_primary))
        .layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .with_state(state)
}
