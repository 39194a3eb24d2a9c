//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create the Axum router with the admin handlers
//! - Wire up middleware (tracing, request timeout)
//! - Serve on a listener until the shutdown token fires

use std::time::Duration;

use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::admin::{setup_admin_router, AppState};
use crate::config::AdminConfig;

/// HTTP server for the admin API.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(config: &AdminConfig, state: AppState) -> Self {
        Self {
            router: Self::build_router(config, state),
        }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &AdminConfig, state: AppState) -> Router {
        setup_admin_router(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout_secs)))
            .layer(TraceLayer::new_for_http())
    }

    pub fn router(&self) -> Router {
        self.router.clone()
    }

    /// Serve until `shutdown` is cancelled, then drain in-flight requests.
    pub async fn run(self, listener: TcpListener, shutdown: CancellationToken) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "Admin API listening");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        tracing::info!("Admin API stopped");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::body::{to_bytes, Body};
    use axum::http::{Request, StatusCode};
    use tower::ServiceExt;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::dns::StaticLookup;
    use crate::lifecycle::Gateway;
    use crate::proxy::fake::FakeAdmin;
    use crate::store::MemoryStore;

    fn server() -> HttpServer {
        let mut config = GatewayConfig::default();
        config.proxy.base_domain = "base.tld".into();
        config.admin.api_key = "secret".into();

        let gateway = Gateway::assemble(
            &config,
            Arc::new(MemoryStore::new()),
            Arc::new(StaticLookup::new()),
            Arc::new(FakeAdmin::new()),
        );
        let state = AppState {
            service: gateway.service,
            api_key: Arc::from("secret"),
            shutdown: CancellationToken::new(),
        };
        HttpServer::new(&config.admin, state)
    }

    #[tokio::test]
    async fn test_health_route() {
        let response = server()
            .router()
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["service"], "domain-gateway");
    }

    #[tokio::test]
    async fn test_api_key_checked_before_path_parsing() {
        let router = server().router();

        let denied = router
            .clone()
            .oneshot(
                Request::get("/api/tenants/not-a-uuid/domains")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(denied.status(), StatusCode::UNAUTHORIZED);

        let bad_path = router
            .oneshot(
                Request::get("/api/tenants/not-a-uuid/domains")
                    .header("authorization", "Bearer secret")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(bad_path.status(), StatusCode::BAD_REQUEST);
    }
}
