//! Caddy admin client against a recording mock endpoint.

mod common;

use axum::http::Method;
use common::*;
use std::sync::Arc;

use domain_gateway::config::{DnsConfig, ProxyAdminConfig};
use domain_gateway::domain::Domain;
use domain_gateway::proxy::schema::Route;
use domain_gateway::proxy::{CaddyAdminClient, ProxyAdmin, ProxyError, RouteSynchronizer};
use uuid::Uuid;

fn client_for(caddy: &MockCaddy) -> CaddyAdminClient {
    let config = ProxyAdminConfig {
        admin_url: caddy.url(),
        request_timeout_secs: 2,
        ..ProxyAdminConfig::default()
    };
    CaddyAdminClient::new(&config).unwrap()
}

#[tokio::test]
async fn test_add_route_posts_to_server_routes() {
    let caddy = MockCaddy::start().await;
    let client = client_for(&caddy);

    let route = Route::reverse_proxy(
        Some("route-1".to_string()),
        "shop.example.com",
        "localhost:3000",
    );
    client.add_route("main", &route).await.unwrap();

    let requests = caddy.requests();
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method, Method::POST);
    assert_eq!(requests[0].path, "/config/apps/http/servers/main/routes");

    let body = requests[0].body.as_ref().unwrap();
    assert_eq!(body["@id"], "route-1");
    assert_eq!(body["match"][0]["host"][0], "shop.example.com");
    assert_eq!(body["handle"][0]["handler"], "reverse_proxy");
    assert_eq!(body["handle"][0]["upstreams"][0]["dial"], "localhost:3000");
}

#[tokio::test]
async fn test_delete_route_targets_id_path() {
    let caddy = MockCaddy::start().await;
    let client = client_for(&caddy);

    let route = Route::reverse_proxy(Some("route-abc".to_string()), "a.example.com", "localhost:3000");
    client.add_route("main", &route).await.unwrap();
    caddy.clear();

    client.delete_route("route-abc").await.unwrap();

    assert_eq!(caddy.paths(), vec!["DELETE /id/route-abc"]);
    assert!(caddy.live_ids().is_empty());
}

#[tokio::test]
async fn test_duplicate_route_id_is_rejected() {
    let caddy = MockCaddy::start().await;
    let client = client_for(&caddy);
    let route = Route::reverse_proxy(Some("route-1".to_string()), "a.example.com", "localhost:3000");

    client.add_route("main", &route).await.unwrap();
    let err = client.add_route("main", &route).await.unwrap_err();

    assert!(matches!(err, ProxyError::Status { status: 400, ref body } if body.contains("duplicate ID")));
}

#[tokio::test]
async fn test_synchronizer_add_is_repeatable() {
    let caddy = MockCaddy::start().await;
    let proxy = ProxyAdminConfig {
        admin_url: caddy.url(),
        base_domain: "base.tld".to_string(),
        request_timeout_secs: 2,
        ..ProxyAdminConfig::default()
    };
    let admin = Arc::new(CaddyAdminClient::new(&proxy).unwrap());
    let sync = RouteSynchronizer::new(admin, &proxy, &DnsConfig::default());

    let mut domain = Domain::new_custom(Uuid::new_v4(), "shop.example.com".to_string());
    domain.verified = true;

    // The first push lands on the proxy even if the caller never hears back.
    sync.add_route(&domain).await.unwrap();
    sync.add_route(&domain).await.unwrap();

    assert_eq!(caddy.live_ids(), vec![domain.route_id()]);
    let id_path = format!("DELETE /id/{}", domain.route_id());
    assert_eq!(
        caddy.paths(),
        vec![
            id_path.clone(),
            "POST /config/apps/http/servers/main/routes".to_string(),
            id_path,
            "POST /config/apps/http/servers/main/routes".to_string(),
        ]
    );
}

#[tokio::test]
async fn test_synchronizer_add_fails_when_proxy_is_down() {
    let caddy = MockCaddy::start().await;
    caddy.fail_with(500);
    let proxy = ProxyAdminConfig {
        admin_url: caddy.url(),
        request_timeout_secs: 2,
        ..ProxyAdminConfig::default()
    };
    let admin = Arc::new(CaddyAdminClient::new(&proxy).unwrap());
    let sync = RouteSynchronizer::new(admin, &proxy, &DnsConfig::default());

    let mut domain = Domain::new_custom(Uuid::new_v4(), "shop.example.com".to_string());
    domain.verified = true;

    let err = sync.add_route(&domain).await.unwrap_err();
    assert!(matches!(err, ProxyError::Status { status: 500, .. }));
    assert_eq!(sync.route_count().await, 0);
}

#[tokio::test]
async fn test_error_status_is_reported_with_body() {
    let caddy = MockCaddy::start().await;
    caddy.fail_with(404);
    let client = client_for(&caddy);

    let err = client.delete_route("route-missing").await.unwrap_err();
    match err {
        ProxyError::Status { status, body } => {
            assert_eq!(status, 404);
            assert!(body.contains("injected failure"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_unreachable_admin_is_transport_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let config = ProxyAdminConfig {
        admin_url: format!("http://{}", addr),
        request_timeout_secs: 2,
        ..ProxyAdminConfig::default()
    };
    let client = CaddyAdminClient::new(&config).unwrap();

    let route = Route::reverse_proxy(None, "x.example.com", "localhost:3000");
    let err = client.add_route("main", &route).await.unwrap_err();
    assert!(matches!(err, ProxyError::Transport(_)));
}
