//! Behavior shared by every `DomainStore` backend.

use std::sync::Arc;

use uuid::Uuid;

use super::*;
use crate::domain::{Domain, DomainKind, DomainPatch};

async fn sqlite() -> Arc<dyn DomainStore> {
    Arc::new(SqliteStore::connect("sqlite::memory:", 1).await.unwrap())
}

fn memory() -> Arc<dyn DomainStore> {
    Arc::new(MemoryStore::new())
}

async fn backends() -> Vec<(&'static str, Arc<dyn DomainStore>)> {
    vec![("memory", memory()), ("sqlite", sqlite().await)]
}

#[tokio::test]
async fn test_create_and_lookup() {
    for (backend, store) in backends().await {
        let tenant = Uuid::new_v4();
        let domain = Domain::new_custom(tenant, "custom.example.com".into());
        store.create(&domain).await.unwrap();

        let by_id = store.get(domain.id).await.unwrap().expect(backend);
        assert_eq!(by_id.name, "custom.example.com", "{}", backend);
        assert_eq!(by_id.kind, DomainKind::Custom, "{}", backend);
        assert_eq!(by_id.verification_token, domain.verification_token, "{}", backend);

        let by_name = store.get_by_name("custom.example.com").await.unwrap();
        assert_eq!(by_name.map(|d| d.id), Some(domain.id), "{}", backend);

        assert!(store.get(Uuid::new_v4()).await.unwrap().is_none(), "{}", backend);
    }
}

#[tokio::test]
async fn test_duplicate_name_conflicts_across_tenants() {
    for (backend, store) in backends().await {
        store
            .create(&Domain::new_custom(Uuid::new_v4(), "taken.example.com".into()))
            .await
            .unwrap();

        let err = store
            .create(&Domain::new_custom(Uuid::new_v4(), "taken.example.com".into()))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)), "{}: {:?}", backend, err);
    }
}

#[tokio::test]
async fn test_mark_verified_stamps_verified_at() {
    for (backend, store) in backends().await {
        let domain = Domain::new_custom(Uuid::new_v4(), "custom.example.com".into());
        store.create(&domain).await.unwrap();

        store.mark_verified(domain.id).await.unwrap();

        let stored = store.get(domain.id).await.unwrap().unwrap();
        assert!(stored.verified, "{}", backend);
        assert!(!stored.ssl_issued, "{}", backend);
        let verified_at = stored.verified_at.expect(backend);
        assert!(verified_at >= stored.created_at, "{}", backend);
    }
}

#[tokio::test]
async fn test_mark_ssl_issued_requires_verified() {
    for (backend, store) in backends().await {
        let domain = Domain::new_custom(Uuid::new_v4(), "custom.example.com".into());
        store.create(&domain).await.unwrap();

        let err = store.mark_ssl_issued(domain.id).await.unwrap_err();
        assert!(matches!(err, StoreError::InvalidState(_)), "{}: {:?}", backend, err);

        store.mark_verified(domain.id).await.unwrap();
        store.mark_ssl_issued(domain.id).await.unwrap();
        assert!(store.get(domain.id).await.unwrap().unwrap().ssl_issued, "{}", backend);
    }
}

#[tokio::test]
async fn test_targeted_mutations_on_missing_rows() {
    for (backend, store) in backends().await {
        let missing = Uuid::new_v4();
        assert!(matches!(store.mark_verified(missing).await, Err(StoreError::NotFound(_))), "{}", backend);
        assert!(matches!(store.mark_ssl_issued(missing).await, Err(StoreError::NotFound(_))), "{}", backend);
        assert!(matches!(store.delete(missing).await, Err(StoreError::NotFound(_))), "{}", backend);
        assert!(
            matches!(store.update(missing, &DomainPatch::default()).await, Err(StoreError::NotFound(_))),
            "{}",
            backend
        );
        assert!(
            matches!(store.set_primary(Uuid::new_v4(), missing).await, Err(StoreError::NotFound(_))),
            "{}",
            backend
        );
    }
}

#[tokio::test]
async fn test_listings_filter_and_order() {
    for (backend, store) in backends().await {
        let tenant = Uuid::new_v4();
        let sub = Domain::new_subdomain(tenant, "shop.base.tld".into());
        let first = Domain::new_custom(tenant, "b.example.com".into());
        let second = Domain::new_custom(tenant, "a.example.com".into());
        let other = Domain::new_custom(Uuid::new_v4(), "other.example.com".into());
        for d in [&sub, &first, &second, &other] {
            store.create(d).await.unwrap();
        }

        let unverified: Vec<Uuid> = store
            .list_unverified_custom()
            .await
            .unwrap()
            .iter()
            .map(|d| d.id)
            .collect();
        assert_eq!(unverified, vec![first.id, second.id, other.id], "{}", backend);

        let tenant_names: Vec<String> = store
            .list_by_tenant(tenant)
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(
            tenant_names,
            vec!["a.example.com", "b.example.com", "shop.base.tld"],
            "{}",
            backend
        );

        store.mark_verified(second.id).await.unwrap();
        let verified: Vec<String> = store
            .list_verified()
            .await
            .unwrap()
            .into_iter()
            .map(|d| d.name)
            .collect();
        assert_eq!(verified, vec!["a.example.com", "shop.base.tld"], "{}", backend);

        let unactivated = store.list_unactivated().await.unwrap();
        assert_eq!(unactivated.len(), 1, "{}", backend);
        assert_eq!(unactivated[0].id, second.id, "{}", backend);
    }
}

#[tokio::test]
async fn test_update_patch() {
    for (backend, store) in backends().await {
        let domain = Domain::new_custom(Uuid::new_v4(), "custom.example.com".into());
        store.create(&domain).await.unwrap();

        let patch = DomainPatch {
            redirect_url: Some(Some("https://www.example.com".into())),
            archived: Some(true),
        };
        let updated = store.update(domain.id, &patch).await.unwrap();
        assert_eq!(updated.redirect_url.as_deref(), Some("https://www.example.com"), "{}", backend);
        assert!(updated.archived, "{}", backend);
        assert!(!updated.verified, "{}", backend);

        let clear = DomainPatch {
            redirect_url: Some(None),
            archived: None,
        };
        store.update(domain.id, &clear).await.unwrap();
        let stored = store.get(domain.id).await.unwrap().unwrap();
        assert!(stored.redirect_url.is_none(), "{}", backend);
        assert!(stored.archived, "{}", backend);
    }
}

#[tokio::test]
async fn test_set_primary_switches_and_checks_tenant() {
    for (backend, store) in backends().await {
        let tenant = Uuid::new_v4();
        let a = Domain::new_subdomain(tenant, "a.base.tld".into());
        let b = Domain::new_subdomain(tenant, "b.base.tld".into());
        let foreign = Domain::new_subdomain(Uuid::new_v4(), "c.base.tld".into());
        for d in [&a, &b, &foreign] {
            store.create(d).await.unwrap();
        }

        store.set_primary(tenant, a.id).await.unwrap();
        store.set_primary(tenant, b.id).await.unwrap();

        let primaries: Vec<Uuid> = store
            .list_by_tenant(tenant)
            .await
            .unwrap()
            .into_iter()
            .filter(|d| d.is_primary)
            .map(|d| d.id)
            .collect();
        assert_eq!(primaries, vec![b.id], "{}", backend);

        // Another tenant's row is not reachable and leaves state untouched.
        let err = store.set_primary(tenant, foreign.id).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)), "{}", backend);
        assert!(store.get(b.id).await.unwrap().unwrap().is_primary, "{}", backend);
        assert!(!store.get(foreign.id).await.unwrap().unwrap().is_primary, "{}", backend);
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_set_primary_leaves_one_primary() {
    for (backend, store) in backends().await {
        race_set_primary(backend, store, 4).await;
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_set_primary_on_pooled_sqlite_file() {
    let path = std::env::temp_dir().join(format!("gateway-store-{}.db", Uuid::new_v4()));
    let url = format!("sqlite://{}", path.display());
    let store: Arc<dyn DomainStore> = Arc::new(SqliteStore::connect(&url, 8).await.unwrap());

    race_set_primary("sqlite-file", store, 10).await;

    for suffix in ["", "-wal", "-shm"] {
        let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
    }
}

/// Eight domains, every one made primary `rounds` times from parallel tasks.
async fn race_set_primary(backend: &str, store: Arc<dyn DomainStore>, rounds: usize) {
    let tenant = Uuid::new_v4();
    let mut ids = Vec::new();
    for i in 0..8 {
        let d = Domain::new_subdomain(tenant, format!("site{}.base.tld", i));
        store.create(&d).await.unwrap();
        ids.push(d.id);
    }

    let mut tasks = Vec::new();
    for _ in 0..rounds {
        for id in &ids {
            let store = store.clone();
            let id = *id;
            tasks.push(tokio::spawn(async move { store.set_primary(tenant, id).await }));
        }
    }
    for task in tasks {
        task.await.unwrap().unwrap();
    }

    let primaries = store
        .list_by_tenant(tenant)
        .await
        .unwrap()
        .into_iter()
        .filter(|d| d.is_primary)
        .count();
    assert_eq!(primaries, 1, "{}", backend);
}

#[tokio::test]
async fn test_delete_frees_name() {
    for (backend, store) in backends().await {
        let tenant = Uuid::new_v4();
        let domain = Domain::new_custom(tenant, "custom.example.com".into());
        store.create(&domain).await.unwrap();
        store.delete(domain.id).await.unwrap();

        assert!(store.get(domain.id).await.unwrap().is_none(), "{}", backend);
        store
            .create(&Domain::new_custom(tenant, "custom.example.com".into()))
            .await
            .expect(backend);
    }
}
