//! In-memory storage backend.
//!
//! One `RwLock` guards the whole table so multi-row operations such as
//! `set_primary` are a single critical section.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{DomainStore, Result, StoreError};
use crate::domain::{Domain, DomainKind, DomainPatch};

#[derive(Default)]
struct Table {
    rows: HashMap<Uuid, Row>,
    /// name -> id
    names: HashMap<String, Uuid>,
    next_seq: u64,
}

struct Row {
    /// Insertion order; breaks `created_at` ties.
    seq: u64,
    domain: Domain,
}

impl Table {
    fn row_mut(&mut self, id: Uuid) -> Result<&mut Domain> {
        self.rows
            .get_mut(&id)
            .map(|r| &mut r.domain)
            .ok_or(StoreError::NotFound(id))
    }

    fn collect<F>(&self, filter: F) -> Vec<&Row>
    where
        F: Fn(&Domain) -> bool,
    {
        self.rows.values().filter(|r| filter(&r.domain)).collect()
    }
}

/// In-memory domain store.
#[derive(Default)]
pub struct MemoryStore {
    table: RwLock<Table>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn oldest_first(mut rows: Vec<&Row>) -> Vec<Domain> {
    rows.sort_by(|a, b| {
        a.domain
            .created_at
            .cmp(&b.domain.created_at)
            .then(a.seq.cmp(&b.seq))
    });
    rows.into_iter().map(|r| r.domain.clone()).collect()
}

#[async_trait]
impl DomainStore for MemoryStore {
    async fn create(&self, domain: &Domain) -> Result<()> {
        let mut table = self.table.write().await;
        if table.names.contains_key(&domain.name) || table.rows.contains_key(&domain.id) {
            return Err(StoreError::Conflict(domain.name.clone()));
        }
        let seq = table.next_seq;
        table.next_seq += 1;
        table.names.insert(domain.name.clone(), domain.id);
        table.rows.insert(
            domain.id,
            Row {
                seq,
                domain: domain.clone(),
            },
        );
        Ok(())
    }

    async fn get(&self, id: Uuid) -> Result<Option<Domain>> {
        let table = self.table.read().await;
        Ok(table.rows.get(&id).map(|r| r.domain.clone()))
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Domain>> {
        let table = self.table.read().await;
        Ok(table
            .names
            .get(name)
            .and_then(|id| table.rows.get(id))
            .map(|r| r.domain.clone()))
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Domain>> {
        let table = self.table.read().await;
        let mut domains = oldest_first(table.collect(|d| d.tenant_id == tenant_id));
        domains.reverse();
        Ok(domains)
    }

    async fn list_unverified_custom(&self) -> Result<Vec<Domain>> {
        let table = self.table.read().await;
        Ok(oldest_first(
            table.collect(|d| !d.verified && d.kind == DomainKind::Custom),
        ))
    }

    async fn list_verified(&self) -> Result<Vec<Domain>> {
        let table = self.table.read().await;
        let mut domains: Vec<Domain> = table
            .collect(|d| d.verified)
            .into_iter()
            .map(|r| r.domain.clone())
            .collect();
        domains.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(domains)
    }

    async fn list_unactivated(&self) -> Result<Vec<Domain>> {
        let table = self.table.read().await;
        Ok(oldest_first(table.collect(|d| {
            d.verified && !d.ssl_issued && d.kind == DomainKind::Custom
        })))
    }

    async fn mark_verified(&self, id: Uuid) -> Result<()> {
        let mut table = self.table.write().await;
        let domain = table.row_mut(id)?;
        let now = Utc::now();
        domain.verified = true;
        domain.verified_at = Some(now);
        domain.updated_at = now;
        Ok(())
    }

    async fn mark_ssl_issued(&self, id: Uuid) -> Result<()> {
        let mut table = self.table.write().await;
        let domain = table.row_mut(id)?;
        if !domain.verified {
            return Err(StoreError::InvalidState(format!(
                "{} is not verified",
                domain.name
            )));
        }
        domain.ssl_issued = true;
        domain.updated_at = Utc::now();
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &DomainPatch) -> Result<Domain> {
        let mut table = self.table.write().await;
        let domain = table.row_mut(id)?;
        patch.apply(domain);
        domain.updated_at = Utc::now();
        Ok(domain.clone())
    }

    async fn set_primary(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
        let mut table = self.table.write().await;
        match table.rows.get(&id) {
            Some(r) if r.domain.tenant_id == tenant_id => {}
            _ => return Err(StoreError::NotFound(id)),
        }

        let now = Utc::now();
        for row in table.rows.values_mut() {
            let domain = &mut row.domain;
            if domain.tenant_id != tenant_id {
                continue;
            }
            let primary = domain.id == id;
            if domain.is_primary != primary {
                domain.is_primary = primary;
                domain.updated_at = now;
            }
        }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let mut table = self.table.write().await;
        let row = table.rows.remove(&id).ok_or(StoreError::NotFound(id))?;
        table.names.remove(&row.domain.name);
        Ok(())
    }
}
