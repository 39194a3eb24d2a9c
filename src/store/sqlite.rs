//! SQLite storage backend.
//!
//! Uses WAL journal mode for concurrent reads with serialized writes.
//! Uniqueness rules live in the schema: the name is globally unique and a
//! partial unique index allows at most one primary row per tenant.

use std::str::FromStr;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteRow, SqliteSynchronous,
};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use super::{DomainStore, Result, StoreError};
use crate::domain::{Domain, DomainKind, DomainPatch};

const COLUMNS: &str = "id, tenant_id, name, kind, verified, verification_token, is_primary, \
     ssl_issued, redirect_url, archived, created_at, updated_at, verified_at";

const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS domains (
        id TEXT PRIMARY KEY,
        tenant_id TEXT NOT NULL,
        name TEXT NOT NULL UNIQUE,
        kind TEXT NOT NULL CHECK (kind IN ('subdomain', 'custom')),
        verified INTEGER NOT NULL DEFAULT 0,
        verification_token TEXT,
        is_primary INTEGER NOT NULL DEFAULT 0,
        ssl_issued INTEGER NOT NULL DEFAULT 0,
        redirect_url TEXT,
        archived INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL,
        verified_at TEXT,
        CONSTRAINT unique_tenant_domain UNIQUE (tenant_id, name),
        CONSTRAINT ssl_requires_verified CHECK (ssl_issued = 0 OR verified = 1)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_domains_tenant ON domains(tenant_id)",
    "CREATE INDEX IF NOT EXISTS idx_domains_verified ON domains(verified, kind)",
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_domains_one_primary ON domains(tenant_id) WHERE is_primary = 1",
];

/// SQLite-backed domain store.
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if needed) the database at `url` and run migrations.
    pub async fn connect(url: &str, max_connections: u32) -> Result<Self> {
        let in_memory = url.contains(":memory:");

        let mut options = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .busy_timeout(Duration::from_secs(5));
        if !in_memory {
            options = options
                .journal_mode(SqliteJournalMode::Wal)
                .synchronous(SqliteSynchronous::Normal);
        }

        // Each in-memory connection is its own database; pin to one.
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections)
        };

        let pool = pool_options.connect_with(options).await?;
        let store = Self { pool };
        store.migrate().await?;
        tracing::info!(url = %url, "SQLite domain store opened");
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        for migration in MIGRATIONS {
            sqlx::query(migration).execute(&self.pool).await?;
        }
        tracing::debug!("Domain store migrations completed");
        Ok(())
    }

    async fn fetch_where(&self, clause: &str, bind: Option<String>) -> Result<Vec<Domain>> {
        let sql = format!("SELECT {} FROM domains WHERE {}", COLUMNS, clause);
        let mut query = sqlx::query(&sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        let rows = query.fetch_all(&self.pool).await?;
        rows.iter().map(row_to_domain).collect()
    }

    async fn fetch_one_where(&self, clause: &str, bind: String) -> Result<Option<Domain>> {
        let sql = format!("SELECT {} FROM domains WHERE {}", COLUMNS, clause);
        let row = sqlx::query(&sql)
            .bind(bind)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_domain).transpose()
    }

    async fn exists(&self, id: Uuid) -> Result<bool> {
        let row = sqlx::query("SELECT 1 FROM domains WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }
}

fn timestamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| StoreError::InvalidData(format!("bad timestamp {:?}: {}", value, e)))
}

fn parse_uuid(value: &str) -> Result<Uuid> {
    Uuid::parse_str(value)
        .map_err(|e| StoreError::InvalidData(format!("bad uuid {:?}: {}", value, e)))
}

fn row_to_domain(row: &SqliteRow) -> Result<Domain> {
    let id: String = row.try_get("id")?;
    let tenant_id: String = row.try_get("tenant_id")?;
    let kind: String = row.try_get("kind")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;
    let verified_at: Option<String> = row.try_get("verified_at")?;

    Ok(Domain {
        id: parse_uuid(&id)?,
        tenant_id: parse_uuid(&tenant_id)?,
        name: row.try_get("name")?,
        kind: DomainKind::from_str(&kind).map_err(StoreError::InvalidData)?,
        verified: row.try_get("verified")?,
        verification_token: row.try_get("verification_token")?,
        is_primary: row.try_get("is_primary")?,
        ssl_issued: row.try_get("ssl_issued")?,
        redirect_url: row.try_get("redirect_url")?,
        archived: row.try_get("archived")?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
        verified_at: verified_at.as_deref().map(parse_timestamp).transpose()?,
    })
}

#[async_trait]
impl DomainStore for SqliteStore {
    async fn create(&self, domain: &Domain) -> Result<()> {
        let sql = format!(
            "INSERT INTO domains ({}) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            COLUMNS
        );
        let result = sqlx::query(&sql)
            .bind(domain.id.to_string())
            .bind(domain.tenant_id.to_string())
            .bind(&domain.name)
            .bind(domain.kind.as_str())
            .bind(domain.verified)
            .bind(&domain.verification_token)
            .bind(domain.is_primary)
            .bind(domain.ssl_issued)
            .bind(&domain.redirect_url)
            .bind(domain.archived)
            .bind(timestamp(&domain.created_at))
            .bind(timestamp(&domain.updated_at))
            .bind(domain.verified_at.as_ref().map(timestamp))
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                Err(StoreError::Conflict(domain.name.clone()))
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn get(&self, id: Uuid) -> Result<Option<Domain>> {
        self.fetch_one_where("id = ?", id.to_string()).await
    }

    async fn get_by_name(&self, name: &str) -> Result<Option<Domain>> {
        self.fetch_one_where("name = ?", name.to_string()).await
    }

    async fn list_by_tenant(&self, tenant_id: Uuid) -> Result<Vec<Domain>> {
        self.fetch_where(
            "tenant_id = ? ORDER BY created_at DESC, rowid DESC",
            Some(tenant_id.to_string()),
        )
        .await
    }

    async fn list_unverified_custom(&self) -> Result<Vec<Domain>> {
        self.fetch_where(
            "verified = 0 AND kind = 'custom' ORDER BY created_at ASC, rowid ASC",
            None,
        )
        .await
    }

    async fn list_verified(&self) -> Result<Vec<Domain>> {
        self.fetch_where("verified = 1 ORDER BY name ASC", None).await
    }

    async fn list_unactivated(&self) -> Result<Vec<Domain>> {
        self.fetch_where(
            "verified = 1 AND ssl_issued = 0 AND kind = 'custom' ORDER BY created_at ASC, rowid ASC",
            None,
        )
        .await
    }

    async fn mark_verified(&self, id: Uuid) -> Result<()> {
        let now = timestamp(&Utc::now());
        let result = sqlx::query(
            "UPDATE domains SET verified = 1, verified_at = ?, updated_at = ? WHERE id = ?",
        )
        .bind(&now)
        .bind(&now)
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    async fn mark_ssl_issued(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query(
            "UPDATE domains SET ssl_issued = 1, updated_at = ? WHERE id = ? AND verified = 1",
        )
        .bind(timestamp(&Utc::now()))
        .bind(id.to_string())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return if self.exists(id).await? {
                Err(StoreError::InvalidState(format!("{} is not verified", id)))
            } else {
                Err(StoreError::NotFound(id))
            };
        }
        Ok(())
    }

    async fn update(&self, id: Uuid, patch: &DomainPatch) -> Result<Domain> {
        let mut tx = self.pool.begin().await?;

        let sql = format!("SELECT {} FROM domains WHERE id = ?", COLUMNS);
        let row = sqlx::query(&sql)
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await?
            .ok_or(StoreError::NotFound(id))?;
        let mut domain = row_to_domain(&row)?;

        patch.apply(&mut domain);
        domain.updated_at = Utc::now();

        sqlx::query("UPDATE domains SET redirect_url = ?, archived = ?, updated_at = ? WHERE id = ?")
            .bind(&domain.redirect_url)
            .bind(domain.archived)
            .bind(timestamp(&domain.updated_at))
            .bind(id.to_string())
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(domain)
    }

    async fn set_primary(&self, tenant_id: Uuid, id: Uuid) -> Result<()> {
        let now = timestamp(&Utc::now());
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            "UPDATE domains SET is_primary = 0, updated_at = ? WHERE tenant_id = ? AND is_primary = 1",
        )
        .bind(&now)
        .bind(tenant_id.to_string())
        .execute(&mut *tx)
        .await?;

        let result = sqlx::query(
            "UPDATE domains SET is_primary = 1, updated_at = ? WHERE id = ? AND tenant_id = ?",
        )
        .bind(&now)
        .bind(id.to_string())
        .bind(tenant_id.to_string())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            tx.rollback().await?;
            return Err(StoreError::NotFound(id));
        }

        tx.commit().await?;
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let result = sqlx::query("DELETE FROM domains WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }
}
