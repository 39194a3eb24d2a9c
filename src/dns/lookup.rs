//! Resolver abstraction.
//!
//! `HickoryLookup` queries the system-configured upstream resolvers.
//! `StaticLookup` answers from a fixed table and never touches the network.

use std::collections::HashMap;
use std::sync::RwLock;

use async_trait::async_trait;
use hickory_resolver::proto::rr::{RData, RecordType};
use hickory_resolver::{Resolver, TokioResolver};
use thiserror::Error;

/// Lookup failures. `NotFound` is an expected answer, `Failed` is not.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum LookupError {
    #[error("no such record")]
    NotFound,

    #[error("lookup failed: {0}")]
    Failed(String),
}

/// Minimal record lookups needed for verification.
#[async_trait]
pub trait DnsLookup: Send + Sync {
    /// CNAME targets of `name`, as returned (trailing dot included).
    async fn lookup_cname(&self, name: &str) -> Result<Vec<String>, LookupError>;

    /// TXT strings of `name`, one entry per record.
    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, LookupError>;
}

/// Resolver backed by hickory, configured from the host.
pub struct HickoryLookup {
    resolver: TokioResolver,
}

impl HickoryLookup {
    /// Build from the system resolver configuration (`/etc/resolv.conf`).
    pub fn from_system_conf() -> Result<Self, LookupError> {
        let resolver = Resolver::builder_tokio()
            .map(|builder| builder.build())
            .map_err(|e| LookupError::Failed(format!("resolver init: {}", e)))?;
        Ok(Self { resolver })
    }

    async fn records(&self, name: &str, record_type: RecordType) -> Result<Vec<RData>, LookupError> {
        match self.resolver.lookup(name, record_type).await {
            Ok(lookup) => Ok(lookup.record_iter().map(|r| r.data().clone()).collect()),
            Err(e) if e.is_no_records_found() || e.is_nx_domain() => Err(LookupError::NotFound),
            Err(e) => Err(LookupError::Failed(e.to_string())),
        }
    }
}

#[async_trait]
impl DnsLookup for HickoryLookup {
    async fn lookup_cname(&self, name: &str) -> Result<Vec<String>, LookupError> {
        let targets: Vec<String> = self
            .records(name, RecordType::CNAME)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RData::CNAME(cname) => Some(cname.0.to_utf8()),
                _ => None,
            })
            .collect();

        if targets.is_empty() {
            return Err(LookupError::NotFound);
        }
        Ok(targets)
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, LookupError> {
        let values: Vec<String> = self
            .records(name, RecordType::TXT)
            .await?
            .into_iter()
            .filter_map(|data| match data {
                RData::TXT(txt) => Some(
                    txt.txt_data()
                        .iter()
                        .map(|part| String::from_utf8_lossy(part).into_owned())
                        .collect::<String>(),
                ),
                _ => None,
            })
            .collect();

        if values.is_empty() {
            return Err(LookupError::NotFound);
        }
        Ok(values)
    }
}

/// Fixed-answer resolver for tests and offline development.
///
/// Names without an entry answer `NotFound`; names marked failing answer
/// `Failed`.
#[derive(Default)]
pub struct StaticLookup {
    cnames: RwLock<HashMap<String, Vec<String>>>,
    txts: RwLock<HashMap<String, Vec<String>>>,
    failing: RwLock<Vec<String>>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_cname(&self, name: &str, target: &str) {
        if let Ok(mut cnames) = self.cnames.write() {
            cnames.insert(name.to_string(), vec![target.to_string()]);
        }
    }

    pub fn set_txt(&self, name: &str, value: &str) {
        if let Ok(mut txts) = self.txts.write() {
            txts.entry(name.to_string()).or_default().push(value.to_string());
        }
    }

    pub fn fail(&self, name: &str) {
        if let Ok(mut failing) = self.failing.write() {
            failing.push(name.to_string());
        }
    }

    pub fn clear(&self, name: &str) {
        if let Ok(mut cnames) = self.cnames.write() {
            cnames.remove(name);
        }
        if let Ok(mut txts) = self.txts.write() {
            txts.remove(name);
        }
        if let Ok(mut failing) = self.failing.write() {
            failing.retain(|n| n != name);
        }
    }

    fn answer(
        &self,
        table: &RwLock<HashMap<String, Vec<String>>>,
        name: &str,
    ) -> Result<Vec<String>, LookupError> {
        let failing = self
            .failing
            .read()
            .map(|f| f.iter().any(|n| n == name))
            .unwrap_or(false);
        if failing {
            return Err(LookupError::Failed(format!("SERVFAIL for {}", name)));
        }

        table
            .read()
            .ok()
            .and_then(|t| t.get(name).cloned())
            .ok_or(LookupError::NotFound)
    }
}

#[async_trait]
impl DnsLookup for StaticLookup {
    async fn lookup_cname(&self, name: &str) -> Result<Vec<String>, LookupError> {
        self.answer(&self.cnames, name)
    }

    async fn lookup_txt(&self, name: &str) -> Result<Vec<String>, LookupError> {
        self.answer(&self.txts, name)
    }
}
