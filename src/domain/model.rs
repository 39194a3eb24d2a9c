//! Domain record and related value types.

use chrono::{DateTime, Utc};
use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Prefix of generated verification tokens.
pub const TOKEN_PREFIX: &str = "gateway-verify";

const TOKEN_RANDOM_LEN: usize = 32;

/// Whether a domain lives under the platform base domain or is tenant-owned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DomainKind {
    Subdomain,
    Custom,
}

impl DomainKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainKind::Subdomain => "subdomain",
            DomainKind::Custom => "custom",
        }
    }
}

impl std::fmt::Display for DomainKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DomainKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "subdomain" => Ok(DomainKind::Subdomain),
            "custom" => Ok(DomainKind::Custom),
            other => Err(format!("unknown domain type: {}", other)),
        }
    }
}

/// A tenant domain and its verification/routing state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub id: Uuid,
    pub tenant_id: Uuid,
    #[serde(rename = "domain")]
    pub name: String,
    #[serde(rename = "type")]
    pub kind: DomainKind,
    pub verified: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verification_token: Option<String>,
    pub is_primary: bool,
    pub ssl_issued: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redirect_url: Option<String>,
    pub archived: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verified_at: Option<DateTime<Utc>>,
}

impl Domain {
    /// A platform subdomain. Verified on creation; the base wildcard
    /// certificate covers it.
    pub fn new_subdomain(tenant_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            kind: DomainKind::Subdomain,
            verified: true,
            verification_token: None,
            is_primary: false,
            ssl_issued: true,
            redirect_url: None,
            archived: false,
            created_at: now,
            updated_at: now,
            verified_at: Some(now),
        }
    }

    /// A tenant-owned domain awaiting DNS verification.
    pub fn new_custom(tenant_id: Uuid, name: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            tenant_id,
            name,
            kind: DomainKind::Custom,
            verified: false,
            verification_token: Some(generate_token()),
            is_primary: false,
            ssl_issued: false,
            redirect_url: None,
            archived: false,
            created_at: now,
            updated_at: now,
            verified_at: None,
        }
    }

    /// Stable proxy route identifier.
    pub fn route_id(&self) -> String {
        route_id(self.id)
    }
}

/// Route identifier used on the proxy for a domain id.
pub fn route_id(domain_id: Uuid) -> String {
    format!("route-{}", domain_id)
}

/// Random, URL-safe verification token.
pub fn generate_token() -> String {
    let random: String = rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_RANDOM_LEN)
        .map(char::from)
        .collect();
    format!("{}-{}", TOKEN_PREFIX, random.to_ascii_lowercase())
}

/// Mutable auxiliary attributes. `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DomainPatch {
    /// `Some(None)` clears the redirect.
    #[serde(default, with = "double_option")]
    pub redirect_url: Option<Option<String>>,
    #[serde(default)]
    pub archived: Option<bool>,
}

impl DomainPatch {
    pub fn is_empty(&self) -> bool {
        self.redirect_url.is_none() && self.archived.is_none()
    }

    pub fn apply(&self, domain: &mut Domain) {
        if let Some(redirect) = &self.redirect_url {
            domain.redirect_url = redirect.clone();
        }
        if let Some(archived) = self.archived {
            domain.archived = archived;
        }
    }
}

/// Distinguishes an absent field from an explicit `null`.
mod double_option {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S>(value: &Option<Option<String>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match value {
            Some(inner) => inner.serialize(serializer),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Option<String>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        Option::<String>::deserialize(deserializer).map(Some)
    }
}

/// DNS setup instructions handed to the tenant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerificationInfo {
    pub record_type: String,
    pub record_name: String,
    pub record_value: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txt_record_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub txt_record_value: Option<String>,
    pub instructions: String,
}
