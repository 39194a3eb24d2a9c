//! Domain name normalization and classification.
//!
//! # Responsibilities
//! - Canonicalize user input (trim, lowercase, strip trailing dot)
//! - Reject names that are not valid hostnames
//! - Decide whether a name is a platform subdomain or a custom domain
//!
//! # Design Decisions
//! - Only LDH labels are accepted; IDNs must arrive in punycode form
//! - A "root" domain is any two-label name; no public-suffix list is consulted

use thiserror::Error;

use crate::domain::model::DomainKind;

const MAX_NAME_LEN: usize = 253;
const MAX_LABEL_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("domain name is empty")]
    Empty,

    #[error("domain name exceeds 253 characters")]
    TooLong,

    #[error("domain name needs at least two labels: {0}")]
    SingleLabel(String),

    #[error("invalid label {label:?} in {name}")]
    InvalidLabel { name: String, label: String },

    #[error("{name} cannot be registered as {kind} under base domain {base}")]
    KindMismatch {
        name: String,
        kind: DomainKind,
        base: String,
    },
}

/// Canonical form of a domain name.
pub fn normalize_name(raw: &str) -> Result<String, NameError> {
    let name = raw.trim().trim_end_matches('.').to_ascii_lowercase();
    if name.is_empty() {
        return Err(NameError::Empty);
    }
    if name.len() > MAX_NAME_LEN {
        return Err(NameError::TooLong);
    }

    let mut labels = 0;
    for label in name.split('.') {
        labels += 1;
        if !is_valid_label(label) {
            return Err(NameError::InvalidLabel {
                name: name.clone(),
                label: label.to_string(),
            });
        }
    }
    if labels < 2 {
        return Err(NameError::SingleLabel(name));
    }

    Ok(name)
}

fn is_valid_label(label: &str) -> bool {
    !label.is_empty()
        && label.len() <= MAX_LABEL_LEN
        && !label.starts_with('-')
        && !label.ends_with('-')
        && label
            .bytes()
            .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || b == b'-')
}

/// True for two-label names such as `example.com`.
pub fn is_root(name: &str) -> bool {
    name.split('.').count() == 2
}

/// Name whose CNAME proves delegation.
///
/// Root domains usually cannot carry a CNAME, so they are checked at `www`.
pub fn lookup_name(name: &str) -> String {
    if is_root(name) {
        format!("www.{}", name)
    } else {
        name.to_string()
    }
}

/// Relative record name a tenant enters in their DNS zone.
pub fn record_name(name: &str) -> String {
    let labels: Vec<&str> = name.split('.').collect();
    if labels.len() <= 2 {
        "www".to_string()
    } else {
        labels[..labels.len() - 2].join(".")
    }
}

/// Resolve the kind of an already-normalized name against the base domain.
///
/// `requested` is honored only when it agrees with the name's position
/// relative to `base_domain`.
pub fn classify(
    name: &str,
    base_domain: &str,
    requested: Option<DomainKind>,
) -> Result<DomainKind, NameError> {
    let under_base = !base_domain.is_empty()
        && name.len() > base_domain.len()
        && name.ends_with(base_domain)
        && name.as_bytes()[name.len() - base_domain.len() - 1] == b'.';

    let detected = if under_base {
        DomainKind::Subdomain
    } else {
        DomainKind::Custom
    };

    let mismatch = |kind| NameError::KindMismatch {
        name: name.to_string(),
        kind,
        base: base_domain.to_string(),
    };

    if name == base_domain {
        return Err(mismatch(requested.unwrap_or(DomainKind::Custom)));
    }

    match requested {
        Some(kind) if kind != detected => Err(mismatch(kind)),
        _ => Ok(detected),
    }
}

/// Compare two DNS names ignoring case and trailing dots.
pub fn names_match(a: &str, b: &str) -> bool {
    a.trim_end_matches('.')
        .eq_ignore_ascii_case(b.trim_end_matches('.'))
}
