//! Subset of the Caddy JSON config document that the gateway writes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CaddyConfig {
    pub apps: Apps,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Apps {
    pub http: HttpApp,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tls: Option<TlsApp>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpApp {
    pub servers: BTreeMap<String, HttpServer>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HttpServer {
    pub listen: Vec<String>,
    pub routes: Vec<Route>,
}

/// One entry of a server's route list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Route {
    /// Caddy's config-traversal id; makes `/id/<id>` addressable.
    #[serde(rename = "@id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(rename = "match", default, skip_serializing_if = "Vec::is_empty")]
    pub matchers: Vec<Match>,
    pub handle: Vec<Handler>,
    #[serde(default)]
    pub terminal: bool,
}

impl Route {
    /// Terminal host route proxying to `upstream` (`host:port`).
    pub fn reverse_proxy(id: Option<String>, host: &str, upstream: &str) -> Self {
        Self {
            id,
            matchers: vec![Match {
                host: vec![host.to_string()],
            }],
            handle: vec![Handler {
                handler: "reverse_proxy".to_string(),
                upstreams: vec![Upstream {
                    dial: upstream.to_string(),
                }],
            }],
            terminal: true,
        }
    }

    pub fn hosts(&self) -> impl Iterator<Item = &str> {
        self.matchers
            .iter()
            .flat_map(|m| m.host.iter().map(String::as_str))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Match {
    pub host: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Handler {
    pub handler: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub upstreams: Vec<Upstream>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Upstream {
    pub dial: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsApp {
    pub automation: Automation,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Automation {
    pub policies: Vec<TlsPolicy>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsPolicy {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    pub issuers: Vec<Issuer>,
}

/// ACME issuer solving the DNS-01 challenge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub module: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub email: String,
    pub challenges: Challenges,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Challenges {
    pub dns: DnsChallenge,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsChallenge {
    pub provider: DnsProvider,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DnsProvider {
    pub name: String,
    pub api_token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_wire_shape() {
        let route = Route::reverse_proxy(
            Some("route-1".into()),
            "custom.example.com",
            "localhost:3000",
        );
        let json = serde_json::to_value(&route).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "@id": "route-1",
                "match": [{"host": ["custom.example.com"]}],
                "handle": [{
                    "handler": "reverse_proxy",
                    "upstreams": [{"dial": "localhost:3000"}]
                }],
                "terminal": true
            })
        );

        let back: Route = serde_json::from_value(json).unwrap();
        assert_eq!(back.hosts().collect::<Vec<_>>(), vec!["custom.example.com"]);
    }

    #[test]
    fn test_route_without_id_omits_field() {
        let route = Route::reverse_proxy(None, "*.base.tld", "localhost:3000");
        let json = serde_json::to_value(&route).unwrap();
        assert!(json.get("@id").is_none());
    }
}
