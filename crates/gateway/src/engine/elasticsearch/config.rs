//! Connection settings for the Elasticsearch engine.

use serde::{Deserialize, Serialize};
use tracing::warn;

/// Environment variable holding the Elasticsearch node URL.
pub const ES_HOST_VAR: &str = "ES_HOST";
/// Environment variable holding the basic-auth username.
pub const ES_USERNAME_VAR: &str = "ES_USERNAME";
/// Environment variable holding the basic-auth password.
pub const ES_PASSWORD_VAR: &str = "ES_PASSWORD";
/// Environment variable holding the request timeout in milliseconds.
pub const ES_REQUEST_TIMEOUT_VAR: &str = "ES_REQUEST_TIMEOUT_MS";

/// Authentication configuration for Elasticsearch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElasticsearchAuth {
    /// Basic username/password authentication.
    Basic {
        /// The username for basic auth.
        username: String,
        /// The password for basic auth.
        password: String,
    },
    /// Bearer token authentication.
    Bearer {
        /// The bearer token.
        token: String,
    },
}

/// Configuration for the Elasticsearch engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElasticsearchConfig {
    /// Node URL (e.g., `"http://localhost:9200"`).
    ///
    /// `None` leaves the engine unconfigured: it can be constructed, but every
    /// operation fails with `BackendError::ConnectionFailed`.
    #[serde(default)]
    pub host: Option<String>,

    /// Request timeout in milliseconds (default: 30000).
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Optional authentication.
    #[serde(default)]
    pub auth: Option<ElasticsearchAuth>,

    /// Whether to disable certificate validation (default: false).
    /// Only use for development/testing.
    #[serde(default)]
    pub disable_certificate_validation: bool,
}

fn default_request_timeout_ms() -> u64 {
    30000
}

impl Default for ElasticsearchConfig {
    fn default() -> Self {
        Self {
            host: None,
            request_timeout_ms: default_request_timeout_ms(),
            auth: None,
            disable_certificate_validation: false,
        }
    }
}

impl ElasticsearchConfig {
    /// Creates a configuration pointing at `host`.
    pub fn with_host(host: impl Into<String>) -> Self {
        Self {
            host: Some(host.into()),
            ..Default::default()
        }
    }

    /// Reads the configuration from the process environment.
    ///
    /// A missing `ES_HOST` is logged and leaves the host unset.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which maps a variable name to
    /// its value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let host = non_empty(ES_HOST_VAR);
        if host.is_none() {
            warn!("{} variable not set", ES_HOST_VAR);
        }

        let auth = match (non_empty(ES_USERNAME_VAR), non_empty(ES_PASSWORD_VAR)) {
            (Some(username), Some(password)) => Some(ElasticsearchAuth::Basic { username, password }),
            (Some(_), None) | (None, Some(_)) => {
                warn!(
                    "{} and {} must both be set; ignoring credentials",
                    ES_USERNAME_VAR, ES_PASSWORD_VAR
                );
                None
            }
            (None, None) => None,
        };

        let request_timeout_ms = match non_empty(ES_REQUEST_TIMEOUT_VAR) {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                warn!(value = %raw, "Invalid {}, using default", ES_REQUEST_TIMEOUT_VAR);
                default_request_timeout_ms()
            }),
            None => default_request_timeout_ms(),
        };

        Self {
            host,
            request_timeout_ms,
            auth,
            disable_certificate_validation: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_config_defaults() {
        let config = ElasticsearchConfig::default();
        assert_eq!(config.host, None);
        assert_eq!(config.request_timeout_ms, 30000);
        assert!(config.auth.is_none());
        assert!(!config.disable_certificate_validation);
    }

    #[test]
    fn test_from_lookup_full() {
        let config = ElasticsearchConfig::from_lookup(lookup(&[
            ("ES_HOST", "http://es:9200"),
            ("ES_USERNAME", "elastic"),
            ("ES_PASSWORD", "changeme"),
            ("ES_REQUEST_TIMEOUT_MS", "5000"),
        ]));
        assert_eq!(config.host.as_deref(), Some("http://es:9200"));
        assert_eq!(config.request_timeout_ms, 5000);
        assert_eq!(
            config.auth,
            Some(ElasticsearchAuth::Basic {
                username: "elastic".to_string(),
                password: "changeme".to_string(),
            })
        );
    }

    #[test]
    fn test_from_lookup_missing_host() {
        let config = ElasticsearchConfig::from_lookup(lookup(&[("ES_HOST", "  ")]));
        assert_eq!(config.host, None);
        assert_eq!(config, ElasticsearchConfig::default());
    }

    #[test]
    fn test_partial_credentials_and_bad_timeout_ignored() {
        let config = ElasticsearchConfig::from_lookup(lookup(&[
            ("ES_HOST", "http://es:9200"),
            ("ES_USERNAME", "elastic"),
            ("ES_REQUEST_TIMEOUT_MS", "soon"),
        ]));
        assert!(config.auth.is_none());
        assert_eq!(config.request_timeout_ms, 30000);
    }

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ElasticsearchConfig =
            serde_json::from_str(r#"{"host": "http://localhost:9200"}"#).unwrap();
        assert_eq!(config, ElasticsearchConfig::with_host("http://localhost:9200"));
    }
}
