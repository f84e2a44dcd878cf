//! Configuration management for Tollgate.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::net::SocketAddr;

/// Main configuration for the Tollgate service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TollgateConfig {
    /// Server configuration
    #[serde(default)]
    pub server: ServerConfig,

    /// Admission control configuration
    #[serde(default)]
    pub admission: AdmissionConfig,
}

impl Default for TollgateConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig::default(),
            admission: AdmissionConfig::default(),
        }
    }
}

/// Server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Management API address
    #[serde(default = "default_http_addr")]
    pub http_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            http_addr: default_http_addr(),
        }
    }
}

fn default_http_addr() -> SocketAddr {
    "127.0.0.1:8317".parse().unwrap()
}

/// Admission control configuration.
///
/// Per-key limits are fixed by configuration, which bounds the registry's
/// key space; a key with no entry falls back to the default limit, and a
/// non-positive limit disables admission control for that key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdmissionConfig {
    /// Limit applied to keys without an explicit entry, in requests per
    /// minute; zero or negative means unlimited
    #[serde(default)]
    pub default_limit_rpm: i64,

    /// Per-key limit overrides, in requests per minute
    #[serde(default)]
    pub key_limits: HashMap<String, i64>,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            default_limit_rpm: 0,
            key_limits: HashMap::new(),
        }
    }
}

impl AdmissionConfig {
    /// Effective limit for a key.
    pub fn limit_for(&self, key: &str) -> i64 {
        self.key_limits
            .get(key)
            .copied()
            .unwrap_or(self.default_limit_rpm)
    }
}

impl TollgateConfig {
    /// Load configuration from a file path.
    pub fn from_file(path: &str) -> crate::error::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: TollgateConfig = serde_yaml::from_str(&contents)
            .map_err(|e| crate::error::TollgateError::Config(e.to_string()))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TollgateConfig::default();
        assert_eq!(config.server.http_addr.port(), 8317);
        assert_eq!(config.admission.default_limit_rpm, 0);
        assert!(config.admission.key_limits.is_empty());
    }

    #[test]
    fn test_parse_yaml() {
        let yaml = r#"
server:
  http_addr: "0.0.0.0:9000"
admission:
  default_limit_rpm: 60
  key_limits:
    premium-key: 600
    restricted-key: 6
"#;
        let config: TollgateConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.http_addr.port(), 9000);
        assert_eq!(config.admission.limit_for("premium-key"), 600);
        assert_eq!(config.admission.limit_for("restricted-key"), 6);
        assert_eq!(config.admission.limit_for("unknown-key"), 60);
    }

    #[test]
    fn test_partial_yaml_uses_defaults() {
        let yaml = r#"
admission:
  default_limit_rpm: 30
"#;
        let config: TollgateConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.server.http_addr.port(), 8317);
        assert_eq!(config.admission.limit_for("anything"), 30);
    }
}
