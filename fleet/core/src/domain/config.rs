// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// Fleet Server Configuration
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) covering:
// - HTTP listener
// - Document store connection (PostgreSQL, or in-memory when absent)
// - Action cache sizing
// - Logging and metrics

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_API_VERSION: &str = "fleet/v1";
pub const CONFIG_KIND: &str = "FleetServerConfig";
pub const CONFIG_PATH_ENV: &str = "FLEET_CONFIG_PATH";
pub const DEFAULT_CONFIG_FILE: &str = "fleet-config.yaml";

/// Top-level configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetServerConfig {
    /// API version (must be "fleet/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "FleetServerConfig")
    pub kind: String,

    pub metadata: ConfigMetadata,

    #[serde(default)]
    pub spec: FleetServerSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigMetadata {
    /// Server instance name
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FleetServerSpec {
    #[serde(default)]
    pub network: NetworkConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub action_cache: ActionCacheConfig,

    #[serde(default)]
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NetworkConfig {
    /// Network bind address (e.g. "0.0.0.0" or "127.0.0.1")
    #[serde(default = "default_bind_address")]
    pub bind_address: String,

    /// HTTP API port
    #[serde(default = "default_api_port")]
    pub port: u16,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection string. Absent selects the in-memory store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionCacheConfig {
    /// Maximum number of cached actions
    #[serde(default = "default_cache_capacity")]
    pub capacity: usize,

    /// Entry lifetime in seconds
    #[serde(default = "default_cache_ttl")]
    pub ttl_seconds: u64,
}

impl ActionCacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ObservabilityConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub metrics: MetricsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (e.g., "info", "debug", "trace")
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Output format ("json" or "text")
    #[serde(default = "default_log_format")]
    pub format: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricsConfig {
    /// Enable the Prometheus exporter
    #[serde(default)]
    pub enabled: bool,

    /// Metrics listener port
    #[serde(default = "default_metrics_port")]
    pub port: u16,
}

// Default value functions
fn default_bind_address() -> String {
    "0.0.0.0".to_string()
}

fn default_api_port() -> u16 {
    8220
}

fn default_max_connections() -> u32 {
    5
}

fn default_cache_capacity() -> usize {
    10_000
}

fn default_cache_ttl() -> u64 {
    300
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "text".to_string()
}

fn default_metrics_port() -> u16 {
    9090
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            bind_address: default_bind_address(),
            port: default_api_port(),
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: default_max_connections(),
        }
    }
}

impl Default for ActionCacheConfig {
    fn default() -> Self {
        Self {
            capacity: default_cache_capacity(),
            ttl_seconds: default_cache_ttl(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            port: default_metrics_port(),
        }
    }
}

impl Default for FleetServerConfig {
    fn default() -> Self {
        Self {
            api_version: CONFIG_API_VERSION.to_string(),
            kind: CONFIG_KIND.to_string(),
            metadata: ConfigMetadata {
                name: "fleet-server".to_string(),
                labels: None,
            },
            spec: FleetServerSpec::default(),
        }
    }
}

impl FleetServerConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: Self = serde_yaml::from_str(yaml).context("Failed to parse configuration YAML")?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read configuration file {}", path.display()))?;
        Self::from_yaml_str(&raw)
    }

    /// Load from an explicit path, then `FLEET_CONFIG_PATH`, then
    /// `./fleet-config.yaml`, falling back to defaults.
    pub fn discover(explicit: Option<&Path>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load(path);
        }

        if let Ok(path) = std::env::var(CONFIG_PATH_ENV) {
            return Self::load(&PathBuf::from(path));
        }

        let local = PathBuf::from(DEFAULT_CONFIG_FILE);
        if local.exists() {
            return Self::load(&local);
        }

        Ok(Self::default())
    }

    pub fn validate(&self) -> Result<()> {
        if self.api_version != CONFIG_API_VERSION {
            anyhow::bail!(
                "Invalid apiVersion '{}', expected '{}'",
                self.api_version,
                CONFIG_API_VERSION
            );
        }

        if self.kind != CONFIG_KIND {
            anyhow::bail!("Invalid kind '{}', expected '{}'", self.kind, CONFIG_KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.network.port == 0 {
            anyhow::bail!("spec.network.port cannot be 0");
        }

        if self.spec.action_cache.capacity == 0 {
            anyhow::bail!("spec.action_cache.capacity must be greater than 0");
        }

        if self.spec.database.max_connections == 0 {
            anyhow::bail!("spec.database.max_connections must be greater than 0");
        }

        match self.spec.observability.logging.format.as_str() {
            "json" | "text" => {}
            other => anyhow::bail!("Unsupported log format '{}'", other),
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = FleetServerConfig::default();
        assert_eq!(config.api_version, CONFIG_API_VERSION);
        assert_eq!(config.kind, CONFIG_KIND);
        assert!(config.spec.database.url.is_none());
        assert_eq!(config.spec.network.port, 8220);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_with_partial_spec() {
        let yaml = r#"
apiVersion: fleet/v1
kind: FleetServerConfig
metadata:
  name: edge-fleet
spec:
  database:
    url: postgres://fleet@localhost/fleet
  action_cache:
    ttl_seconds: 60
  observability:
    logging:
      format: json
"#;
        let config = FleetServerConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.metadata.name, "edge-fleet");
        assert_eq!(config.spec.database.url.as_deref(), Some("postgres://fleet@localhost/fleet"));
        assert_eq!(config.spec.database.max_connections, 5);
        assert_eq!(config.spec.action_cache.ttl(), Duration::from_secs(60));
        assert_eq!(config.spec.action_cache.capacity, 10_000);
        assert_eq!(config.spec.observability.logging.format, "json");
        assert_eq!(config.spec.observability.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut config = FleetServerConfig::default();

        config.api_version = "wrong/v1".to_string();
        assert!(config.validate().is_err());
        config.api_version = CONFIG_API_VERSION.to_string();

        config.kind = "NodeConfig".to_string();
        assert!(config.validate().is_err());
        config.kind = CONFIG_KIND.to_string();

        config.metadata.name = "".to_string();
        assert!(config.validate().is_err());
        config.metadata.name = "fleet".to_string();

        config.spec.action_cache.capacity = 0;
        assert!(config.validate().is_err());
        config.spec.action_cache.capacity = 1;

        config.spec.observability.logging.format = "xml".to_string();
        assert!(config.validate().is_err());
        config.spec.observability.logging.format = "text".to_string();

        assert!(config.validate().is_ok());
    }
}
