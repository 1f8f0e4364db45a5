//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the server.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};

/// Root configuration for the HTTP engine.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listener configuration (host, port).
    pub listener: ListenerConfig,

    /// Value of the `Server` response header.
    pub server_name: String,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Keep-alive negotiation settings.
    pub keep_alive: KeepAliveConfig,

    /// Request size limits.
    pub limits: LimitsConfig,

    /// Static directories mounted at startup.
    pub statics: Vec<StaticConfig>,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listener: ListenerConfig::default(),
            server_name: "http-engine".to_string(),
            timeouts: TimeoutConfig::default(),
            keep_alive: KeepAliveConfig::default(),
            limits: LimitsConfig::default(),
            statics: Vec::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Host or IP to bind.
    pub host: String,

    /// TCP port to bind. Port 0 asks the OS for an ephemeral port.
    pub port: u16,
}

impl ListenerConfig {
    /// `host:port` form suitable for binding.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

/// Timeout configuration for connection handling.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Read deadline for the first request on a connection, in seconds.
    pub read_secs: u64,

    /// Upper bound on draining connections during shutdown, in seconds.
    pub shutdown_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_secs: 30,
            shutdown_secs: 10,
        }
    }
}

/// Keep-alive configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct KeepAliveConfig {
    /// Honour `Connection: keep-alive` at all.
    pub enabled: bool,

    /// Ceiling of the idle timeout heuristic, in seconds.
    pub max_timeout_secs: u64,

    /// Maximum requests served on one connection.
    pub max_requests: u32,
}

impl Default for KeepAliveConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            max_timeout_secs: 15,
            max_requests: 100,
        }
    }
}

/// Request size limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Largest accepted `Content-Length`, in bytes.
    pub max_body_bytes: usize,

    /// Largest request line plus header block, in bytes.
    pub max_header_bytes: usize,

    /// Most header fields accepted on one request.
    pub max_headers: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 8 * 1024 * 1024,
            max_header_bytes: 8 * 1024,
            max_headers: 128,
        }
    }
}

/// A route prefix served from a directory.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
pub struct StaticConfig {
    /// Route prefix (e.g., "/assets").
    pub prefix: String,

    /// Absolute directory the prefix maps to.
    pub directory: String,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Emit logs as JSON lines instead of human-readable text.
    pub json_logs: bool,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: false,
            metrics_address: "127.0.0.1:9090".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_toml_keeps_defaults() {
        let config: ServerConfig = toml::from_str(
            r#"
            server_name = "edge"

            [listener]
            port = 9000

            [[statics]]
            prefix = "/assets"
            directory = "/srv/assets"
            "#,
        )
        .unwrap();

        assert_eq!(config.server_name, "edge");
        assert_eq!(config.listener.port, 9000);
        assert_eq!(config.listener.host, "127.0.0.1");
        assert_eq!(config.keep_alive.max_requests, 100);
        assert_eq!(config.keep_alive.max_timeout_secs, 15);
        assert_eq!(config.statics.len(), 1);
        assert_eq!(config.listener.bind_address(), "127.0.0.1:9000");
    }
}
