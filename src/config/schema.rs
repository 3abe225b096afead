//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::net::SocketAddr;

/// Root configuration for the gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatewayConfig {
    /// Listener configuration (host, base port).
    pub listener: ListenerConfig,

    /// Logical function name -> origin of the locally running function.
    pub functions: BTreeMap<String, String>,

    /// Ordered path bindings. `/*` binds the wildcard function.
    pub path_mappings: Vec<PathMapping>,

    /// Functions invoked with the 1.0 (REST API) payload format.
    pub legacy_payload_functions: Vec<String>,

    /// WebSocket API settings.
    pub websocket: WebSocketConfig,

    /// Cross-origin settings for the HTTP API.
    pub cors: CorsConfig,

    /// Downstream function client settings.
    pub client: ClientConfig,

    /// Request limits.
    pub limits: LimitsConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

impl GatewayConfig {
    /// Returns true if the function expects the 1.0 payload format.
    pub fn is_legacy_payload(&self, function: &str) -> bool {
        self.legacy_payload_functions.iter().any(|f| f == function)
    }
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Interface to bind all listeners on.
    pub host: String,

    /// HTTP API port. WebSocket uses `base_port + 1`, direct invocation `base_port + 2`.
    pub base_port: u16,
}

impl ListenerConfig {
    pub fn http_address(&self) -> String {
        format!("{}:{}", self.host, self.base_port)
    }

    pub fn websocket_address(&self) -> String {
        format!("{}:{}", self.host, self.offset_port(1))
    }

    pub fn invoke_address(&self) -> String {
        format!("{}:{}", self.host, self.offset_port(2))
    }

    // Port 0 asks the OS for an ephemeral port on every listener.
    fn offset_port(&self, offset: u16) -> u16 {
        if self.base_port == 0 {
            0
        } else {
            self.base_port.saturating_add(offset)
        }
    }
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            base_port: 3000,
        }
    }
}

/// A single `path=function` binding.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct PathMapping {
    /// Path prefix, or `/*` for the wildcard.
    pub path: String,

    /// Logical function name.
    pub function: String,
}

impl PathMapping {
    pub fn new(path: impl Into<String>, function: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            function: function.into(),
        }
    }
}

/// WebSocket API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct WebSocketConfig {
    /// Function receiving connect/message/disconnect events.
    /// The WebSocket listener is disabled when unset.
    pub function: Option<String>,

    /// Stage reported in lifecycle events.
    pub stage: String,
}

impl Default for WebSocketConfig {
    fn default() -> Self {
        Self {
            function: None,
            stage: "dev".to_string(),
        }
    }
}

/// CORS configuration.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct CorsConfig {
    /// Origins allowed to make credentialed cross-origin requests.
    pub allow_origins: Vec<String>,
}

/// Downstream function client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Connection establishment timeout in seconds.
    pub connect_timeout_secs: u64,

    /// Total invocation timeout in seconds. Unbounded when unset.
    pub request_timeout_secs: Option<u64>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            connect_timeout_secs: 5,
            request_timeout_secs: None,
        }
    }
}

/// Request limits.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LimitsConfig {
    /// Maximum inbound body size in bytes.
    pub max_body_bytes: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 6 * 1024 * 1024, // 6MB synchronous payload ceiling
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl ObservabilityConfig {
    pub fn metrics_socket_addr(&self) -> Option<SocketAddr> {
        self.metrics_address.parse().ok()
    }
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
