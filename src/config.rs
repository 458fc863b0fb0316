//! Engine configuration parameters
//!
//! All tunable parameters for the PhoneIoT engine.
//! Values can be overridden from a JSON file handed to the daemon.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Core engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // --- Network ---
    /// Local UDP port, shared by both directions
    pub udp_port: u16,
    /// Server port used when the port lookup fails
    pub default_server_port: u16,
    /// HTTP path queried on the server to learn its UDP port
    pub port_lookup_path: String,
    /// Timeout for the HTTP port lookup (milliseconds)
    pub lookup_timeout_ms: u64,
    /// Server host to connect to at start-up
    pub server: Option<String>,
    /// Servers offered to the user for selection
    pub known_servers: Vec<String>,

    // --- Timing ---
    /// Heartbeat interval while an endpoint is set (milliseconds)
    pub heartbeat_interval_ms: u64,
    /// Receive timeout that keeps the receive loop responsive (milliseconds)
    pub recv_timeout_ms: u64,
    /// Sleep after an unexpected socket error (milliseconds)
    pub error_backoff_ms: u64,
    /// Delay before reconnecting after a server-side reset (milliseconds)
    pub reconnect_delay_ms: u64,

    // --- Session ---
    /// Validity of a generated session password (milliseconds)
    pub password_validity_ms: u64,
    /// Fixed password installed at start-up (development servers)
    pub initial_password: Option<u64>,

    // --- Limits ---
    /// Maximum number of registered controls
    pub max_controls: usize,
    /// Worst-case raw image size allowed in one reply (bytes)
    pub image_budget_bytes: usize,

    // --- Persistence ---
    /// Settings file; in-memory settings when absent
    pub storage_path: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            // Network
            udp_port: 8888,
            default_server_port: 1976,
            port_lookup_path: "/services/routes/phone-iot/port".into(),
            lookup_timeout_ms: 5_000,
            server: None,
            known_servers: vec![
                "editor.netsblox.org".into(),
                "dev.netsblox.org".into(),
            ],

            // Timing
            heartbeat_interval_ms: 30_000,
            recv_timeout_ms: 1_000,
            error_backoff_ms: 100,
            reconnect_delay_ms: 3_000,

            // Session
            password_validity_ms: 24 * 60 * 60 * 1000, // 1 day
            initial_password: None,

            // Limits
            max_controls: 128,
            image_budget_bytes: 8 * 64 * 1024, // 512 KiB

            storage_path: None,
        }
    }
}

impl EngineConfig {
    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(text).map_err(|_| Error::Config("malformed JSON"))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values that would stall or spin a worker.
    pub fn validate(&self) -> Result<()> {
        if self.recv_timeout_ms == 0 {
            return Err(Error::Config("recv_timeout_ms must be non-zero"));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(Error::Config("heartbeat_interval_ms must be non-zero"));
        }
        if self.max_controls == 0 {
            return Err(Error::Config("max_controls must be non-zero"));
        }
        if self.image_budget_bytes < 4 {
            return Err(Error::Config("image_budget_bytes too small for one pixel"));
        }
        if self.password_validity_ms == 0 {
            return Err(Error::Config("password_validity_ms must be non-zero"));
        }
        Ok(())
    }

    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    pub fn recv_timeout(&self) -> Duration {
        Duration::from_millis(self.recv_timeout_ms)
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_millis(self.error_backoff_ms)
    }

    pub fn reconnect_delay(&self) -> Duration {
        Duration::from_millis(self.reconnect_delay_ms)
    }

    pub fn lookup_timeout(&self) -> Duration {
        Duration::from_millis(self.lookup_timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_sane() {
        let c = EngineConfig::default();
        assert!(c.validate().is_ok());
        assert_eq!(c.udp_port, 8888);
        assert_eq!(c.default_server_port, 1976);
        assert_eq!(c.max_controls, 128);
        assert_eq!(c.image_budget_bytes, 524_288);
    }

    #[test]
    fn serde_roundtrip() {
        let c = EngineConfig::default();
        let json = serde_json::to_string(&c).unwrap();
        let c2: EngineConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(c, c2);
    }

    #[test]
    fn partial_json_takes_defaults() {
        let c = EngineConfig::from_json(r#"{ "udp_port": 9999, "server": "10.0.0.2" }"#).unwrap();
        assert_eq!(c.udp_port, 9999);
        assert_eq!(c.server.as_deref(), Some("10.0.0.2"));
        assert_eq!(c.heartbeat_interval_ms, 30_000);
    }

    #[test]
    fn zero_timeout_rejected() {
        let err = EngineConfig::from_json(r#"{ "recv_timeout_ms": 0 }"#).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn garbage_json_rejected() {
        assert!(EngineConfig::from_json("{ not json").is_err());
    }

    #[test]
    fn heartbeat_outlasts_receive_timeout() {
        let c = EngineConfig::default();
        assert!(c.heartbeat_interval() > c.recv_timeout());
        assert!(c.reconnect_delay() > c.error_backoff());
    }

    #[test]
    fn postcard_roundtrip() {
        let c = EngineConfig::default();
        let bytes = postcard::to_allocvec(&c).unwrap();
        let c2: EngineConfig = postcard::from_bytes(&bytes).unwrap();
        assert_eq!(c, c2);
    }
}
