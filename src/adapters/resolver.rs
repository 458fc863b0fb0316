//! Server port lookup.
//!
//! A server publishes the UDP port of its phone service over HTTP.  The
//! lookup URL depends on how the user typed the host:
//!
//! | Host                     | Lookup URL                            |
//! |--------------------------|---------------------------------------|
//! | `192.168.1.5`            | `http://192.168.1.5:8080{path}`       |
//! | `http://localhost:8080`  | `http://localhost:8080{path}`         |
//! | `editor.example.org`     | `https://editor.example.org{path}`    |
//!
//! Any failure (network, status, body) falls back to the default port.

use std::time::Duration;

use log::{debug, warn};

use super::utils::{has_scheme, is_ip_literal};
use crate::app::ports::PortResolver;
use crate::config::EngineConfig;

/// Port of the web server on a LAN address.
const LAN_HTTP_PORT: u16 = 8080;

/// Build the lookup URL for `host`.
pub fn lookup_url(host: &str, path: &str) -> String {
    if is_ip_literal(host) {
        format!("http://{host}:{LAN_HTTP_PORT}{path}")
    } else if has_scheme(host) {
        format!("{}{path}", host.trim_end_matches('/'))
    } else {
        format!("https://{host}{path}")
    }
}

/// Queries the server over HTTP with a timeout.
pub struct HttpPortResolver {
    client: reqwest::blocking::Client,
    path: String,
    default_port: u16,
}

impl HttpPortResolver {
    pub fn new(path: impl Into<String>, timeout: Duration, default_port: u16) -> reqwest::Result<Self> {
        let client = reqwest::blocking::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            path: path.into(),
            default_port,
        })
    }

    pub fn from_config(config: &EngineConfig) -> reqwest::Result<Self> {
        Self::new(
            config.port_lookup_path.clone(),
            config.lookup_timeout(),
            config.default_server_port,
        )
    }

    fn lookup(&self, url: &str) -> Result<u16, String> {
        let body = self
            .client
            .get(url)
            .send()
            .and_then(reqwest::blocking::Response::error_for_status)
            .and_then(reqwest::blocking::Response::text)
            .map_err(|e| e.to_string())?;
        body.trim()
            .parse()
            .map_err(|_| format!("unexpected body {:?}", body.trim()))
    }
}

impl PortResolver for HttpPortResolver {
    fn resolve_port(&self, host: &str) -> u16 {
        let url = lookup_url(host, &self.path);
        match self.lookup(&url) {
            Ok(port) => {
                debug!("LINK: {host} listens on port {port}");
                port
            }
            Err(e) => {
                warn!(
                    "LINK: port lookup at {url} failed ({e}), using {}",
                    self.default_port
                );
                self.default_port
            }
        }
    }
}

/// Always answers the same port.  For tests and servers without the lookup
/// route.
#[derive(Debug, Clone, Copy)]
pub struct StaticPortResolver(pub u16);

impl PortResolver for StaticPortResolver {
    fn resolve_port(&self, _host: &str) -> u16 {
        self.0
    }
}
