//! Host-name helpers shared by the network adapters.

use std::net::IpAddr;

/// Returns `true` if `host` is a bare IPv4 or IPv6 address.
pub(super) fn is_ip_literal(host: &str) -> bool {
    host.parse::<IpAddr>().is_ok()
}

/// Returns `true` if `host` already names a URL scheme (`https://…`).
pub(super) fn has_scheme(host: &str) -> bool {
    host.contains("://")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ip_literals() {
        assert!(is_ip_literal("10.0.0.5"));
        assert!(is_ip_literal("::1"));
        assert!(!is_ip_literal("editor.example.org"));
        assert!(!is_ip_literal("10.0.0.5:8080"));
    }

    #[test]
    fn schemes() {
        assert!(has_scheme("http://localhost"));
        assert!(!has_scheme("localhost"));
    }
}
