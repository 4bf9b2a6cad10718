use std::net::IpAddr;

use serde::{Deserialize, Serialize};

/// HTTP server configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Request timeout in seconds for outbound HTTP calls
    /// (email transport, billing provider).
    #[serde(default = "default_outbound_timeout")]
    pub outbound_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            outbound_timeout_secs: default_outbound_timeout(),
        }
    }
}

fn default_host() -> IpAddr {
    "0.0.0.0".parse().unwrap()
}

fn default_port() -> u16 {
    8080
}

fn default_outbound_timeout() -> u64 {
    30
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ServerConfig::default();
        assert_eq!(config.host.to_string(), "0.0.0.0");
        assert_eq!(config.port, 8080);
        assert_eq!(config.outbound_timeout_secs, 30);
    }

    #[test]
    fn test_parse_overrides() {
        let config: ServerConfig = toml::from_str(
            r#"
            host = "127.0.0.1"
            port = 9090
            "#,
        )
        .unwrap();
        assert!(config.host.is_loopback());
        assert_eq!(config.port, 9090);
    }
}
