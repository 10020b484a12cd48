//! Programmatic configuration builder for integration tests

use std::net::SocketAddr;

use assessor_config::{Config, CorsConfig, HealthConfig, ServerConfig, UpstreamConfig};
use secrecy::SecretString;

/// Builder for constructing test configurations
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    /// Create a new builder pointed at `base_url` for the upstream API
    pub fn new(base_url: &str) -> Self {
        Self {
            config: Config {
                server: ServerConfig {
                    listen_address: Some(SocketAddr::from(([127, 0, 0, 1], 0))),
                    health: HealthConfig::default(),
                    ..ServerConfig::default()
                },
                upstream: UpstreamConfig {
                    api_key: Some(SecretString::from("test-key")),
                    base_url: Some(base_url.parse().expect("valid URL")),
                    ..UpstreamConfig::default()
                },
                telemetry: None,
            },
        }
    }

    /// Set CORS configuration
    pub fn with_cors(mut self, config: CorsConfig) -> Self {
        self.config.server.cors = config;
        self
    }

    /// Bound each upstream call
    pub fn with_timeout(mut self, timeout: &str) -> Self {
        self.config.upstream.timeout = Some(timeout.to_owned());
        self
    }

    /// Disable health endpoint
    pub fn without_health(mut self) -> Self {
        self.config.server.health.enabled = false;
        self
    }

    /// Build the final config
    pub fn build(self) -> Config {
        self.config
    }
}
