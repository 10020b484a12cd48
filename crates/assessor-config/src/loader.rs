use std::path::Path;

use secrecy::ExposeSecret;

use crate::Config;

impl Config {
    /// Load configuration from a TOML file
    ///
    /// Reads the file, expands `{{ env.VAR }}` placeholders, then
    /// deserializes and validates the result.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, environment variable
    /// expansion fails, TOML parsing fails, or validation fails
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let raw = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config file {}: {e}", path.display()))?;

        Self::parse(&raw)
    }

    /// Parse and validate configuration from raw TOML text
    ///
    /// # Errors
    ///
    /// Returns an error if expansion, parsing or validation fails
    pub fn parse(raw: &str) -> anyhow::Result<Self> {
        let expanded =
            crate::env::expand_env(raw).map_err(|e| anyhow::anyhow!("config variable expansion failed: {e}"))?;

        let config: Self = toml::from_str(&expanded).map_err(|e| anyhow::anyhow!("failed to parse config: {e}"))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate that the configuration is internally consistent
    ///
    /// # Errors
    ///
    /// Returns an error if the upstream credential is missing or any
    /// section holds an unusable value
    pub fn validate(&self) -> anyhow::Result<()> {
        self.validate_upstream_config()?;
        self.validate_server_config()?;
        Ok(())
    }

    /// Validate upstream model API configuration
    fn validate_upstream_config(&self) -> anyhow::Result<()> {
        let upstream = &self.upstream;

        match upstream.api_key {
            Some(ref key) if !key.expose_secret().trim().is_empty() => {}
            _ => anyhow::bail!("upstream.api_key must be set"),
        }

        if upstream.model.trim().is_empty() {
            anyhow::bail!("upstream.model must not be empty");
        }

        if upstream.max_tokens == 0 {
            anyhow::bail!("upstream.max_tokens must be greater than 0");
        }

        upstream.timeout_duration()?;

        Ok(())
    }

    /// Validate route paths
    fn validate_server_config(&self) -> anyhow::Result<()> {
        let endpoint = &self.server.endpoint_path;
        if !endpoint.starts_with('/') {
            anyhow::bail!("server.endpoint_path must start with '/': {endpoint}");
        }

        let health = &self.server.health;
        if health.enabled {
            if !health.path.starts_with('/') {
                anyhow::bail!("server.health.path must start with '/': {}", health.path);
            }
            if health.path == *endpoint {
                anyhow::bail!("server.health.path and server.endpoint_path must differ");
            }
        }

        Ok(())
    }
}
