use std::time::Duration;

use secrecy::SecretString;
use serde::Deserialize;
use url::Url;

/// Default Anthropic API base URL
pub const DEFAULT_BASE_URL: &str = "https://api.anthropic.com/v1";

/// Default model used for both assessment operations
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20240620";

/// Default Anthropic API version header value
pub const DEFAULT_API_VERSION: &str = "2023-06-01";

/// Upstream model API configuration
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpstreamConfig {
    /// API key forwarded as `x-api-key`
    #[serde(default)]
    pub api_key: Option<SecretString>,
    /// Base URL override
    #[serde(default)]
    pub base_url: Option<Url>,
    /// Model identifier
    #[serde(default = "default_model")]
    pub model: String,
    /// Output token budget per call
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    /// Value of the `anthropic-version` header
    #[serde(default = "default_version")]
    pub version: String,
    /// Optional bound on each outbound call (e.g. "30s", "2m")
    #[serde(default)]
    pub timeout: Option<String>,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            model: default_model(),
            max_tokens: default_max_tokens(),
            version: default_version(),
            timeout: None,
        }
    }
}

impl UpstreamConfig {
    /// Parse the configured timeout, if any
    ///
    /// # Errors
    ///
    /// Returns an error if the timeout string is not a valid duration
    pub fn timeout_duration(&self) -> anyhow::Result<Option<Duration>> {
        self.timeout
            .as_deref()
            .map(|raw| {
                duration_str::parse(raw).map_err(|e| anyhow::anyhow!("invalid upstream.timeout '{raw}': {e}"))
            })
            .transpose()
    }
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_tokens() -> u32 {
    1000
}

fn default_version() -> String {
    DEFAULT_API_VERSION.to_string()
}
