//! Resolver configuration.
//!
//! Credentials are all optional: a missing key/secret pair turns the
//! corresponding provider into a caller-visible `NotConfigured` skip rather
//! than an error at construction time, so the chain degrades gracefully on
//! partially configured installs.

use serde::Deserialize;
use std::env;

/// Descriptive User-Agent sent on every outbound request. Two of the
/// upstream services require one as policy.
const DEFAULT_USER_AGENT: &str = "shelfscan/0.1 (+https://github.com/shelfscan/shelfscan)";

/// Configuration for the resolution engine.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ResolverConfig {
    /// Discogs consumer key. Both key and secret must be present for the
    /// Discogs provider to issue requests.
    pub discogs_key: Option<String>,
    /// Discogs consumer secret.
    pub discogs_secret: Option<String>,
    /// OMDb API key.
    pub omdb_api_key: Option<String>,
    /// User-Agent header for all outbound requests.
    pub user_agent: String,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            discogs_key: None,
            discogs_secret: None,
            omdb_api_key: None,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl ResolverConfig {
    /// Builds a configuration from environment variables:
    /// `SHELFSCAN_DISCOGS_KEY`, `SHELFSCAN_DISCOGS_SECRET`,
    /// `SHELFSCAN_OMDB_API_KEY`, `SHELFSCAN_USER_AGENT`.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.discogs_key = read_env("SHELFSCAN_DISCOGS_KEY");
        config.discogs_secret = read_env("SHELFSCAN_DISCOGS_SECRET");
        config.omdb_api_key = read_env("SHELFSCAN_OMDB_API_KEY");
        if let Some(ua) = read_env("SHELFSCAN_USER_AGENT") {
            config.user_agent = ua;
        }
        config
    }

    pub fn with_discogs_credentials(
        mut self,
        key: impl Into<String>,
        secret: impl Into<String>,
    ) -> Self {
        self.discogs_key = Some(key.into());
        self.discogs_secret = Some(secret.into());
        self
    }

    pub fn with_omdb_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.omdb_api_key = Some(api_key.into());
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}

fn read_env(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = ResolverConfig::default();
        assert!(config.discogs_key.is_none());
        assert!(config.omdb_api_key.is_none());
        assert!(config.user_agent.starts_with("shelfscan/"));
    }

    #[test]
    fn test_builder_setters() {
        let config = ResolverConfig::default()
            .with_discogs_credentials("key", "secret")
            .with_omdb_api_key("omdb")
            .with_user_agent("custom/1.0");

        assert_eq!(config.discogs_key.as_deref(), Some("key"));
        assert_eq!(config.discogs_secret.as_deref(), Some("secret"));
        assert_eq!(config.omdb_api_key.as_deref(), Some("omdb"));
        assert_eq!(config.user_agent, "custom/1.0");
    }

    #[test]
    fn test_deserialize_partial() {
        let config: ResolverConfig =
            serde_json::from_str(r#"{"omdb_api_key": "abc"}"#).unwrap();
        assert_eq!(config.omdb_api_key.as_deref(), Some("abc"));
        assert!(config.discogs_key.is_none());
        assert!(config.user_agent.starts_with("shelfscan/"));
    }
}
