//! Configuration loading and management.
//!
//! Loads configuration from embedded config.toml with environment variable overrides.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::env;
use std::time::Duration;
use url::Url;

/// Embedded configuration file content.
const CONFIG_TOML: &str = include_str!("../config.toml");

/// Environment variable holding the OAuth app registration id.
pub const ENV_CLIENT_ID: &str = "AZURE_CLIENT_ID";
/// Environment variable holding the home tenant used for the first sign-in.
pub const ENV_TENANT_ID: &str = "AZURE_TENANT_ID";
/// Environment variable holding the OAuth redirect target.
pub const ENV_REDIRECT_URL: &str = "AZURE_REDIRECT_URL";

/// Root configuration structure.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub app: AppConfig,
    pub oauth: OAuthConfig,
    pub api: ApiConfig,
    pub scopes: ScopesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub name: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct OAuthConfig {
    pub client_id: String,
    pub tenant: String,
    pub redirect_uri: String,
    pub authority_host: String,
    pub login_timeout_seconds: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    pub management_base_url: String,
    pub management_api_version: String,
    pub graph_base_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ScopesConfig {
    pub management: Vec<String>,
    pub graph: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    pub level: String,
}

impl Config {
    /// Load configuration from embedded config.toml with environment variable overrides.
    pub fn load() -> Result<Self> {
        Self::from_sources(CONFIG_TOML, |key| env::var(key).ok())
    }

    /// Parse `toml_src`, then apply overrides looked up through `lookup`.
    fn from_sources(toml_src: &str, lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let mut config: Config =
            toml::from_str(toml_src).context("Failed to parse embedded config.toml")?;

        if let Some(client_id) = lookup(ENV_CLIENT_ID) {
            config.oauth.client_id = client_id;
        }

        if let Some(tenant) = lookup(ENV_TENANT_ID) {
            config.oauth.tenant = tenant;
        }

        if let Some(redirect_uri) = lookup(ENV_REDIRECT_URL) {
            config.oauth.redirect_uri = redirect_uri;
        }

        if let Some(log_level) = lookup("RUST_LOG") {
            config.logging.level = log_level;
        }

        config.validate()?;

        Ok(config)
    }

    /// Validate that required configuration is present.
    fn validate(&self) -> Result<()> {
        if self.oauth.client_id.is_empty() || self.oauth.client_id == "YOUR_AZURE_AD_CLIENT_ID" {
            anyhow::bail!(
                "Azure AD client_id not configured. Set {} environment variable \
                 or update config.toml",
                ENV_CLIENT_ID
            );
        }

        if self.oauth.tenant.is_empty() || self.oauth.tenant == "YOUR_TENANT_ID" {
            anyhow::bail!(
                "Azure AD tenant not configured. Set {} environment variable \
                 or update config.toml",
                ENV_TENANT_ID
            );
        }

        let redirect = self.redirect_url()?;
        if redirect.scheme() != "http" {
            anyhow::bail!(
                "{} must use the http scheme, got '{}'",
                ENV_REDIRECT_URL,
                redirect.scheme()
            );
        }
        match redirect.host_str() {
            Some("localhost") | Some("127.0.0.1") | Some("[::1]") => {}
            other => anyhow::bail!(
                "{} must point at a loopback host, got '{}'",
                ENV_REDIRECT_URL,
                other.unwrap_or_default()
            ),
        }

        if self.scopes.management.is_empty() || self.scopes.graph.is_empty() {
            anyhow::bail!("Both [scopes] management and graph must list at least one scope");
        }

        Ok(())
    }

    /// The parsed redirect URL.
    pub fn redirect_url(&self) -> Result<Url> {
        Url::parse(&self.oauth.redirect_uri)
            .with_context(|| format!("Invalid redirect URL '{}'", self.oauth.redirect_uri))
    }

    /// How long a single interactive sign-in may wait for the browser redirect.
    ///
    /// `0` means no limit: the sign-in waits until the user finishes it.
    pub fn login_timeout(&self) -> Option<Duration> {
        match self.oauth.login_timeout_seconds {
            0 => None,
            secs => Some(Duration::from_secs(secs)),
        }
    }

    /// Get the authorization URL for Azure AD in `tenant`.
    pub fn auth_url(&self, tenant: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/authorize",
            self.oauth.authority_host.trim_end_matches('/'),
            tenant
        )
    }

    /// Get the token URL for Azure AD in `tenant`.
    pub fn token_url(&self, tenant: &str) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.oauth.authority_host.trim_end_matches('/'),
            tenant
        )
    }
}
