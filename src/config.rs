//! Configuration loading and validation

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub firewall: FirewallConfig,
    #[serde(default)]
    pub explorer: ExplorerConfig,
    #[serde(default)]
    pub custody: CustodyConfig,
}

/// Policy-evaluation endpoint and its bearer credential
#[derive(Debug, Clone, Deserialize)]
pub struct FirewallConfig {
    #[serde(default = "default_firewall_endpoint")]
    pub endpoint: String,
    #[serde(default)]
    pub bearer_token: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExplorerConfig {
    #[serde(default = "default_explorer_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// Network id put on descriptors built from explorer rows
    #[serde(default = "default_network")]
    pub network: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CustodyConfig {
    #[serde(default = "default_custody_url")]
    pub base_url: String,
    #[serde(default)]
    pub api_key: String,
    /// PEM-encoded RSA key used to sign request JWTs
    #[serde(default)]
    pub secret_key_path: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

fn default_firewall_endpoint() -> String {
    "https://api.web3firewall.io/api/v1/policy/event".to_string()
}

fn default_explorer_url() -> String {
    "https://api.etherscan.io/api".to_string()
}

fn default_custody_url() -> String {
    "https://api.fireblocks.io".to_string()
}

fn default_network() -> String {
    "eth".to_string()
}

fn default_timeout_ms() -> u64 {
    30_000
}

impl Default for FirewallConfig {
    fn default() -> Self {
        Self {
            endpoint: default_firewall_endpoint(),
            bearer_token: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for ExplorerConfig {
    fn default() -> Self {
        Self {
            base_url: default_explorer_url(),
            api_key: String::new(),
            network: default_network(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Default for CustodyConfig {
    fn default() -> Self {
        Self {
            base_url: default_custody_url(),
            api_key: String::new(),
            secret_key_path: String::new(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

impl Config {
    /// Load configuration from file and environment variables
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        let settings = config::Config::builder()
            // Start with defaults
            .set_default("firewall.endpoint", default_firewall_endpoint())?
            .set_default("firewall.timeout_ms", default_timeout_ms() as i64)?
            .set_default("explorer.base_url", default_explorer_url())?
            .set_default("explorer.network", default_network())?
            .set_default("custody.base_url", default_custody_url())?
            // Load from file if exists
            .add_source(config::File::from(path).required(false))
            // Override with environment variables (prefix RISKMON_)
            .add_source(
                config::Environment::with_prefix("RISKMON")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to build configuration")?;

        let config: Config = settings
            .try_deserialize()
            .context("Failed to deserialize configuration")?;

        // Validate configuration
        config.validate()?;

        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// Credentials are not required here; each command checks the ones it uses.
    fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("firewall.endpoint", &self.firewall.endpoint),
            ("explorer.base_url", &self.explorer.base_url),
            ("custody.base_url", &self.custody.base_url),
        ] {
            let parsed = url::Url::parse(value)
                .with_context(|| format!("Invalid {} URL: {}", name, value))?;
            if !matches!(parsed.scheme(), "http" | "https") {
                anyhow::bail!("{} must be an http(s) URL, got {}", name, value);
            }
        }

        for (name, value) in [
            ("firewall.timeout_ms", self.firewall.timeout_ms),
            ("explorer.timeout_ms", self.explorer.timeout_ms),
            ("custody.timeout_ms", self.custody.timeout_ms),
        ] {
            if value == 0 {
                anyhow::bail!("{} must be positive", name);
            }
        }

        if self.explorer.network.trim().is_empty() {
            anyhow::bail!("explorer.network must not be empty");
        }

        if self.firewall.endpoint.starts_with("http://") {
            tracing::warn!(
                "firewall.endpoint is plain HTTP - the bearer token will be sent unencrypted"
            );
        }

        Ok(())
    }

    /// Get masked configuration for display (hide secrets)
    pub fn masked_display(&self) -> String {
        format!(
            r#"Configuration:
  Firewall:
    endpoint: {}
    bearer_token: {}
    timeout: {}ms
  Explorer:
    base_url: {}
    api_key: {}
    network: {}
    timeout: {}ms
  Custody:
    base_url: {}
    api_key: {}
    secret_key_path: {}
    timeout: {}ms
"#,
            mask_url(&self.firewall.endpoint),
            mask_secret(&self.firewall.bearer_token),
            self.firewall.timeout_ms,
            mask_url(&self.explorer.base_url),
            mask_secret(&self.explorer.api_key),
            self.explorer.network,
            self.explorer.timeout_ms,
            mask_url(&self.custody.base_url),
            mask_secret(&self.custody.api_key),
            if self.custody.secret_key_path.is_empty() {
                "(not set)"
            } else {
                self.custody.secret_key_path.as_str()
            },
            self.custody.timeout_ms,
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            firewall: FirewallConfig::default(),
            explorer: ExplorerConfig::default(),
            custody: CustodyConfig::default(),
        }
    }
}

/// Mask URL for display (hide API keys in query params)
fn mask_url(url: &str) -> String {
    if let Some(idx) = url.find('?') {
        format!("{}?***", &url[..idx])
    } else {
        url.to_string()
    }
}

fn mask_secret(secret: &str) -> &'static str {
    if secret.is_empty() {
        "(not set)"
    } else {
        "***"
    }
}
