use crate::error::ExporterError;
use anyhow::{Context, Result};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub netscaler: NetscalerConfig,
    #[serde(default)]
    pub scrape: ScrapeConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_addr")]
    pub addr: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Credentials passed through to every appliance this process scrapes.
#[derive(Debug, Deserialize, Clone)]
pub struct NetscalerConfig {
    #[serde(default)]
    pub username: String,
    #[serde(default = "default_password")]
    pub password: SecretString,
    /// Process-wide default for certificate validation; a probe request can
    /// still opt out with `ignore-cert=yes`.
    #[serde(default)]
    pub ignore_cert: bool,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ScrapeConfig {
    #[serde(default = "default_request_timeout")]
    pub request_timeout_seconds: u64,
    #[serde(default = "default_scrape_timeout")]
    pub scrape_timeout_seconds: u64,
    #[serde(default = "default_max_concurrent_fetches")]
    pub max_concurrent_fetches: usize,
    #[serde(default = "default_success_statuses")]
    pub login_success_statuses: Vec<u16>,
    #[serde(default = "default_success_statuses")]
    pub logout_success_statuses: Vec<u16>,
    #[serde(default)]
    pub tolerated_error_codes: Vec<i64>,
}

fn default_addr() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    9279
}

fn default_password() -> SecretString {
    SecretString::from(String::new())
}

fn default_request_timeout() -> u64 {
    10
}

fn default_scrape_timeout() -> u64 {
    30
}

fn default_max_concurrent_fetches() -> usize {
    4
}

// The appliance documents 200 for login/logout but answers 201 in practice.
fn default_success_statuses() -> Vec<u16> {
    vec![200, 201]
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            addr: default_addr(),
            port: default_port(),
        }
    }
}

impl Default for NetscalerConfig {
    fn default() -> Self {
        Self {
            username: String::new(),
            password: default_password(),
            ignore_cert: false,
        }
    }
}

impl Default for ScrapeConfig {
    fn default() -> Self {
        Self {
            request_timeout_seconds: default_request_timeout(),
            scrape_timeout_seconds: default_scrape_timeout(),
            max_concurrent_fetches: default_max_concurrent_fetches(),
            login_success_statuses: default_success_statuses(),
            logout_success_statuses: default_success_statuses(),
            tolerated_error_codes: Vec::new(),
        }
    }
}

impl ScrapeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn scrape_timeout(&self) -> Duration {
        Duration::from_secs(self.scrape_timeout_seconds)
    }
}

impl Config {
    /// Loads `path` (optional) and layers `NETSCALER_EXPORTER__<SECTION>__<KEY>`
    /// environment variables over it.
    pub fn load(path: &str) -> Result<Self> {
        // Load environment variables from .env if present
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("NETSCALER_EXPORTER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }

    /// Checks the values the engine cannot run without.
    pub fn validate(&self) -> std::result::Result<(), ExporterError> {
        if self.netscaler.username.trim().is_empty() {
            return Err(ExporterError::Config(
                "netscaler.username must be set".to_string(),
            ));
        }
        if self.netscaler.password.expose_secret().is_empty() {
            return Err(ExporterError::Config(
                "netscaler.password must be set".to_string(),
            ));
        }
        if self.scrape.request_timeout_seconds == 0 || self.scrape.scrape_timeout_seconds == 0 {
            return Err(ExporterError::Config(
                "scrape timeouts must be greater than zero".to_string(),
            ));
        }
        if self.scrape.max_concurrent_fetches == 0 {
            return Err(ExporterError::Config(
                "scrape.max_concurrent_fetches must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}
