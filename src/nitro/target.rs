//! Per-scrape device identity and client settings.
//!
//! Nothing in here is read from the environment: the server builds these values
//! from its configuration and the inbound probe request, then hands them to the
//! engine.

use crate::config::ScrapeConfig;
use crate::error::{ExporterError, Result};
use secrecy::SecretString;
use std::time::Duration;

/// One appliance to scrape. Lives for exactly one scrape.
#[derive(Debug, Clone)]
pub struct DeviceTarget {
    url: String,
    pub username: String,
    pub password: SecretString,
    pub ignore_cert: bool,
}

impl DeviceTarget {
    /// Normalises the base URL: trims whitespace and trailing slashes, and
    /// assumes `https://` when no scheme is given.
    pub fn new(
        url: &str,
        username: impl Into<String>,
        password: SecretString,
        ignore_cert: bool,
    ) -> Result<Self> {
        let trimmed = url.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ExporterError::InvalidTarget(
                "target must not be empty".to_string(),
            ));
        }

        let url = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{}", trimmed)
        };

        reqwest::Url::parse(&url)
            .map_err(|e| ExporterError::InvalidTarget(format!("{}: {}", url, e)))?;

        Ok(Self {
            url,
            username: username.into(),
            password,
            ignore_cert,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Value of the `ns_instance` label on every metric of this scrape.
    pub fn instance(&self) -> &str {
        &self.url
    }
}

/// Status-code and error-code handling the appliance is inconsistent about.
///
/// Firmware documents `200` for login and logout but has been observed to answer
/// `201`; some deployments also return informational non-zero error codes on
/// otherwise usable stat responses. Each of these is an explicit list rather
/// than a guessed rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceQuirks {
    pub login_success_statuses: Vec<u16>,
    pub logout_success_statuses: Vec<u16>,
    pub tolerated_error_codes: Vec<i64>,
}

impl Default for DeviceQuirks {
    fn default() -> Self {
        Self {
            login_success_statuses: vec![200, 201],
            logout_success_statuses: vec![200, 201],
            tolerated_error_codes: Vec::new(),
        }
    }
}

impl DeviceQuirks {
    pub fn is_login_success(&self, status: u16) -> bool {
        self.login_success_statuses.contains(&status)
    }

    pub fn is_logout_success(&self, status: u16) -> bool {
        self.logout_success_statuses.contains(&status)
    }

    pub fn tolerates(&self, errorcode: i64) -> bool {
        errorcode == 0 || self.tolerated_error_codes.contains(&errorcode)
    }
}

/// Transport settings for one [`NitroClient`](super::NitroClient).
#[derive(Debug, Clone)]
pub struct ClientSettings {
    pub request_timeout: Duration,
    pub quirks: DeviceQuirks,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            request_timeout: Duration::from_secs(10),
            quirks: DeviceQuirks::default(),
        }
    }
}

impl From<&ScrapeConfig> for ClientSettings {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            request_timeout: config.request_timeout(),
            quirks: DeviceQuirks {
                login_success_statuses: config.login_success_statuses.clone(),
                logout_success_statuses: config.logout_success_statuses.clone(),
                tolerated_error_codes: config.tolerated_error_codes.clone(),
            },
        }
    }
}
