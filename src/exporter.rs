//! Request-scoped exporter.
//!
//! Every probe gets its own [`NitroClient`], its own [`NetscalerMetrics`]
//! registry and its own scrape. Nothing outlives the call, so concurrent
//! probes of different (or the same) appliances cannot see each other's
//! label values.

use crate::config::ScrapeConfig;
use crate::error::Result;
use crate::metrics::NetscalerMetrics;
use crate::nitro::{ClientSettings, DeviceTarget, NitroClient};
use crate::scrape::{self, ScrapeReport, ScrapeSettings};
use tracing::error;

/// Plain values the engine needs for one probe.
#[derive(Debug, Clone, Default)]
pub struct ExporterOptions {
    pub client: ClientSettings,
    pub scrape: ScrapeSettings,
}

impl From<&ScrapeConfig> for ExporterOptions {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            client: ClientSettings::from(config),
            scrape: ScrapeSettings::from(config),
        }
    }
}

/// Scrapes `target` into a fresh registry and returns it with the report.
///
/// A client that cannot even be constructed is reported like a failed login:
/// `netscaler_up` is 0 and no appliance metrics are present.
pub async fn collect(
    target: &DeviceTarget,
    options: &ExporterOptions,
) -> Result<(NetscalerMetrics, Option<ScrapeReport>)> {
    let metrics = NetscalerMetrics::new()?;

    let client = match NitroClient::new(target, options.client.clone()) {
        Ok(client) => client,
        Err(e) => {
            error!(instance = %target.instance(), kind = e.kind(), "Failed to build Nitro client: {}", e);
            metrics.set_up(target.instance(), false);
            return Ok((metrics, None));
        }
    };

    let report = scrape::run(&client, &metrics, &options.scrape).await;
    Ok((metrics, Some(report)))
}

/// Scrapes `target` and renders the Prometheus text exposition.
pub async fn handle(target: &DeviceTarget, options: &ExporterOptions) -> Result<String> {
    let (metrics, _) = collect(target, options).await?;
    metrics.render()
}
