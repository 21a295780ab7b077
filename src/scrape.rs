//! Collection Orchestrator
//!
//! Drives one scrape of one appliance:
//!
//! ```text
//! Idle -> Authenticating -> Fetching -> Mapped -> Closing -> Done
//!              |
//!              +-> Failed   (login rejected, nothing fetched)
//! ```
//!
//! Resource collectors run concurrently under one deadline. Their failures are
//! logged and counted but never abort the scrape; only authentication does.
//! Once a login succeeded, exactly one logout is attempted, whether the
//! collectors all succeed, all fail, or the deadline expires. If the scrape
//! future itself is dropped mid-flight, [`SessionGuard`] hands the logout to
//! the runtime.

use crate::collectors::{
    collect_aaa_metrics, collect_cs_vserver_metrics, collect_gslb_service_metrics,
    collect_gslb_vserver_metrics, collect_interface_metrics, collect_lb_vserver_metrics,
    collect_license_metrics, collect_service_group_metrics, collect_service_metrics,
    collect_system_metrics, collect_vpn_vserver_metrics, CollectionContext, CollectionResult,
    CollectionStatus,
};
use crate::config::ScrapeConfig;
use crate::error::{ExporterError, Result};
use crate::metrics::NetscalerMetrics;
use crate::nitro::NitroClient;
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScrapePhase {
    Idle,
    Authenticating,
    Fetching,
    Mapped,
    Closing,
    Done,
    Failed,
}

/// Per-scrape limits.
#[derive(Debug, Clone)]
pub struct ScrapeSettings {
    /// Bound on the whole fetch phase.
    pub scrape_timeout: Duration,
    pub max_concurrent_fetches: usize,
}

impl Default for ScrapeSettings {
    fn default() -> Self {
        Self {
            scrape_timeout: Duration::from_secs(30),
            max_concurrent_fetches: 4,
        }
    }
}

impl From<&ScrapeConfig> for ScrapeSettings {
    fn from(config: &ScrapeConfig) -> Self {
        Self {
            scrape_timeout: config.scrape_timeout(),
            max_concurrent_fetches: config.max_concurrent_fetches,
        }
    }
}

/// What happened during one scrape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScrapeReport {
    pub phase: ScrapePhase,
    pub collectors_run: usize,
    pub collectors_failed: usize,
    pub timed_out: bool,
    pub logout_attempted: bool,
}

impl ScrapeReport {
    fn new() -> Self {
        Self {
            phase: ScrapePhase::Idle,
            collectors_run: 0,
            collectors_failed: 0,
            timed_out: false,
            logout_attempted: false,
        }
    }

    pub fn authenticated(&self) -> bool {
        self.phase != ScrapePhase::Failed
    }

    fn enter(&mut self, instance: &str, phase: ScrapePhase) {
        debug!(instance = %instance, "Scrape phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}

/// Logs out on drop unless [`SessionGuard::close`] already did.
///
/// [`SessionGuard::open`] arms the guard before the login request goes out and
/// runs the login in its own task, so a session the appliance issues while the
/// scrape is being cancelled is still released.
pub struct SessionGuard {
    client: Option<NitroClient>,
    login: Option<JoinHandle<Result<()>>>,
}

impl SessionGuard {
    /// Starts logging in and arms the guard.
    pub fn open(client: NitroClient) -> Self {
        let login = tokio::spawn({
            let client = client.clone();
            async move { client.open().await }
        });
        Self {
            client: Some(client),
            login: Some(login),
        }
    }

    /// Waits for the login started by [`SessionGuard::open`].
    pub async fn opened(&mut self) -> Result<()> {
        let Some(login) = self.login.as_mut() else {
            return Ok(());
        };
        let outcome = match login.await {
            Ok(result) => result,
            Err(e) => Err(ExporterError::Auth {
                status: 0,
                message: format!("login task failed: {}", e),
            }),
        };
        self.login = None;
        outcome
    }

    /// Releases the guard without logging out.
    pub fn disarm(mut self) {
        self.client = None;
        self.login = None;
    }

    pub async fn close(mut self) -> Result<()> {
        match self.client.take() {
            Some(client) => client.close().await,
            None => Ok(()),
        }
    }
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        let Some(client) = self.client.take() else {
            return;
        };
        let login = self.login.take();
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                warn!(instance = %client.instance(), "Scrape cancelled, logging out in background");
                handle.spawn(async move {
                    // A login still in flight may yet yield a session.
                    if let Some(login) = login {
                        let _ = login.await;
                    }
                    if let Err(e) = client.close().await {
                        warn!(instance = %client.instance(), kind = e.kind(), "Background logout failed: {}", e);
                    }
                });
            }
            Err(_) => {
                error!(instance = %client.instance(), "Scrape cancelled outside a runtime, session left open");
            }
        }
    }
}

/// Runs one full scrape, populating `metrics`.
pub async fn run(
    client: &NitroClient,
    metrics: &NetscalerMetrics,
    settings: &ScrapeSettings,
) -> ScrapeReport {
    let started = Instant::now();
    let instance = client.instance();
    let mut report = ScrapeReport::new();

    report.enter(instance, ScrapePhase::Authenticating);
    let mut guard = SessionGuard::open(client.clone());
    if let Err(e) = guard.opened().await {
        guard.disarm();
        error!(instance = %instance, kind = e.kind(), "Scrape aborted: {}", e);
        metrics.set_up(instance, false);
        metrics.set_scrape_duration(instance, started.elapsed().as_secs_f64());
        report.enter(instance, ScrapePhase::Failed);
        return report;
    }
    metrics.set_up(instance, true);

    report.enter(instance, ScrapePhase::Fetching);
    let ctx = CollectionContext {
        client,
        metrics,
        instance,
        max_concurrent_fetches: settings.max_concurrent_fetches,
    };

    match tokio::time::timeout(settings.scrape_timeout, collect_all(&ctx)).await {
        Ok(results) => {
            report.collectors_run = results.len();
            report.collectors_failed = results
                .into_iter()
                .filter(|status| *status == CollectionStatus::Failed)
                .count();
        }
        Err(_) => {
            warn!(
                instance = %instance,
                "Scrape deadline of {:?} exceeded, abandoning remaining fetches",
                settings.scrape_timeout
            );
            report.timed_out = true;
        }
    }
    report.enter(instance, ScrapePhase::Mapped);

    report.enter(instance, ScrapePhase::Closing);
    report.logout_attempted = true;
    if let Err(e) = guard.close().await {
        warn!(instance = %instance, kind = e.kind(), "{}", e);
    }

    let elapsed = started.elapsed().as_secs_f64();
    metrics.set_scrape_duration(instance, elapsed);
    report.enter(instance, ScrapePhase::Done);
    info!(
        instance = %instance,
        failed = report.collectors_failed,
        timed_out = report.timed_out,
        "Scrape finished in {:.3}s",
        elapsed
    );
    report
}

/// Runs every collector concurrently. They share no state beyond the
/// scrape-local registry, whose families are independently locked.
async fn collect_all(ctx: &CollectionContext<'_>) -> Vec<CollectionStatus> {
    let (license, system, interfaces, lb, services, groups, gslb_services, gslb_vservers, cs, vpn, aaa) = tokio::join!(
        collect_license_metrics(ctx),
        collect_system_metrics(ctx),
        collect_interface_metrics(ctx),
        collect_lb_vserver_metrics(ctx),
        collect_service_metrics(ctx),
        collect_service_group_metrics(ctx),
        collect_gslb_service_metrics(ctx),
        collect_gslb_vserver_metrics(ctx),
        collect_cs_vserver_metrics(ctx),
        collect_vpn_vserver_metrics(ctx),
        collect_aaa_metrics(ctx),
    );

    [
        license,
        system,
        interfaces,
        lb,
        services,
        groups,
        gslb_services,
        gslb_vservers,
        cs,
        vpn,
        aaa,
    ]
    .into_iter()
    .map(|result| status_of(ctx, result))
    .collect()
}

fn status_of(ctx: &CollectionContext<'_>, result: CollectionResult) -> CollectionStatus {
    result.unwrap_or_else(|e| {
        warn!(instance = %ctx.instance, "Collector error: {}", e);
        CollectionStatus::Failed
    })
}
