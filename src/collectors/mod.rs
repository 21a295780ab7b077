//! Metrics Collectors
//!
//! One collector per Nitro resource. Each collector queries its resource through
//! the [`NitroClient`], maps the records with its [`ResourceSchema`] and
//! publishes the result into the scrape's [`NetscalerMetrics`].
//!
//! # Architecture
//!
//! Collectors follow a consistent pattern:
//! - Accept a `CollectionContext` for the current scrape
//! - Query one Nitro resource
//! - Map records with a pure `map_*` function (testable against JSON fixtures)
//! - Return `CollectionResult`
//!
//! # Error Handling
//!
//! Individual collector failures are non-fatal: they are logged with the
//! appliance and resource, counted in `netscaler_exporter_fetch_errors_total`,
//! and reported as `CollectionStatus::Failed`. The remaining collectors still run.

use crate::error::ExporterError;
use crate::metrics::NetscalerMetrics;
use crate::nitro::NitroClient;
use mapper::{MappedSet, ResourceSchema};
use tracing::{debug, warn};

/// Shared context passed to all collectors
///
/// All fields are immutable references or plain values scoped to one scrape.
#[derive(Clone, Copy)]
pub struct CollectionContext<'a> {
    /// Nitro client holding this scrape's session
    pub client: &'a NitroClient,
    /// Scrape-scoped metric registry
    pub metrics: &'a NetscalerMetrics,
    /// `ns_instance` label value
    pub instance: &'a str,
    /// Fan-out bound for the service-group pipeline
    pub max_concurrent_fetches: usize,
}

/// Status of a metrics collection operation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectionStatus {
    /// Metrics were successfully collected and updated
    Success,
    /// Collection failed but is non-fatal (already logged as warning)
    Failed,
}

/// Result type for collector functions
///
/// - `Ok(CollectionStatus::Success)` = Collection succeeded
/// - `Ok(CollectionStatus::Failed)` = Collection failed but non-fatal (logged as warning)
/// - `Err(_)` = Fatal error (should propagate)
pub type CollectionResult = Result<CollectionStatus, anyhow::Error>;

/// Every resource schema, in registration order.
pub const SCHEMAS: &[&ResourceSchema] = &[
    &system::SYSTEM_SCHEMA,
    &system::LICENSE_SCHEMA,
    &interface::INTERFACE_SCHEMA,
    &lb_vserver::LB_VSERVER_SCHEMA,
    &service::SERVICE_SCHEMA,
    &service_group::SERVICE_GROUP_SCHEMA,
    &gslb::GSLB_SERVICE_SCHEMA,
    &gslb::GSLB_VSERVER_SCHEMA,
    &cs_vserver::CS_VSERVER_SCHEMA,
    &vpn_vserver::VPN_VSERVER_SCHEMA,
    &aaa::AAA_SCHEMA,
];

/// Helper to reduce boilerplate in collectors
///
/// Wraps a resource query with consistent handling:
/// - On success: maps the records, publishes them, returns `CollectionStatus::Success`
/// - On error: logs and counts the failure, returns `CollectionStatus::Failed`
///
/// # Examples
///
/// ```no_run
/// # use netscaler_exporter::collectors::*;
/// # use netscaler_exporter::collectors::lb_vserver::{map_lb_vservers, LB_VSERVER_SCHEMA};
/// async fn example(ctx: &CollectionContext<'_>) -> CollectionResult {
///     collect_with_handler(
///         ctx,
///         &LB_VSERVER_SCHEMA,
///         ctx.client.query_lb_vservers(),
///         |vservers| map_lb_vservers(ctx.instance, &vservers).with_rejected(vservers.rejected),
///     )
///     .await
/// }
/// ```
pub async fn collect_with_handler<T, F, M>(
    ctx: &CollectionContext<'_>,
    schema: &ResourceSchema,
    query_future: F,
    map: M,
) -> CollectionResult
where
    F: std::future::Future<Output = crate::error::Result<T>>,
    M: FnOnce(T) -> MappedSet,
{
    match query_future.await {
        Ok(data) => {
            let set = map(data);
            publish(ctx, schema, &set);
            debug!(
                instance = %ctx.instance,
                resource = schema.resource,
                "Updated {} observations",
                set.observations.len()
            );
            Ok(CollectionStatus::Success)
        }
        Err(e) => {
            record_fetch_failure(ctx, schema.resource, &e);
            Ok(CollectionStatus::Failed)
        }
    }
}

/// Publishes a mapped set, logging each value that had to be coerced to zero.
pub fn publish(ctx: &CollectionContext<'_>, schema: &ResourceSchema, set: &MappedSet) {
    for e in &set.decode_errors {
        warn!(instance = %ctx.instance, resource = schema.resource, "{}", e);
    }
    ctx.metrics.publish(ctx.instance, schema, set);
}

pub fn record_fetch_failure(ctx: &CollectionContext<'_>, resource: &str, e: &ExporterError) {
    warn!(
        instance = %ctx.instance,
        resource = resource,
        kind = e.kind(),
        "Failed to query {}: {}",
        resource,
        e
    );
    ctx.metrics.record_fetch_error(ctx.instance, resource);
}

// Collector modules
pub mod aaa;
pub mod cs_vserver;
pub mod gslb;
pub mod interface;
pub mod lb_vserver;
pub mod mapper;
pub mod service;
pub mod service_group;
pub mod system;
pub mod vpn_vserver;

// Re-export collector functions for convenient access
pub use aaa::collect_aaa_metrics;
pub use cs_vserver::collect_cs_vserver_metrics;
pub use gslb::{collect_gslb_service_metrics, collect_gslb_vserver_metrics};
pub use interface::collect_interface_metrics;
pub use lb_vserver::collect_lb_vserver_metrics;
pub use service::collect_service_metrics;
pub use service_group::collect_service_group_metrics;
pub use system::{collect_license_metrics, collect_system_metrics};
pub use vpn_vserver::collect_vpn_vserver_metrics;
