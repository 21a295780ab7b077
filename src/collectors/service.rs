//! Service Metrics Collector
//!
//! Collects `stat/service`, one series per service and attribute.
//!
//! # Metrics Produced
//! - `netscaler_service_state` - 1 when the service is UP, else 0
//! - `netscaler_service_throughput`, `_total_requests`, `_total_responses`,
//!   `_total_request_bytes`, `_total_response_bytes`,
//!   `_virtual_server_service_hits` (counters)
//! - `netscaler_service_average_time_to_first_byte`,
//!   `_current_client_connections`, `_current_server_connections`,
//!   `_surge_count`, `_server_established_connections`, `_current_reuse_pool`,
//!   `_max_clients`, `_current_load`, `_active_transactions` (gauges)
//!   - Labels: ns_instance, service

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StateSpec, StatRecord};
use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::nitro::types::{ServiceStats, StatFields};

pub const SERVICE_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/service",
    labels: &["service"],
    state: Some(StateSpec {
        metric: "service_state",
        help: "Current state of the service",
    }),
    fields: &[
        FieldSpec::counter(
            "throughput",
            "service_throughput",
            "Number of bytes received or sent by this service (Mbps)",
        ),
        FieldSpec::gauge(
            "avgsvrttfb",
            "service_average_time_to_first_byte",
            "Average TTFB between the NetScaler appliance and the server",
        ),
        FieldSpec::counter(
            "totalrequests",
            "service_total_requests",
            "Total number of requests received on this service",
        ),
        FieldSpec::counter(
            "totalresponses",
            "service_total_responses",
            "Total number of responses received on this service",
        ),
        FieldSpec::counter(
            "totalrequestbytes",
            "service_total_request_bytes",
            "Total number of request bytes received on this service",
        ),
        FieldSpec::counter(
            "totalresponsebytes",
            "service_total_response_bytes",
            "Total number of response bytes received on this service",
        ),
        FieldSpec::gauge(
            "curclntconnections",
            "service_current_client_connections",
            "Number of current client connections",
        ),
        FieldSpec::gauge(
            "surgecount",
            "service_surge_count",
            "Number of requests in the surge queue",
        ),
        FieldSpec::gauge(
            "cursrvrconnections",
            "service_current_server_connections",
            "Number of current connections to the actual servers",
        ),
        FieldSpec::gauge(
            "svrestablishedconn",
            "service_server_established_connections",
            "Number of server connections in ESTABLISHED state",
        ),
        FieldSpec::gauge(
            "curreusepool",
            "service_current_reuse_pool",
            "Number of requests in the idle queue/reuse pool",
        ),
        FieldSpec::gauge(
            "maxclients",
            "service_max_clients",
            "Maximum open connections allowed on this service",
        ),
        FieldSpec::gauge(
            "curload",
            "service_current_load",
            "Load on the service that is calculated from the bound load based monitor",
        ),
        FieldSpec::counter(
            "vsvrservicehits",
            "service_virtual_server_service_hits",
            "Number of times that the service has been provided",
        ),
        FieldSpec::gauge(
            "activetransactions",
            "service_active_transactions",
            "Number of active transactions handled by this service, including those in the surge queue",
        ),
    ],
};

impl StatRecord for ServiceStats {
    fn identity(&self) -> Vec<&str> {
        vec![&self.name]
    }

    fn state(&self) -> Option<&str> {
        Some(&self.state)
    }

    fn fields(&self) -> &StatFields {
        &self.fields
    }
}

pub fn map_services(instance: &str, services: &[ServiceStats]) -> MappedSet {
    map_records(&SERVICE_SCHEMA, instance, services)
}

pub async fn collect_service_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &SERVICE_SCHEMA,
        ctx.client.query_services(),
        |services| map_services(ctx.instance, &services).with_rejected(services.rejected),
    )
    .await
}
