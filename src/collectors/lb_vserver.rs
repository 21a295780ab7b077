//! Load-Balancing Virtual Server Metrics Collector
//!
//! Collects `stat/lbvserver`.
//!
//! # Metrics Produced
//! - `netscaler_virtual_servers_state` - 1 when the vserver is UP, else 0
//! - `netscaler_virtual_servers_waiting_requests`, `_health`,
//!   `_inactive_services`, `_active_services`,
//!   `_current_client_connections`, `_current_server_connections` (gauges)
//! - `netscaler_virtual_servers_total_hits`, `_total_requests`,
//!   `_total_responses`, `_total_request_bytes`, `_total_response_bytes` (counters)
//!   - Labels: ns_instance, virtual_server

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StateSpec, StatRecord};
use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::nitro::types::{StatFields, VirtualServerStats};

pub const LB_VSERVER_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/lbvserver",
    labels: &["virtual_server"],
    state: Some(StateSpec {
        metric: "virtual_servers_state",
        help: "Current state of the server",
    }),
    fields: &[
        FieldSpec::gauge(
            "vsvrsurgecount",
            "virtual_servers_waiting_requests",
            "Number of requests waiting on a specific virtual server",
        ),
        FieldSpec::gauge(
            "vslbhealth",
            "virtual_servers_health",
            "Percentage of UP services bound to a specific virtual server",
        ),
        FieldSpec::gauge(
            "inactsvcs",
            "virtual_servers_inactive_services",
            "Number of inactive services bound to a specific virtual server",
        ),
        FieldSpec::gauge(
            "actsvcs",
            "virtual_servers_active_services",
            "Number of active services bound to a specific virtual server",
        ),
        FieldSpec::counter(
            "tothits",
            "virtual_servers_total_hits",
            "Total virtual server hits",
        ),
        FieldSpec::counter(
            "totalrequests",
            "virtual_servers_total_requests",
            "Total virtual server requests",
        ),
        FieldSpec::counter(
            "totalresponses",
            "virtual_servers_total_responses",
            "Total virtual server responses",
        ),
        FieldSpec::counter(
            "totalrequestbytes",
            "virtual_servers_total_request_bytes",
            "Total virtual server request bytes",
        ),
        FieldSpec::counter(
            "totalresponsebytes",
            "virtual_servers_total_response_bytes",
            "Total virtual server response bytes",
        ),
        FieldSpec::gauge(
            "curclntconnections",
            "virtual_servers_current_client_connections",
            "Number of current client connections on a specific virtual server",
        ),
        FieldSpec::gauge(
            "cursrvrconnections",
            "virtual_servers_current_server_connections",
            "Number of current connections to the actual servers behind the specific virtual server",
        ),
    ],
};

// Shared by the lb, cs, gslb and vpn vserver collectors.
impl StatRecord for VirtualServerStats {
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

pub fn map_lb_vservers(instance: &str, vservers: &[VirtualServerStats]) -> MappedSet {
    map_records(&LB_VSERVER_SCHEMA, instance, vservers)
}

pub async fn collect_lb_vserver_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &LB_VSERVER_SCHEMA,
        ctx.client.query_lb_vservers(),
        |vservers| map_lb_vservers(ctx.instance, &vservers).with_rejected(vservers.rejected),
    )
    .await
}
