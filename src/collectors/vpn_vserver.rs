//! VPN Virtual Server Metrics Collector
//!
//! # Metrics Produced
//! - `netscaler_vpn_virtual_servers_state`
//! - `netscaler_vpn_virtual_servers_total_requests`, `_total_responses`,
//!   `_total_request_bytes`, `_total_response_bytes`
//!   - Labels: ns_instance, virtual_server

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StateSpec};
use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::nitro::types::VirtualServerStats;

pub const VPN_VSERVER_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/vpnvserver",
    labels: &["virtual_server"],
    state: Some(StateSpec {
        metric: "vpn_virtual_servers_state",
        help: "Current state of the server",
    }),
    fields: &[
        FieldSpec::counter(
            "totalrequests",
            "vpn_virtual_servers_total_requests",
            "Total virtual server requests",
        ),
        FieldSpec::counter(
            "totalresponses",
            "vpn_virtual_servers_total_responses",
            "Total virtual server responses",
        ),
        FieldSpec::counter(
            "totalrequestbytes",
            "vpn_virtual_servers_total_request_bytes",
            "Total virtual server request bytes",
        ),
        FieldSpec::counter(
            "totalresponsebytes",
            "vpn_virtual_servers_total_response_bytes",
            "Total virtual server response bytes",
        ),
    ],
};

pub fn map_vpn_vservers(instance: &str, vservers: &[VirtualServerStats]) -> MappedSet {
    map_records(&VPN_VSERVER_SCHEMA, instance, vservers)
}

pub async fn collect_vpn_vserver_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &VPN_VSERVER_SCHEMA,
        ctx.client.query_vpn_vservers(),
        |vservers| map_vpn_vservers(ctx.instance, &vservers).with_rejected(vservers.rejected),
    )
    .await
}
