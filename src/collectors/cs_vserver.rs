//! Content-Switching Virtual Server Metrics Collector
//!
//! # Metrics Produced
//! - `netscaler_cs_virtual_servers_state`
//! - `netscaler_cs_virtual_servers_{current_client_connections,current_server_connections,
//!   established_connections,current_multipath_sessions,current_multipath_subflows}` (gauges)
//! - `netscaler_cs_virtual_servers_{total_hits,total_requests,total_responses,
//!   total_request_bytes,total_response_bytes,total_packets_received,total_packets_sent,
//!   total_spillovers,deferred_requests,number_invalid_request_response,
//!   number_invalid_request_response_dropped,total_vserver_down_backup_hits}` (counters)
//!   - Labels: ns_instance, virtual_server

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StateSpec};
use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::nitro::types::VirtualServerStats;

pub const CS_VSERVER_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/csvserver",
    labels: &["virtual_server"],
    state: Some(StateSpec {
        metric: "cs_virtual_servers_state",
        help: "Current state of the server",
    }),
    fields: &[
        FieldSpec::counter(
            "tothits",
            "cs_virtual_servers_total_hits",
            "Total virtual server hits",
        ),
        FieldSpec::counter(
            "totalrequests",
            "cs_virtual_servers_total_requests",
            "Total virtual server requests",
        ),
        FieldSpec::counter(
            "totalresponses",
            "cs_virtual_servers_total_responses",
            "Total virtual server responses",
        ),
        FieldSpec::counter(
            "totalrequestbytes",
            "cs_virtual_servers_total_request_bytes",
            "Total virtual server request bytes",
        ),
        FieldSpec::counter(
            "totalresponsebytes",
            "cs_virtual_servers_total_response_bytes",
            "Total virtual server response bytes",
        ),
        FieldSpec::gauge(
            "curclntconnections",
            "cs_virtual_servers_current_client_connections",
            "Number of current client connections on a specific virtual server",
        ),
        FieldSpec::gauge(
            "cursrvrconnections",
            "cs_virtual_servers_current_server_connections",
            "Number of current connections to the actual servers behind the specific virtual server",
        ),
        FieldSpec::gauge(
            "establishedconn",
            "cs_virtual_servers_established_connections",
            "Number of client connections in ESTABLISHED state",
        ),
        FieldSpec::counter(
            "totalpktsrecvd",
            "cs_virtual_servers_total_packets_received",
            "Total number of packets received",
        ),
        FieldSpec::counter(
            "totalpktssent",
            "cs_virtual_servers_total_packets_sent",
            "Total number of packets sent",
        ),
        FieldSpec::counter(
            "totspillovers",
            "cs_virtual_servers_total_spillovers",
            "Number of times vserver experienced spill over",
        ),
        FieldSpec::counter(
            "deferredreq",
            "cs_virtual_servers_deferred_requests",
            "Number of deferred request on this vserver",
        ),
        FieldSpec::counter(
            "invalidrequestresponse",
            "cs_virtual_servers_number_invalid_request_response",
            "Number invalid requests/responses on this vserver",
        ),
        FieldSpec::counter(
            "invalidrequestresponsedropped",
            "cs_virtual_servers_number_invalid_request_response_dropped",
            "Number invalid requests/responses dropped on this vserver",
        ),
        FieldSpec::counter(
            "totvserverdownbackuphits",
            "cs_virtual_servers_total_vserver_down_backup_hits",
            "Number of times traffic was diverted to backup vserver since primary vserver was DOWN",
        ),
        FieldSpec::gauge(
            "curmptcpsessions",
            "cs_virtual_servers_current_multipath_sessions",
            "Current Multipath TCP sessions",
        ),
        FieldSpec::gauge(
            "cursubflowconn",
            "cs_virtual_servers_current_multipath_subflows",
            "Current Multipath TCP subflows",
        ),
    ],
};

pub fn map_cs_vservers(instance: &str, vservers: &[VirtualServerStats]) -> MappedSet {
    map_records(&CS_VSERVER_SCHEMA, instance, vservers)
}

pub async fn collect_cs_vserver_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &CS_VSERVER_SCHEMA,
        ctx.client.query_cs_vservers(),
        |vservers| map_cs_vservers(ctx.instance, &vservers).with_rejected(vservers.rejected),
    )
    .await
}
