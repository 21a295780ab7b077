//! GSLB Metrics Collector
//!
//! Collects global server load balancing services (`stat/gslbservice`) and
//! virtual servers (`stat/gslbvserver`). The two are fetched and published
//! independently, so one failing does not hide the other.
//!
//! # Metrics Produced
//! - `netscaler_gslb_service_*` - Labels: ns_instance, service
//! - `netscaler_gslb_virtual_servers_*` - Labels: ns_instance, virtual_server

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StateSpec, StatRecord};
use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::nitro::types::{GslbServiceStats, StatFields, VirtualServerStats};

pub const GSLB_SERVICE_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/gslbservice",
    labels: &["service"],
    state: Some(StateSpec {
        metric: "gslb_service_state",
        help: "Current state of the service",
    }),
    fields: &[
        FieldSpec::counter(
            "totalrequests",
            "gslb_service_total_requests",
            "Total number of requests received on this service",
        ),
        FieldSpec::counter(
            "totalresponses",
            "gslb_service_total_responses",
            "Total number of responses received on this service",
        ),
        FieldSpec::counter(
            "totalrequestbytes",
            "gslb_service_total_request_bytes",
            "Total number of request bytes received on this service",
        ),
        FieldSpec::counter(
            "totalresponsebytes",
            "gslb_service_total_response_bytes",
            "Total number of response bytes received on this service",
        ),
        FieldSpec::gauge(
            "curclntconnections",
            "gslb_service_current_client_connections",
            "Number of current client connections",
        ),
        FieldSpec::gauge(
            "cursrvrconnections",
            "gslb_service_current_server_connections",
            "Number of current connections to the actual servers",
        ),
        FieldSpec::gauge(
            "establishedconn",
            "gslb_service_established_connections",
            "Number of server connections in ESTABLISHED state",
        ),
        FieldSpec::gauge(
            "curload",
            "gslb_service_current_load",
            "Load on the service that is calculated from the bound load based monitor",
        ),
        FieldSpec::counter(
            "vsvrservicehits",
            "gslb_service_virtual_server_service_hits",
            "Number of times that the service has been provided",
        ),
    ],
};

pub const GSLB_VSERVER_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/gslbvserver",
    labels: &["virtual_server"],
    state: Some(StateSpec {
        metric: "gslb_virtual_servers_state",
        help: "Current state of the server",
    }),
    fields: &[
        FieldSpec::gauge(
            "vslbhealth",
            "gslb_virtual_servers_health",
            "Percentage of UP services bound to a specific virtual server",
        ),
        FieldSpec::gauge(
            "inactsvcs",
            "gslb_virtual_servers_inactive_services",
            "Number of inactive services bound to a specific virtual server",
        ),
        FieldSpec::gauge(
            "actsvcs",
            "gslb_virtual_servers_active_services",
            "Number of active services bound to a specific virtual server",
        ),
        FieldSpec::counter(
            "tothits",
            "gslb_virtual_servers_total_hits",
            "Total virtual server hits",
        ),
        FieldSpec::counter(
            "totalrequests",
            "gslb_virtual_servers_total_requests",
            "Total virtual server requests",
        ),
        FieldSpec::counter(
            "totalresponses",
            "gslb_virtual_servers_total_responses",
            "Total virtual server responses",
        ),
        FieldSpec::counter(
            "totalrequestbytes",
            "gslb_virtual_servers_total_request_bytes",
            "Total virtual server request bytes",
        ),
        FieldSpec::counter(
            "totalresponsebytes",
            "gslb_virtual_servers_total_response_bytes",
            "Total virtual server response bytes",
        ),
        FieldSpec::gauge(
            "curclntconnections",
            "gslb_virtual_servers_current_client_connections",
            "Number of current client connections on a specific virtual server",
        ),
        FieldSpec::gauge(
            "cursrvrconnections",
            "gslb_virtual_servers_current_server_connections",
            "Number of current connections to the actual servers behind the specific virtual server",
        ),
    ],
};

impl StatRecord for GslbServiceStats {
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

pub fn map_gslb_services(instance: &str, services: &[GslbServiceStats]) -> MappedSet {
    map_records(&GSLB_SERVICE_SCHEMA, instance, services)
}

pub fn map_gslb_vservers(instance: &str, vservers: &[VirtualServerStats]) -> MappedSet {
    map_records(&GSLB_VSERVER_SCHEMA, instance, vservers)
}

pub async fn collect_gslb_service_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &GSLB_SERVICE_SCHEMA,
        ctx.client.query_gslb_services(),
        |services| map_gslb_services(ctx.instance, &services).with_rejected(services.rejected),
    )
    .await
}

pub async fn collect_gslb_vserver_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &GSLB_VSERVER_SCHEMA,
        ctx.client.query_gslb_vservers(),
        |vservers| map_gslb_vservers(ctx.instance, &vservers).with_rejected(vservers.rejected),
    )
    .await
}
