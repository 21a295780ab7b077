//! System Metrics Collector
//!
//! Collects appliance-wide CPU, memory, disk, throughput and TCP connection
//! figures from `stat/ns`, and the licensed model from `config/nslicense`.
//!
//! # Metrics Produced
//! - `netscaler_cpu_usage`, `netscaler_mgmt_cpu_usage`, `netscaler_pkt_cpu_usage`
//! - `netscaler_mem_usage`
//! - `netscaler_flash_partition_usage`, `netscaler_var_partition_usage`
//! - `netscaler_total_received_mb`, `netscaler_total_transmit_mb` (counters)
//! - `netscaler_http_requests`, `netscaler_http_responses` (counters)
//! - `netscaler_tcp_current_{client,server}_connections[_established]`
//! - `netscaler_model_id` - e.g. a VPX 10 reports 10
//!
//! All labelled by `ns_instance` only.

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StatRecord};
use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::nitro::types::{License, StatFields, SystemStats};

pub const SYSTEM_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/ns",
    labels: &[],
    state: None,
    fields: &[
        FieldSpec::gauge("cpuusagepcnt", "cpu_usage", "Current CPU utilisation"),
        FieldSpec::gauge(
            "mgmtcpuusagepcnt",
            "mgmt_cpu_usage",
            "Current CPU utilisation for management",
        ),
        FieldSpec::gauge("memusagepcnt", "mem_usage", "Current memory utilisation"),
        FieldSpec::gauge(
            "pktcpuusagepcnt",
            "pkt_cpu_usage",
            "Current CPU utilisation for packet engines, excluding management",
        ),
        FieldSpec::gauge(
            "disk0perusage",
            "flash_partition_usage",
            "Used space in /flash partition of the disk, as a percentage",
        ),
        FieldSpec::gauge(
            "disk1perusage",
            "var_partition_usage",
            "Used space in /var partition of the disk, as a percentage",
        ),
        FieldSpec::counter(
            "totrxmbits",
            "total_received_mb",
            "Number of megabytes received by the appliance",
        ),
        FieldSpec::counter(
            "tottxmbits",
            "total_transmit_mb",
            "Number of megabytes transmitted by the appliance",
        ),
        FieldSpec::counter(
            "httptotrequests",
            "http_requests",
            "Total number of HTTP requests received",
        ),
        FieldSpec::counter(
            "httptotresponses",
            "http_responses",
            "Total number of HTTP responses sent",
        ),
        FieldSpec::gauge(
            "tcpcurclientconn",
            "tcp_current_client_connections",
            "Client connections, including connections in the Opening, Established, and Closing state",
        ),
        FieldSpec::gauge(
            "tcpcurclientconnestablished",
            "tcp_current_client_connections_established",
            "Current client connections in the Established state",
        ),
        FieldSpec::gauge(
            "tcpcurserverconn",
            "tcp_current_server_connections",
            "Server connections, including connections in the Opening, Established, and Closing state",
        ),
        FieldSpec::gauge(
            "tcpcurserverconnestablished",
            "tcp_current_server_connections_established",
            "Current server connections in the Established state",
        ),
    ],
};

pub const LICENSE_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "config/nslicense",
    labels: &[],
    state: None,
    fields: &[FieldSpec::gauge(
        "modelid",
        "model_id",
        "NetScaler model - reflects the bandwidth available; for example VPX 10 would report as 10",
    )],
};

impl StatRecord for SystemStats {
    fn identity(&self) -> Vec<&str> {
        Vec::new()
    }

    fn fields(&self) -> &StatFields {
        &self.fields
    }
}

impl StatRecord for License {
    fn identity(&self) -> Vec<&str> {
        Vec::new()
    }

    fn fields(&self) -> &StatFields {
        &self.fields
    }
}

pub fn map_system(instance: &str, stats: Option<&SystemStats>) -> MappedSet {
    map_records(&SYSTEM_SCHEMA, instance, stats.as_slice())
}

pub fn map_license(instance: &str, license: Option<&License>) -> MappedSet {
    map_records(&LICENSE_SCHEMA, instance, license.as_slice())
}

pub async fn collect_system_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &SYSTEM_SCHEMA,
        ctx.client.query_system_stats(),
        |stats| map_system(ctx.instance, stats.as_ref()),
    )
    .await
}

pub async fn collect_license_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &LICENSE_SCHEMA,
        ctx.client.query_license(),
        |license| map_license(ctx.instance, license.as_ref()),
    )
    .await
}
