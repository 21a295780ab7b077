//! Interface Metrics Collector
//!
//! Collects per-interface traffic counters from `stat/interface`.
//!
//! # Metrics Produced
//! - `netscaler_interfaces_received_bytes` / `_transmitted_bytes`
//! - `netscaler_interfaces_received_packets` / `_transmitted_packets`
//! - `netscaler_interfaces_jumbo_packets_received` / `_transmitted`
//! - `netscaler_interfaces_error_packets_received`
//!   - Labels: ns_instance, interface, alias

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StatRecord};
use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::nitro::types::{InterfaceStats, StatFields};

pub const INTERFACE_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/interface",
    labels: &["interface", "alias"],
    state: None,
    fields: &[
        FieldSpec::counter(
            "totrxbytes",
            "interfaces_received_bytes",
            "Number of bytes received by specific interfaces",
        ),
        FieldSpec::counter(
            "tottxbytes",
            "interfaces_transmitted_bytes",
            "Number of bytes transmitted by specific interfaces",
        ),
        FieldSpec::counter(
            "totrxpkts",
            "interfaces_received_packets",
            "Number of packets received by specific interfaces",
        ),
        FieldSpec::counter(
            "tottxpkts",
            "interfaces_transmitted_packets",
            "Number of packets transmitted by specific interfaces",
        ),
        FieldSpec::counter(
            "jumbopktsreceived",
            "interfaces_jumbo_packets_received",
            "Number of jumbo packets received by specific interfaces",
        ),
        FieldSpec::counter(
            "jumbopktstransmitted",
            "interfaces_jumbo_packets_transmitted",
            "Number of jumbo packets transmitted by specific interfaces",
        ),
        FieldSpec::counter(
            "errpktrx",
            "interfaces_error_packets_received",
            "Number of error packets received by specific interfaces",
        ),
    ],
};

impl StatRecord for InterfaceStats {
    fn identity(&self) -> Vec<&str> {
        vec![&self.id, &self.alias]
    }

    fn fields(&self) -> &StatFields {
        &self.fields
    }
}

pub fn map_interfaces(instance: &str, interfaces: &[InterfaceStats]) -> MappedSet {
    map_records(&INTERFACE_SCHEMA, instance, interfaces)
}

pub async fn collect_interface_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &INTERFACE_SCHEMA,
        ctx.client.query_interfaces(),
        |interfaces| map_interfaces(ctx.instance, &interfaces).with_rejected(interfaces.rejected),
    )
    .await
}
