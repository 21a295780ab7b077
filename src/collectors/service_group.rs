//! Service Group Member Metrics Collector
//!
//! Service-group members can't be listed with a single stat call. The collector
//! runs a small pipeline:
//!
//! 1. `config/servicegroup?attrs=servicegroupname` enumerates the groups
//! 2. `config/servicegroup_servicegroupmember_binding/<group>` lists each
//!    group's members (bounded fan-out)
//! 3. Members bound to the wildcard port 65535 are dropped; querying their
//!    stats faults on the appliance
//! 4. `stat/servicegroupmember?args=...` fetches each remaining member
//!    (bounded fan-out)
//!
//! A failed binding or member lookup is logged and counted, and the rest of the
//! pipeline carries on.
//!
//! # Metrics Produced
//! - `netscaler_servicegroup_state`
//! - `netscaler_servicegroup_{average_time_to_first_byte,current_client_connections,
//!   surge_count,current_server_connections,server_established_connections,
//!   current_reuse_pool,max_clients}` (gauges)
//! - `netscaler_servicegroup_{total_requests,total_responses,total_request_bytes,
//!   total_response_bytes}` (counters)
//!   - Labels: ns_instance, servicegroup, member, port

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StateSpec, StatRecord};
use super::{publish, record_fetch_failure, CollectionContext, CollectionResult, CollectionStatus};
use crate::error::ExporterError;
use crate::nitro::types::{ServiceGroupMemberBinding, ServiceGroupMemberStats, StatFields};
use futures_util::stream::{self, StreamExt};
use tracing::{debug, warn};

const GROUPS_RESOURCE: &str = "config/servicegroup";
const BINDINGS_RESOURCE: &str = "config/servicegroup_servicegroupmember_binding";

pub const SERVICE_GROUP_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/servicegroupmember",
    labels: &["servicegroup", "member", "port"],
    state: Some(StateSpec {
        metric: "servicegroup_state",
        help: "Current state of the server",
    }),
    fields: &[
        FieldSpec::gauge(
            "avgsvrttfb",
            "servicegroup_average_time_to_first_byte",
            "Average TTFB between the NetScaler appliance and the server",
        ),
        FieldSpec::counter(
            "totalrequests",
            "servicegroup_total_requests",
            "Total number of requests received on this service",
        ),
        FieldSpec::counter(
            "totalresponses",
            "servicegroup_total_responses",
            "Number of responses received on this service",
        ),
        FieldSpec::counter(
            "totalrequestbytes",
            "servicegroup_total_request_bytes",
            "Total number of request bytes received on this service",
        ),
        FieldSpec::counter(
            "totalresponsebytes",
            "servicegroup_total_response_bytes",
            "Number of response bytes received by this service",
        ),
        FieldSpec::gauge(
            "curclntconnections",
            "servicegroup_current_client_connections",
            "Number of current client connections",
        ),
        FieldSpec::gauge(
            "surgecount",
            "servicegroup_surge_count",
            "Number of requests in the surge queue",
        ),
        FieldSpec::gauge(
            "cursrvrconnections",
            "servicegroup_current_server_connections",
            "Number of current connections to the actual servers",
        ),
        FieldSpec::gauge(
            "svrestablishedconn",
            "servicegroup_server_established_connections",
            "Number of server connections in ESTABLISHED state",
        ),
        FieldSpec::gauge(
            "curreusepool",
            "servicegroup_current_reuse_pool",
            "Number of requests in the idle queue/reuse pool",
        ),
        FieldSpec::gauge(
            "maxclients",
            "servicegroup_max_clients",
            "Maximum open connections allowed on this service",
        ),
    ],
};

/// A bound member whose stats can be queried.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct MemberTarget {
    pub group: String,
    pub server: String,
    pub port: u16,
}

/// Member stats joined with the identity they were queried by.
#[derive(Debug, Clone)]
pub struct MemberRecord {
    pub group: String,
    pub server: String,
    pub port: String,
    pub stats: ServiceGroupMemberStats,
}

impl MemberRecord {
    pub fn new(target: MemberTarget, stats: ServiceGroupMemberStats) -> Self {
        Self {
            group: target.group,
            server: target.server,
            port: target.port.to_string(),
            stats,
        }
    }
}

impl StatRecord for MemberRecord {
    fn identity(&self) -> Vec<&str> {
        vec![&self.group, &self.server, &self.port]
    }

    fn state(&self) -> Option<&str> {
        Some(&self.stats.state)
    }

    fn fields(&self) -> &StatFields {
        &self.stats.fields
    }
}

/// Turns one group's bindings into queryable members.
///
/// Wildcard-port bindings are skipped; bindings whose port is not a valid
/// port number are returned as decode errors.
pub fn member_targets(
    group: &str,
    bindings: Vec<ServiceGroupMemberBinding>,
) -> (Vec<MemberTarget>, Vec<ExporterError>) {
    let mut targets = Vec::new();
    let mut errors = Vec::new();

    for binding in bindings {
        if binding.is_wildcard_port() {
            debug!(
                "Skipping wildcard-port member {} of service group {}",
                binding.servername, group
            );
            continue;
        }
        match binding.port() {
            Ok(port) => targets.push(MemberTarget {
                group: group.to_string(),
                server: binding.servername,
                port,
            }),
            Err(e) => errors.push(e),
        }
    }

    (targets, errors)
}

pub fn map_service_group_members(instance: &str, members: &[MemberRecord]) -> MappedSet {
    map_records(&SERVICE_GROUP_SCHEMA, instance, members)
}

pub async fn collect_service_group_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    let client = ctx.client;
    let concurrency = ctx.max_concurrent_fetches.max(1);

    let mut groups = match client.query_service_groups().await {
        Ok(groups) => groups,
        Err(e) => {
            record_fetch_failure(ctx, GROUPS_RESOURCE, &e);
            return Ok(CollectionStatus::Failed);
        }
    };
    record_rejected(ctx, GROUPS_RESOURCE, std::mem::take(&mut groups.rejected));

    let mut status = CollectionStatus::Success;

    let bindings: Vec<_> = stream::iter(groups)
        .map(|group| async move {
            let result = client.query_service_group_bindings(&group.name).await;
            (group.name, result)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut targets = Vec::new();
    for (group, result) in bindings {
        match result {
            Ok(bindings) => {
                let (members, mut errors) = member_targets(&group, bindings.items);
                errors.extend(bindings.rejected);
                targets.extend(members);
                record_rejected(ctx, BINDINGS_RESOURCE, errors);
            }
            Err(e) => {
                record_fetch_failure(ctx, BINDINGS_RESOURCE, &e);
                status = CollectionStatus::Failed;
            }
        }
    }
    targets.sort();

    let stats: Vec<_> = stream::iter(targets)
        .map(|target| async move {
            let result = client
                .query_service_group_member(&target.group, &target.server, target.port)
                .await;
            (target, result)
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    let mut records = Vec::with_capacity(stats.len());
    for (target, result) in stats {
        match result {
            Ok(Some(member)) => records.push(MemberRecord::new(target, member)),
            Ok(None) => debug!(
                instance = %ctx.instance,
                "No stats returned for {}:{} in {}",
                target.server,
                target.port,
                target.group
            ),
            Err(e) => {
                record_fetch_failure(ctx, SERVICE_GROUP_SCHEMA.resource, &e);
                status = CollectionStatus::Failed;
            }
        }
    }
    records.sort_by(|a, b| (&a.group, &a.server, &a.port).cmp(&(&b.group, &b.server, &b.port)));

    let set = map_service_group_members(ctx.instance, &records);
    publish(ctx, &SERVICE_GROUP_SCHEMA, &set);

    Ok(status)
}

fn record_rejected(ctx: &CollectionContext<'_>, resource: &str, errors: Vec<ExporterError>) {
    if errors.is_empty() {
        return;
    }
    for e in &errors {
        warn!(instance = %ctx.instance, resource = resource, "{}", e);
    }
    ctx.metrics
        .record_decode_errors(ctx.instance, resource, errors.len() as u64);
}
