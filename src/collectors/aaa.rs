//! AAA Metrics Collector
//!
//! Collects authentication, authorization and session counters from `stat/aaa`.
//! Labelled by `ns_instance` only.

use super::mapper::{map_records, FieldSpec, MappedSet, ResourceSchema, StatRecord};
use super::{collect_with_handler, CollectionContext, CollectionResult};
use crate::nitro::types::{AaaStats, StatFields};

pub const AAA_SCHEMA: ResourceSchema = ResourceSchema {
    resource: "stat/aaa",
    labels: &[],
    state: None,
    fields: &[
        FieldSpec::counter(
            "aaaauthsuccess",
            "aaa_auth_success",
            "Count of authentication successes",
        ),
        FieldSpec::counter(
            "aaaauthfail",
            "aaa_auth_fail",
            "Count of authentication failures",
        ),
        FieldSpec::counter(
            "aaaauthonlyhttpsuccess",
            "aaa_auth_only_http_success",
            "Count of HTTP connections that succeeded authorization",
        ),
        FieldSpec::counter(
            "aaaauthonlyhttpfail",
            "aaa_auth_only_http_fail",
            "Count of HTTP connections that failed authorization",
        ),
        FieldSpec::counter(
            "aaaauthnonhttpsuccess",
            "aaa_auth_non_http_success",
            "Count of non HTTP connections that succeeded authorization",
        ),
        FieldSpec::counter(
            "aaaauthnonhttpfail",
            "aaa_auth_non_http_fail",
            "Count of non HTTP connections that failed authorization",
        ),
        FieldSpec::gauge(
            "aaacursessions",
            "aaa_current_sessions",
            "Count of current basic sessions",
        ),
        FieldSpec::counter(
            "aaatotsessions",
            "aaa_total_sessions",
            "Count of all basic sessions",
        ),
        FieldSpec::counter(
            "aaatotsessiontimeout",
            "aaa_total_session_timeouts",
            "Count of AAA sessions that have timed out",
        ),
        FieldSpec::gauge(
            "aaacuricasessions",
            "aaa_current_ica_sessions",
            "Count of current SmartAccess ICA sessions",
        ),
        FieldSpec::gauge(
            "aaacuricaonlyconn",
            "aaa_current_ica_only_connections",
            "Count of current Basic ICA only connections",
        ),
        FieldSpec::gauge(
            "aaacuricaconn",
            "aaa_current_ica_connections",
            "Count of current ICA connections",
        ),
        FieldSpec::gauge(
            "aaacurtmsessions",
            "aaa_current_tm_sessions",
            "Count of current AAATM sessions",
        ),
        FieldSpec::counter(
            "aaatottmsessions",
            "aaa_total_tm_sessions",
            "Count of all AAATM sessions",
        ),
    ],
};

impl StatRecord for AaaStats {
    fn identity(&self) -> Vec<&str> {
        Vec::new()
    }

    fn fields(&self) -> &StatFields {
        &self.fields
    }
}

pub fn map_aaa(instance: &str, stats: Option<&AaaStats>) -> MappedSet {
    map_records(&AAA_SCHEMA, instance, stats.as_slice())
}

pub async fn collect_aaa_metrics(ctx: &CollectionContext<'_>) -> CollectionResult {
    collect_with_handler(
        ctx,
        &AAA_SCHEMA,
        ctx.client.query_aaa_stats(),
        |stats| map_aaa(ctx.instance, stats.as_ref()),
    )
    .await
}
