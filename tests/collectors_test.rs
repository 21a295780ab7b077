//! Collector helper tests
//!
//! `collect_with_handler` is driven with ready-made futures, so no appliance
//! is needed; the client in the context is never called.

use netscaler_exporter::collectors::lb_vserver::{map_lb_vservers, LB_VSERVER_SCHEMA};
use netscaler_exporter::collectors::{collect_with_handler, CollectionContext, CollectionStatus};
use netscaler_exporter::error::ExporterError;
use netscaler_exporter::metrics::NetscalerMetrics;
use netscaler_exporter::nitro::types::VirtualServerStats;
use netscaler_exporter::nitro::{ClientSettings, DeviceTarget, NitroClient};
use secrecy::SecretString;
use serde_json::json;

const INSTANCE: &str = "https://ns1.example.net";

fn create_test_client() -> NitroClient {
    let target = DeviceTarget::new(INSTANCE, "nsroot", SecretString::from("pw".to_string()), false)
        .expect("Failed to create target");
    NitroClient::new(&target, ClientSettings::default()).expect("Failed to create client")
}

fn create_test_metrics() -> NetscalerMetrics {
    NetscalerMetrics::new().expect("Failed to create test metrics")
}

fn vserver(name: &str, state: &str, requests: &str) -> VirtualServerStats {
    serde_json::from_value(json!({"name": name, "state": state, "totalrequests": requests}))
        .expect("Failed to build vserver")
}

#[tokio::test]
async fn test_collect_with_handler_success() {
    // Given: A successful query returning one vserver
    let client = create_test_client();
    let metrics = create_test_metrics();
    let ctx = CollectionContext {
        client: &client,
        metrics: &metrics,
        instance: INSTANCE,
        max_concurrent_fetches: 4,
    };

    // When: The handler maps and publishes it
    let result = collect_with_handler(
        &ctx,
        &LB_VSERVER_SCHEMA,
        async { Ok::<_, ExporterError>(vec![vserver("vs1", "UP", "10")]) },
        |vservers| map_lb_vservers(INSTANCE, &vservers),
    )
    .await;

    // Then: Collection succeeds and the series are in the registry
    assert_eq!(result.expect("Collector error"), CollectionStatus::Success);
    let rendered = metrics.render().expect("Failed to render");
    assert!(rendered.contains("netscaler_virtual_servers_state{"));
    assert!(rendered.contains("virtual_server=\"vs1\""));
}

#[tokio::test]
async fn test_collect_with_handler_error() {
    // Given: A query that fails
    let client = create_test_client();
    let metrics = create_test_metrics();
    let ctx = CollectionContext {
        client: &client,
        metrics: &metrics,
        instance: INSTANCE,
        max_concurrent_fetches: 4,
    };

    // When
    let result = collect_with_handler(
        &ctx,
        &LB_VSERVER_SCHEMA,
        async {
            Err::<Vec<VirtualServerStats>, ExporterError>(ExporterError::Fetch {
                resource: "stat/lbvserver".to_string(),
                errorcode: 14,
                message: "Feature not licensed".to_string(),
                severity: "ERROR".to_string(),
            })
        },
        |_vservers| panic!("Should not map data on error"),
    )
    .await;

    // Then: Collection fails gracefully and the failure is counted
    assert_eq!(result.expect("Collector error"), CollectionStatus::Failed);
    let count = metrics
        .fetch_errors
        .with_label_values(&[INSTANCE, "stat/lbvserver"])
        .get();
    assert_eq!(count, 1);
}

#[tokio::test]
async fn test_publish_replaces_previous_records() {
    // Given: A resource published once with two vservers
    let client = create_test_client();
    let metrics = create_test_metrics();
    let ctx = CollectionContext {
        client: &client,
        metrics: &metrics,
        instance: INSTANCE,
        max_concurrent_fetches: 4,
    };
    collect_with_handler(
        &ctx,
        &LB_VSERVER_SCHEMA,
        async { Ok::<_, ExporterError>(vec![vserver("old", "UP", "1"), vserver("kept", "UP", "1")]) },
        |vservers| map_lb_vservers(INSTANCE, &vservers),
    )
    .await
    .expect("Collector error");

    // When: It is published again without one of them
    collect_with_handler(
        &ctx,
        &LB_VSERVER_SCHEMA,
        async { Ok::<_, ExporterError>(vec![vserver("kept", "DOWN", "5")]) },
        |vservers| map_lb_vservers(INSTANCE, &vservers),
    )
    .await
    .expect("Collector error");

    // Then: Only the current record is exported, with its current values
    let rendered = metrics.render().expect("Failed to render");
    assert!(!rendered.contains("virtual_server=\"old\""));
    assert!(rendered.contains("virtual_server=\"kept\"} 5"));
}

#[tokio::test]
async fn test_empty_collection_succeeds() {
    let client = create_test_client();
    let metrics = create_test_metrics();
    let ctx = CollectionContext {
        client: &client,
        metrics: &metrics,
        instance: INSTANCE,
        max_concurrent_fetches: 4,
    };

    let result = collect_with_handler(
        &ctx,
        &LB_VSERVER_SCHEMA,
        async { Ok::<Vec<VirtualServerStats>, ExporterError>(Vec::new()) },
        |vservers| map_lb_vservers(INSTANCE, &vservers),
    )
    .await;

    assert_eq!(result.expect("Collector error"), CollectionStatus::Success);
    let rendered = metrics.render().expect("Failed to render");
    assert!(!rendered.contains("netscaler_virtual_servers_state{"));
}

#[test]
fn test_collection_status_enum() {
    assert_eq!(CollectionStatus::Success, CollectionStatus::Success);
    assert_ne!(CollectionStatus::Success, CollectionStatus::Failed);
}
