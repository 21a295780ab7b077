use netscaler_exporter::collectors::lb_vserver::{map_lb_vservers, LB_VSERVER_SCHEMA};
use netscaler_exporter::collectors::system::SYSTEM_SCHEMA;
use netscaler_exporter::collectors::SCHEMAS;
use netscaler_exporter::metrics::NetscalerMetrics;
use netscaler_exporter::nitro::types::VirtualServerStats;
use serde_json::json;

const INSTANCE: &str = "https://ns1.example.net";

fn vservers(body: serde_json::Value) -> Vec<VirtualServerStats> {
    serde_json::from_value(body).expect("Failed to build vservers")
}

#[test]
fn test_metrics_registration() {
    // Verify that every family can be created and registered without a name clash
    let metrics = NetscalerMetrics::new().expect("Failed to create metrics");

    // Vector families only render once a child exists
    metrics.set_up(INSTANCE, true);
    let output = metrics.render().expect("Failed to render metrics");
    assert!(output.contains("netscaler_up{ns_instance=\"https://ns1.example.net\"} 1"));
    assert!(!output.contains("netscaler_netscaler_"));

    let families = SCHEMAS.iter().map(|s| s.families().len()).sum::<usize>();
    assert!(families > 100, "Expected the full resource catalogue, got {}", families);
}

#[test]
fn test_publish_sets_values_and_types() {
    let metrics = NetscalerMetrics::new().expect("Failed to create metrics");
    let set = map_lb_vservers(
        INSTANCE,
        &vservers(json!([{"name": "vs1", "state": "UP", "totalrequests": "1500", "vslbhealth": "75"}])),
    );

    metrics.publish(INSTANCE, &LB_VSERVER_SCHEMA, &set);

    let output = metrics.render().expect("Failed to render metrics");
    assert!(output.contains("# TYPE netscaler_virtual_servers_total_requests counter"));
    assert!(output.contains("# TYPE netscaler_virtual_servers_health gauge"));
    assert!(output.contains(
        "netscaler_virtual_servers_total_requests{ns_instance=\"https://ns1.example.net\",virtual_server=\"vs1\"} 1500"
    ));
    assert!(output.contains(
        "netscaler_virtual_servers_health{ns_instance=\"https://ns1.example.net\",virtual_server=\"vs1\"} 75"
    ));
}

#[test]
fn test_publish_resets_only_its_own_resource() {
    let metrics = NetscalerMetrics::new().expect("Failed to create metrics");
    let lb = map_lb_vservers(INSTANCE, &vservers(json!([{"name": "vs1", "state": "UP"}])));
    metrics.publish(INSTANCE, &LB_VSERVER_SCHEMA, &lb);

    // Publishing an empty system set leaves the lbvserver families alone
    metrics.publish(INSTANCE, &SYSTEM_SCHEMA, &Default::default());

    let output = metrics.render().expect("Failed to render metrics");
    assert!(output.contains("netscaler_virtual_servers_state{"));
}

#[test]
fn test_self_metrics() {
    let metrics = NetscalerMetrics::new().expect("Failed to create metrics");

    metrics.set_up(INSTANCE, false);
    metrics.set_scrape_duration(INSTANCE, 0.25);
    metrics.record_fetch_error(INSTANCE, "stat/aaa");
    metrics.record_fetch_error(INSTANCE, "stat/aaa");
    metrics.record_decode_errors(INSTANCE, "stat/ns", 3);

    let output = metrics.render().expect("Failed to render metrics");
    assert!(output.contains("netscaler_up{ns_instance=\"https://ns1.example.net\"} 0"));
    assert!(output.contains("netscaler_scrape_duration_seconds{ns_instance=\"https://ns1.example.net\"} 0.25"));
    assert!(output.contains(
        "netscaler_exporter_fetch_errors_total{ns_instance=\"https://ns1.example.net\",resource=\"stat/aaa\"} 2"
    ));
    assert!(output.contains(
        "netscaler_exporter_decode_errors_total{ns_instance=\"https://ns1.example.net\",resource=\"stat/ns\"} 3"
    ));
}

#[test]
fn test_negative_device_total_is_clamped() {
    // Counters cannot go down; a bogus negative total is exported as zero
    let metrics = NetscalerMetrics::new().expect("Failed to create metrics");
    let set = map_lb_vservers(
        INSTANCE,
        &vservers(json!([{"name": "vs1", "state": "UP", "tothits": "-5"}])),
    );

    metrics.publish(INSTANCE, &LB_VSERVER_SCHEMA, &set);

    let output = metrics.render().expect("Failed to render metrics");
    assert!(output.contains(
        "netscaler_virtual_servers_total_hits{ns_instance=\"https://ns1.example.net\",virtual_server=\"vs1\"} 0"
    ));
}

#[test]
fn test_separate_registries_are_independent() {
    let first = NetscalerMetrics::new().expect("Failed to create metrics");
    let second = NetscalerMetrics::new().expect("Failed to create metrics");

    first.set_up("https://a.example.net", true);
    second.set_up("https://b.example.net", false);

    let a = first.render().expect("render");
    let b = second.render().expect("render");
    assert!(a.contains("a.example.net") && !a.contains("b.example.net"));
    assert!(b.contains("b.example.net") && !b.contains("a.example.net"));
}
