//! Field mapping tests
//!
//! Every resource is mapped from literal Nitro JSON, without a registry or a
//! network, and checked for labels, values and decode tolerance.

use netscaler_exporter::collectors::aaa::{map_aaa, AAA_SCHEMA};
use netscaler_exporter::collectors::cs_vserver::{map_cs_vservers, CS_VSERVER_SCHEMA};
use netscaler_exporter::collectors::gslb::{
    map_gslb_services, map_gslb_vservers, GSLB_SERVICE_SCHEMA, GSLB_VSERVER_SCHEMA,
};
use netscaler_exporter::collectors::interface::{map_interfaces, INTERFACE_SCHEMA};
use netscaler_exporter::collectors::lb_vserver::{map_lb_vservers, LB_VSERVER_SCHEMA};
use netscaler_exporter::collectors::mapper::{state_value, MetricKind};
use netscaler_exporter::collectors::service::{map_services, SERVICE_SCHEMA};
use netscaler_exporter::collectors::service_group::{
    map_service_group_members, member_targets, MemberRecord, MemberTarget,
};
use netscaler_exporter::collectors::system::{map_license, map_system, SYSTEM_SCHEMA};
use netscaler_exporter::collectors::vpn_vserver::{map_vpn_vservers, VPN_VSERVER_SCHEMA};
use netscaler_exporter::collectors::SCHEMAS;
use netscaler_exporter::error::ExporterError;
use netscaler_exporter::nitro::types::*;
use proptest::prelude::*;
use serde_json::{json, Value};

const INSTANCE: &str = "https://ns1.example.net";

fn records<T: serde::de::DeserializeOwned>(key: &str, body: Value) -> Vec<T> {
    let mut envelope: NitroEnvelope = serde_json::from_value(body).expect("Envelope should parse");
    let records = envelope.take_records(key).expect("Records should decode");
    assert!(records.rejected.is_empty(), "{:?}", records.rejected);
    records.items
}

#[test]
fn test_lb_vserver_mapping() {
    // Given: Two vservers, one UP and one DOWN
    let vservers: Vec<VirtualServerStats> = records(
        "lbvserver",
        json!({
            "errorcode": 0,
            "lbvserver": [
                {"name": "vs_web", "state": "UP", "totalrequests": "1500", "vslbhealth": 100},
                {"name": "vs_api", "state": "DOWN", "totalrequests": "0"}
            ]
        }),
    );

    // When
    let set = map_lb_vservers(INSTANCE, &vservers);

    // Then: One observation per family per record
    assert_eq!(
        set.observations.len(),
        LB_VSERVER_SCHEMA.families().len() * 2
    );
    assert!(set.decode_errors.is_empty());
    assert_eq!(
        set.value_of("virtual_servers_state", &[INSTANCE, "vs_web"]),
        Some(1.0)
    );
    assert_eq!(
        set.value_of("virtual_servers_state", &[INSTANCE, "vs_api"]),
        Some(0.0)
    );
    assert_eq!(
        set.value_of("virtual_servers_total_requests", &[INSTANCE, "vs_web"]),
        Some(1500.0)
    );
    assert_eq!(
        set.value_of("virtual_servers_health", &[INSTANCE, "vs_web"]),
        Some(100.0)
    );
    // Absent attribute is a zero without a fault
    assert_eq!(
        set.value_of("virtual_servers_health", &[INSTANCE, "vs_api"]),
        Some(0.0)
    );
}

#[test]
fn test_malformed_value_is_zero_and_reported() {
    // Given: A counter that is not a number
    let vservers: Vec<VirtualServerStats> = records(
        "lbvserver",
        json!({"lbvserver": [{"name": "vs1", "state": "UP", "totalrequests": "n/a"}]}),
    );

    // When
    let set = map_lb_vservers(INSTANCE, &vservers);

    // Then: The value is observed as 0 and one decode error is reported
    assert_eq!(
        set.value_of("virtual_servers_total_requests", &[INSTANCE, "vs1"]),
        Some(0.0)
    );
    assert_eq!(set.decode_errors.len(), 1);
    match &set.decode_errors[0] {
        ExporterError::Decode { field, value } => {
            assert_eq!(field, "totalrequests");
            assert!(value.contains("n/a"));
        }
        other => panic!("Expected Decode error, got {:?}", other),
    }
    // The rest of the record still maps
    assert_eq!(
        set.value_of("virtual_servers_state", &[INSTANCE, "vs1"]),
        Some(1.0)
    );
}

#[test]
fn test_null_value_is_zero_without_fault() {
    let vservers: Vec<VirtualServerStats> = records(
        "lbvserver",
        json!({"lbvserver": [{"name": "vs1", "state": "UP", "tothits": null}]}),
    );

    let set = map_lb_vservers(INSTANCE, &vservers);

    assert_eq!(
        set.value_of("virtual_servers_total_hits", &[INSTANCE, "vs1"]),
        Some(0.0)
    );
    assert!(set.decode_errors.is_empty());
}

#[test]
fn test_system_mapping() {
    // Given: stat/ns with mixed string and numeric encodings
    let stats: Vec<SystemStats> = records(
        "ns",
        json!({"ns": {"cpuusagepcnt": "23.5", "memusagepcnt": 61, "totrxmbits": "1024"}}),
    );

    // When
    let set = map_system(INSTANCE, stats.first());

    // Then: Only ns_instance labels the system families
    assert_eq!(set.observations.len(), SYSTEM_SCHEMA.fields.len());
    assert_eq!(set.value_of("cpu_usage", &[INSTANCE]), Some(23.5));
    assert_eq!(set.value_of("mem_usage", &[INSTANCE]), Some(61.0));
    assert_eq!(set.value_of("total_received_mb", &[INSTANCE]), Some(1024.0));
}

#[test]
fn test_absent_single_object_maps_to_nothing() {
    assert!(map_system(INSTANCE, None).observations.is_empty());
    assert!(map_license(INSTANCE, None).observations.is_empty());
    assert!(map_aaa(INSTANCE, None).observations.is_empty());
}

#[test]
fn test_license_mapping() {
    let license: Vec<License> = records("nslicense", json!({"nslicense": {"modelid": "1000"}}));

    let set = map_license(INSTANCE, license.first());

    assert_eq!(set.value_of("model_id", &[INSTANCE]), Some(1000.0));
}

#[test]
fn test_interface_mapping_uses_id_and_alias() {
    let interfaces: Vec<InterfaceStats> = records(
        "Interface",
        json!({"Interface": [
            {"id": "0/1", "interfacealias": "mgmt", "totrxbytes": "2048"},
            {"id": "1/1", "tottxpkts": 7}
        ]}),
    );

    let set = map_interfaces(INSTANCE, &interfaces);

    assert_eq!(
        set.observations.len(),
        INTERFACE_SCHEMA.families().len() * 2
    );
    assert_eq!(
        set.value_of("interfaces_received_bytes", &[INSTANCE, "0/1", "mgmt"]),
        Some(2048.0)
    );
    // Missing alias is an empty label value
    assert_eq!(
        set.value_of("interfaces_transmitted_packets", &[INSTANCE, "1/1", ""]),
        Some(7.0)
    );
}

#[test]
fn test_service_mapping() {
    let services: Vec<ServiceStats> = records(
        "service",
        json!({"service": [{"name": "svc_db", "state": "OUT OF SERVICE", "totalrequests": "42"}]}),
    );

    let set = map_services(INSTANCE, &services);

    assert_eq!(set.observations.len(), SERVICE_SCHEMA.families().len());
    assert_eq!(set.value_of("service_state", &[INSTANCE, "svc_db"]), Some(0.0));
    assert_eq!(
        set.value_of("service_total_requests", &[INSTANCE, "svc_db"]),
        Some(42.0)
    );
}

#[test]
fn test_gslb_mapping() {
    let services: Vec<GslbServiceStats> = records(
        "gslbservice",
        json!({"gslbservice": [{"servicename": "gsvc1", "state": "UP", "totalrequests": "3"}]}),
    );
    let vservers: Vec<VirtualServerStats> = records(
        "gslbvserver",
        json!({"gslbvserver": [{"name": "gvs1", "state": "DOWN"}]}),
    );

    let service_set = map_gslb_services(INSTANCE, &services);
    let vserver_set = map_gslb_vservers(INSTANCE, &vservers);

    assert_eq!(
        service_set.observations.len(),
        GSLB_SERVICE_SCHEMA.families().len()
    );
    assert_eq!(
        service_set.value_of("gslb_service_state", &[INSTANCE, "gsvc1"]),
        Some(1.0)
    );
    assert_eq!(
        service_set.value_of("gslb_service_total_requests", &[INSTANCE, "gsvc1"]),
        Some(3.0)
    );
    assert_eq!(
        vserver_set.observations.len(),
        GSLB_VSERVER_SCHEMA.families().len()
    );
    assert_eq!(
        vserver_set.value_of("gslb_virtual_servers_state", &[INSTANCE, "gvs1"]),
        Some(0.0)
    );
}

#[test]
fn test_cs_and_vpn_mapping() {
    let cs: Vec<VirtualServerStats> = records(
        "csvserver",
        json!({"csvserver": [{"name": "cs1", "state": "UP", "tothits": "9"}]}),
    );
    let vpn: Vec<VirtualServerStats> = records(
        "vpnvserver",
        json!({"vpnvserver": [{"name": "gw1", "state": "UP", "totalrequests": 11}]}),
    );

    let cs_set = map_cs_vservers(INSTANCE, &cs);
    let vpn_set = map_vpn_vservers(INSTANCE, &vpn);

    assert_eq!(cs_set.observations.len(), CS_VSERVER_SCHEMA.families().len());
    assert_eq!(
        cs_set.value_of("cs_virtual_servers_total_hits", &[INSTANCE, "cs1"]),
        Some(9.0)
    );
    assert_eq!(vpn_set.observations.len(), VPN_VSERVER_SCHEMA.families().len());
    assert_eq!(
        vpn_set.value_of("vpn_virtual_servers_total_requests", &[INSTANCE, "gw1"]),
        Some(11.0)
    );
    assert_eq!(
        vpn_set.value_of("vpn_virtual_servers_state", &[INSTANCE, "gw1"]),
        Some(1.0)
    );
}

#[test]
fn test_aaa_mapping() {
    let stats: Vec<AaaStats> = records(
        "aaa",
        json!({"aaa": {"aaaauthsuccess": "120", "aaaauthfail": "3"}}),
    );

    let set = map_aaa(INSTANCE, stats.first());

    assert_eq!(set.observations.len(), AAA_SCHEMA.fields.len());
    assert_eq!(set.value_of("aaa_auth_success", &[INSTANCE]), Some(120.0));
    assert_eq!(set.value_of("aaa_auth_fail", &[INSTANCE]), Some(3.0));
}

#[test]
fn test_member_targets_skip_wildcard_port() {
    // Given: Three bindings, one on the wildcard port
    let bindings: Vec<ServiceGroupMemberBinding> = records(
        "servicegroup_servicegroupmember_binding",
        json!({"servicegroup_servicegroupmember_binding": [
            {"servicegroupname": "sg", "servername": "10.0.0.1", "port": 80},
            {"servicegroupname": "sg", "servername": "10.0.0.2", "port": 65535},
            {"servicegroupname": "sg", "servername": "10.0.0.3", "port": "443"}
        ]}),
    );

    // When
    let (targets, errors) = member_targets("sg", bindings);

    // Then
    assert!(errors.is_empty());
    assert_eq!(
        targets,
        vec![
            MemberTarget {
                group: "sg".to_string(),
                server: "10.0.0.1".to_string(),
                port: 80
            },
            MemberTarget {
                group: "sg".to_string(),
                server: "10.0.0.3".to_string(),
                port: 443
            },
        ]
    );
}

#[test]
fn test_member_targets_report_invalid_port() {
    let bindings: Vec<ServiceGroupMemberBinding> = records(
        "servicegroup_servicegroupmember_binding",
        json!({"servicegroup_servicegroupmember_binding": [
            {"servername": "10.0.0.1", "port": "http"},
            {"servername": "10.0.0.2", "port": 70000},
            {"servername": "10.0.0.3", "port": 8080}
        ]}),
    );

    let (targets, errors) = member_targets("sg", bindings);

    assert_eq!(targets.len(), 1);
    assert_eq!(targets[0].port, 8080);
    assert_eq!(errors.len(), 2);
    assert!(errors.iter().all(|e| e.kind() == "decode"));
}

#[test]
fn test_service_group_member_mapping() {
    let stats: Vec<ServiceGroupMemberStats> = records(
        "servicegroupmember",
        json!({"servicegroupmember": [{"state": "UP", "totalrequests": "17", "maxclients": 0}]}),
    );
    let member = MemberRecord::new(
        MemberTarget {
            group: "sg_web".to_string(),
            server: "10.0.0.5".to_string(),
            port: 8080,
        },
        stats[0].clone(),
    );

    let set = map_service_group_members(INSTANCE, &[member]);

    let labels = [INSTANCE, "sg_web", "10.0.0.5", "8080"];
    assert_eq!(set.value_of("servicegroup_state", &labels), Some(1.0));
    assert_eq!(set.value_of("servicegroup_total_requests", &labels), Some(17.0));
    assert_eq!(set.value_of("servicegroup_max_clients", &labels), Some(0.0));
}

#[test]
fn test_device_totals_are_counters() {
    for schema in SCHEMAS {
        for field in schema.fields {
            if field.metric.contains("_total_") {
                assert_eq!(
                    field.kind,
                    MetricKind::Counter,
                    "{} should be a counter",
                    field.metric
                );
            }
        }
    }
}

#[test]
fn test_state_families_lead_and_carry_resource_labels() {
    for schema in SCHEMAS {
        let labels = schema.label_names();
        assert_eq!(labels[0], "ns_instance");
        assert_eq!(labels.len(), schema.labels.len() + 1);
        if let Some(state) = schema.state {
            assert_eq!(schema.families()[0].metric, state.metric);
            assert_eq!(schema.families()[0].kind, MetricKind::Gauge);
        }
    }
}

proptest! {
    #[test]
    fn prop_only_exact_up_is_one(state in ".*") {
        let expected = if state == "UP" { 1.0 } else { 0.0 };
        prop_assert_eq!(state_value(&state), expected);
    }

    #[test]
    fn prop_case_variants_of_up_are_zero(state in "[uU][pP]") {
        prop_assume!(state != "UP");
        prop_assert_eq!(state_value(&state), 0.0);
    }

    #[test]
    fn prop_numeric_strings_decode(value in -1.0e12f64..1.0e12f64) {
        let decoded = decode_number("x", &json!(value.to_string())).expect("decodes");
        prop_assert!((decoded - value).abs() <= value.abs() * 1e-12);
    }
}
