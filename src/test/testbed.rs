// NuageLab: Nuage VSP testbed management written in Rust
// Copyright (C) 2022-2023 Tibor Schneider <sctibor@ethz.ch>
//
// This program is free software; you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation; either version 2 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along
// with this program; if not, write to the Free Software Foundation, Inc.,
// 51 Franklin Street, Fifth Floor, Boston, MA 02110-1301 USA.

use std::collections::BTreeMap;

use maplit::btreemap;
use pretty_assertions::assert_eq;

use crate::{
    dut::{Dut, DutKind, TransportError},
    sros::SrosModel,
    ssh::SshError,
    testbed::{DutCategory, RoleKey, SessionError, Testbed},
    topology::{parse_topology_file, DutRecord, HostType},
};

fn record(name: &str, address: &str, component: Option<&str>) -> DutRecord {
    DutRecord {
        host_type: Some(HostType::Linux),
        name: name.to_string(),
        address: address.to_string(),
        component: component.map(str::to_string),
        username: component.map(|_| "admin".to_string()),
        password: component.map(|_| "secret".to_string()),
    }
}

fn role_names(testbed: &Testbed) -> Vec<String> {
    testbed.duts().map(|(key, _)| key.to_string()).collect()
}

#[test]
fn register_requested_components_only() {
    let testbed = Testbed::from_records(
        vec![
            record("exec1", "10.0.0.1", None),
            record("vsc-1", "10.0.0.2", Some("VSC")),
            record("ovs-1", "10.0.0.3", Some("VRS")),
        ],
        vec![DutCategory::Vsc],
    )
    .unwrap();

    assert_eq!(role_names(&testbed), vec!["vsc_1"]);
    let vsc = testbed.dut(DutCategory::Vsc, 1).unwrap();
    assert_eq!(vsc.kind(), DutKind::Controller(SrosModel::Vsc));
    let controller = vsc.as_controller().unwrap();
    assert_eq!(controller.address(), "10.0.0.2");
    assert_eq!(controller.credentials().unwrap().username, "admin");
    assert_eq!(
        controller.credentials().unwrap().password.as_deref(),
        Some("secret")
    );
}

#[test]
fn per_category_counters_are_independent() {
    let testbed = Testbed::from_records(
        vec![
            record("s1", "10.0.1.1", Some("VRS")),
            record("s2", "10.0.1.2", Some("VRS")),
            record("c1", "10.0.2.1", Some("VSC")),
            record("s3", "10.0.1.3", Some("VRS")),
            record("c2", "10.0.2.2", Some("VSC")),
        ],
        vec![DutCategory::Vrs, DutCategory::Vsc],
    )
    .unwrap();

    let mapping: BTreeMap<String, String> = testbed
        .duts()
        .map(|(key, dut)| (key.to_string(), dut.name().to_string()))
        .collect();
    assert_eq!(
        mapping,
        btreemap! {
            "vrs_1".to_string() => "s1".to_string(),
            "vrs_2".to_string() => "s2".to_string(),
            "vrs_3".to_string() => "s3".to_string(),
            "vsc_1".to_string() => "c1".to_string(),
            "vsc_2".to_string() => "c2".to_string(),
        }
    );
    assert_eq!(testbed.duts_of(DutCategory::Vrs).count(), 3);
    assert_eq!(testbed.switches().count(), 3);
}

#[test]
fn orchestrator_is_always_registered() {
    let testbed = Testbed::from_records(
        vec![
            record("osc-1", "10.0.0.4", Some("OSC")),
            record("ovs-1", "10.0.0.3", Some("VRS")),
        ],
        vec![],
    )
    .unwrap();

    assert_eq!(role_names(&testbed), vec!["osc_1"]);
    assert_eq!(
        testbed.dut(DutCategory::Osc, 1).unwrap().kind(),
        DutKind::Orchestrator
    );
}

#[test]
fn registration_requires_the_exact_component_literal() {
    // `VSC-2` classifies as a controller, but is not a registration literal
    let testbed = Testbed::from_records(
        vec![record("vsc-x", "10.0.0.2", Some("VSC-2"))],
        vec![DutCategory::Vsc],
    )
    .unwrap();

    assert_eq!(role_names(&testbed), Vec::<String>::new());
    // the record is still retained
    assert_eq!(testbed.record("vsc-x").unwrap().address, "10.0.0.2");
}

#[test]
fn unknown_components_are_not_registered() {
    let testbed = Testbed::from_records(
        vec![
            record("bogus", "10.0.0.9", Some("NSG")),
            record("ovs-1", "10.0.0.3", Some("VRS")),
        ],
        vec![DutCategory::Vrs],
    )
    .unwrap();

    assert_eq!(role_names(&testbed), vec!["vrs_1"]);
    // records of unknown components are retained, they just get no handle
    assert!(testbed.record("bogus").is_some());
}

#[test]
fn exec_server_is_always_constructed() {
    let testbed = Testbed::from_records(vec![], vec![]).unwrap();
    assert_eq!(testbed.exec_server().name(), "testbed");
    assert_eq!(testbed.exec_server().address(), "exec.lab.local");
    // the configured user is part of the ssh destination
    assert_eq!(testbed.exec_server().ssh().name(), "nuage@exec.lab.local");
    assert!(!testbed.exec_server().ssh().is_open());
}

#[test]
fn records_are_retained_in_file_order() {
    let records = vec![
        record("exec1", "10.0.0.1", None),
        record("ovs-1", "10.0.0.3", Some("VRS")),
        record("vsc-1", "10.0.0.2", Some("VSC")),
    ];
    let testbed = Testbed::from_records(records.clone(), vec![DutCategory::Vrs]).unwrap();
    assert_eq!(testbed.records(), records.as_slice());
    assert_eq!(testbed.record("ovs-1").unwrap().component.as_deref(), Some("VRS"));
    assert_eq!(testbed.record("missing"), None);
}

#[test]
fn role_key_rendering() {
    let key = RoleKey::new(DutCategory::Vsc, 2);
    assert_eq!(key.to_string(), "vsc_2");
    assert_eq!("vsc_2".parse::<RoleKey>(), Ok(key));
    assert_eq!("vsd_1".parse::<RoleKey>(), Ok(RoleKey::new(DutCategory::Vsd, 1)));
    assert!("vsc2".parse::<RoleKey>().is_err());
    assert!("nsg_1".parse::<RoleKey>().is_err());
    assert!("vsc_x".parse::<RoleKey>().is_err());
}

#[test]
fn look_up_devices_by_role() {
    let testbed = Testbed::from_records(
        vec![
            record("s1", "10.0.1.1", Some("VRS")),
            record("s2", "10.0.1.2", Some("VRS")),
        ],
        vec![DutCategory::Vrs],
    )
    .unwrap();

    assert_eq!(testbed.dut_by_role("vrs_2").unwrap().name(), "s2");
    assert!(testbed.dut_by_role("vrs_3").is_none());
    assert!(testbed.dut_by_role("vsc_1").is_none());
    assert!(testbed.dut_by_role("garbage").is_none());
}

#[test]
fn synthetic_vsd_builds_a_testbed() {
    let components = vec![DutCategory::Vsd];
    let records = parse_topology_file("does-not-exist/topology.txt", &components).unwrap();
    let testbed = Testbed::from_records(records, components).unwrap();

    assert_eq!(role_names(&testbed), vec!["vsd_1"]);
    let vsd = testbed
        .dut(DutCategory::Vsd, 1)
        .and_then(|d| d.as_sdn_manager())
        .unwrap();
    assert_eq!(vsd.name(), "vsd-1");
    assert_eq!(vsd.api().base_url(), "https://vsd.lab.local:8443/nuage/api/v6_0");
}

#[test]
fn build_from_the_configuration() {
    let testbed = Testbed::new().unwrap();
    assert_eq!(
        role_names(&testbed),
        vec!["vrs_1", "vrs_2", "vsc_1", "vsd_1", "osc_1"]
    );
    assert_eq!(testbed.dut_by_role("vrs_1").unwrap().name(), "ovs-1");
    assert_eq!(testbed.dut_by_role("vrs_2").unwrap().name(), "ovs-2");
    assert_eq!(testbed.dut_by_role("vsc_1").unwrap().name(), "vsc-1");
    assert_eq!(testbed.dut_by_role("vsd_1").unwrap().name(), "vsd-1");
    assert_eq!(testbed.dut_by_role("osc_1").unwrap().name(), "osc-1");
    assert_eq!(
        testbed.components(),
        &[DutCategory::Vsd, DutCategory::Vsc, DutCategory::Vrs]
    );
}

#[tokio::test]
async fn open_sessions_of_an_empty_testbed() {
    let testbed = Testbed::from_records(vec![], vec![]).unwrap();
    testbed.open_sessions().await.unwrap();
    // the call is idempotent
    testbed.open_sessions().await.unwrap();
}

#[test]
fn session_error_names_the_failing_device() {
    let error = SessionError {
        key: RoleKey::new(DutCategory::Vsc, 1),
        source: TransportError::Ssh(SshError::Timeout),
    };
    let rendered = error.to_string();
    assert!(rendered.contains("vsc_1"), "{rendered}");
}
