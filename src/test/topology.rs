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

use std::io::Write;

use pretty_assertions::assert_eq;
use tempfile::NamedTempFile;

use crate::{
    ssh::Credentials,
    testbed::DutCategory,
    topology::{parse_topology_file, DutRecord, HostType, TopologyError},
};

fn topology(content: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(content.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

fn parse(content: &str, components: &[DutCategory]) -> Vec<DutRecord> {
    let file = topology(content);
    parse_topology_file(file.path(), components).unwrap()
}

#[test]
fn six_field_form() {
    let records = parse(
        "LINUX ovs-1 10.0.0.2 -component VRS -username root -password tigris\n",
        &[DutCategory::Vrs],
    );
    assert_eq!(
        records,
        vec![DutRecord {
            host_type: Some(HostType::Linux),
            name: "ovs-1".to_string(),
            address: "10.0.0.2".to_string(),
            component: Some("VRS".to_string()),
            username: Some("root".to_string()),
            password: Some("tigris".to_string()),
        }]
    );
    assert_eq!(
        records[0].credentials(),
        Some(Credentials::new("root", "tigris"))
    );
}

#[test]
fn three_field_form() {
    let records = parse("LINUX exec1 10.0.0.1\n", &[DutCategory::Vrs]);
    assert_eq!(
        records,
        vec![DutRecord {
            host_type: Some(HostType::Linux),
            name: "exec1".to_string(),
            address: "10.0.0.1".to_string(),
            component: None,
            username: None,
            password: None,
        }]
    );
    assert_eq!(records[0].credentials(), None);
}

#[test]
fn esr_host_type() {
    let records = parse(
        "ESR vsc-1 10.0.0.3 -component VSC -username admin -password admin\n",
        &[DutCategory::Vsc],
    );
    assert_eq!(records[0].host_type, Some(HostType::Esr));
    assert_eq!(records[0].component.as_deref(), Some("VSC"));
}

#[test]
fn flag_order_is_free() {
    let records = parse(
        "LINUX ovs-1 10.0.0.2 -password tigris -component VRS -username root\n",
        &[DutCategory::Vrs],
    );
    assert_eq!(records[0].component.as_deref(), Some("VRS"));
    assert_eq!(records[0].username.as_deref(), Some("root"));
    assert_eq!(records[0].password.as_deref(), Some("tigris"));
}

#[test]
fn partial_flags_read_as_three_field_form() {
    // only one of the three flags is present, so the options do not take effect
    let records = parse(
        "LINUX ovs-1 10.0.0.2 -component VRS\n",
        &[DutCategory::Vrs],
    );
    assert_eq!(records[0].name, "ovs-1");
    assert_eq!(records[0].component, None);
    assert_eq!(records[0].username, None);
    assert_eq!(records[0].password, None);
}

#[test]
fn flag_without_value_drops_the_line() {
    let records = parse(
        "LINUX ovs-1 10.0.0.2 -component VRS -username root -password\n",
        &[DutCategory::Vrs],
    );
    assert_eq!(records, vec![]);
}

#[test]
fn short_lines_are_dropped() {
    assert_eq!(parse("LINUX\n", &[DutCategory::Vrs]), vec![]);
    assert_eq!(parse("LINUX ovs-1\n", &[DutCategory::Vrs]), vec![]);
    assert_eq!(parse("", &[DutCategory::Vsd]), vec![]);
}

#[test]
fn placeholder_lines_are_dropped() {
    let records = parse(
        "None\nLINUX exec1 10.0.0.1\nNone unused 10.0.0.9\n",
        &[DutCategory::Vrs],
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "exec1");
}

#[test]
fn unknown_host_types_are_dropped() {
    let records = parse(
        "CISCO legacy 10.0.0.9\nLINUX exec1 10.0.0.1\nlinux lower 10.0.0.8\n",
        &[DutCategory::Vrs],
    );
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].name, "exec1");
}

#[test]
fn malformed_lines_do_not_abort_the_parse() {
    let content = "\
LINUX exec1 10.0.0.1
garbage
LINUX ovs-1 10.0.0.2 -component VRS -username root -password tigris
LINUX broken 10.0.0.3 -component X -username y -password
ESR vsc-1 10.0.0.4 -component VSC -username admin -password admin
";
    let records = parse(content, &[DutCategory::Vrs]);
    assert_eq!(
        records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["exec1", "ovs-1", "vsc-1"]
    );
}

#[test]
fn missing_file_with_physical_components_fails() {
    for components in [
        vec![DutCategory::Vsc],
        vec![DutCategory::Vrs],
        vec![DutCategory::Vsd, DutCategory::Vsc],
        vec![],
    ] {
        let result = parse_topology_file("does-not-exist/topology.txt", &components);
        assert_eq!(
            result,
            Err(TopologyError::MissingSource(
                "does-not-exist/topology.txt".to_string()
            )),
            "components: {components:?}"
        );
    }
}

#[test]
fn missing_file_with_vsd_only_synthesizes_a_record() {
    for components in [
        vec![DutCategory::Vsd],
        vec![DutCategory::Vsd, DutCategory::Osc],
    ] {
        let records =
            parse_topology_file("does-not-exist/topology.txt", &components).unwrap();
        assert_eq!(
            records,
            vec![DutRecord {
                host_type: None,
                name: "vsd-1".to_string(),
                address: "vsd-1".to_string(),
                component: Some("VSD".to_string()),
                username: None,
                password: None,
            }],
            "components: {components:?}"
        );
    }
}

#[test]
fn fixture_file() {
    let records = parse_topology_file(
        &crate::config::CONFIG.nuage.topology_file,
        &crate::config::CONFIG.nuage.components,
    )
    .unwrap();
    assert_eq!(
        records.iter().map(|r| r.name.as_str()).collect::<Vec<_>>(),
        vec!["exec1", "ovs-1", "ovs-2", "vsc-1", "vsd-1", "osc-1"]
    );
}
