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

use pretty_assertions::assert_eq;

use crate::{
    classify,
    dut::{Dut, DutHandle, DutKind},
    sros::SrosModel,
    ssh::Credentials,
    topology::{DutRecord, HostType},
    NuageLabError,
};

fn record(name: &str, address: &str, component: Option<&str>) -> DutRecord {
    DutRecord {
        host_type: Some(HostType::Linux),
        name: name.to_string(),
        address: address.to_string(),
        component: component.map(str::to_string),
        username: component.map(|_| "root".to_string()),
        password: component.map(|_| "tigris".to_string()),
    }
}

#[test]
fn classification_table() {
    assert_eq!(classify("VRS"), Some(DutKind::Switch));
    assert_eq!(classify("VRS-2"), Some(DutKind::Switch));
    assert_eq!(classify("VSD"), Some(DutKind::SdnManager));
    assert_eq!(classify("VSD-cluster"), Some(DutKind::SdnManager));
    assert_eq!(classify("7750"), Some(DutKind::Controller(SrosModel::Sr7750)));
    assert_eq!(classify("VSG"), Some(DutKind::Controller(SrosModel::Vsg)));
    assert_eq!(classify("VSC"), Some(DutKind::Controller(SrosModel::Vsc)));
    assert_eq!(classify("VSC-2"), Some(DutKind::Controller(SrosModel::Vsc)));
    assert_eq!(classify("OSC"), Some(DutKind::Orchestrator));
    assert_eq!(classify("UTILS"), Some(DutKind::Utility));
    assert_eq!(classify("UTILS-1"), Some(DutKind::Utility));
}

#[test]
fn classification_is_anchored_and_case_sensitive() {
    assert_eq!(classify("vrs"), None);
    assert_eq!(classify("vsc-1"), None);
    assert_eq!(classify("XVSC"), None);
    assert_eq!(classify("my-7750"), None);
    assert_eq!(classify("NSG"), None);
    assert_eq!(classify("TRAFFIC"), None);
    assert_eq!(classify(""), None);
}

#[test]
fn classification_priority() {
    // the first matching pattern decides
    assert_eq!(classify("7750-VSG"), Some(DutKind::Controller(SrosModel::Sr7750)));
    assert_eq!(classify("VSG-7750"), Some(DutKind::Controller(SrosModel::Vsg)));
    assert_eq!(classify("VSDVSC"), Some(DutKind::SdnManager));
}

#[test]
fn classification_is_pure() {
    assert_eq!(classify("VSC-2"), classify("VSC-2"));
    assert_eq!(classify("bogus"), classify("bogus"));
}

#[test]
fn switch_handle() {
    let handle = DutHandle::from_record(&record("ovs-1", "10.0.0.2", Some("VRS"))).unwrap();
    assert_eq!(handle.kind(), DutKind::Switch);
    assert_eq!(handle.name(), "ovs-1");
    let switch = handle.as_switch().unwrap();
    assert_eq!(switch.address(), "10.0.0.2");
    assert_eq!(
        switch.credentials(),
        Some(&Credentials::new("root", "tigris"))
    );
    assert!(!switch.ssh().is_open());
    assert!(handle.as_controller().is_none());
}

#[test]
fn controller_handle() {
    let handle = DutHandle::from_record(&record("vsc-1", "10.0.0.3", Some("VSC"))).unwrap();
    assert_eq!(handle.kind(), DutKind::Controller(SrosModel::Vsc));
    let controller = handle.as_controller().unwrap();
    assert_eq!(controller.model(), SrosModel::Vsc);
    assert_eq!(controller.address(), "10.0.0.3");
    // credentialed sessions connect as user@host
    assert_eq!(controller.ssh().name(), "root@10.0.0.3");
}

#[test]
fn gateway_handles() {
    let sr = DutHandle::from_record(&record("gw-1", "10.0.0.4", Some("7750-1"))).unwrap();
    assert_eq!(sr.kind(), DutKind::Controller(SrosModel::Sr7750));
    let vsg = DutHandle::from_record(&record("gw-2", "10.0.0.5", Some("VSG-1"))).unwrap();
    assert_eq!(vsg.kind(), DutKind::Controller(SrosModel::Vsg));
}

#[test]
fn orchestrator_handle() {
    let handle = DutHandle::from_record(&record("osc-1", "10.0.0.6", Some("OSC"))).unwrap();
    assert_eq!(handle.kind(), DutKind::Orchestrator);
    let osc = handle.as_orchestrator().unwrap();
    // the API client is wired up at construction, against the configured endpoint
    assert_eq!(osc.api.auth_url(), "http://osc.lab.local:5000/v2.0");
}

#[test]
fn utility_handle() {
    let handle = DutHandle::from_record(&record("utils-1", "10.0.0.7", Some("UTILS"))).unwrap();
    assert_eq!(handle.kind(), DutKind::Utility);
    assert_eq!(handle.as_utility().unwrap().name(), "utils-1");
}

#[test]
fn sdn_manager_endpoint_comes_from_the_configuration() {
    // the address column of the record is ignored for the VSD
    let handle = DutHandle::from_record(&record("vsd-1", "10.99.99.99", Some("VSD"))).unwrap();
    assert_eq!(handle.kind(), DutKind::SdnManager);
    let vsd = handle.as_sdn_manager().unwrap();
    assert_eq!(
        vsd.api().base_url(),
        "https://vsd.lab.local:8443/nuage/api/v6_0"
    );
    assert_eq!(vsd.api().user(), "csproot");
}

#[test]
fn unsupported_component() {
    let err = DutHandle::from_record(&record("nsg-1", "10.0.0.8", Some("NSG"))).unwrap_err();
    match err {
        NuageLabError::UnsupportedComponent(e) => {
            assert_eq!(e.name, "nsg-1");
            assert_eq!(e.component, "NSG");
        }
        e => panic!("expected an unsupported component error, got {e}"),
    }
}

#[test]
fn missing_component_is_unsupported() {
    let err = DutHandle::from_record(&record("exec1", "10.0.0.1", None)).unwrap_err();
    match err {
        NuageLabError::UnsupportedComponent(e) => {
            assert_eq!(e.name, "exec1");
            assert_eq!(e.component, "");
        }
        e => panic!("expected an unsupported component error, got {e}"),
    }
}
