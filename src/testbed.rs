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

//! The testbed: the aggregated set of device handles of a test run.

use std::{collections::BTreeMap, fmt, str::FromStr};

use itertools::Itertools;
use serde::Deserialize;
use thiserror::Error;

use crate::{
    config::CONFIG,
    dut::{Dut, DutHandle, TransportError},
    linux::{LinuxSession, VrsSession},
    ssh::Credentials,
    topology::{parse_topology_file, DutRecord},
    NuageLabError,
};

/// The role categories under which devices are registered in the testbed.
///
/// Devices whose component is exactly one of the category literals are registered under that
/// category when it is requested in the `[nuage] components` configuration. The OpenStack
/// controller is registered whenever it appears in the topology, requested or not.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DutCategory {
    /// VRS virtual switches.
    Vrs,
    /// VSC controllers.
    Vsc,
    /// The VSD.
    Vsd,
    /// The OpenStack controller.
    Osc,
}

impl DutCategory {
    /// All categories, in registration order.
    pub const ALL: [Self; 4] = [Self::Vrs, Self::Vsc, Self::Vsd, Self::Osc];

    /// The component literal a record must declare to be registered under this category.
    fn component_literal(&self) -> &'static str {
        match self {
            Self::Vrs => "VRS",
            Self::Vsc => "VSC",
            Self::Vsd => "VSD",
            Self::Osc => "OSC",
        }
    }

    /// The category a record is registered under, if its component is exactly one of the
    /// category literals. Registration compares for equality, unlike the prefix match of the
    /// device classification: a component like `VSC-2` still constructs a controller handle,
    /// but is never registered automatically.
    pub(crate) fn of_record(record: &DutRecord) -> Option<Self> {
        let component = record.component.as_deref()?;
        Self::ALL
            .into_iter()
            .find(|c| c.component_literal() == component)
    }

    /// Whether devices of this category are registered regardless of the requested set.
    fn always_included(&self) -> bool {
        matches!(self, Self::Osc)
    }
}

impl fmt::Display for DutCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Vrs => "vrs",
            Self::Vsc => "vsc",
            Self::Vsd => "vsd",
            Self::Osc => "osc",
        })
    }
}

impl FromStr for DutCategory {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vrs" => Ok(Self::Vrs),
            "vsc" => Ok(Self::Vsc),
            "vsd" => Ok(Self::Vsd),
            "osc" => Ok(Self::Osc),
            _ => Err(()),
        }
    }
}

/// The key of a registered device: its role category plus a per-category counter starting at
/// 1. The rendered form is the role name by which tests address devices, like `vsc_1` or
/// `vrs_2`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RoleKey {
    /// The role category.
    pub category: DutCategory,
    /// Position among the devices of the same category, in topology file order, starting
    /// at 1.
    pub index: usize,
}

impl RoleKey {
    /// Create a new role key.
    pub fn new(category: DutCategory, index: usize) -> Self {
        Self { category, index }
    }
}

impl fmt::Display for RoleKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}", self.category, self.index)
    }
}

impl FromStr for RoleKey {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (category, index) = s.split_once('_').ok_or(())?;
        Ok(Self {
            category: category.parse()?,
            index: index.parse().map_err(|_| ())?,
        })
    }
}

/// The aggregated set of device handles of a test run.
///
/// A testbed is built once, either from the global configuration via [`Testbed::new`] or from
/// an explicit record list via [`Testbed::from_records`], and is read-only afterwards.
/// Building a testbed performs no I/O beyond reading the topology file; the device sessions
/// are established separately through [`Testbed::open_sessions`]. There is no explicit
/// teardown: the SSH control masters expire on their own, and the VSD session ends with the
/// process.
///
/// The registry is an explicit map from [`RoleKey`] to [`DutHandle`]. Devices of the same
/// category are numbered in topology file order, starting at 1, so the key assignment is
/// deterministic for a given file.
#[derive(Debug)]
pub struct Testbed {
    /// Handle to the execution server, constructed unconditionally from the configuration.
    exec_server: LinuxSession,
    /// The registered devices.
    duts: BTreeMap<RoleKey, DutHandle>,
    /// The retained topology records the testbed was built from.
    records: Vec<DutRecord>,
    /// The requested component categories.
    components: Vec<DutCategory>,
}

impl Testbed {
    /// Build the testbed from the global configuration: parse the configured topology file
    /// and register all requested devices.
    pub fn new() -> Result<Self, NuageLabError> {
        let records = parse_topology_file(&CONFIG.nuage.topology_file, &CONFIG.nuage.components)?;
        Self::from_records(records, CONFIG.nuage.components.clone())
    }

    /// Build the testbed from an explicit record list and the requested component set.
    ///
    /// Records are visited in order. A record is registered when its component is exactly a
    /// category literal and that category is requested (the OpenStack controller is always
    /// registered); a handle of the matching kind is constructed for it. Records of other
    /// components are kept in [`Testbed::records`] but get no handle.
    pub fn from_records(
        records: Vec<DutRecord>,
        components: Vec<DutCategory>,
    ) -> Result<Self, NuageLabError> {
        let exec_server = LinuxSession::new(
            &CONFIG.exec_server.ssh_name,
            "testbed",
            CONFIG.exec_server.user.clone().map(Credentials::user),
        );

        let mut duts = BTreeMap::new();
        let mut counters: BTreeMap<DutCategory, usize> = BTreeMap::new();

        for record in &records {
            let category = match DutCategory::of_record(record) {
                Some(category) => category,
                None => continue,
            };
            if !category.always_included() && !components.contains(&category) {
                continue;
            }
            let index = counters
                .entry(category)
                .and_modify(|n| *n += 1)
                .or_insert(1);
            let key = RoleKey::new(category, *index);
            log::trace!("[{key}] registering device `{}`", record.name);
            duts.insert(key, DutHandle::from_record(record)?);
        }

        log::debug!(
            "testbed built with {} devices: {}",
            duts.len(),
            duts.keys().join(", ")
        );

        Ok(Self {
            exec_server,
            duts,
            records,
            components,
        })
    }

    /// Handle to the execution server.
    pub fn exec_server(&self) -> &LinuxSession {
        &self.exec_server
    }

    /// The requested component categories.
    pub fn components(&self) -> &[DutCategory] {
        &self.components
    }

    /// Look up a device by its role key.
    pub fn get(&self, key: &RoleKey) -> Option<&DutHandle> {
        self.duts.get(key)
    }

    /// Look up a device by category and per-category index (starting at 1).
    pub fn dut(&self, category: DutCategory, index: usize) -> Option<&DutHandle> {
        self.duts.get(&RoleKey::new(category, index))
    }

    /// Look up a device by its rendered role name, like `vsc_1`.
    pub fn dut_by_role(&self, role: &str) -> Option<&DutHandle> {
        let key: RoleKey = role.parse().ok()?;
        self.duts.get(&key)
    }

    /// Iterate over all registered devices in key order.
    pub fn duts(&self) -> impl Iterator<Item = (&RoleKey, &DutHandle)> {
        self.duts.iter()
    }

    /// Iterate over the registered devices of one category, in index order.
    pub fn duts_of(&self, category: DutCategory) -> impl Iterator<Item = (&RoleKey, &DutHandle)> {
        self.duts
            .iter()
            .filter(move |(key, _)| key.category == category)
    }

    /// All registered VRS switch sessions, in index order.
    pub fn switches(&self) -> impl Iterator<Item = &VrsSession> {
        self.duts_of(DutCategory::Vrs)
            .filter_map(|(_, dut)| dut.as_switch())
    }

    /// The retained topology records the testbed was built from, in file order.
    pub fn records(&self) -> &[DutRecord] {
        &self.records
    }

    /// Look up a topology record by device name.
    pub fn record(&self, name: &str) -> Option<&DutRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    /// Establish the sessions of all registered devices, sequentially and in key order.
    ///
    /// The call is idempotent: sessions that are already open are re-validated, never opened
    /// a second time. It is also fail-fast: the first device whose session cannot be
    /// established aborts the whole call with a [`SessionError`] naming its role key, leaving
    /// the sessions opened so far untouched.
    pub async fn open_sessions(&self) -> Result<(), SessionError> {
        for (key, dut) in &self.duts {
            log::debug!("[{key}] opening the session with `{}`", dut.name());
            dut.open_session().await.map_err(|source| SessionError {
                key: *key,
                source,
            })?;
        }
        Ok(())
    }
}

/// A device session could not be established during
/// [`open_sessions`](Testbed::open_sessions).
#[derive(Debug, Error)]
#[error("Cannot open the session of `{key}`: {source}")]
pub struct SessionError {
    /// Role key of the failing device, like `vsc_1`.
    pub key: RoleKey,
    /// The underlying transport error.
    #[source]
    pub source: TransportError,
}
