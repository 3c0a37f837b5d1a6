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

//! Parsing of the topology description file.
//!
//! The topology file describes one device per line, using whitespace-separated fields:
//!
//! ```text
//! TYPE NAME ADDRESS [-component COMP -username USER -password PASS]
//! ```
//!
//! For example:
//!
//! ```text
//! LINUX exec1 10.10.100.1
//! LINUX ovs-1 10.10.100.11 -component VRS -username root -password tigris
//! ESR   vsc-1 10.10.100.21 -component VSC -username admin -password admin
//! ```
//!
//! The three option flags only take effect when all of them are present; otherwise the line is
//! read in its three-field form. A line whose first field is the literal `None` marks an empty
//! slot in the file. Malformed lines never abort the parse; they are skipped, just like lines
//! of an unknown host type.

use std::{fmt, path::Path, str::FromStr};

use thiserror::Error;

use crate::{ssh::Credentials, testbed::DutCategory};

/// Host categories that may appear in the first field of a topology line. Lines of any other
/// host type are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HostType {
    /// A Linux machine: hypervisors, the OpenStack controller, or utility hosts.
    Linux,
    /// An ESR network element: SROS-based controllers and gateways.
    Esr,
}

impl fmt::Display for HostType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Linux => "LINUX",
            Self::Esr => "ESR",
        })
    }
}

impl FromStr for HostType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "LINUX" => Ok(Self::Linux),
            "ESR" => Ok(Self::Esr),
            _ => Err(()),
        }
    }
}

/// A single entry of the topology file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DutRecord {
    /// Host category of the entry. Only the synthetic VSD record carries no host type.
    pub host_type: Option<HostType>,
    /// Device name.
    pub name: String,
    /// Address of the device, either an IP address or a resolvable hostname.
    pub address: String,
    /// The declared component (e.g. `VRS`, `VSC`, `VSD-cluster`), if any.
    pub component: Option<String>,
    /// Login user name, present only in the six-field line form.
    pub username: Option<String>,
    /// Login password, present only in the six-field line form.
    pub password: Option<String>,
}

impl DutRecord {
    /// The login credentials of the record, if the six-field line form provided them.
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: self.password.clone(),
        })
    }

    /// The record used when only the VSD is requested and no topology file exists. The VSD
    /// endpoint comes from the configuration, so a placeholder address is sufficient.
    fn synthetic_vsd() -> Self {
        Self {
            host_type: None,
            name: "vsd-1".to_string(),
            address: "vsd-1".to_string(),
            component: Some("VSD".to_string()),
            username: None,
            password: None,
        }
    }
}

/// A tokenized topology line, before the host type is checked.
struct RawEntry {
    host_type: String,
    name: String,
    address: String,
    component: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

/// The option flags of the six-field line form. All of them must be present for the options to
/// take effect.
const FLAGS: [&str; 3] = ["-component", "-username", "-password"];

/// Tokenize a single topology line. Returns `None` both for the `None` placeholder and for any
/// malformed line.
fn parse_line(line: &str) -> Option<RawEntry> {
    let tokens: Vec<&str> = line.split_whitespace().collect();

    if *tokens.first()? == "None" {
        return None;
    }

    let host_type = tokens.first()?.to_string();
    let name = tokens.get(1)?.to_string();
    let address = tokens.get(2)?.to_string();

    let (component, username, password) = if FLAGS.iter().all(|f| tokens.contains(f)) {
        let value_of = |flag: &str| {
            tokens
                .iter()
                .position(|t| *t == flag)
                .and_then(|i| tokens.get(i + 1))
                .map(|v| v.to_string())
        };
        // every flag must be followed by its value
        (
            Some(value_of("-component")?),
            Some(value_of("-username")?),
            Some(value_of("-password")?),
        )
    } else {
        (None, None, None)
    };

    Some(RawEntry {
        host_type,
        name,
        address,
        component,
        username,
        password,
    })
}

/// Parse the topology description file into the list of retained DUT records.
///
/// Records are kept in file order. Lines that fail to tokenize and lines of an unrecognized
/// host type are skipped without aborting the parse.
///
/// When the file cannot be read, the requested component set decides the outcome: categories
/// that live on physical devices (`vsc`, `vrs`) require a topology file, so the parse fails
/// with [`TopologyError::MissingSource`]. A request for the VSD alone falls back to a single
/// synthetic VSD record instead, since the VSD endpoint is taken from the configuration.
pub fn parse_topology_file(
    path: impl AsRef<Path>,
    components: &[DutCategory],
) -> Result<Vec<DutRecord>, TopologyError> {
    let path = path.as_ref();

    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            let physical = components
                .iter()
                .any(|c| matches!(c, DutCategory::Vsc | DutCategory::Vrs));
            return if !physical && components.contains(&DutCategory::Vsd) {
                log::debug!(
                    "Cannot read the topology file {}: {e}; falling back to a synthetic VSD record",
                    path.display()
                );
                Ok(vec![DutRecord::synthetic_vsd()])
            } else {
                log::error!("Cannot read the topology file {}: {e}", path.display());
                Err(TopologyError::MissingSource(path.display().to_string()))
            };
        }
    };

    let mut records = Vec::new();
    for line in content.lines() {
        let entry = match parse_line(line) {
            Some(entry) => entry,
            None => continue,
        };
        let host_type = match entry.host_type.parse::<HostType>() {
            Ok(host_type) => host_type,
            Err(_) => {
                log::trace!(
                    "skipping the line of `{}` with unknown host type `{}`",
                    entry.name,
                    entry.host_type
                );
                continue;
            }
        };
        records.push(DutRecord {
            host_type: Some(host_type),
            name: entry.name,
            address: entry.address,
            component: entry.component,
            username: entry.username,
            password: entry.password,
        });
    }

    log::debug!("parsed {} DUT records from {}", records.len(), path.display());
    Ok(records)
}

/// Error while reading a topology description.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    /// The topology file is unreadable while the requested components require one.
    #[error("Testbed topology file is not provided: {0}")]
    MissingSource(String),
}
