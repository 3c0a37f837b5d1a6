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

//! This library manages the Nuage VSP testbed for integration test runs against an OpenStack
//! deployment with the Nuage networking backend.
//!
//! # Configuration
//!
//! All connection parameters live in a `config.toml` file; a sample is in `src/test/config`.
//! Export the path of the directory containing it in the environment variable
//! `NUAGE_LAB_CONFIG`. The configuration names the execution server, the requested component
//! categories, the topology file, the VSD API endpoint, and the OpenStack credentials.
//!
//! Devices without credentials in the topology file are reached in SSH batch mode, so make
//! sure their host names resolve and `ssh $hostname` logs in without a password prompt (see
//! `~/.ssh/config`). Devices with a password in the topology file are connected through
//! `sshpass`.
//!
//! # The Testbed
//!
//! The testbed consists of the Nuage platform components, an OpenStack controller, and the
//! execution server that drives the test run:
//!
//! ```text
//!                  ┌─────────────────────────┐
//!                  │           VSD           │
//!                  │ - SDN manager, REST API │
//!                  └───────────┬─┬───────────┘
//!                              │ │
//!              ┌───────────────┘ └───────────────┐
//! ┌────────────┴────────────┐       ┌────────────┴────────────┐
//! │          VSC 1          │       │          VSC 2          │
//! │ - SROS control plane    │       │ - SROS control plane    │
//! └────────────┬────────────┘       └────────────┬────────────┘
//!              │                                 │
//! ┌────────────┴────────────┐       ┌────────────┴────────────┐
//! │ Hypervisor 1 (VRS)      │       │ Hypervisor 2 (VRS)      │
//! │ - Open vSwitch datapath │       │ - Open vSwitch datapath │
//! └─────────────────────────┘       └─────────────────────────┘
//!
//! ┌─────────────────────────┐       ┌─────────────────────────┐
//! │   OpenStack controller  │       │     Execution server    │
//! │ - neutron + nova CLIs   │       │ - drives the test run   │
//! │ - REST APIs             │       │                         │
//! └─────────────────────────┘       └─────────────────────────┘
//! ```
//!
//! Which devices exist is described by the topology file (see [`topology`]). Building a
//! [`Testbed`] parses that file and registers a [`DutHandle`] for every requested device
//! under its role key (`vsc_1`, `vrs_2`, ...), without touching the network. Establishing the
//! sessions is a separate, explicit step:
//!
//! ```rust,no_run
//! use nuage_lab::{DutCategory, NuageLabError, Testbed};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), NuageLabError> {
//!     let testbed = Testbed::new()?;
//!     testbed.open_sessions().await?;
//!
//!     if let Some(vsc) = testbed.dut(DutCategory::Vsc, 1).and_then(|d| d.as_controller()) {
//!         let vports = vsc.show("vswitch-controller vports").await?;
//!         println!("{vports}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! # Sessions
//!
//! All SSH sessions go through a shared OpenSSH control master per destination (see
//! [`ssh::SshSession`]), so repeated commands reuse one TCP connection. The VSD is special:
//! it is driven over its REST API (see [`vsd::VsdSession`]), authenticated once per process
//! with the credentials of the `[vsd]` configuration section.
//!
//! The testbed itself is built once and only read afterwards. Sessions are established
//! sequentially by [`Testbed::open_sessions`]; the call is idempotent and fails on the first
//! device that cannot be reached. Sharing the testbed between tasks is the caller's business,
//! e.g. by wrapping it in an `Arc`.

pub mod config;
pub mod dut;
pub mod linux;
pub mod sros;
pub mod ssh;
pub mod testbed;
pub mod topology;
pub mod vsd;

#[cfg(test)]
mod test;

use thiserror::Error;

pub use dut::{classify, Dut, DutHandle, DutKind, TransportError, UnsupportedComponentError};
pub use linux::{LinuxSession, OscSession, VrsSession};
pub use sros::{SrosModel, SrosSession};
pub use testbed::{DutCategory, RoleKey, SessionError, Testbed};
pub use topology::{parse_topology_file, DutRecord, HostType, TopologyError};
pub use vsd::VsdSession;

/// Error thrown while managing the testbed.
#[derive(Debug, Error)]
pub enum NuageLabError {
    /// Error while reading the topology description.
    #[error("{0}")]
    Topology(#[from] topology::TopologyError),
    /// A device record declares an unknown component.
    #[error("{0}")]
    UnsupportedComponent(#[from] dut::UnsupportedComponentError),
    /// A device session could not be established.
    #[error("Session error: {0}")]
    Session(#[from] testbed::SessionError),
    /// Error on an SSH session.
    #[error("SSH error: {0}")]
    Ssh(#[from] ssh::SshError),
    /// Error of the VSD REST client.
    #[error("VSD error: {0}")]
    Vsd(#[from] vsd::VsdError),
    /// Error of the OpenStack REST client.
    #[error("OpenStack error: {0}")]
    OpenStackApi(#[from] linux::OpenStackApiError),
}
