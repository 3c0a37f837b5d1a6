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

//! Module to interact with the SROS-based network elements of the testbed: VSC controllers
//! and the 7750 SR / VSG gateways.

use crate::ssh::{Credentials, SshError, SshSession};

/// The SROS product family a session talks to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SrosModel {
    /// A 7750 Service Router gateway.
    Sr7750,
    /// A 7850 Virtualized Services Gateway.
    Vsg,
    /// A Virtualized Services Controller.
    Vsc,
}

/// An SSH session with an SROS-based network element.
///
/// The session is constructed without any I/O; call [`SrosSession::open`] (or
/// `Testbed::open_sessions`) before executing commands.
#[derive(Debug, Clone)]
pub struct SrosSession {
    ssh: SshSession,
    name: String,
    address: String,
    credentials: Option<Credentials>,
    model: SrosModel,
}

impl SrosSession {
    /// Create a new session handle with an SROS device.
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        credentials: Option<Credentials>,
        model: SrosModel,
    ) -> Self {
        let address = address.into();
        let ssh = SshSession::new(&address, credentials.as_ref());
        Self {
            ssh,
            name: name.into(),
            address,
            credentials,
            model,
        }
    }

    /// The device name from the topology file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The address the session connects to.
    pub fn address(&self) -> &str {
        &self.address
    }

    /// The login credentials, if the topology file provided any.
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// The SROS product family of the device.
    pub fn model(&self) -> SrosModel {
        self.model
    }

    /// The underlying SSH session.
    pub fn ssh(&self) -> &SshSession {
        &self.ssh
    }

    /// Establish the SSH session. The call is idempotent.
    pub async fn open(&self) -> Result<(), SshError> {
        self.ssh.open().await
    }

    /// Execute a single CLI command on the device and return its output.
    pub async fn execute_cmd(&self, cmd: impl AsRef<str> + Send + Sync) -> Result<String, SshError> {
        self.ssh.execute_cmd_stdout(&[cmd.as_ref()]).await
    }

    /// Execute the `show` command with the provided arguments.
    pub async fn show(&self, args: impl AsRef<str> + Send + Sync) -> Result<String, SshError> {
        self.ssh.execute_cmd_stdout(&["show", args.as_ref()]).await
    }
}
