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

//! Module to interact with the Linux hosts of the testbed: the execution server, the VRS
//! hypervisors, the OpenStack controller, and auxiliary utility machines.

mod openstack;

pub use openstack::{OpenStackApiClient, OpenStackApiError, OpenStackCliClient};

use crate::{
    config::CONFIG,
    ssh::{Credentials, SshError, SshSession},
};

/// An SSH session with a plain Linux host, like the execution server or a `UTILS` machine.
#[derive(Debug, Clone)]
pub struct LinuxSession {
    ssh: SshSession,
    name: String,
    address: String,
    credentials: Option<Credentials>,
}

impl LinuxSession {
    /// Create a new session handle with a Linux host.
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        let address = address.into();
        let ssh = SshSession::new(&address, credentials.as_ref());
        Self {
            ssh,
            name: name.into(),
            address,
            credentials,
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

    /// The underlying SSH session.
    pub fn ssh(&self) -> &SshSession {
        &self.ssh
    }

    /// Establish the SSH session. The call is idempotent.
    pub async fn open(&self) -> Result<(), SshError> {
        self.ssh.open().await
    }

    /// Execute a shell command on the host and return its standard output.
    pub async fn cmd(&self, cmd: impl AsRef<str> + Send + Sync) -> Result<String, SshError> {
        self.ssh.execute_cmd_stdout(&[cmd.as_ref()]).await
    }
}

/// An SSH session with a hypervisor running the Virtual Routing & Switching agent.
#[derive(Debug, Clone)]
pub struct VrsSession {
    ssh: SshSession,
    name: String,
    address: String,
    credentials: Option<Credentials>,
}

impl VrsSession {
    /// Create a new session handle with a VRS hypervisor.
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Self {
        let address = address.into();
        let ssh = SshSession::new(&address, credentials.as_ref());
        Self {
            ssh,
            name: name.into(),
            address,
            credentials,
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

    /// The underlying SSH session.
    pub fn ssh(&self) -> &SshSession {
        &self.ssh
    }

    /// Establish the SSH session. The call is idempotent.
    pub async fn open(&self) -> Result<(), SshError> {
        self.ssh.open().await
    }

    /// Execute a shell command on the hypervisor and return its standard output.
    pub async fn cmd(&self, cmd: impl AsRef<str> + Send + Sync) -> Result<String, SshError> {
        self.ssh.execute_cmd_stdout(&[cmd.as_ref()]).await
    }

    /// Run `ovs-vsctl` with the given arguments on the hypervisor.
    pub async fn ovs_vsctl(&self, args: &[&str]) -> Result<String, SshError> {
        let mut cmd = vec!["ovs-vsctl"];
        cmd.extend_from_slice(args);
        self.ssh.execute_cmd_stdout(&cmd).await
    }

    /// Run `ovs-appctl` with the given arguments on the hypervisor.
    pub async fn ovs_appctl(&self, args: &[&str]) -> Result<String, SshError> {
        let mut cmd = vec!["ovs-appctl"];
        cmd.extend_from_slice(args);
        self.ssh.execute_cmd_stdout(&cmd).await
    }
}

/// The session with the OpenStack controller.
///
/// Besides the SSH connection to the controller host, the handle carries the two client
/// surfaces a test run interacts with: [`OscSession::cli`] runs OpenStack CLI commands over
/// this same SSH session, and [`OscSession::api`] talks to the REST endpoints. Both clients
/// are wired up during construction.
#[derive(Debug, Clone)]
pub struct OscSession {
    ssh: SshSession,
    name: String,
    address: String,
    credentials: Option<Credentials>,
    /// Client running OpenStack CLI commands on the controller.
    pub cli: OpenStackCliClient,
    /// Client for the OpenStack REST APIs.
    pub api: OpenStackApiClient,
}

impl OscSession {
    /// Create a new session handle with the OpenStack controller. The REST client is built
    /// from the `[openstack]` section of the configuration.
    pub fn new(
        address: impl Into<String>,
        name: impl Into<String>,
        credentials: Option<Credentials>,
    ) -> Result<Self, OpenStackApiError> {
        let address = address.into();
        let ssh = SshSession::new(&address, credentials.as_ref());
        let cli = OpenStackCliClient::new(ssh.clone());
        let api = OpenStackApiClient::new(&CONFIG.openstack)?;
        Ok(Self {
            ssh,
            name: name.into(),
            address,
            credentials,
            cli,
            api,
        })
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

    /// The underlying SSH session.
    pub fn ssh(&self) -> &SshSession {
        &self.ssh
    }

    /// Establish the SSH session with the controller host. The call is idempotent.
    pub async fn open(&self) -> Result<(), SshError> {
        self.ssh.open().await
    }
}
