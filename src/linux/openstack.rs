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

//! Client surfaces of the OpenStack controller: a wrapper around the OpenStack CLI and a
//! client for the REST APIs.
//!
//! Both clients are deliberately thin. Test runs drive them directly, and the bodies of the
//! individual OpenStack operations live in the test suites, not here.

use std::time::Duration;

use itertools::Itertools;
use reqwest::{Client, StatusCode};
use serde_json::{json, Value};
use thiserror::Error;

use crate::{
    config::OpenStackConfig,
    ssh::{SshError, SshSession},
};

/// Time to wait for a response of the OpenStack API.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Client that runs OpenStack CLI commands on the controller over its SSH session.
///
/// Every command is prefixed with `source ~/admin_rc;` so the admin credentials are in scope
/// of the invoked client.
#[derive(Debug, Clone)]
pub struct OpenStackCliClient {
    ssh: SshSession,
}

impl OpenStackCliClient {
    pub(crate) fn new(ssh: SshSession) -> Self {
        Self { ssh }
    }

    /// Execute an OpenStack CLI command (e.g. `neutron net-list`) on the controller and
    /// return its standard output.
    pub async fn cmd(&self, cmd: impl AsRef<str> + Send + Sync) -> Result<String, SshError> {
        let cmd = format!("source ~/admin_rc; {}", cmd.as_ref());
        self.ssh.execute_cmd_stdout(&[cmd.as_str()]).await
    }

    /// Execute several OpenStack CLI commands in a single shell invocation, in the given
    /// order.
    pub async fn batch(&self, cmds: &[impl AsRef<str> + Sync]) -> Result<String, SshError> {
        let joined = cmds.iter().map(AsRef::as_ref).join(" ; ");
        self.cmd(joined).await
    }
}

/// Client for the OpenStack REST APIs, authenticating against the keystone identity service.
#[derive(Debug, Clone)]
pub struct OpenStackApiClient {
    client: Client,
    auth_url: String,
    user: String,
    password: String,
    tenant: String,
}

impl OpenStackApiClient {
    /// Create the client from the `[openstack]` configuration section. No request is sent
    /// yet.
    pub fn new(config: &OpenStackConfig) -> Result<Self, OpenStackApiError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(OpenStackApiError::Client)?;
        Ok(Self {
            client,
            auth_url: config.auth_url.clone(),
            user: config.user.clone(),
            password: config.password.clone(),
            tenant: config.tenant.clone(),
        })
    }

    /// The keystone endpoint this client authenticates against.
    pub fn auth_url(&self) -> &str {
        &self.auth_url
    }

    /// Request a tenant-scoped token from keystone and return it.
    pub async fn authenticate(&self) -> Result<String, OpenStackApiError> {
        log::trace!("[{}] requesting a token for {}", self.auth_url, self.user);

        let body = json!({
            "auth": {
                "tenantName": self.tenant,
                "passwordCredentials": {
                    "username": self.user,
                    "password": self.password,
                },
            }
        });
        let response = self
            .client
            .post(format!("{}/tokens", self.auth_url))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            log::error!("[{}] authentication failed with {status}", self.auth_url);
            return Err(OpenStackApiError::Api(status));
        }

        let payload = response.json::<Value>().await?;
        payload["access"]["token"]["id"]
            .as_str()
            .map(str::to_string)
            .ok_or(OpenStackApiError::MissingToken)
    }
}

/// Error of the OpenStack REST client.
#[derive(Debug, Error)]
pub enum OpenStackApiError {
    /// Cannot construct the HTTP client.
    #[error("Cannot create the HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    /// Error while talking to the endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    /// The endpoint returned an unexpected status code.
    #[error("Unexpected response status: {0}")]
    Api(StatusCode),
    /// The keystone response carries no token.
    #[error("No token in the keystone response")]
    MissingToken,
}
