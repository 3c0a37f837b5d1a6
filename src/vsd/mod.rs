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

//! Module to interact with the VSD, the SDN manager of the Nuage platform.

mod api;

pub use api::{ApiClient, VsdError};

use ipnet::Ipv4Net;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::config::VsdConfig;

/// Session-scoped state of the authenticated VSD user, cached from the `me` resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VsdUser {
    /// ID of the authenticated user object.
    pub id: String,
    /// User name of the session.
    pub user_name: String,
    /// ID of the enterprise the user belongs to.
    pub enterprise_id: String,
}

/// Handle for the VSD.
///
/// The handle combines the raw [`ApiClient`] with query helpers for the API objects a test
/// run needs most, and caches the session-scoped user state. The connection parameters come
/// from the `[vsd]` configuration section; the address column of the topology file is ignored
/// for this device.
#[derive(Debug)]
pub struct VsdSession {
    name: String,
    api: ApiClient,
    user: RwLock<Option<VsdUser>>,
}

impl VsdSession {
    /// Create the handle from the configuration. No request is sent yet.
    pub fn new(name: impl Into<String>, config: &VsdConfig) -> Result<Self, VsdError> {
        Ok(Self {
            name: name.into(),
            api: ApiClient::new(config)?,
            user: RwLock::new(None),
        })
    }

    /// The device name from the topology file.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The raw API client.
    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    /// Re-read the session-scoped user state from the `me` resource. Requires an established
    /// API session.
    pub async fn refresh_session(&self) -> Result<(), VsdError> {
        log::trace!("[{}] refreshing the session state", self.name);

        let me = self.api.get("me").await?;
        let entry = me
            .first()
            .ok_or_else(|| VsdError::UnexpectedPayload("empty `me` response".to_string()))?;
        let field = |key: &str| {
            entry[key]
                .as_str()
                .map(str::to_string)
                .ok_or_else(|| VsdError::UnexpectedPayload(format!("`me` response without `{key}`")))
        };

        *self.user.write().await = Some(VsdUser {
            id: field("ID")?,
            user_name: field("userName")?,
            enterprise_id: field("enterpriseID")?,
        });
        Ok(())
    }

    /// The cached session user, if [`VsdSession::refresh_session`] has run.
    pub async fn user(&self) -> Option<VsdUser> {
        self.user.read().await.clone()
    }

    /// Find an enterprise by name.
    pub async fn enterprise(&self, name: &str) -> Result<Option<Value>, VsdError> {
        Ok(self
            .api
            .get_filtered("enterprises", format!("name IS \"{name}\""))
            .await?
            .into_iter()
            .next())
    }

    /// Find an L3 domain by name.
    pub async fn domain(&self, name: &str) -> Result<Option<Value>, VsdError> {
        Ok(self
            .api
            .get_filtered("domains", format!("name IS \"{name}\""))
            .await?
            .into_iter()
            .next())
    }

    /// Find the subnet matching the given network, comparing both the address and the
    /// netmask.
    pub async fn subnet_by_cidr(&self, net: Ipv4Net) -> Result<Option<Value>, VsdError> {
        let filter = format!(
            "address IS \"{}\" and netmask IS \"{}\"",
            net.network(),
            net.netmask()
        );
        Ok(self
            .api
            .get_filtered("subnets", filter)
            .await?
            .into_iter()
            .next())
    }
}
