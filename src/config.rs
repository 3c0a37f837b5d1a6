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

//! This module contains the code for reading the configuration.

use std::fmt;

use lazy_static::lazy_static;
use serde::{Deserialize, Deserializer};

use crate::testbed::DutCategory;

macro_rules! expect {
    ($result:expr, $($rest:tt)*) => {
        $result.unwrap_or_else(|e| {
            eprintln!("Error: {}: {}\n", format!($($rest)*), e);
            panic!()
        })
    };
}

lazy_static! {
    pub static ref CONFIG_DIR: String = {
        if cfg!(test) {
            concat!(env!("OUT_DIR"), "/.config").to_string()
        } else {
            expect!(
                std::env::var("NUAGE_LAB_CONFIG"),
                "Environment variable 'NUAGE_LAB_CONFIG' is not defined!"
            )
        }
    };
    pub static ref CONFIG: Config = {
        let config_str = expect!(
            std::fs::read_to_string(format!("{}/config.toml", *CONFIG_DIR)),
            "Cannot read '{}/config.toml'",
            *CONFIG_DIR
        );
        expect!(
            toml::from_str(&config_str),
            "Cannot parse '{}/config.toml'",
            *CONFIG_DIR
        )
    };
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub exec_server: ExecServerConfig,
    pub nuage: NuageConfig,
    pub vsd: VsdConfig,
    pub openstack: OpenStackConfig,
}

/// Configuration for the execution server, the machine that drives the test run.
#[derive(Debug, Clone, Deserialize)]
pub struct ExecServerConfig {
    /// The ssh hostname to reach the execution server
    pub ssh_name: String,
    /// Login user on the execution server. When absent, the user configured in `~/.ssh/config`
    /// is used.
    #[serde(default)]
    pub user: Option<String>,
}

/// Configuration for which parts of the Nuage platform the testbed manages.
#[derive(Debug, Clone, Deserialize)]
pub struct NuageConfig {
    /// The requested component categories. Devices of other categories are ignored when
    /// building the testbed.
    pub components: Vec<DutCategory>,
    /// Path towards the topology description file.
    pub topology_file: String,
}

/// Configuration for the VSD.
#[derive(Debug, Clone, Deserialize)]
pub struct VsdConfig {
    /// The VSD API endpoint, given as `host:port`.
    #[serde(deserialize_with = "deserialize_endpoint")]
    pub server: Endpoint,
    /// The VSD API version, e.g. `6.0`.
    pub api_version: String,
    /// API user name.
    #[serde(default = "default_vsd_user")]
    pub user: String,
    /// API password.
    #[serde(default = "default_vsd_password")]
    pub password: String,
    /// The enterprise under which the API user logs in.
    #[serde(default = "default_vsd_enterprise")]
    pub enterprise: String,
}

/// Configuration for the OpenStack API client.
#[derive(Debug, Clone, Deserialize)]
pub struct OpenStackConfig {
    /// The keystone endpoint to authenticate against.
    pub auth_url: String,
    /// OpenStack user name.
    pub user: String,
    /// OpenStack password.
    pub password: String,
    /// The tenant (project) to scope the session to.
    pub tenant: String,
}

/// A `host:port` pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    /// Hostname or IP address.
    pub host: String,
    /// TCP port.
    pub port: u16,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

fn default_vsd_user() -> String {
    "csproot".to_string()
}

fn default_vsd_password() -> String {
    "csproot".to_string()
}

fn default_vsd_enterprise() -> String {
    "csp".to_string()
}

fn deserialize_endpoint<'de, D>(de: D) -> Result<Endpoint, D::Error>
where
    D: Deserializer<'de>,
{
    let x = String::deserialize(de)?;
    let (host, port) = x
        .split_once(':')
        .ok_or_else(|| serde::de::Error::custom(format!("expected `host:port`, got `{x}`")))?;
    if host.is_empty() {
        return Err(serde::de::Error::custom(format!(
            "expected `host:port`, got `{x}`"
        )));
    }
    let port = port
        .parse()
        .map_err(|e| serde::de::Error::custom(format!("invalid port in `{x}`: {e}")))?;
    Ok(Endpoint {
        host: host.to_string(),
        port,
    })
}
