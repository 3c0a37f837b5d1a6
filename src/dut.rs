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

//! Classification of topology records and the device handle built from them.

use async_trait::async_trait;
use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use crate::{
    config::CONFIG,
    linux::{LinuxSession, OscSession, VrsSession},
    sros::{SrosModel, SrosSession},
    ssh::SshError,
    topology::DutRecord,
    vsd::{VsdError, VsdSession},
    NuageLabError,
};

/// The device kind a component string classifies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DutKind {
    /// A VRS virtual switch on a hypervisor.
    Switch,
    /// The VSD, the SDN manager of the platform.
    SdnManager,
    /// An SROS-based controller or gateway.
    Controller(SrosModel),
    /// The OpenStack controller host.
    Orchestrator,
    /// An auxiliary utility host.
    Utility,
}

lazy_static! {
    /// The component classification table. Patterns are matched case-sensitively against the
    /// start of the component string, and the first match decides, so the order of the table
    /// is part of the contract: `7750` gateways must be recognized before the `VSG` and `VSC`
    /// entries get to look at the string.
    static ref COMPONENT_TABLE: Vec<(Regex, DutKind)> = vec![
        (Regex::new("^VRS").unwrap(), DutKind::Switch),
        (Regex::new("^VSD").unwrap(), DutKind::SdnManager),
        (Regex::new("^7750").unwrap(), DutKind::Controller(SrosModel::Sr7750)),
        (Regex::new("^VSG").unwrap(), DutKind::Controller(SrosModel::Vsg)),
        (Regex::new("^VSC").unwrap(), DutKind::Controller(SrosModel::Vsc)),
        (Regex::new("^OSC").unwrap(), DutKind::Orchestrator),
        (Regex::new("^UTILS").unwrap(), DutKind::Utility),
    ];
}

/// Classify a component string against the fixed component vocabulary. Returns `None` if no
/// pattern matches.
pub fn classify(component: &str) -> Option<DutKind> {
    COMPONENT_TABLE
        .iter()
        .find(|(pattern, _)| pattern.is_match(component))
        .map(|(_, kind)| *kind)
}

/// A device record declares a component that matches no known device kind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Cannot find a device kind corresponding to `{name}` (component `{component}`)")]
pub struct UnsupportedComponentError {
    /// Name of the offending device.
    pub name: String,
    /// The component string that failed to classify.
    pub component: String,
}

/// Error of a single device transport.
#[derive(Debug, Error)]
pub enum TransportError {
    /// SSH transport error.
    #[error("{0}")]
    Ssh(#[from] SshError),
    /// VSD REST error.
    #[error("{0}")]
    Vsd(#[from] VsdError),
}

/// Common surface of every device handle: a name, and an idempotent operation to establish
/// the session.
#[async_trait]
pub trait Dut {
    /// The device name from the topology file.
    fn name(&self) -> &str;

    /// Establish (or re-validate) the session with the device. The call must be idempotent.
    async fn open_session(&self) -> Result<(), TransportError>;
}

/// A handle to a single device under test.
///
/// The variants mirror the component families of the topology file. Every handle is
/// constructed without touching the network; the sessions are established later through
/// [`Dut::open_session`], usually for the whole testbed at once via
/// [`Testbed::open_sessions`](crate::Testbed::open_sessions).
#[derive(Debug)]
pub enum DutHandle {
    /// A VRS virtual switch.
    Switch(VrsSession),
    /// An SROS controller or gateway (VSC, 7750 SR, or VSG).
    Controller(SrosSession),
    /// The VSD.
    SdnManager(VsdSession),
    /// The OpenStack controller, with its `cli` and `api` sub-clients.
    Orchestrator(OscSession),
    /// An auxiliary utility host.
    Utility(LinuxSession),
}

impl DutHandle {
    /// Construct the handle matching the component of the record.
    ///
    /// Classification walks the component table in order, and the first matching pattern
    /// decides the device kind. A record whose component matches nothing fails with
    /// [`UnsupportedComponentError`], and no handle is constructed. For the VSD, the
    /// connection parameters come from the `[vsd]` configuration section, not from the
    /// record's address column.
    pub fn from_record(record: &DutRecord) -> Result<Self, NuageLabError> {
        let component = record.component.as_deref().unwrap_or_default();
        let kind = classify(component).ok_or_else(|| UnsupportedComponentError {
            name: record.name.clone(),
            component: component.to_string(),
        })?;

        Ok(match kind {
            DutKind::Switch => Self::Switch(VrsSession::new(
                &record.address,
                &record.name,
                record.credentials(),
            )),
            DutKind::SdnManager => {
                Self::SdnManager(VsdSession::new(&record.name, &CONFIG.vsd)?)
            }
            DutKind::Controller(model) => Self::Controller(SrosSession::new(
                &record.address,
                &record.name,
                record.credentials(),
                model,
            )),
            DutKind::Orchestrator => Self::Orchestrator(OscSession::new(
                &record.address,
                &record.name,
                record.credentials(),
            )?),
            DutKind::Utility => Self::Utility(LinuxSession::new(
                &record.address,
                &record.name,
                record.credentials(),
            )),
        })
    }

    /// The kind of the handle.
    pub fn kind(&self) -> DutKind {
        match self {
            Self::Switch(_) => DutKind::Switch,
            Self::Controller(s) => DutKind::Controller(s.model()),
            Self::SdnManager(_) => DutKind::SdnManager,
            Self::Orchestrator(_) => DutKind::Orchestrator,
            Self::Utility(_) => DutKind::Utility,
        }
    }

    /// The switch session, if this is a `Switch` handle.
    pub fn as_switch(&self) -> Option<&VrsSession> {
        match self {
            Self::Switch(s) => Some(s),
            _ => None,
        }
    }

    /// The SROS session, if this is a `Controller` handle.
    pub fn as_controller(&self) -> Option<&SrosSession> {
        match self {
            Self::Controller(s) => Some(s),
            _ => None,
        }
    }

    /// The VSD session, if this is a `SdnManager` handle.
    pub fn as_sdn_manager(&self) -> Option<&VsdSession> {
        match self {
            Self::SdnManager(s) => Some(s),
            _ => None,
        }
    }

    /// The OpenStack controller session, if this is an `Orchestrator` handle.
    pub fn as_orchestrator(&self) -> Option<&OscSession> {
        match self {
            Self::Orchestrator(s) => Some(s),
            _ => None,
        }
    }

    /// The Linux session, if this is a `Utility` handle.
    pub fn as_utility(&self) -> Option<&LinuxSession> {
        match self {
            Self::Utility(s) => Some(s),
            _ => None,
        }
    }
}

#[async_trait]
impl Dut for DutHandle {
    fn name(&self) -> &str {
        match self {
            Self::Switch(s) => s.name(),
            Self::Controller(s) => s.name(),
            Self::SdnManager(s) => s.name(),
            Self::Orchestrator(s) => s.name(),
            Self::Utility(s) => s.name(),
        }
    }

    async fn open_session(&self) -> Result<(), TransportError> {
        match self {
            Self::Switch(s) => Dut::open_session(s).await,
            Self::Controller(s) => Dut::open_session(s).await,
            Self::SdnManager(s) => Dut::open_session(s).await,
            Self::Orchestrator(s) => Dut::open_session(s).await,
            Self::Utility(s) => Dut::open_session(s).await,
        }
    }
}

#[async_trait]
impl Dut for VrsSession {
    fn name(&self) -> &str {
        VrsSession::name(self)
    }

    async fn open_session(&self) -> Result<(), TransportError> {
        Ok(self.open().await?)
    }
}

#[async_trait]
impl Dut for SrosSession {
    fn name(&self) -> &str {
        SrosSession::name(self)
    }

    async fn open_session(&self) -> Result<(), TransportError> {
        Ok(self.open().await?)
    }
}

#[async_trait]
impl Dut for LinuxSession {
    fn name(&self) -> &str {
        LinuxSession::name(self)
    }

    async fn open_session(&self) -> Result<(), TransportError> {
        Ok(self.open().await?)
    }
}

#[async_trait]
impl Dut for OscSession {
    fn name(&self) -> &str {
        OscSession::name(self)
    }

    async fn open_session(&self) -> Result<(), TransportError> {
        Ok(self.open().await?)
    }
}

#[async_trait]
impl Dut for VsdSession {
    fn name(&self) -> &str {
        VsdSession::name(self)
    }

    /// Establish the API session, then synchronize the cached user state. The session must be
    /// in place before the state can be read, so the order of the two steps is fixed.
    async fn open_session(&self) -> Result<(), TransportError> {
        self.api().new_session().await?;
        self.refresh_session().await?;
        Ok(())
    }
}
