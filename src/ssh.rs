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

//! Module for managing SSH sessions with the devices of the testbed.

use std::{
    ffi::OsStr,
    process::{Command as StdCommand, ExitStatus, Output},
    string::FromUtf8Error,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use itertools::Itertools;
use thiserror::Error;
use tokio::{process::Command, time::timeout};

pub const EMPTY: &[&str] = &[];

/// Time to wait until an SSH connection must be established.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Login credentials of a device, as given in the topology file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login user name.
    pub username: String,
    /// Login password. Without a password, the connection uses key-based authentication.
    pub password: Option<String>,
}

impl Credentials {
    /// Credentials with a user name only (key-based login).
    pub fn user(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: None,
        }
    }

    /// Credentials with both a user name and a password.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: Some(password.into()),
        }
    }
}

/// This is the main SSH session with a remote host.
///
/// This session is configured to automatically manage a control master using the following
/// arguments:
///
/// - `ControlMaster auto`
/// - `ControlPath /tmp/.ssh-%r@%h:%p`
/// - `ControlPersist 30m`
///
/// Creating a session does not perform any I/O. Call [`SshSession::open`] to establish the
/// control master; every command afterwards is multiplexed over that connection. Sessions
/// without a password authenticate in batch mode, so make sure the destination is properly
/// configured in `~/.ssh/config`. When the topology file provides a password, the control
/// master is established through `sshpass` instead.
#[derive(Debug, Clone)]
pub struct SshSession {
    /// SSH destination, either `host` or `user@host`.
    destination: String,
    /// Password for establishing the control master, fed through `sshpass`.
    password: Option<String>,
    /// Whether [`SshSession::open`] has succeeded, shared between clones of the session.
    connected: Arc<AtomicBool>,
}

impl SshSession {
    /// Create a new SSH session handle without connecting to the destination.
    pub fn new(host: impl AsRef<str>, credentials: Option<&Credentials>) -> Self {
        let destination = match credentials {
            Some(c) => format!("{}@{}", c.username, host.as_ref()),
            None => host.as_ref().to_string(),
        };
        Self {
            destination,
            password: credentials.and_then(|c| c.password.clone()),
            connected: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Get the destination of the session, either `host` or `user@host`.
    pub fn name(&self) -> &str {
        &self.destination
    }

    /// Whether [`SshSession::open`] has already succeeded on this session.
    pub fn is_open(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    /// Establish the control master connection with the destination.
    ///
    /// The call is idempotent. Once the session is open, further calls return immediately
    /// without touching the target. A control master left behind by an earlier run is reused
    /// instead of opening a second connection.
    pub async fn open(&self) -> Result<(), SshError> {
        if self.is_open() {
            log::trace!("[{}] session is already open", self.name());
            return Ok(());
        }

        log::trace!("[{}] connecting...", self.name());

        // reuse a control master of a previous run if one is still alive
        if self.master_alive().await? {
            log::trace!("[{}] reusing the running control master", self.name());
            self.connected.store(true, Ordering::Release);
            return Ok(());
        }

        let mut cmd = Command::from(self.master_command());
        cmd.kill_on_drop(true);

        // wait for 10 seconds until the connection is established
        match timeout(CONNECT_TIMEOUT, cmd.output()).await {
            Ok(Ok(output)) if output.status.success() => {
                log::trace!("[{}] connection established!", self.name());
                self.connected.store(true, Ordering::Release);
                Ok(())
            }
            Ok(Ok(output)) => {
                let stderr = String::from_utf8_lossy(&output.stderr);
                log::error!("[{}] cannot establish the connection:\n{stderr}", self.name());
                Err(SshError::Setup(std::io::Error::new(
                    std::io::ErrorKind::Other,
                    stderr.trim().to_string(),
                )))
            }
            Ok(Err(e)) => {
                log::error!("[{}] Error while connecting to the target: {e}", self.name());
                Err(SshError::Client(e))
            }
            Err(_) => {
                log::error!("[{}] connection timeout!", self.name());
                Err(SshError::Timeout)
            }
        }
    }

    /// Check whether a control master for this destination is already running.
    async fn master_alive(&self) -> Result<bool, SshError> {
        let mut cmd = Command::from(self.std_command(&["-O", "check"]));
        cmd.kill_on_drop(true);
        Ok(cmd.output().await?.status.success())
    }

    /// Create the command that establishes the control master (`ssh -fN <destination>`),
    /// going through `sshpass` when the device requires a password.
    fn master_command(&self) -> StdCommand {
        let mut cmd = match self.password.as_deref() {
            Some(password) => {
                let mut cmd = StdCommand::new("sshpass");
                cmd.env("SSHPASS", password);
                cmd.arg("-e").arg("ssh").arg("-oBatchMode=no");
                cmd
            }
            None => {
                let mut cmd = StdCommand::new("ssh");
                cmd.arg("-oBatchMode=yes");
                cmd
            }
        };
        cmd.arg("-oControlMaster=auto")
            .arg("-oControlPath=/tmp/.ssh-%r@%h:%p")
            .arg("-oControlPersist=30m")
            .arg("-oStrictHostKeyChecking=accept-new")
            .arg("-fN")
            .arg(self.name());
        cmd
    }

    /// Create a raw `ssh` command with the following attributes set:
    ///
    /// - `oControlMaster=auto`
    /// - `oControlPath=/tmp/.ssh-%r@%h:%p`
    /// - `oControlPersist=30m`
    /// - `oBatchMode=yes`
    /// - `args` as given by the other arguments.
    /// - `destination` to connect to the given destination.
    /// - `kill_on_drop = true` to kill the thread once it is dropped.
    pub(crate) fn raw_command(&self, args: &[impl AsRef<OsStr>]) -> Command {
        let mut cmd = Command::from(self.std_command(args));
        log::trace!("[tokio::process::Command] {:?}", cmd);
        cmd.kill_on_drop(true);
        cmd
    }

    /// Get a new command that executes the given program on the remote machine.
    pub fn command(&self, program: impl AsRef<OsStr>) -> Command {
        let mut cmd = self.raw_command(EMPTY);
        cmd.arg(program);
        cmd
    }

    /// Execute a command and return the bytes of both `STDOUT` and `STDERR`. This function call
    /// will check that the returned exit code is 0.
    pub async fn execute_cmd(
        &self,
        args: &[impl AsRef<str> + Sync],
    ) -> Result<(Vec<u8>, Vec<u8>), SshError> {
        let cmd_str = || args.iter().map(AsRef::as_ref).join(" ");

        log::trace!("[{}] `{}`", self.name(), cmd_str());
        let mut cmd = self.raw_command(EMPTY);
        for arg in args {
            cmd.arg(arg.as_ref());
        }
        let output = match cmd.output().await {
            Ok(out) => out,
            Err(e) => {
                log::error!("[{}] {} failed: {}", self.name(), cmd_str(), e);
                Err(e)?
            }
        };

        check_output(self.name(), output, cmd_str)
    }

    /// Execute a command, check that the exit code is 0, and return the parsed `STDOUT`.
    ///
    /// Network elements tend to print their login banner on `STDERR`, so a non-empty `STDERR`
    /// is tolerated here (and logged on the trace level).
    pub async fn execute_cmd_stdout(
        &self,
        args: &[impl AsRef<str> + Sync],
    ) -> Result<String, SshError> {
        let (stdout, stderr) = self.execute_cmd(args).await?;

        if !stderr.is_empty() {
            log::trace!(
                "[{}] {} returned non-empty stderr:\nSTDERR:\n{}",
                self.name(),
                args.iter().map(AsRef::as_ref).join(" "),
                String::from_utf8_lossy(&stderr),
            );
        }

        Ok(String::from_utf8(stdout)?)
    }

    /// Execute a command and return the status. This function will **not** check for the exit
    /// code, but simply return it.
    pub async fn execute_cmd_status(
        &self,
        args: &[impl AsRef<str> + Sync],
    ) -> Result<ExitStatus, SshError> {
        log::trace!(
            "[{}] `{}`",
            self.name(),
            args.iter().map(AsRef::as_ref).join(" ")
        );
        let mut cmd = self.raw_command(EMPTY);
        for arg in args {
            cmd.arg(arg.as_ref());
        }
        match cmd.output().await {
            Ok(out) => Ok(out.status),
            Err(e) => {
                log::error!(
                    "[{}] {} failed: {}",
                    self.name(),
                    args.iter().map(AsRef::as_ref).join(" "),
                    e
                );
                Err(e)?
            }
        }
    }

    /// Create a raw `ssh` command with the following attributes set:
    /// - `oControlMaster=auto`
    /// - `oControlPath=/tmp/.ssh-%r@%h:%p`
    /// - `oControlPersist=30m`
    /// - `oBatchMode=yes`
    /// - `args` as given by the other arguments.
    /// - `destination` to connect to the given destination.
    pub fn std_command(&self, args: &[impl AsRef<OsStr>]) -> StdCommand {
        let mut cmd = StdCommand::new("ssh");
        cmd.arg("-oControlMaster=auto")
            .arg("-oControlPath=/tmp/.ssh-%r@%h:%p")
            .arg("-oControlPersist=30m")
            .arg("-oBatchMode=yes")
            .args(args)
            .arg(self.name());
        cmd
    }
}

/// Check the output for successful exit code
pub fn check_output<F, S>(
    host: &str,
    output: Output,
    cmd: F,
) -> Result<(Vec<u8>, Vec<u8>), SshError>
where
    F: FnOnce() -> S,
    S: std::fmt::Display,
{
    if output.status.success() {
        Ok((output.stdout, output.stderr))
    } else {
        let cmd = cmd().to_string();
        log::error!(
            "[{}] {} exited with exit code {}{}{}",
            host,
            cmd,
            output.status.code().unwrap_or_default(),
            if !output.stdout.is_empty() {
                format!("\nSTDOUT:\n{}", String::from_utf8_lossy(&output.stdout))
            } else {
                String::new()
            },
            if !output.stderr.is_empty() {
                format!("\nSTDERR:\n{}", String::from_utf8_lossy(&output.stderr))
            } else {
                String::new()
            }
        );
        Err(SshError::CommandError(
            host.to_string(),
            cmd,
            output.status.code().unwrap_or_default(),
        ))
    }
}

/// Error kind returned by [`SshSession`].
#[derive(Debug, Error)]
pub enum SshError {
    /// Error while establishing the main connection
    #[error("Error while establishing the connection: {0}")]
    Setup(std::io::Error),
    /// Timeout while establishing the session
    #[error("Timeout while establishing the session.")]
    Timeout,
    /// Error while interacting with the main connection
    #[error("SSH Client error: {0}")]
    Client(#[from] std::io::Error),
    /// Error while executing a command.
    #[error("Non-zero exit code of command {1} on {0}: {2}")]
    CommandError(String, String, i32),
    /// Cannot parse output as utf8
    #[error("Cannot parse output as UTF-8: {0}")]
    FromUtf8(#[from] FromUtf8Error),
}
