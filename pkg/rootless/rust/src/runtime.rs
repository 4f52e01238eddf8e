// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Detection of a rootless container daemon running for an account.

use crate::command;
use crate::config::Config;
use log::debug;
use serde::Serialize;
use std::future::Future;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tokio::time::Duration;

/// Evidence that the account's rootless daemon is running.
///
/// There is deliberately no "inactive" variant: a failed unit query or an
/// unreadable runtime directory look the same as a stopped daemon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RuntimeActivity {
    /// The user service manager reports the daemon unit as active.
    SystemdUnit,
    /// The daemon socket exists in the account's runtime directory.
    Socket,
    NotObserved,
}

impl RuntimeActivity {
    pub fn is_active(self) -> bool {
        self != RuntimeActivity::NotObserved
    }
}

/// Source of a user unit's state, as printed by `systemctl is-active`.
pub trait UnitStateQuery {
    fn unit_state(&self, name: &str, uid: u32) -> impl Future<Output = Option<String>>;
}

/// Asks the account's own systemd user instance, by switching to the
/// account with `su`. `XDG_RUNTIME_DIR` has to be set by hand, otherwise
/// systemctl would talk to the caller's user instance instead.
#[derive(Debug, Clone)]
pub struct SystemdUserQuery {
    unit: String,
    runtime_dir: PathBuf,
    timeout: Duration,
}

impl SystemdUserQuery {
    pub fn new(config: &Config) -> Self {
        Self {
            unit: config.daemon_unit.clone(),
            runtime_dir: config.runtime_dir.clone(),
            timeout: config.unit_query_timeout(),
        }
    }

    fn command(&self, name: &str, uid: u32) -> Command {
        let user_runtime_dir = self.runtime_dir.join(uid.to_string());
        let script = format!(
            "XDG_RUNTIME_DIR={} systemctl --user is-active {} 2>/dev/null",
            shell_quote(&user_runtime_dir.to_string_lossy()),
            shell_quote(&self.unit),
        );

        let mut cmd = Command::new("su");
        cmd.arg("-").arg(name).arg("-c").arg(script);
        cmd
    }
}

impl UnitStateQuery for SystemdUserQuery {
    async fn unit_state(&self, name: &str, uid: u32) -> Option<String> {
        // is-active exits non-zero for anything but "active", and the state
        // on stdout is still what we want.
        command::run(self.command(name, uid), false, self.timeout).await
    }
}

fn shell_quote(s: &str) -> String {
    format!("'{}'", s.replace('\'', r"'\''"))
}

fn socket_exists(path: &Path) -> bool {
    match path.try_exists() {
        Ok(exists) => exists,
        Err(e) => {
            // EACCES on another user's runtime dir is the common case here
            debug!("could not check {}: {e}", path.display());
            false
        }
    }
}

/// Checks the unit state first and falls back to the socket.
pub async fn detect(
    query: &impl UnitStateQuery,
    name: &str,
    uid: u32,
    socket_path: &Path,
) -> RuntimeActivity {
    let state = query.unit_state(name, uid).await;
    if state.as_deref() == Some("active") {
        return RuntimeActivity::SystemdUnit;
    }
    debug!("{name}: daemon unit state is {state:?}, checking socket");

    if socket_exists(socket_path) {
        RuntimeActivity::Socket
    } else {
        RuntimeActivity::NotObserved
    }
}
