// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::debug;
use std::process::Stdio;
use tokio::process::Command;
use tokio::time::{Duration, timeout};

/// Run `cmd` to completion and return its trimmed stdout.
///
/// Every failure mode collapses to `None`: spawn errors, timeouts, and, when
/// `must_succeed` is set, a non-zero exit status. A child that outlives
/// `limit` is killed when its future is dropped.
pub async fn run(mut cmd: Command, must_succeed: bool, limit: Duration) -> Option<String> {
    let program = cmd.as_std().get_program().to_string_lossy().into_owned();

    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let output = match timeout(limit, cmd.output()).await {
        Ok(Ok(output)) => output,
        Ok(Err(e)) => {
            debug!("{program}: failed to run: {e}");
            return None;
        }
        Err(_) => {
            debug!("{program}: timed out after {}s", limit.as_secs_f32());
            return None;
        }
    };

    if must_succeed && !output.status.success() {
        debug!(
            "{program}: exited with {} ({})",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        );
        return None;
    }

    Some(String::from_utf8_lossy(&output.stdout).trim().to_string())
}
