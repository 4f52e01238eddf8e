// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use std::path::Path;

/// Whether `loginctl enable-linger` has been run for `name`. systemd-logind
/// records that as an empty marker file named after the account.
pub fn is_lingering(linger_dir: &Path, name: &str) -> bool {
    linger_dir.join(name).exists()
}
