// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use log::{debug, info, warn};
use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::Path;

/// Resolves account names to numeric uids.
pub trait AccountDb {
    fn uid_by_name(&self, name: &str) -> Option<u32>;
}

/// The host account database (passwd, NSS), queried in-process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAccounts;

impl AccountDb for SystemAccounts {
    fn uid_by_name(&self, name: &str) -> Option<u32> {
        uzers::get_user_by_name(name).map(|user| user.uid())
    }
}

impl AccountDb for HashMap<String, u32> {
    fn uid_by_name(&self, name: &str) -> Option<u32> {
        self.get(name).copied()
    }
}

/// Lists accounts that own a directory under `home` and whose uid is at
/// least `min_uid`, sorted by name. Hidden entries, non-directories and
/// names the account database doesn't know are skipped silently.
pub fn list_accounts(home: &Path, db: &impl AccountDb, min_uid: u32) -> Vec<String> {
    let entries = match std::fs::read_dir(home) {
        Ok(entries) => entries,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            info!("{} does not exist, no accounts to audit", home.display());
            return Vec::new();
        }
        Err(e) => {
            warn!("could not read {}: {e}", home.display());
            return Vec::new();
        }
    };

    let mut accounts: Vec<String> = entries
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                debug!("skipping unreadable entry in {}: {e}", home.display());
                None
            }
        })
        // follows symlinks, like a shell `test -d`
        .filter(|entry| entry.path().is_dir())
        .filter_map(|entry| entry.file_name().into_string().ok())
        .filter(|name| !name.starts_with('.'))
        .filter(|name| match db.uid_by_name(name) {
            Some(uid) if uid >= min_uid => true,
            Some(uid) => {
                debug!("{name}: uid {uid} is below {min_uid}, skipping");
                false
            }
            None => {
                debug!("{name}: no such account, skipping");
                false
            }
        })
        .collect();

    accounts.sort();
    accounts
}
