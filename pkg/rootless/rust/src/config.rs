// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::errors::Error;
use log::debug;
use serde::Deserialize;
use std::env;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_CONFIG_PATH: &str = "/etc/rootless-audit/config.yaml";
pub const CONFIG_PATH_ENV: &str = "ROOTLESS_AUDIT_CONFIG";
pub const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Host locations and thresholds consulted by the audit. Every field has a
/// default matching a stock systemd host, so an empty file is valid.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub home_dir: PathBuf,
    pub subuid_file: PathBuf,
    pub subgid_file: PathBuf,
    pub linger_dir: PathBuf,
    pub runtime_dir: PathBuf,
    /// Accounts below this uid are treated as system accounts.
    pub min_uid: u32,
    pub daemon_unit: String,
    pub socket_name: String,
    pub unit_query_timeout_secs: u64,
    pub log_level: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            home_dir: PathBuf::from("/home"),
            subuid_file: PathBuf::from("/etc/subuid"),
            subgid_file: PathBuf::from("/etc/subgid"),
            linger_dir: PathBuf::from("/var/lib/systemd/linger"),
            runtime_dir: PathBuf::from("/run/user"),
            min_uid: 900,
            daemon_unit: "docker.service".to_string(),
            socket_name: "docker.sock".to_string(),
            unit_query_timeout_secs: 3,
            log_level: None,
        }
    }
}

impl Config {
    pub fn unit_query_timeout(&self) -> Duration {
        Duration::from_secs(self.unit_query_timeout_secs)
    }

    /// Per-user runtime directory, i.e. what `XDG_RUNTIME_DIR` is for `uid`.
    pub fn user_runtime_dir(&self, uid: u32) -> PathBuf {
        self.runtime_dir.join(uid.to_string())
    }

    /// Resolves the log level. Priority: LOG_LEVEL > YAML config > warn.
    pub fn log_level(&self) -> Result<log::Level, Error> {
        if let Ok(level) = env::var(LOG_LEVEL_ENV) {
            return parse_log_level(&level);
        }
        match &self.log_level {
            Some(level) => parse_log_level(level),
            None => Ok(log::Level::Warn),
        }
    }
}

fn parse_log_level(level: &str) -> Result<log::Level, Error> {
    match level.trim().to_lowercase().as_str() {
        "trace" => Ok(log::Level::Trace),
        "debug" => Ok(log::Level::Debug),
        "info" => Ok(log::Level::Info),
        "warn" | "warning" => Ok(log::Level::Warn),
        // log::Level has no "off"; error is the quietest level
        "error" | "critical" | "off" => Ok(log::Level::Error),
        _ => Err(Error::InvalidLogLevel(level.to_string())),
    }
}

/// Picks the config file: explicit path > ROOTLESS_AUDIT_CONFIG > default.
/// The boolean tells whether the operator asked for this file explicitly.
pub fn config_path(explicit: Option<PathBuf>) -> (PathBuf, bool) {
    if let Some(path) = explicit {
        return (path, true);
    }
    match env::var(CONFIG_PATH_ENV) {
        Ok(path) if !path.is_empty() => (PathBuf::from(path), true),
        _ => (PathBuf::from(DEFAULT_CONFIG_PATH), false),
    }
}

/// Loads the YAML config. A missing file is only an error when it was
/// explicitly requested.
pub fn load_config(path: &Path, required: bool) -> Result<Config, Error> {
    let contents = match std::fs::read_to_string(path) {
        Ok(contents) => contents,
        Err(e) if e.kind() == ErrorKind::NotFound && !required => {
            debug!("no config at {}, using defaults", path.display());
            return Ok(Config::default());
        }
        Err(source) => {
            return Err(Error::ReadConfig {
                path: path.to_path_buf(),
                source,
            });
        }
    };

    if contents.trim().is_empty() {
        return Ok(Config::default());
    }

    serde_yaml::from_str(&contents).map_err(|source| Error::ParseConfig {
        path: path.to_path_buf(),
        source,
    })
}
