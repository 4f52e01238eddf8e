// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

use crate::accounts::{AccountDb, list_accounts};
use crate::config::Config;
use crate::linger::is_lingering;
use crate::runtime::{self, RuntimeActivity, UnitStateQuery};
use crate::subid::{SubIdMap, SubIdRange, Suggestion, next_free_range};
use log::info;
use serde::Serialize;
use std::io::{self, Write};

const DIVIDER_WIDTH: usize = 70;
const YES: &str = "✅";
const NO: &str = "❌";
const NO_VALUE: &str = "-";

/// Provisioning state of one account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportRow {
    pub name: String,
    pub uid: u32,
    pub subuid: Option<SubIdRange>,
    pub subgid: Option<SubIdRange>,
    pub linger: bool,
    pub runtime: RuntimeActivity,
    pub container_uid: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Report {
    pub accounts: Vec<ReportRow>,
    pub suggestion: Option<Suggestion>,
}

/// Audits every eligible account, one at a time, in name order.
pub async fn audit(config: &Config, db: &impl AccountDb, query: &impl UnitStateQuery) -> Report {
    let subuid = SubIdMap::load(&config.subuid_file);
    let subgid = SubIdMap::load(&config.subgid_file);

    let mut accounts = Vec::new();
    for name in list_accounts(&config.home_dir, db, config.min_uid) {
        // The account may have been removed since enumeration.
        let Some(uid) = db.uid_by_name(&name) else {
            info!("{name}: uid no longer resolves, skipping");
            continue;
        };

        let subuid_range = subuid.allocation(&name);
        let linger = is_lingering(&config.linger_dir, &name);
        let socket = config.user_runtime_dir(uid).join(&config.socket_name);
        let runtime = runtime::detect(query, &name, uid, &socket).await;
        let container_uid = subuid.container_root_uid(&name);

        accounts.push(ReportRow {
            subgid: subgid.allocation(&name),
            name,
            uid,
            subuid: subuid_range,
            linger,
            runtime,
            container_uid,
        });
    }

    Report {
        accounts,
        suggestion: next_free_range(&subuid.bases()),
    }
}

fn flag(value: bool) -> &'static str {
    if value { YES } else { NO }
}

impl Report {
    pub fn write_table(&self, out: &mut impl Write) -> io::Result<()> {
        let divider = "=".repeat(DIVIDER_WIDTH);

        writeln!(out, "{divider}")?;
        writeln!(
            out,
            "{:<15} {:<20} {:<8} {:<10} {}",
            "Usuario", "Subuid", "Linger", "Docker", "Container UID"
        )?;
        writeln!(out, "{divider}")?;

        for row in &self.accounts {
            let subuid = row
                .subuid
                .map_or_else(|| NO.to_string(), |range| range.to_string());
            let container_uid = row
                .container_uid
                .map_or_else(|| NO_VALUE.to_string(), |uid| uid.to_string());
            writeln!(
                out,
                "{:<15} {:<20} {:<8} {:<10} {}",
                row.name,
                subuid,
                flag(row.linger),
                flag(row.runtime.is_active()),
                container_uid
            )?;
        }

        writeln!(out, "{divider}")?;

        if let Some(suggestion) = &self.suggestion {
            writeln!(out)?;
            writeln!(out, "💡 Siguiente rango disponible: {}", suggestion.range)?;
            writeln!(out, "   Container UID sería: {}", suggestion.container_uid)?;
        }

        Ok(())
    }

    pub fn write_json(&self, out: &mut impl Write) -> io::Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::fs;
    use std::path::Path;

    struct FixedState(HashMap<&'static str, &'static str>);

    impl UnitStateQuery for FixedState {
        async fn unit_state(&self, name: &str, _uid: u32) -> Option<String> {
            self.0.get(name).map(|s| s.to_string())
        }
    }

    fn render(report: &Report) -> String {
        let mut buf = Vec::new();
        report.write_table(&mut buf).unwrap();
        String::from_utf8(buf).unwrap()
    }

    fn test_config(root: &Path) -> Config {
        Config {
            home_dir: root.join("home"),
            subuid_file: root.join("subuid"),
            subgid_file: root.join("subgid"),
            linger_dir: root.join("linger"),
            runtime_dir: root.join("run/user"),
            ..Config::default()
        }
    }

    #[test]
    fn test_table_layout() {
        let report = Report {
            accounts: vec![
                ReportRow {
                    name: "alice".to_string(),
                    uid: 1000,
                    subuid: SubIdRange::new(100000, 65536),
                    subgid: None,
                    linger: true,
                    runtime: RuntimeActivity::Socket,
                    container_uid: Some(100999),
                },
                ReportRow {
                    name: "bob".to_string(),
                    uid: 1001,
                    subuid: None,
                    subgid: None,
                    linger: false,
                    runtime: RuntimeActivity::NotObserved,
                    container_uid: None,
                },
            ],
            suggestion: next_free_range(&[100000]),
        };

        let divider = "=".repeat(70);
        let expected = format!(
            "{divider}\n\
             Usuario         Subuid               Linger   Docker     Container UID\n\
             {divider}\n\
             alice           100000-165535        ✅        ✅          100999\n\
             bob             ❌                    ❌        ❌          -\n\
             {divider}\n\
             \n\
             💡 Siguiente rango disponible: 200000-265535\n   Container UID sería: 200999\n"
        );
        assert_eq!(render(&report), expected);
    }

    #[test]
    fn test_table_without_suggestion() {
        let report = Report {
            accounts: Vec::new(),
            suggestion: None,
        };
        let out = render(&report);
        assert_eq!(out.lines().count(), 4);
        assert!(!out.contains("Siguiente"));
    }

    #[tokio::test]
    async fn test_audit_end_to_end() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        for name in ["alice", "bob", "carol", "sys"] {
            fs::create_dir_all(config.home_dir.join(name)).unwrap();
        }
        fs::write(
            &config.subuid_file,
            "alice:100000:65536\nbob:165536:65536\nbroken:line\n",
        )
        .unwrap();
        fs::write(&config.subgid_file, "alice:100000:65536\n").unwrap();
        fs::create_dir_all(&config.linger_dir).unwrap();
        fs::write(config.linger_dir.join("alice"), "").unwrap();
        fs::create_dir_all(config.runtime_dir.join("1001")).unwrap();
        fs::write(config.runtime_dir.join("1001/docker.sock"), "").unwrap();

        let db: HashMap<String, u32> = [("alice", 1000), ("bob", 1001), ("carol", 1002), ("sys", 10)]
            .into_iter()
            .map(|(n, u)| (n.to_string(), u))
            .collect();
        let query = FixedState([("alice", "active"), ("carol", "inactive")].into());

        let report = audit(&config, &db, &query).await;
        let names: Vec<&str> = report.accounts.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob", "carol"]);

        let alice = &report.accounts[0];
        assert_eq!(alice.subuid.unwrap().to_string(), "100000-165535");
        assert_eq!(alice.subgid.unwrap().to_string(), "100000-165535");
        assert!(alice.linger);
        assert_eq!(alice.runtime, RuntimeActivity::SystemdUnit);
        assert_eq!(alice.container_uid, Some(100999));

        let bob = &report.accounts[1];
        assert_eq!(bob.subgid, None);
        assert!(!bob.linger);
        assert_eq!(bob.runtime, RuntimeActivity::Socket);
        assert_eq!(bob.container_uid, Some(166535));

        let carol = &report.accounts[2];
        assert_eq!(carol.subuid, None);
        assert_eq!(carol.runtime, RuntimeActivity::NotObserved);
        assert_eq!(carol.container_uid, None);

        let suggestion = report.suggestion.unwrap();
        assert_eq!(suggestion.range.to_string(), "200000-265535");
        assert_eq!(suggestion.container_uid, 200999);
    }

    #[tokio::test]
    async fn test_audit_without_map_has_no_suggestion() {
        let root = tempfile::tempdir().unwrap();
        let config = test_config(root.path());
        fs::create_dir_all(config.home_dir.join("alice")).unwrap();
        let db: HashMap<String, u32> = [("alice".to_string(), 1000)].into();

        let report = audit(&config, &db, &FixedState(HashMap::new())).await;
        assert_eq!(report.accounts.len(), 1);
        assert_eq!(report.suggestion, None);
        assert!(!render(&report).contains("💡"));
    }

    #[test]
    fn test_json_shape() {
        let report = Report {
            accounts: vec![ReportRow {
                name: "alice".to_string(),
                uid: 1000,
                subuid: SubIdRange::new(100000, 65536),
                subgid: None,
                linger: false,
                runtime: RuntimeActivity::NotObserved,
                container_uid: Some(100999),
            }],
            suggestion: None,
        };
        let mut buf = Vec::new();
        report.write_json(&mut buf).unwrap();
        let value: serde_json::Value = serde_json::from_slice(&buf).unwrap();

        assert_eq!(value["accounts"][0]["name"], "alice");
        assert_eq!(value["accounts"][0]["subuid"]["end"], 165535);
        assert_eq!(value["accounts"][0]["subgid"], serde_json::Value::Null);
        assert_eq!(value["accounts"][0]["runtime"], "not_observed");
        assert_eq!(value["suggestion"], serde_json::Value::Null);
    }
}
