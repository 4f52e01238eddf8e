// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use rootless_audit::cli::{Args, OutputFormat};
use rootless_audit::config::{config_path, load_config};
use rootless_audit::{SystemAccounts, SystemdUserQuery, audit};

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (path, explicit) = config_path(args.config);
    let config = load_config(&path, explicit)?;
    simple_logger::init_with_level(config.log_level()?)?;
    debug!("using config {:?} (from {})", config, path.display());

    let query = SystemdUserQuery::new(&config);
    let report = audit(&config, &SystemAccounts, &query).await;
    info!("audited {} accounts", report.accounts.len());

    let mut out = io::stdout().lock();
    match args.format {
        OutputFormat::Table => report.write_table(&mut out),
        OutputFormat::Json => report.write_json(&mut out),
    }
    .and_then(|()| out.flush())
    .context("failed to write report")
}
