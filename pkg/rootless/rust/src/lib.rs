// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

// Correctness
#![deny(clippy::indexing_slicing)]
#![deny(clippy::string_slice)]
#![deny(clippy::cast_possible_wrap)]
// Panicking code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]
#![deny(clippy::unimplemented)]
#![deny(clippy::todo)]
// Debug code that shouldn't be in production
#![deny(clippy::dbg_macro)]
#![deny(clippy::print_stdout)]
#![deny(clippy::print_stderr)]

pub mod accounts;
pub mod cli;
mod command;
pub mod config;
pub mod errors;
mod linger;
pub mod report;
pub mod runtime;
pub mod subid;

// Re-export the public API
pub use accounts::{AccountDb, SystemAccounts};
pub use config::Config;
pub use report::{Report, ReportRow, audit};
pub use runtime::{RuntimeActivity, SystemdUserQuery, UnitStateQuery};
pub use subid::{SubIdRange, Suggestion};
