// Unless explicitly stated otherwise all files in this repository are licensed
// under the Apache License Version 2.0.
// This product includes software developed at Datadog (https://www.datadoghq.com/).
// Copyright 2026-present Datadog, Inc.

//! Lookups against the sub-ordinate ID map files (`/etc/subuid`,
//! `/etc/subgid`), whose lines have the form `name:base:count`.

use log::{debug, warn};
use serde::Serialize;
use std::fmt;
use std::io::ErrorKind;
use std::path::Path;

/// Offset of the sub-ID that rootless runtimes map to UID 0 in a container.
pub const CONTAINER_ROOT_OFFSET: u64 = 999;
/// Allocations are handed out on boundaries of this size.
pub const ALLOCATION_STRIDE: u64 = 100_000;
/// Size of the range suggested for a new account.
pub const SUGGESTED_COUNT: u64 = 65_536;

/// A closed interval `[base, base + count - 1]` of sub-ordinate IDs. With a
/// zero count `end` is `base - 1`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SubIdRange {
    pub base: u64,
    pub count: u64,
    pub end: u64,
}

impl SubIdRange {
    /// Returns `None` only when `base + count - 1` can't be represented. An
    /// empty allocation still has an end, one below its base.
    pub fn new(base: u64, count: u64) -> Option<Self> {
        let end = base.checked_add(count)?.checked_sub(1)?;
        Some(Self { base, count, end })
    }
}

impl fmt::Display for SubIdRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.base, self.end)
    }
}

/// The next unallocated range, as proposed for a new account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Suggestion {
    pub range: SubIdRange,
    pub container_uid: u64,
}

/// Contents of one sub-ID map file. A file that can't be read behaves like
/// an empty one.
#[derive(Debug, Clone, Default)]
pub struct SubIdMap {
    contents: String,
}

impl SubIdMap {
    pub fn load(path: &Path) -> Self {
        match std::fs::read_to_string(path) {
            Ok(contents) => Self { contents },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("{} does not exist", path.display());
                Self::default()
            }
            Err(e) => {
                warn!("could not read {}: {e}", path.display());
                Self::default()
            }
        }
    }

    fn first_line_for(&self, name: &str) -> Option<Vec<&str>> {
        self.contents
            .lines()
            .find(|line| line.split_once(':').is_some_and(|(head, _)| head == name))
            .map(|line| line.split(':').collect())
    }

    /// Allocation of `name`, from the first line whose first field is exactly
    /// `name`. Later duplicates are never consulted, even when the first line
    /// is malformed.
    pub fn allocation(&self, name: &str) -> Option<SubIdRange> {
        let fields = self.first_line_for(name)?;
        let [_, base, count, ..] = fields.as_slice() else {
            return None;
        };
        SubIdRange::new(parse_id(base)?, parse_id(count)?)
    }

    /// UID that shows up as root inside a rootless container run by `name`.
    /// Only needs the base field, so it can exist without an allocation.
    pub fn container_root_uid(&self, name: &str) -> Option<u64> {
        let fields = self.first_line_for(name)?;
        parse_id(fields.get(1)?)?.checked_add(CONTAINER_ROOT_OFFSET)
    }

    /// Every parseable base offset in the file, in file order.
    pub fn bases(&self) -> Vec<u64> {
        self.contents
            .lines()
            .filter(|line| line.contains(':'))
            .filter_map(|line| line.split(':').nth(1).and_then(parse_id))
            .collect()
    }
}

fn parse_id(field: &str) -> Option<u64> {
    field.trim().parse().ok()
}

/// First stride boundary strictly above the largest base, even when that base
/// already sits on a boundary.
pub fn next_free_range(bases: &[u64]) -> Option<Suggestion> {
    let max = bases.iter().copied().max()?;
    let next = (max / ALLOCATION_STRIDE)
        .checked_add(1)?
        .checked_mul(ALLOCATION_STRIDE)?;
    Some(Suggestion {
        range: SubIdRange::new(next, SUGGESTED_COUNT)?,
        container_uid: next.checked_add(CONTAINER_ROOT_OFFSET)?,
    })
}
