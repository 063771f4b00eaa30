// Copyright (c) 2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

use std::collections::BTreeMap;
use std::convert::TryFrom;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::host::HostInfo;
use crate::units::format_size;
use crate::{LimitKind, DEFAULT_CPU_SHARE, DEFAULT_MEMORY};

/// The limits of a single process, keyed by kind. A missing kind means
/// the process is not limited for it.
///
/// Iteration always follows registry order, see `LimitKind::ALL`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<LimitKind, i64>",
    into = "BTreeMap<LimitKind, i64>"
)]
pub struct ResourceSet {
    limits: BTreeMap<LimitKind, i64>,
}

impl ResourceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in defaults used when no defaults file is configured:
    /// 1 GiB of memory and the full CPU share.
    pub fn system_defaults() -> Self {
        let mut set = Self::new();
        set.limits.insert(LimitKind::Memory, DEFAULT_MEMORY);
        set.limits.insert(LimitKind::CpuShare, DEFAULT_CPU_SHARE);
        set
    }

    /// Parses "kind=value" entries into a set.
    ///
    /// The whole batch fails on the first bad entry. When a kind appears
    /// more than once the last entry wins.
    pub fn parse<I, S>(entries: I) -> Result<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut set = Self::new();

        for entry in entries {
            let entry = entry.as_ref();
            let mut parts = entry.splitn(2, '=');
            let (token, value) = match (parts.next(), parts.next()) {
                (Some(token), Some(value)) => (token, value),
                _ => return Err(Error::MalformedEntry(entry.to_string())),
            };

            let kind: LimitKind = token.parse()?;
            set.limits.insert(kind, kind.parse_value(value)?);
        }

        Ok(set)
    }

    pub fn get(&self, kind: LimitKind) -> Option<i64> {
        self.limits.get(&kind).copied()
    }

    /// Sets a limit after checking it against the kind's range.
    pub fn set(&mut self, kind: LimitKind, value: i64) -> Result<()> {
        kind.validate(value)?;
        self.limits.insert(kind, value);
        Ok(())
    }

    pub fn remove(&mut self, kind: LimitKind) -> Option<i64> {
        self.limits.remove(&kind)
    }

    pub fn contains(&self, kind: LimitKind) -> bool {
        self.limits.contains_key(&kind)
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    pub fn len(&self) -> usize {
        self.limits.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (LimitKind, i64)> + '_ {
        self.limits.iter().map(|(k, v)| (*k, *v))
    }

    /// Checks every entry against its kind's range.
    pub fn validate(&self) -> Result<()> {
        self.iter().try_for_each(|(kind, value)| kind.validate(value))
    }

    /// Returns a copy of this set with every kind it lacks filled in from
    /// `defaults`. Kinds already present keep their value.
    pub fn apply_defaults(&self, defaults: &ResourceSet) -> ResourceSet {
        let mut merged = self.clone();
        for (kind, value) in defaults.iter() {
            merged.limits.entry(kind).or_insert(value);
        }
        merged
    }

    /// Returns the container runtime flags enforcing this set, one per
    /// kind present, in registry order.
    pub fn docker_options<H: HostInfo + ?Sized>(&self, host: &H) -> Vec<String> {
        self.iter()
            .map(|(kind, value)| format_docker(kind, value, host))
            .collect()
    }

    /// Human-readable `(kind, value)` pairs in registry order.
    pub fn describe(&self) -> Vec<(LimitKind, String)> {
        self.iter()
            .map(|(kind, value)| (kind, format(kind, value)))
            .collect()
    }
}

impl TryFrom<BTreeMap<LimitKind, i64>> for ResourceSet {
    type Error = Error;

    fn try_from(limits: BTreeMap<LimitKind, i64>) -> Result<Self> {
        let set = ResourceSet { limits };
        set.validate()?;
        Ok(set)
    }
}

impl From<ResourceSet> for BTreeMap<LimitKind, i64> {
    fn from(set: ResourceSet) -> Self {
        set.limits
    }
}

/// Renders a single limit for humans: memory as a binary size, CPU share
/// as a percentage.
pub fn format(kind: LimitKind, value: i64) -> String {
    match kind {
        LimitKind::Memory => format_size(value),
        LimitKind::CpuShare => format!("{}%", value),
    }
}

/// Renders a single limit as a container runtime flag.
///
/// Memory is passed as a raw byte count. CPU share is turned into a number
/// of CPUs relative to the host, two significant digits, never more than
/// the host has.
pub fn format_docker<H: HostInfo + ?Sized>(kind: LimitKind, value: i64, host: &H) -> String {
    match kind {
        LimitKind::Memory => format!("--memory={}", value),
        LimitKind::CpuShare => {
            let cores = host.logical_cpus() as f64;
            let cpus = round_significant(cores * value as f64 / 100.0).min(cores);
            format!("--cpus=\"{}\"", cpus)
        }
    }
}

// Two significant digits. Formatting through the exponent notation does
// the rounding, Display prints the result back in fixed notation.
fn round_significant(value: f64) -> f64 {
    format!("{:.1e}", value).parse().unwrap_or(value)
}
