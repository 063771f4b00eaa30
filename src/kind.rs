// Copyright (c) 2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::units::{parse_percent_like, parse_size};
use crate::CPU_SHARE_MAX;

/// A kind of resource that can be limited.
///
/// The declaration order is the canonical registry order: flags, summaries
/// and persisted documents all list kinds in this order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum LimitKind {
    /// Memory limit in bytes.
    #[serde(rename = "memory")]
    Memory,
    /// Share of the host CPUs, in percent.
    #[serde(rename = "cpu")]
    CpuShare,
}

impl LimitKind {
    /// All supported kinds, in registry order.
    pub const ALL: [LimitKind; 2] = [LimitKind::Memory, LimitKind::CpuShare];

    pub fn token(self) -> &'static str {
        match self {
            LimitKind::Memory => "memory",
            LimitKind::CpuShare => "cpu",
        }
    }

    /// Looks up a kind by its exact token. No case folding or prefix
    /// matching is done.
    pub fn from_token(token: &str) -> Option<LimitKind> {
        LimitKind::ALL.iter().copied().find(|k| k.token() == token)
    }

    /// Parses a user-supplied quantity for this kind and checks it against
    /// the kind's range.
    pub fn parse_value(self, s: &str) -> Result<i64> {
        let value = match self {
            LimitKind::Memory => parse_size(s)?,
            LimitKind::CpuShare => parse_percent_like(s)?,
        };
        self.validate(value)?;

        Ok(value)
    }

    /// Every kind rejects non-positive quantities. CPU share is further
    /// capped at `CPU_SHARE_MAX` percent.
    pub fn validate(self, value: i64) -> Result<()> {
        let in_range = match self {
            LimitKind::Memory => value > 0,
            LimitKind::CpuShare => value > 0 && value <= CPU_SHARE_MAX,
        };
        if !in_range {
            return Err(Error::OutOfRange { kind: self, value });
        }

        Ok(())
    }
}

impl fmt::Display for LimitKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.token())
    }
}

impl FromStr for LimitKind {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        LimitKind::from_token(s).ok_or_else(|| Error::UnknownLimitKind(s.to_string()))
    }
}
