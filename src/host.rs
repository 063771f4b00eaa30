// Copyright (c) 2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

use log::warn;
use nix::unistd::{sysconf, SysconfVar};

/// Facts about the host that runtime flags depend on.
pub trait HostInfo {
    /// Number of logical CPUs currently online.
    fn logical_cpus(&self) -> usize;
}

/// The executing host. Every call asks the kernel again, nothing is
/// cached.
#[derive(Debug, Clone, Copy, Default)]
pub struct System;

impl HostInfo for System {
    fn logical_cpus(&self) -> usize {
        match sysconf(SysconfVar::_NPROCESSORS_ONLN) {
            Ok(Some(n)) if n > 0 => n as usize,
            Ok(_) => {
                warn!("sysconf reported no online CPUs, assuming 1");
                1
            }
            Err(e) => {
                warn!("sysconf(_SC_NPROCESSORS_ONLN) failed: {}, assuming 1", e);
                1
            }
        }
    }
}
