// Copyright (c) 2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

use std::collections::BTreeMap;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::{LimitKind, ResourceSet};

/// The limits of every process of an application, keyed by process name.
///
/// Entries with an empty resource set carry no information; they are
/// dropped by `prune`, which the store runs on every load and save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LimitSet {
    processes: BTreeMap<String, ResourceSet>,
}

impl LimitSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, process: &str) -> Option<&ResourceSet> {
        self.processes.get(process)
    }

    /// Replaces the limits of `process`.
    pub fn insert(&mut self, process: impl Into<String>, resources: ResourceSet) {
        self.processes.insert(process.into(), resources);
    }

    /// Drops every limit of `process`.
    pub fn remove(&mut self, process: &str) -> Option<ResourceSet> {
        self.processes.remove(process)
    }

    /// Drops a single kind from `process`, and the process itself once it
    /// has no limit left.
    pub fn clear_kind(&mut self, process: &str, kind: LimitKind) -> Option<i64> {
        let resources = self.processes.get_mut(process)?;
        let removed = resources.remove(kind);
        if resources.is_empty() {
            self.processes.remove(process);
        }
        removed
    }

    /// The limits that apply to `process`: its own set with `defaults`
    /// filling the gaps. A process without an entry gets the defaults.
    pub fn resources_for(&self, process: &str, defaults: &ResourceSet) -> ResourceSet {
        match self.processes.get(process) {
            Some(resources) => resources.apply_defaults(defaults),
            None => defaults.clone(),
        }
    }

    /// Removes every process whose resource set is empty.
    pub fn prune(&mut self) {
        self.processes.retain(|process, resources| {
            if resources.is_empty() {
                debug!("dropping empty resource limits for process {:?}", process);
                return false;
            }
            true
        });
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Processes and their limits, ordered by process name.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ResourceSet)> + '_ {
        self.processes.iter().map(|(p, r)| (p.as_str(), r))
    }
}
