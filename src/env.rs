// Copyright (c) 2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::{Error, Result};

/// Root directory holding one directory per application.
pub const ROOT_ENV: &str = "DOKKU_ROOT";
/// Root directory for shared library data.
pub const LIB_ROOT_ENV: &str = "DOKKU_LIB_ROOT";

/// File name of the limits document, both per app and for the defaults.
pub const LIMITS_FILE: &str = "RESOURCES.yml";
/// File name of an application's process-scaling file.
pub const SCALE_FILE: &str = "DOKKU_SCALE";

/// Where limit documents live on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    root: PathBuf,
    lib_root: PathBuf,
}

impl Environment {
    pub fn new(root: impl Into<PathBuf>, lib_root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            lib_root: lib_root.into(),
        }
    }

    /// Reads both roots from the process environment. An unset or empty
    /// variable is an error.
    pub fn from_env() -> Result<Self> {
        Ok(Self::new(require_env(ROOT_ENV)?, require_env(LIB_ROOT_ENV)?))
    }

    pub fn app_root(&self, app: &str) -> PathBuf {
        self.root.join(app)
    }

    pub fn limit_file_path(&self, app: &str) -> PathBuf {
        self.app_root(app).join(LIMITS_FILE)
    }

    pub fn defaults_file_path(&self) -> PathBuf {
        self.lib_root.join("data").join("limit").join(LIMITS_FILE)
    }

    pub fn scale_file_path(&self, app: &str) -> PathBuf {
        self.app_root(app).join(SCALE_FILE)
    }
}

fn require_env(key: &'static str) -> Result<String> {
    match env::var(key) {
        Ok(value) if !value.is_empty() => Ok(value),
        _ => Err(Error::MissingEnv(key)),
    }
}

/// Reads the process names declared in a scaling file, one
/// `<process>=<count>` per line. A missing file declares no process.
pub fn app_processes(path: &Path) -> Result<BTreeSet<String>> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            debug!("no scale file at {:?}", path);
            return Ok(BTreeSet::new());
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    Ok(raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .filter_map(|line| line.split('=').next())
        .map(str::to_string)
        .collect())
}
