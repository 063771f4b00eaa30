// Copyright (c) 2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

use std::path::PathBuf;

use crate::LimitKind;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error("invalid resource limit: {0:?}")]
    MalformedEntry(String),

    #[error("invalid resource limit type: {0:?}")]
    UnknownLimitKind(String),

    #[error("invalid resource limit value: {0:?}")]
    MalformedQuantity(String),

    #[error("{kind} limit out of range: {value}")]
    OutOfRange { kind: LimitKind, value: i64 },

    #[error("environment variable {0} is not set")]
    MissingEnv(&'static str),

    #[error("failed to access {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to decode {path:?}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("failed to encode resource limits: {0}")]
    Encode(#[from] serde_yaml::Error),
}

impl Error {
    /// Whether the error was raised while reading or writing a persisted
    /// limits file, as opposed to rejecting user input.
    pub fn is_persistence_failure(&self) -> bool {
        matches!(
            self,
            Error::Io { .. } | Error::Decode { .. } | Error::Encode(_)
        )
    }

    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
