// Copyright (c) 2018 Levente Kurusa
// Copyright (c) 2020-2025 Ant Group
//
// SPDX-License-Identifier: Apache-2.0 or MIT
//

//! Resource limits (memory, CPU share) for the processes of an
//! application.
//!
//! User input such as `memory=512m` or `cpu=50` is parsed into a
//! [`ResourceSet`], merged with the configured defaults, stored per process
//! in a [`LimitSet`] and finally rendered into container runtime flags.

pub mod env;
pub mod error;
pub use error::{Error, Result};
pub mod host;
pub use host::{HostInfo, System};
pub mod kind;
pub use kind::LimitKind;
pub mod limits;
pub use limits::LimitSet;
pub mod resources;
pub use resources::ResourceSet;
pub mod store;
pub mod units;

/// The maximum CPU share, in percent of the host CPUs
pub const CPU_SHARE_MAX: i64 = 100;
/// Default memory limit when no defaults are configured, 1 GiB
pub const DEFAULT_MEMORY: i64 = 1 << 30;
/// Default CPU share when no defaults are configured
pub const DEFAULT_CPU_SHARE: i64 = CPU_SHARE_MAX;
