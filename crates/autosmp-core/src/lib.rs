//! autosmp-core — shared building blocks for the autosmp hotplug governor.
//!
//! Holds everything the governor, the platform backends and the operator
//! surface agree on:
//!
//! - `CoreId`, `LoadClass`, `Phase` and the per-tick `Decision`
//! - The `Tunables` table (lock-free, readable and writable by name)
//! - The `FrequencyOracle` / `CoreLifecycle` collaborator traits
//! - The `autosmp.toml` config file
//!
//! The crate has no runtime of its own; it is safe to share across threads.

pub mod config;
pub mod error;
pub mod platform;
pub mod tunables;
pub mod types;

pub use config::{AutosmpConfig, BackendConfig};
pub use error::{PlatformError, PlatformResult, TunableError};
pub use platform::{CoreLifecycle, FrequencyOracle};
pub use tunables::{Tunable, TunableSnapshot, Tunables};
pub use types::*;
