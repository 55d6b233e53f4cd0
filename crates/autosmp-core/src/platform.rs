//! Collaborator traits consumed by the governor.
//!
//! The governor never touches hardware directly. It queries clock rates
//! through a `FrequencyOracle` and flips cores through a `CoreLifecycle`.
//! Both are synchronous, bounded-latency calls made from the governor's
//! single worker.

use std::collections::BTreeSet;

use crate::error::PlatformResult;
use crate::types::{CoreId, Rate};

/// Reports current and maximum clock rate per core.
pub trait FrequencyOracle: Send + Sync {
    /// Current clock rate of `core`.
    fn rate(&self, core: CoreId) -> PlatformResult<Rate>;

    /// Maximum clock rate `core` may currently run at.
    fn max_rate(&self, core: CoreId) -> PlatformResult<Rate>;
}

/// Onlines and offlines logical cores and reports the current sets.
pub trait CoreLifecycle: Send + Sync {
    fn bring_online(&self, core: CoreId) -> PlatformResult<()>;

    fn take_offline(&self, core: CoreId) -> PlatformResult<()>;

    /// Cores currently online. Always a subset of `present_set()`.
    fn online_set(&self) -> PlatformResult<BTreeSet<CoreId>>;

    /// Cores present in the system. Fixed for the life of the process.
    fn present_set(&self) -> PlatformResult<BTreeSet<CoreId>>;
}
