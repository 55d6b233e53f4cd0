//! In-memory platform with scriptable clock rates.
//!
//! Offline cores report a rate of zero, like cpufreq does for a core
//! without an active policy. Every successful hotplug request is appended
//! to an event log so callers can check exactly which cores moved.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::sync::{Mutex, MutexGuard, PoisonError};

use autosmp_core::{
    CoreId, CoreLifecycle, FrequencyOracle, PlatformError, PlatformResult, Rate, PRIMARY_CORE,
};

/// A hotplug request that went through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotplugEvent {
    Online(CoreId),
    Offline(CoreId),
}

struct SimState {
    present: BTreeSet<CoreId>,
    online: BTreeSet<CoreId>,
    rates: HashMap<CoreId, Rate>,
    max_rate: Rate,
    /// Cores whose hotplug requests are refused.
    stuck: HashSet<CoreId>,
    /// When set, every rate query fails.
    oracle_down: bool,
    events: Vec<HotplugEvent>,
}

pub struct SimPlatform {
    state: Mutex<SimState>,
}

impl SimPlatform {
    /// `cores` present cores, all online, all idling at zero.
    pub fn new(cores: u32, max_rate: Rate) -> Self {
        let present: BTreeSet<CoreId> = (0..cores.max(1)).collect();
        Self {
            state: Mutex::new(SimState {
                online: present.clone(),
                present,
                rates: HashMap::new(),
                max_rate,
                stuck: HashSet::new(),
                oracle_down: false,
                events: Vec::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, SimState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the online set without logging events.
    pub fn set_online(&self, cores: impl IntoIterator<Item = CoreId>) {
        let mut state = self.state();
        let online: BTreeSet<CoreId> = cores.into_iter().collect();
        state.online = online.intersection(&state.present).copied().collect();
    }

    pub fn set_rate(&self, core: CoreId, rate: Rate) {
        self.state().rates.insert(core, rate);
    }

    /// Set the same rate on every present core.
    pub fn set_all_rates(&self, rate: Rate) {
        let mut state = self.state();
        let present: Vec<CoreId> = state.present.iter().copied().collect();
        for core in present {
            state.rates.insert(core, rate);
        }
    }

    /// Refuse (or stop refusing) hotplug requests for `core`.
    pub fn set_stuck(&self, core: CoreId, stuck: bool) {
        let mut state = self.state();
        if stuck {
            state.stuck.insert(core);
        } else {
            state.stuck.remove(&core);
        }
    }

    pub fn set_oracle_down(&self, down: bool) {
        self.state().oracle_down = down;
    }

    pub fn online_count(&self) -> usize {
        self.state().online.len()
    }

    pub fn is_online(&self, core: CoreId) -> bool {
        self.state().online.contains(&core)
    }

    /// Drain the hotplug event log.
    pub fn take_events(&self) -> Vec<HotplugEvent> {
        std::mem::take(&mut self.state().events)
    }

    fn hotplug(&self, core: CoreId, online: bool) -> PlatformResult<()> {
        let mut state = self.state();
        if !state.present.contains(&core) {
            return Err(PlatformError::NoSuchCore(core));
        }
        if state.stuck.contains(&core) {
            return Err(PlatformError::Rejected {
                core,
                reason: "core is stuck".to_string(),
            });
        }
        if !online && core == PRIMARY_CORE {
            return Err(PlatformError::Rejected {
                core,
                reason: "primary core cannot go offline".to_string(),
            });
        }
        let changed = if online {
            state.online.insert(core)
        } else {
            state.online.remove(&core)
        };
        if changed {
            let event = if online {
                HotplugEvent::Online(core)
            } else {
                HotplugEvent::Offline(core)
            };
            state.events.push(event);
        }
        Ok(())
    }
}

impl FrequencyOracle for SimPlatform {
    fn rate(&self, core: CoreId) -> PlatformResult<Rate> {
        let state = self.state();
        if state.oracle_down {
            return Err(PlatformError::Rejected {
                core,
                reason: "oracle unavailable".to_string(),
            });
        }
        if !state.online.contains(&core) {
            return Ok(0);
        }
        Ok(state.rates.get(&core).copied().unwrap_or(0))
    }

    fn max_rate(&self, core: CoreId) -> PlatformResult<Rate> {
        let state = self.state();
        if state.oracle_down {
            return Err(PlatformError::Rejected {
                core,
                reason: "oracle unavailable".to_string(),
            });
        }
        Ok(state.max_rate)
    }
}

impl CoreLifecycle for SimPlatform {
    fn bring_online(&self, core: CoreId) -> PlatformResult<()> {
        self.hotplug(core, true)
    }

    fn take_offline(&self, core: CoreId) -> PlatformResult<()> {
        self.hotplug(core, false)
    }

    fn online_set(&self) -> PlatformResult<BTreeSet<CoreId>> {
        Ok(self.state().online.clone())
    }

    fn present_set(&self) -> PlatformResult<BTreeSet<CoreId>> {
        Ok(self.state().present.clone())
    }
}
