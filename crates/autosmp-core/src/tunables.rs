//! Tunable table — the operator-visible governor parameters.
//!
//! Every parameter is an unsigned integer backed by an atomic, so the tick
//! can read while an operator writes without either side blocking. There
//! is no cross-field transaction: a tick may observe a mix of old and new
//! values when several fields are written in quick succession.
//!
//! Values are never range-checked. Contradictory settings such as
//! `min_cores > max_cores` are accepted verbatim and only change what the
//! decision tick ends up doing.

use std::str::FromStr;
use std::sync::atomic::{AtomicU32, Ordering};

use serde::{Deserialize, Serialize};

use crate::error::TunableError;

pub const DEFAULT_TICK_DELAY_MS: u32 = 100;
pub const DEFAULT_MIN_CORES: u32 = 1;
pub const DEFAULT_UP_THRESHOLD_PCT: u32 = 90;
pub const DEFAULT_DOWN_THRESHOLD_PCT: u32 = 60;
pub const DEFAULT_CYCLES_UP: u32 = 1;
pub const DEFAULT_CYCLES_DOWN: u32 = 1;

/// A named entry in the tunable table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tunable {
    TickDelay,
    MinCores,
    MaxCores,
    UpThresholdPct,
    DownThresholdPct,
    CyclesUp,
    CyclesDown,
}

impl Tunable {
    pub const ALL: [Tunable; 7] = [
        Tunable::TickDelay,
        Tunable::MinCores,
        Tunable::MaxCores,
        Tunable::UpThresholdPct,
        Tunable::DownThresholdPct,
        Tunable::CyclesUp,
        Tunable::CyclesDown,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Tunable::TickDelay => "tick_delay",
            Tunable::MinCores => "min_cores",
            Tunable::MaxCores => "max_cores",
            Tunable::UpThresholdPct => "up_threshold_pct",
            Tunable::DownThresholdPct => "down_threshold_pct",
            Tunable::CyclesUp => "cycles_up",
            Tunable::CyclesDown => "cycles_down",
        }
    }
}

impl FromStr for Tunable {
    type Err = TunableError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Tunable::ALL
            .into_iter()
            .find(|t| t.name() == s)
            .ok_or_else(|| TunableError::UnknownTunable(s.to_string()))
    }
}

/// Point-in-time copy of the table, taken once at the start of a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TunableSnapshot {
    pub tick_delay: u32,
    pub min_cores: u32,
    pub max_cores: u32,
    pub up_threshold_pct: u32,
    pub down_threshold_pct: u32,
    pub cycles_up: u32,
    pub cycles_down: u32,
}

impl TunableSnapshot {
    /// Defaults for a system with `present_cores` cores.
    pub fn defaults(present_cores: u32) -> Self {
        Self {
            tick_delay: DEFAULT_TICK_DELAY_MS,
            min_cores: DEFAULT_MIN_CORES,
            max_cores: present_cores,
            up_threshold_pct: DEFAULT_UP_THRESHOLD_PCT,
            down_threshold_pct: DEFAULT_DOWN_THRESHOLD_PCT,
            cycles_up: DEFAULT_CYCLES_UP,
            cycles_down: DEFAULT_CYCLES_DOWN,
        }
    }
}

/// The live tunable table.
#[derive(Debug)]
pub struct Tunables {
    tick_delay: AtomicU32,
    min_cores: AtomicU32,
    max_cores: AtomicU32,
    up_threshold_pct: AtomicU32,
    down_threshold_pct: AtomicU32,
    cycles_up: AtomicU32,
    cycles_down: AtomicU32,
}

impl Tunables {
    /// Create a table seeded with the defaults for `present_cores` cores.
    pub fn new(present_cores: u32) -> Self {
        Self::from_snapshot(TunableSnapshot::defaults(present_cores))
    }

    pub fn from_snapshot(s: TunableSnapshot) -> Self {
        Self {
            tick_delay: AtomicU32::new(s.tick_delay),
            min_cores: AtomicU32::new(s.min_cores),
            max_cores: AtomicU32::new(s.max_cores),
            up_threshold_pct: AtomicU32::new(s.up_threshold_pct),
            down_threshold_pct: AtomicU32::new(s.down_threshold_pct),
            cycles_up: AtomicU32::new(s.cycles_up),
            cycles_down: AtomicU32::new(s.cycles_down),
        }
    }

    fn slot(&self, tunable: Tunable) -> &AtomicU32 {
        match tunable {
            Tunable::TickDelay => &self.tick_delay,
            Tunable::MinCores => &self.min_cores,
            Tunable::MaxCores => &self.max_cores,
            Tunable::UpThresholdPct => &self.up_threshold_pct,
            Tunable::DownThresholdPct => &self.down_threshold_pct,
            Tunable::CyclesUp => &self.cycles_up,
            Tunable::CyclesDown => &self.cycles_down,
        }
    }

    pub fn get(&self, tunable: Tunable) -> u32 {
        self.slot(tunable).load(Ordering::Relaxed)
    }

    pub fn set(&self, tunable: Tunable, value: u32) {
        self.slot(tunable).store(value, Ordering::Relaxed);
    }

    /// Read a tunable by name, rendered as text.
    pub fn get_by_name(&self, name: &str) -> Result<String, TunableError> {
        let tunable: Tunable = name.parse()?;
        Ok(self.get(tunable).to_string())
    }

    /// Write a tunable by name from its text form.
    ///
    /// Surrounding whitespace (including the trailing newline an `echo`
    /// leaves behind) is ignored. Anything else that is not an unsigned
    /// integer is rejected and the stored value is left untouched.
    pub fn set_by_name(&self, name: &str, value: &str) -> Result<u32, TunableError> {
        let tunable: Tunable = name.parse()?;
        let parsed = value
            .trim()
            .parse::<u32>()
            .map_err(|_| TunableError::InvalidArgument {
                name: name.to_string(),
                value: value.to_string(),
            })?;
        self.set(tunable, parsed);
        Ok(parsed)
    }

    pub fn snapshot(&self) -> TunableSnapshot {
        TunableSnapshot {
            tick_delay: self.get(Tunable::TickDelay),
            min_cores: self.get(Tunable::MinCores),
            max_cores: self.get(Tunable::MaxCores),
            up_threshold_pct: self.get(Tunable::UpThresholdPct),
            down_threshold_pct: self.get(Tunable::DownThresholdPct),
            cycles_up: self.get(Tunable::CyclesUp),
            cycles_down: self.get(Tunable::CyclesDown),
        }
    }

    /// All entries as `(name, value)` pairs in table order.
    pub fn entries(&self) -> Vec<(&'static str, u32)> {
        Tunable::ALL
            .into_iter()
            .map(|t| (t.name(), self.get(t)))
            .collect()
    }
}
