//! autosmp.toml configuration parser.
//!
//! The file only seeds in-memory state at startup. Runtime writes to the
//! tunable table are never written back.

use serde::{Deserialize, Serialize};
use std::net::{Ipv4Addr, SocketAddr, SocketAddrV4};
use std::path::{Path, PathBuf};

use crate::tunables::TunableSnapshot;

/// Delay before the first tick after the controller starts.
pub const DEFAULT_STARTUP_DELAY_MS: u64 = 20_000;

pub const DEFAULT_SYSFS_ROOT: &str = "/sys/devices/system/cpu";

/// Operator API address used when the config names none.
pub const DEFAULT_LISTEN: SocketAddr = SocketAddr::V4(SocketAddrV4::new(Ipv4Addr::LOCALHOST, 7878));

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AutosmpConfig {
    pub enabled: Option<bool>,
    pub startup_delay_ms: Option<u64>,
    pub tunables: Option<TunablesConfig>,
    pub backend: Option<BackendConfig>,
    pub api: Option<ApiConfig>,
}

/// Initial tunable values. Unset fields keep their defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TunablesConfig {
    pub tick_delay: Option<u32>,
    pub min_cores: Option<u32>,
    pub max_cores: Option<u32>,
    pub up_threshold_pct: Option<u32>,
    pub down_threshold_pct: Option<u32>,
    pub cycles_up: Option<u32>,
    pub cycles_down: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BackendConfig {
    /// Linux cpufreq + cpu hotplug files.
    Sysfs { root: Option<PathBuf> },
    /// In-memory cores, for dry runs.
    Sim {
        cores: u32,
        max_rate: Option<u64>,
    },
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiConfig {
    /// `false` turns the operator API off.
    pub enabled: Option<bool>,
    pub listen: Option<SocketAddr>,
}

impl AutosmpConfig {
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AutosmpConfig = toml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> anyhow::Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    pub fn enabled(&self) -> bool {
        self.enabled.unwrap_or(true)
    }

    pub fn startup_delay_ms(&self) -> u64 {
        self.startup_delay_ms.unwrap_or(DEFAULT_STARTUP_DELAY_MS)
    }

    /// Initial tunable values for a system with `present_cores` cores.
    pub fn initial_tunables(&self, present_cores: u32) -> TunableSnapshot {
        let mut s = TunableSnapshot::defaults(present_cores);
        if let Some(t) = &self.tunables {
            s.tick_delay = t.tick_delay.unwrap_or(s.tick_delay);
            s.min_cores = t.min_cores.unwrap_or(s.min_cores);
            s.max_cores = t.max_cores.unwrap_or(s.max_cores);
            s.up_threshold_pct = t.up_threshold_pct.unwrap_or(s.up_threshold_pct);
            s.down_threshold_pct = t.down_threshold_pct.unwrap_or(s.down_threshold_pct);
            s.cycles_up = t.cycles_up.unwrap_or(s.cycles_up);
            s.cycles_down = t.cycles_down.unwrap_or(s.cycles_down);
        }
        s
    }

    pub fn backend(&self) -> BackendConfig {
        self.backend.clone().unwrap_or(BackendConfig::Sysfs { root: None })
    }

    /// Operator API address, or `None` when the API is turned off.
    pub fn listen_addr(&self) -> Option<SocketAddr> {
        match &self.api {
            Some(ApiConfig {
                enabled: Some(false),
                ..
            }) => None,
            Some(api) => Some(api.listen.unwrap_or(DEFAULT_LISTEN)),
            None => Some(DEFAULT_LISTEN),
        }
    }
}
