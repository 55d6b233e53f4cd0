//! Linux sysfs backend.
//!
//! Reads clock rates from cpufreq and flips cores through the hotplug
//! `online` attribute. The root is configurable so tests can point it at a
//! temporary tree.

use std::collections::BTreeSet;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::debug;

use autosmp_core::{CoreId, CoreLifecycle, FrequencyOracle, PlatformError, PlatformResult, Rate};

use crate::cpulist::parse_cpu_list;

pub struct SysfsPlatform {
    root: PathBuf,
}

impl SysfsPlatform {
    /// Use the given cpu directory, normally `/sys/devices/system/cpu`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn core_dir(&self, core: CoreId) -> PathBuf {
        self.root.join(format!("cpu{core}"))
    }

    fn read_trimmed(path: &Path) -> PlatformResult<String> {
        std::fs::read_to_string(path)
            .map(|s| s.trim().to_string())
            .map_err(|source| PlatformError::Io {
                path: path.to_path_buf(),
                source,
            })
    }

    fn read_rate(path: &Path) -> PlatformResult<Rate> {
        let raw = Self::read_trimmed(path)?;
        raw.parse().map_err(|_| PlatformError::Parse {
            path: path.to_path_buf(),
            value: raw,
        })
    }

    fn read_set(&self, file: &str) -> PlatformResult<BTreeSet<CoreId>> {
        let path = self.root.join(file);
        let raw = Self::read_trimmed(&path)?;
        parse_cpu_list(&raw).ok_or(PlatformError::Parse { path, value: raw })
    }

    fn write_online(&self, core: CoreId, online: bool) -> PlatformResult<()> {
        let dir = self.core_dir(core);
        if !dir.is_dir() {
            return Err(PlatformError::NoSuchCore(core));
        }
        let path = dir.join("online");
        let value = if online { "1" } else { "0" };
        std::fs::write(&path, value).map_err(|source| PlatformError::Io { path, source })?;
        debug!(core, online, "wrote hotplug state");
        Ok(())
    }
}

impl FrequencyOracle for SysfsPlatform {
    /// A core without a cpufreq policy reads as rate 0.
    fn rate(&self, core: CoreId) -> PlatformResult<Rate> {
        match Self::read_rate(&self.core_dir(core).join("cpufreq/scaling_cur_freq")) {
            Err(PlatformError::Io { source, .. }) if source.kind() == ErrorKind::NotFound => Ok(0),
            other => other,
        }
    }

    fn max_rate(&self, core: CoreId) -> PlatformResult<Rate> {
        Self::read_rate(&self.core_dir(core).join("cpufreq/scaling_max_freq"))
    }
}

impl CoreLifecycle for SysfsPlatform {
    fn bring_online(&self, core: CoreId) -> PlatformResult<()> {
        self.write_online(core, true)
    }

    fn take_offline(&self, core: CoreId) -> PlatformResult<()> {
        self.write_online(core, false)
    }

    fn online_set(&self) -> PlatformResult<BTreeSet<CoreId>> {
        self.read_set("online")
    }

    fn present_set(&self) -> PlatformResult<BTreeSet<CoreId>> {
        self.read_set("present")
    }
}
