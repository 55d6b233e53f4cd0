//! Platform backend selection.

use std::sync::Arc;

use autosmp_core::config::DEFAULT_SYSFS_ROOT;
use autosmp_core::{BackendConfig, CoreLifecycle, FrequencyOracle, Rate};
use autosmp_platform::{SimPlatform, SysfsPlatform};

const DEFAULT_SIM_MAX_RATE: Rate = 2_000_000;

/// The two collaborator trait objects handed to the governor.
pub struct Backend {
    pub name: &'static str,
    pub oracle: Arc<dyn FrequencyOracle>,
    pub cores: Arc<dyn CoreLifecycle>,
}

pub fn build(config: &BackendConfig) -> anyhow::Result<Backend> {
    match config {
        BackendConfig::Sysfs { root } => {
            let root = root.clone().unwrap_or_else(|| DEFAULT_SYSFS_ROOT.into());
            if !root.is_dir() {
                anyhow::bail!("sysfs cpu directory not found: {}", root.display());
            }
            let platform = Arc::new(SysfsPlatform::new(root));
            Ok(Backend {
                name: "sysfs",
                oracle: platform.clone(),
                cores: platform,
            })
        }
        BackendConfig::Sim { cores, max_rate } => {
            let platform = Arc::new(SimPlatform::new(
                *cores,
                max_rate.unwrap_or(DEFAULT_SIM_MAX_RATE),
            ));
            Ok(Backend {
                name: "sim",
                oracle: platform.clone(),
                cores: platform,
            })
        }
    }
}
