//! autosmp-platform — backends for the governor's collaborator traits.
//!
//! - `SysfsPlatform` drives a real Linux system through
//!   `/sys/devices/system/cpu`: `cpuN/cpufreq/scaling_{cur,max}_freq` for
//!   rates, `cpuN/online` for hotplug, and the `online` / `present` cpulists
//!   for the core sets.
//! - `SimPlatform` keeps everything in memory. Tests use it to script clock
//!   rates, and `autosmpd --backend sim` uses it for dry runs.

pub mod cpulist;
pub mod sim;
pub mod sysfs;

pub use cpulist::{format_cpu_list, parse_cpu_list};
pub use sim::{HotplugEvent, SimPlatform};
pub use sysfs::SysfsPlatform;
