//! autosmp-governor — load-driven CPU core hotplug.
//!
//! Samples per-core clock rates on a fixed delay and brings one core online
//! or takes one offline per tick, with hysteresis and min/max bounds. Forces
//! the core count on suspend, resume, enable and disable.
//!
//! # Architecture
//!
//! ```text
//! GovernorHandle (Clone, shared with the operator surface)
//!   ├── Arc<Tunables>     lock-free reads/writes by name
//!   ├── Arc<AtomicBool>   the enabled toggle
//!   └── mpsc::UnboundedSender<Command>
//!            │
//!            ▼
//! worker task (single consumer)
//!   └── Governor
//!       ├── Decider       per-tick sample → classify → decision
//!       ├── TokioTimer    posts Command::Tick after the delay
//!       ├── FrequencyOracle
//!       └── CoreLifecycle
//! ```
//!
//! Commands are handled strictly in arrival order, so a suspend or disable
//! can never race a tick that is already running.

pub mod decider;
pub mod error;
pub mod governor;
pub mod handle;
pub mod timer;

pub use decider::{Decider, Sample};
pub use error::{GovernorError, GovernorResult};
pub use governor::{Command, Governor, GovernorStatus};
pub use handle::{spawn, GovernorHandle, GovernorOptions};
pub use timer::{TickScheduler, TokioTimer};
