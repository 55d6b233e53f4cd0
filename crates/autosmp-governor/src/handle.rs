//! Governor handle — the operator-facing side of a running governor.
//!
//! `spawn` starts the worker on the current tokio runtime and hands back a
//! cloneable `GovernorHandle`. Tunable reads and writes go straight to the
//! shared table; everything that changes the lifecycle state is posted to
//! the worker's queue.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info};

use autosmp_core::{
    CoreLifecycle, FrequencyOracle, TunableError, TunableSnapshot, Tunables,
    config::DEFAULT_STARTUP_DELAY_MS,
};

use crate::error::{GovernorError, GovernorResult};
use crate::governor::{Command, Governor, GovernorStatus};
use crate::timer::TokioTimer;

/// Initial state for a new governor.
#[derive(Debug, Clone)]
pub struct GovernorOptions {
    pub tunables: TunableSnapshot,
    pub enabled: bool,
    /// Delay before the very first tick.
    pub startup_delay: Duration,
}

impl GovernorOptions {
    /// Defaults for a system with `present_cores` cores.
    pub fn defaults(present_cores: u32) -> Self {
        Self {
            tunables: TunableSnapshot::defaults(present_cores),
            enabled: true,
            startup_delay: Duration::from_millis(DEFAULT_STARTUP_DELAY_MS),
        }
    }
}

#[derive(Clone)]
pub struct GovernorHandle {
    tx: mpsc::UnboundedSender<Command>,
    tunables: Arc<Tunables>,
    enabled: Arc<AtomicBool>,
    status: watch::Receiver<GovernorStatus>,
}

/// Start a governor worker on the current tokio runtime.
///
/// Fails if called outside a runtime.
pub fn spawn(
    oracle: Arc<dyn FrequencyOracle>,
    cores: Arc<dyn CoreLifecycle>,
    options: GovernorOptions,
) -> GovernorResult<(GovernorHandle, JoinHandle<()>)> {
    let runtime = Handle::try_current().map_err(|e| GovernorError::Spawn(e.to_string()))?;

    let (tx, rx) = mpsc::unbounded_channel();
    let tunables = Arc::new(Tunables::from_snapshot(options.tunables));
    let enabled = Arc::new(AtomicBool::new(options.enabled));
    let timer = TokioTimer::new(runtime.clone(), tx.downgrade());

    let mut governor = Governor::new(oracle, cores, tunables.clone(), enabled.clone(), timer);
    let status = governor.subscribe();
    governor.start(options.startup_delay);

    let worker = runtime.spawn(run_worker(governor, rx));

    let handle = GovernorHandle {
        tx,
        tunables,
        enabled,
        status,
    };
    Ok((handle, worker))
}

async fn run_worker(
    mut governor: Governor<TokioTimer>,
    mut rx: mpsc::UnboundedReceiver<Command>,
) {
    debug!("governor worker running");
    while let Some(command) = rx.recv().await {
        if !governor.handle_command(command) {
            break;
        }
    }
    info!("governor worker stopped");
}

/// Parse a boolean toggle the way kernel module parameters do.
pub fn parse_toggle(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "y" | "yes" | "true" | "on" => Some(true),
        "0" | "n" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}

impl GovernorHandle {
    fn send(&self, command: Command) -> GovernorResult<()> {
        self.tx.send(command).map_err(|_| GovernorError::Closed)
    }

    pub fn tunables(&self) -> &Tunables {
        &self.tunables
    }

    /// Read a tunable by name as text.
    pub fn get(&self, name: &str) -> Result<String, TunableError> {
        self.tunables.get_by_name(name)
    }

    /// Write a tunable by name from text. Takes effect on the next tick.
    pub fn set(&self, name: &str, value: &str) -> Result<u32, TunableError> {
        let parsed = self.tunables.set_by_name(name, value)?;
        debug!(name, value = parsed, "tunable written");
        Ok(parsed)
    }

    pub fn enabled(&self) -> bool {
        self.enabled.load(Ordering::SeqCst)
    }

    /// Flip the toggle and run the matching lifecycle transition.
    pub fn set_enabled(&self, enabled: bool) -> GovernorResult<()> {
        self.enabled.store(enabled, Ordering::SeqCst);
        self.send(if enabled {
            Command::Enable
        } else {
            Command::Disable
        })
    }

    /// Text form of `set_enabled`. Unparseable input leaves the toggle as is.
    pub fn set_enabled_str(&self, value: &str) -> GovernorResult<bool> {
        let enabled = parse_toggle(value).ok_or_else(|| TunableError::InvalidArgument {
            name: "enabled".to_string(),
            value: value.to_string(),
        })?;
        self.set_enabled(enabled)?;
        Ok(enabled)
    }

    pub fn suspend(&self) -> GovernorResult<()> {
        self.send(Command::Suspend)
    }

    pub fn resume(&self) -> GovernorResult<()> {
        self.send(Command::Resume)
    }

    /// Stop the worker. Pending ticks are cancelled; the core set is left
    /// as it is.
    pub fn shutdown(&self) -> GovernorResult<()> {
        self.send(Command::Shutdown)
    }

    /// Latest status published by the worker.
    pub fn status(&self) -> GovernorStatus {
        self.status.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<GovernorStatus> {
        self.status.clone()
    }
}
