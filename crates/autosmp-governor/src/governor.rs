//! Lifecycle coordinator — the single owner of all hotplug actions.
//!
//! The `Governor` consumes `Command`s one at a time. Timer ticks, suspend
//! and resume signals, and enable/disable toggles all arrive through the
//! same queue, so a transition can never interleave with a tick. When a
//! transition cancels the pending tick it also bumps the generation; a
//! `Tick` that was already queued by the old timer is then discarded.
//!
//! ```text
//!            enable                 suspend
//! Disabled ─────────► Running ─────────────► Suspended
//!    ▲                   │  ▲     resume        │
//!    │     disable       │  └───────────────────┘
//!    └───────────────────┴──────────────────────┘
//! ```
//!
//! Every transition passes through `Converging` while it forces the core
//! count.

use std::collections::BTreeSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use autosmp_core::{
    CoreId, CoreLifecycle, Decision, FrequencyOracle, LoadClass, Phase, PlatformResult, Tunable,
    TunableSnapshot, Tunables, PRIMARY_CORE,
};

use crate::decider::{self, Decider};
use crate::timer::TickScheduler;

/// Messages processed by the governor worker, strictly in arrival order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Timer expiry. Ignored unless `generation` is still current.
    Tick { generation: u64 },
    Suspend,
    Resume,
    Enable,
    Disable,
    /// Stop the worker.
    Shutdown,
}

/// Published after every processed command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GovernorStatus {
    pub phase: Phase,
    pub last_class: Option<LoadClass>,
    pub cycles: u32,
    /// Decision ticks evaluated since start.
    pub ticks: u64,
    pub last_decision: Decision,
    pub online: Vec<CoreId>,
}

impl GovernorStatus {
    fn initial() -> Self {
        Self {
            phase: Phase::Disabled,
            last_class: None,
            cycles: 0,
            ticks: 0,
            last_decision: Decision::NoChange,
            online: Vec::new(),
        }
    }
}

pub struct Governor<S> {
    oracle: Arc<dyn FrequencyOracle>,
    cores: Arc<dyn CoreLifecycle>,
    tunables: Arc<Tunables>,
    /// Operator-visible toggle, shared with every `GovernorHandle`.
    enabled: Arc<AtomicBool>,
    scheduler: S,
    decider: Decider,
    phase: Phase,
    generation: u64,
    pending: bool,
    ticks: u64,
    last_decision: Decision,
    status_tx: watch::Sender<GovernorStatus>,
}

impl<S: TickScheduler> Governor<S> {
    pub fn new(
        oracle: Arc<dyn FrequencyOracle>,
        cores: Arc<dyn CoreLifecycle>,
        tunables: Arc<Tunables>,
        enabled: Arc<AtomicBool>,
        scheduler: S,
    ) -> Self {
        let (status_tx, _) = watch::channel(GovernorStatus::initial());
        Self {
            oracle,
            cores,
            tunables,
            enabled,
            scheduler,
            decider: Decider::new(),
            phase: Phase::Disabled,
            generation: 0,
            pending: false,
            ticks: 0,
            last_decision: Decision::NoChange,
            status_tx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<GovernorStatus> {
        self.status_tx.subscribe()
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// Whether a tick is currently armed.
    pub fn tick_pending(&self) -> bool {
        self.pending
    }

    /// Arm the first tick after `startup_delay` if the toggle is on.
    pub fn start(&mut self, startup_delay: Duration) {
        if self.enabled.load(Ordering::SeqCst) {
            self.phase = Phase::Running;
            self.arm(startup_delay);
            info!(startup_delay_ms = startup_delay.as_millis() as u64, "governor started");
        } else {
            info!("governor started disabled");
        }
        self.publish();
    }

    /// Process one command. Returns `false` once the worker should stop.
    pub fn handle_command(&mut self, command: Command) -> bool {
        match command {
            Command::Tick { generation } => self.on_tick(generation),
            Command::Suspend => self.on_suspend(),
            Command::Resume => self.on_resume(),
            Command::Enable => self.on_enable(),
            Command::Disable => self.on_disable(),
            Command::Shutdown => {
                self.cancel();
                info!("governor shutting down");
                self.publish();
                return false;
            }
        }
        self.publish();
        true
    }

    fn arm(&mut self, delay: Duration) {
        self.generation += 1;
        self.pending = true;
        self.scheduler.schedule_after(delay, self.generation);
    }

    fn cancel(&mut self) {
        self.generation += 1;
        self.pending = false;
        self.scheduler.cancel_pending();
    }

    // ── Sampler/Decider ────────────────────────────────────────────

    fn on_tick(&mut self, generation: u64) {
        if generation != self.generation {
            debug!(generation, current = self.generation, "discarding stale tick");
            return;
        }
        self.pending = false;

        if self.phase != Phase::Running || !self.enabled.load(Ordering::SeqCst) {
            return;
        }

        let params = self.tunables.snapshot();
        match self.evaluate(&params) {
            Ok(decision) => {
                self.apply(decision);
                self.last_decision = decision;
            }
            Err(e) => {
                warn!(error = %e, "tick skipped");
                self.last_decision = Decision::NoChange;
            }
        }
        self.ticks += 1;

        self.arm(Duration::from_millis(params.tick_delay as u64));
    }

    fn evaluate(&mut self, params: &TunableSnapshot) -> PlatformResult<Decision> {
        let online = self.cores.online_set()?;
        let present = self.cores.present_set()?;
        let sample = decider::sample(self.oracle.as_ref(), &online)?;
        Ok(self.decider.decide(&sample, &online, &present, params))
    }

    fn apply(&self, decision: Decision) {
        match decision {
            Decision::Online(core) => match self.cores.bring_online(core) {
                Ok(()) => info!(core, "core brought online"),
                Err(e) => warn!(core, error = %e, "failed to bring core online"),
            },
            Decision::Offline(core) => match self.cores.take_offline(core) {
                Ok(()) => info!(core, "core taken offline"),
                Err(e) => warn!(core, error = %e, "failed to take core offline"),
            },
            Decision::NoChange => {}
        }
    }

    // ── Transitions ────────────────────────────────────────────────

    fn on_enable(&mut self) {
        if self.phase != Phase::Disabled {
            debug!(phase = %self.phase, "enable ignored");
            return;
        }
        self.decider.reset();
        self.phase = Phase::Running;
        let delay = self.tunables.get(Tunable::TickDelay);
        self.arm(Duration::from_millis(delay as u64));
        info!("enabled");
    }

    fn on_disable(&mut self) {
        if self.phase == Phase::Disabled {
            debug!("disable ignored: already disabled");
            return;
        }
        self.cancel();
        self.converge_up();
        self.decider.reset();
        self.phase = Phase::Disabled;
        info!("disabled");
    }

    fn on_suspend(&mut self) {
        if self.phase != Phase::Running {
            debug!(phase = %self.phase, "suspend ignored");
            return;
        }
        self.cancel();
        self.converge_to_primary();
        self.decider.reset();
        self.phase = Phase::Suspended;
        info!("suspended");
    }

    fn on_resume(&mut self) {
        if self.phase != Phase::Suspended {
            debug!(phase = %self.phase, "resume ignored");
            return;
        }
        self.converge_up();
        self.phase = Phase::Running;
        let delay = self.tunables.get(Tunable::TickDelay);
        self.arm(Duration::from_millis(delay as u64));
        info!("resumed");
    }

    /// Bring every present offline core online while below `max_cores`.
    fn converge_up(&mut self) {
        self.phase = Phase::Converging;
        self.publish();

        let (present, online) = match self.core_sets() {
            Ok(sets) => sets,
            Err(e) => {
                warn!(error = %e, "cannot read core sets, skipping convergence");
                return;
            }
        };
        let max_cores = self.tunables.get(Tunable::MaxCores) as usize;
        let mut count = online.len();

        for core in present.difference(&online).copied() {
            if count >= max_cores {
                break;
            }
            match self.cores.bring_online(core) {
                Ok(()) => {
                    count += 1;
                    debug!(core, "core brought online");
                }
                Err(e) => warn!(core, error = %e, "failed to bring core online"),
            }
        }
        info!(online = count, max_cores, "converged up");
    }

    /// Take every non-primary core offline, ignoring `min_cores`.
    fn converge_to_primary(&mut self) {
        self.phase = Phase::Converging;
        self.publish();

        let online = match self.cores.online_set() {
            Ok(online) => online,
            Err(e) => {
                warn!(error = %e, "cannot read online set, skipping convergence");
                return;
            }
        };
        for core in online.into_iter().filter(|&c| c != PRIMARY_CORE) {
            match self.cores.take_offline(core) {
                Ok(()) => debug!(core, "core taken offline"),
                Err(e) => warn!(core, error = %e, "failed to take core offline"),
            }
        }
        info!("converged to primary core");
    }

    fn core_sets(&self) -> PlatformResult<(BTreeSet<CoreId>, BTreeSet<CoreId>)> {
        Ok((self.cores.present_set()?, self.cores.online_set()?))
    }

    fn publish(&self) {
        let online = self
            .cores
            .online_set()
            .map(|s| s.into_iter().collect())
            .unwrap_or_default();
        self.status_tx.send_replace(GovernorStatus {
            phase: self.phase,
            last_class: self.decider.last_class(),
            cycles: self.decider.cycles(),
            ticks: self.ticks,
            last_decision: self.last_decision,
            online,
        });
    }
}
