//! Deferred execution for the decision tick.
//!
//! The governor never sleeps itself. It asks a `TickScheduler` to post a
//! `Command::Tick` back into its queue after a delay, tagged with the
//! generation that was current when the tick was armed.

use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc::WeakUnboundedSender;
use tokio::task::JoinHandle;
use tracing::trace;

use crate::governor::Command;

/// Arms and cancels the single pending tick.
pub trait TickScheduler: Send {
    /// Post `Command::Tick { generation }` after `delay`. Replaces any
    /// tick that is still pending.
    fn schedule_after(&mut self, delay: Duration, generation: u64);

    /// Drop the pending tick, if any.
    fn cancel_pending(&mut self);
}

/// `TickScheduler` backed by a tokio sleep task.
///
/// Holds only a weak sender, so a pending timer never keeps the worker's
/// queue open after every `GovernorHandle` is gone.
pub struct TokioTimer {
    runtime: Handle,
    queue: WeakUnboundedSender<Command>,
    pending: Option<JoinHandle<()>>,
}

impl TokioTimer {
    pub fn new(runtime: Handle, queue: WeakUnboundedSender<Command>) -> Self {
        Self {
            runtime,
            queue,
            pending: None,
        }
    }
}

impl TickScheduler for TokioTimer {
    fn schedule_after(&mut self, delay: Duration, generation: u64) {
        self.cancel_pending();
        let queue = self.queue.clone();
        self.pending = Some(self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            if let Some(tx) = queue.upgrade() {
                let _ = tx.send(Command::Tick { generation });
            }
        }));
        trace!(delay_ms = delay.as_millis() as u64, generation, "tick armed");
    }

    fn cancel_pending(&mut self) {
        if let Some(handle) = self.pending.take() {
            handle.abort();
        }
    }
}

impl Drop for TokioTimer {
    fn drop(&mut self) {
        self.cancel_pending();
    }
}
