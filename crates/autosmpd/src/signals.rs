//! Suspend/resume signal source.
//!
//! `SIGUSR1` delivers a suspend and `SIGUSR2` a resume, so a platform
//! sleep hook can drive the governor with `kill -USR1`.

use tokio::task::JoinHandle;
use tracing::warn;

use autosmp_governor::GovernorHandle;

#[cfg(unix)]
pub fn spawn_forwarder(governor: GovernorHandle) -> Option<JoinHandle<()>> {
    use tokio::signal::unix::{signal, SignalKind};
    use tracing::info;

    let (mut suspend, mut resume) =
        match (signal(SignalKind::user_defined1()), signal(SignalKind::user_defined2())) {
            (Ok(s), Ok(r)) => (s, r),
            (Err(e), _) | (_, Err(e)) => {
                warn!(error = %e, "cannot install suspend/resume signal handlers");
                return None;
            }
        };

    Some(tokio::spawn(async move {
        loop {
            let result = tokio::select! {
                Some(()) = suspend.recv() => {
                    info!("suspend signal received");
                    governor.suspend()
                }
                Some(()) = resume.recv() => {
                    info!("resume signal received");
                    governor.resume()
                }
                else => break,
            };
            if let Err(e) = result {
                warn!(error = %e, "governor gone, stopping signal forwarder");
                break;
            }
        }
    }))
}

#[cfg(not(unix))]
pub fn spawn_forwarder(_governor: GovernorHandle) -> Option<JoinHandle<()>> {
    warn!("suspend/resume signals are not supported on this platform");
    None
}
