//! Operator API listener.

use std::net::SocketAddr;

use tokio::task::JoinHandle;
use tracing::{info, warn};

use autosmp_governor::GovernorHandle;

/// Bind `addr` and serve the operator API in the background.
///
/// A bind failure is not fatal: it is logged and `None` is returned, and the
/// governor keeps running with its in-memory tunables.
pub async fn spawn_api(addr: SocketAddr, governor: GovernorHandle) -> Option<JoinHandle<()>> {
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            warn!(%addr, error = %e, "operator API unavailable, running with in-memory tunables only");
            return None;
        }
    };
    let local = listener.local_addr().unwrap_or(addr);
    info!(addr = %local, "operator API listening");

    let router = autosmp_api::build_router(governor);
    Some(tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, router).await {
            warn!(error = %e, "operator API stopped");
        }
    }))
}
