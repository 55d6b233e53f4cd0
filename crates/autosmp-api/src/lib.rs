//! autosmp-api — operator surface for a running governor.
//!
//! Each tunable is its own text resource, mirroring a sysfs attribute: a
//! `GET` returns the value followed by a newline and a `PUT` takes the new
//! value as the request body.
//!
//! # API Routes
//!
//! | Method | Path | Description |
//! |---|---|---|
//! | GET | `/conf` | All tunables as JSON |
//! | GET | `/conf/{name}` | One tunable as text |
//! | PUT | `/conf/{name}` | Write one tunable (text body) |
//! | GET | `/enabled` | Toggle as `1` / `0` |
//! | PUT | `/enabled` | Enable or disable the governor |
//! | GET | `/status` | Lifecycle phase, last decision, online cores |
//! | POST | `/suspend` | Deliver a suspend signal |
//! | POST | `/resume` | Deliver a resume signal |

pub mod handlers;

use axum::Router;
use axum::routing::{get, post};
use autosmp_governor::GovernorHandle;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub governor: GovernorHandle,
}

/// Build the operator router.
pub fn build_router(governor: GovernorHandle) -> Router {
    let state = ApiState { governor };

    Router::new()
        .route("/conf", get(handlers::list_tunables))
        .route("/conf/{name}", get(handlers::get_tunable).put(handlers::set_tunable))
        .route("/enabled", get(handlers::get_enabled).put(handlers::set_enabled))
        .route("/status", get(handlers::status))
        .route("/suspend", post(handlers::suspend))
        .route("/resume", post(handlers::resume))
        .with_state(state)
}
