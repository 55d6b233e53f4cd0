//! Governor error types.

use thiserror::Error;

use autosmp_core::TunableError;

/// Errors surfaced by the governor handle.
#[derive(Debug, Error)]
pub enum GovernorError {
    /// The worker's execution context could not be created.
    #[error("cannot start governor worker: {0}")]
    Spawn(String),

    /// The worker has stopped and no longer accepts commands.
    #[error("governor worker is not running")]
    Closed,

    #[error(transparent)]
    Tunable(#[from] TunableError),
}

pub type GovernorResult<T> = Result<T, GovernorError>;
