//! Error types for the tunable table and platform collaborators.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::CoreId;

/// Errors returned by the tunable table's get/set-by-name surface.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TunableError {
    #[error("unknown tunable: {0}")]
    UnknownTunable(String),

    #[error("invalid argument for {name}: {value:?}")]
    InvalidArgument { name: String, value: String },
}

/// Result type alias for platform collaborator calls.
pub type PlatformResult<T> = Result<T, PlatformError>;

/// Errors raised by the frequency oracle or the core lifecycle manager.
///
/// The governor never escalates these: a failed read or hotplug request
/// only skips the current tick.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("i/o error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("unparseable value in {path}: {value:?}")]
    Parse { path: PathBuf, value: String },

    #[error("no such core: {0}")]
    NoSuchCore(CoreId),

    #[error("core {core} rejected the request: {reason}")]
    Rejected { core: CoreId, reason: String },
}
