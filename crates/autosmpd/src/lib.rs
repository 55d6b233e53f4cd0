//! Daemon building blocks shared by the `autosmpd` binary and its tests.

pub mod backend;
pub mod operator;
pub mod signals;
