//! Domain types shared by the governor and its collaborators.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a logical core, as numbered by the platform.
pub type CoreId = u32;

/// The primary core. Always present, never taken offline, and the
/// reference for the maximum achievable clock rate.
pub const PRIMARY_CORE: CoreId = 0;

/// Clock rate as reported by the frequency oracle (platform units, kHz on
/// Linux).
pub type Rate = u64;

// ── Load classification ────────────────────────────────────────────

/// Condition class observed by a single decision tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoadClass {
    /// Every online core runs above the up threshold.
    High,
    /// Every non-primary online core runs below the down threshold.
    Low,
    Neutral,
}

impl fmt::Display for LoadClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadClass::High => write!(f, "high"),
            LoadClass::Low => write!(f, "low"),
            LoadClass::Neutral => write!(f, "neutral"),
        }
    }
}

// ── Decisions ──────────────────────────────────────────────────────

/// Outcome of one decision tick. At most one core changes state per tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", content = "core", rename_all = "snake_case")]
pub enum Decision {
    /// Bring the given core online.
    Online(CoreId),
    /// Take the given core offline.
    Offline(CoreId),
    /// No change needed.
    NoChange,
}

// ── Lifecycle phase ────────────────────────────────────────────────

/// High-level state of the governor's lifecycle coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Not ticking; the core set is left to whoever else owns it.
    Disabled,
    /// Ticking periodically.
    Running,
    /// Parked at the primary core until resume.
    Suspended,
    /// Forcing the core count during a transition.
    Converging,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Phase::Disabled => "disabled",
            Phase::Running => "running",
            Phase::Suspended => "suspended",
            Phase::Converging => "converging",
        };
        f.write_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decision_serializes_with_action_tag() {
        let json = serde_json::to_string(&Decision::Offline(3)).unwrap();
        assert_eq!(json, r#"{"action":"offline","core":3}"#);

        let json = serde_json::to_string(&Decision::NoChange).unwrap();
        assert_eq!(json, r#"{"action":"no_change"}"#);
    }

    #[test]
    fn phase_display() {
        assert_eq!(Phase::Suspended.to_string(), "suspended");
        assert_eq!(LoadClass::High.to_string(), "high");
    }
}
