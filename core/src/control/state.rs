use crate::catalog::Preset;
use crate::prelude::SignalMode;
use serde::Serialize;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum PatrolPhase {
    Patrolling,
    DwellSearch,
    Confirming,
    Tracking,
    Stopped,
}

impl PatrolPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, PatrolPhase::Stopped)
    }
}

/// Mutable state of the control loop, owned by `PatrolController`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerState {
    pub phase: PatrolPhase,
    /// Position in the patrol order of the preset last moved to.
    pub pointer: Option<usize>,
    pub last_detection: Option<Duration>,
}

impl Default for ControllerState {
    fn default() -> Self {
        Self {
            phase: PatrolPhase::Patrolling,
            pointer: None,
            last_detection: None,
        }
    }
}

/// Read-only view published after every transition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatrolSnapshot {
    pub phase: PatrolPhase,
    pub preset: Option<Preset>,
    pub trackable: bool,
    pub signal_mode: SignalMode,
    pub cycles_completed: u64,
    pub entered_at_seconds: f64,
}
