use crate::camera_interface::{CameraError, MoveStatus};
use crate::catalog::TrackablePolicy;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tunables shared by every component of the patrol loop.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PatrolConfig {
    pub dwell_seconds: f64,
    pub person_clear_seconds: f64,
    /// Controller poll interval, also the wait hint handed to event pulls.
    pub event_poll_seconds: f64,
    pub idle_hold_seconds: f64,
    pub move_finish_timeout: f64,
    pub status_poll_seconds: f64,
    pub confirm_seconds: f64,
    pub ptz_speed: f32,
    pub use_events: bool,
    pub event_keywords: Vec<String>,
    pub event_message_limit: usize,
    pub trackable: TrackablePolicy,
}

impl Default for PatrolConfig {
    fn default() -> Self {
        Self {
            dwell_seconds: 10.0,
            person_clear_seconds: 8.0,
            event_poll_seconds: 0.5,
            idle_hold_seconds: 0.6,
            move_finish_timeout: 8.0,
            status_poll_seconds: 0.3,
            confirm_seconds: 2.0,
            ptz_speed: 0.5,
            use_events: true,
            event_keywords: ["motion", "people", "person", "human"]
                .iter()
                .map(|k| k.to_string())
                .collect(),
            event_message_limit: 10,
            trackable: TrackablePolicy::default(),
        }
    }
}

impl PatrolConfig {
    pub fn validate(&self) -> PatrolResult<()> {
        let positive = [
            ("dwell_seconds", self.dwell_seconds),
            ("person_clear_seconds", self.person_clear_seconds),
            ("event_poll_seconds", self.event_poll_seconds),
            ("move_finish_timeout", self.move_finish_timeout),
            ("status_poll_seconds", self.status_poll_seconds),
            ("confirm_seconds", self.confirm_seconds),
        ];
        for (name, value) in positive {
            if !value.is_finite() || value <= 0.0 {
                return Err(PatrolError::InvalidConfig(format!(
                    "{} must be a positive number of seconds, got {}",
                    name, value
                )));
            }
        }

        if !self.idle_hold_seconds.is_finite() || self.idle_hold_seconds < 0.0 {
            return Err(PatrolError::InvalidConfig(format!(
                "idle_hold_seconds must not be negative, got {}",
                self.idle_hold_seconds
            )));
        }

        if !(0.0..=1.0).contains(&self.ptz_speed) {
            return Err(PatrolError::InvalidConfig(format!(
                "ptz_speed must lie within 0..=1, got {}",
                self.ptz_speed
            )));
        }

        if self.use_events && self.event_keywords.iter().all(|k| k.trim().is_empty()) {
            return Err(PatrolError::InvalidConfig(
                "event_keywords must name at least one topic keyword when events are used".into(),
            ));
        }

        if self.event_message_limit == 0 {
            return Err(PatrolError::InvalidConfig(
                "event_message_limit must be at least 1".into(),
            ));
        }

        Ok(())
    }

    pub fn dwell(&self) -> Duration {
        Duration::from_secs_f64(self.dwell_seconds)
    }

    pub fn clear_after(&self) -> Duration {
        Duration::from_secs_f64(self.person_clear_seconds)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs_f64(self.event_poll_seconds)
    }

    pub fn idle_hold(&self) -> Duration {
        Duration::from_secs_f64(self.idle_hold_seconds)
    }

    pub fn move_timeout(&self) -> Duration {
        Duration::from_secs_f64(self.move_finish_timeout)
    }

    pub fn status_poll(&self) -> Duration {
        Duration::from_secs_f64(self.status_poll_seconds)
    }

    pub fn confirm_window(&self) -> Duration {
        Duration::from_secs_f64(self.confirm_seconds)
    }
}

/// Tri-state result of one detection sample. `Unknown` is never "absent".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Presence {
    Detected,
    Absent,
    Unknown,
}

impl Presence {
    pub fn from_leaves<I: IntoIterator<Item = bool>>(leaves: I) -> Self {
        leaves.into_iter().fold(Presence::Unknown, |acc, leaf| {
            match (acc, leaf) {
                (Presence::Detected, _) | (_, true) => Presence::Detected,
                _ => Presence::Absent,
            }
        })
    }
}

/// What a single `MotionSignal::sample` call observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading {
    /// Presence resolved from the event feed.
    Event(Presence),
    /// Move status from the polling fallback, never a real detection.
    Status(MoveStatus),
}

impl Reading {
    /// `true` for a real detection or the polling heuristic's `Moving`.
    pub fn indicates_activity(&self) -> bool {
        matches!(
            self,
            Reading::Event(Presence::Detected) | Reading::Status(MoveStatus::Moving)
        )
    }

    pub fn is_heuristic(&self) -> bool {
        matches!(self, Reading::Status(_))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SignalMode {
    Events,
    StatusPolling,
}

/// Source of "is a person here right now" samples.
pub trait MotionSignal {
    /// Never blocks longer than `timeout_hint` plus transport latency.
    fn sample(&mut self, timeout_hint: Duration) -> Reading;
    fn mode(&self) -> SignalMode;
}

/// Startup faults. Anything reported here aborts before the patrol starts.
#[derive(thiserror::Error, Debug)]
pub enum PatrolError {
    #[error("missing required configuration: {0}")]
    MissingConfig(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("capability discovery failed: {0}")]
    CapabilityDiscovery(String),
    #[error("camera reported no media profiles")]
    NoProfiles,
    #[error("camera reported no presets for profile {0}")]
    EmptyPresetList(String),
    #[error("none of the {0} presets carries a usable index")]
    EmptyPatrolOrder(usize),
    #[error("camera call failed during startup: {0}")]
    Camera(#[from] CameraError),
}

pub type PatrolResult<T> = Result<T, PatrolError>;
