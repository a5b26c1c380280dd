use crate::camera_interface::CameraError;
use crate::catalog::Preset;
use crate::control::PatrolPhase;
use log::{debug, info, warn};

/// Formats patrol and detection transitions for the log.
pub struct TransitionLog;

impl TransitionLog {
    pub fn new() -> Self {
        Self
    }

    pub fn record(&self, message: &str) {
        info!("{}", message);
    }

    pub fn transition(&self, from: PatrolPhase, to: PatrolPhase, preset: Option<&Preset>) {
        match preset {
            Some(preset) => info!("{:?} -> {:?} at {}", from, to, preset),
            None => info!("{:?} -> {:?}", from, to),
        }
    }

    pub fn fault(&self, context: &str, err: &CameraError) {
        warn!("{} failed: {}", context, err);
    }

    pub fn violation(&self, detail: &str) {
        debug!("skipping notification: {}", detail);
    }
}

impl Default for TransitionLog {
    fn default() -> Self {
        Self::new()
    }
}
