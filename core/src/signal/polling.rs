use crate::camera_interface::{CameraService, MoveStatus};
use crate::prelude::{MotionSignal, Reading, SignalMode};
use crate::telemetry::{MetricsRecorder, TransitionLog};
use std::sync::Arc;
use std::time::Duration;

/// Fallback when no event feed exists. Reports the move status only, which
/// the controller treats as a weak hint that something is happening.
pub struct StatusPollSignal {
    camera: Arc<dyn CameraService>,
    profile: String,
    metrics: Arc<MetricsRecorder>,
    logger: TransitionLog,
}

impl StatusPollSignal {
    pub fn new(
        camera: Arc<dyn CameraService>,
        profile: impl Into<String>,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            camera,
            profile: profile.into(),
            metrics,
            logger: TransitionLog::new(),
        }
    }
}

impl MotionSignal for StatusPollSignal {
    fn sample(&mut self, _timeout_hint: Duration) -> Reading {
        match self.camera.get_status(&self.profile) {
            Ok(status) => Reading::Status(status),
            Err(err) => {
                self.metrics.record_transport_fault();
                self.logger.fault("querying move status", &err);
                Reading::Status(MoveStatus::Unknown)
            }
        }
    }

    fn mode(&self) -> SignalMode {
        SignalMode::StatusPolling
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_interface::CameraError;
    use crate::prelude::Presence;
    use crate::testing::ScriptedCamera;

    #[test]
    fn maps_status_and_never_reports_a_detection() {
        let camera = Arc::new(ScriptedCamera::new());
        camera.push_status(Ok(MoveStatus::Moving));
        camera.push_status(Ok(MoveStatus::Idle));
        camera.push_status(Err(CameraError::Timeout(Duration::from_secs(8))));
        let metrics = Arc::new(MetricsRecorder::new());
        let mut signal = StatusPollSignal::new(camera, "profile_1", metrics.clone());

        let readings: Vec<Reading> = (0..3)
            .map(|_| signal.sample(Duration::from_millis(500)))
            .collect();

        assert_eq!(
            readings,
            vec![
                Reading::Status(MoveStatus::Moving),
                Reading::Status(MoveStatus::Idle),
                Reading::Status(MoveStatus::Unknown),
            ]
        );
        assert!(readings
            .iter()
            .all(|r| *r != Reading::Event(Presence::Detected)));
        assert_eq!(metrics.snapshot().transport_faults, 1);
        assert_eq!(signal.mode(), SignalMode::StatusPolling);
    }
}
