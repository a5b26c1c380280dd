use crate::camera_interface::{CameraService, MoveStatus};
use crate::control::{CancelToken, Clock};
use crate::telemetry::{MetricsRecorder, TransitionLog};
use std::sync::Arc;
use std::time::Duration;

/// Blocks until a commanded move has physically finished.
pub struct MovementWaiter {
    camera: Arc<dyn CameraService>,
    profile: String,
    clock: Arc<dyn Clock>,
    cancel: CancelToken,
    poll_interval: Duration,
    idle_hold: Duration,
    metrics: Arc<MetricsRecorder>,
    logger: TransitionLog,
}

impl MovementWaiter {
    pub fn new(
        camera: Arc<dyn CameraService>,
        profile: impl Into<String>,
        clock: Arc<dyn Clock>,
        cancel: CancelToken,
        metrics: Arc<MetricsRecorder>,
    ) -> Self {
        Self {
            camera,
            profile: profile.into(),
            clock,
            cancel,
            poll_interval: Duration::from_millis(300),
            idle_hold: Duration::ZERO,
            metrics,
            logger: TransitionLog::new(),
        }
    }

    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    /// Status must stay `Idle` this long before the move counts as done.
    pub fn with_idle_hold(mut self, hold: Duration) -> Self {
        self.idle_hold = hold;
        self
    }

    /// Returns `false` on timeout or cancellation. Stale or unknown status is
    /// common, so callers treat `false` as advisory.
    pub fn wait_for_idle(&self, timeout: Duration) -> bool {
        let start = self.clock.now();
        let mut idle_since: Option<Duration> = None;

        loop {
            if self.cancel.is_cancelled() {
                return false;
            }

            let polled_at = self.clock.now();
            match self.camera.get_status(&self.profile) {
                Ok(MoveStatus::Idle) => {
                    let since = *idle_since.get_or_insert(polled_at);
                    if polled_at.saturating_sub(since) >= self.idle_hold {
                        return true;
                    }
                }
                Ok(_) => idle_since = None,
                Err(err) => {
                    self.metrics.record_transport_fault();
                    self.logger.fault("querying move status", &err);
                    idle_since = None;
                }
            }

            let elapsed = self.clock.now().saturating_sub(start);
            if elapsed >= timeout {
                return false;
            }
            self.clock.sleep(self.poll_interval.min(timeout - elapsed));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_interface::CameraError;
    use crate::control::ManualClock;
    use crate::testing::ScriptedCamera;

    fn waiter(camera: Arc<ScriptedCamera>, clock: Arc<ManualClock>) -> MovementWaiter {
        MovementWaiter::new(
            camera,
            "profile_1",
            clock,
            CancelToken::new(),
            Arc::new(MetricsRecorder::new()),
        )
    }

    #[test]
    fn returns_once_status_reports_idle() {
        let camera = Arc::new(ScriptedCamera::new());
        camera.push_status(Ok(MoveStatus::Moving));
        camera.push_status(Ok(MoveStatus::Moving));
        camera.push_status(Ok(MoveStatus::Idle));
        let clock = Arc::new(ManualClock::new());

        assert!(waiter(camera, clock.clone()).wait_for_idle(Duration::from_secs(5)));
        assert_eq!(clock.now(), Duration::from_millis(600));
    }

    #[test]
    fn times_out_when_camera_keeps_moving() {
        let camera = Arc::new(ScriptedCamera::new());
        camera.set_default_status(MoveStatus::Moving);
        let clock = Arc::new(ManualClock::new());

        assert!(!waiter(camera, clock.clone()).wait_for_idle(Duration::from_secs(2)));
        assert_eq!(clock.now(), Duration::from_secs(2));
    }

    #[test]
    fn idle_hold_is_reset_by_movement() {
        let camera = Arc::new(ScriptedCamera::new());
        for status in [
            MoveStatus::Idle,
            MoveStatus::Moving,
            MoveStatus::Idle,
            MoveStatus::Idle,
            MoveStatus::Idle,
        ] {
            camera.push_status(Ok(status));
        }
        let clock = Arc::new(ManualClock::new());
        let waiter = waiter(camera, clock.clone()).with_idle_hold(Duration::from_millis(600));

        assert!(waiter.wait_for_idle(Duration::from_secs(5)));
        // Idle from 0.6s onwards, held until 1.2s.
        assert_eq!(clock.now(), Duration::from_millis(1200));
    }

    #[test]
    fn status_errors_keep_polling() {
        let camera = Arc::new(ScriptedCamera::new());
        camera.push_status(Err(CameraError::Transport("reset".into())));
        camera.push_status(Ok(MoveStatus::Idle));
        let clock = Arc::new(ManualClock::new());

        assert!(waiter(camera, clock).wait_for_idle(Duration::from_secs(5)));
    }

    #[test]
    fn cancellation_aborts_the_wait() {
        let camera = Arc::new(ScriptedCamera::new());
        camera.set_default_status(MoveStatus::Moving);
        let cancel = CancelToken::new();
        cancel.cancel();
        let waiter = MovementWaiter::new(
            camera.clone(),
            "profile_1",
            Arc::new(ManualClock::new()),
            cancel,
            Arc::new(MetricsRecorder::new()),
        );

        assert!(!waiter.wait_for_idle(Duration::from_secs(5)));
        assert_eq!(camera.status_queries(), 0);
    }
}
