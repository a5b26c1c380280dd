use crate::camera_interface::{CameraService, PtzSpeed};
use crate::catalog::{PatrolOrder, Preset, TrackableSet};
use crate::control::{
    CancelToken, Clock, ControllerState, MovementWaiter, PatrolPhase, PatrolSnapshot,
};
use crate::prelude::{MotionSignal, PatrolConfig, PatrolError, PatrolResult, Reading};
use crate::telemetry::{MetricsRecorder, MetricsSnapshot, TransitionLog};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Everything a controller needs, assembled by the caller.
pub struct ControllerParts {
    pub camera: Arc<dyn CameraService>,
    pub profile: String,
    pub order: PatrolOrder,
    pub trackable: TrackableSet,
    pub signal: Box<dyn MotionSignal>,
    pub waiter: MovementWaiter,
    pub clock: Arc<dyn Clock>,
    pub cancel: CancelToken,
    pub metrics: Arc<MetricsRecorder>,
    pub config: PatrolConfig,
}

/// Patrol/track state machine.
///
/// Each `step` runs the entry action of the current phase to completion and
/// moves to the next phase. Calls to the camera never overlap, and the cancel
/// token is checked between every pair of blocking calls.
pub struct PatrolController {
    camera: Arc<dyn CameraService>,
    profile: String,
    order: PatrolOrder,
    trackable: TrackableSet,
    signal: Box<dyn MotionSignal>,
    waiter: MovementWaiter,
    clock: Arc<dyn Clock>,
    cancel: CancelToken,
    metrics: Arc<MetricsRecorder>,
    config: PatrolConfig,
    state: ControllerState,
    cycles_completed: u64,
    stop_issued: bool,
    logger: TransitionLog,
    snapshots: watch::Sender<PatrolSnapshot>,
}

impl PatrolController {
    pub fn new(parts: ControllerParts) -> PatrolResult<Self> {
        if parts.order.is_empty() {
            return Err(PatrolError::EmptyPatrolOrder(0));
        }

        let state = ControllerState::default();
        let (snapshots, _) = watch::channel(PatrolSnapshot {
            phase: state.phase,
            preset: None,
            trackable: false,
            signal_mode: parts.signal.mode(),
            cycles_completed: 0,
            entered_at_seconds: parts.clock.now().as_secs_f64(),
        });

        Ok(Self {
            camera: parts.camera,
            profile: parts.profile,
            order: parts.order,
            trackable: parts.trackable,
            signal: parts.signal,
            waiter: parts.waiter,
            clock: parts.clock,
            cancel: parts.cancel,
            metrics: parts.metrics,
            config: parts.config,
            state,
            cycles_completed: 0,
            stop_issued: false,
            logger: TransitionLog::new(),
            snapshots,
        })
    }

    pub fn phase(&self) -> PatrolPhase {
        self.state.phase
    }

    pub fn state(&self) -> &ControllerState {
        &self.state
    }

    pub fn order(&self) -> &PatrolOrder {
        &self.order
    }

    pub fn current_preset(&self) -> Option<&Preset> {
        self.state.pointer.and_then(|position| self.order.get(position))
    }

    pub fn cycles_completed(&self) -> u64 {
        self.cycles_completed
    }

    pub fn subscribe(&self) -> watch::Receiver<PatrolSnapshot> {
        self.snapshots.subscribe()
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Runs until cancelled.
    pub fn run(&mut self) -> MetricsSnapshot {
        while !self.step().is_terminal() {}
        self.metrics.snapshot()
    }

    /// Runs until `cycles` full passes over the patrol order have finished,
    /// then stops the camera. Cancellation still ends the run early.
    pub fn run_cycles(&mut self, cycles: u64) -> MetricsSnapshot {
        loop {
            if self.state.phase == PatrolPhase::Patrolling && self.cycles_completed >= cycles {
                self.stop();
            }
            if self.step().is_terminal() {
                break;
            }
        }
        self.metrics.snapshot()
    }

    /// Moves straight to `Stopped`, sending one best-effort stop command.
    pub fn stop(&mut self) {
        if !self.state.phase.is_terminal() {
            self.enter(PatrolPhase::Stopped);
        }
    }

    /// Executes the current phase and returns the phase entered next.
    pub fn step(&mut self) -> PatrolPhase {
        if self.state.phase.is_terminal() {
            return PatrolPhase::Stopped;
        }

        let next = if self.cancel.is_cancelled() {
            PatrolPhase::Stopped
        } else {
            match self.state.phase {
                PatrolPhase::Patrolling => self.patrol(),
                PatrolPhase::DwellSearch => self.dwell_search(),
                PatrolPhase::Confirming => self.confirm(),
                PatrolPhase::Tracking => self.track(),
                PatrolPhase::Stopped => PatrolPhase::Stopped,
            }
        };

        self.enter(next);
        next
    }

    fn patrol(&mut self) -> PatrolPhase {
        let Some(position) = self.order.next_position(self.state.pointer) else {
            return PatrolPhase::Stopped;
        };
        self.state.pointer = Some(position);
        let Some(preset) = self.order.get(position).cloned() else {
            return PatrolPhase::Stopped;
        };

        self.logger.record(&format!("-> {}", preset));
        self.metrics.record_preset_visit();

        let speed = PtzSpeed::uniform(self.config.ptz_speed);
        if let Err(err) = self.camera.goto_preset(&self.profile, &preset.token, speed) {
            self.metrics.record_transport_fault();
            self.logger
                .fault(&format!("moving to preset {}", preset.label()), &err);
        }

        if !self.waiter.wait_for_idle(self.config.move_timeout()) {
            if self.cancel.is_cancelled() {
                return PatrolPhase::Stopped;
            }
            self.metrics.record_move_timeout();
            self.logger.record(&format!(
                "{} did not report idle within {:.1}s, searching anyway",
                preset.label(),
                self.config.move_finish_timeout
            ));
        }

        PatrolPhase::DwellSearch
    }

    fn dwell_search(&mut self) -> PatrolPhase {
        let started = self.clock.now();
        let deadline = started + self.config.dwell();
        let trackable = self.is_trackable();

        while self.clock.now() < deadline {
            let Some((reading, sampled_at)) = self.sample() else {
                return PatrolPhase::Stopped;
            };

            if reading.indicates_activity() {
                if trackable {
                    self.logger
                        .record(&format!("{} {}", activity_label(&reading), self.preset_label()));
                    return PatrolPhase::Confirming;
                }
                self.metrics.record_ignored_detection();
                self.logger.record(&format!(
                    "{} {} ignored, preset is not trackable",
                    activity_label(&reading),
                    self.preset_label()
                ));
                return PatrolPhase::Patrolling;
            }

            self.pace(sampled_at, Some(deadline));
        }

        PatrolPhase::Patrolling
    }

    fn confirm(&mut self) -> PatrolPhase {
        let started = self.clock.now();
        let window = self.config.confirm_window();
        let mut confirmed = 0usize;

        loop {
            let Some((reading, sampled_at)) = self.sample() else {
                return PatrolPhase::Stopped;
            };

            if !reading.indicates_activity() {
                self.metrics.record_aborted_confirmation();
                self.logger.record(&format!(
                    "Confirmation at {} lost after {} sample(s), resuming patrol",
                    self.preset_label(),
                    confirmed
                ));
                return PatrolPhase::Patrolling;
            }
            confirmed += 1;

            if self.clock.now().saturating_sub(started) >= window {
                return PatrolPhase::Tracking;
            }

            self.pace(sampled_at, None);
        }
    }

    fn track(&mut self) -> PatrolPhase {
        let clear_after = self.config.clear_after();
        self.state.last_detection = Some(self.clock.now());
        self.metrics.record_tracking_session();

        loop {
            let Some((reading, sampled_at)) = self.sample() else {
                return PatrolPhase::Stopped;
            };

            let now = self.clock.now();
            if reading.indicates_activity() {
                self.state.last_detection = Some(now);
            }

            let last_seen = self.state.last_detection.unwrap_or(now);
            if now.saturating_sub(last_seen) > clear_after {
                self.logger.record(&format!(
                    "Person gone from {} for {:.1}s, resuming patrol",
                    self.preset_label(),
                    now.saturating_sub(last_seen).as_secs_f64()
                ));
                return PatrolPhase::Patrolling;
            }

            self.pace(sampled_at, None);
        }
    }

    /// Takes one sample unless cancelled. Returns the reading and the time
    /// the sample started, for pacing.
    fn sample(&mut self) -> Option<(Reading, Duration)> {
        if self.cancel.is_cancelled() {
            return None;
        }
        let sampled_at = self.clock.now();
        let reading = self.signal.sample(self.config.poll_interval());
        if self.cancel.is_cancelled() {
            return None;
        }
        Some((reading, sampled_at))
    }

    /// Sleeps out the rest of the poll interval that began at `sampled_at`,
    /// never past `deadline`.
    fn pace(&self, sampled_at: Duration, deadline: Option<Duration>) {
        let now = self.clock.now();
        let mut wake = sampled_at + self.config.poll_interval();
        if let Some(deadline) = deadline {
            wake = wake.min(deadline);
        }
        if wake > now {
            self.clock.sleep(wake - now);
        }
    }

    fn enter(&mut self, next: PatrolPhase) {
        let previous = self.state.phase;

        if next == PatrolPhase::Patrolling
            && previous != PatrolPhase::Patrolling
            && self.state.pointer == Some(self.order.len() - 1)
        {
            self.cycles_completed += 1;
            self.metrics.record_cycle();
        }
        if next != PatrolPhase::Tracking {
            self.state.last_detection = None;
        }
        if next == PatrolPhase::Stopped {
            self.halt_camera();
        }

        self.state.phase = next;
        self.logger
            .transition(previous, next, self.current_preset());
        self.snapshots.send_replace(PatrolSnapshot {
            phase: next,
            preset: self.current_preset().cloned(),
            trackable: self.is_trackable(),
            signal_mode: self.signal.mode(),
            cycles_completed: self.cycles_completed,
            entered_at_seconds: self.clock.now().as_secs_f64(),
        });
    }

    fn halt_camera(&mut self) {
        if self.stop_issued {
            return;
        }
        self.stop_issued = true;
        if let Err(err) = self.camera.stop(&self.profile) {
            self.logger.fault("stopping the camera", &err);
        }
    }

    fn is_trackable(&self) -> bool {
        self.state
            .pointer
            .map(|position| self.trackable.contains(position))
            .unwrap_or(false)
    }

    fn preset_label(&self) -> String {
        self.current_preset()
            .map(|preset| preset.label())
            .unwrap_or_else(|| "(no preset)".to_string())
    }
}

fn activity_label(reading: &Reading) -> &'static str {
    if reading.is_heuristic() {
        "Camera movement (heuristic presence) at"
    } else {
        "Person detected at"
    }
}
