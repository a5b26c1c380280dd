use crate::generator::camera::SimulatedCamera;
use crate::workflow::config::WorkflowConfig;
use anyhow::Context;
use patrolcore::control::{CancelToken, Clock, ManualClock, PatrolSnapshot};
use patrolcore::prelude::SignalMode;
use patrolcore::telemetry::{MetricsRecorder, MetricsSnapshot};
use patrolcore::{start_patrol, Collaborators, PatrolController};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::watch;

/// Summary of a bounded offline run.
#[derive(Debug, Clone, Serialize)]
pub struct PatrolReport {
    pub cycles: u64,
    pub presets: Vec<u64>,
    pub signal_mode: SignalMode,
    pub elapsed_seconds: f64,
    pub metrics: MetricsSnapshot,
}

impl PatrolReport {
    pub fn summary_line(&self) -> String {
        format!(
            "cycles={} presets={:?} signal={:?} elapsed={:.1}s visits={} tracking={} ignored={} aborted={} timeouts={} faults={}",
            self.cycles,
            self.presets,
            self.signal_mode,
            self.elapsed_seconds,
            self.metrics.preset_visits,
            self.metrics.tracking_sessions,
            self.metrics.detections_ignored,
            self.metrics.confirmations_aborted,
            self.metrics.move_timeouts,
            self.metrics.transport_faults,
        )
    }
}

/// A connected controller together with the handles the driver needs.
pub struct Session {
    pub controller: PatrolController,
    pub metrics: Arc<MetricsRecorder>,
    pub camera: Arc<SimulatedCamera>,
}

impl Session {
    pub fn snapshots(&self) -> watch::Receiver<PatrolSnapshot> {
        self.controller.subscribe()
    }
}

#[derive(Clone)]
pub struct Runner {
    config: WorkflowConfig,
}

impl Runner {
    pub fn new(config: WorkflowConfig) -> Self {
        Self { config }
    }

    /// Validates the configuration, builds the simulated camera and runs
    /// patrol startup against it.
    pub fn prepare(&self, clock: Arc<dyn Clock>, cancel: CancelToken) -> anyhow::Result<Session> {
        self.config.validate().context("validating configuration")?;
        let endpoint = self.config.device_endpoint()?;
        let camera = Arc::new(SimulatedCamera::new(
            endpoint.clone(),
            self.config.credentials(),
            self.config.scenario.clone(),
            clock.clone(),
        ));
        let metrics = Arc::new(MetricsRecorder::new());

        let controller = start_patrol(
            Collaborators {
                camera: camera.clone(),
                clock,
                cancel,
                metrics: metrics.clone(),
            },
            self.config.patrol.clone(),
        )
        .with_context(|| format!("starting patrol against {}", endpoint))?;

        Ok(Session {
            controller,
            metrics,
            camera,
        })
    }

    /// Runs `cycles` full passes on virtual time and reports what happened.
    pub fn execute_offline(&self, cycles: u64) -> anyhow::Result<PatrolReport> {
        let clock = Arc::new(ManualClock::new());
        let mut session = self.prepare(clock.clone(), CancelToken::new())?;
        let signal_mode = session.snapshots().borrow().signal_mode;
        let metrics = session.controller.run_cycles(cycles);

        Ok(PatrolReport {
            cycles: session.controller.cycles_completed(),
            presets: session.controller.order().indices(),
            signal_mode,
            elapsed_seconds: clock.now().as_secs_f64(),
            metrics,
        })
    }
}
