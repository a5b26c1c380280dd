use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<MetricsSnapshot>,
}

/// Counters accumulated over the lifetime of one patrol.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MetricsSnapshot {
    pub preset_visits: u64,
    pub cycles_completed: u64,
    pub move_timeouts: u64,
    pub detections_ignored: u64,
    pub confirmations_aborted: u64,
    pub tracking_sessions: u64,
    pub transport_faults: u64,
    pub protocol_violations: u64,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(MetricsSnapshot::default()),
        }
    }

    fn bump(&self, update: impl FnOnce(&mut MetricsSnapshot)) {
        if let Ok(mut metrics) = self.inner.lock() {
            update(&mut metrics);
        }
    }

    pub fn record_preset_visit(&self) {
        self.bump(|m| m.preset_visits += 1);
    }

    pub fn record_cycle(&self) {
        self.bump(|m| m.cycles_completed += 1);
    }

    pub fn record_move_timeout(&self) {
        self.bump(|m| m.move_timeouts += 1);
    }

    pub fn record_ignored_detection(&self) {
        self.bump(|m| m.detections_ignored += 1);
    }

    pub fn record_aborted_confirmation(&self) {
        self.bump(|m| m.confirmations_aborted += 1);
    }

    pub fn record_tracking_session(&self) {
        self.bump(|m| m.tracking_sessions += 1);
    }

    pub fn record_transport_fault(&self) {
        self.bump(|m| m.transport_faults += 1);
    }

    pub fn record_protocol_violation(&self) {
        self.bump(|m| m.protocol_violations += 1);
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        if let Ok(metrics) = self.inner.lock() {
            metrics.clone()
        } else {
            MetricsSnapshot::default()
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
