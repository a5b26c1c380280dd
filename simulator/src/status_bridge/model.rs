use patrolcore::control::PatrolSnapshot;
use patrolcore::telemetry::MetricsSnapshot;
use serde::Serialize;

/// Body of `GET /status`.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct StatusModel {
    pub patrol: PatrolSnapshot,
    pub metrics: MetricsSnapshot,
}
