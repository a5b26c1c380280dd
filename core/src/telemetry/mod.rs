pub mod log;
pub mod metrics;

pub use self::log::TransitionLog;
pub use metrics::{MetricsRecorder, MetricsSnapshot};
