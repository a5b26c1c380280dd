use crate::camera_interface::{CameraService, Capabilities};
use crate::prelude::{MotionSignal, PatrolConfig};
use crate::signal::{EventSignal, KeywordSet, StatusPollSignal};
use crate::telemetry::{MetricsRecorder, TransitionLog};
use std::sync::Arc;

/// Picks the detection strategy once, at startup.
///
/// The event feed is used only when it is enabled, advertised, and a
/// subscription can be created. Anything else settles on status polling for
/// the rest of the process; the choice is never revisited.
pub fn connect_signal(
    camera: &Arc<dyn CameraService>,
    profile: &str,
    capabilities: &Capabilities,
    config: &PatrolConfig,
    metrics: &Arc<MetricsRecorder>,
) -> Box<dyn MotionSignal> {
    let logger = TransitionLog::new();
    let polling = || -> Box<dyn MotionSignal> {
        Box::new(StatusPollSignal::new(
            camera.clone(),
            profile,
            metrics.clone(),
        ))
    };

    if !config.use_events {
        logger.record("Event feed disabled by configuration; polling move status.");
        return polling();
    }
    if capabilities.events_endpoint.is_none() {
        logger.record("Camera advertises no event service; polling move status.");
        return polling();
    }

    match EventSignal::subscribe(
        camera.clone(),
        KeywordSet::new(&config.event_keywords),
        config.event_message_limit,
        metrics.clone(),
    ) {
        Ok(signal) => {
            logger.record(&format!(
                "Subscribed to events at {}",
                signal.subscription().0
            ));
            Box::new(signal)
        }
        Err(err) => {
            metrics.record_transport_fault();
            logger.fault("creating event subscription", &err);
            logger.record("Falling back to move-status polling for this run.");
            polling()
        }
    }
}
