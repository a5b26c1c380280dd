use crate::camera_interface::CameraService;
use crate::catalog::{build_order, PatrolOrder, TrackableSet};
use crate::control::{CancelToken, Clock, ControllerParts, MovementWaiter, PatrolController};
use crate::prelude::{PatrolConfig, PatrolError, PatrolResult};
use crate::signal::connect_signal;
use crate::telemetry::{MetricsRecorder, TransitionLog};
use std::sync::Arc;

/// Shared services injected into every component of a patrol.
#[derive(Clone)]
pub struct Collaborators {
    pub camera: Arc<dyn CameraService>,
    pub clock: Arc<dyn Clock>,
    pub cancel: CancelToken,
    pub metrics: Arc<MetricsRecorder>,
}

/// Discovers the camera, builds the patrol order and returns a controller
/// ready to run. Every error here is fatal: the patrol never starts.
pub fn start_patrol(
    collaborators: Collaborators,
    config: PatrolConfig,
) -> PatrolResult<PatrolController> {
    config.validate()?;
    let logger = TransitionLog::new();
    let Collaborators {
        camera,
        clock,
        cancel,
        metrics,
    } = collaborators;

    let capabilities = camera
        .list_capabilities()
        .map_err(|err| PatrolError::CapabilityDiscovery(err.to_string()))?;
    if capabilities.ptz_endpoint.is_none() {
        return Err(PatrolError::CapabilityDiscovery(
            "camera advertises no PTZ service".into(),
        ));
    }

    let profile = camera
        .list_profiles()?
        .into_iter()
        .next()
        .ok_or(PatrolError::NoProfiles)?;

    let raw_presets = camera.list_presets(&profile)?;
    if raw_presets.is_empty() {
        return Err(PatrolError::EmptyPresetList(profile));
    }
    let order = build_order(&raw_presets);
    if order.is_empty() {
        return Err(PatrolError::EmptyPatrolOrder(raw_presets.len()));
    }
    log_order(&logger, &order, raw_presets.len());

    let trackable = TrackableSet::resolve(&config.trackable, &order);
    let trackable_labels: Vec<String> = trackable
        .positions()
        .filter_map(|position| order.get(position))
        .map(|preset| preset.label())
        .collect();
    logger.record(&format!("Trackable presets: [{}]", trackable_labels.join(", ")));

    let signal = connect_signal(&camera, &profile, &capabilities, &config, &metrics);
    let waiter = MovementWaiter::new(
        camera.clone(),
        profile.clone(),
        clock.clone(),
        cancel.clone(),
        metrics.clone(),
    )
    .with_poll_interval(config.status_poll())
    .with_idle_hold(config.idle_hold());

    logger.record(&format!(
        "Patrolling every {}s (speed={}) on profile {}",
        config.dwell_seconds, config.ptz_speed, profile
    ));

    PatrolController::new(ControllerParts {
        camera,
        profile,
        order,
        trackable,
        signal,
        waiter,
        clock,
        cancel,
        metrics,
        config,
    })
}

fn log_order(logger: &TransitionLog, order: &PatrolOrder, listed: usize) {
    logger.record(&format!("Presets ordered [{} of {}]:", order.len(), listed));
    for preset in order.iter() {
        logger.record(&format!("  {:02}  {}", preset.index, preset.label()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::camera_interface::{CameraError, Capabilities};
    use crate::control::{ManualClock, PatrolPhase};
    use crate::prelude::SignalMode;
    use crate::testing::ScriptedCamera;

    fn collaborators(camera: Arc<ScriptedCamera>) -> Collaborators {
        Collaborators {
            camera,
            clock: Arc::new(ManualClock::new()),
            cancel: CancelToken::new(),
            metrics: Arc::new(MetricsRecorder::new()),
        }
    }

    #[test]
    fn builds_controller_from_camera_listing() {
        let camera = Arc::new(ScriptedCamera::with_presets(&[
            ("Preset 12", "c"),
            ("Preset 1", "a"),
            ("Preset 2", "b"),
        ]));
        let controller = start_patrol(collaborators(camera), PatrolConfig::default()).unwrap();

        assert_eq!(controller.order().indices(), vec![1, 2, 12]);
        assert_eq!(controller.phase(), PatrolPhase::Patrolling);
        assert_eq!(controller.subscribe().borrow().signal_mode, SignalMode::Events);
    }

    #[test]
    fn empty_preset_list_is_fatal() {
        let camera = Arc::new(ScriptedCamera::with_presets(&[]));
        let result = start_patrol(collaborators(camera), PatrolConfig::default());
        assert!(matches!(result, Err(PatrolError::EmptyPresetList(_))));
    }

    #[test]
    fn unindexable_presets_are_fatal() {
        let camera = Arc::new(ScriptedCamera::with_presets(&[("Garage", "x"), ("Porch", "y")]));
        let result = start_patrol(collaborators(camera), PatrolConfig::default());
        assert!(matches!(result, Err(PatrolError::EmptyPatrolOrder(2))));
    }

    #[test]
    fn capability_failure_is_fatal() {
        let camera = Arc::new(ScriptedCamera::with_presets(&[("Preset 1", "1")]));
        camera.set_capabilities(Err(CameraError::Unauthorized));
        let result = start_patrol(collaborators(camera), PatrolConfig::default());
        assert!(matches!(result, Err(PatrolError::CapabilityDiscovery(_))));
    }

    #[test]
    fn missing_ptz_service_is_fatal() {
        let camera = Arc::new(ScriptedCamera::with_presets(&[("Preset 1", "1")]));
        camera.set_capabilities(Ok(Capabilities {
            media_endpoint: Some("http://cam/media".into()),
            ptz_endpoint: None,
            events_endpoint: None,
        }));
        let result = start_patrol(collaborators(camera), PatrolConfig::default());
        assert!(matches!(result, Err(PatrolError::CapabilityDiscovery(_))));
    }

    #[test]
    fn no_profiles_is_fatal() {
        let camera = Arc::new(ScriptedCamera::with_presets(&[("Preset 1", "1")]));
        camera.set_profiles(Vec::new());
        let result = start_patrol(collaborators(camera), PatrolConfig::default());
        assert!(matches!(result, Err(PatrolError::NoProfiles)));
    }

    #[test]
    fn invalid_config_is_rejected_before_touching_the_camera() {
        let camera = Arc::new(ScriptedCamera::with_presets(&[("Preset 1", "1")]));
        let config = PatrolConfig {
            ptz_speed: -0.1,
            ..Default::default()
        };
        let result = start_patrol(collaborators(camera.clone()), config);
        assert!(matches!(result, Err(PatrolError::InvalidConfig(_))));
        assert_eq!(camera.subscription_attempts(), 0);
    }

    #[test]
    fn unavailable_events_start_in_polling_mode() {
        let camera = Arc::new(ScriptedCamera::with_presets(&[("Preset 1", "1")]));
        camera.fail_subscription();
        let controller = start_patrol(collaborators(camera), PatrolConfig::default()).unwrap();
        assert_eq!(
            controller.subscribe().borrow().signal_mode,
            SignalMode::StatusPolling
        );
    }
}
