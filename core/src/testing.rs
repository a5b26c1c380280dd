//! Scripted collaborators for deterministic unit tests.

use crate::camera_interface::{
    CameraError, CameraResult, CameraService, Capabilities, MoveStatus, Notification, PtzSpeed,
    RawPreset, SubscriptionAddress,
};
use crate::control::{CancelToken, Clock, ManualClock};
use crate::prelude::{MotionSignal, Reading, SignalMode};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

struct CameraScript {
    capabilities: CameraResult<Capabilities>,
    profiles: Vec<String>,
    presets: Vec<RawPreset>,
    statuses: VecDeque<CameraResult<MoveStatus>>,
    default_status: MoveStatus,
    pulls: VecDeque<CameraResult<Vec<Notification>>>,
    subscription_fails: bool,
    commands_fail: bool,
    subscription_attempts: usize,
    status_queries: usize,
    pull_requests: Vec<(Duration, usize)>,
    gotos: Vec<String>,
    stops: usize,
}

/// Camera whose answers are queued up front by the test.
pub struct ScriptedCamera {
    script: Mutex<CameraScript>,
}

impl ScriptedCamera {
    pub fn new() -> Self {
        Self::with_presets(&[("Preset 1", "1"), ("Preset 2", "2"), ("Preset 3", "3")])
    }

    pub fn with_presets(presets: &[(&str, &str)]) -> Self {
        Self {
            script: Mutex::new(CameraScript {
                capabilities: Ok(Capabilities {
                    media_endpoint: Some("http://cam/onvif/media".into()),
                    ptz_endpoint: Some("http://cam/onvif/ptz".into()),
                    events_endpoint: Some("http://cam/onvif/events".into()),
                }),
                profiles: vec!["profile_1".into()],
                presets: presets
                    .iter()
                    .map(|(name, token)| RawPreset::new(*name, *token))
                    .collect(),
                statuses: VecDeque::new(),
                default_status: MoveStatus::Idle,
                pulls: VecDeque::new(),
                subscription_fails: false,
                commands_fail: false,
                subscription_attempts: 0,
                status_queries: 0,
                pull_requests: Vec::new(),
                gotos: Vec::new(),
                stops: 0,
            }),
        }
    }

    fn with_script<T>(&self, f: impl FnOnce(&mut CameraScript) -> T) -> T {
        let mut script = self.script.lock().unwrap();
        f(&mut script)
    }

    pub fn set_capabilities(&self, capabilities: CameraResult<Capabilities>) {
        self.with_script(|s| s.capabilities = capabilities);
    }

    pub fn set_profiles(&self, profiles: Vec<String>) {
        self.with_script(|s| s.profiles = profiles);
    }

    pub fn push_status(&self, status: CameraResult<MoveStatus>) {
        self.with_script(|s| s.statuses.push_back(status));
    }

    pub fn set_default_status(&self, status: MoveStatus) {
        self.with_script(|s| s.default_status = status);
    }

    pub fn push_pull(&self, result: CameraResult<Vec<Notification>>) {
        self.with_script(|s| s.pulls.push_back(result));
    }

    pub fn fail_subscription(&self) {
        self.with_script(|s| s.subscription_fails = true);
    }

    pub fn fail_commands(&self) {
        self.with_script(|s| s.commands_fail = true);
    }

    pub fn subscription_attempts(&self) -> usize {
        self.with_script(|s| s.subscription_attempts)
    }

    pub fn status_queries(&self) -> usize {
        self.with_script(|s| s.status_queries)
    }

    pub fn pull_requests(&self) -> Vec<(Duration, usize)> {
        self.with_script(|s| s.pull_requests.clone())
    }

    pub fn gotos(&self) -> Vec<String> {
        self.with_script(|s| s.gotos.clone())
    }

    pub fn stops(&self) -> usize {
        self.with_script(|s| s.stops)
    }
}

impl CameraService for ScriptedCamera {
    fn list_capabilities(&self) -> CameraResult<Capabilities> {
        self.with_script(|s| s.capabilities.clone())
    }

    fn list_profiles(&self) -> CameraResult<Vec<String>> {
        self.with_script(|s| Ok(s.profiles.clone()))
    }

    fn list_presets(&self, _profile: &str) -> CameraResult<Vec<RawPreset>> {
        self.with_script(|s| Ok(s.presets.clone()))
    }

    fn goto_preset(&self, _profile: &str, preset_token: &str, _speed: PtzSpeed) -> CameraResult<()> {
        self.with_script(|s| {
            s.gotos.push(preset_token.to_string());
            if s.commands_fail {
                Err(CameraError::Transport("goto rejected".into()))
            } else {
                Ok(())
            }
        })
    }

    fn stop(&self, _profile: &str) -> CameraResult<()> {
        self.with_script(|s| {
            s.stops += 1;
            if s.commands_fail {
                Err(CameraError::Transport("stop rejected".into()))
            } else {
                Ok(())
            }
        })
    }

    fn get_status(&self, _profile: &str) -> CameraResult<MoveStatus> {
        self.with_script(|s| {
            s.status_queries += 1;
            s.statuses.pop_front().unwrap_or(Ok(s.default_status))
        })
    }

    fn create_event_subscription(&self) -> CameraResult<SubscriptionAddress> {
        self.with_script(|s| {
            s.subscription_attempts += 1;
            if s.subscription_fails {
                Err(CameraError::Transport("subscription refused".into()))
            } else {
                Ok(SubscriptionAddress("http://cam/onvif/pullpoint/1".into()))
            }
        })
    }

    fn pull_messages(
        &self,
        _subscription: &SubscriptionAddress,
        timeout: Duration,
        message_limit: usize,
    ) -> CameraResult<Vec<Notification>> {
        self.with_script(|s| {
            s.pull_requests.push((timeout, message_limit));
            s.pulls.pop_front().unwrap_or_else(|| Ok(Vec::new()))
        })
    }
}

struct SignalScript {
    readings: VecDeque<Reading>,
    fallback: Reading,
    cost: Duration,
    cancel_after: Option<(usize, CancelToken)>,
    samples: Vec<Duration>,
}

/// Motion signal that replays queued readings, charging `cost` of virtual
/// time per sample. Clones share the same script.
#[derive(Clone)]
pub struct ScriptedSignal {
    clock: Arc<ManualClock>,
    mode: SignalMode,
    script: Arc<Mutex<SignalScript>>,
}

impl ScriptedSignal {
    pub fn new(clock: Arc<ManualClock>, fallback: Reading) -> Self {
        let mode = if fallback.is_heuristic() {
            SignalMode::StatusPolling
        } else {
            SignalMode::Events
        };
        Self {
            clock,
            mode,
            script: Arc::new(Mutex::new(SignalScript {
                readings: VecDeque::new(),
                fallback,
                cost: Duration::ZERO,
                cancel_after: None,
                samples: Vec::new(),
            })),
        }
    }

    pub fn with_cost(self, cost: Duration) -> Self {
        self.script.lock().unwrap().cost = cost;
        self
    }

    pub fn push(&self, readings: &[Reading]) {
        self.script.lock().unwrap().readings.extend(readings.iter().copied());
    }

    /// Raises `cancel` while serving the `count`-th sample.
    pub fn cancel_after(&self, count: usize, cancel: CancelToken) {
        self.script.lock().unwrap().cancel_after = Some((count, cancel));
    }

    /// Virtual start time of every sample taken so far.
    pub fn sample_times(&self) -> Vec<Duration> {
        self.script.lock().unwrap().samples.clone()
    }
}

impl MotionSignal for ScriptedSignal {
    fn sample(&mut self, _timeout_hint: Duration) -> Reading {
        let mut script = self.script.lock().unwrap();
        script.samples.push(self.clock.now());
        self.clock.advance(script.cost);
        if let Some((count, cancel)) = &script.cancel_after {
            if script.samples.len() >= *count {
                cancel.cancel();
            }
        }
        let fallback = script.fallback;
        script.readings.pop_front().unwrap_or(fallback)
    }

    fn mode(&self) -> SignalMode {
        self.mode
    }
}
