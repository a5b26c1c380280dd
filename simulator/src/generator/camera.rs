use crate::generator::scenario::ScenarioConfig;
use log::debug;
use patrolcore::camera_interface::{
    CameraError, CameraResult, CameraService, Capabilities, MoveStatus, Notification, PtzSpeed,
    RawPreset, SubscriptionAddress,
};
use patrolcore::control::Clock;
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

const PEOPLE_TOPIC: &str = "tns1:RuleEngine/PeopleDetector/People";
const INPUT_TOPIC: &str = "tns1:Device/Trigger/DigitalInput";
const MAX_QUEUED_MESSAGES: usize = 64;

/// Someone standing in front of one preset for a while.
#[derive(Debug, Clone)]
struct Visit {
    token: String,
    from: Duration,
    until: Duration,
}

struct CameraState {
    rng: StdRng,
    position: Option<String>,
    moving_until: Duration,
    visit: Option<Visit>,
    subscription: Option<SubscriptionAddress>,
    subscriptions_created: u32,
    queue: VecDeque<Notification>,
    announced: bool,
    gotos: u64,
    stops: u64,
}

/// In-process PTZ camera driven by a seeded scenario.
pub struct SimulatedCamera {
    endpoint: String,
    credentials: Option<(String, String)>,
    scenario: ScenarioConfig,
    clock: Arc<dyn Clock>,
    state: Mutex<CameraState>,
}

impl SimulatedCamera {
    pub fn new(
        endpoint: impl Into<String>,
        credentials: Option<(String, String)>,
        scenario: ScenarioConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let rng = StdRng::seed_from_u64(scenario.seed);
        Self {
            endpoint: endpoint.into(),
            credentials,
            scenario,
            clock,
            state: Mutex::new(CameraState {
                rng,
                position: None,
                moving_until: Duration::ZERO,
                visit: None,
                subscription: None,
                subscriptions_created: 0,
                queue: VecDeque::new(),
                announced: false,
                gotos: 0,
                stops: 0,
            }),
        }
    }

    pub fn goto_count(&self) -> u64 {
        self.state.lock().map(|s| s.gotos).unwrap_or_default()
    }

    pub fn stop_count(&self) -> u64 {
        self.state.lock().map(|s| s.stops).unwrap_or_default()
    }

    fn lock(&self) -> CameraResult<std::sync::MutexGuard<'_, CameraState>> {
        self.state
            .lock()
            .map_err(|_| CameraError::Transport("camera state poisoned".into()))
    }

    fn authorize(&self) -> CameraResult<()> {
        let required = (
            self.scenario.required_user.as_deref(),
            self.scenario.required_password.as_deref(),
        );
        if required == (None, None) {
            return Ok(());
        }
        let presented = self
            .credentials
            .as_ref()
            .map(|(user, password)| (Some(user.as_str()), Some(password.as_str())));
        if presented == Some(required) {
            Ok(())
        } else {
            Err(CameraError::Unauthorized)
        }
    }

    fn inject_fault(state: &mut CameraState, rate: f64, call: &str) -> CameraResult<()> {
        let rate = ScenarioConfig::probability(rate);
        if rate > 0.0 && state.rng.gen_bool(rate) {
            return Err(CameraError::Transport(format!("simulated {} failure", call)));
        }
        Ok(())
    }

    fn is_moving(state: &CameraState, now: Duration) -> bool {
        now < state.moving_until
    }

    fn person_visible(state: &CameraState, now: Duration) -> bool {
        if Self::is_moving(state, now) {
            return false;
        }
        match (&state.visit, &state.position) {
            (Some(visit), Some(position)) => {
                &visit.token == position && visit.from <= now && now < visit.until
            }
            _ => false,
        }
    }

    fn refresh_events(&self, state: &mut CameraState, now: Duration) {
        let visible = Self::person_visible(state, now);
        if visible || state.announced {
            let flag = if visible { "true" } else { "false" };
            Self::enqueue(state, people_notification(flag));
        }
        state.announced = visible;

        let noise = ScenarioConfig::probability(self.scenario.noise_rate);
        if noise > 0.0 && state.rng.gen_bool(noise) {
            Self::enqueue(state, input_notification());
        }
    }

    fn enqueue(state: &mut CameraState, notification: Notification) {
        if state.queue.len() >= MAX_QUEUED_MESSAGES {
            state.queue.pop_front();
        }
        state.queue.push_back(notification);
    }
}

impl CameraService for SimulatedCamera {
    fn list_capabilities(&self) -> CameraResult<Capabilities> {
        self.authorize()?;
        Ok(Capabilities {
            media_endpoint: Some(format!("{}/onvif/media_service", self.endpoint)),
            ptz_endpoint: Some(format!("{}/onvif/ptz_service", self.endpoint)),
            events_endpoint: self
                .scenario
                .events_supported
                .then(|| format!("{}/onvif/event_service", self.endpoint)),
        })
    }

    fn list_profiles(&self) -> CameraResult<Vec<String>> {
        self.authorize()?;
        Ok(vec!["Profile_1".into(), "Profile_2".into()])
    }

    fn list_presets(&self, _profile: &str) -> CameraResult<Vec<RawPreset>> {
        self.authorize()?;
        Ok(self.scenario.presets.clone())
    }

    fn goto_preset(&self, _profile: &str, preset_token: &str, speed: PtzSpeed) -> CameraResult<()> {
        self.authorize()?;
        if !self.scenario.presets.iter().any(|p| p.token == preset_token) {
            return Err(CameraError::Protocol(format!(
                "no preset with token {}",
                preset_token
            )));
        }

        let now = self.clock.now();
        let mut state = self.lock()?;
        Self::inject_fault(&mut state, self.scenario.command_failure_rate, "goto")?;
        state.gotos += 1;

        // Full speed halves the nominal travel time.
        let factor = 1.5 - f64::from(speed.pan.clamp(0.0, 1.0));
        let travel = Duration::from_secs_f64(ScenarioConfig::seconds(self.scenario.move_seconds) * factor);
        let arrival = now + travel;
        state.moving_until = arrival;
        state.position = Some(preset_token.to_string());

        let chance = ScenarioConfig::probability(self.scenario.person_probability);
        if chance > 0.0 && state.rng.gen_bool(chance) {
            let max_delay = ScenarioConfig::seconds(self.scenario.person_delay_seconds);
            let delay = if max_delay > 0.0 {
                state.rng.gen_range(0.0..max_delay)
            } else {
                0.0
            };
            let from = arrival + Duration::from_secs_f64(delay);
            let until =
                from + Duration::from_secs_f64(ScenarioConfig::seconds(self.scenario.person_linger_seconds));
            debug!(
                "simulated person at preset {} from {:.1}s to {:.1}s",
                preset_token,
                from.as_secs_f64(),
                until.as_secs_f64()
            );
            state.visit = Some(Visit {
                token: preset_token.to_string(),
                from,
                until,
            });
        }
        Ok(())
    }

    fn stop(&self, _profile: &str) -> CameraResult<()> {
        self.authorize()?;
        let now = self.clock.now();
        let mut state = self.lock()?;
        Self::inject_fault(&mut state, self.scenario.command_failure_rate, "stop")?;
        state.stops += 1;
        state.moving_until = state.moving_until.min(now);
        Ok(())
    }

    fn get_status(&self, _profile: &str) -> CameraResult<MoveStatus> {
        self.authorize()?;
        let now = self.clock.now();
        let mut state = self.lock()?;
        Self::inject_fault(&mut state, self.scenario.status_failure_rate, "status")?;
        if state.position.is_none() {
            return Ok(MoveStatus::Unknown);
        }
        let tracking = self.scenario.auto_tracking && Self::person_visible(&state, now);
        if Self::is_moving(&state, now) || tracking {
            Ok(MoveStatus::Moving)
        } else {
            Ok(MoveStatus::Idle)
        }
    }

    fn create_event_subscription(&self) -> CameraResult<SubscriptionAddress> {
        self.authorize()?;
        if !self.scenario.events_supported {
            return Err(CameraError::Protocol("event service not available".into()));
        }
        if self.scenario.subscription_fails {
            return Err(CameraError::Transport(
                "CreatePullPointSubscription refused".into(),
            ));
        }
        let mut state = self.lock()?;
        state.subscriptions_created += 1;
        let address = SubscriptionAddress(format!(
            "{}/onvif/subscription?Idx={}",
            self.endpoint, state.subscriptions_created
        ));
        state.subscription = Some(address.clone());
        Ok(address)
    }

    fn pull_messages(
        &self,
        subscription: &SubscriptionAddress,
        timeout: Duration,
        message_limit: usize,
    ) -> CameraResult<Vec<Notification>> {
        self.authorize()?;
        {
            let mut state = self.lock()?;
            if state.subscription.as_ref() != Some(subscription) {
                return Err(CameraError::Protocol(format!(
                    "unknown subscription {}",
                    subscription.0
                )));
            }
            Self::inject_fault(&mut state, self.scenario.pull_failure_rate, "pull")?;
            self.refresh_events(&mut state, self.clock.now());
            if !state.queue.is_empty() {
                return Ok(drain(&mut state.queue, message_limit));
            }
        }

        // Long poll: nothing pending, so wait out the timeout once.
        self.clock.sleep(timeout);
        let mut state = self.lock()?;
        self.refresh_events(&mut state, self.clock.now());
        Ok(drain(&mut state.queue, message_limit))
    }
}

fn drain(queue: &mut VecDeque<Notification>, limit: usize) -> Vec<Notification> {
    let count = queue.len().min(limit);
    queue.drain(..count).collect()
}

fn people_notification(flag: &str) -> Notification {
    Notification::new(
        PEOPLE_TOPIC,
        json!({
            "Message": {
                "PropertyOperation": "Changed",
                "Source": { "SimpleItem": { "Name": "VideoSourceConfigurationToken", "Value": "VideoSource_1" } },
                "Data": { "SimpleItem": { "Name": "IsPeople", "Value": flag } }
            }
        }),
    )
}

fn input_notification() -> Notification {
    Notification::new(
        INPUT_TOPIC,
        json!({
            "Message": {
                "Source": { "SimpleItem": { "Name": "InputToken", "Value": "DIN_1" } },
                "Data": { "SimpleItem": { "Name": "LogicalState", "Value": "false" } }
            }
        }),
    )
}
