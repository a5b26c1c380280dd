use crate::generator::scenario::ScenarioConfig;
use anyhow::Context;
use patrolcore::catalog::TrackablePolicy;
use patrolcore::prelude::{PatrolConfig, PatrolError, PatrolResult};
use patrolcore::signal::normalize_token;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Where the camera lives and how to log in to it.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraTarget {
    pub host: Option<String>,
    pub port: u16,
    pub user: Option<String>,
    pub password: Option<String>,
}

impl Default for CameraTarget {
    fn default() -> Self {
        Self {
            host: None,
            port: 80,
            user: None,
            password: None,
        }
    }
}

#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WorkflowConfig {
    pub camera: CameraTarget,
    pub patrol: PatrolConfig,
    pub scenario: ScenarioConfig,
}

impl WorkflowConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path_ref = path.as_ref();
        let contents = fs::read_to_string(path_ref)
            .with_context(|| format!("reading workflow config {}", path_ref.display()))?;
        let config: WorkflowConfig = serde_yaml::from_str(&contents)
            .with_context(|| format!("parsing workflow config {}", path_ref.display()))?;
        Ok(config)
    }

    pub fn apply_process_env(&mut self) -> PatrolResult<()> {
        self.apply_env(|key| std::env::var(key).ok())
    }

    /// Overlays variables found through `lookup`. Unset or blank variables
    /// leave the current value alone.
    pub fn apply_env<F>(&mut self, lookup: F) -> PatrolResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        if let Some(host) = get("HOST") {
            self.camera.host = Some(host);
        }
        if let Some(port) = get("PORT") {
            self.camera.port = port
                .parse()
                .map_err(|_| invalid("PORT", &port, "a TCP port"))?;
        }
        if let Some(user) = get("ONVIF_USER") {
            self.camera.user = Some(user);
        }
        if let Some(password) = lookup("ONVIF_PASSWORD").filter(|p| !p.is_empty()) {
            self.camera.password = Some(password);
        }

        let patrol = &mut self.patrol;
        let seconds = [
            ("DWELL_SECONDS", &mut patrol.dwell_seconds),
            ("PERSON_CLEAR_SECONDS", &mut patrol.person_clear_seconds),
            ("EVENT_POLL_SECONDS", &mut patrol.event_poll_seconds),
            ("IDLE_HOLD_SECONDS", &mut patrol.idle_hold_seconds),
            ("MOVE_FINISH_TIMEOUT", &mut patrol.move_finish_timeout),
            ("CONFIRM_SECONDS", &mut patrol.confirm_seconds),
        ];
        for (key, slot) in seconds {
            if let Some(value) = get(key) {
                *slot = value
                    .parse()
                    .map_err(|_| invalid(key, &value, "a number of seconds"))?;
            }
        }

        if let Some(value) = get("PTZ_SPEED") {
            patrol.ptz_speed = value
                .parse()
                .map_err(|_| invalid("PTZ_SPEED", &value, "a speed within 0..=1"))?;
        }
        if let Some(value) = get("USE_EVENTS") {
            patrol.use_events =
                normalize_token(&value).ok_or_else(|| invalid("USE_EVENTS", &value, "a boolean"))?;
        }
        if let Some(value) = get("EVENT_KEYWORDS") {
            patrol.event_keywords = value
                .split(',')
                .map(|keyword| keyword.trim().to_string())
                .filter(|keyword| !keyword.is_empty())
                .collect();
        }
        if let Some(value) = get("EVENT_MESSAGE_LIMIT") {
            patrol.event_message_limit = value
                .parse()
                .map_err(|_| invalid("EVENT_MESSAGE_LIMIT", &value, "a message count"))?;
        }
        if let Some(value) = get("TRACK_LAST_PRESETS") {
            let count = value
                .parse()
                .map_err(|_| invalid("TRACK_LAST_PRESETS", &value, "a preset count"))?;
            patrol.trackable = TrackablePolicy::Last(count);
        }
        Ok(())
    }

    /// Fills credentials still unset from `USER`/`PASSWORD` entries of the
    /// `.env` file. `file_lookup` must only see that file, never the process
    /// environment, where `USER` names the shell user.
    pub fn apply_dotenv_credentials<F>(&mut self, file_lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if self.camera.user.is_none() {
            self.camera.user = file_lookup("USER")
                .map(|user| user.trim().to_string())
                .filter(|user| !user.is_empty());
        }
        if self.camera.password.is_none() {
            self.camera.password = file_lookup("PASSWORD").filter(|p| !p.is_empty());
        }
    }

    /// Checks everything needed before the camera is contacted.
    pub fn validate(&self) -> PatrolResult<()> {
        if self.camera.host.is_none() {
            return Err(PatrolError::MissingConfig("HOST".into()));
        }
        self.patrol.validate()
    }

    /// `http://host` for the default port, `http://host:port` otherwise.
    pub fn device_endpoint(&self) -> PatrolResult<String> {
        let host = self
            .camera
            .host
            .as_deref()
            .ok_or_else(|| PatrolError::MissingConfig("HOST".into()))?;
        Ok(if self.camera.port == 80 {
            format!("http://{}", host)
        } else {
            format!("http://{}:{}", host, self.camera.port)
        })
    }

    pub fn credentials(&self) -> Option<(String, String)> {
        let user = self.camera.user.clone()?;
        Some((user, self.camera.password.clone().unwrap_or_default()))
    }
}

fn invalid(key: &str, value: &str, expected: &str) -> PatrolError {
    PatrolError::InvalidConfig(format!("{}={:?} is not {}", key, value, expected))
}
