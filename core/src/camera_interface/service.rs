use crate::camera_interface::{Notification, RawPreset};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Endpoints advertised by the device service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    pub media_endpoint: Option<String>,
    pub ptz_endpoint: Option<String>,
    pub events_endpoint: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtzSpeed {
    pub pan: f32,
    pub tilt: f32,
    pub zoom: f32,
}

impl PtzSpeed {
    pub fn uniform(speed: f32) -> Self {
        Self {
            pan: speed,
            tilt: speed,
            zoom: speed,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MoveStatus {
    Moving,
    Idle,
    Unknown,
}

/// Opaque handle of a pull-point subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SubscriptionAddress(pub String);

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum CameraError {
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("call timed out after {0:?}")]
    Timeout(Duration),
    #[error("unexpected response: {0}")]
    Protocol(String),
    #[error("camera rejected the credentials")]
    Unauthorized,
}

pub type CameraResult<T> = Result<T, CameraError>;

/// Remote camera service consumed by the patrol core.
///
/// Every call blocks until the camera answers or the transport gives up.
/// Retries and authentication belong to the implementation.
pub trait CameraService {
    fn list_capabilities(&self) -> CameraResult<Capabilities>;
    fn list_profiles(&self) -> CameraResult<Vec<String>>;
    fn list_presets(&self, profile: &str) -> CameraResult<Vec<RawPreset>>;
    fn goto_preset(&self, profile: &str, preset_token: &str, speed: PtzSpeed) -> CameraResult<()>;
    fn stop(&self, profile: &str) -> CameraResult<()>;
    fn get_status(&self, profile: &str) -> CameraResult<MoveStatus>;
    fn create_event_subscription(&self) -> CameraResult<SubscriptionAddress>;
    fn pull_messages(
        &self,
        subscription: &SubscriptionAddress,
        timeout: Duration,
        message_limit: usize,
    ) -> CameraResult<Vec<Notification>>;
}
