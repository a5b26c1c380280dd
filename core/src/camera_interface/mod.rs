pub mod notification;
pub mod preset;
pub mod service;

pub use notification::Notification;
pub use preset::RawPreset;
pub use service::{
    CameraError, CameraResult, CameraService, Capabilities, MoveStatus, PtzSpeed,
    SubscriptionAddress,
};
