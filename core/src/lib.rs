//! Patrol and tracking control core for PTZ cameras.
//!
//! A camera is walked through its stored presets in numeric order. At each
//! stop the controller samples a detection signal, and at trackable presets a
//! confirmed person holds the camera in place until they are gone.

pub mod camera_interface;
pub mod catalog;
pub mod control;
pub mod prelude;
pub mod signal;
pub mod telemetry;

#[cfg(test)]
mod testing;

pub use control::{start_patrol, Collaborators, PatrolController};
pub use prelude::{MotionSignal, PatrolConfig, PatrolError, Presence, Reading};
