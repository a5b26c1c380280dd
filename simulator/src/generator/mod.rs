pub mod camera;
pub mod scenario;
