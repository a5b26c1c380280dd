pub mod cancel;
pub mod clock;
pub mod controller;
pub mod startup;
pub mod state;
pub mod waiter;

pub use cancel::CancelToken;
pub use clock::{Clock, ManualClock, SystemClock};
pub use controller::{ControllerParts, PatrolController};
pub use startup::{start_patrol, Collaborators};
pub use state::{ControllerState, PatrolPhase, PatrolSnapshot};
pub use waiter::MovementWaiter;
