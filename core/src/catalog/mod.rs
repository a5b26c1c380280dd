pub mod order;
pub mod trackable;

pub use order::{build_order, derive_index, PatrolOrder, Preset};
pub use trackable::{TrackablePolicy, TrackableSet};
