pub mod event;
pub mod normalize;
pub mod polling;
pub mod select;
pub mod tree;

pub use event::{EventSignal, KeywordSet};
pub use normalize::{normalize_leaf, normalize_token};
pub use polling::StatusPollSignal;
pub use select::connect_signal;
pub use tree::{collect_leaves, TreeNode};
