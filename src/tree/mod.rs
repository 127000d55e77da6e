pub mod builder;
pub mod view_state;

pub use builder::{Anomaly, NodeIdx, TaskTree, TreeNode, build_tree};
pub use view_state::{ToggleOutcome, collapse_all, expand_all, toggle};
