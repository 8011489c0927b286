pub mod common;
pub mod community;

pub use common::{GraphView, NodeIndex};
pub use community::{weakly_connected_components, UnionFind, WccResult};
