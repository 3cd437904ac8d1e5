//! Timeline hierarchy types: layers, nodes, and the date parsing boundary.

mod layer;
mod node;

pub use layer::TimelineLayer;
pub use node::{parse_date, ChildNode, HierarchyNode};
pub(crate) use node::check_range;
