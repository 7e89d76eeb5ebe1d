//! Dependency graph construction and validation.
//!
//! Raw task and dependency records are selected, normalized, and laid out in
//! an arena indexed by integer handles; cycle validation gates the graph
//! before any timing computation runs.

mod builder;
mod cycle;
mod index;

pub use builder::{build_graph, EdgeRef, TimelineGraph};
pub(crate) use builder::overlaps_window;
pub use cycle::{detect_cycles, CycleReport};
pub use index::{NodeId, TaskIndex};
