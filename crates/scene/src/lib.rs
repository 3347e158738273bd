//! Scene graph: the node tree the renderer draws.
//!
//! # Invariants
//! - Nodes are owned by the [`Scene`]; everyone else holds a [`NodeId`].
//! - Nodes reference materials by id and never own them.

mod graph;

pub use graph::{Scene, SceneError, SceneNode};
