//! Graph data structures and operations.
//!
//! This module provides the network topology using petgraph's StableGraph
//! for stable vertex/edge indices, with Structure of Arrays (SoA) layout for
//! positions and a pose on every edge that follows its endpoints.

mod edge;
mod engine;
mod vertex;

pub use edge::{Edge, EdgeId};
pub use engine::{Graph, POSE_STRIDE};
pub use vertex::{Vertex, VertexId};
