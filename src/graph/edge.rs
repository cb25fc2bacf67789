//! Edge type and related structures.
//!
//! Edges are directed connections between vertices. Each edge has:
//! - A stable unique identifier
//! - Start and end vertex IDs (the edge never owns its endpoints)
//! - A pose derived from the endpoint positions, refreshed whenever an
//!   endpoint moves
//! - An opaque appearance handle and payload, passed through unchanged

use std::fmt;

use serde::{Deserialize, Serialize};

use super::vertex::VertexId;
use crate::geometry::Pose;

/// Stable edge identifier.
///
/// Ids are assigned in creation order, which is also the order edges are
/// reported in within a vertex's adjacency list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeId(pub u32);

impl EdgeId {
    /// Create a new EdgeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Edge({})", self.0)
    }
}

impl From<u32> for EdgeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<EdgeId> for u32 {
    #[inline]
    fn from(id: EdgeId) -> Self {
        id.0
    }
}

/// A directed, posed connection between two vertices.
///
/// `A` is the renderer's appearance handle (a material id, a color),
/// `P` an arbitrary user payload.
#[derive(Debug, Clone)]
pub struct Edge<A = (), P = ()> {
    id: EdgeId,
    source: VertexId,
    target: VertexId,
    pose: Pose,
    appearance: A,
    payload: P,
}

impl<A, P> Edge<A, P> {
    pub(crate) fn new(
        id: EdgeId,
        source: VertexId,
        target: VertexId,
        pose: Pose,
        appearance: A,
        payload: P,
    ) -> Self {
        Self {
            id,
            source,
            target,
            pose,
            appearance,
            payload,
        }
    }

    /// Stable edge identity.
    #[inline]
    pub fn id(&self) -> EdgeId {
        self.id
    }

    /// Start vertex.
    #[inline]
    pub fn source(&self) -> VertexId {
        self.source
    }

    /// End vertex.
    #[inline]
    pub fn target(&self) -> VertexId {
        self.target
    }

    /// Current placement of the edge primitive.
    #[inline]
    pub fn pose(&self) -> &Pose {
        &self.pose
    }

    /// Current distance between the endpoints.
    #[inline]
    pub fn length(&self) -> f64 {
        self.pose.length
    }

    /// Renderer-side appearance handle.
    #[inline]
    pub fn appearance(&self) -> &A {
        &self.appearance
    }

    /// Opaque data attached at creation.
    #[inline]
    pub fn payload(&self) -> &P {
        &self.payload
    }

    /// Whether both endpoints are the same vertex.
    #[inline]
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }

    pub(crate) fn set_pose(&mut self, pose: Pose) {
        self.pose = pose;
    }
}
