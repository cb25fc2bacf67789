//! Vertex type and related structures.
//!
//! Vertices are the points of the network. Each vertex has:
//! - A stable unique identifier, assigned explicitly and never derived
//!   from the position
//! - A position (x, y, z) in world space

use nalgebra::Point3;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Stable vertex identifier.
///
/// Two vertices at the same coordinates are distinct if their ids differ.
/// It wraps a u32 for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    /// Create a new VertexId from a raw u32.
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

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Vertex({})", self.0)
    }
}

impl From<u32> for VertexId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<VertexId> for u32 {
    #[inline]
    fn from(id: VertexId) -> Self {
        id.0
    }
}

/// A point in the network.
///
/// Plain data: the graph owns the authoritative position, so a `Vertex`
/// obtained from a query is a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vertex {
    /// Stable identity; two vertices at the same spot are still distinct.
    pub id: VertexId,
    /// World-space position.
    pub position: Point3<f64>,
}

impl Vertex {
    /// Create a vertex with the given identity and position.
    #[inline]
    pub fn new(id: VertexId, position: Point3<f64>) -> Self {
        Self { id, position }
    }

    /// Shorthand for `Vertex::new(id, Point3::new(x, y, z))`.
    #[inline]
    pub fn at(id: impl Into<VertexId>, x: f64, y: f64, z: f64) -> Self {
        Self::new(id.into(), Point3::new(x, y, z))
    }

    /// Whether every coordinate is finite.
    #[inline]
    pub fn is_finite(&self) -> bool {
        self.position.coords.iter().all(|c| c.is_finite())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_vertex_id() {
        let id = VertexId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(id.0, 42);
        assert_eq!(format!("{}", id), "Vertex(42)");
    }

    #[test]
    fn test_vertex_id_conversion() {
        let id: VertexId = 123.into();
        let raw: u32 = id.into();
        assert_eq!(raw, 123);
    }

    #[test]
    fn test_vertex_at() {
        let v = Vertex::at(3, 1.0, 2.0, 3.0);
        assert_eq!(v.id, VertexId(3));
        assert_eq!(v.position, Point3::new(1.0, 2.0, 3.0));
    }

    #[test]
    fn test_identity_independent_of_position() {
        let a = Vertex::at(0, 0.0, 0.0, 0.0);
        let b = Vertex::at(1, 0.0, 0.0, 0.0);
        assert_eq!(a.position, b.position);
        assert_ne!(a.id, b.id);
        assert_ne!(a, b);
    }

    #[test]
    fn test_is_finite() {
        assert!(Vertex::at(0, 1.0, -2.0, 3.0).is_finite());
        assert!(!Vertex::at(0, f64::NAN, 0.0, 0.0).is_finite());
        assert!(!Vertex::at(0, 0.0, 0.0, f64::NEG_INFINITY).is_finite());
    }
}
