//! R-tree based spatial index using the rstar crate.
//!
//! Provides O(log n) spatial queries over vertex positions for:
//! - Nearest neighbor (pointer picking)
//! - Point-in-radius
//! - Box intersection

use nalgebra::Point3;
use rstar::{AABB, PointDistance, RTree, RTreeObject};

use crate::graph::VertexId;

/// A point in the spatial index with associated vertex ID.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VertexPoint {
    /// The vertex identifier.
    pub id: VertexId,
    /// World-space coordinates.
    pub position: [f64; 3],
}

impl VertexPoint {
    /// Create a new VertexPoint.
    pub fn new(id: VertexId, position: &Point3<f64>) -> Self {
        Self {
            id,
            position: [position.x, position.y, position.z],
        }
    }
}

impl RTreeObject for VertexPoint {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        AABB::from_point(self.position)
    }
}

impl PointDistance for VertexPoint {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let dx = self.position[0] - point[0];
        let dy = self.position[1] - point[1];
        let dz = self.position[2] - point[2];
        dx * dx + dy * dy + dz * dz
    }
}

fn coords(point: &Point3<f64>) -> [f64; 3] {
    [point.x, point.y, point.z]
}

fn is_finite(point: &Point3<f64>) -> bool {
    point.coords.iter().all(|c| c.is_finite())
}

/// Spatial index for graph vertices.
///
/// Uses an R*-tree for efficient spatial queries. Only finite positions
/// are indexed; the tree cannot order NaN.
pub struct SpatialIndex {
    tree: RTree<VertexPoint>,
}

impl SpatialIndex {
    /// Create a new empty spatial index.
    pub fn new() -> Self {
        Self { tree: RTree::new() }
    }

    /// Insert a vertex into the index. Non-finite positions are skipped.
    pub fn insert(&mut self, id: VertexId, position: &Point3<f64>) {
        if is_finite(position) {
            self.tree.insert(VertexPoint::new(id, position));
        }
    }

    /// Remove a vertex from the index.
    ///
    /// `position` must be the position it was inserted with.
    /// Returns true if the vertex was found and removed.
    pub fn remove(&mut self, id: VertexId, position: &Point3<f64>) -> bool {
        is_finite(position) && self.tree.remove(&VertexPoint::new(id, position)).is_some()
    }

    /// Move a vertex from `from` to `to`.
    pub fn relocate(&mut self, id: VertexId, from: &Point3<f64>, to: &Point3<f64>) {
        self.remove(id, from);
        self.insert(id, to);
    }

    /// Find the nearest vertex to a point.
    pub fn nearest(&self, point: &Point3<f64>) -> Option<VertexId> {
        if !is_finite(point) {
            return None;
        }
        self.tree.nearest_neighbor(&coords(point)).map(|p| p.id)
    }

    /// Find the nearest vertex within a maximum distance.
    pub fn nearest_within(&self, point: &Point3<f64>, max_distance: f64) -> Option<VertexId> {
        if !is_finite(point) {
            return None;
        }
        let query = coords(point);
        let max_distance_sq = max_distance * max_distance;
        self.tree
            .nearest_neighbor(&query)
            .filter(|p| p.distance_2(&query) <= max_distance_sq)
            .map(|p| p.id)
    }

    /// Find all vertices inside an axis-aligned box.
    pub fn in_box(&self, min: &Point3<f64>, max: &Point3<f64>) -> Vec<VertexId> {
        let envelope = AABB::from_corners(coords(min), coords(max));
        self.tree
            .locate_in_envelope(&envelope)
            .map(|p| p.id)
            .collect()
    }

    /// Find all vertices within a radius of a point.
    pub fn in_radius(&self, point: &Point3<f64>, radius: f64) -> Vec<VertexId> {
        if !is_finite(point) {
            return Vec::new();
        }
        self.tree
            .locate_within_distance(coords(point), radius * radius)
            .map(|p| p.id)
            .collect()
    }

    /// Clear all vertices from the index.
    pub fn clear(&mut self) {
        self.tree = RTree::new();
    }
}

impl Default for SpatialIndex {
    fn default() -> Self {
        Self::new()
    }
}
