//! Spatial indexing for O(log n) vertex picking.
//!
//! This module provides an R-tree based spatial index for efficient
//! nearest-neighbor and range queries on graph vertices in 3D.

mod rtree;

pub use rtree::SpatialIndex;
