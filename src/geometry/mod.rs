//! Geometry for placing edge primitives in 3D.
//!
//! - `vector`: distance, midpoint, normalize, cross/dot, angle-between
//! - `pose`: endpoint pair -> translation + axis/angle rotation + length

pub mod pose;
pub mod vector;

pub use pose::{Pose, PoseSolver};
