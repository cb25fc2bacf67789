//! Vector primitives used by the pose solver.
//!
//! Thin wrappers over nalgebra that make the undefined cases explicit:
//! normalizing a zero vector and measuring an angle against one both
//! return `None` instead of NaN.

use nalgebra::{Point3, Vector3};

/// Euclidean distance between two points.
#[inline]
pub fn distance(a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    nalgebra::distance(a, b)
}

/// Point halfway between `a` and `b`.
#[inline]
pub fn midpoint(a: &Point3<f64>, b: &Point3<f64>) -> Point3<f64> {
    nalgebra::center(a, b)
}

/// Unit vector in the direction of `v`, or `None` if `|v| <= epsilon`.
#[inline]
pub fn normalize(v: &Vector3<f64>, epsilon: f64) -> Option<Vector3<f64>> {
    v.try_normalize(epsilon)
}

#[inline]
pub fn cross(a: &Vector3<f64>, b: &Vector3<f64>) -> Vector3<f64> {
    a.cross(b)
}

#[inline]
pub fn dot(a: &Vector3<f64>, b: &Vector3<f64>) -> f64 {
    a.dot(b)
}

/// Unsigned angle between two vectors in radians, in `[0, pi]`.
///
/// Returns `None` if either vector is shorter than `epsilon`.
pub fn angle_between(a: &Vector3<f64>, b: &Vector3<f64>, epsilon: f64) -> Option<f64> {
    let a = normalize(a, epsilon)?;
    let b = normalize(b, epsilon)?;
    // Rounding can push the cosine of parallel unit vectors just past 1.
    Some(dot(&a, &b).clamp(-1.0, 1.0).acos())
}
