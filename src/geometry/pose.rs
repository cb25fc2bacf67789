//! Pose derivation for oriented edge primitives.
//!
//! An edge is drawn as a unit primitive (a cylinder or box) that is
//! aligned with the reference axis before any transform. [`PoseSolver`]
//! turns the two endpoints of a segment into the rotation and translation
//! that stretch such a primitive from one endpoint to the other.

use nalgebra::{Isometry3, Matrix4, Point3, Translation3, Unit, UnitQuaternion, Vector3};
use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use super::vector;
use crate::config::GraphConfig;
use crate::error::Result;

/// Placement of an oriented primitive along a segment.
///
/// Apply `rotation_axis`/`rotation_angle_degrees` first, then translate to
/// `midpoint`. The primitive's extent along the reference axis should be
/// `length`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    /// Distance between the endpoints.
    pub length: f64,
    /// Point halfway between the endpoints.
    pub midpoint: Point3<f64>,
    /// Unit rotation axis.
    pub rotation_axis: Vector3<f64>,
    /// Right-handed rotation about `rotation_axis`, in degrees.
    pub rotation_angle_degrees: f64,
}

impl Pose {
    /// A pose with no rotation.
    fn unrotated(length: f64, midpoint: Point3<f64>, axis: Vector3<f64>) -> Self {
        Self {
            length,
            midpoint,
            rotation_axis: axis,
            rotation_angle_degrees: 0.0,
        }
    }

    /// Whether the rotation is the identity.
    #[inline]
    pub fn is_identity_rotation(&self) -> bool {
        self.rotation_angle_degrees == 0.0
    }

    /// Whether the segment has zero length.
    #[inline]
    pub fn is_degenerate(&self) -> bool {
        self.length == 0.0
    }

    /// The rotation as a quaternion.
    pub fn rotation(&self) -> UnitQuaternion<f64> {
        UnitQuaternion::from_axis_angle(
            &Unit::new_normalize(self.rotation_axis),
            self.rotation_angle_degrees.to_radians(),
        )
    }

    /// Rotate `v` by this pose's rotation.
    pub fn rotate(&self, v: &Vector3<f64>) -> Vector3<f64> {
        self.rotation() * v
    }

    /// Rotate-then-translate as a 4x4 homogeneous matrix.
    pub fn to_homogeneous(&self) -> Matrix4<f64> {
        Isometry3::from_parts(Translation3::from(self.midpoint.coords), self.rotation())
            .to_homogeneous()
    }
}

/// Derives [`Pose`]s from segment endpoints.
///
/// Stateless apart from its configuration; `solve` is a pure function of
/// its inputs.
#[derive(Debug, Clone, Copy)]
pub struct PoseSolver {
    reference: Unit<Vector3<f64>>,
    fallback: Unit<Vector3<f64>>,
    epsilon: f64,
}

impl PoseSolver {
    /// Create a solver from a validated configuration.
    pub fn new(config: &GraphConfig) -> Result<Self> {
        config
            .validate()
            .inspect_err(|err| warn!(%err, "rejected pose configuration"))?;
        Ok(Self {
            reference: Unit::new_normalize(config.reference()),
            fallback: Unit::new_normalize(config.fallback()),
            epsilon: config.epsilon,
        })
    }

    /// Canonical axis of an unrotated primitive.
    #[inline]
    pub fn reference_axis(&self) -> Vector3<f64> {
        self.reference.into_inner()
    }

    /// Derive the pose placing a primitive from `start` to `end`.
    ///
    /// Zero-length segments yield a pose of length 0 with identity
    /// rotation. Segments parallel to the reference axis yield the identity
    /// rotation. Antiparallel segments rotate -180 degrees about the
    /// fallback axis.
    pub fn solve(&self, start: &Point3<f64>, end: &Point3<f64>) -> Pose {
        let diff = end - start;
        let midpoint = vector::midpoint(start, end);

        let Some(direction) = vector::normalize(&diff, self.epsilon) else {
            trace!(?start, ?end, "degenerate segment");
            return Pose::unrotated(0.0, midpoint, self.fallback.into_inner());
        };

        let length = diff.norm();
        let cos = vector::dot(&direction, &self.reference).clamp(-1.0, 1.0);

        match vector::normalize(&vector::cross(&direction, &self.reference), self.epsilon) {
            Some(axis) => Pose {
                length,
                midpoint,
                rotation_axis: axis,
                rotation_angle_degrees: -cos.acos().to_degrees(),
            },
            None if cos > 0.0 => Pose::unrotated(length, midpoint, self.fallback.into_inner()),
            None => {
                trace!(?start, ?end, "segment antiparallel to reference axis");
                Pose {
                    length,
                    midpoint,
                    rotation_axis: self.fallback.into_inner(),
                    rotation_angle_degrees: -180.0,
                }
            }
        }
    }

    /// Recover the segment endpoints a pose was derived from.
    pub fn endpoints(&self, pose: &Pose) -> (Point3<f64>, Point3<f64>) {
        let half = pose.rotate(&self.reference) * (pose.length / 2.0);
        (pose.midpoint - half, pose.midpoint + half)
    }
}

impl Default for PoseSolver {
    fn default() -> Self {
        Self {
            reference: Vector3::y_axis(),
            fallback: Vector3::x_axis(),
            epsilon: GraphConfig::default().epsilon,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_vec_close(a: &Vector3<f64>, b: &Vector3<f64>) {
        assert!((a - b).norm() < 1e-9, "{a:?} != {b:?}");
    }

    fn assert_finite(pose: &Pose) {
        assert!(pose.length.is_finite());
        assert!(pose.midpoint.coords.iter().all(|c| c.is_finite()));
        assert!(pose.rotation_axis.iter().all(|c| c.is_finite()));
        assert!(pose.rotation_angle_degrees.is_finite());
    }

    #[test]
    fn test_reference_segment() {
        let solver = PoseSolver::default();
        let pose = solver.solve(&Point3::origin(), &Point3::new(100.0, 100.0, 50.0));

        assert!((pose.length - 150.0).abs() < 1e-6);
        assert_eq!(pose.midpoint, Point3::new(50.0, 50.0, 25.0));
        assert!((pose.rotation_axis.norm() - 1.0).abs() < 1e-12);

        let direction = Vector3::new(2.0, 2.0, 1.0) / 3.0;
        assert_vec_close(&pose.rotate(&Vector3::y()), &direction);
    }

    #[test]
    fn test_angle_matches_formula() {
        let solver = PoseSolver::default();
        let pose = solver.solve(&Point3::origin(), &Point3::new(1.0, 0.0, 0.0));

        // +X is 90 degrees from +Y.
        assert!((pose.rotation_angle_degrees + 90.0).abs() < 1e-9);
        // cross(+X, +Y) = +Z
        assert_vec_close(&pose.rotation_axis, &Vector3::z());
        assert_vec_close(&pose.rotate(&Vector3::y()), &Vector3::x());
    }

    #[test]
    fn test_zero_length() {
        let solver = PoseSolver::default();
        let p = Point3::new(3.0, -4.0, 5.0);
        let pose = solver.solve(&p, &p);

        assert_finite(&pose);
        assert!(pose.is_degenerate());
        assert!(pose.is_identity_rotation());
        assert_eq!(pose.midpoint, p);
    }

    #[test]
    fn test_parallel_to_reference() {
        let solver = PoseSolver::default();
        let pose = solver.solve(&Point3::new(1.0, 0.0, 1.0), &Point3::new(1.0, 10.0, 1.0));

        assert_finite(&pose);
        assert!(pose.is_identity_rotation());
        assert!((pose.length - 10.0).abs() < 1e-12);
        assert_eq!(pose.midpoint, Point3::new(1.0, 5.0, 1.0));
    }

    #[test]
    fn test_antiparallel_to_reference() {
        let solver = PoseSolver::default();
        let pose = solver.solve(&Point3::new(0.0, 10.0, 0.0), &Point3::origin());

        assert_finite(&pose);
        assert_eq!(pose.rotation_angle_degrees, -180.0);
        assert_vec_close(&pose.rotation_axis, &Vector3::x());
        assert_vec_close(&pose.rotate(&Vector3::y()), &-Vector3::y());
    }

    #[test]
    fn test_endpoints_roundtrip() {
        let solver = PoseSolver::default();
        let a = Point3::new(-80.0, 100.0, -50.0);
        let b = Point3::new(0.0, 0.0, 500.0);
        let (start, end) = solver.endpoints(&solver.solve(&a, &b));

        assert_vec_close(&start.coords, &a.coords);
        assert_vec_close(&end.coords, &b.coords);
    }

    #[test]
    fn test_homogeneous_maps_reference_tip() {
        let solver = PoseSolver::default();
        let a = Point3::new(70.0, 700.0, 100.0);
        let b = Point3::new(0.0, 0.0, 500.0);
        let pose = solver.solve(&a, &b);

        let half = pose.length / 2.0;
        let tip = pose.to_homogeneous().transform_point(&Point3::new(0.0, half, 0.0));
        assert!((tip - b).norm() < 1e-6);
    }

    #[test]
    fn test_custom_reference_axis() {
        let config = GraphConfig {
            reference_axis: [0.0, 0.0, 1.0],
            fallback_axis: [0.0, 1.0, 0.0],
            ..Default::default()
        };
        let solver = PoseSolver::new(&config).unwrap();
        assert_eq!(solver.reference_axis(), Vector3::z());

        let pose = solver.solve(&Point3::origin(), &Point3::new(0.0, 0.0, -2.0));
        assert_eq!(pose.rotation_angle_degrees, -180.0);
        assert_vec_close(&pose.rotation_axis, &Vector3::y());
        assert_vec_close(&pose.rotate(&Vector3::z()), &-Vector3::z());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = GraphConfig {
            fallback_axis: [0.0, 1.0, 0.0],
            ..Default::default()
        };
        assert!(PoseSolver::new(&config).is_err());
    }

    #[test]
    fn test_deterministic() {
        let solver = PoseSolver::default();
        let a = Point3::new(1.5, -2.25, 3.0);
        let b = Point3::new(-7.0, 4.0, 0.5);
        assert_eq!(solver.solve(&a, &b), solver.solve(&a, &b));
    }
}
