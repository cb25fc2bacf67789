//! Engine configuration.
//!
//! Controls how edge poses are derived: the canonical axis an unrotated
//! edge primitive is aligned with, the axis used when the rotation axis is
//! undefined, and the tolerance below which a segment is considered
//! degenerate.
//!
//! Deserializable from a plain JS object, e.g.
//! `{ referenceAxis: [0, 0, 1], fallbackAxis: [1, 0, 0] }`. Missing fields
//! take their defaults.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::error::{GraphError, Result};

/// Configuration for pose derivation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GraphConfig {
    /// Axis an unrotated edge primitive is aligned with (default: +Y).
    pub reference_axis: [f64; 3],
    /// Rotation axis for antiparallel and degenerate segments (default: +X).
    /// Must be perpendicular to `reference_axis`.
    pub fallback_axis: [f64; 3],
    /// Lengths and cross products at or below this are treated as zero
    /// (default: 1e-9).
    pub epsilon: f64,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            reference_axis: [0.0, 1.0, 0.0],
            fallback_axis: [1.0, 0.0, 0.0],
            epsilon: 1e-9,
        }
    }
}

impl GraphConfig {
    /// Reference axis as a vector.
    pub fn reference(&self) -> Vector3<f64> {
        Vector3::from(self.reference_axis)
    }

    /// Fallback axis as a vector.
    pub fn fallback(&self) -> Vector3<f64> {
        Vector3::from(self.fallback_axis)
    }

    /// Check that the axes are usable and mutually perpendicular.
    pub fn validate(&self) -> Result<()> {
        if !self.epsilon.is_finite() || self.epsilon <= 0.0 {
            return Err(GraphError::InvalidConfig(format!(
                "epsilon must be finite and positive, got {}",
                self.epsilon
            )));
        }

        let reference = self
            .reference()
            .try_normalize(self.epsilon)
            .ok_or_else(|| GraphError::InvalidConfig("reference axis has zero length".into()))?;
        let fallback = self
            .fallback()
            .try_normalize(self.epsilon)
            .ok_or_else(|| GraphError::InvalidConfig("fallback axis has zero length".into()))?;

        // 1e-6 leaves room for axes typed in by hand, e.g. [0.7071, 0.7071, 0].
        if reference.dot(&fallback).abs() > 1e-6 {
            return Err(GraphError::InvalidConfig(
                "fallback axis must be perpendicular to the reference axis".into(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_valid() {
        let config = GraphConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.reference(), Vector3::y());
        assert_eq!(config.fallback(), Vector3::x());
    }

    #[test]
    fn test_zero_reference_rejected() {
        let config = GraphConfig {
            reference_axis: [0.0, 0.0, 0.0],
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(GraphError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_non_perpendicular_fallback_rejected() {
        let config = GraphConfig {
            reference_axis: [1.0, 0.0, 0.0],
            fallback_axis: [1.0, 0.0, 0.0],
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_bad_epsilon_rejected() {
        for epsilon in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let config = GraphConfig {
                epsilon,
                ..Default::default()
            };
            assert!(config.validate().is_err(), "epsilon {epsilon} accepted");
        }
    }

    #[test]
    fn test_z_up_config() {
        let config = GraphConfig {
            reference_axis: [0.0, 0.0, 2.0],
            fallback_axis: [0.0, 3.0, 0.0],
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
