// src/geometry.rs
//! Planar vector geometry shared by every angle table.

use nalgebra::{Point2, Vector2};
use serde::{Deserialize, Serialize};

/// Unsigned angle between two directions, in degrees.
///
/// Returns `None` when either vector has zero length, since a zero vector
/// has no direction. The cosine is clamped into `[-1, 1]` before `acos` so
/// rounding on near-parallel vectors cannot produce NaN.
pub fn angle_between(v1: &Vector2<f64>, v2: &Vector2<f64>) -> Option<f64> {
    let dot = v1.dot(v2);
    let mag1 = v1.norm();
    let mag2 = v2.norm();

    if mag1 == 0.0 || mag2 == 0.0 || !(mag1 * mag2).is_finite() {
        return None;
    }

    let cos_angle = (dot / (mag1 * mag2)).clamp(-1.0, 1.0);
    let degrees = cos_angle.acos().to_degrees().min(180.0);
    degrees.is_finite().then_some(degrees)
}

/// Angle at `vertex` between the rays towards `start` and `end`.
pub fn angle_at(start: &Point2<f64>, vertex: &Point2<f64>, end: &Point2<f64>) -> Option<f64> {
    angle_between(&(start - vertex), &(end - vertex))
}

/// Quarter turn clockwise: `(x, y) -> (y, -x)`.
pub fn rotate90(v: &Vector2<f64>) -> Vector2<f64> {
    Vector2::new(v.y, -v.x)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Plane {
    Sagittal,
    Frontal,
}

/// Torso-derived reference directions.
///
/// This is a 2D stand-in for the anatomical planes: it assumes the subject
/// faces the camera and stands roughly upright. Angles measured against it
/// are approximations, not clinical goniometry.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BodyPlanes {
    /// Neck to hip centre, pointing down the torso.
    pub sagittal: Vector2<f64>,
    /// `sagittal` rotated a quarter turn.
    pub frontal: Vector2<f64>,
}

impl BodyPlanes {
    /// `None` when neck and root coincide.
    pub fn from_torso(neck: &Point2<f64>, root: &Point2<f64>) -> Option<Self> {
        let sagittal = root - neck;
        if sagittal.norm() == 0.0 {
            return None;
        }
        Some(Self {
            sagittal,
            frontal: rotate90(&sagittal),
        })
    }

    pub fn reference(&self, plane: Plane) -> &Vector2<f64> {
        match plane {
            Plane::Sagittal => &self.sagittal,
            Plane::Frontal => &self.frontal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    fn p(x: f64, y: f64) -> Point2<f64> {
        Point2::new(x, y)
    }

    #[test]
    fn right_angle() {
        let angle = angle_at(&p(1.0, 0.0), &p(0.0, 0.0), &p(0.0, 1.0)).unwrap();
        assert_abs_diff_eq!(angle, 90.0, epsilon = 1e-4);
    }

    #[test]
    fn coincident_points_are_absent() {
        let a = p(0.3, 0.3);
        assert_eq!(angle_at(&a, &a, &p(0.9, 0.1)), None);
        assert_eq!(angle_at(&p(0.9, 0.1), &a, &a), None);
    }

    #[test]
    fn straight_and_folded() {
        let straight = angle_at(&p(0.0, 0.0), &p(0.5, 0.5), &p(1.0, 1.0)).unwrap();
        assert_abs_diff_eq!(straight, 180.0, epsilon = 1e-4);

        let folded = angle_at(&p(1.0, 1.0), &p(0.5, 0.5), &p(1.0, 1.0)).unwrap();
        assert_abs_diff_eq!(folded, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn near_parallel_does_not_produce_nan() {
        let v = Vector2::new(0.1, 0.3);
        let w = v * 3.0000000000000004;
        let angle = angle_between(&v, &w).unwrap();
        assert!(angle.is_finite());
        assert_abs_diff_eq!(angle, 0.0, epsilon = 1e-4);
    }

    #[test]
    fn non_finite_vectors_are_absent() {
        let v = Vector2::new(f64::INFINITY, 0.0);
        assert_eq!(angle_between(&v, &Vector2::new(1.0, 0.0)), None);
    }

    #[test]
    fn rotate90_is_perpendicular() {
        let v = Vector2::new(0.0, -0.6);
        let r = rotate90(&v);
        assert_abs_diff_eq!(r.x, -0.6);
        assert_abs_diff_eq!(r.y, 0.0);
        assert_abs_diff_eq!(v.dot(&r), 0.0);
    }

    #[test]
    fn planes_from_torso() {
        let planes = BodyPlanes::from_torso(&p(0.5, 0.8), &p(0.5, 0.2)).unwrap();
        assert_abs_diff_eq!(planes.sagittal.y, -0.6, epsilon = 1e-12);
        assert_abs_diff_eq!(planes.reference(Plane::Frontal).x, -0.6, epsilon = 1e-12);
        assert!(BodyPlanes::from_torso(&p(0.5, 0.5), &p(0.5, 0.5)).is_none());
    }
}
