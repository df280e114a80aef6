//! Pose and orientation helpers used by the atomic predicates.
//!
//! Orientation math is done in `f64` with `glam`'s double-precision types.
//! Quaternions coming from MuJoCo are ordered `[w, x, y, z]`; use
//! [`Pose::from_wxyz`] at the boundary so that nothing else has to care.

use std::fmt;
use std::str::FromStr;

use glam::{DQuat, DVec3, EulerRot};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A Cartesian axis, in either an object's local frame or the world frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Axis {
    /// The x axis.
    X,
    /// The y axis.
    Y,
    /// The z axis (world vertical).
    Z,
}

impl Axis {
    /// Unit vector along this axis.
    #[must_use]
    pub const fn unit(self) -> DVec3 {
        match self {
            Self::X => DVec3::X,
            Self::Y => DVec3::Y,
            Self::Z => DVec3::Z,
        }
    }

    /// Component of `v` along this axis.
    #[must_use]
    pub fn component(self, v: DVec3) -> f64 {
        match self {
            Self::X => v.x,
            Self::Y => v.y,
            Self::Z => v.z,
        }
    }

    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::Z => "z",
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Axis {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "x" => Ok(Self::X),
            "y" => Ok(Self::Y),
            "z" => Ok(Self::Z),
            _ => Err(ValidationError::InvalidAxis {
                value: s.to_string(),
            }),
        }
    }
}

/// World pose of an object: position and unit orientation quaternion.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World position.
    pub position: DVec3,
    /// World orientation (unit quaternion).
    pub orientation: DQuat,
}

impl Default for Pose {
    fn default() -> Self {
        Self {
            position: DVec3::ZERO,
            orientation: DQuat::IDENTITY,
        }
    }
}

impl Pose {
    /// Creates a pose. The orientation is normalized.
    #[must_use]
    pub fn new(position: DVec3, orientation: DQuat) -> Self {
        Self {
            position,
            orientation: orientation.normalize(),
        }
    }

    /// Creates an unrotated pose at `position`.
    #[must_use]
    pub fn at(x: f64, y: f64, z: f64) -> Self {
        Self::new(DVec3::new(x, y, z), DQuat::IDENTITY)
    }

    /// Creates a pose from a position and a `[w, x, y, z]` quaternion.
    #[must_use]
    pub fn from_wxyz(position: [f64; 3], quat: [f64; 4]) -> Self {
        let [w, x, y, z] = quat;
        Self::new(DVec3::from_array(position), DQuat::from_xyzw(x, y, z, w))
    }

    /// Replaces the orientation.
    #[must_use]
    pub fn with_orientation(mut self, orientation: DQuat) -> Self {
        self.orientation = orientation.normalize();
        self
    }

    /// Coordinate of the position along `axis`.
    #[must_use]
    pub fn coordinate(&self, axis: Axis) -> f64 {
        axis.component(self.position)
    }

    /// The object's local `axis` expressed in world coordinates.
    #[must_use]
    pub fn world_axis(&self, axis: Axis) -> DVec3 {
        self.orientation * axis.unit()
    }

    /// A local direction vector expressed in world coordinates.
    #[must_use]
    pub fn world_direction(&self, local: DVec3) -> DVec3 {
        self.orientation * local
    }

    /// XYZ Euler angles of the orientation, in degrees.
    #[must_use]
    pub fn euler_degrees(&self) -> [f64; 3] {
        let (a, b, c) = self.orientation.to_euler(EulerRot::XYZ);
        [a.to_degrees(), b.to_degrees(), c.to_degrees()]
    }
}

/// Angle between two vectors in degrees, in `[0, 180]`.
///
/// Returns `None` if either vector has zero length.
#[must_use]
pub fn angle_between_degrees(a: DVec3, b: DVec3) -> Option<f64> {
    let denom = a.length() * b.length();
    if denom <= f64::EPSILON {
        return None;
    }
    let cos = (a.dot(b) / denom).clamp(-1.0, 1.0);
    Some(cos.acos().to_degrees())
}

/// Absolute difference of two angles in degrees, wrapped into `[0, 180]`.
#[must_use]
pub fn wrapped_angle_diff_degrees(a: f64, b: f64) -> f64 {
    let diff = (a - b).rem_euclid(360.0);
    if diff > 180.0 {
        360.0 - diff
    } else {
        diff
    }
}

/// Distance between two points projected onto the xy plane.
#[must_use]
pub fn planar_distance(a: DVec3, b: DVec3) -> f64 {
    a.truncate().distance(b.truncate())
}
