//! World-space transform of a mesh

use crate::point::{Point3d, Point3f, Vector3d};
use nalgebra::Matrix4;
use serde::{Deserialize, Serialize};

/// A 4x4 affine transform placing a mesh's local vertices in world space.
///
/// Distances are measured in world space, so the transform is kept in
/// double precision even though vertices are stored as `f32`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Transform3D {
    pub matrix: Matrix4<f64>,
}

impl Transform3D {
    /// Create an identity transformation
    pub fn identity() -> Self {
        Self {
            matrix: Matrix4::identity(),
        }
    }

    /// Create a translation transformation
    pub fn translation(translation: Vector3d) -> Self {
        Self {
            matrix: Matrix4::new_translation(&translation),
        }
    }

    /// Create a non-uniform scaling transformation
    pub fn scaling(scale: Vector3d) -> Self {
        Self {
            matrix: Matrix4::new_nonuniform_scaling(&scale),
        }
    }

    /// Create a uniform scaling transformation
    pub fn uniform_scaling(scale: f64) -> Self {
        Self {
            matrix: Matrix4::new_scaling(scale),
        }
    }

    /// Map a stored local-space vertex to world space.
    pub fn apply(&self, local: &Point3f) -> Point3d {
        let p = Point3d::new(local.x as f64, local.y as f64, local.z as f64);
        self.apply_d(&p)
    }

    /// Map a double-precision point to world space.
    pub fn apply_d(&self, point: &Point3d) -> Point3d {
        let h = self.matrix * point.to_homogeneous();
        Point3d::from_homogeneous(h).unwrap_or(*point)
    }

    /// Compose this transformation with another (`self` applied last)
    pub fn compose(self, other: Self) -> Self {
        Self {
            matrix: self.matrix * other.matrix,
        }
    }

    /// Get the inverse transformation
    pub fn inverse(self) -> Option<Self> {
        self.matrix
            .try_inverse()
            .map(|matrix| Self { matrix })
    }

    /// Check if this is approximately the identity transformation
    pub fn is_identity(&self, epsilon: f64) -> bool {
        (self.matrix - Matrix4::identity()).norm() < epsilon
    }
}

impl Default for Transform3D {
    fn default() -> Self {
        Self::identity()
    }
}

impl std::ops::Mul for Transform3D {
    type Output = Self;

    fn mul(self, rhs: Self) -> Self::Output {
        self.compose(rhs)
    }
}

impl From<Matrix4<f64>> for Transform3D {
    fn from(matrix: Matrix4<f64>) -> Self {
        Self { matrix }
    }
}
