//! Core traits for lowpoly

use crate::{mesh::Mesh, point::*};

/// Trait for objects with a world-space axis-aligned bounding box
pub trait Bounded {
    /// Get the world-space bounding box as (min, max) corners
    fn bounding_box(&self) -> (Point3d, Point3d);

    /// Euclidean length between the bounding box corners
    fn diagonal(&self) -> f64 {
        let (min, max) = self.bounding_box();
        (max - min).norm()
    }

    /// Get the center point of the bounding box
    fn center(&self) -> Point3d {
        let (min, max) = self.bounding_box();
        nalgebra::center(&min, &max)
    }
}

impl Bounded for Mesh {
    fn bounding_box(&self) -> (Point3d, Point3d) {
        let mut corners = self.vertices.iter().map(|v| self.transform.apply(v));
        let first = match corners.next() {
            Some(p) => p,
            None => return (Point3d::origin(), Point3d::origin()),
        };

        corners.fold((first, first), |(min, max), p| {
            (min.inf(&p), max.sup(&p))
        })
    }
}
