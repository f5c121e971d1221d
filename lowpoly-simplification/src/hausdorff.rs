//! Geometric fidelity metrics
//!
//! Hausdorff distances between two variants of a mesh, measured in world
//! space against an R*-tree of the reference surface's triangles.
//!
//! The one-sided measure samples only the vertices of the target mesh.
//! Regions of the reference that no target vertex lies near are invisible to
//! it; decimation only removes detail, so that direction is the one that
//! matters for quality control.

use lowpoly_core::{Bounded, Error, Mesh, Point3d, Result, Vector3d};
use rand::rngs::StdRng;
use rand::seq::index;
use rand::SeedableRng;
use rstar::{PointDistance, RTree, RTreeObject, AABB};

// ============================================================
// Triangle primitive
// ============================================================

/// A reference triangle in world space.
#[derive(Debug, Clone, PartialEq)]
pub struct WorldTriangle {
    pub a: Point3d,
    pub b: Point3d,
    pub c: Point3d,
}

fn closest_on_segment(p: &Point3d, a: &Point3d, b: &Point3d) -> Point3d {
    let ab = b - a;
    let len2 = ab.norm_squared();
    if len2 == 0.0 {
        return *a;
    }
    let t = ((p - a).dot(&ab) / len2).clamp(0.0, 1.0);
    a + ab * t
}

impl WorldTriangle {
    pub fn new(a: Point3d, b: Point3d, c: Point3d) -> Self {
        Self { a, b, c }
    }

    fn is_degenerate(&self) -> bool {
        let ab = self.b - self.a;
        let ac = self.c - self.a;
        ab.cross(&ac).norm_squared() <= f64::EPSILON * ab.norm_squared() * ac.norm_squared()
    }

    /// Closest point on the triangle (Voronoi region walk).
    pub fn closest_point(&self, p: &Point3d) -> Point3d {
        let (a, b, c) = (&self.a, &self.b, &self.c);

        if self.is_degenerate() {
            return [
                closest_on_segment(p, a, b),
                closest_on_segment(p, b, c),
                closest_on_segment(p, c, a),
            ]
            .into_iter()
            .min_by(|x, y| (x - p).norm_squared().total_cmp(&(y - p).norm_squared()))
            .unwrap_or(*a);
        }

        let ab: Vector3d = b - a;
        let ac: Vector3d = c - a;

        let ap = p - a;
        let d1 = ab.dot(&ap);
        let d2 = ac.dot(&ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return *a;
        }

        let bp = p - b;
        let d3 = ab.dot(&bp);
        let d4 = ac.dot(&bp);
        if d3 >= 0.0 && d4 <= d3 {
            return *b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            return a + ab * (d1 / (d1 - d3));
        }

        let cp = p - c;
        let d5 = ab.dot(&cp);
        let d6 = ac.dot(&cp);
        if d6 >= 0.0 && d5 <= d6 {
            return *c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            return a + ac * (d2 / (d2 - d6));
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        a + ab * (vb * denom) + ac * (vc * denom)
    }
}

impl RTreeObject for WorldTriangle {
    type Envelope = AABB<[f64; 3]>;

    fn envelope(&self) -> Self::Envelope {
        let min = self.a.inf(&self.b).inf(&self.c);
        let max = self.a.sup(&self.b).sup(&self.c);
        AABB::from_corners([min.x, min.y, min.z], [max.x, max.y, max.z])
    }
}

impl PointDistance for WorldTriangle {
    fn distance_2(&self, point: &[f64; 3]) -> f64 {
        let p = Point3d::new(point[0], point[1], point[2]);
        (self.closest_point(&p) - p).norm_squared()
    }
}

// ============================================================
// Surface index
// ============================================================

/// Spatial index over a reference surface, built once and queried for
/// every attempt of a decimation session.
pub struct SurfaceIndex {
    tree: RTree<WorldTriangle>,
}

impl SurfaceIndex {
    /// Index the world-space triangles of `reference`.
    pub fn build(reference: &Mesh) -> Self {
        let world = reference.world_vertices();
        let triangles: Vec<WorldTriangle> = reference
            .triangles()
            .into_iter()
            .map(|[a, b, c]| WorldTriangle::new(world[a], world[b], world[c]))
            .collect();

        Self {
            tree: RTree::bulk_load(triangles),
        }
    }

    pub fn triangle_count(&self) -> usize {
        self.tree.size()
    }

    /// Distance from `point` to the closest point of the indexed surface.
    pub fn distance_to(&self, point: &Point3d) -> Option<f64> {
        let query = [point.x, point.y, point.z];
        self.tree
            .nearest_neighbor(&query)
            .map(|tri| tri.distance_2(&query).sqrt())
    }

    fn max_distance<'a>(&self, points: impl IntoIterator<Item = &'a Point3d>) -> Result<f64> {
        let mut max = 0.0_f64;
        for p in points {
            let d = self.distance_to(p).ok_or_else(|| {
                Error::InvalidGeometry("reference surface has no triangles".to_string())
            })?;
            max = max.max(d);
        }
        Ok(max)
    }

    /// Maximum over `target`'s world-space vertices of the distance to this surface.
    ///
    /// An empty target is vacuously `0.0`.
    pub fn one_sided_hausdorff(&self, target: &Mesh) -> Result<f64> {
        if target.vertices.is_empty() {
            return Ok(0.0);
        }
        self.max_distance(target.world_vertices().iter())
    }
}

/// One-sided Hausdorff distance from `target`'s vertices to `reference`'s surface.
pub fn one_sided_hausdorff(target: &Mesh, reference: &Mesh) -> Result<f64> {
    if target.vertices.is_empty() {
        return Ok(0.0);
    }
    SurfaceIndex::build(reference).one_sided_hausdorff(target)
}

/// Symmetric Hausdorff distance: the larger of both one-sided distances.
pub fn bidirectional_hausdorff(a: &Mesh, b: &Mesh) -> Result<f64> {
    Ok(one_sided_hausdorff(a, b)?.max(one_sided_hausdorff(b, a)?))
}

/// World-space bounding-box diagonal of `mesh`.
pub fn bounding_box_diagonal(mesh: &Mesh) -> f64 {
    mesh.diagonal()
}

// ============================================================
// Sampled estimator
// ============================================================

/// Statistical bidirectional Hausdorff estimate from random vertex subsets.
///
/// Cheaper than the full scan on very dense meshes but carries no
/// guarantee: it can only under-estimate the true distance. It is meant for
/// cage-distance style estimates, never for the adaptive quality loop.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SampledHausdorff {
    /// Vertices sampled from each mesh
    pub samples: usize,
    /// Fixed seed for reproducible estimates
    pub seed: Option<u64>,
}

impl Default for SampledHausdorff {
    fn default() -> Self {
        Self {
            samples: 5000,
            seed: None,
        }
    }
}

impl SampledHausdorff {
    pub fn new(samples: usize, seed: Option<u64>) -> Self {
        Self { samples, seed }
    }

    fn sample_direction(&self, rng: &mut StdRng, from: &Mesh, to: &Mesh) -> Result<f64> {
        if from.vertices.is_empty() {
            return Ok(0.0);
        }
        let world = from.world_vertices();
        let amount = self.samples.min(world.len());
        let picked = index::sample(rng, world.len(), amount);
        SurfaceIndex::build(to).max_distance(picked.iter().map(|i| &world[i]))
    }

    pub fn estimate(&self, a: &Mesh, b: &Mesh) -> Result<f64> {
        let mut rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let ab = self.sample_direction(&mut rng, a, b)?;
        let ba = self.sample_direction(&mut rng, b, a)?;
        Ok(ab.max(ba))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use lowpoly_core::{Point3f, Transform3D};

    fn unit_square(z: f32) -> Mesh {
        Mesh::from_triangles(
            vec![
                Point3f::new(0.0, 0.0, z),
                Point3f::new(1.0, 0.0, z),
                Point3f::new(1.0, 1.0, z),
                Point3f::new(0.0, 1.0, z),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        )
    }

    fn curved_grid(size: usize) -> Mesh {
        let mut vertices = Vec::new();
        for y in 0..size {
            for x in 0..size {
                let fx = x as f32 / (size - 1) as f32 * std::f32::consts::PI;
                vertices.push(Point3f::new(x as f32, y as f32, fx.sin() * 3.0));
            }
        }
        let mut faces = Vec::new();
        for y in 0..(size - 1) {
            for x in 0..(size - 1) {
                let tl = y * size + x;
                faces.push([tl, tl + size, tl + 1]);
                faces.push([tl + 1, tl + size, tl + size + 1]);
            }
        }
        Mesh::from_triangles(vertices, &faces)
    }

    #[test]
    fn test_closest_point_regions() {
        let tri = WorldTriangle::new(
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(0.0, 1.0, 0.0),
        );
        // Face interior
        assert_abs_diff_eq!(tri.closest_point(&Point3d::new(0.25, 0.25, 2.0)), Point3d::new(0.25, 0.25, 0.0), epsilon = 1e-12);
        // Vertex regions
        assert_eq!(tri.closest_point(&Point3d::new(-1.0, -1.0, 0.0)), tri.a);
        assert_eq!(tri.closest_point(&Point3d::new(2.0, -0.5, 0.0)), tri.b);
        assert_eq!(tri.closest_point(&Point3d::new(-0.5, 2.0, 0.0)), tri.c);
        // Edge regions
        assert_abs_diff_eq!(tri.closest_point(&Point3d::new(0.5, -1.0, 0.0)), Point3d::new(0.5, 0.0, 0.0), epsilon = 1e-12);
        assert_abs_diff_eq!(tri.closest_point(&Point3d::new(1.0, 1.0, 0.0)), Point3d::new(0.5, 0.5, 0.0), epsilon = 1e-12);
    }

    #[test]
    fn test_degenerate_triangle() {
        let tri = WorldTriangle::new(
            Point3d::new(0.0, 0.0, 0.0),
            Point3d::new(1.0, 0.0, 0.0),
            Point3d::new(2.0, 0.0, 0.0),
        );
        let d = tri.distance_2(&[1.5, 1.0, 0.0]);
        assert_abs_diff_eq!(d, 1.0, epsilon = 1e-12);
    }

    #[test]
    fn test_self_distance_is_zero() {
        let mesh = curved_grid(15);
        assert_eq!(one_sided_hausdorff(&mesh, &mesh).unwrap(), 0.0);
        assert_eq!(bidirectional_hausdorff(&mesh, &mesh).unwrap(), 0.0);
    }

    #[test]
    fn test_offset_plane_distance() {
        let reference = unit_square(0.0);
        let target = unit_square(0.25);
        assert_abs_diff_eq!(one_sided_hausdorff(&target, &reference).unwrap(), 0.25, epsilon = 1e-6);
    }

    #[test]
    fn test_empty_target_is_zero() {
        let reference = unit_square(0.0);
        assert_eq!(one_sided_hausdorff(&Mesh::new(), &reference).unwrap(), 0.0);
    }

    #[test]
    fn test_empty_reference_is_error() {
        let target = unit_square(0.0);
        assert!(matches!(
            one_sided_hausdorff(&target, &Mesh::new()),
            Err(Error::InvalidGeometry(_))
        ));
    }

    #[test]
    fn test_one_sided_is_asymmetric() {
        // A small square sits on the big one: every small vertex touches the
        // big surface, but the big corners are far from the small one.
        let big = unit_square(0.0);
        let small = Mesh::from_triangles(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(0.5, 0.0, 0.0),
                Point3f::new(0.5, 0.5, 0.0),
                Point3f::new(0.0, 0.5, 0.0),
            ],
            &[[0, 1, 2], [0, 2, 3]],
        );

        assert_eq!(one_sided_hausdorff(&small, &big).unwrap(), 0.0);
        let reverse = one_sided_hausdorff(&big, &small).unwrap();
        assert_abs_diff_eq!(reverse, (0.5_f64 * 0.5 * 2.0).sqrt(), epsilon = 1e-6);
        assert_abs_diff_eq!(bidirectional_hausdorff(&small, &big).unwrap(), reverse);
    }

    #[test]
    fn test_world_space_transforms_are_applied() {
        let reference = unit_square(0.0);
        let target = unit_square(0.0)
            .with_transform(Transform3D::translation(lowpoly_core::Vector3d::new(0.0, 0.0, 2.0)));
        assert_abs_diff_eq!(one_sided_hausdorff(&target, &reference).unwrap(), 2.0, epsilon = 1e-9);
    }

    #[test]
    fn test_index_matches_free_function() {
        let reference = curved_grid(12);
        let target = curved_grid(6);
        let index = SurfaceIndex::build(&reference);
        assert_eq!(index.triangle_count(), reference.face_count());
        assert_eq!(
            index.one_sided_hausdorff(&target).unwrap(),
            one_sided_hausdorff(&target, &reference).unwrap()
        );
    }

    #[test]
    fn test_sampled_estimate_bounded_by_full_scan() {
        let a = curved_grid(10);
        let b = unit_square(0.0);
        let full = bidirectional_hausdorff(&a, &b).unwrap();
        let sampled = SampledHausdorff::new(20, Some(7)).estimate(&a, &b).unwrap();
        assert!(sampled <= full + 1e-9);

        // Sampling every vertex recovers the full scan
        let exhaustive = SampledHausdorff::new(usize::MAX, Some(7)).estimate(&a, &b).unwrap();
        assert_abs_diff_eq!(exhaustive, full, epsilon = 1e-12);
    }

    #[test]
    fn test_bounding_box_diagonal() {
        let mesh = unit_square(0.0);
        assert_abs_diff_eq!(bounding_box_diagonal(&mesh), 2.0_f64.sqrt(), epsilon = 1e-12);
    }
}
