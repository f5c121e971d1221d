//! Single-pass polygon reduction

use crate::collapse::QuadricCollapser;
use lowpoly_core::{Error, Mesh, Result, WorkingMesh};
use tracing::{debug, warn};

/// A single irreversible polygon-reduction pass.
///
/// `ratio` is the fraction of the mesh's current polygon count to retain.
pub trait DecimationOperator {
    fn decimate(&self, mesh: &mut WorkingMesh, ratio: f64) -> Result<()>;
}

impl<T: DecimationOperator + ?Sized> DecimationOperator for &T {
    fn decimate(&self, mesh: &mut WorkingMesh, ratio: f64) -> Result<()> {
        (**self).decimate(mesh, ratio)
    }
}

/// Check the arguments of a decimation pass.
///
/// Returns `Ok(false)` when the ratio asks for no reduction.
pub fn validate_pass(mesh: &Mesh, ratio: f64) -> Result<bool> {
    if mesh.face_count() == 0 {
        return Err(Error::InvalidGeometry(
            "cannot decimate a mesh with zero polygons".to_string(),
        ));
    }
    if !ratio.is_finite() || ratio <= 0.0 {
        return Err(Error::InvalidConfiguration(format!(
            "decimation ratio must be in (0, 1], got {}",
            ratio
        )));
    }
    Ok(ratio < 1.0)
}

/// Decimation operator backed by [`QuadricCollapser`].
///
/// Polygons are fan-triangulated before collapsing, so the output is always
/// a triangle mesh. The transform is left untouched; collapsing happens in
/// local space.
#[derive(Debug, Clone, Copy, Default)]
pub struct CollapseDecimator {
    pub collapser: QuadricCollapser,
}

impl CollapseDecimator {
    pub fn new(collapser: QuadricCollapser) -> Self {
        Self { collapser }
    }
}

impl DecimationOperator for CollapseDecimator {
    fn decimate(&self, mesh: &mut WorkingMesh, ratio: f64) -> Result<()> {
        let input = mesh.mesh();
        if !validate_pass(input, ratio)? {
            return Ok(());
        }
        input.validate()?;

        let polygons = input.face_count();
        let target = ((ratio * polygons as f64).round() as usize).max(1);
        let triangles = input.triangles();

        let out = self.collapser.collapse(&input.vertices, &triangles, target);
        debug!(
            polygons,
            triangles = triangles.len(),
            target,
            result = out.triangles.len(),
            collapses = out.collapses,
            "collapse pass finished"
        );

        // A pass must never leave more polygons than it started with
        if out.triangles.len() > polygons {
            warn!(
                polygons,
                result = out.triangles.len(),
                "collapse could not reduce below the input polygon count; mesh left unchanged"
            );
            return Ok(());
        }

        let transform = input.transform;
        *mesh.mesh_mut() = Mesh::from_triangles(out.vertices, &out.triangles).with_transform(transform);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lowpoly_core::{Point3f, Transform3D, Vector3d};

    fn quad_grid(size: usize) -> Mesh {
        let mut vertices = Vec::new();
        for y in 0..size {
            for x in 0..size {
                vertices.push(Point3f::new(x as f32, y as f32, 0.0));
            }
        }
        let mut faces = Vec::new();
        for y in 0..(size - 1) {
            for x in 0..(size - 1) {
                let tl = y * size + x;
                faces.push(vec![tl, tl + size, tl + size + 1, tl + 1]);
            }
        }
        Mesh::from_vertices_and_faces(vertices, faces)
    }

    #[test]
    fn test_zero_polygons_is_invalid_geometry() {
        let mut mesh = WorkingMesh::new(Mesh::from_vertices_and_faces(vec![Point3f::origin()], vec![]));
        let err = CollapseDecimator::default().decimate(&mut mesh, 0.5).unwrap_err();
        assert!(matches!(err, Error::InvalidGeometry(_)));
    }

    #[test]
    fn test_bad_ratio_is_invalid_configuration() {
        let mut mesh = WorkingMesh::new(quad_grid(4));
        for ratio in [0.0, -0.5, f64::NAN] {
            let err = CollapseDecimator::default().decimate(&mut mesh, ratio).unwrap_err();
            assert!(matches!(err, Error::InvalidConfiguration(_)));
        }
    }

    #[test]
    fn test_ratio_one_is_noop() {
        let original = quad_grid(5);
        let mut mesh = WorkingMesh::new(original.clone());
        CollapseDecimator::default().decimate(&mut mesh, 1.0).unwrap();
        assert_eq!(mesh.mesh(), &original);
        CollapseDecimator::default().decimate(&mut mesh, 3.0).unwrap();
        assert_eq!(mesh.mesh(), &original);
    }

    #[test]
    fn test_quads_are_reduced_and_triangulated() {
        let original = quad_grid(11);
        assert_eq!(original.face_count(), 100);

        let transform = Transform3D::translation(Vector3d::new(0.0, 0.0, 5.0));
        let mut mesh = WorkingMesh::new(original.with_transform(transform));
        CollapseDecimator::default().decimate(&mut mesh, 0.5).unwrap();

        assert!(mesh.face_count() <= 50);
        assert!(mesh.face_count() > 0);
        assert!(mesh.mesh().faces.iter().all(|f| f.len() == 3));
        assert_eq!(mesh.mesh().transform, transform);
    }
}
