//! Snapshot / working-copy pair owned by a decimation session

use crate::error::{Error, Result};
use crate::mesh::Mesh;
use crate::traits::Bounded;

/// The untouched original of a decimation session, used only as ground
/// truth for distance measurement.
///
/// A snapshot never hands out mutable access. Every retry starts from a
/// fresh [`WorkingMesh`] copied out of it.
#[derive(Debug, Clone)]
pub struct MeshSnapshot {
    mesh: Mesh,
    face_count: usize,
    diagonal: f64,
}

impl MeshSnapshot {
    /// Validate `mesh` and freeze it.
    pub fn new(mesh: Mesh) -> Result<Self> {
        mesh.validate()?;
        let face_count = mesh.face_count();
        let diagonal = mesh.diagonal();
        if !diagonal.is_finite() {
            return Err(Error::InvalidGeometry(
                "bounding box diagonal is not finite".to_string(),
            ));
        }
        Ok(Self {
            mesh,
            face_count,
            diagonal,
        })
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn face_count(&self) -> usize {
        self.face_count
    }

    pub fn vertex_count(&self) -> usize {
        self.mesh.vertex_count()
    }

    /// World-space bounding-box diagonal; may be zero for degenerate input.
    pub fn diagonal(&self) -> f64 {
        self.diagonal
    }

    /// Copy the full-resolution geometry into a new working mesh.
    pub fn working_copy(&self) -> WorkingMesh {
        WorkingMesh {
            mesh: self.mesh.clone(),
        }
    }

    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }
}

/// Mutable copy decimated during a single attempt.
#[derive(Debug, Clone)]
pub struct WorkingMesh {
    mesh: Mesh,
}

impl WorkingMesh {
    pub fn new(mesh: Mesh) -> Self {
        Self { mesh }
    }

    pub fn mesh(&self) -> &Mesh {
        &self.mesh
    }

    pub fn mesh_mut(&mut self) -> &mut Mesh {
        &mut self.mesh
    }

    pub fn face_count(&self) -> usize {
        self.mesh.face_count()
    }

    /// Hand the result downstream.
    pub fn into_mesh(self) -> Mesh {
        self.mesh
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::point::Point3f;

    #[test]
    fn test_working_copy_is_independent() {
        let mesh = Mesh::from_triangles(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            &[[0, 1, 2]],
        );
        let snapshot = MeshSnapshot::new(mesh).unwrap();
        let mut working = snapshot.working_copy();
        working.mesh_mut().faces.clear();

        assert_eq!(working.face_count(), 0);
        assert_eq!(snapshot.face_count(), 1);
        assert_eq!(snapshot.mesh().face_count(), 1);
    }

    #[test]
    fn test_snapshot_rejects_bad_indices() {
        let mesh = Mesh::from_vertices_and_faces(vec![Point3f::origin()], vec![vec![0, 1, 2]]);
        assert!(matches!(MeshSnapshot::new(mesh), Err(Error::InvalidGeometry(_))));
    }
}
