//! Polygon mesh data structure

use crate::error::{Error, Result};
use crate::point::*;
use crate::transform::Transform3D;
use serde::{Deserialize, Serialize};

/// A polygon mesh: vertex positions, polygon index tuples and the transform
/// placing it in world space.
///
/// Polygons may be n-gons (three or more indices). Decimation output is
/// always triangles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<Vec<usize>>,
    #[serde(default)]
    pub transform: Transform3D,
}

impl Mesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            transform: Transform3D::identity(),
        }
    }

    /// Create a mesh from vertices and polygons
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<Vec<usize>>) -> Self {
        Self {
            vertices,
            faces,
            transform: Transform3D::identity(),
        }
    }

    /// Create a mesh from vertices and triangles
    pub fn from_triangles(vertices: Vec<Point3f>, triangles: &[[usize; 3]]) -> Self {
        let faces = triangles.iter().map(|t| t.to_vec()).collect();
        Self::from_vertices_and_faces(vertices, faces)
    }

    /// Builder-style transform assignment
    pub fn with_transform(mut self, transform: Transform3D) -> Self {
        self.transform = transform;
        self
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of polygons
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of triangles the polygons fan out to
    pub fn triangle_count(&self) -> usize {
        self.faces.iter().map(|f| f.len().saturating_sub(2)).sum()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Check indices and polygon arity.
    pub fn validate(&self) -> Result<()> {
        let nv = self.vertices.len();
        for (fi, face) in self.faces.iter().enumerate() {
            if face.len() < 3 {
                return Err(Error::InvalidGeometry(format!(
                    "face {} has {} indices, expected at least 3",
                    fi,
                    face.len()
                )));
            }
            if let Some(&bad) = face.iter().find(|&&i| i >= nv) {
                return Err(Error::InvalidGeometry(format!(
                    "face {} references vertex {} but the mesh has {} vertices",
                    fi, bad, nv
                )));
            }
        }
        if self.vertices.iter().any(|v| !v.iter().all(|c| c.is_finite())) {
            return Err(Error::InvalidGeometry("non-finite vertex position".to_string()));
        }
        Ok(())
    }

    /// Fan-triangulate every polygon.
    pub fn triangles(&self) -> Vec<[usize; 3]> {
        let mut out = Vec::with_capacity(self.triangle_count());
        for face in &self.faces {
            for k in 1..face.len().saturating_sub(1) {
                out.push([face[0], face[k], face[k + 1]]);
            }
        }
        out
    }

    /// Replace the polygons with their fan triangulation.
    pub fn triangulate(&mut self) {
        if self.faces.iter().all(|f| f.len() == 3) {
            return;
        }
        self.faces = self.triangles().iter().map(|t| t.to_vec()).collect();
    }

    /// Vertex positions in world space
    pub fn world_vertices(&self) -> Vec<Point3d> {
        self.vertices.iter().map(|v| self.transform.apply(v)).collect()
    }

    /// Bake the transform into the vertices and reset it to identity.
    pub fn apply_transform(&mut self) {
        if self.transform.is_identity(1e-12) {
            return;
        }
        for v in &mut self.vertices {
            let w = self.transform.apply(v);
            *v = Point3f::new(w.x as f32, w.y as f32, w.z as f32);
        }
        self.transform = Transform3D::identity();
    }

    /// Drop vertices no polygon references, remapping indices.
    ///
    /// Returns the number of vertices removed.
    pub fn remove_unreferenced_vertices(&mut self) -> usize {
        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut kept = Vec::with_capacity(self.vertices.len());
        for face in &mut self.faces {
            for idx in face.iter_mut() {
                if remap[*idx] == usize::MAX {
                    remap[*idx] = kept.len();
                    kept.push(self.vertices[*idx]);
                }
                *idx = remap[*idx];
            }
        }
        let removed = self.vertices.len() - kept.len();
        self.vertices = kept;
        removed
    }

    /// Clear the mesh
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.faces.clear();
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}
