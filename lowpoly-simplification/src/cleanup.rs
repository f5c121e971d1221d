//! Pre-decimation geometry cleanup

use itertools::Itertools;
use lowpoly_core::Mesh;
use rstar::primitives::GeomWithData;
use rstar::RTree;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Cleanup settings
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CleanupConfig {
    /// Vertices closer than this (local units) are welded; `0` disables welding
    pub merge_distance: f64,
    /// Drop vertices no polygon references
    pub remove_loose: bool,
    /// Fan-triangulate n-gons. Off by default so the polygon count entering
    /// decimation is the one that was loaded.
    pub triangulate: bool,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            merge_distance: 0.0001,
            remove_loose: true,
            triangulate: false,
        }
    }
}

/// What a cleanup pass changed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CleanupStats {
    pub merged_vertices: usize,
    pub dropped_faces: usize,
    pub removed_vertices: usize,
}

/// Welds duplicate vertices and strips degenerate polygons
#[derive(Debug, Clone, Copy, Default)]
pub struct MeshCleanup {
    pub config: CleanupConfig,
}

impl MeshCleanup {
    pub fn new(config: CleanupConfig) -> Self {
        Self { config }
    }

    /// Map every vertex to the first vertex within `merge_distance` of it.
    fn weld_map(&self, mesh: &Mesh) -> (Vec<usize>, usize) {
        let n = mesh.vertices.len();
        let radius = self.config.merge_distance;
        if radius.is_nan() || radius <= 0.0 || n < 2 {
            return ((0..n).collect(), 0);
        }

        let tree = RTree::bulk_load(
            mesh.vertices
                .iter()
                .enumerate()
                .map(|(i, v)| GeomWithData::new([v.x as f64, v.y as f64, v.z as f64], i))
                .collect(),
        );

        let mut rep = vec![usize::MAX; n];
        let mut merged = 0;
        for (i, v) in mesh.vertices.iter().enumerate() {
            if rep[i] != usize::MAX {
                continue;
            }
            rep[i] = i;
            let query = [v.x as f64, v.y as f64, v.z as f64];
            for near in tree.locate_within_distance(query, radius * radius) {
                if rep[near.data] == usize::MAX {
                    rep[near.data] = i;
                    merged += 1;
                }
            }
        }
        (rep, merged)
    }

    /// Clean `mesh` in place.
    ///
    /// Indices must be in range; run [`Mesh::validate`] first on untrusted input.
    pub fn apply(&self, mesh: &mut Mesh) -> CleanupStats {
        let (rep, merged_vertices) = self.weld_map(mesh);

        let before = mesh.faces.len();
        mesh.faces = mesh
            .faces
            .drain(..)
            .filter_map(|face| {
                let mut face: Vec<usize> = face.into_iter().map(|i| rep[i]).dedup().collect();
                while face.len() > 1 && face.first() == face.last() {
                    face.pop();
                }
                (face.iter().unique().count() >= 3).then_some(face)
            })
            .collect();
        let dropped_faces = before - mesh.faces.len();

        let removed_vertices = if self.config.remove_loose {
            mesh.remove_unreferenced_vertices()
        } else {
            0
        };

        if self.config.triangulate {
            mesh.triangulate();
        }

        let stats = CleanupStats {
            merged_vertices,
            dropped_faces,
            removed_vertices,
        };
        debug!(?stats, "cleanup finished");
        stats
    }
}
