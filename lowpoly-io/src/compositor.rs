//! Scene composition
//!
//! Flattens a loaded scene into the meshes the decimation engine works on.

use crate::{collect_material_libs, MeshHandle};
use lowpoly_core::{Mesh, Point3f, Result};
use tracing::debug;

/// Turns loaded scene meshes into independent decimation groups
pub trait SceneCompositor: Send + Sync {
    fn compose(&self, handles: Vec<MeshHandle>) -> Result<Vec<MeshHandle>>;
}

/// Merges every mesh sharing a material into one group.
///
/// Groups keep the order in which their material first appears. A group
/// made of a single mesh is passed through untouched; merged groups have
/// their transforms baked into the vertices.
#[derive(Debug, Clone, Copy, Default)]
pub struct MaterialCompositor;

impl MaterialCompositor {
    pub fn new() -> Self {
        Self
    }

    fn merge(material: Option<String>, members: Vec<MeshHandle>) -> Result<MeshHandle> {
        let mut merged = Mesh::new();
        for handle in &members {
            handle.mesh.validate()?;
            let offset = merged.vertices.len();
            merged.vertices.extend(
                handle
                    .mesh
                    .world_vertices()
                    .iter()
                    .map(|p| Point3f::new(p.x as f32, p.y as f32, p.z as f32)),
            );
            merged.faces.extend(
                handle
                    .mesh
                    .faces
                    .iter()
                    .map(|f| f.iter().map(|&i| i + offset).collect::<Vec<_>>()),
            );
        }
        let name = material.clone().unwrap_or_else(|| "default".to_string());
        debug!(group = %name, members = members.len(), faces = merged.face_count(), "merged material group");
        Ok(MeshHandle::new(name, material, merged).with_material_libs(collect_material_libs(&members)))
    }
}

impl SceneCompositor for MaterialCompositor {
    fn compose(&self, handles: Vec<MeshHandle>) -> Result<Vec<MeshHandle>> {
        let mut groups: Vec<(Option<String>, Vec<MeshHandle>)> = Vec::new();
        for handle in handles {
            match groups.iter_mut().find(|(m, _)| *m == handle.material) {
                Some((_, members)) => members.push(handle),
                None => groups.push((handle.material.clone(), vec![handle])),
            }
        }

        groups
            .into_iter()
            .map(|(material, mut members)| {
                if members.len() == 1 {
                    Ok(members.remove(0))
                } else {
                    Self::merge(material, members)
                }
            })
            .collect()
    }
}
