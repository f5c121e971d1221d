//! Mesh loading, saving and scene composition
//!
//! This crate provides the collaborators around the decimation engine:
//! a [`MeshStore`] that reads and writes named, material-tagged meshes and a
//! [`SceneCompositor`] that merges them into one mesh per material group.

pub mod obj;
pub mod compositor;
pub mod error;

pub use error::*;
pub use self::obj::ObjStore;
pub use self::compositor::{MaterialCompositor, SceneCompositor};

use lowpoly_core::{Mesh, Result};
use std::path::Path;

/// A named mesh as found in, or destined for, a scene file
#[derive(Debug, Clone, PartialEq)]
pub struct MeshHandle {
    /// Object or group name
    pub name: String,
    /// Material name, if the polygons reference one
    pub material: Option<String>,
    pub mesh: Mesh,
    /// Material library files the source scene referenced
    pub material_libs: Vec<String>,
}

impl MeshHandle {
    pub fn new(name: impl Into<String>, material: Option<String>, mesh: Mesh) -> Self {
        Self {
            name: name.into(),
            material,
            mesh,
            material_libs: Vec::new(),
        }
    }

    pub fn with_material_libs(mut self, material_libs: Vec<String>) -> Self {
        self.material_libs = material_libs;
        self
    }
}

/// Library names across `handles`, first occurrence first
pub(crate) fn collect_material_libs<'a>(handles: impl IntoIterator<Item = &'a MeshHandle>) -> Vec<String> {
    let mut libs: Vec<String> = Vec::new();
    for lib in handles.into_iter().flat_map(|h| &h.material_libs) {
        if !libs.contains(lib) {
            libs.push(lib.clone());
        }
    }
    libs
}

/// Trait for reading and writing collections of meshes
pub trait MeshStore: Send + Sync {
    /// Load every mesh in the file
    fn load(&self, path: &Path) -> Result<Vec<MeshHandle>>;

    /// Write `handles` to a single file
    fn save(&self, path: &Path, handles: &[MeshHandle]) -> Result<()>;

    /// Check if this store handles the given path
    fn can_handle(&self, path: &Path) -> bool;

    /// Get the format name this store handles
    fn format_name(&self) -> &'static str;
}

/// Pick a store by file extension
pub fn store_for_path(path: &Path) -> Result<Box<dyn MeshStore>> {
    let stores: [Box<dyn MeshStore>; 1] = [Box::new(ObjStore::new())];
    stores
        .into_iter()
        .find(|s| s.can_handle(path))
        .ok_or_else(|| {
            IoError::UnsupportedFormat {
                path: path.display().to_string(),
            }
            .into()
        })
}

/// Auto-detect format and load meshes
pub fn load_meshes<P: AsRef<Path>>(path: P) -> Result<Vec<MeshHandle>> {
    let path = path.as_ref();
    store_for_path(path)?.load(path)
}

/// Auto-detect format and save meshes
pub fn save_meshes<P: AsRef<Path>>(path: P, handles: &[MeshHandle]) -> Result<()> {
    let path = path.as_ref();
    store_for_path(path)?.save(path, handles)
}
