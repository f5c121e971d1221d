//! OBJ format support

use crate::{collect_material_libs, IoError, MeshHandle, MeshStore};
use ::obj::{Group, IndexTuple, Mtl, ObjData, ObjMaterial, Object, SimplePolygon};
use lowpoly_core::{Mesh, Point3f, Result};
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Reads and writes Wavefront OBJ scenes.
///
/// Every non-empty object/group becomes one [`MeshHandle`] with its own
/// compacted vertex list. On save, each handle is written as an object with
/// its transform baked into the positions.
#[derive(Debug, Clone, Copy, Default)]
pub struct ObjStore;

fn material_name(material: &Option<ObjMaterial>) -> Option<String> {
    match material {
        Some(ObjMaterial::Ref(name)) => Some(name.clone()),
        Some(ObjMaterial::Mtl(mtl)) => Some(mtl.name.clone()),
        None => None,
    }
}

impl ObjStore {
    pub fn new() -> Self {
        Self
    }

    /// Parse OBJ text. `source` names the input in error messages.
    pub fn read_from<R: Read>(&self, reader: R, source: &str) -> Result<Vec<MeshHandle>> {
        let data = ObjData::load_buf(reader).map_err(|e| IoError::ParseError {
            path: source.to_string(),
            message: e.to_string(),
        })?;
        Self::handles_from(&data, source)
    }

    /// Serialize `handles` as OBJ text.
    pub fn write_to<W: Write>(&self, out: &mut W, handles: &[MeshHandle], dest: &str) -> Result<()> {
        let data = Self::data_from(handles)?;
        data.write_to_buf(out).map_err(|e| IoError::WriteError {
            path: dest.to_string(),
            message: e.to_string(),
        })?;
        Ok(())
    }

    fn handles_from(data: &ObjData, source: &str) -> Result<Vec<MeshHandle>> {
        let mut handles = Vec::new();
        let mut skipped = 0usize;
        let material_libs: Vec<String> = data.material_libs.iter().map(|m| m.filename.clone()).collect();

        for object in &data.objects {
            let populated = object.groups.iter().filter(|g| !g.polys.is_empty()).count();
            for group in object.groups.iter().filter(|g| !g.polys.is_empty()) {
                let mut remap: HashMap<usize, usize> = HashMap::new();
                let mut vertices: Vec<Point3f> = Vec::new();
                let mut faces = Vec::with_capacity(group.polys.len());

                for SimplePolygon(corners) in &group.polys {
                    if corners.len() < 3 {
                        skipped += 1;
                        continue;
                    }
                    let mut face = Vec::with_capacity(corners.len());
                    for IndexTuple(p, _, _) in corners {
                        let [x, y, z] = *data.position.get(*p).ok_or_else(|| IoError::ParseError {
                            path: source.to_string(),
                            message: format!("position index {} out of range", p + 1),
                        })?;
                        let local = *remap.entry(*p).or_insert_with(|| {
                            vertices.push(Point3f::new(x, y, z));
                            vertices.len() - 1
                        });
                        face.push(local);
                    }
                    faces.push(face);
                }

                if faces.is_empty() {
                    continue;
                }
                let name = if populated > 1 {
                    format!("{}.{}", object.name, group.name)
                } else {
                    object.name.clone()
                };
                handles.push(
                    MeshHandle::new(
                        name,
                        material_name(&group.material),
                        Mesh::from_vertices_and_faces(vertices, faces),
                    )
                    .with_material_libs(material_libs.clone()),
                );
            }
        }

        if skipped > 0 {
            warn!(source, skipped, "ignored polygons with fewer than three corners");
        }
        debug!(source, meshes = handles.len(), "parsed obj");
        Ok(handles)
    }

    fn data_from(handles: &[MeshHandle]) -> Result<ObjData> {
        let mut data = ObjData::default();
        data.material_libs = collect_material_libs(handles).into_iter().map(Mtl::new).collect();

        for handle in handles {
            handle.mesh.validate()?;
            let offset = data.position.len();
            data.position.extend(
                handle
                    .mesh
                    .world_vertices()
                    .iter()
                    .map(|p| [p.x as f32, p.y as f32, p.z as f32]),
            );

            let mut group = Group::new(handle.material.clone().unwrap_or_else(|| "default".to_string()));
            group.material = handle.material.clone().map(ObjMaterial::Ref);
            group.polys = handle
                .mesh
                .faces
                .iter()
                .map(|face| SimplePolygon(face.iter().map(|&i| IndexTuple(offset + i, None, None)).collect()))
                .collect();

            let mut object = Object::new(handle.name.clone());
            object.groups.push(group);
            data.objects.push(object);
        }

        Ok(data)
    }
}

impl MeshStore for ObjStore {
    fn load(&self, path: &Path) -> Result<Vec<MeshHandle>> {
        let file = File::open(path)?;
        self.read_from(BufReader::new(file), &path.display().to_string())
    }

    fn save(&self, path: &Path, handles: &[MeshHandle]) -> Result<()> {
        let file = File::create(path)?;
        let mut out = BufWriter::new(file);
        self.write_to(&mut out, handles, &path.display().to_string())?;
        out.flush()?;
        Ok(())
    }

    fn can_handle(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("obj"))
            .unwrap_or(false)
    }

    fn format_name(&self) -> &'static str {
        "obj"
    }
}
