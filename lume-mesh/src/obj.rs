//! Wavefront OBJ geometry source backed by `tobj`.

use std::io::BufRead;
use std::path::Path;

use crate::raw::{GeometrySource, MaterialRecord, RawFaceIndex, RawGeometry, RawShape};
use crate::{MeshError, MeshResult};

/// Multi-index loading keeps the position/texcoord/normal triplets intact so
/// the deduplicator sees the original corner combinations.
fn load_options() -> tobj::LoadOptions {
    tobj::LoadOptions {
        single_index: false,
        triangulate: true,
        ignore_points: true,
        ignore_lines: true,
        ..Default::default()
    }
}

#[derive(Copy, Clone, Debug, Default)]
pub struct ObjSource;

impl ObjSource {
    /// Parses OBJ text from a reader. `mtllib` statements are reported as
    /// warnings since there is no directory to resolve them against.
    pub fn parse<R: BufRead>(&self, reader: &mut R) -> MeshResult<RawGeometry> {
        let (models, materials) = tobj::load_obj_buf(reader, &load_options(), |p| {
            log::debug!("No material search path for {:?}", p);
            Err(tobj::LoadError::OpenFileFailed)
        })?;
        convert(models, materials)
    }
}

impl GeometrySource for ObjSource {
    fn read(&self, path: &Path) -> MeshResult<RawGeometry> {
        let (models, materials) = tobj::load_obj(path, &load_options())?;
        convert(models, materials)
    }
}

fn convert_material(m: tobj::Material) -> MaterialRecord {
    MaterialRecord {
        name: m.name,
        ambient: m.ambient,
        diffuse: m.diffuse,
        specular: m.specular,
        shininess: m.shininess,
        dissolve: m.dissolve,
        diffuse_texture: m.diffuse_texture,
        normal_texture: m.normal_texture,
    }
}

fn optional_indices(
    indices: &[u32],
    expected: usize,
    offset: u32,
    attribute: &str,
    model: &str,
) -> MeshResult<Option<Vec<u32>>> {
    if indices.is_empty() {
        return Ok(None);
    }
    if indices.len() != expected {
        return Err(MeshError::SourceParse(format!(
            "model '{}' has {} {} indices for {} corners",
            model,
            indices.len(),
            attribute,
            expected
        )));
    }
    Ok(Some(indices.iter().map(|&i| i + offset).collect()))
}

fn convert(
    models: Vec<tobj::Model>,
    materials: Result<Vec<tobj::Material>, tobj::LoadError>,
) -> MeshResult<RawGeometry> {
    let mut raw = RawGeometry::default();

    match materials {
        Ok(materials) => raw.materials = materials.into_iter().map(convert_material).collect(),
        Err(e) => raw.warnings.push(format!("material library not loaded: {}", e)),
    }

    for model in models {
        let mesh = model.mesh;
        let corners = mesh.indices.len();
        if corners % 3 != 0 {
            return Err(MeshError::SourceParse(format!(
                "model '{}' is not triangulated ({} indices)",
                model.name, corners
            )));
        }

        let position_offset = raw.position_count() as u32;
        let texcoords = optional_indices(
            &mesh.texcoord_indices,
            corners,
            raw.texcoord_count() as u32,
            "texcoord",
            &model.name,
        )?;
        let normals = optional_indices(
            &mesh.normal_indices,
            corners,
            raw.normal_count() as u32,
            "normal",
            &model.name,
        )?;

        // 顶点颜色按位置索引，缺失时用白色补齐，保持两个数组等长
        if !mesh.vertex_color.is_empty() || !raw.colors.is_empty() {
            raw.colors.resize(raw.positions.len(), 1.0);
            if mesh.vertex_color.len() == mesh.positions.len() {
                raw.colors.extend_from_slice(&mesh.vertex_color);
            } else {
                raw.colors.resize(raw.positions.len() + mesh.positions.len(), 1.0);
            }
        }

        raw.positions.extend_from_slice(&mesh.positions);
        raw.normals.extend_from_slice(&mesh.normals);
        raw.texcoords.extend_from_slice(&mesh.texcoords);

        let indices = mesh
            .indices
            .iter()
            .enumerate()
            .map(|(corner, &p)| {
                RawFaceIndex::new(
                    p + position_offset,
                    texcoords.as_ref().map(|t| t[corner]),
                    normals.as_ref().map(|n| n[corner]),
                )
            })
            .collect();

        raw.shapes.push(RawShape {
            name: model.name,
            indices,
            material_ids: vec![mesh.material_id; corners / 3],
        });
    }

    Ok(raw)
}
