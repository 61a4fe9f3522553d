use std::collections::HashMap;

use glam::{Vec2, Vec3};

use crate::raw::{RawFaceIndex, RawGeometry, RawShape};
use crate::{MeshError, MeshResult, Vertex};

/// Which vertices still need synthesized attributes.
#[derive(Clone, Debug, Default)]
pub struct SynthesisMask {
    /// `true` where the source supplied no normal for that vertex.
    pub missing_normal: Vec<bool>,
    /// Any vertex carries a texture coordinate, so tangent frames are derivable.
    pub has_texcoords: bool,
}

impl SynthesisMask {
    pub fn needs_normals(&self) -> bool {
        self.missing_normal.iter().any(|&m| m)
    }
}

#[derive(Clone, Debug, Default)]
pub struct Deduplicated {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    /// Face corners that resolved to an already emitted vertex.
    pub duplicates: usize,
    pub mask: SynthesisMask,
}

fn read3(data: &[f32], index: u32, attribute: &'static str) -> MeshResult<Vec3> {
    let i = index as usize * 3;
    data.get(i..i + 3)
        .map(Vec3::from_slice)
        .ok_or(MeshError::IndexOutOfRange { attribute, index, len: data.len() / 3 })
}

fn read2(data: &[f32], index: u32, attribute: &'static str) -> MeshResult<Vec2> {
    let i = index as usize * 2;
    data.get(i..i + 2)
        .map(Vec2::from_slice)
        .ok_or(MeshError::IndexOutOfRange { attribute, index, len: data.len() / 2 })
}

fn emit_vertex(raw: &RawGeometry, key: &RawFaceIndex) -> MeshResult<Vertex> {
    let mut vertex = Vertex::new(read3(&raw.positions, key.position, "position")?);
    if let Some(n) = key.normal {
        vertex.normal = read3(&raw.normals, n, "normal")?;
    }
    if let Some(t) = key.texcoord {
        vertex.texcoord = Some(read2(&raw.texcoords, t, "texcoord")?);
    }
    // 颜色跟随位置索引
    if !raw.colors.is_empty() {
        vertex.color = Some(read3(&raw.colors, key.position, "color")?);
    }
    Ok(vertex)
}

/// Merges face corners that share an identical (position, texcoord, normal)
/// triplet into one output vertex and emits the triangle index stream.
pub fn deduplicate(raw: &RawGeometry, shape: &RawShape) -> MeshResult<Deduplicated> {
    if shape.indices.len() % 3 != 0 {
        return Err(MeshError::SourceParse(format!(
            "shape '{}' has {} face indices, not a multiple of 3",
            shape.name,
            shape.indices.len()
        )));
    }

    let mut combos: HashMap<RawFaceIndex, u32> = HashMap::with_capacity(shape.indices.len());
    let mut out = Deduplicated {
        indices: Vec::with_capacity(shape.indices.len()),
        ..Default::default()
    };

    for key in &shape.indices {
        if let Some(&existing) = combos.get(key) {
            out.indices.push(existing);
            out.duplicates += 1;
            continue;
        }

        let vertex = emit_vertex(raw, key)?;
        let idx = out.vertices.len() as u32;
        out.mask.missing_normal.push(key.normal.is_none());
        out.mask.has_texcoords |= vertex.texcoord.is_some();
        out.vertices.push(vertex);
        combos.insert(*key, idx);
        out.indices.push(idx);
    }

    log::debug!(
        "Dedup '{}': {} corners -> {} vertices ({} duplicates)",
        shape.name,
        shape.indices.len(),
        out.vertices.len(),
        out.duplicates
    );
    Ok(out)
}

/// Swaps the second and third index of every triangle.
pub fn flip_winding(indices: &mut [u32]) {
    for tri in indices.chunks_exact_mut(3) {
        tri.swap(1, 2);
    }
}
