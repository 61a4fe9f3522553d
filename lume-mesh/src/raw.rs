//! Raw geometry as handed over by a geometry source, before any processing.
//!
//! Attribute arrays are flat (`positions`/`normals`/`colors` stride 3,
//! `texcoords` stride 2) and shared by every shape in the file.

use std::hash::{Hash, Hasher};
use std::path::Path;

use crate::MeshResult;

/// One corner of one triangle: offsets into the flat attribute arrays.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct RawFaceIndex {
    pub position: u32,
    pub texcoord: Option<u32>,
    pub normal: Option<u32>,
}

impl RawFaceIndex {
    pub fn new(position: u32, texcoord: Option<u32>, normal: Option<u32>) -> Self {
        Self { position, texcoord, normal }
    }

    /// Folds the three components into one word, each field on its own shift.
    fn mix(&self) -> u64 {
        let texcoord = self.texcoord.unwrap_or(u32::MAX) as u64;
        let normal = self.normal.unwrap_or(u32::MAX) as u64;
        (self.position as u64) ^ texcoord.rotate_left(21) ^ normal.rotate_left(42)
    }
}

impl Hash for RawFaceIndex {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.mix());
    }
}

#[derive(Clone, Debug, Default)]
pub struct RawShape {
    pub name: String,
    /// Three entries per triangle.
    pub indices: Vec<RawFaceIndex>,
    /// One entry per triangle; `None` means no material was assigned.
    pub material_ids: Vec<Option<usize>>,
}

impl RawShape {
    pub fn face_count(&self) -> usize {
        self.indices.len() / 3
    }

    /// Some face's material differs from the first face's.
    pub fn has_mixed_materials(&self) -> bool {
        match self.material_ids.split_first() {
            Some((first, rest)) => rest.iter().any(|m| m != first),
            None => false,
        }
    }
}

/// Source-level material description. Only handle binding consumes it.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MaterialRecord {
    pub name: String,
    pub ambient: Option<[f32; 3]>,
    pub diffuse: Option<[f32; 3]>,
    pub specular: Option<[f32; 3]>,
    pub shininess: Option<f32>,
    pub dissolve: Option<f32>,
    pub diffuse_texture: Option<String>,
    pub normal_texture: Option<String>,
}

#[derive(Clone, Debug, Default)]
pub struct RawGeometry {
    pub positions: Vec<f32>,
    pub normals: Vec<f32>,
    pub texcoords: Vec<f32>,
    /// Indexed by the position index, like `positions`.
    pub colors: Vec<f32>,
    pub shapes: Vec<RawShape>,
    pub materials: Vec<MaterialRecord>,
    /// Non-fatal anomalies reported by the source.
    pub warnings: Vec<String>,
}

impl RawGeometry {
    pub fn position_count(&self) -> usize {
        self.positions.len() / 3
    }

    pub fn normal_count(&self) -> usize {
        self.normals.len() / 3
    }

    pub fn texcoord_count(&self) -> usize {
        self.texcoords.len() / 2
    }

    pub fn color_count(&self) -> usize {
        self.colors.len() / 3
    }
}

/// Anything that can turn a file on disk into [`RawGeometry`].
pub trait GeometrySource {
    fn read(&self, path: &Path) -> MeshResult<RawGeometry>;
}
