use std::collections::HashMap;

use crate::dedup::{deduplicate, flip_winding};
use crate::material::{MaterialHandle, MaterialLoader, bind_material};
use crate::normalize::normalize;
use crate::raw::RawGeometry;
use crate::synth::synthesize;
use crate::{MeshResult, Vertex};

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct ImportOptions {
    /// Swap the second and third index of every triangle before synthesis.
    pub flip_winding: bool,
    /// Recenter on the centroid and scale into the unit sphere.
    pub normalize: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            flip_winding: false,
            normalize: true,
        }
    }
}

impl ImportOptions {
    pub fn flipped(flip_winding: bool) -> Self {
        Self {
            flip_winding,
            ..Default::default()
        }
    }
}

/// A fully processed shape that has not been handed to a store yet.
#[derive(Clone, Debug)]
pub struct ProcessedMesh {
    pub name: String,
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
    pub material: MaterialHandle,
    pub duplicates: usize,
}

/// Runs dedup, synthesis, normalization and material binding for every
/// shape in `raw`. Shapes without faces are skipped.
pub fn process_geometry<L: MaterialLoader + ?Sized>(
    raw: &RawGeometry,
    loader: &mut L,
    default_material: MaterialHandle,
    options: &ImportOptions,
) -> MeshResult<Vec<ProcessedMesh>> {
    for warning in &raw.warnings {
        log::warn!("Source: {}", warning);
    }

    let mut material_cache = HashMap::new();
    let mut meshes = Vec::with_capacity(raw.shapes.len());

    for shape in &raw.shapes {
        if shape.indices.is_empty() {
            log::warn!("Shape '{}' has no faces, skipping", shape.name);
            continue;
        }

        let mut dedup = deduplicate(raw, shape)?;
        if options.flip_winding {
            flip_winding(&mut dedup.indices);
        }
        synthesize(&mut dedup.vertices, &dedup.indices, &dedup.mask);
        if options.normalize {
            if let Some(report) = normalize(&mut dedup.vertices) {
                log::debug!(
                    "Shape '{}' centroid {:?}, radius {}",
                    shape.name,
                    report.centroid,
                    report.radius
                );
            }
        }
        let material = bind_material(
            shape,
            &raw.materials,
            loader,
            default_material,
            &mut material_cache,
        );

        meshes.push(ProcessedMesh {
            name: shape.name.clone(),
            vertices: dedup.vertices,
            indices: dedup.indices,
            material,
            duplicates: dedup.duplicates,
        });
    }

    Ok(meshes)
}
