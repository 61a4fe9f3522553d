use glam::Vec3;

use crate::Vertex;

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct NormalizeReport {
    pub centroid: Vec3,
    /// Distance of the farthest vertex from the centroid before rescaling.
    pub radius: f32,
    pub rescaled: bool,
}

/// Running mean of the positions, folded left to right.
pub fn centroid(vertices: &[Vertex]) -> Vec3 {
    vertices
        .iter()
        .enumerate()
        .fold(Vec3::ZERO, |mean, (i, v)| mean + (v.position - mean) / (i + 1) as f32)
}

/// Recenters the cloud on its centroid and scales it into the unit sphere.
///
/// Returns `None` for an empty slice. A cloud whose points all coincide is
/// only recentered.
pub fn normalize(vertices: &mut [Vertex]) -> Option<NormalizeReport> {
    if vertices.is_empty() {
        return None;
    }

    let center = centroid(vertices);
    let mut max_sq: f32 = 0.0;
    for v in vertices.iter_mut() {
        v.position -= center;
        max_sq = max_sq.max(v.position.length_squared());
    }

    let rescaled = max_sq > 0.0 && max_sq.is_finite();
    if rescaled {
        let scale = max_sq.sqrt().recip();
        for v in vertices.iter_mut() {
            v.position *= scale;
        }
    } else {
        log::warn!("Degenerate position cloud ({} vertices), skipping rescale", vertices.len());
    }

    Some(NormalizeReport { centroid: center, radius: max_sq.sqrt(), rescaled })
}
