use glam::Vec3;

use crate::Vertex;
use crate::dedup::SynthesisMask;

/// Fills in normals and tangent frames the source did not provide.
///
/// Face contributions are summed into every corner of the triangle, then the
/// accumulators are normalized, so the result is an angle-agnostic average.
/// Vertices outside every triangle keep a zero vector. Source normals are
/// renormalized even when nothing is synthesized.
pub fn synthesize(vertices: &mut [Vertex], indices: &[u32], mask: &SynthesisMask) {
    let want_normals = mask.needs_normals();

    if want_normals {
        for (v, &missing) in vertices.iter_mut().zip(&mask.missing_normal) {
            if missing {
                v.normal = Vec3::ZERO;
            }
        }
    }

    let mut degenerate_uv = 0usize;
    for tri in indices.chunks_exact(3) {
        let [i0, i1, i2] = [tri[0] as usize, tri[1] as usize, tri[2] as usize];
        let (v0, v1, v2) = (vertices[i0], vertices[i1], vertices[i2]);
        let e1 = v1.position - v0.position;
        let e2 = v2.position - v0.position;

        if want_normals {
            let face_normal = e1.cross(e2).normalize_or_zero();
            for i in [i0, i1, i2] {
                if mask.missing_normal[i] {
                    vertices[i].normal += face_normal;
                }
            }
        }

        let (Some(uv0), Some(uv1), Some(uv2)) = (v0.texcoord, v1.texcoord, v2.texcoord) else {
            continue;
        };
        let d1 = uv1 - uv0;
        let d2 = uv2 - uv0;
        let det = d1.x * d2.y - d1.y * d2.x;
        if det.abs() < f32::EPSILON {
            // UV 雅可比退化，跳过该三角形
            degenerate_uv += 1;
            continue;
        }
        let r = 1.0 / det;
        let tangent = (e1 * d2.y - e2 * d1.y) * r;
        let bitangent = (e2 * d1.x - e1 * d2.x) * r;
        for i in [i0, i1, i2] {
            vertices[i].tangent += tangent;
            vertices[i].bitangent += bitangent;
        }
    }

    for v in vertices.iter_mut() {
        v.normal = v.normal.normalize_or_zero();
        v.tangent = v.tangent.normalize_or_zero();
        v.bitangent = v.bitangent.normalize_or_zero();
    }

    if degenerate_uv > 0 {
        log::debug!("Skipped {} triangles with a degenerate UV mapping", degenerate_uv);
    }
}
