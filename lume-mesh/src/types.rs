use bytemuck::{Pod, Zeroable};
use glam::{Vec2, Vec3};

/// CPU-side vertex produced by the import pipeline.
///
/// `normal`, `tangent` and `bitangent` are accumulators during synthesis and
/// unit length (or exactly zero) afterwards.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Vertex {
    pub position: Vec3,
    pub normal: Vec3,
    pub tangent: Vec3,
    pub bitangent: Vec3,
    pub texcoord: Option<Vec2>,
    pub color: Option<Vec3>,
}

impl Vertex {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            normal: Vec3::ZERO,
            tangent: Vec3::ZERO,
            bitangent: Vec3::ZERO,
            texcoord: None,
            color: None,
        }
    }
}

impl Default for Vertex {
    fn default() -> Self {
        Self::new(Vec3::ZERO)
    }
}

/// Upload layout of [`Vertex`], one per entry of the packed vertex stream.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Pod, Zeroable)]
pub struct GpuVertex {
    pub position: [f32; 3],  // 12字节
    pub normal: [f32; 3],    // 12字节
    pub tangent: [f32; 3],   // 12字节
    pub bitangent: [f32; 3], // 12字节
    pub uv: [f32; 2],        // 8字节
    pub color: [f32; 3],     // 12字节，总计 68 字节
}

impl From<&Vertex> for GpuVertex {
    fn from(v: &Vertex) -> Self {
        Self {
            position: v.position.to_array(),
            normal: v.normal.to_array(),
            tangent: v.tangent.to_array(),
            bitangent: v.bitangent.to_array(),
            uv: v.texcoord.unwrap_or(Vec2::ZERO).to_array(),
            color: v.color.unwrap_or(Vec3::ONE).to_array(),
        }
    }
}
