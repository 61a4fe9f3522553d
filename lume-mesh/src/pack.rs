//! Flat binary layout of a [`MeshStore`] for the renderer upload path.
//!
//! ```text
//! PackHeader | PackedMeshEntry * mesh_count | GpuVertex * N | u32 * M
//! ```

use std::fs::File;
use std::io::{BufWriter, Write};
use std::mem::size_of;
use std::path::Path;

use bytemuck::{Pod, Zeroable, cast_slice};
use memmap2::Mmap;

use crate::material::MaterialHandle;
use crate::store::{MeshKey, MeshStore};
use crate::{GpuVertex, MeshError, MeshResult};

pub const PACK_MAGIC: [u8; 4] = *b"LMSH";
pub const PACK_VERSION: u32 = 1;

#[repr(C)]
#[derive(Copy, Clone, Debug, Pod, Zeroable)]
pub struct PackHeader {
    pub magic: [u8; 4], // "LMSH"
    pub version: u32,
    pub mesh_count: u32,
    pub _padding: u32,
}

/// Offsets are in elements of the vertex / index streams, not bytes.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, Eq, Pod, Zeroable)]
pub struct PackedMeshEntry {
    pub key: u32,
    pub material: u32,
    pub vertex_offset: u32,
    pub vertex_count: u32,
    pub index_offset: u32,
    pub index_count: u32,
}

impl PackedMeshEntry {
    pub fn key(&self) -> MeshKey {
        MeshKey(self.key)
    }

    pub fn material(&self) -> MaterialHandle {
        MaterialHandle(self.material)
    }
}

/// Writes every mesh of `store` in key order.
pub fn write_store<W: Write>(store: &MeshStore, mut writer: W) -> MeshResult<()> {
    let mut entries = Vec::with_capacity(store.len());
    let mut vertices: Vec<GpuVertex> = Vec::new();
    let mut indices: Vec<u32> = Vec::new();

    for (key, mesh) in store.iter() {
        entries.push(PackedMeshEntry {
            key: key.0,
            material: mesh.material().0,
            vertex_offset: vertices.len() as u32,
            vertex_count: mesh.vertices().len() as u32,
            index_offset: indices.len() as u32,
            index_count: mesh.indices().len() as u32,
        });
        vertices.extend(mesh.gpu_vertices());
        indices.extend_from_slice(mesh.indices());
    }

    let header = PackHeader {
        magic: PACK_MAGIC,
        version: PACK_VERSION,
        mesh_count: entries.len() as u32,
        _padding: 0,
    };

    writer.write_all(cast_slice(&[header]))?;
    writer.write_all(cast_slice(&entries))?;
    writer.write_all(cast_slice(&vertices))?;
    writer.write_all(cast_slice(&indices))?;
    writer.flush()?;
    Ok(())
}

pub fn save_store<P: AsRef<Path>>(store: &MeshStore, path: P) -> MeshResult<()> {
    let file = File::create(path)?;
    write_store(store, BufWriter::with_capacity(1024 * 1024, file))
}

/// A packed store read back into owned buffers.
#[derive(Clone, Debug, Default)]
pub struct PackedMeshes {
    pub entries: Vec<PackedMeshEntry>,
    pub vertices: Vec<GpuVertex>,
    pub indices: Vec<u32>,
}

fn take<'a>(bytes: &mut &'a [u8], len: usize, what: &str) -> MeshResult<&'a [u8]> {
    if bytes.len() < len {
        return Err(MeshError::InvalidPack(format!(
            "truncated {}: need {} bytes, {} left",
            what,
            len,
            bytes.len()
        )));
    }
    let (head, tail) = bytes.split_at(len);
    *bytes = tail;
    Ok(head)
}

impl PackedMeshes {
    pub fn from_bytes(mut bytes: &[u8]) -> MeshResult<Self> {
        let header: PackHeader =
            bytemuck::pod_read_unaligned(take(&mut bytes, size_of::<PackHeader>(), "header")?);
        if header.magic != PACK_MAGIC {
            return Err(MeshError::InvalidPack("bad magic".to_string()));
        }
        if header.version != PACK_VERSION {
            return Err(MeshError::InvalidPack(format!(
                "unsupported version {}",
                header.version
            )));
        }

        let entry_bytes = header.mesh_count as usize * size_of::<PackedMeshEntry>();
        let entries: Vec<PackedMeshEntry> =
            bytemuck::pod_collect_to_vec(take(&mut bytes, entry_bytes, "entries")?);

        let vertex_count: usize = entries.iter().map(|e| e.vertex_count as usize).sum();
        let index_count: usize = entries.iter().map(|e| e.index_count as usize).sum();

        let vertices: Vec<GpuVertex> = bytemuck::pod_collect_to_vec(take(
            &mut bytes,
            vertex_count * size_of::<GpuVertex>(),
            "vertices",
        )?);
        let indices: Vec<u32> =
            bytemuck::pod_collect_to_vec(take(&mut bytes, index_count * 4, "indices")?);

        let packed = Self { entries, vertices, indices };
        for (i, entry) in packed.entries.iter().enumerate() {
            let (Some(_), Some(mesh_indices)) =
                (packed.mesh_vertices(entry), packed.mesh_indices(entry))
            else {
                return Err(MeshError::InvalidPack(format!(
                    "entry {} references data outside the pack",
                    i
                )));
            };
            if let Some(&bad) = mesh_indices.iter().find(|&&ix| ix >= entry.vertex_count) {
                return Err(MeshError::InvalidPack(format!(
                    "entry {} has index {} for {} vertices",
                    i, bad, entry.vertex_count
                )));
            }
        }
        Ok(packed)
    }

    /// Memory-maps a file written by [`save_store`].
    pub fn open<P: AsRef<Path>>(path: P) -> MeshResult<Self> {
        let file = File::open(path.as_ref())?;
        // SAFETY: the mapping is only read while `mmap` is alive and is copied out.
        let mmap = unsafe { Mmap::map(&file)? };
        Self::from_bytes(&mmap)
    }

    /// `None` if `entry` does not describe a range of this pack.
    pub fn mesh_vertices(&self, entry: &PackedMeshEntry) -> Option<&[GpuVertex]> {
        let end = entry.vertex_offset.checked_add(entry.vertex_count)?;
        self.vertices.get(entry.vertex_offset as usize..end as usize)
    }

    pub fn mesh_indices(&self, entry: &PackedMeshEntry) -> Option<&[u32]> {
        let end = entry.index_offset.checked_add(entry.index_count)?;
        self.indices.get(entry.index_offset as usize..end as usize)
    }
}
