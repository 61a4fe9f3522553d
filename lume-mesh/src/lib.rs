//! Turns raw polygon geometry into deduplicated, renderer-ready meshes.
//!
//! The import path for one file is
//! source → [`dedup`] → [`synth`] → [`normalize`] → [`material`] → [`MeshStore`].

pub mod dedup;
pub mod error;
pub mod import;
pub mod material;
pub mod normalize;
pub mod obj;
pub mod pack;
pub mod raw;
pub mod store;
pub mod synth;
mod types;

pub use error::{MeshError, MeshResult};
pub use import::{ImportOptions, ProcessedMesh, process_geometry};
pub use material::{MaterialHandle, MaterialLibrary, MaterialLoader};
pub use obj::ObjSource;
pub use raw::{GeometrySource, MaterialRecord, RawFaceIndex, RawGeometry, RawShape};
pub use store::{Mesh, MeshKey, MeshStore};
pub use types::{GpuVertex, Vertex};
