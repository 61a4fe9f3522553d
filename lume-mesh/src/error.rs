use crate::store::MeshKey;

#[derive(Debug, thiserror::Error)]
pub enum MeshError {
    /// The OBJ reader could not produce geometry (missing or malformed file).
    #[error("Source Load Failed: {0}")]
    Source(#[from] tobj::LoadError),
    #[error("Source Parse Failed: {0}")]
    SourceParse(String),
    #[error("{attribute} index {index} out of range (len {len})")]
    IndexOutOfRange {
        attribute: &'static str,
        index: u32,
        len: usize,
    },
    #[error("Invalid Indices: {0}")]
    InvalidIndices(String),
    /// Lookup of a key this store never issued.
    #[error("Mesh {0} not found")]
    NotFound(MeshKey),
    #[error("Mesh keys exhausted")]
    KeysExhausted,
    #[error("Invalid Pack: {0}")]
    InvalidPack(String),
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type MeshResult<T> = Result<T, MeshError>;
