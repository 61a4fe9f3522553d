use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use crate::import::{ImportOptions, process_geometry};
use crate::material::{MaterialHandle, MaterialLibrary, MaterialLoader};
use crate::obj::ObjSource;
use crate::raw::GeometrySource;
use crate::{GpuVertex, MeshError, MeshResult, Vertex};

/// Handle of a mesh inside one [`MeshStore`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MeshKey(pub u32);

impl MeshKey {
    pub const FIRST: MeshKey = MeshKey(0);
    /// Returned by [`MeshStore::load`] when the import failed.
    pub const INVALID: MeshKey = MeshKey(u32::MAX);

    pub fn is_valid(self) -> bool {
        self != Self::INVALID
    }
}

impl fmt::Display for MeshKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_valid() {
            write!(f, "#{}", self.0)
        } else {
            f.write_str("#invalid")
        }
    }
}

#[derive(Clone, Debug)]
pub struct Mesh {
    name: String,
    vertices: Vec<Vertex>,
    indices: Vec<u32>,
    material: MaterialHandle,
}

impl Mesh {
    /// Fails unless `indices` is whole triangles that all reference `vertices`.
    pub fn new(
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material: MaterialHandle,
    ) -> MeshResult<Self> {
        if indices.len() % 3 != 0 {
            return Err(MeshError::InvalidIndices(format!(
                "{} indices is not a whole number of triangles",
                indices.len()
            )));
        }
        if let Some(&bad) = indices.iter().find(|&&i| i as usize >= vertices.len()) {
            return Err(MeshError::InvalidIndices(format!(
                "index {} out of bounds for {} vertices",
                bad,
                vertices.len()
            )));
        }
        Ok(Self {
            name: name.into(),
            vertices,
            indices,
            material,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn material(&self) -> MaterialHandle {
        self.material
    }

    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    pub fn gpu_vertices(&self) -> Vec<GpuVertex> {
        self.vertices.iter().map(GpuVertex::from).collect()
    }
}

/// Owns every processed mesh and hands out monotonically increasing keys.
///
/// Not synchronized; callers sharing a store across threads must serialize
/// access themselves.
#[derive(Debug)]
pub struct MeshStore {
    meshes: BTreeMap<MeshKey, Mesh>,
    next_key: MeshKey,
    default_material: MaterialHandle,
    materials: MaterialLibrary,
}

impl Default for MeshStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MeshStore {
    pub fn new() -> Self {
        Self::with_default_material(MaterialHandle::DEFAULT)
    }

    pub fn with_default_material(default_material: MaterialHandle) -> Self {
        Self {
            meshes: BTreeMap::new(),
            next_key: MeshKey::FIRST,
            default_material,
            materials: MaterialLibrary::new(),
        }
    }

    pub fn default_material(&self) -> MaterialHandle {
        self.default_material
    }

    /// Materials resolved by [`MeshStore::load`] and [`MeshStore::try_load`].
    pub fn materials(&self) -> &MaterialLibrary {
        &self.materials
    }

    pub fn add_mesh(
        &mut self,
        name: impl Into<String>,
        vertices: Vec<Vertex>,
        indices: Vec<u32>,
        material: Option<MaterialHandle>,
    ) -> MeshResult<(MeshKey, &Mesh)> {
        let mesh = Mesh::new(
            name,
            vertices,
            indices,
            material.unwrap_or(self.default_material),
        )?;
        if self.keys_left() == 0 {
            return Err(MeshError::KeysExhausted);
        }
        let key = self.next_key;
        self.next_key = MeshKey(key.0 + 1);
        let mesh: &Mesh = self.meshes.entry(key).or_insert(mesh);
        Ok((key, mesh))
    }

    /// Keys that can still be issued before [`MeshStore::clear`].
    fn keys_left(&self) -> u32 {
        MeshKey::INVALID.0 - self.next_key.0
    }

    pub fn get_mesh(&self, key: MeshKey) -> MeshResult<&Mesh> {
        self.meshes.get(&key).ok_or(MeshError::NotFound(key))
    }

    pub fn contains(&self, key: MeshKey) -> bool {
        self.meshes.contains_key(&key)
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (MeshKey, &Mesh)> {
        self.meshes.iter().map(|(&k, m)| (k, m))
    }

    pub fn len(&self) -> usize {
        self.meshes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.meshes.is_empty()
    }

    /// Drops every mesh and restarts key numbering.
    pub fn clear(&mut self) {
        self.meshes.clear();
        self.next_key = MeshKey::FIRST;
    }

    /// Imports `path` and returns the key of its first mesh, or
    /// [`MeshKey::INVALID`] if the file could not be imported.
    pub fn load(&mut self, path: impl AsRef<Path>, flip_winding: bool) -> MeshKey {
        let path = path.as_ref();
        match self.try_load(path, &ImportOptions::flipped(flip_winding)) {
            Ok(keys) => keys.first().copied().unwrap_or_else(|| {
                log::warn!("{:?} contains no faces", path);
                MeshKey::INVALID
            }),
            Err(e) => {
                log::error!("Failed to load {:?}: {}", path, e);
                MeshKey::INVALID
            }
        }
    }

    /// Imports every shape of an OBJ file, one mesh per shape.
    pub fn try_load(
        &mut self,
        path: impl AsRef<Path>,
        options: &ImportOptions,
    ) -> MeshResult<Vec<MeshKey>> {
        let raw = ObjSource.read(path.as_ref())?;
        let processed =
            process_geometry(&raw, &mut self.materials, self.default_material, options)?;
        self.insert_processed(processed)
    }

    /// Like [`MeshStore::try_load`] with a caller-supplied source and
    /// material loader. The store is untouched if any shape fails.
    pub fn import_with<S, L>(
        &mut self,
        source: &S,
        loader: &mut L,
        path: impl AsRef<Path>,
        options: &ImportOptions,
    ) -> MeshResult<Vec<MeshKey>>
    where
        S: GeometrySource + ?Sized,
        L: MaterialLoader + ?Sized,
    {
        let raw = source.read(path.as_ref())?;
        let processed = process_geometry(&raw, loader, self.default_material, options)?;
        self.insert_processed(processed)
    }

    fn insert_processed(
        &mut self,
        processed: Vec<crate::import::ProcessedMesh>,
    ) -> MeshResult<Vec<MeshKey>> {
        if processed.len() > self.keys_left() as usize {
            return Err(MeshError::KeysExhausted);
        }
        let mut keys = Vec::with_capacity(processed.len());
        for p in processed {
            let (key, mesh) = self.add_mesh(p.name, p.vertices, p.indices, Some(p.material))?;
            log::info!(
                "Imported '{}' as {}: {} vertices, {} triangles, {} duplicate corners",
                mesh.name(),
                key,
                mesh.vertices().len(),
                mesh.triangle_count(),
                p.duplicates
            );
            keys.push(key);
        }
        Ok(keys)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::RawGeometry;
    use glam::Vec3;

    const CUBE: &str = "\
o cube
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
v -1 -1 1
v 1 -1 1
v 1 1 1
v -1 1 1
f 1 4 3
f 1 3 2
f 5 6 7
f 5 7 8
f 1 2 6
f 1 6 5
f 4 8 7
f 4 7 3
f 1 5 8
f 1 8 4
f 2 3 7
f 2 7 6
";

    struct TextSource(&'static str);

    impl GeometrySource for TextSource {
        fn read(&self, _path: &Path) -> MeshResult<RawGeometry> {
            ObjSource.parse(&mut self.0.as_bytes())
        }
    }

    fn triangle() -> Vec<Vertex> {
        [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]
            .into_iter()
            .map(|p| Vertex::new(Vec3::from(p)))
            .collect()
    }

    fn import(store: &mut MeshStore, text: &'static str, options: ImportOptions) -> Vec<MeshKey> {
        let mut library = MaterialLibrary::new();
        store.import_with(&TextSource(text), &mut library, "mem.obj", &options).unwrap()
    }

    #[test]
    fn keys_increase_and_reset_on_clear() {
        let mut store = MeshStore::new();
        let (a, _) = store.add_mesh("a", triangle(), vec![0, 1, 2], None).unwrap();
        let (b, mesh) = store.add_mesh("b", triangle(), vec![0, 2, 1], None).unwrap();
        assert_eq!(mesh.name(), "b");
        assert_eq!((a, b), (MeshKey(0), MeshKey(1)));
        assert_eq!(store.len(), 2);

        store.clear();
        assert!(store.is_empty());
        assert!(matches!(store.get_mesh(a), Err(MeshError::NotFound(_))));
        let (c, _) = store.add_mesh("c", triangle(), vec![0, 1, 2], None).unwrap();
        assert_eq!(c, MeshKey::FIRST);
    }

    #[test]
    fn last_key_is_never_issued() {
        let mut store = MeshStore::new();
        store.next_key = MeshKey(u32::MAX - 1);
        let (key, _) = store.add_mesh("a", triangle(), vec![0, 1, 2], None).unwrap();
        assert_eq!(key, MeshKey(u32::MAX - 1));

        let err = store.add_mesh("b", triangle(), vec![0, 1, 2], None);
        assert!(matches!(err, Err(MeshError::KeysExhausted)));
        assert_eq!(store.len(), 1);
        assert!(!store.contains(MeshKey::INVALID));

        store.clear();
        let (key, _) = store.add_mesh("c", triangle(), vec![0, 1, 2], None).unwrap();
        assert_eq!(key, MeshKey::FIRST);
    }

    #[test]
    fn import_without_enough_keys_inserts_nothing() {
        let two_shapes = "\
v 0 0 0
v 1 0 0
v 0 1 0
o a
f 1 2 3
o b
f 1 3 2
";
        let mut store = MeshStore::new();
        store.next_key = MeshKey(u32::MAX - 1);
        let mut library = MaterialLibrary::new();
        let source = TextSource(two_shapes);
        let result = store.import_with(&source, &mut library, "mem.obj", &ImportOptions::default());
        assert!(matches!(result, Err(MeshError::KeysExhausted)));
        assert!(store.is_empty());
    }

    #[test]
    fn default_material_fills_in() {
        let mut store = MeshStore::with_default_material(MaterialHandle(7));
        let (_, mesh) = store.add_mesh("a", triangle(), vec![0, 1, 2], None).unwrap();
        assert_eq!(mesh.material(), MaterialHandle(7));
        let (_, mesh) = store
            .add_mesh("b", triangle(), vec![0, 1, 2], Some(MaterialHandle(3)))
            .unwrap();
        assert_eq!(mesh.material(), MaterialHandle(3));
    }

    #[test]
    fn invalid_indices_are_rejected() {
        let mut store = MeshStore::new();
        assert!(store.add_mesh("a", triangle(), vec![0, 1], None).is_err());
        assert!(store.add_mesh("b", triangle(), vec![0, 1, 3], None).is_err());
        assert!(store.is_empty());
    }

    #[test]
    fn unknown_key_is_not_found() {
        let store = MeshStore::new();
        assert!(matches!(
            store.get_mesh(MeshKey(12)),
            Err(MeshError::NotFound(MeshKey(12)))
        ));
        assert!(store.get_mesh(MeshKey::INVALID).is_err());
    }

    #[test]
    fn iteration_follows_insertion_order() {
        let mut store = MeshStore::new();
        for name in ["x", "y", "z"] {
            store.add_mesh(name, triangle(), vec![0, 1, 2], None).unwrap();
        }
        let names: Vec<_> = store.iter().map(|(_, m)| m.name().to_string()).collect();
        assert_eq!(names, ["x", "y", "z"]);
    }

    #[test]
    fn cube_shares_corners_and_faces_outward() {
        let mut store = MeshStore::new();
        let keys = import(&mut store, CUBE, ImportOptions::default());
        assert_eq!(keys, vec![MeshKey(0)]);

        let mesh = store.get_mesh(keys[0]).unwrap();
        assert_eq!(mesh.vertices().len(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        for v in mesh.vertices() {
            assert!((v.position.length() - 1.0).abs() < 1e-5);
            assert!((v.normal.length() - 1.0).abs() < 1e-5);
            // corner normals point away from the center
            assert!(v.normal.dot(v.position) > 0.0);
        }
    }

    #[test]
    fn flip_winding_only_reorders_triangles() {
        let mut store = MeshStore::new();
        let keys = import(&mut store, CUBE, ImportOptions::default());
        let flipped = import(&mut store, CUBE, ImportOptions::flipped(true));
        assert_eq!(flipped, vec![MeshKey(1)]);

        let a = store.get_mesh(keys[0]).unwrap();
        let b = store.get_mesh(flipped[0]).unwrap();
        for (ta, tb) in a.indices().chunks(3).zip(b.indices().chunks(3)) {
            assert_eq!([ta[0], ta[2], ta[1]], [tb[0], tb[1], tb[2]]);
        }
        for (va, vb) in a.vertices().iter().zip(b.vertices()) {
            assert_eq!(va.position, vb.position);
            assert!((va.normal + vb.normal).length() < 1e-5);
        }
    }

    #[test]
    fn per_face_normals_split_cube_corners() {
        let text = "\
v -1 -1 -1
v 1 -1 -1
v 1 1 -1
v -1 1 -1
vn 0 0 -1
vn 0 0 1
f 1//1 4//1 3//1
f 1//1 3//1 2//1
f 1//2 3//2 4//2
";
        let mut store = MeshStore::new();
        let options = ImportOptions { normalize: false, ..Default::default() };
        let keys = import(&mut store, text, options);
        let mesh = store.get_mesh(keys[0]).unwrap();
        assert_eq!(mesh.vertices().len(), 7);
        assert_eq!(mesh.vertices()[0].position, Vec3::new(-1.0, -1.0, -1.0));
    }

    #[test]
    fn failed_load_is_invalid_and_leaves_store_alone() {
        let mut store = MeshStore::new();
        store.add_mesh("keep", triangle(), vec![0, 1, 2], None).unwrap();
        let key = store.load("/nonexistent/lume/missing.obj", false);
        assert_eq!(key, MeshKey::INVALID);
        assert!(!key.is_valid());
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn out_of_range_shape_aborts_whole_import() {
        let mut store = MeshStore::new();
        let mut library = MaterialLibrary::new();

        struct Broken;
        impl GeometrySource for Broken {
            fn read(&self, _path: &Path) -> MeshResult<RawGeometry> {
                let mut raw = ObjSource.parse(&mut CUBE.as_bytes())?;
                let mut bad = raw.shapes[0].clone();
                bad.indices[0].position = 99;
                raw.shapes.push(bad);
                Ok(raw)
            }
        }

        let result = store.import_with(&Broken, &mut library, "x.obj", &ImportOptions::default());
        assert!(matches!(result, Err(MeshError::IndexOutOfRange { .. })));
        assert!(store.is_empty());
    }

    #[test]
    fn clear_then_import_restarts_keys() {
        let mut store = MeshStore::new();
        import(&mut store, CUBE, ImportOptions::default());
        import(&mut store, CUBE, ImportOptions::default());
        store.clear();
        assert_eq!(import(&mut store, CUBE, ImportOptions::default()), vec![MeshKey::FIRST]);
    }
}
