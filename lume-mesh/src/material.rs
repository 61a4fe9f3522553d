use std::collections::HashMap;
use std::fmt;

use crate::raw::{MaterialRecord, RawShape};

/// Opaque handle to a material owned by a [`MaterialLoader`].
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MaterialHandle(pub u32);

impl MaterialHandle {
    pub const DEFAULT: MaterialHandle = MaterialHandle(0);
}

impl Default for MaterialHandle {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl fmt::Display for MaterialHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "material#{}", self.0)
    }
}

/// Turns a source material record into a handle the renderer understands.
pub trait MaterialLoader {
    /// `None` when the record cannot be resolved; the caller falls back to
    /// its default material.
    fn load(&mut self, record: &MaterialRecord) -> Option<MaterialHandle>;
}

/// In-memory material registry. Slot 0 is always the default material.
#[derive(Debug)]
pub struct MaterialLibrary {
    records: Vec<MaterialRecord>,
    by_name: HashMap<String, MaterialHandle>,
}

impl MaterialLibrary {
    pub fn new() -> Self {
        let default = MaterialRecord {
            name: "default".to_string(),
            diffuse: Some([0.8, 0.8, 0.8]),
            ..Default::default()
        };
        Self {
            records: vec![default],
            by_name: HashMap::new(),
        }
    }

    pub fn get(&self, handle: MaterialHandle) -> Option<&MaterialRecord> {
        self.records.get(handle.0 as usize)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl Default for MaterialLibrary {
    fn default() -> Self {
        Self::new()
    }
}

impl MaterialLoader for MaterialLibrary {
    fn load(&mut self, record: &MaterialRecord) -> Option<MaterialHandle> {
        if record.name.is_empty() {
            return None;
        }
        if let Some(&handle) = self.by_name.get(&record.name) {
            return Some(handle);
        }
        let handle = MaterialHandle(self.records.len() as u32);
        self.records.push(record.clone());
        self.by_name.insert(record.name.clone(), handle);
        Some(handle)
    }
}

/// Resolves the material of a shape from its first face.
///
/// Mixed-material shapes are not split: the first face decides for the whole
/// mesh. `cache` maps source material indices to handles already resolved
/// during the current import.
pub fn bind_material<L: MaterialLoader + ?Sized>(
    shape: &RawShape,
    materials: &[MaterialRecord],
    loader: &mut L,
    default: MaterialHandle,
    cache: &mut HashMap<usize, MaterialHandle>,
) -> MaterialHandle {
    if shape.has_mixed_materials() {
        log::warn!(
            "Shape '{}' mixes materials, binding its first face's material to the whole mesh",
            shape.name
        );
    }

    let Some(id) = shape.material_ids.first().copied().flatten() else {
        return default;
    };

    if let Some(&handle) = cache.get(&id) {
        return handle;
    }

    let Some(record) = materials.get(id) else {
        log::warn!(
            "Shape '{}' references material {} but only {} are defined, using default",
            shape.name,
            id,
            materials.len()
        );
        return default;
    };

    let handle = loader.load(record).unwrap_or_else(|| {
        log::warn!("Material '{}' could not be resolved, using default", record.name);
        default
    });
    cache.insert(id, handle);
    handle
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str) -> MaterialRecord {
        MaterialRecord { name: name.to_string(), ..Default::default() }
    }

    fn shape(material_ids: Vec<Option<usize>>) -> RawShape {
        RawShape { name: "s".into(), indices: Vec::new(), material_ids }
    }

    #[test]
    fn library_dedups_by_name() {
        let mut library = MaterialLibrary::new();
        let a = library.load(&record("brick")).unwrap();
        let b = library.load(&record("stone")).unwrap();
        let c = library.load(&record("brick")).unwrap();
        assert_eq!(a, MaterialHandle(1));
        assert_eq!(b, MaterialHandle(2));
        assert_eq!(a, c);
        assert_eq!(library.get(b).unwrap().name, "stone");
        assert_eq!(library.get(MaterialHandle::DEFAULT).unwrap().name, "default");
    }

    #[test]
    fn first_face_governs() {
        let materials = vec![record("a"), record("b")];
        let mut library = MaterialLibrary::new();
        let mut cache = HashMap::new();
        let handle = bind_material(
            &shape(vec![Some(1), Some(0), Some(0)]),
            &materials,
            &mut library,
            MaterialHandle::DEFAULT,
            &mut cache,
        );
        assert_eq!(library.get(handle).unwrap().name, "b");
    }

    #[test]
    fn missing_or_invalid_falls_back_to_default() {
        let materials = vec![record("a")];
        let mut library = MaterialLibrary::new();
        let mut cache = HashMap::new();
        let fallback = MaterialHandle(42);
        for ids in [vec![], vec![None, Some(0)], vec![Some(5)]] {
            let handle =
                bind_material(&shape(ids), &materials, &mut library, fallback, &mut cache);
            assert_eq!(handle, fallback);
        }
        let unnamed = vec![MaterialRecord::default()];
        let unnamed_shape = shape(vec![Some(0)]);
        let handle =
            bind_material(&unnamed_shape, &unnamed, &mut library, fallback, &mut cache);
        assert_eq!(handle, fallback);
    }

    #[test]
    fn cache_short_circuits_loader() {
        struct Counting(u32);
        impl MaterialLoader for Counting {
            fn load(&mut self, _record: &MaterialRecord) -> Option<MaterialHandle> {
                self.0 += 1;
                Some(MaterialHandle(self.0))
            }
        }

        let materials = vec![record("a")];
        let mut loader = Counting(0);
        let mut cache = HashMap::new();
        let default = MaterialHandle::DEFAULT;
        let uniform = shape(vec![Some(0)]);
        let first = bind_material(&uniform, &materials, &mut loader, default, &mut cache);
        let second = bind_material(&uniform, &materials, &mut loader, default, &mut cache);
        assert_eq!(first, second);
        assert_eq!(loader.0, 1);
    }

    #[test]
    fn mixed_shape_on_cache_hit_binds_first_face() {
        let materials = vec![record("a"), record("b")];
        let mut library = MaterialLibrary::new();
        let mut cache = HashMap::new();
        let default = MaterialHandle::DEFAULT;
        let uniform = shape(vec![Some(1)]);
        let uniform = bind_material(&uniform, &materials, &mut library, default, &mut cache);

        let mixed = shape(vec![Some(1), Some(0), None]);
        assert!(mixed.has_mixed_materials());
        let handle = bind_material(&mixed, &materials, &mut library, default, &mut cache);
        assert_eq!(handle, uniform);
        assert_eq!(library.get(handle).unwrap().name, "b");
        assert_eq!(library.len(), 2);
    }
}
