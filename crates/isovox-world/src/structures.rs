//! Prefabricated voxel structures stamped into the world during generation.
//!
//! Templates use the chunk record layout with template-relative positions.
//! Template `(16, 16, 0)` lands on the anchor column.

use std::fs;
use std::path::Path;

use rustc_hash::FxHashMap;

use isovox_voxel::chunk_serial::{self, ChunkSerError};
use isovox_voxel::{VoxelPos, VoxelStore, VoxelTypeId, VoxelTypeRegistry};

use crate::error::WorldError;

/// Origin offset applied when stamping a template.
pub const STRUCTURE_OFFSET: (i32, i32, i32) = (-16, -16, 0);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StructureId(pub u16);

/// Structure templates by id.
#[derive(Clone, Debug, Default)]
pub struct StructureLibrary {
    templates: FxHashMap<StructureId, Vec<(VoxelPos, VoxelTypeId)>>,
}

impl StructureLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: StructureId, template: Vec<(VoxelPos, VoxelTypeId)>) {
        self.templates.insert(id, template);
    }

    /// Decodes and stores a template record.
    pub fn insert_record(
        &mut self,
        id: StructureId,
        record: &[u8],
        registry: &VoxelTypeRegistry,
    ) -> Result<(), ChunkSerError> {
        let template = chunk_serial::decode(record, registry.len())?;
        self.insert(id, template);
        Ok(())
    }

    /// Loads every `"{id}.bin"` file in `dir`. Files with other names or
    /// malformed contents are skipped with a warning.
    pub fn load_dir(dir: &Path, registry: &VoxelTypeRegistry) -> Result<Self, WorldError> {
        let mut library = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            let Some(id) = path
                .file_stem()
                .and_then(|s| s.to_str())
                .filter(|_| path.extension().is_some_and(|e| e == "bin"))
                .and_then(|s| s.parse::<u16>().ok())
            else {
                continue;
            };
            let record = fs::read(&path)?;
            if let Err(e) = library.insert_record(StructureId(id), &record, registry) {
                tracing::warn!("Skipping structure {}: {e}", path.display());
            }
        }
        tracing::info!("Loaded {} structures from {}", library.len(), dir.display());
        Ok(library)
    }

    /// Adds every template of `other`, replacing templates with the same id.
    pub fn merge(&mut self, other: StructureLibrary) {
        self.templates.extend(other.templates);
    }

    pub fn get(&self, id: StructureId) -> Option<&[(VoxelPos, VoxelTypeId)]> {
        self.templates.get(&id).map(Vec::as_slice)
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }

    /// Stamps structure `id` anchored at `(x, y, z)`, returning the number of
    /// voxels written. Unknown ids write nothing.
    pub fn place(
        &self,
        id: StructureId,
        x: i32,
        y: i32,
        z: i32,
        store: &mut VoxelStore,
        registry: &VoxelTypeRegistry,
    ) -> usize {
        let Some(template) = self.get(id) else {
            tracing::warn!("Unknown structure {id:?} at ({x}, {y}, {z})");
            return 0;
        };
        let (ox, oy, oz) = STRUCTURE_OFFSET;
        for (offset, voxel) in template {
            let pos = VoxelPos::new(x + offset.x + ox, y + offset.y + oy, z + offset.z + oz);
            store.set(pos, *voxel, registry);
        }
        template.len()
    }
}
