//! The built-in voxel set and the named types terrain generation draws from.

use isovox_voxel::{VoxelPos, VoxelTypeId, VoxelTypeRegistry};
use isovox_world::{STRUCTURE_OFFSET, StructureId, StructureLibrary};

use crate::error::AppError;

/// Registry source for the built-in voxel types.
pub const DEFAULT_VOXELS: &str = include_str!("../assets/voxels.ron");

/// Structure id of the built-in tree.
pub const TREE: StructureId = StructureId(0);

const FLOWERS: [&str; 5] = ["corn_flower", "poppy", "daisy", "small_lilly", "lilly"];

/// Voxel ids used by terrain generation, resolved once from the registry.
#[derive(Clone, Debug)]
pub struct TerrainPalette {
    pub stone: VoxelTypeId,
    pub dirt: VoxelTypeId,
    pub grass_dirt: VoxelTypeId,
    pub sand: VoxelTypeId,
    pub water: VoxelTypeId,
    pub wood: VoxelTypeId,
    pub leaf: VoxelTypeId,
    pub grass: VoxelTypeId,
    pub plant: VoxelTypeId,
    pub flowers: Vec<VoxelTypeId>,
}

fn lookup(registry: &VoxelTypeRegistry, name: &'static str) -> Result<VoxelTypeId, AppError> {
    registry
        .lookup_by_name(name)
        .ok_or(AppError::MissingVoxel(name))
}

impl TerrainPalette {
    pub fn from_registry(registry: &VoxelTypeRegistry) -> Result<Self, AppError> {
        Ok(Self {
            stone: lookup(registry, "stone")?,
            dirt: lookup(registry, "dirt")?,
            grass_dirt: lookup(registry, "grass_dirt")?,
            sand: lookup(registry, "sand")?,
            water: lookup(registry, "water")?,
            wood: lookup(registry, "wood")?,
            leaf: lookup(registry, "leaf")?,
            grass: lookup(registry, "grass")?,
            plant: lookup(registry, "plant")?,
            flowers: FLOWERS
                .iter()
                .map(|name| lookup(registry, name))
                .collect::<Result<_, _>>()?,
        })
    }
}

/// Library holding the built-in tree: a four-high trunk under a leaf crown.
///
/// Templates are authored around `(16, 16, 0)`, which lands on the anchor
/// column once the placement offset is applied.
pub fn default_structures(palette: &TerrainPalette) -> StructureLibrary {
    let (ax, ay) = (-STRUCTURE_OFFSET.0, -STRUCTURE_OFFSET.1);
    let mut tree = Vec::new();
    for z in 0..4 {
        tree.push((VoxelPos::new(ax, ay, z), palette.wood));
    }
    for z in 3..5 {
        for dx in -1..=1 {
            for dy in -1..=1 {
                if z == 3 && dx == 0 && dy == 0 {
                    continue;
                }
                tree.push((VoxelPos::new(ax + dx, ay + dy, z), palette.leaf));
            }
        }
    }
    tree.push((VoxelPos::new(ax, ay, 5), palette.leaf));

    let mut library = StructureLibrary::new();
    library.insert(TREE, tree);
    library
}
