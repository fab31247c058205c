//! Voxel type registry: maps compact [`VoxelTypeId`] values to [`VoxelType`] data.
//!
//! There is no air entry; absence of a voxel in the store is air. Animated
//! types occupy one consecutive id per texture frame so the animation tick can
//! swap ids without touching light sources.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::coords::{Axis, Face};

/// Solidness value of a fully opaque voxel.
pub const MAX_SOLIDNESS: u8 = 10;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Compact identifier stored for every voxel (2 bytes).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoxelTypeId(pub u16);

/// A tile in the texture atlas, addressed by column and row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileRef {
    pub col: u16,
    pub row: u16,
}

impl TileRef {
    pub const fn new(col: u16, row: u16) -> Self {
        Self { col, row }
    }
}

/// Texture assignment for one frame of a voxel type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum FaceTextures {
    /// One upright sprite covering the whole tile (plants, lamps, water).
    Single(TileRef),
    /// A cube with one tile per visible face.
    Cube { x: TileRef, y: TileRef, z: TileRef },
}

impl FaceTextures {
    /// Tile used for the face perpendicular to `axis`.
    pub fn tile(&self, axis: Axis) -> TileRef {
        match *self {
            FaceTextures::Single(tile) => tile,
            FaceTextures::Cube { x, y, z } => match axis {
                Axis::X => x,
                Axis::Y => y,
                Axis::Z => z,
            },
        }
    }

    pub fn is_cube(&self) -> bool {
        matches!(self, FaceTextures::Cube { .. })
    }
}

/// Light emitted by a voxel type.
///
/// `value` travels from the voxel along `face`; `self_luminosity` lights the
/// faces of the six touching voxels directly.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Luminosity {
    pub value: f32,
    pub face: Face,
    pub self_luminosity: f32,
}

impl Luminosity {
    /// A descriptor that emits nothing.
    pub const NONE: Luminosity = Luminosity {
        value: 0.0,
        face: Face::NegZ,
        self_luminosity: 0.0,
    };

    /// `true` if the descriptor contributes no light at all.
    pub fn is_inert(&self) -> bool {
        self.value == 0.0 && self.self_luminosity == 0.0
    }
}

impl Default for Luminosity {
    fn default() -> Self {
        Self::NONE
    }
}

/// Declarative definition of a voxel type, as registered or loaded from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VoxelTypeDef {
    /// Human-readable name (e.g. "stone", "lamp").
    pub name: String,
    /// 0 (fully transparent) to 10 (fully opaque).
    #[serde(default = "default_solidness")]
    pub solidness: u8,
    /// One entry per animation frame; a static type has exactly one.
    pub textures: Vec<FaceTextures>,
    /// Animation ticks per frame; 0 disables animation.
    #[serde(default)]
    pub ticks_per_frame: u32,
    #[serde(default)]
    pub luminosity: Luminosity,
}

fn default_solidness() -> u8 {
    MAX_SOLIDNESS
}

/// Animation bookkeeping shared by every frame id of an animated type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FrameInfo {
    /// Id of frame 0.
    pub first: VoxelTypeId,
    /// Number of frames (consecutive ids starting at `first`).
    pub count: u16,
    pub ticks_per_frame: u32,
}

impl FrameInfo {
    /// The id showing the frame after `id`, wrapping around.
    pub fn next(&self, id: VoxelTypeId) -> VoxelTypeId {
        let frame = id.0.saturating_sub(self.first.0);
        VoxelTypeId(self.first.0 + (frame + 1) % self.count)
    }
}

/// Resolved data for a single [`VoxelTypeId`].
#[derive(Clone, Debug)]
pub struct VoxelType {
    pub name: String,
    pub solidness: u8,
    pub texture: FaceTextures,
    pub luminosity: Luminosity,
    /// Present only for types with `ticks_per_frame > 0` and several frames.
    pub animation: Option<FrameInfo>,
}

impl VoxelType {
    /// Fully opaque voxels block light completely and take part in occlusion.
    pub fn is_fully_solid(&self) -> bool {
        self.solidness >= MAX_SOLIDNESS
    }

    /// Fraction of light that passes through this voxel.
    pub fn transparency(&self) -> f32 {
        1.0 - f32::from(self.solidness) / f32::from(MAX_SOLIDNESS)
    }
}

/// Errors that can occur while building a registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// A type with the same name has already been registered.
    #[error("duplicate voxel type name: {0}")]
    DuplicateName(String),
    /// All 65 536 id slots have been consumed.
    #[error("voxel type registry is full (max 65536 ids)")]
    RegistryFull,
    #[error("voxel type {name} has solidness {solidness}, maximum is 10")]
    InvalidSolidness { name: String, solidness: u8 },
    #[error("voxel type {0} declares no textures")]
    NoTextures(String),
    #[error("voxel type {name} has non-finite or negative luminosity")]
    InvalidLuminosity { name: String },
    /// A RON registry file could not be parsed.
    #[error("failed to parse registry: {0}")]
    Parse(#[from] ron::error::SpannedError),
}

// ---------------------------------------------------------------------------
// Registry
// ---------------------------------------------------------------------------

/// Maps [`VoxelTypeId`] → [`VoxelType`] with O(1) lookup by index and by name.
#[derive(Clone, Debug, Default)]
pub struct VoxelTypeRegistry {
    /// Dense array where `index == VoxelTypeId.0`.
    types: Vec<VoxelType>,
    /// Name → id of frame 0.
    name_to_id: FxHashMap<String, VoxelTypeId>,
}

impl VoxelTypeRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a RON list of [`VoxelTypeDef`]s.
    pub fn from_ron(source: &str) -> Result<Self, RegistryError> {
        let defs: Vec<VoxelTypeDef> = ron::from_str(source)?;
        let mut registry = Self::new();
        for def in defs {
            registry.register(def)?;
        }
        Ok(registry)
    }

    /// Registers a voxel type and returns the id of its first frame.
    ///
    /// A type with `n` textures receives `n` consecutive ids.
    ///
    /// # Errors
    ///
    /// Rejects duplicate names, solidness above 10, empty texture lists,
    /// invalid luminosity, and registrations that would overflow `u16` ids.
    pub fn register(&mut self, def: VoxelTypeDef) -> Result<VoxelTypeId, RegistryError> {
        if self.name_to_id.contains_key(&def.name) {
            return Err(RegistryError::DuplicateName(def.name));
        }
        if def.solidness > MAX_SOLIDNESS {
            return Err(RegistryError::InvalidSolidness {
                name: def.name,
                solidness: def.solidness,
            });
        }
        if def.textures.is_empty() {
            return Err(RegistryError::NoTextures(def.name));
        }
        let lum = def.luminosity;
        if !lum.value.is_finite()
            || !lum.self_luminosity.is_finite()
            || lum.value < 0.0
            || lum.self_luminosity < 0.0
        {
            return Err(RegistryError::InvalidLuminosity { name: def.name });
        }
        if self.types.len() + def.textures.len() > usize::from(u16::MAX) + 1 {
            return Err(RegistryError::RegistryFull);
        }

        let first = VoxelTypeId(self.types.len() as u16);
        let count = def.textures.len() as u16;
        let animation = (def.ticks_per_frame > 0 && count > 1).then_some(FrameInfo {
            first,
            count,
            ticks_per_frame: def.ticks_per_frame,
        });

        for texture in &def.textures {
            self.types.push(VoxelType {
                name: def.name.clone(),
                solidness: def.solidness,
                texture: *texture,
                luminosity: lum,
                animation,
            });
        }
        self.name_to_id.insert(def.name, first);
        Ok(first)
    }

    /// Returns the data for `id`, or `None` if it was never registered.
    pub fn get(&self, id: VoxelTypeId) -> Option<&VoxelType> {
        self.types.get(usize::from(id.0))
    }

    /// Returns the first-frame id for a named type.
    pub fn lookup_by_name(&self, name: &str) -> Option<VoxelTypeId> {
        self.name_to_id.get(name).copied()
    }

    /// Solidness of `id`; unknown ids are treated as air (0).
    pub fn solidness(&self, id: VoxelTypeId) -> u8 {
        self.get(id).map_or(0, |t| t.solidness)
    }

    /// Transparency of `id`; unknown ids are fully transparent.
    pub fn transparency(&self, id: VoxelTypeId) -> f32 {
        self.get(id).map_or(1.0, VoxelType::transparency)
    }

    pub fn is_fully_solid(&self, id: VoxelTypeId) -> bool {
        self.get(id).is_some_and(VoxelType::is_fully_solid)
    }

    /// Luminosity descriptor of `id`; unknown ids emit nothing.
    pub fn luminosity(&self, id: VoxelTypeId) -> Luminosity {
        self.get(id).map_or(Luminosity::NONE, |t| t.luminosity)
    }

    /// Strongest emission any registered type carries.
    pub fn max_luminosity(&self) -> f32 {
        self.types
            .iter()
            .map(|t| t.luminosity.value)
            .fold(0.0, f32::max)
    }

    /// Total number of ids (frames count individually).
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
