//! Rolling terrain from fractal simplex noise.
//!
//! Heights come from multi-octave fBm; columns are stone under a few layers
//! of dirt or sand, capped with grass, and flooded up to the water level.
//! Decorations and trees are chosen per column from a hash, so a chunk
//! regenerates identically every time.

use noise::{NoiseFn, Simplex};

use isovox_world::{ColumnSample, TerrainGenerator};

use crate::palette::{TREE, TerrainPalette};

#[derive(Clone, Debug)]
pub struct HeightmapParams {
    pub seed: u32,
    pub octaves: u32,
    /// Frequency multiplier between successive octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between successive octaves.
    pub persistence: f64,
    pub base_frequency: f64,
    /// Amplitude of the first octave, in voxels.
    pub amplitude: f64,
    /// Height of the surface where the noise is zero.
    pub base_height: i32,
    /// Columns whose surface is below this are topped up with water.
    pub water_level: i32,
    /// Dirt (or sand) layers between stone and the surface.
    pub soil_depth: i32,
    /// Fraction of grassy columns that grow a tree.
    pub tree_chance: f64,
}

impl Default for HeightmapParams {
    fn default() -> Self {
        Self {
            seed: 0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
            base_frequency: 0.02,
            amplitude: 6.0,
            base_height: 8,
            water_level: 6,
            soil_depth: 3,
            tree_chance: 0.004,
        }
    }
}

/// Deterministic hash of a column to `[0, 1)`.
fn column_hash(x: i32, y: i32, salt: u32) -> f64 {
    let h = (x as u32).wrapping_mul(0x85eb_ca6b) ^ (y as u32).wrapping_mul(0xc2b2_ae35) ^ salt;
    let h = (h ^ (h >> 13)).wrapping_mul(0x27d4_eb2d);
    f64::from(h ^ (h >> 15)) / 4_294_967_296.0
}

pub struct HeightmapTerrain {
    noise: Simplex,
    params: HeightmapParams,
    palette: TerrainPalette,
}

impl HeightmapTerrain {
    pub fn new(params: HeightmapParams, palette: TerrainPalette) -> Self {
        Self {
            noise: Simplex::new(params.seed),
            params,
            palette,
        }
    }

    pub fn params(&self) -> &HeightmapParams {
        &self.params
    }

    /// fBm sample at a world column, roughly in `[-2 * amplitude, 2 * amplitude]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude;
        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            frequency *= self.params.lacunarity;
            amplitude *= self.params.persistence;
        }
        total
    }

    /// Z of the topmost ground voxel of a column. Never below zero.
    pub fn surface_height(&self, x: i32, y: i32) -> i32 {
        let h = self.params.base_height + self.sample(f64::from(x), f64::from(y)).round() as i32;
        h.max(0)
    }
}

impl TerrainGenerator for HeightmapTerrain {
    fn generate(&self, x: i32, y: i32) -> ColumnSample {
        let p = &self.params;
        let palette = &self.palette;
        let top = self.surface_height(x, y);
        let shore = top <= p.water_level;

        let mut sample = ColumnSample::default();
        for z in 0..=top {
            let voxel = if z <= top - p.soil_depth {
                palette.stone
            } else if shore {
                palette.sand
            } else if z == top {
                palette.grass_dirt
            } else {
                palette.dirt
            };
            sample.column.push((z, voxel));
        }

        if top < p.water_level {
            for z in top + 1..=p.water_level {
                sample.column.push((z, palette.water));
            }
            return sample;
        }
        if shore {
            return sample;
        }

        let salt = p.seed.rotate_left(7);
        if column_hash(x, y, salt ^ 0x9e37_79b9) < p.tree_chance {
            sample.structures.push((top + 1, TREE));
            return sample;
        }
        let roll = column_hash(x, y, salt);
        let decoration = if roll < 0.2 {
            Some(palette.grass)
        } else if roll < 0.23 {
            let pick = (column_hash(y, x, salt) * palette.flowers.len() as f64) as usize;
            palette.flowers.get(pick).copied()
        } else if roll < 0.24 {
            Some(palette.plant)
        } else {
            None
        };
        if let Some(voxel) = decoration {
            sample.column.push((top + 1, voxel));
        }
        sample
    }
}
