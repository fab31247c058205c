//! Sunlight seeds derived from column occupancy.

use isovox_voxel::{Face, VoxelPos, VoxelStore, VoxelTypeRegistry};

use crate::propagate::Emission;

/// Sky luminosity entering the top of every column.
const SKY_START: i32 = 10;

/// Sun strength and travel direction.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Sun {
    pub luminosity: f32,
    pub self_luminosity: f32,
    pub face: Face,
}

impl Default for Sun {
    fn default() -> Self {
        Self {
            luminosity: 4.0,
            self_luminosity: 4.0,
            face: Face::NegZ,
        }
    }
}

/// Scans column `(x, y)` from the top down, yielding `(z, factor)` for every
/// voxel the sky still reaches. Each voxel's solidness is subtracted from the
/// running sky value after it is reported.
pub fn sky_light(store: &VoxelStore, registry: &VoxelTypeRegistry, x: i32, y: i32) -> Vec<(i32, f32)> {
    let mut running = SKY_START;
    let mut lights = Vec::new();
    for (z, voxel) in store.column(x, y).rev() {
        lights.push((z, running as f32 / SKY_START as f32));
        running -= i32::from(registry.solidness(voxel));
        if running <= 0 {
            break;
        }
    }
    lights
}

/// Emissions seeded one cell above every sky-lit voxel of column `(x, y)`.
pub fn sky_emissions(
    store: &VoxelStore,
    registry: &VoxelTypeRegistry,
    sun: &Sun,
    x: i32,
    y: i32,
) -> Vec<Emission> {
    sky_light(store, registry, x, y)
        .into_iter()
        .map(|(z, factor)| Emission {
            origin: VoxelPos::new(x, y, z + 1),
            luminosity: sun.luminosity * factor,
            face: sun.face,
            self_luminosity: sun.self_luminosity * factor,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use isovox_voxel::{FaceTextures, Luminosity, TileRef, VoxelTypeDef, VoxelTypeId};

    fn registry() -> (VoxelTypeRegistry, VoxelTypeId, VoxelTypeId) {
        let mut registry = VoxelTypeRegistry::new();
        let mut register = |name: &str, solidness| {
            registry
                .register(VoxelTypeDef {
                    name: name.to_string(),
                    solidness,
                    textures: vec![FaceTextures::Single(TileRef::new(0, 0))],
                    ticks_per_frame: 0,
                    luminosity: Luminosity::NONE,
                })
                .unwrap()
        };
        let stone = register("stone", 10);
        let leaf = register("leaf", 1);
        (registry, stone, leaf)
    }

    #[test]
    fn test_empty_column_has_no_skylight() {
        let (registry, _, _) = registry();
        let store = VoxelStore::default();
        assert!(sky_light(&store, &registry, 0, 0).is_empty());
    }

    #[test]
    fn test_single_opaque_voxel() {
        let (registry, stone, _) = registry();
        let mut store = VoxelStore::default();
        store.set(VoxelPos::new(0, 0, 5), stone, &registry);
        assert_eq!(sky_light(&store, &registry, 0, 0), vec![(5, 1.0)]);
    }

    #[test]
    fn test_opaque_voxel_stops_scan() {
        let (registry, stone, leaf) = registry();
        let mut store = VoxelStore::default();
        store.set(VoxelPos::new(0, 0, 9), leaf, &registry);
        store.set(VoxelPos::new(0, 0, 8), leaf, &registry);
        store.set(VoxelPos::new(0, 0, 4), stone, &registry);
        store.set(VoxelPos::new(0, 0, 1), stone, &registry);

        let lights = sky_light(&store, &registry, 0, 0);
        let zs: Vec<i32> = lights.iter().map(|(z, _)| *z).collect();
        assert_eq!(zs, vec![9, 8, 4]);
        assert!((lights[1].1 - 0.9).abs() < 1e-6);
        assert!((lights[2].1 - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_emissions_start_above_surface() {
        let (registry, stone, _) = registry();
        let mut store = VoxelStore::default();
        store.set(VoxelPos::new(3, -2, 7), stone, &registry);
        let emissions = sky_emissions(&store, &registry, &Sun::default(), 3, -2);
        assert_eq!(emissions.len(), 1);
        assert_eq!(emissions[0].origin, VoxelPos::new(3, -2, 8));
        assert_eq!(emissions[0].luminosity, 4.0);
        assert_eq!(emissions[0].face, Face::NegZ);
    }
}
