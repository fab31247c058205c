//! Directional flood-fill light propagation.
//!
//! Light leaves its source travelling along a face normal. Every step costs 1
//! when it continues in the travel direction and `attenuation` when it turns,
//! then the remainder is scaled by the transparency of the cell entered. A
//! cell is expanded once (first visit wins), so running the same emission in
//! [`PropagationMode::Shadow`] over the same geometry retracts exactly what
//! [`PropagationMode::Illuminate`] added.

use std::collections::VecDeque;

use rustc_hash::FxHashSet;

use isovox_voxel::{Face, LightSource, VoxelPos, VoxelStore, VoxelTypeRegistry};

use crate::error::LightingError;
use crate::light_field::LightField;

/// Cost of one step that keeps the travel direction.
pub const STRAIGHT_COST: f32 = 1.0;

/// Whether a pass adds light or retracts it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropagationMode {
    Illuminate,
    Shadow,
}

impl PropagationMode {
    fn sign(self) -> f32 {
        match self {
            PropagationMode::Illuminate => 1.0,
            PropagationMode::Shadow => -1.0,
        }
    }
}

/// Validated propagation tuning.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PropagationParams {
    attenuation: f32,
}

impl PropagationParams {
    /// Creates params with the given turning cost.
    ///
    /// # Errors
    ///
    /// Returns [`LightingError::NonPositiveStepCost`] if `attenuation` is not a
    /// finite value greater than zero.
    pub fn new(attenuation: f32) -> Result<Self, LightingError> {
        if !attenuation.is_finite() || attenuation <= 0.0 {
            return Err(LightingError::NonPositiveStepCost(attenuation));
        }
        Ok(Self { attenuation })
    }

    /// Cost of a step that changes travel direction.
    pub fn attenuation(&self) -> f32 {
        self.attenuation
    }

    /// Cheapest single step, straight or turning.
    pub fn min_step_cost(&self) -> f32 {
        STRAIGHT_COST.min(self.attenuation)
    }

    /// Upper bound on the number of steps an emission of `luminosity` can
    /// take before it is exhausted. Transparency only ever shortens it.
    pub fn reach(&self, luminosity: f32) -> f32 {
        luminosity / self.min_step_cost()
    }

    fn step_cost(&self, travel: Face, step: Face) -> f32 {
        if travel == step {
            STRAIGHT_COST
        } else {
            self.attenuation
        }
    }
}

/// A single light injection: a registered source or a skylight seed.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Emission {
    pub origin: VoxelPos,
    pub luminosity: f32,
    /// Initial travel axis and direction.
    pub face: Face,
    pub self_luminosity: f32,
}

impl From<&LightSource> for Emission {
    fn from(source: &LightSource) -> Self {
        Self {
            origin: source.pos,
            luminosity: source.luminosity,
            face: source.face,
            self_luminosity: source.self_luminosity,
        }
    }
}

/// Spreads (or retracts) one emission into `field` against the geometry in
/// `store`. Returns the number of cells expanded.
pub fn propagate(
    store: &VoxelStore,
    registry: &VoxelTypeRegistry,
    field: &mut LightField,
    emission: &Emission,
    params: &PropagationParams,
    mode: PropagationMode,
) -> usize {
    let sign = mode.sign();

    if emission.self_luminosity != 0.0 {
        for face in Face::TRAVERSAL {
            let neighbor = emission.origin.step(face);
            if store.contains(neighbor) {
                field.add(neighbor, face.opposite(), sign * emission.self_luminosity);
            }
        }
    }

    let mut queue = VecDeque::new();
    let mut visited = FxHashSet::default();
    queue.push_back((emission.origin, emission.luminosity, emission.face));

    while let Some((pos, luminosity, travel)) = queue.pop_front() {
        if !visited.insert(pos) {
            continue;
        }

        for step in Face::TRAVERSAL {
            let neighbor = pos.step(step);
            let transparency = match store.get(neighbor) {
                Some(voxel) => {
                    field.add(neighbor, step.opposite(), sign * luminosity);
                    registry.transparency(voxel)
                }
                None => 1.0,
            };

            let remaining = (luminosity - params.step_cost(travel, step)) * transparency;
            if remaining > 0.0 {
                // The travel axis is kept; only the direction follows the step.
                let next = Face::from_axis(travel.axis(), step.is_positive());
                queue.push_back((neighbor, remaining, next));
            }
        }
    }

    visited.len()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
