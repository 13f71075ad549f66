//! Fractal Brownian motion over [`gradient_noise`].
//!
//! Octave `k` samples the lattice at `(pos + offset_k) * noise_scale * lacunarity^k`
//! with amplitude `persistence^k`. The sum is normalised by the total
//! amplitude, remapped from [-1, 1] to [0, 1] and scaled by `mesh_height`.
//! The per-octave offsets push every octave onto a separate region of the
//! lattice so higher octaves are not rescaled copies of octave 0.

use glam::Vec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::gradient::gradient_noise;
use super::params::TerrainParams;

/// Octave offsets are drawn uniformly from ±OFFSET_RANGE.
pub const OFFSET_RANGE: f32 = 256.0;

/// One 2D offset per octave, derived from `seed` alone.
pub fn octave_offsets(seed: u32, octaves: u32) -> Vec<Vec2> {
    let mut rng = StdRng::seed_from_u64(u64::from(seed));
    (0..octaves)
        .map(|_| {
            let x = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE);
            let y = rng.gen_range(-OFFSET_RANGE..OFFSET_RANGE);
            Vec2::new(x, y)
        })
        .collect()
}

/// Fractal height function with its offsets resolved for one seed.
#[derive(Debug, Clone)]
pub struct Fbm {
    pub persistence: f32,
    pub lacunarity: f32,
    pub noise_scale: f32,
    pub mesh_height: f32,
    offsets: Vec<Vec2>,
}

impl Fbm {
    /// Build from terrain params, deriving fresh offsets from the current seed.
    pub fn new(params: &TerrainParams) -> Self {
        Self::with_offsets(params, octave_offsets(params.seed, params.octaves))
    }

    /// Build with explicit offsets; the octave count is `offsets.len()`.
    pub fn with_offsets(params: &TerrainParams, offsets: Vec<Vec2>) -> Self {
        Self {
            persistence: params.persistence,
            lacunarity: params.lacunarity,
            noise_scale: params.noise_scale,
            mesh_height: params.mesh_height,
            offsets,
        }
    }

    pub fn octaves(&self) -> usize {
        self.offsets.len()
    }

    pub fn offsets(&self) -> &[Vec2] {
        &self.offsets
    }

    /// Height at world position `pos`, in [0, mesh_height].
    pub fn sample(&self, pos: Vec2) -> f32 {
        let mut height = 0.0f32;
        let mut max_height = 0.0f32;
        let mut amplitude = 1.0f32;
        let mut frequency = 1.0f32;
        for offset in &self.offsets {
            height += gradient_noise((pos + *offset) * self.noise_scale * frequency) * amplitude;
            max_height += amplitude;
            amplitude *= self.persistence;
            frequency *= self.lacunarity;
        }
        if max_height <= 0.0 {
            return 0.5 * self.mesh_height;
        }
        let normalized = (height / max_height).clamp(-1.0, 1.0);
        (normalized + 1.0) * 0.5 * self.mesh_height
    }
}
