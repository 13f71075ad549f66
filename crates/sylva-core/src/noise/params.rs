use serde::{Deserialize, Serialize};

use crate::error::{check_range, SylvaError};

/// Largest accepted grid resolution per side.
pub const MAX_RESOLUTION: u32 = 1024;
pub const MAX_OCTAVES: u32 = 10;

/// Inputs to heightfield synthesis. Any change requires a full rebuild.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainParams {
    /// Seeds the per-octave offsets.
    pub seed: u32,
    /// Amplitude multiplier per octave, in (0, 1).
    pub persistence: f32,
    /// Frequency multiplier per octave, > 1.
    pub lacunarity: f32,
    /// Spread of the base noise lattice over world space.
    pub noise_scale: f32,
    pub octaves: u32,
    /// Output heights lie in [0, mesh_height].
    pub mesh_height: f32,
    /// Half-extent of the terrain in world units; the grid spans ±mesh_scale.
    pub mesh_scale: f32,
    /// Vertices per side.
    pub mesh_resolution: u32,
    /// Texture repeat factor, forwarded to the renderer.
    pub texture_scale: f32,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            seed: 0,
            persistence: 0.3,
            lacunarity: 2.0,
            noise_scale: 0.5,
            octaves: 4,
            mesh_height: 2.5,
            mesh_scale: 10.0,
            mesh_resolution: 100,
            texture_scale: 10.0,
        }
    }
}

impl TerrainParams {
    pub fn validate(&self) -> Result<(), SylvaError> {
        check_range("persistence", self.persistence, 0.01, 1.0)?;
        check_range("lacunarity", self.lacunarity, 1.0, 4.0)?;
        check_range("noise_scale", self.noise_scale, 0.001, 10.0)?;
        check_range("octaves", self.octaves, 1, MAX_OCTAVES)?;
        check_range("mesh_height", self.mesh_height, 0.0, 1000.0)?;
        check_range("mesh_scale", self.mesh_scale, 0.1, 1000.0)?;
        check_range("mesh_resolution", self.mesh_resolution, 1, MAX_RESOLUTION)?;
        check_range("texture_scale", self.texture_scale, 0.01, 500.0)?;
        Ok(())
    }
}
