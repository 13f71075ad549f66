//! Flat water plane sharing the terrain's footprint and resolution.
//! Waves and reflections are shader work; only the grid is built here.

use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{check_range, SylvaError};
use crate::mesh::{triangulate_grid, MeshData, Vertex};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WaterParams {
    /// World-space Y of the plane.
    pub water_height: f32,
}

impl Default for WaterParams {
    fn default() -> Self {
        Self { water_height: -0.4 }
    }
}

impl WaterParams {
    pub fn validate(&self) -> Result<(), SylvaError> {
        check_range("water_height", self.water_height, -1000.0, 1000.0)
    }
}

/// Build a `resolution × resolution` plane at `water_height` spanning
/// `[-mesh_scale, mesh_scale]²`, with +Y normals and [0, 1] UVs.
pub fn water_plane(resolution: usize, mesh_scale: f32, water_height: f32) -> MeshData {
    let denom = resolution.saturating_sub(1).max(1) as f32;
    let mut grid = Vec::with_capacity(resolution * resolution);
    for i in 0..resolution {
        for j in 0..resolution {
            let u = i as f32 / denom;
            let v = j as f32 / denom;
            let x = (-1.0 + 2.0 * u) * mesh_scale;
            let z = (-1.0 + 2.0 * v) * mesh_scale;
            grid.push(Vertex::new(Vec3::new(x, water_height, z), Vec3::Y, Vec2::new(u, v)));
        }
    }
    triangulate_grid(&grid, resolution)
}
