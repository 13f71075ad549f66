use glam::{Vec2, Vec3};
use serde::{Deserialize, Serialize};

use crate::mesh::{triangulate_grid, MeshData, Vertex};
use crate::noise::{Fbm, TerrainParams};

/// One terrain vertex. `position.y` is the synthesised height.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HeightSample {
    pub position: Vec3,
    /// Unit normal from central differences over the padded grid.
    pub normal: Vec3,
    /// Grid fraction in [0, 1] on both axes.
    pub uv: Vec2,
}

impl From<HeightSample> for Vertex {
    fn from(s: HeightSample) -> Self {
        Vertex::new(s.position, s.normal, s.uv)
    }
}

/// A square R×R grid of terrain samples spanning `[-mesh_scale, mesh_scale]²`.
///
/// Samples are row-major: index `i * R + j`, with `i` along +X and `j`
/// along +Z. The grid is rebuilt wholesale; there is no partial update.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Heightfield {
    samples: Vec<HeightSample>,
    resolution: usize,
    params: TerrainParams,
}

impl Heightfield {
    /// Synthesise the heightfield for `params`.
    ///
    /// Heights are evaluated on an (R+2)×(R+2) grid whose inner R×R block
    /// spans exactly ±mesh_scale. The outer ring only feeds the central
    /// differences for edge normals and is dropped afterwards.
    pub fn build(params: &TerrainParams) -> Self {
        let r = params.mesh_resolution as usize;
        if r == 0 {
            return Self { samples: Vec::new(), resolution: 0, params: params.clone() };
        }

        let fbm = Fbm::new(params);
        let padded = padded_positions(&fbm, r, params.mesh_scale);
        let p = r + 2;
        let uv_denom = r.saturating_sub(1).max(1) as f32;

        let mut samples = Vec::with_capacity(r * r);
        for i in 0..r {
            for j in 0..r {
                // Inner (i, j) sits at padded (i + 1, j + 1).
                let (pi, pj) = (i + 1, j + 1);
                let tangent_x = (padded[(pi + 1) * p + pj] - padded[(pi - 1) * p + pj]).normalize();
                let tangent_z = (padded[pi * p + pj + 1] - padded[pi * p + pj - 1]).normalize();
                samples.push(HeightSample {
                    position: padded[pi * p + pj],
                    // tz × tx rather than tx × tz, so flat ground faces +Y.
                    normal: tangent_z.cross(tangent_x).normalize(),
                    uv: Vec2::new(i as f32 / uv_denom, j as f32 / uv_denom),
                });
            }
        }

        tracing::debug!(
            resolution = r,
            seed = params.seed,
            octaves = params.octaves,
            "heightfield synthesised"
        );
        Self { samples, resolution: r, params: params.clone() }
    }

    pub fn resolution(&self) -> usize {
        self.resolution
    }

    pub fn params(&self) -> &TerrainParams {
        &self.params
    }

    pub fn samples(&self) -> &[HeightSample] {
        &self.samples
    }

    #[inline]
    pub fn get(&self, i: usize, j: usize) -> &HeightSample {
        &self.samples[i * self.resolution + j]
    }

    /// World distance between neighbouring vertices.
    pub fn spacing(&self) -> f32 {
        2.0 * self.params.mesh_scale * grid_step(self.resolution)
    }

    /// Nearest stored vertex to world `(x, z)`.
    ///
    /// Not interpolated: the result snaps to the grid. Coordinates outside
    /// the terrain clamp to the boundary row/column.
    pub fn sample_vertex(&self, world: Vec2) -> Vec3 {
        if self.samples.is_empty() {
            return Vec3::ZERO;
        }
        let i = self.nearest_index(world.x);
        let j = self.nearest_index(world.y);
        self.get(i, j).position
    }

    fn nearest_index(&self, coord: f32) -> usize {
        let last = (self.resolution - 1) as f32;
        let frac = (coord / self.params.mesh_scale + 1.0) * 0.5;
        // NaN saturates to 0 in the cast.
        (frac * last).round().clamp(0.0, last) as usize
    }

    /// Triangle mesh with vertices duplicated per triangle.
    pub fn mesh(&self) -> MeshData {
        let grid: Vec<Vertex> = self.samples.iter().map(|&s| s.into()).collect();
        triangulate_grid(&grid, self.resolution)
    }

    pub fn min_height(&self) -> f32 {
        self.samples.iter().map(|s| s.position.y).fold(f32::INFINITY, f32::min)
    }

    pub fn max_height(&self) -> f32 {
        self.samples.iter().map(|s| s.position.y).fold(f32::NEG_INFINITY, f32::max)
    }
}

/// Grid fraction between neighbouring vertices. `R - 1` is floored at 1 so
/// R = 1 still yields a non-zero step.
#[inline]
fn grid_step(resolution: usize) -> f32 {
    1.0 / resolution.saturating_sub(1).max(1) as f32
}

/// Evaluate heights on the padded (R+2)² grid, row-major.
fn padded_positions(fbm: &Fbm, r: usize, mesh_scale: f32) -> Vec<Vec3> {
    let p = r + 2;
    let step = grid_step(r);
    let coord = move |k: usize| (-1.0 + 2.0 * (k as f32 - 1.0) * step) * mesh_scale;
    let row = move |pi: usize| {
        let x = coord(pi);
        (0..p).map(move |pj| {
            let z = coord(pj);
            Vec3::new(x, fbm.sample(Vec2::new(x, z)), z)
        })
    };

    #[cfg(feature = "threading")]
    {
        use rayon::prelude::*;
        (0..p).into_par_iter().flat_map_iter(row).collect()
    }
    #[cfg(not(feature = "threading"))]
    {
        (0..p).flat_map(row).collect()
    }
}
