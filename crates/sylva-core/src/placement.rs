//! Seeded scattering of tree instances over the terrain, and per-instance
//! leaf transforms derived from the skeleton's branch tips.

use glam::{Mat4, Vec2, Vec3, Vec4};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use std::f32::consts::TAU;

use crate::heightfield::Heightfield;
use crate::lsystem::{BranchTip, TreeSkeleton};

/// Fixed seed so unchanged parameters reproduce the same layout.
pub const DEFAULT_PLACEMENT_SEED: u64 = 42;

/// Trees are sampled within this fraction of the terrain half-extent.
pub const EDGE_INSET: f32 = 0.8;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScatterParams {
    pub count: u32,
    pub min_scale: f32,
    pub max_scale: f32,
    pub random_rotation: bool,
    /// Leaf scale relative to the owning tree's scale.
    pub leaf_size: f32,
    pub seed: u64,
}

impl Default for ScatterParams {
    fn default() -> Self {
        Self {
            count: 50,
            min_scale: 0.5,
            max_scale: 2.0,
            random_rotation: true,
            leaf_size: 0.5,
            seed: DEFAULT_PLACEMENT_SEED,
        }
    }
}

/// One placed tree.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TreeInstance {
    /// Terrain vertex the tree stands on.
    pub position: Vec3,
    pub scale: f32,
    /// Rotation about world +Y, radians.
    pub yaw: f32,
    pub transform: Mat4,
}

/// Instance transforms for the shared skeleton and leaf meshes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub trees: Vec<TreeInstance>,
    /// `trees.len() × tips.len()` entries, grouped per tree.
    pub leaves: Vec<Mat4>,
}

impl Placement {
    pub fn tree_transforms(&self) -> impl Iterator<Item = Mat4> + '_ {
        self.trees.iter().map(|t| t.transform)
    }
}

/// Scatter `params.count` trees over `terrain` and attach a leaf to every
/// tip of `skeleton` on each of them.
///
/// Draw order per tree is x, z, scale, then yaw (only when rotation is
/// enabled), all from one generator seeded with `params.seed`.
pub fn scatter(terrain: &Heightfield, skeleton: &TreeSkeleton, params: &ScatterParams) -> Placement {
    let mut rng = StdRng::seed_from_u64(params.seed);
    let extent = (terrain.params().mesh_scale * EDGE_INSET).abs();
    let (lo, hi) = if params.min_scale <= params.max_scale {
        (params.min_scale, params.max_scale)
    } else {
        (params.max_scale, params.min_scale)
    };

    let count = params.count as usize;
    let mut trees = Vec::with_capacity(count);
    let mut leaves = Vec::with_capacity(count * skeleton.tips.len());

    for _ in 0..count {
        let x = rng.gen_range(-extent..=extent);
        let z = rng.gen_range(-extent..=extent);
        let position = terrain.sample_vertex(Vec2::new(x, z));
        let scale = rng.gen_range(lo..=hi);
        let yaw = if params.random_rotation { rng.gen_range(0.0..TAU) } else { 0.0 };

        let transform = Mat4::from_translation(position)
            * Mat4::from_rotation_y(yaw)
            * Mat4::from_scale(Vec3::splat(scale));

        leaves.extend(
            skeleton
                .tips
                .iter()
                .map(|tip| leaf_transform(&transform, tip, scale * params.leaf_size)),
        );
        trees.push(TreeInstance { position, scale, yaw, transform });
    }

    tracing::debug!(trees = trees.len(), leaves = leaves.len(), "placement scattered");
    Placement { trees, leaves }
}

/// World transform for a leaf at `tip` on a tree placed by `tree`.
///
/// The leaf's local +Y follows the world branch direction. A tip pointing
/// straight up or down falls back to +X for the right-hand axis.
pub fn leaf_transform(tree: &Mat4, tip: &BranchTip, leaf_scale: f32) -> Mat4 {
    let world_pos = tree.transform_point3(tip.position);
    let up = tree.transform_vector3(tip.direction).try_normalize().unwrap_or(Vec3::Y);

    let mut right = Vec3::Y.cross(up);
    if right.length() < 1e-3 {
        right = Vec3::X.cross(up);
    }
    let right = right.normalize();
    let forward = up.cross(right).normalize();

    let orientation = Mat4::from_cols(right.extend(0.0), up.extend(0.0), forward.extend(0.0), Vec4::W);
    Mat4::from_translation(world_pos) * orientation * Mat4::from_scale(Vec3::splat(leaf_scale))
}
