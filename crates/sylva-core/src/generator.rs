//! Scene orchestrator: owns the generated data and decides what to rebuild
//! when parameters change.

use serde::{Deserialize, Serialize};

use crate::error::{check_range, SylvaError};
use crate::heightfield::Heightfield;
use crate::lsystem::{build_skeleton, BranchShape, Grammar, TreeSkeleton, TreeType, TurtleParams};
use crate::mesh::MeshData;
use crate::noise::TerrainParams;
use crate::placement::{scatter, Placement, ScatterParams, DEFAULT_PLACEMENT_SEED};
use crate::water::{water_plane, WaterParams};

/// Deeper expansions grow past what is sensible to mesh.
pub const MAX_ITERATIONS: u32 = 5;
pub const MAX_TREE_COUNT: u32 = 200;
/// Upper bound on `tree_count × tips` over every preset within the limits above.
pub const MAX_LEAF_INSTANCES: usize = 2_000_000;

// ── Parameters ────────────────────────────────────────────────────────────────

/// Tree grammar, shape and placement controls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TreeParams {
    pub tree_type: TreeType,
    /// Branch angle in degrees.
    pub angle: f32,
    pub iterations: u32,
    pub step_length: f32,
    pub branch_taper: f32,
    pub leaf_size: f32,
    pub initial_radius: f32,
    pub cylinder_sides: u32,
    pub shape: BranchShape,
    pub min_scale: f32,
    pub max_scale: f32,
    pub random_rotation: bool,
    pub tree_count: u32,
    pub placement_seed: u64,
}

impl Default for TreeParams {
    fn default() -> Self {
        let turtle = TurtleParams::default();
        let scatter = ScatterParams::default();
        Self {
            tree_type: TreeType::Simple,
            angle: turtle.angle,
            iterations: 3,
            step_length: turtle.step_length,
            branch_taper: turtle.branch_taper,
            leaf_size: scatter.leaf_size,
            initial_radius: turtle.initial_radius,
            cylinder_sides: turtle.cylinder_sides,
            shape: turtle.shape,
            min_scale: scatter.min_scale,
            max_scale: scatter.max_scale,
            random_rotation: scatter.random_rotation,
            tree_count: scatter.count,
            placement_seed: DEFAULT_PLACEMENT_SEED,
        }
    }
}

impl TreeParams {
    pub fn validate(&self) -> Result<(), SylvaError> {
        check_range("angle", self.angle, 0.0, 180.0)?;
        check_range("iterations", self.iterations, 0, MAX_ITERATIONS)?;
        check_range("step_length", self.step_length, 0.0, 10.0)?;
        check_range("branch_taper", self.branch_taper, 0.01, 1.0)?;
        check_range("leaf_size", self.leaf_size, 0.0, 10.0)?;
        check_range("initial_radius", self.initial_radius, 0.0001, 10.0)?;
        check_range("cylinder_sides", self.cylinder_sides, 3, 64)?;
        check_range("shape.min_radius", self.shape.min_radius, 1e-6, 1.0)?;
        check_range("shape.branch_narrowing", self.shape.branch_narrowing, 0.01, 1.0)?;
        check_range("shape.collar_flare", self.shape.collar_flare, 1.0, 4.0)?;
        check_range("shape.collar_length", self.shape.collar_length, 0.0, 1.0)?;
        check_range("min_scale", self.min_scale, 0.01, 100.0)?;
        check_range("max_scale", self.max_scale, 0.01, 100.0)?;
        check_range("tree_count", self.tree_count, 0, MAX_TREE_COUNT)?;
        if self.min_scale > self.max_scale {
            return Err(SylvaError::ScaleRangeInverted { min: self.min_scale, max: self.max_scale });
        }
        Ok(())
    }

    pub fn grammar(&self) -> Grammar {
        Grammar::preset(self.tree_type, self.iterations)
    }

    pub fn turtle_params(&self) -> TurtleParams {
        TurtleParams {
            angle: self.angle,
            step_length: self.step_length,
            branch_taper: self.branch_taper,
            initial_radius: self.initial_radius,
            cylinder_sides: self.cylinder_sides,
            shape: self.shape.clone(),
            ..TurtleParams::default()
        }
    }

    pub fn scatter_params(&self) -> ScatterParams {
        ScatterParams {
            count: self.tree_count,
            min_scale: self.min_scale,
            max_scale: self.max_scale,
            random_rotation: self.random_rotation,
            leaf_size: self.leaf_size,
            seed: self.placement_seed,
        }
    }

    /// Which rebuild moving from `old` to `self` requires.
    pub fn invalidation_from(&self, old: &TreeParams) -> Invalidation {
        let skeleton_changed = self.tree_type != old.tree_type
            || self.angle != old.angle
            || self.iterations != old.iterations
            || self.step_length != old.step_length
            || self.branch_taper != old.branch_taper
            || self.leaf_size != old.leaf_size
            || self.initial_radius != old.initial_radius
            || self.cylinder_sides != old.cylinder_sides
            || self.shape != old.shape;
        if skeleton_changed {
            return Invalidation::SkeletonDirty;
        }
        if self != old {
            return Invalidation::PlacementDirty;
        }
        Invalidation::Clean
    }
}

/// Every tunable in one serialisable document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneParams {
    pub terrain: TerrainParams,
    pub water: WaterParams,
    pub trees: TreeParams,
}

impl SceneParams {
    pub fn validate(&self) -> Result<(), SylvaError> {
        self.terrain.validate()?;
        self.water.validate()?;
        self.trees.validate()
    }

    pub fn from_json_str(json: &str) -> Result<Self, SylvaError> {
        let params: SceneParams = serde_json::from_str(json)?;
        params.validate()?;
        Ok(params)
    }

    pub fn to_json_string(&self) -> Result<String, SylvaError> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

// ── Invalidation ──────────────────────────────────────────────────────────────

/// Pending rebuild work. Ordered so that `max` merges two requests: a dirty
/// skeleton always implies a dirty placement, since tips move with it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Invalidation {
    #[default]
    Clean,
    PlacementDirty,
    SkeletonDirty,
}

impl Invalidation {
    pub fn mark(self, other: Invalidation) -> Invalidation {
        self.max(other)
    }

    pub fn needs_skeleton(self) -> bool {
        self == Invalidation::SkeletonDirty
    }

    pub fn needs_placement(self) -> bool {
        self != Invalidation::Clean
    }
}

// ── Scene ─────────────────────────────────────────────────────────────────────

/// Buffers handed to a renderer. Matrices are column-major.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneBuffers {
    pub terrain: MeshData,
    pub texture_scale: f32,
    pub water: MeshData,
    pub skeleton: MeshData,
    pub tree_transforms: Vec<[f32; 16]>,
    pub leaf_transforms: Vec<[f32; 16]>,
}

/// Headline numbers for logs and the CLI.
#[derive(Debug, Clone, Serialize)]
pub struct SceneStats {
    pub terrain_vertices: usize,
    pub min_height: f32,
    pub max_height: f32,
    pub program_length: usize,
    pub skeleton_triangles: usize,
    pub branch_tips: usize,
    pub trees: usize,
    pub leaves: usize,
}

/// Owns every generated artefact. All operations block until done.
#[derive(Debug)]
pub struct Scene {
    params: SceneParams,
    heightfield: Heightfield,
    water: MeshData,
    skeleton: TreeSkeleton,
    program_length: usize,
    placement: Placement,
    pending: Invalidation,
}

impl Scene {
    /// Validate `params` and generate everything.
    pub fn new(params: SceneParams) -> Result<Self, SylvaError> {
        params.validate()?;
        let mut scene = Scene {
            heightfield: Heightfield::build(&params.terrain),
            water: MeshData::default(),
            skeleton: TreeSkeleton::default(),
            program_length: 0,
            placement: Placement::default(),
            pending: Invalidation::SkeletonDirty,
            params,
        };
        scene.rebuild_water();
        scene.refresh();
        Ok(scene)
    }

    pub fn params(&self) -> &SceneParams {
        &self.params
    }

    pub fn heightfield(&self) -> &Heightfield {
        &self.heightfield
    }

    pub fn water(&self) -> &MeshData {
        &self.water
    }

    pub fn skeleton(&self) -> &TreeSkeleton {
        &self.skeleton
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    pub fn pending(&self) -> Invalidation {
        self.pending
    }

    /// Store new terrain params. They take effect on `regenerate_heightfield`.
    pub fn set_terrain_params(&mut self, terrain: TerrainParams) -> Result<(), SylvaError> {
        terrain.validate()?;
        self.params.terrain = terrain;
        Ok(())
    }

    /// Water height applies immediately; the plane follows the built terrain's footprint.
    pub fn set_water_params(&mut self, water: WaterParams) -> Result<(), SylvaError> {
        water.validate()?;
        self.params.water = water;
        self.rebuild_water();
        Ok(())
    }

    /// Store new tree params and record what they invalidate. Nothing is
    /// rebuilt until `refresh`.
    pub fn set_tree_params(&mut self, trees: TreeParams) -> Result<Invalidation, SylvaError> {
        trees.validate()?;
        let change = trees.invalidation_from(&self.params.trees);
        self.params.trees = trees;
        self.pending = self.pending.mark(change);
        Ok(self.pending)
    }

    /// Run whatever rebuild is pending. Returns the work performed.
    pub fn refresh(&mut self) -> Invalidation {
        let work = self.pending;
        match work {
            Invalidation::SkeletonDirty => self.regenerate_skeleton_and_rescatter(),
            Invalidation::PlacementDirty => self.rescatter_only(),
            Invalidation::Clean => {}
        }
        work
    }

    /// The "Generate" action: rebuild terrain and water, then re-scatter,
    /// since tree heights come from the terrain. The skeleton is left alone;
    /// a pending skeleton rebuild stays pending.
    pub fn regenerate_heightfield(&mut self) {
        let _span = tracing::info_span!("regenerate_heightfield").entered();
        self.heightfield = Heightfield::build(&self.params.terrain);
        self.rebuild_water();
        tracing::info!(
            resolution = self.heightfield.resolution(),
            min_height = self.heightfield.min_height(),
            max_height = self.heightfield.max_height(),
            "terrain regenerated"
        );
        self.rescatter_only();
    }

    pub fn regenerate_skeleton_and_rescatter(&mut self) {
        let _span = tracing::info_span!("regenerate_skeleton").entered();
        let trees = &self.params.trees;
        let program = trees.grammar().expand();
        self.skeleton = build_skeleton(&program, &trees.turtle_params());
        self.program_length = program.len();
        tracing::info!(
            tree_type = trees.tree_type.label(),
            program_length = self.program_length,
            tips = self.skeleton.tips.len(),
            "skeleton rebuilt"
        );
        self.scatter_now();
        self.pending = Invalidation::Clean;
    }

    /// Re-run placement against the current skeleton. A pending skeleton
    /// rebuild stays pending.
    pub fn rescatter_only(&mut self) {
        self.scatter_now();
        if self.pending == Invalidation::PlacementDirty {
            self.pending = Invalidation::Clean;
        }
    }

    fn scatter_now(&mut self) {
        self.placement = scatter(&self.heightfield, &self.skeleton, &self.params.trees.scatter_params());
        tracing::info!(
            trees = self.placement.trees.len(),
            leaves = self.placement.leaves.len(),
            "trees scattered"
        );
    }

    fn rebuild_water(&mut self) {
        let built = self.heightfield.params();
        self.water = water_plane(self.heightfield.resolution(), built.mesh_scale, self.params.water.water_height);
    }

    /// Owned snapshot of every render buffer.
    pub fn buffers(&self) -> SceneBuffers {
        SceneBuffers {
            terrain: self.heightfield.mesh(),
            texture_scale: self.heightfield.params().texture_scale,
            water: self.water.clone(),
            skeleton: self.skeleton.mesh.clone(),
            tree_transforms: self.placement.tree_transforms().map(|m| m.to_cols_array()).collect(),
            leaf_transforms: self.placement.leaves.iter().map(|m| m.to_cols_array()).collect(),
        }
    }

    pub fn stats(&self) -> SceneStats {
        SceneStats {
            terrain_vertices: self.heightfield.samples().len(),
            min_height: self.heightfield.min_height(),
            max_height: self.heightfield.max_height(),
            program_length: self.program_length,
            skeleton_triangles: self.skeleton.mesh.triangle_count(),
            branch_tips: self.skeleton.tips.len(),
            trees: self.placement.trees.len(),
            leaves: self.placement.leaves.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_params() -> SceneParams {
        SceneParams {
            terrain: TerrainParams { mesh_resolution: 24, ..TerrainParams::default() },
            trees: TreeParams { iterations: 2, tree_count: 6, ..TreeParams::default() },
            ..SceneParams::default()
        }
    }

    #[test]
    fn new_scene_is_clean_and_populated() {
        let scene = Scene::new(small_params()).unwrap();
        assert_eq!(scene.pending(), Invalidation::Clean);
        let stats = scene.stats();
        assert_eq!(stats.terrain_vertices, 24 * 24);
        assert_eq!(stats.trees, 6);
        assert_eq!(stats.leaves, 6 * stats.branch_tips);
        assert!(stats.branch_tips > 0);
    }

    #[test]
    fn invalidation_ordering() {
        use Invalidation::*;
        assert_eq!(Clean.mark(PlacementDirty), PlacementDirty);
        assert_eq!(SkeletonDirty.mark(PlacementDirty), SkeletonDirty);
        assert!(SkeletonDirty.needs_placement());
        assert!(!PlacementDirty.needs_skeleton());
        assert!(!Clean.needs_placement());
    }

    #[test]
    fn placement_edit_only_rescatters() {
        let mut scene = Scene::new(small_params()).unwrap();
        let skeleton_before = scene.skeleton().mesh.clone();
        let trees = TreeParams { tree_count: 9, random_rotation: false, ..scene.params().trees.clone() };
        assert_eq!(scene.set_tree_params(trees).unwrap(), Invalidation::PlacementDirty);
        assert_eq!(scene.refresh(), Invalidation::PlacementDirty);
        assert_eq!(scene.pending(), Invalidation::Clean);
        assert_eq!(scene.skeleton().mesh, skeleton_before);
        assert_eq!(scene.placement().trees.len(), 9);
    }

    #[test]
    fn skeleton_edit_rebuilds_and_rescatters() {
        let mut scene = Scene::new(small_params()).unwrap();
        let tips_before = scene.skeleton().tips.len();
        let trees = TreeParams { tree_type: TreeType::ThreeD, ..scene.params().trees.clone() };
        assert_eq!(scene.set_tree_params(trees).unwrap(), Invalidation::SkeletonDirty);
        // A later placement-only edit does not downgrade the pending rebuild.
        let trees = TreeParams { tree_count: 3, ..scene.params().trees.clone() };
        assert_eq!(scene.set_tree_params(trees).unwrap(), Invalidation::SkeletonDirty);
        assert_eq!(scene.refresh(), Invalidation::SkeletonDirty);

        let tips = scene.skeleton().tips.len();
        assert_ne!(tips, tips_before);
        assert_eq!(scene.placement().leaves.len(), 3 * tips);
    }

    #[test]
    fn leaf_size_counts_as_skeleton_change() {
        let old = TreeParams::default();
        let new = TreeParams { leaf_size: 0.9, ..old.clone() };
        assert_eq!(new.invalidation_from(&old), Invalidation::SkeletonDirty);
        assert_eq!(old.invalidation_from(&old), Invalidation::Clean);
    }

    #[test]
    fn terrain_params_wait_for_generate() {
        let mut scene = Scene::new(small_params()).unwrap();
        let before = scene.heightfield().samples().to_vec();
        let terrain = TerrainParams { seed: 77, ..scene.params().terrain.clone() };
        scene.set_terrain_params(terrain).unwrap();
        assert_eq!(scene.heightfield().samples(), &before[..]);

        scene.regenerate_heightfield();
        assert_ne!(scene.heightfield().samples(), &before[..]);
        assert_eq!(scene.heightfield().params().seed, 77);
        for t in &scene.placement().trees {
            assert!(scene.heightfield().samples().iter().any(|s| s.position == t.position));
        }
    }

    #[test]
    fn generate_keeps_pending_skeleton_rebuild() {
        let mut scene = Scene::new(small_params()).unwrap();
        let skeleton_before = scene.skeleton().mesh.clone();
        let trees = TreeParams { tree_type: TreeType::Willow, ..scene.params().trees.clone() };
        scene.set_tree_params(trees).unwrap();
        let terrain = TerrainParams { seed: 3, ..scene.params().terrain.clone() };
        scene.set_terrain_params(terrain).unwrap();

        scene.regenerate_heightfield();
        assert_eq!(scene.pending(), Invalidation::SkeletonDirty);
        assert_eq!(scene.skeleton().mesh, skeleton_before);
        for t in &scene.placement().trees {
            assert!(scene.heightfield().samples().iter().any(|s| s.position == t.position));
        }

        assert_eq!(scene.refresh(), Invalidation::SkeletonDirty);
        assert_ne!(scene.skeleton().mesh, skeleton_before);
        assert_eq!(scene.pending(), Invalidation::Clean);
    }

    #[test]
    fn limits_bound_the_leaf_buffer() {
        use crate::lsystem::turtle::is_branch_tip;
        for tree_type in TreeType::ALL {
            let program = Grammar::preset(tree_type, MAX_ITERATIONS).expand();
            let symbols = program.as_bytes();
            let tips = (0..symbols.len()).filter(|&i| symbols[i] == b'F' && is_branch_tip(symbols, i)).count();
            let leaves = tips * MAX_TREE_COUNT as usize;
            assert!(leaves <= MAX_LEAF_INSTANCES, "{tree_type:?}: {leaves} leaves");
        }
        let over = TreeParams { iterations: MAX_ITERATIONS + 1, ..TreeParams::default() };
        assert!(matches!(over.validate(), Err(SylvaError::OutOfRange { field: "iterations", .. })));
        let over = TreeParams { tree_count: MAX_TREE_COUNT + 1, ..TreeParams::default() };
        assert!(matches!(over.validate(), Err(SylvaError::OutOfRange { field: "tree_count", .. })));
    }

    #[test]
    fn tree_type_accepts_index_or_name() {
        let by_index = SceneParams::from_json_str(r#"{ "trees": { "tree_type": 3 } }"#).unwrap();
        assert_eq!(by_index.trees.tree_type, TreeType::ThreeD);
        assert!(SceneParams::from_json_str(r#"{ "trees": { "tree_type": 4 } }"#).is_err());
    }

    #[test]
    fn regeneration_is_reproducible() {
        let a = Scene::new(small_params()).unwrap().buffers();
        let b = Scene::new(small_params()).unwrap().buffers();
        assert_eq!(a.terrain, b.terrain);
        assert_eq!(a.skeleton, b.skeleton);
        assert_eq!(a.tree_transforms, b.tree_transforms);
        assert_eq!(a.leaf_transforms, b.leaf_transforms);
    }

    #[test]
    fn invalid_params_rejected_without_mutation() {
        let mut scene = Scene::new(small_params()).unwrap();
        let bad = TreeParams { min_scale: 3.0, max_scale: 1.0, ..scene.params().trees.clone() };
        assert!(matches!(scene.set_tree_params(bad), Err(SylvaError::ScaleRangeInverted { .. })));
        assert_eq!(scene.params().trees, small_params().trees);
        assert_eq!(scene.pending(), Invalidation::Clean);
    }

    #[test]
    fn params_json_roundtrip_and_partial() {
        let p = small_params();
        let json = p.to_json_string().unwrap();
        assert_eq!(SceneParams::from_json_str(&json).unwrap(), p);

        let partial = SceneParams::from_json_str(r#"{ "trees": { "tree_type": "Willow" } }"#).unwrap();
        assert_eq!(partial.trees.tree_type, TreeType::Willow);
        assert_eq!(partial.terrain, TerrainParams::default());
        assert!(SceneParams::from_json_str("{ not json").is_err());
    }

    #[test]
    fn water_follows_built_terrain() {
        let mut scene = Scene::new(small_params()).unwrap();
        scene.set_water_params(WaterParams { water_height: 0.75 }).unwrap();
        assert_eq!(scene.water().vertex_count(), scene.heightfield().mesh().vertex_count());
        assert!(scene.water().vertices.iter().all(|v| v.position.y == 0.75));
    }
}
