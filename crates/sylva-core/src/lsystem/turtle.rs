//! Turtle interpretation of an expanded grammar string into branch geometry.
//!
//! Alphabet:
//!
//! | Symbol | Action                                            |
//! |--------|---------------------------------------------------|
//! | `F`    | move forward one step, emitting a tapered segment |
//! | `+` `-`| turn about the local side axis (Z)                |
//! | `&` `^`| pitch about the local X axis                      |
//! | `\` `/`| roll about the heading (local Y)                  |
//! | `[`    | push state, narrow the radius, request a collar   |
//! | `]`    | pop state                                         |
//!
//! Any other symbol is ignored.

use glam::{Mat3, Vec3};
use serde::{Deserialize, Serialize};

use super::cylinder::add_cylinder;
use crate::mesh::{MeshBuilder, MeshData};

/// Empirical branch-shaping constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BranchShape {
    /// Radius floor; no segment is thinner than this.
    pub min_radius: f32,
    /// Radius multiplier applied when a branch opens.
    pub branch_narrowing: f32,
    /// Collar start radius as a multiple of the branch radius.
    pub collar_flare: f32,
    /// Collar length as a fraction of `step_length`.
    pub collar_length: f32,
}

impl Default for BranchShape {
    fn default() -> Self {
        Self { min_radius: 0.001, branch_narrowing: 0.7, collar_flare: 1.4, collar_length: 0.15 }
    }
}

/// Interpretation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TurtleParams {
    /// Rotation per turn symbol, in degrees.
    pub angle: f32,
    pub step_length: f32,
    /// Per-step radius multiplier along an unbranched run.
    pub branch_taper: f32,
    pub initial_radius: f32,
    pub cylinder_sides: u32,
    /// Pushes beyond this depth are dropped.
    pub max_stack_depth: usize,
    pub shape: BranchShape,
}

impl Default for TurtleParams {
    fn default() -> Self {
        Self {
            angle: 25.0,
            step_length: 0.86,
            branch_taper: 0.8,
            initial_radius: 0.1,
            cylinder_sides: 12,
            max_stack_depth: 4096,
            shape: BranchShape::default(),
        }
    }
}

/// Cursor state; lives only for the duration of one interpretation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurtleState {
    pub position: Vec3,
    /// Unit heading, always `rotation * Y` renormalised.
    pub heading: Vec3,
    /// Accumulated local-frame orientation.
    pub rotation: Mat3,
}

impl Default for TurtleState {
    fn default() -> Self {
        Self { position: Vec3::ZERO, heading: Vec3::Y, rotation: Mat3::IDENTITY }
    }
}

impl TurtleState {
    /// Rotate by `radians` about `local_axis` of the turtle's own frame.
    fn turn(&mut self, local_axis: Vec3, radians: f32) {
        self.rotation *= Mat3::from_axis_angle(local_axis, radians);
        self.heading = (self.rotation * Vec3::Y).normalize();
    }
}

/// A leaf-attachment point in skeleton-local space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BranchTip {
    pub position: Vec3,
    /// Unit branch direction at the tip.
    pub direction: Vec3,
}

/// Bookkeeping from one interpretation pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurtleStats {
    pub pushes: usize,
    pub pops: usize,
    /// `]` with nothing to pop.
    pub ignored_pops: usize,
    /// `[` past `max_stack_depth`.
    pub dropped_pushes: usize,
    pub max_depth: usize,
    /// Stack depth after the last symbol.
    pub final_depth: usize,
    pub segments: usize,
}

/// Branch mesh of one canonical tree plus its leaf-attachment points.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TreeSkeleton {
    pub mesh: MeshData,
    pub tips: Vec<BranchTip>,
    pub stats: TurtleStats,
}

/// True when the `F` at byte `at` is the last forward move before the
/// enclosing `]` or the end of the string. Turn symbols in between do not
/// count, and neither does bracket depth.
pub fn is_branch_tip(symbols: &[u8], at: usize) -> bool {
    for &c in &symbols[at + 1..] {
        match c {
            b'F' => return false,
            b']' => return true,
            _ => {}
        }
    }
    true
}

struct Frame {
    turtle: TurtleState,
    radius: f32,
}

/// Walk `program` and emit the branch mesh and tip list.
///
/// Never fails: an unmatched `]` is skipped and degenerate parameters
/// produce degenerate (but finite) geometry.
pub fn build_skeleton(program: &str, params: &TurtleParams) -> TreeSkeleton {
    let symbols = program.as_bytes();
    let shape = &params.shape;
    let angle = params.angle.to_radians();

    let mut mb = MeshBuilder::new();
    let mut tips = Vec::new();
    let mut stats = TurtleStats::default();
    let mut stack: Vec<Frame> = Vec::new();
    // Matching `]` for pushes that were dropped at the depth cap.
    let mut dropped_open = 0usize;

    let mut turtle = TurtleState::default();
    let mut radius = params.initial_radius.max(shape.min_radius);
    let mut collar_pending = false;

    for (i, &c) in symbols.iter().enumerate() {
        match c {
            b'F' => {
                let mut start = turtle.position;
                let end = start + turtle.heading * params.step_length;

                if collar_pending {
                    let collar_end = start + turtle.heading * (params.step_length * shape.collar_length);
                    add_cylinder(&mut mb, start, collar_end, radius * shape.collar_flare, radius, params.cylinder_sides);
                    start = collar_end;
                    collar_pending = false;
                }

                let end_radius = (radius * params.branch_taper).max(shape.min_radius);
                add_cylinder(&mut mb, start, end, radius, end_radius, params.cylinder_sides);
                stats.segments += 1;

                turtle.position = end;
                radius = end_radius;

                if is_branch_tip(symbols, i) {
                    tips.push(BranchTip { position: end, direction: turtle.heading });
                }
            }
            b'+' => turtle.turn(Vec3::Z, angle),
            b'-' => turtle.turn(Vec3::Z, -angle),
            b'&' => turtle.turn(Vec3::X, angle),
            b'^' => turtle.turn(Vec3::X, -angle),
            b'\\' => turtle.turn(Vec3::Y, angle),
            b'/' => turtle.turn(Vec3::Y, -angle),
            b'[' => {
                if stack.len() >= params.max_stack_depth {
                    dropped_open += 1;
                    stats.dropped_pushes += 1;
                    continue;
                }
                stack.push(Frame { turtle, radius });
                stats.pushes += 1;
                stats.max_depth = stats.max_depth.max(stack.len());
                radius = (radius * shape.branch_narrowing).max(shape.min_radius);
                collar_pending = true;
            }
            b']' => {
                if dropped_open > 0 {
                    dropped_open -= 1;
                } else if let Some(frame) = stack.pop() {
                    turtle = frame.turtle;
                    radius = frame.radius;
                    stats.pops += 1;
                } else {
                    stats.ignored_pops += 1;
                }
                collar_pending = false;
            }
            _ => {}
        }
    }
    stats.final_depth = stack.len();

    if stats.ignored_pops > 0 || stats.dropped_pushes > 0 {
        tracing::warn!(
            ignored_pops = stats.ignored_pops,
            dropped_pushes = stats.dropped_pushes,
            "unbalanced or over-deep branch brackets"
        );
    }
    let mesh = mb.build();
    tracing::debug!(
        segments = stats.segments,
        tips = tips.len(),
        vertices = mesh.vertex_count(),
        "tree skeleton built"
    );
    TreeSkeleton { mesh, tips, stats }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lsystem::grammar::{Grammar, TreeType};

    fn params() -> TurtleParams {
        TurtleParams { angle: 30.0, step_length: 1.0, cylinder_sides: 6, ..TurtleParams::default() }
    }

    /// Segment radii (start, end) read back from emitted cylinders, in order.
    fn segment_radii(skel: &TreeSkeleton, sides: usize) -> Vec<(f32, f32)> {
        skel.mesh
            .vertices
            .chunks(sides * 4)
            .map(|c| {
                let axis_start = c.iter().filter(|v| v.uv.y == 0.0).map(|v| v.position).sum::<Vec3>() / (sides * 2) as f32;
                let axis_end = c.iter().filter(|v| v.uv.y == 1.0).map(|v| v.position).sum::<Vec3>() / (sides * 2) as f32;
                (c[0].position.distance(axis_start), c[2].position.distance(axis_end))
            })
            .collect()
    }

    #[test]
    fn straight_run_moves_up_and_records_one_tip() {
        let skel = build_skeleton("FFF", &params());
        assert_eq!(skel.stats.segments, 3);
        assert_eq!(skel.tips.len(), 1);
        assert!(skel.tips[0].position.abs_diff_eq(Vec3::new(0.0, 3.0, 0.0), 1e-5));
        assert!(skel.tips[0].direction.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn radius_decays_monotonically_with_floor() {
        let p = TurtleParams { branch_taper: 0.5, initial_radius: 0.01, step_length: 0.1, ..params() };
        let skel = build_skeleton("FFFFFFFFFF", &p);
        let radii = segment_radii(&skel, 6);
        assert_eq!(radii.len(), 10);
        for (k, &(start, end)) in radii.iter().enumerate() {
            assert!(end <= start + 1e-5, "segment {k} grew: {start} -> {end}");
            assert!(end >= p.shape.min_radius - 1e-5, "segment {k} below floor: {end}");
        }
        assert!(radii[0].1 < radii[0].0, "first segment did not taper");
        assert!((radii[9].1 - p.shape.min_radius).abs() < 1e-5);
    }

    #[test]
    fn branch_emits_collar_then_narrower_segment() {
        let p = TurtleParams { branch_taper: 1.0, ..params() };
        let skel = build_skeleton("F[F]", &p);
        // Trunk, collar, branch.
        let radii = segment_radii(&skel, 6);
        assert_eq!(radii.len(), 3);
        let branch_r = 0.1 * 0.7;
        assert!((radii[1].0 - branch_r * 1.4).abs() < 1e-5, "collar flare {}", radii[1].0);
        assert!((radii[1].1 - branch_r).abs() < 1e-5);
        assert!((radii[2].0 - branch_r).abs() < 1e-5);
    }

    #[test]
    fn tip_detection_ignores_rotations_and_depth() {
        let s = "F[+F-F]F[-&F]";
        let bytes = s.as_bytes();
        let tips: Vec<usize> = (0..bytes.len()).filter(|&i| bytes[i] == b'F' && is_branch_tip(bytes, i)).collect();
        assert_eq!(tips, vec![5, 11]);
        assert_eq!(build_skeleton(s, &params()).tips.len(), 2);
    }

    #[test]
    fn pop_restores_position_and_heading() {
        let skel = build_skeleton("F[+F]F", &params());
        // The last F continues straight up from (0,1,0).
        let last = skel.tips.last().unwrap();
        assert!(last.position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
        assert!(last.direction.abs_diff_eq(Vec3::Y, 1e-6));
    }

    #[test]
    fn plus_turns_about_z() {
        let skel = build_skeleton("+F", &TurtleParams { angle: 90.0, ..params() });
        assert!(skel.tips[0].direction.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-5));
    }

    #[test]
    fn rotations_compose_in_local_frame() {
        // Roll 90° then turn: the side axis has rolled onto world X.
        let p = TurtleParams { angle: 90.0, ..params() };
        let skel = build_skeleton("\\+F", &p);
        let d = skel.tips[0].direction;
        assert!(d.abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-5) || d.abs_diff_eq(Vec3::new(0.0, 0.0, 1.0), 1e-5), "{d:?}");
        assert!(d.y.abs() < 1e-5);
    }

    #[test]
    fn stack_balanced_for_presets() {
        for tt in TreeType::ALL {
            let program = Grammar::preset(tt, 3).expand();
            let skel = build_skeleton(&program, &params());
            let opens = program.matches('[').count();
            assert_eq!(skel.stats.pushes, opens, "{tt:?}");
            assert_eq!(skel.stats.pops, skel.stats.pushes, "{tt:?}");
            assert_eq!(skel.stats.final_depth, 0, "{tt:?}");
            assert!(!skel.tips.is_empty(), "{tt:?}");
        }
    }

    #[test]
    fn extra_close_bracket_is_ignored() {
        let skel = build_skeleton("F]]F", &params());
        assert_eq!(skel.stats.ignored_pops, 2);
        assert_eq!(skel.stats.segments, 2);
        assert!(skel.tips.last().unwrap().position.abs_diff_eq(Vec3::new(0.0, 2.0, 0.0), 1e-5));
    }

    #[test]
    fn depth_cap_keeps_brackets_paired() {
        let p = TurtleParams { max_stack_depth: 1, ..params() };
        let skel = build_skeleton("[[F]F]F", &p);
        assert_eq!(skel.stats.dropped_pushes, 1);
        assert_eq!(skel.stats.pushes, 1);
        assert_eq!(skel.stats.pops, 1);
        assert_eq!(skel.stats.final_depth, 0);
        assert_eq!(skel.stats.ignored_pops, 0);
    }

    #[test]
    fn zero_step_length_is_finite() {
        let skel = build_skeleton("F[+F]F", &TurtleParams { step_length: 0.0, ..params() });
        assert!(skel.mesh.vertices.iter().all(|v| v.position.is_finite() && v.normal.is_finite()));
    }

    #[test]
    fn unknown_symbols_are_ignored() {
        let a = build_skeleton("XF[+XF]", &params());
        let b = build_skeleton("F[+F]", &params());
        assert_eq!(a.mesh, b.mesh);
        assert_eq!(a.tips, b.tips);
    }
}
