//! Tapered cylinder (frustum) emission.

use glam::{Vec2, Vec3};
use std::f32::consts::TAU;

use crate::mesh::{MeshBuilder, Vertex};

/// Below this length a cross product is treated as degenerate.
const PARALLEL_EPSILON: f32 = 1e-3;

/// Orthonormal `(right, up)` pair perpendicular to `direction`.
///
/// Crosses with +X, or with +Z when `direction` is (nearly) parallel to +X.
pub fn perpendicular_frame(direction: Vec3) -> (Vec3, Vec3) {
    let mut right = direction.cross(Vec3::X);
    if right.length() < PARALLEL_EPSILON {
        right = direction.cross(Vec3::Z);
    }
    let right = right.normalize();
    let up = direction.cross(right).normalize();
    (right, up)
}

/// Append an open frustum from `start` to `end` with `sides` quads.
///
/// Normals come from the circle parameterisation and point away from the
/// axis. U runs around the circumference, V is 0 at `start` and 1 at `end`.
/// A zero-length segment falls back to a +Y axis and yields zero-area
/// faces rather than NaNs.
pub fn add_cylinder(
    mb: &mut MeshBuilder,
    start: Vec3,
    end: Vec3,
    start_radius: f32,
    end_radius: f32,
    sides: u32,
) {
    let direction = (end - start).try_normalize().unwrap_or(Vec3::Y);
    let (right, up) = perpendicular_frame(direction);
    let sides_f = sides as f32;

    for i in 0..sides {
        let a1 = TAU * i as f32 / sides_f;
        let a2 = TAU * (i + 1) as f32 / sides_f;
        let n1 = (a1.cos() * right + a1.sin() * up).normalize();
        let n2 = (a2.cos() * right + a2.sin() * up).normalize();
        let u1 = i as f32 / sides_f;
        let u2 = (i + 1) as f32 / sides_f;

        let base = mb.next_index();
        mb.push_vertex(Vertex::new(start + start_radius * n1, n1, Vec2::new(u1, 0.0)));
        mb.push_vertex(Vertex::new(start + start_radius * n2, n2, Vec2::new(u2, 0.0)));
        mb.push_vertex(Vertex::new(end + end_radius * n1, n1, Vec2::new(u1, 1.0)));
        mb.push_vertex(Vertex::new(end + end_radius * n2, n2, Vec2::new(u2, 1.0)));
        mb.push_indices(&[base, base + 1, base + 2, base + 1, base + 3, base + 2]);
    }
}
