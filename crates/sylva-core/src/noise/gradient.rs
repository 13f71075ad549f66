//! Hash-based 2D gradient noise.
//!
//! Each lattice corner gets a pseudo-random unit gradient from an integer
//! hash of its coordinates; the four corner contributions are blended with a
//! cubic smoothstep. The lattice carries no seed of its own: variation
//! between seeds comes from the per-octave offsets in [`super::fbm`].

use glam::{IVec2, Vec2};
use std::f32::consts::TAU;

/// Pseudo-random value in [0, 1] for a lattice corner.
///
/// Multiply-xor-shift mix; all arithmetic wraps so the function is total.
#[inline]
pub fn hash_corner(corner: IVec2) -> f32 {
    let mut n = corner.x.wrapping_mul(17).wrapping_add(corner.y.wrapping_mul(57));
    n = (n << 13) ^ n;
    let mixed = n
        .wrapping_mul(n.wrapping_mul(n).wrapping_mul(255_179).wrapping_add(98_712_751))
        .wrapping_add(1_576_546_427);
    // Drop the sign bit, then scale by i32::MAX.
    (mixed & i32::MAX) as f32 / i32::MAX as f32
}

/// Unit gradient for a lattice corner.
#[inline]
pub fn hash_gradient(corner: IVec2) -> Vec2 {
    let angle = hash_corner(corner) * TAU;
    Vec2::new(angle.cos(), angle.sin())
}

/// Single-octave gradient noise at `pos`. Output lies in roughly [-0.71, 0.71].
pub fn gradient_noise(pos: Vec2) -> f32 {
    let grid = pos.floor();
    // The cast saturates far from the origin; corner offsets wrap with it.
    let cell = grid.as_ivec2();
    let frac = pos - grid;
    let smooth = frac * frac * (Vec2::splat(3.0) - 2.0 * frac);

    let bl = hash_gradient(cell).dot(frac);
    let br = hash_gradient(cell.wrapping_add(IVec2::new(1, 0))).dot(frac - Vec2::new(1.0, 0.0));
    let tl = hash_gradient(cell.wrapping_add(IVec2::new(0, 1))).dot(frac - Vec2::new(0.0, 1.0));
    let tr = hash_gradient(cell.wrapping_add(IVec2::new(1, 1))).dot(frac - Vec2::new(1.0, 1.0));

    let bottom = lerp(bl, br, smooth.x);
    let top = lerp(tl, tr, smooth.x);
    lerp(bottom, top, smooth.y)
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}
