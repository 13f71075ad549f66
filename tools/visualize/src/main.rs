//! Diagnostic visualizer: writes three PNG debug images to data/debug/.
//! Not part of the main pipeline; no tests.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use sylva_core::{Scene, SceneParams, TerrainParams, TreeParams};

const RES: u32 = 256;

// ── Colour helpers ────────────────────────────────────────────────────────────

/// Height in [0, 1] → water-to-snow ramp.
fn height_color(t: f32) -> [u8; 3] {
    let t = t.clamp(0.0, 1.0);
    let stops: [(f32, [f32; 3]); 4] = [
        (0.0, [30.0, 60.0, 140.0]),
        (0.35, [70.0, 140.0, 60.0]),
        (0.7, [120.0, 100.0, 80.0]),
        (1.0, [245.0, 245.0, 245.0]),
    ];
    for pair in stops.windows(2) {
        let (t0, c0) = pair[0];
        let (t1, c1) = pair[1];
        if t <= t1 {
            let f = (t - t0) / (t1 - t0);
            return [0, 1, 2].map(|k| (c0[k] + (c1[k] - c0[k]) * f) as u8);
        }
    }
    [245, 245, 245]
}

/// Unit normal → RGB, the usual normal-map encoding.
fn normal_color(n: [f32; 3]) -> [u8; 3] {
    n.map(|c| ((c * 0.5 + 0.5).clamp(0.0, 1.0) * 255.0) as u8)
}

fn save(img: &image::RgbImage, dir: &Path, name: &str) -> Result<()> {
    let path = dir.join(name);
    img.save(&path).with_context(|| format!("failed to save {name}"))?;
    println!("Wrote {}", path.display());
    Ok(())
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let params = SceneParams {
        terrain: TerrainParams { seed: 42, mesh_resolution: RES, ..TerrainParams::default() },
        trees: TreeParams { tree_count: 120, ..TreeParams::default() },
        ..SceneParams::default()
    };

    println!("Generating scene ({RES}×{RES})…");
    let scene = Scene::new(params)?;
    let hf = scene.heightfield();
    let n = hf.resolution();
    let (lo, hi) = (hf.min_height(), hf.max_height());
    let span = (hi - lo).max(1e-6);

    let out_dir = Path::new("data/debug");
    fs::create_dir_all(out_dir).context("cannot create data/debug/")?;

    // ── 1. heightmap.png ─────────────────────────────────────────────────────
    let mut heights = image::RgbImage::new(n as u32, n as u32);
    for i in 0..n {
        for j in 0..n {
            // i runs along X, j along Z; −Z is the top row.
            let t = (hf.get(i, j).position.y - lo) / span;
            heights.put_pixel(i as u32, j as u32, image::Rgb(height_color(t)));
        }
    }
    save(&heights, out_dir, "heightmap.png")?;

    // ── 2. normals.png ───────────────────────────────────────────────────────
    let mut normals = image::RgbImage::new(n as u32, n as u32);
    for i in 0..n {
        for j in 0..n {
            normals.put_pixel(i as u32, j as u32, image::Rgb(normal_color(hf.get(i, j).normal.to_array())));
        }
    }
    save(&normals, out_dir, "normals.png")?;

    // ── 3. placement.png (leaves in green, trunks in red, over the heightmap) ─
    let mut placement = heights.clone();
    let scale = hf.params().mesh_scale;
    let to_px = |c: f32| (((c / scale + 1.0) * 0.5) * (n as f32 - 1.0)).round() as i64;
    let in_bounds = |x: i64, y: i64| (0..n as i64).contains(&x) && (0..n as i64).contains(&y);
    for leaf in &scene.placement().leaves {
        let (x, y) = (to_px(leaf.w_axis.x), to_px(leaf.w_axis.z));
        if in_bounds(x, y) {
            placement.put_pixel(x as u32, y as u32, image::Rgb([40, 200, 60]));
        }
    }
    for tree in &scene.placement().trees {
        let (cx, cy) = (to_px(tree.position.x), to_px(tree.position.z));
        let radius = (tree.scale * 1.5).ceil() as i64;
        for dy in -radius..=radius {
            for dx in -radius..=radius {
                let (x, y) = (cx + dx, cy + dy);
                if dx * dx + dy * dy <= radius * radius && in_bounds(x, y) {
                    placement.put_pixel(x as u32, y as u32, image::Rgb([220, 30, 30]));
                }
            }
        }
    }
    save(&placement, out_dir, "placement.png")?;

    println!("Done.");
    Ok(())
}
