/// Headless scene generator: builds terrain, trees and placement from a
/// params file and prints a summary, optionally dumping the render buffers.

mod logging;

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use sylva_core::lsystem::TreeType;
use sylva_core::{Scene, SceneParams};

#[derive(Parser, Debug)]
#[command(name = "sylva", about = "Procedural terrain and L-system tree generator")]
struct Args {
    /// Scene params JSON. Missing fields take their defaults.
    #[arg(short, long)]
    params: Option<PathBuf>,

    /// Terrain seed.
    #[arg(long)]
    seed: Option<u32>,

    /// Tree preset index: 0 simple, 1 bushy, 2 willow, 3 3D.
    #[arg(long)]
    tree_type: Option<i64>,

    #[arg(long)]
    iterations: Option<u32>,

    #[arg(long)]
    tree_count: Option<u32>,

    /// Terrain vertices per side.
    #[arg(long)]
    resolution: Option<u32>,

    /// Write the render buffers as JSON here.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Print the effective params and exit.
    #[arg(long)]
    dump_params: bool,

    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    /// Load the params file (or defaults) and apply command-line overrides.
    fn scene_params(&self) -> Result<SceneParams> {
        let mut params = match &self.params {
            Some(path) => {
                let json = fs::read_to_string(path)
                    .with_context(|| format!("reading {}", path.display()))?;
                SceneParams::from_json_str(&json)
                    .with_context(|| format!("parsing {}", path.display()))?
            }
            None => SceneParams::default(),
        };

        if let Some(seed) = self.seed {
            params.terrain.seed = seed;
        }
        if let Some(resolution) = self.resolution {
            params.terrain.mesh_resolution = resolution;
        }
        if let Some(index) = self.tree_type {
            params.trees.tree_type = TreeType::from_index(index)?;
        }
        if let Some(iterations) = self.iterations {
            params.trees.iterations = iterations;
        }
        if let Some(count) = self.tree_count {
            params.trees.tree_count = count;
        }
        params.validate().context("invalid parameters")?;
        Ok(params)
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_logging(args.verbose);

    let params = args.scene_params()?;
    if args.dump_params {
        println!("{}", params.to_json_string()?);
        return Ok(());
    }

    let scene = Scene::new(params)?;
    let stats = scene.stats();
    println!("terrain:  {} vertices, height {:.3}..{:.3}", stats.terrain_vertices, stats.min_height, stats.max_height);
    println!(
        "tree:     {} ({} symbols, {} triangles, {} tips)",
        scene.params().trees.tree_type.label(),
        stats.program_length,
        stats.skeleton_triangles,
        stats.branch_tips
    );
    println!("scatter:  {} trees, {} leaves", stats.trees, stats.leaves);

    if let Some(path) = &args.output {
        let json = serde_json::to_string(&scene.buffers())?;
        fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
        tracing::info!(path = %path.display(), "buffers written");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn overrides_apply_on_top_of_defaults() {
        let args = Args::try_parse_from(["sylva", "--seed", "9", "--tree-type", "2", "--tree-count", "5"]).unwrap();
        let params = args.scene_params().unwrap();
        assert_eq!(params.terrain.seed, 9);
        assert_eq!(params.trees.tree_type, TreeType::Willow);
        assert_eq!(params.trees.tree_count, 5);
        assert_eq!(params.water, SceneParams::default().water);
    }

    #[test]
    fn unknown_tree_type_is_rejected() {
        let args = Args::try_parse_from(["sylva", "--tree-type", "7"]).unwrap();
        assert!(args.scene_params().is_err());
    }

    #[test]
    fn out_of_range_override_is_rejected() {
        let args = Args::try_parse_from(["sylva", "--iterations", "40"]).unwrap();
        let err = args.scene_params().unwrap_err();
        assert!(format!("{err:#}").contains("iterations"));
    }

    #[test]
    fn missing_params_file_names_path() {
        let args = Args::try_parse_from(["sylva", "--params", "/nonexistent/scene.json"]).unwrap();
        let err = args.scene_params().unwrap_err();
        assert!(err.to_string().contains("/nonexistent/scene.json"));
    }
}
