//! Procedural terrain and L-system tree generation.
//!
//! Every generator here is a pure data transform: parameters go in, vertex
//! buffers and instance transforms come out. Rendering is the caller's job.

pub mod error;
pub mod generator;
pub mod heightfield;
pub mod lsystem;
pub mod mesh;
pub mod noise;
pub mod placement;
pub mod water;

pub use error::SylvaError;
pub use generator::{Invalidation, Scene, SceneBuffers, SceneParams, SceneStats, TreeParams};
pub use heightfield::{HeightSample, Heightfield};
pub use noise::params::TerrainParams;
