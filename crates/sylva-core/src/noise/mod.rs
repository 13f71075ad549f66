pub mod fbm;
pub mod gradient;
pub mod params;

pub use fbm::{octave_offsets, Fbm};
pub use gradient::{gradient_noise, hash_gradient};
pub use params::TerrainParams;
