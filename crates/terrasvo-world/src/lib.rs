//! Terrain oracles for the terrasvo octree builder.
//!
//! Every generator here is a pure function of its configuration, so the
//! builder can sample it from several threads.

pub mod generation;
pub mod value_noise;

pub use generation::{DensityConfig, DensityGenerator, FlatTerrain, TerrainConfig, TerrainGenerator};
pub use value_noise::{ValueNoiseConfig, ValueNoiseTerrain};

/// World seed for procedural generation.
pub type WorldSeed = u64;
