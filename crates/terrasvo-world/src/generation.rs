//! Procedural terrain generation.

use std::ops::RangeInclusive;

use noise::{Fbm, MultiFractal, NoiseFn, Perlin};
use serde::{Deserialize, Serialize};
use terrasvo_core::{DensityField, HeightOracle};

use crate::WorldSeed;

/// Terrain generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerrainConfig {
    /// Seed for noise generation.
    pub seed: WorldSeed,
    /// Height of the lowest possible surface.
    pub sea_level: i32,
    /// Horizontal scale of terrain features.
    pub terrain_scale: f64,
    /// Maximum terrain height variation.
    pub terrain_height: f64,
    /// Number of noise octaves for detail.
    pub octaves: usize,
    /// Frequency multiplier between octaves.
    pub lacunarity: f64,
    /// Amplitude multiplier between octaves.
    pub persistence: f64,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            sea_level: 0,
            terrain_scale: 100.0,
            terrain_height: 64.0,
            octaves: 4,
            lacunarity: 2.0,
            persistence: 0.5,
        }
    }
}

/// Seeded fractal Perlin source shared by the height and density generators.
fn fbm(seed: WorldSeed, octaves: usize, lacunarity: f64, persistence: f64) -> Fbm<Perlin> {
    Fbm::<Perlin>::new(seed as u32)
        .set_octaves(octaves)
        .set_lacunarity(lacunarity)
        .set_persistence(persistence)
}

/// Fractal Perlin heightfield.
///
/// Every column height lies in [`height_range`](Self::height_range).
pub struct TerrainGenerator {
    config: TerrainConfig,
    height_noise: Fbm<Perlin>,
}

impl TerrainGenerator {
    pub fn new(config: TerrainConfig) -> Self {
        let height_noise = fbm(
            config.seed,
            config.octaves,
            config.lacunarity,
            config.persistence,
        );
        Self {
            config,
            height_noise,
        }
    }

    /// Default terrain shape for `seed`.
    pub fn with_seed(seed: WorldSeed) -> Self {
        Self::new(TerrainConfig {
            seed,
            ..TerrainConfig::default()
        })
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Lowest and highest column height this generator can return.
    pub fn height_range(&self) -> RangeInclusive<i32> {
        let low = self.config.sea_level;
        low..=low + self.config.terrain_height as i32
    }
}

impl HeightOracle for TerrainGenerator {
    fn height_at(&self, x: i64, z: i64) -> i32 {
        let point = [
            x as f64 / self.config.terrain_scale,
            z as f64 / self.config.terrain_scale,
        ];
        // [-1, 1] noise lifted to [0, terrain_height] above sea level.
        let unit = (self.height_noise.get(point).clamp(-1.0, 1.0) + 1.0) * 0.5;
        self.config.sea_level + (unit * self.config.terrain_height) as i32
    }
}

/// Density field configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DensityConfig {
    /// Seed for noise generation.
    pub seed: WorldSeed,
    /// Spatial scale of density features.
    pub scale: f64,
    /// Number of noise octaves.
    pub octaves: usize,
    /// Multiplier applied to the raw [-1, 1] noise.
    pub amplitude: f64,
}

impl Default for DensityConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            scale: 32.0,
            octaves: 3,
            amplitude: 1.0,
        }
    }
}

/// 3-D fractal Perlin density for the volumetric build variant.
pub struct DensityGenerator {
    config: DensityConfig,
    noise: Fbm<Perlin>,
}

impl DensityGenerator {
    /// Create a density generator with the given configuration.
    pub fn new(config: DensityConfig) -> Self {
        let noise = fbm(config.seed, config.octaves, 2.0, 0.5);
        Self { config, noise }
    }

    /// Get the density configuration.
    pub fn config(&self) -> &DensityConfig {
        &self.config
    }
}

impl DensityField for DensityGenerator {
    fn density_at(&self, x: i64, y: i64, z: i64) -> f64 {
        let scale = self.config.scale;
        let point = [x as f64 / scale, y as f64 / scale, z as f64 / scale];
        self.noise.get(point) * self.config.amplitude
    }
}

/// Constant-height terrain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlatTerrain(pub i32);

impl HeightOracle for FlatTerrain {
    fn height_at(&self, _x: i64, _z: i64) -> i32 {
        self.0
    }
}
