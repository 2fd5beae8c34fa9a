//! Integer-hash value noise.
//!
//! Lattice values come from a 64-bit integer hash of the lattice point and
//! lie in `[0, 128)`. They are interpolated (bilinearly in 2-D, trilinearly
//! in 3-D) and summed over five octaves, doubling the frequency and halving
//! the amplitude each time, for a fractal value in `[0, 256)`.

use serde::{Deserialize, Serialize};
use terrasvo_core::{DensityField, HeightOracle};

use crate::WorldSeed;

const OCTAVES: u32 = 5;

#[inline]
fn hash_noise(mut h: i64) -> f64 {
    h = (h >> 13) ^ h;
    let mixed = h
        .wrapping_mul(h.wrapping_mul(h).wrapping_mul(15731).wrapping_add(789_221))
        .wrapping_add(1_376_312_589);
    (mixed & 0x7fff_ffff) as f64 / 16_777_216.0
}

#[inline]
fn interpolate(a: f64, b: f64, t: f64) -> f64 {
    a * (1.0 - t) + b * t
}

/// Value noise generator configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValueNoiseConfig {
    /// Seed mixed into every lattice hash.
    pub seed: WorldSeed,
    /// Horizontal scale of the heightfield along x.
    pub scale_x: f64,
    /// Horizontal scale of the heightfield along z.
    pub scale_z: f64,
    /// Scale of the 3-D density field on every axis.
    pub scale_3d: f64,
    /// Multiplier mapping the fractal value to cells of height.
    pub vertical_scale: f64,
    /// Added to every height.
    pub base_height: i32,
}

impl Default for ValueNoiseConfig {
    fn default() -> Self {
        Self {
            seed: 2333,
            scale_x: 64.0,
            scale_z: 64.0,
            scale_3d: 100.0,
            vertical_scale: 0.25,
            base_height: 0,
        }
    }
}

/// Heightfield and density built from hashed lattice noise.
#[derive(Debug, Clone)]
pub struct ValueNoiseTerrain {
    config: ValueNoiseConfig,
    seed_offset: i64,
}

impl ValueNoiseTerrain {
    /// Create a generator with the given configuration.
    pub fn new(config: ValueNoiseConfig) -> Self {
        let seed_offset = (config.seed as i64).wrapping_mul(2_654_435_761);
        Self {
            config,
            seed_offset,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &ValueNoiseConfig {
        &self.config
    }

    /// Lattice value at `(x, y)`, in `[0, 128)`.
    pub fn noise_2d(&self, x: i64, y: i64) -> f64 {
        hash_noise(
            x.wrapping_mul(107)
                .wrapping_add(y.wrapping_mul(13_258_953_287))
                .wrapping_add(self.seed_offset),
        )
    }

    /// Lattice value at `(x, y, z)`, in `[0, 128)`.
    pub fn noise_3d(&self, x: i64, y: i64, z: i64) -> f64 {
        hash_noise(
            x.wrapping_mul(107)
                .wrapping_add(y.wrapping_mul(13_258_953_287))
                .wrapping_add(z.wrapping_mul(11_399_999))
                .wrapping_add(self.seed_offset),
        )
    }

    /// Bilinearly interpolated lattice noise.
    pub fn interpolated_2d(&self, x: f64, y: f64) -> f64 {
        let (ix, fx) = (x.floor() as i64, x - x.floor());
        let (iy, fy) = (y.floor() as i64, y - y.floor());
        let v1 = self.noise_2d(ix, iy);
        let v2 = self.noise_2d(ix + 1, iy);
        let v3 = self.noise_2d(ix, iy + 1);
        let v4 = self.noise_2d(ix + 1, iy + 1);
        interpolate(interpolate(v1, v2, fx), interpolate(v3, v4, fx), fy)
    }

    /// Trilinearly interpolated lattice noise.
    pub fn interpolated_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let (ix, fx) = (x.floor() as i64, x - x.floor());
        let (iy, fy) = (y.floor() as i64, y - y.floor());
        let (iz, fz) = (z.floor() as i64, z - z.floor());
        let plane = |iz: i64| {
            let v1 = self.noise_3d(ix, iy, iz);
            let v2 = self.noise_3d(ix + 1, iy, iz);
            let v3 = self.noise_3d(ix, iy + 1, iz);
            let v4 = self.noise_3d(ix + 1, iy + 1, iz);
            interpolate(interpolate(v1, v2, fx), interpolate(v3, v4, fx), fy)
        };
        interpolate(plane(iz), plane(iz + 1), fz)
    }

    /// Five-octave fractal sum, in `[0, 256)`.
    pub fn fractal_2d(&self, x: f64, y: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        for _ in 0..OCTAVES {
            total += self.interpolated_2d(x * frequency, y * frequency) * amplitude;
            frequency *= 2.0;
            amplitude /= 2.0;
        }
        total
    }

    /// Five-octave fractal sum, in `[0, 256)`.
    pub fn fractal_3d(&self, x: f64, y: f64, z: f64) -> f64 {
        let mut total = 0.0;
        let mut frequency = 1.0;
        let mut amplitude = 1.0;
        for _ in 0..OCTAVES {
            total += self.interpolated_3d(x * frequency, y * frequency, z * frequency) * amplitude;
            frequency *= 2.0;
            amplitude /= 2.0;
        }
        total
    }
}

impl HeightOracle for ValueNoiseTerrain {
    fn height_at(&self, x: i64, z: i64) -> i32 {
        let value = self.fractal_2d(
            x as f64 / self.config.scale_x,
            z as f64 / self.config.scale_z,
        );
        (value * self.config.vertical_scale).floor() as i32 + self.config.base_height
    }
}

impl DensityField for ValueNoiseTerrain {
    /// Fractal value remapped to `[-1, 1)`.
    fn density_at(&self, x: i64, y: i64, z: i64) -> f64 {
        let scale = self.config.scale_3d;
        let value = self.fractal_3d(x as f64 / scale, y as f64 / scale, z as f64 / scale);
        value / 128.0 - 1.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn terrain() -> ValueNoiseTerrain {
        ValueNoiseTerrain::new(ValueNoiseConfig::default())
    }

    #[test]
    fn lattice_values_in_range() {
        let t = terrain();
        for x in -50..50 {
            for y in -50..50 {
                let v = t.noise_2d(x, y);
                assert!((0.0..128.0).contains(&v), "noise_2d({x}, {y}) = {v}");
                let w = t.noise_3d(x, y, x ^ y);
                assert!((0.0..128.0).contains(&w), "noise_3d = {w}");
            }
        }
    }

    #[test]
    fn interpolation_hits_lattice_points() {
        let t = terrain();
        assert_relative_eq!(t.interpolated_2d(3.0, -7.0), t.noise_2d(3, -7));
        assert_relative_eq!(t.interpolated_3d(1.0, 2.0, 3.0), t.noise_3d(1, 2, 3));

        let mid = t.interpolated_2d(3.5, -7.0);
        let (a, b) = (t.noise_2d(3, -7), t.noise_2d(4, -7));
        assert_relative_eq!(mid, (a + b) / 2.0, epsilon = 1e-9);
    }

    #[test]
    fn fractal_in_range() {
        let t = terrain();
        for i in 0..200 {
            let x = i as f64 * 0.37;
            let v = t.fractal_2d(x, -x);
            assert!((0.0..256.0).contains(&v));
            let d = t.density_at(i, i * 2, i * 3);
            assert!((-1.0..1.0).contains(&d));
        }
    }

    #[test]
    fn seed_changes_terrain() {
        let a = terrain();
        let b = ValueNoiseTerrain::new(ValueNoiseConfig {
            seed: 7,
            ..Default::default()
        });
        let differences = (0..100)
            .filter(|&i| a.noise_2d(i, 3 * i) != b.noise_2d(i, 3 * i))
            .count();
        assert!(differences > 90);
    }

    #[test]
    fn heights_follow_config() {
        let t = ValueNoiseTerrain::new(ValueNoiseConfig {
            vertical_scale: 0.5,
            base_height: 10,
            ..Default::default()
        });
        for x in 0..32 {
            let h = t.height_at(x, 2 * x);
            assert!((10..138).contains(&h), "height {h}");
        }
    }
}
