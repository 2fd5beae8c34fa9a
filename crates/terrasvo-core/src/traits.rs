//! Collaborator traits consumed by the octree.
//!
//! Terrain sampling and GPU buffer access are injected rather than called as
//! free functions so the builder and the serializer can be exercised with
//! plain closures and host memory.

use crate::error::Result;

/// Terrain height oracle: maps a column to the y of its surface.
///
/// Implementations must be pure; the builder may sample columns in parallel.
pub trait HeightOracle {
    /// Terrain height of column `(x, z)`.
    fn height_at(&self, x: i64, z: i64) -> i32;
}

impl<F> HeightOracle for F
where
    F: Fn(i64, i64) -> i32,
{
    #[inline]
    fn height_at(&self, x: i64, z: i64) -> i32 {
        self(x, z)
    }
}

/// Continuous 3-D scalar field used by the volumetric build variant.
pub trait DensityField {
    /// Density sampled at cell `(x, y, z)`.
    fn density_at(&self, x: i64, y: i64, z: i64) -> f64;
}

impl<F> DensityField for F
where
    F: Fn(i64, i64, i64) -> f64,
{
    #[inline]
    fn density_at(&self, x: i64, y: i64, z: i64) -> f64 {
        self(x, y, z)
    }
}

/// A linear byte buffer shared with the device.
///
/// Offsets and lengths are in bytes. The device-side atomic node counter is
/// opaque to the host: the host only ever sees the buffer through these
/// three operations.
pub trait GpuBuffer {
    /// Capacity in bytes.
    fn size(&self) -> usize;

    /// Copy `src` into the buffer starting at `offset`.
    fn upload(&mut self, offset: usize, src: &[u8]) -> Result<()>;

    /// Copy `dst.len()` bytes starting at `offset` out of the buffer.
    fn download(&self, offset: usize, dst: &mut [u8]) -> Result<()>;
}
