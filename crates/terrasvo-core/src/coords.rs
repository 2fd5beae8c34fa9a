//! Cell coordinates and the fixed octant ordering.
//!
//! Children of an internal node are stored in octant order: x varies
//! fastest, then y, then z. Octant `i` has bit 0 = x, bit 1 = y, bit 2 = z.

use bytemuck::{Pod, Zeroable};
use glam::UVec3;
use serde::{Deserialize, Serialize};

/// Offset of octant `index` inside a cell whose children have edge `half`.
#[inline]
pub const fn octant_offset(index: usize, half: u32) -> (u32, u32, u32) {
    (
        (index & 1) as u32 * half,
        ((index >> 1) & 1) as u32 * half,
        ((index >> 2) & 1) as u32 * half,
    )
}

/// Integer position of a unit cell inside the octree cube.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(C)]
pub struct CellPos {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl CellPos {
    /// Create a new cell position
    #[inline]
    pub const fn new(x: u32, y: u32, z: u32) -> Self {
        Self { x, y, z }
    }

    /// Returns true if the cell lies inside a cube of edge `size`
    #[inline]
    pub const fn within(self, size: u32) -> bool {
        self.x < size && self.y < size && self.z < size
    }

    /// Child octant containing this cell, for a node whose children have edge `half`.
    ///
    /// `half` must be a power of two.
    #[inline]
    pub const fn octant(self, half: u32) -> usize {
        let xi = ((self.x & half) != 0) as usize;
        let yi = ((self.y & half) != 0) as usize;
        let zi = ((self.z & half) != 0) as usize;
        xi | (yi << 1) | (zi << 2)
    }

    /// Sequence of child octants from the root down to this cell.
    #[inline]
    pub fn to_octree_path(self, depth: u32) -> impl Iterator<Item = u8> {
        (0..depth).rev().map(move |level| self.octant(1 << level) as u8)
    }

    /// Convert to glam UVec3
    #[inline]
    pub const fn to_uvec3(self) -> UVec3 {
        UVec3::new(self.x, self.y, self.z)
    }
}

impl From<UVec3> for CellPos {
    fn from(v: UVec3) -> Self {
        Self::new(v.x, v.y, v.z)
    }
}
