//! Leaf value types.

use bytemuck::{Pod, Zeroable};
use serde::{Deserialize, Serialize};

use crate::constants::MAX_DATA;

/// Occupancy/material value stored in a leaf node.
///
/// Material 0 is reserved for air (empty space). Values must fit the
/// 30-bit node data field.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable, Serialize, Deserialize,
)]
#[repr(transparent)]
pub struct Material(pub u32);

impl Material {
    /// Air (empty space)
    pub const AIR: Self = Self(0);
    /// Generic filled cell, written by the plain heightmap rule
    pub const SOLID: Self = Self(1);
    /// Stone, shares its id with `SOLID`
    pub const STONE: Self = Self(1);
    /// Dirt
    pub const DIRT: Self = Self(2);
    /// Grass
    pub const GRASS: Self = Self(3);

    /// Returns true if this material is air (empty)
    #[inline]
    pub const fn is_air(self) -> bool {
        self.0 == 0
    }

    /// Returns true if this material is solid (not air)
    #[inline]
    pub const fn is_solid(self) -> bool {
        self.0 != 0
    }

    /// Returns true if the value fits the node data field
    #[inline]
    pub const fn fits(self) -> bool {
        self.0 <= MAX_DATA
    }
}

impl From<bool> for Material {
    fn from(filled: bool) -> Self {
        if filled {
            Self::SOLID
        } else {
            Self::AIR
        }
    }
}
