//! Core types and traits for the terrasvo sparse voxel octree.
//!
//! This crate provides the foundational types shared by the other crates:
//! - Leaf material values
//! - Cell coordinates and the fixed octant ordering
//! - Collaborator traits (terrain oracles, GPU buffers)
//! - Error types

pub mod coords;
pub mod error;
pub mod traits;
pub mod types;

pub use coords::{octant_offset, CellPos};
pub use error::{Error, Result};
pub use traits::{DensityField, GpuBuffer, HeightOracle};
pub use types::Material;

/// Octree-wide constants
pub mod constants {
    /// Default lateral extent of the octree in cells
    pub const DEFAULT_SIZE: u32 = 256;
    /// Default node budget (matches the default device buffer allocation)
    pub const DEFAULT_MAX_NODES: usize = 16_777_216;
    /// Vertical bias added to every height oracle sample
    pub const DEFAULT_HEIGHT_BIAS: i32 = 64;
    /// Evaluated cells between two build progress log lines
    pub const PROGRESS_INTERVAL: u64 = 10_000_000;
    /// Width of the node data field in bits
    pub const DATA_BITS: u32 = 30;
    /// Largest value representable in the node data field
    pub const MAX_DATA: u32 = (1 << DATA_BITS) - 1;
    /// Size in bytes of one wire word (the node count and every node record)
    pub const WORD_SIZE: usize = 4;
}
