//! Sparse voxel octree with a linear, GPU-shared node layout.
//!
//! The tree lives in one flat array of packed 32-bit [`Node`]s. It is built
//! host-side by a recursive, merge-collapsing builder, serialized verbatim
//! into a device buffer, possibly grown by the device without merging, and
//! brought back to minimal form by the compactor:
//!
//! ```text
//! generate -> upload -> (device appends) -> download -> check -> gc -> upload
//! ```

pub mod arena;
mod build;
pub mod config;
mod gc;
pub mod node;
pub mod octree;
pub mod verify;
pub mod wire;

#[cfg(test)]
pub(crate) mod testing;

pub use arena::NodeArena;
pub use config::{OctreeConfig, SurfaceRule, VolumetricParams};
pub use node::{merged, Node};
pub use octree::{Octree, OctreeStats};
pub use verify::CheckReport;
