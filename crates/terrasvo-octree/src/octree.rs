//! The linear octree and its accessors.

use glam::UVec3;
use terrasvo_core::constants::WORD_SIZE;
use terrasvo_core::{CellPos, Error, Material, Result};

use crate::arena::NodeArena;
use crate::config::OctreeConfig;
use crate::node::Node;

/// Summary of a node array.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct OctreeStats {
    /// Total slots in the array.
    pub nodes: usize,
    /// Generated internal nodes.
    pub internal: usize,
    /// Generated leaves.
    pub leaves: usize,
    /// Generated leaves holding a non-air material.
    pub filled_leaves: usize,
    /// Slots not marked generated.
    pub ungenerated: usize,
    /// Bytes needed to upload the array.
    pub wire_bytes: usize,
}

/// Sparse voxel octree stored as a flat node array.
///
/// Index 0 is always the root. An internal node's children occupy
/// `nodes[data..data + 8]` in octant order (x fastest, then y, then z).
#[derive(Clone, Debug)]
pub struct Octree {
    pub(crate) config: OctreeConfig,
    /// Per-column surface height (bias applied), indexed `z * size + x`.
    pub(crate) heightmap: Vec<i32>,
    pub(crate) nodes: NodeArena,
}

impl Octree {
    /// Create an octree holding a single ungenerated root.
    pub fn new(config: OctreeConfig) -> Result<Self> {
        config.validate()?;
        let mut nodes = NodeArena::new(config.max_nodes);
        nodes.reserve(1)?;
        Ok(Self {
            config,
            heightmap: Vec::new(),
            nodes,
        })
    }

    /// Adopt an existing node array, e.g. a hand-built or downloaded tree.
    pub fn from_nodes(config: OctreeConfig, nodes: Vec<Node>) -> Result<Self> {
        config.validate()?;
        if nodes.is_empty() {
            return Err(Error::InvalidData("node array has no root".to_string()));
        }
        let nodes = NodeArena::from_nodes(nodes, config.max_nodes)?;
        Ok(Self {
            config,
            heightmap: Vec::new(),
            nodes,
        })
    }

    /// Build a sibling tree sharing this tree's configuration and heightmap.
    pub(crate) fn with_arena(&self, nodes: NodeArena) -> Self {
        Self {
            config: self.config.clone(),
            heightmap: self.heightmap.clone(),
            nodes,
        }
    }

    /// Get the configuration.
    pub fn config(&self) -> &OctreeConfig {
        &self.config
    }

    /// Lateral extent in cells.
    pub fn size(&self) -> u32 {
        self.config.size
    }

    /// Vertical build ceiling.
    pub fn height(&self) -> u32 {
        self.config.height
    }

    /// All nodes in array order.
    pub fn nodes(&self) -> &[Node] {
        self.nodes.as_slice()
    }

    /// Number of nodes in the array.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Node at `index`, if it exists.
    pub fn node(&self, index: u32) -> Option<Node> {
        self.nodes.get(index)
    }

    /// The root node.
    pub fn root(&self) -> Node {
        self.nodes.get(0).unwrap_or(Node::EMPTY_SLOT)
    }

    /// Cached heightmap from the last `generate`, empty before that.
    pub fn heightmap(&self) -> &[i32] {
        &self.heightmap
    }

    /// Cached surface height of column `(x, z)`.
    pub fn column_height(&self, x: u32, z: u32) -> Option<i32> {
        if x >= self.config.size || z >= self.config.size {
            return None;
        }
        let index = z as usize * self.config.size as usize + x as usize;
        self.heightmap.get(index).copied()
    }

    /// Resolve the value of one unit cell by descending from the root.
    ///
    /// Returns `None` outside the cube, or when the descent reaches an
    /// ungenerated or malformed node.
    pub fn sample(&self, pos: impl Into<CellPos>) -> Option<Material> {
        let pos = pos.into();
        if !pos.within(self.config.size) {
            return None;
        }

        let mut index = 0u32;
        let mut half = self.config.size / 2;
        loop {
            let node = self.nodes.get(index)?;
            if !node.is_generated() {
                return None;
            }
            if node.is_leaf() {
                return Some(Material(node.data()));
            }
            if half == 0 {
                // Internal node at unit size
                return None;
            }
            index = node.data() + pos.octant(half) as u32;
            half /= 2;
        }
    }

    /// Convenience wrapper around [`Octree::sample`] for glam vectors.
    pub fn sample_uvec3(&self, pos: UVec3) -> Option<Material> {
        self.sample(CellPos::from(pos))
    }

    /// Count node kinds over the whole array.
    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats {
            nodes: self.nodes.len(),
            wire_bytes: (self.nodes.len() + 1) * WORD_SIZE,
            ..Default::default()
        };
        for node in self.nodes.as_slice() {
            if !node.is_generated() {
                stats.ungenerated += 1;
            } else if node.is_leaf() {
                stats.leaves += 1;
                if node.data() != 0 {
                    stats.filled_leaves += 1;
                }
            } else {
                stats.internal += 1;
            }
        }
        stats
    }
}
