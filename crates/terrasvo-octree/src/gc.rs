//! Compaction of a possibly non-minimal tree.
//!
//! [`Octree::gc`] copies the reachable, generated part of a tree into a fresh
//! arena, re-applying the builder's merge rule on the way. It is the only way
//! space taken by unmerged device-side growth or unreachable slots is given
//! back; the source is never modified and callers swap the result in.

use terrasvo_core::{Error, Material, Result};
use tracing::info;

use crate::arena::NodeArena;
use crate::node::{merged, Node};
use crate::octree::Octree;

impl Octree {
    /// Produce a compact copy of this tree.
    ///
    /// Ungenerated slots are copied as they are but never descended into.
    /// Fails only if a reachable pointer leaves the array or an internal node
    /// sits at unit cell size.
    pub fn gc(&self) -> Result<Octree> {
        let mut dest = NodeArena::new(self.config.max_nodes);
        let root = dest.reserve(1)?;

        let mut compactor = Compactor {
            source: self.nodes.as_slice(),
            dest: &mut dest,
        };
        compactor.copy_node(0, root, self.config.size)?;

        info!(
            "Octree compacted: {} -> {} nodes",
            self.nodes.len(),
            dest.len()
        );
        Ok(self.with_arena(dest))
    }
}

struct Compactor<'a> {
    source: &'a [Node],
    dest: &'a mut NodeArena,
}

impl Compactor<'_> {
    /// Copy the subtree at `src` into the reserved slot `dst`. Returns the
    /// written subtree's uniform value, if it resolved to a single leaf.
    fn copy_node(&mut self, src: u32, dst: u32, cell_size: u32) -> Result<Option<Material>> {
        let node = self.source.get(src as usize).copied().ok_or_else(|| {
            Error::InvalidData(format!(
                "node {} is outside the {}-node array",
                src,
                self.source.len()
            ))
        })?;

        self.dest.set(dst, node);
        if !node.is_generated() {
            return Ok(None);
        }
        if node.is_leaf() {
            return Ok(Some(Material(node.data())));
        }

        let first = node.data();
        if cell_size <= 1 {
            return Err(Error::InvalidData(format!(
                "node {src} is internal at unit cell size"
            )));
        }
        if first as usize + 8 > self.source.len() {
            return Err(Error::InvalidData(format!(
                "node {} points at children {}..{} past the {}-node array",
                src,
                first,
                first as usize + 8,
                self.source.len()
            )));
        }

        // Destination slots are addressed by index; the arena may reallocate
        // while the children are copied.
        let mark = self.dest.len();
        let base = self.dest.reserve(8)?;
        let mut children = [None; 8];
        for (i, child) in children.iter_mut().enumerate() {
            *child = self.copy_node(first + i as u32, base + i as u32, cell_size / 2)?;
        }

        if let Some(material) = merged(&children) {
            debug_assert_eq!(self.dest.len(), mark + 8);
            self.dest.truncate(mark);
            self.dest.set(dst, Node::leaf(material));
            Ok(Some(material))
        } else {
            self.dest.set(dst, Node::internal(base));
            Ok(None)
        }
    }
}
