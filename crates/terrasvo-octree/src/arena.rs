//! Append-only node arena.
//!
//! Nodes are only ever added at the tail, eight at a time, and the most
//! recent block may be given back with [`NodeArena::truncate`].
//!
//! # Depth-first append discipline
//!
//! Callers must reserve a node's children immediately before recursing into
//! them, and may only truncate back to a length taken *before* such a
//! reservation once every recursion below it has returned. Under that
//! discipline the block being reclaimed is always the tail of the arena and
//! no live node refers into it. Callers hold indices, never references,
//! across calls that may grow the arena.

use terrasvo_core::{Error, Result};

use crate::node::Node;

/// Growable, index-addressed node storage with a hard node budget.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct NodeArena {
    nodes: Vec<Node>,
    limit: usize,
}

impl NodeArena {
    /// Create an empty arena that may hold at most `limit` nodes.
    pub fn new(limit: usize) -> Self {
        Self {
            nodes: Vec::new(),
            limit,
        }
    }

    /// Adopt an existing node array.
    pub fn from_nodes(nodes: Vec<Node>, limit: usize) -> Result<Self> {
        if nodes.len() > limit {
            return Err(Error::CapacityExceeded {
                requested: nodes.len(),
                limit,
            });
        }
        Ok(Self { nodes, limit })
    }

    /// Append `count` ungenerated slots and return the index of the first.
    pub fn reserve(&mut self, count: usize) -> Result<u32> {
        let base = self.nodes.len();
        let requested = base + count;
        if requested > self.limit {
            return Err(Error::CapacityExceeded {
                requested,
                limit: self.limit,
            });
        }
        self.nodes.resize(requested, Node::EMPTY_SLOT);
        Ok(base as u32)
    }

    /// Drop every node at index `len` and above.
    #[inline]
    pub fn truncate(&mut self, len: usize) {
        debug_assert!(len <= self.nodes.len());
        self.nodes.truncate(len);
    }

    /// Node at `index`, if it exists.
    #[inline]
    pub fn get(&self, index: u32) -> Option<Node> {
        self.nodes.get(index as usize).copied()
    }

    /// Overwrite the node at `index`.
    ///
    /// # Panics
    /// Panics if `index` was never reserved.
    #[inline]
    pub fn set(&mut self, index: u32, node: Node) {
        self.nodes[index as usize] = node;
    }

    /// Number of nodes.
    #[inline]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns true if no node was ever reserved.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Node budget.
    #[inline]
    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Drop every node.
    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    /// All nodes in array order.
    #[inline]
    pub fn as_slice(&self) -> &[Node] {
        &self.nodes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrasvo_core::Material;

    #[test]
    fn reserve_appends_ungenerated_slots() {
        let mut arena = NodeArena::new(16);
        assert_eq!(arena.reserve(1).unwrap(), 0);
        assert_eq!(arena.reserve(8).unwrap(), 1);
        assert_eq!(arena.len(), 9);
        assert!(arena.as_slice().iter().all(|n| !n.is_generated()));
    }

    #[test]
    fn truncate_reclaims_tail_block() {
        let mut arena = NodeArena::new(32);
        arena.reserve(1).unwrap();
        let base = arena.reserve(8).unwrap();
        arena.set(base, Node::leaf(Material::SOLID));
        arena.truncate(base as usize);
        assert_eq!(arena.len(), 1);

        // The reclaimed block is handed out again.
        assert_eq!(arena.reserve(8).unwrap(), base);
        assert_eq!(arena.get(base), Some(Node::EMPTY_SLOT));
    }

    #[test]
    fn reserve_respects_limit() {
        let mut arena = NodeArena::new(8);
        arena.reserve(1).unwrap();
        let err = arena.reserve(8).unwrap_err();
        assert!(matches!(
            err,
            Error::CapacityExceeded {
                requested: 9,
                limit: 8
            }
        ));
        assert_eq!(arena.len(), 1);
    }

    #[test]
    fn from_nodes_checks_limit() {
        assert!(NodeArena::from_nodes(vec![Node::EMPTY_SLOT; 4], 3).is_err());
        let arena = NodeArena::from_nodes(vec![Node::EMPTY_SLOT; 3], 3).unwrap();
        assert_eq!(arena.len(), 3);
        assert_eq!(arena.get(3), None);
    }
}
