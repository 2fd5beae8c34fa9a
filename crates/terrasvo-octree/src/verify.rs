//! Read-only structural verification.
//!
//! The device may append nodes without applying the merge rule, so a
//! downloaded tree can hold internal nodes that should have collapsed. The
//! verifier walks the reachable tree and counts them, along with pointers
//! that could not have been produced by a well-behaved writer.

use std::fmt;

use hashbrown::HashSet;
use terrasvo_core::Material;
use tracing::{debug, warn};

use crate::node::{merged, Node};
use crate::octree::Octree;

/// Counts gathered by [`Octree::check`].
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CheckReport {
    /// Generated nodes reachable from the root.
    pub reachable: usize,
    /// Internal nodes whose whole subtree resolves to one value.
    pub redundant: usize,
    /// Reachable slots not marked generated.
    pub ungenerated: usize,
    /// Child blocks outside the array, or below unit cell size.
    pub dangling: usize,
    /// Child blocks reached from more than one parent.
    pub aliased: usize,
    /// Deepest level reached (root = 0).
    pub max_depth: u32,
}

impl CheckReport {
    /// Returns true if the tree is minimal and every pointer is sound.
    pub fn is_clean(&self) -> bool {
        self.redundant == 0 && self.dangling == 0 && self.aliased == 0
    }
}

impl fmt::Display for CheckReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} reachable, {} redundant, {} ungenerated, {} dangling, {} aliased, depth {}",
            self.reachable,
            self.redundant,
            self.ungenerated,
            self.dangling,
            self.aliased,
            self.max_depth
        )
    }
}

impl Octree {
    /// Walk the reachable tree and report invariant violations.
    ///
    /// Never fails and never mutates the tree.
    pub fn check(&self) -> CheckReport {
        let mut verifier = Verifier {
            nodes: self.nodes.as_slice(),
            report: CheckReport::default(),
            visited_blocks: HashSet::new(),
        };
        verifier.visit(0, self.config.size, 0);
        let report = verifier.report;

        if report.is_clean() {
            debug!("Octree check: {}", report);
        } else {
            warn!("Octree check: {}", report);
        }
        report
    }
}

struct Verifier<'a> {
    nodes: &'a [Node],
    report: CheckReport,
    visited_blocks: HashSet<u32>,
}

impl Verifier<'_> {
    /// Returns the subtree's uniform value, or `None` if it is not uniform
    /// or not fully generated.
    fn visit(&mut self, index: u32, cell_size: u32, depth: u32) -> Option<Material> {
        let Some(&node) = self.nodes.get(index as usize) else {
            self.report.dangling += 1;
            return None;
        };
        if !node.is_generated() {
            self.report.ungenerated += 1;
            return None;
        }

        self.report.reachable += 1;
        self.report.max_depth = self.report.max_depth.max(depth);
        if node.is_leaf() {
            return Some(Material(node.data()));
        }

        let base = node.data();
        if cell_size <= 1 || base as usize + 8 > self.nodes.len() {
            self.report.dangling += 1;
            return None;
        }
        if !self.visited_blocks.insert(base) {
            // Shared block, already counted; also stops cycles.
            self.report.aliased += 1;
            return None;
        }

        let mut children = [None; 8];
        for (i, child) in children.iter_mut().enumerate() {
            *child = self.visit(base + i as u32, cell_size / 2, depth + 1);
        }

        let value = merged(&children);
        if value.is_some() {
            self.report.redundant += 1;
        }
        value
    }
}
