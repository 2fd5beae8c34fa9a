//! Helpers that emulate device-side writers in tests.

use terrasvo_core::Material;

use crate::config::OctreeConfig;
use crate::node::Node;
use crate::octree::Octree;

/// Root pointing at eight solid leaves that were never collapsed.
pub(crate) fn uniform_block_tree() -> Octree {
    let mut nodes = vec![Node::internal(1)];
    nodes.extend([Node::leaf(Material::SOLID); 8]);
    Octree::from_nodes(OctreeConfig::new(4), nodes).unwrap()
}

/// Subdivide the leaf at `index` the way dynamic insertion does: append
/// eight copies of its value and point the node at them, without merging.
pub(crate) fn split_leaf(nodes: &mut Vec<Node>, index: usize) {
    let material = nodes[index].material().unwrap();
    let base = nodes.len() as u32;
    nodes.extend([Node::leaf(material); 8]);
    nodes[index] = Node::internal(base);
}

/// Overwrite one leaf value in place.
pub(crate) fn paint_leaf(nodes: &mut [Node], index: usize, material: Material) {
    assert!(nodes[index].is_leaf());
    nodes[index] = Node::leaf(material);
}

/// Indices and cell sizes of every reachable generated leaf.
pub(crate) fn leaves(tree: &Octree) -> Vec<(usize, u32)> {
    fn walk(nodes: &[Node], index: usize, cell_size: u32, out: &mut Vec<(usize, u32)>) {
        let node = nodes[index];
        if !node.is_generated() {
            return;
        }
        match node.first_child() {
            None => out.push((index, cell_size)),
            Some(first) => {
                for i in 0..8 {
                    walk(nodes, first as usize + i, cell_size / 2, out);
                }
            }
        }
    }

    let mut out = Vec::new();
    walk(tree.nodes(), 0, tree.size(), &mut out);
    out
}
