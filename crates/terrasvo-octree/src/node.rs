//! Packed 32-bit octree node.
//!
//! Layout of the node word, fixed for host and device alike:
//!
//! | bits   | field       |
//! |--------|-------------|
//! | 31     | `generated` |
//! | 30     | `leaf`      |
//! | 0..30  | `data`      |
//!
//! For a leaf, `data` is the [`Material`]; for an internal node it is the
//! index of the first of its 8 contiguous children. The all-zero word is an
//! ungenerated slot.

use bytemuck::{Pod, Zeroable};
use terrasvo_core::constants::MAX_DATA;
use terrasvo_core::Material;

const GENERATED_BIT: u32 = 1 << 31;
const LEAF_BIT: u32 = 1 << 30;
const DATA_MASK: u32 = MAX_DATA;

/// A node of the linear octree, transmitted to the device verbatim.
#[repr(transparent)]
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Pod, Zeroable)]
pub struct Node(pub u32);

impl Node {
    /// Ungenerated slot.
    pub const EMPTY_SLOT: Self = Self(0);

    /// Create a generated leaf holding `material`.
    #[inline]
    pub const fn leaf(material: Material) -> Self {
        debug_assert!(material.0 <= DATA_MASK);
        Self(GENERATED_BIT | LEAF_BIT | (material.0 & DATA_MASK))
    }

    /// Create a generated internal node whose children start at `first_child`.
    #[inline]
    pub const fn internal(first_child: u32) -> Self {
        debug_assert!(first_child <= DATA_MASK);
        Self(GENERATED_BIT | (first_child & DATA_MASK))
    }

    /// Assemble a node from its three fields.
    #[inline]
    pub const fn from_parts(generated: bool, leaf: bool, data: u32) -> Self {
        debug_assert!(data <= DATA_MASK);
        let mut word = data & DATA_MASK;
        if generated {
            word |= GENERATED_BIT;
        }
        if leaf {
            word |= LEAF_BIT;
        }
        Self(word)
    }

    /// Whether the slot holds valid content.
    #[inline]
    pub const fn is_generated(self) -> bool {
        (self.0 >> 31) & 1 != 0
    }

    /// Whether the node is terminal.
    #[inline]
    pub const fn is_leaf(self) -> bool {
        (self.0 >> 30) & 1 != 0
    }

    /// Raw 30-bit data field.
    #[inline]
    pub const fn data(self) -> u32 {
        self.0 & DATA_MASK
    }

    /// Leaf value, if this is a generated leaf.
    #[inline]
    pub const fn material(self) -> Option<Material> {
        if self.is_generated() && self.is_leaf() {
            Some(Material(self.data()))
        } else {
            None
        }
    }

    /// Index of the first child, if this is a generated internal node.
    #[inline]
    pub const fn first_child(self) -> Option<u32> {
        if self.is_generated() && !self.is_leaf() {
            Some(self.data())
        } else {
            None
        }
    }

    /// Little-endian wire form.
    #[inline]
    pub const fn to_le_bytes(self) -> [u8; 4] {
        self.0.to_le_bytes()
    }

    /// Parse the little-endian wire form.
    #[inline]
    pub const fn from_le_bytes(bytes: [u8; 4]) -> Self {
        Self(u32::from_le_bytes(bytes))
    }
}

/// Common value of eight resolved children, if they all agree.
///
/// This is the merge rule shared by the builder, the verifier and the
/// compactor: a parent collapses iff every child resolved to the same leaf
/// value.
#[inline]
pub fn merged(children: &[Option<Material>; 8]) -> Option<Material> {
    let first = children[0]?;
    children[1..]
        .iter()
        .all(|child| *child == Some(first))
        .then_some(first)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_is_one_word() {
        assert_eq!(std::mem::size_of::<Node>(), 4);
    }

    #[test]
    fn empty_slot_is_ungenerated() {
        assert!(!Node::EMPTY_SLOT.is_generated());
        assert!(!Node::default().is_leaf());
        assert_eq!(Node::EMPTY_SLOT.material(), None);
        assert_eq!(Node::EMPTY_SLOT.first_child(), None);
    }

    #[test]
    fn leaf_layout() {
        let node = Node::leaf(Material(5));
        assert_eq!(node.0, 0xC000_0005);
        assert!(node.is_generated());
        assert!(node.is_leaf());
        assert_eq!(node.material(), Some(Material(5)));
        assert_eq!(node.first_child(), None);
    }

    #[test]
    fn internal_layout() {
        let node = Node::internal(9);
        assert_eq!(node.0, 0x8000_0009);
        assert_eq!(node.first_child(), Some(9));
        assert_eq!(node.material(), None);
    }

    #[test]
    fn from_parts_matches_constructors() {
        assert_eq!(Node::from_parts(true, true, 3), Node::leaf(Material(3)));
        assert_eq!(Node::from_parts(true, false, 17), Node::internal(17));
        assert_eq!(Node::from_parts(false, false, 0), Node::EMPTY_SLOT);

        let ungenerated_leaf = Node::from_parts(false, true, 1);
        assert!(ungenerated_leaf.is_leaf());
        assert_eq!(ungenerated_leaf.material(), None);
    }

    #[test]
    fn data_uses_thirty_bits() {
        let node = Node::internal(MAX_DATA);
        assert_eq!(node.data(), MAX_DATA);
        assert!(!node.is_leaf());
    }

    #[test]
    fn merge_rule() {
        let solid = Some(Material::SOLID);
        assert_eq!(merged(&[solid; 8]), solid);
        assert_eq!(merged(&[Some(Material::AIR); 8]), Some(Material::AIR));

        let mut mixed = [solid; 8];
        mixed[5] = Some(Material::DIRT);
        assert_eq!(merged(&mixed), None);

        let mut partial = [solid; 8];
        partial[0] = None;
        assert_eq!(merged(&partial), None);
    }

    #[test]
    fn wire_bytes_little_endian() {
        let node = Node::leaf(Material(1));
        assert_eq!(node.to_le_bytes(), [0x01, 0x00, 0x00, 0xC0]);
        assert_eq!(Node::from_le_bytes(node.to_le_bytes()), node);
    }
}
