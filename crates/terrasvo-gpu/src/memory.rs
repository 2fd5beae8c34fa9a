//! Host-visible node buffer.
//!
//! [`HostBuffer`] is plain host memory laid out exactly like the device's
//! node buffer: word 0 is the node count, which the device also uses as its
//! append cursor, followed by the node words. The `device_*` methods emulate
//! what compute dispatches do to the buffer in dynamic mode.

use terrasvo_core::constants::WORD_SIZE;
use terrasvo_core::{CellPos, Error, GpuBuffer, Material, Result};
use terrasvo_octree::Node;

/// Node buffer in host memory.
#[derive(Clone, Debug)]
pub struct HostBuffer {
    bytes: Vec<u8>,
}

impl HostBuffer {
    /// Create a zeroed buffer of `size` bytes.
    pub fn new(size: usize) -> Self {
        Self {
            bytes: vec![0; size],
        }
    }

    /// Create a buffer with room for the count word and `nodes` node words.
    pub fn with_node_capacity(nodes: usize) -> Self {
        Self::new((nodes + 1) * WORD_SIZE)
    }

    /// Number of node words that fit after the count word.
    pub fn node_capacity(&self) -> usize {
        (self.bytes.len() / WORD_SIZE).saturating_sub(1)
    }

    /// Current value of the count word.
    pub fn node_count(&self) -> u32 {
        self.word(0).unwrap_or(0)
    }

    fn word(&self, word_index: usize) -> Option<u32> {
        let start = word_index * WORD_SIZE;
        let bytes = self.bytes.get(start..start + WORD_SIZE)?;
        Some(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    fn set_word(&mut self, word_index: usize, value: u32) -> Result<()> {
        let start = word_index * WORD_SIZE;
        let len = self.bytes.len();
        self.bytes
            .get_mut(start..start + WORD_SIZE)
            .ok_or_else(|| {
                Error::OutOfBounds(format!("word {word_index} past buffer of {len} bytes"))
            })?
            .copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Read the node at `index`, if it lies inside the buffer.
    pub fn read_node(&self, index: u32) -> Option<Node> {
        self.word(index as usize + 1).map(Node)
    }

    /// Overwrite the node at `index`.
    pub fn write_node(&mut self, index: u32, node: Node) -> Result<()> {
        self.set_word(index as usize + 1, node.0)
    }

    /// Bump the append cursor by `count` and return the old value.
    ///
    /// This is the device's atomic add on word 0. Returns `None` without
    /// moving the cursor when the new nodes would not fit.
    pub fn device_append(&mut self, count: u32) -> Option<u32> {
        let first = self.node_count();
        let end = first.checked_add(count)?;
        if end as usize > self.node_capacity() {
            return None;
        }
        self.set_word(0, end).ok()?;
        Some(first)
    }

    /// Set the unit cell at `pos` to `material`, the way the insertion kernel does.
    ///
    /// Leaves on the way down are split into 8 copies of themselves appended
    /// at the cursor. Nothing is merged back, so the tree is left with
    /// redundant and unreachable nodes for the next maintenance pass.
    ///
    /// Returns `Ok(false)` if the buffer ran out of room mid-descent; the
    /// tree is still valid in that case, only less refined.
    pub fn device_insert(&mut self, pos: CellPos, size: u32, material: Material) -> Result<bool> {
        if !size.is_power_of_two() || !pos.within(size) {
            return Err(Error::OutOfBounds(format!(
                "cell {:?} outside tree of size {}",
                pos, size
            )));
        }

        let mut index = 0u32;
        for octant in pos.to_octree_path(size.trailing_zeros()) {
            let node = self
                .read_node(index)
                .ok_or_else(|| Error::InvalidData(format!("node {} past buffer", index)))?;

            let first = match (node.first_child(), node.material()) {
                (Some(first), _) => first,
                (None, Some(value)) => {
                    let Some(first) = self.device_append(8) else {
                        return Ok(false);
                    };
                    for i in 0..8 {
                        self.write_node(first + i, Node::leaf(value))?;
                    }
                    self.write_node(index, Node::internal(first))?;
                    first
                }
                (None, None) => {
                    return Err(Error::InvalidData(format!(
                        "ungenerated node {} on insertion path",
                        index
                    )));
                }
            };
            index = first + u32::from(octant);
        }

        self.write_node(index, Node::leaf(material))?;
        Ok(true)
    }
}

impl GpuBuffer for HostBuffer {
    fn size(&self) -> usize {
        self.bytes.len()
    }

    fn upload(&mut self, offset: usize, src: &[u8]) -> Result<()> {
        let end = offset
            .checked_add(src.len())
            .ok_or_else(|| Error::OutOfBounds("offset overflow".to_string()))?;
        let available = self.bytes.len();
        self.bytes
            .get_mut(offset..end)
            .ok_or(Error::BufferTooSmall {
                required: end,
                available,
            })?
            .copy_from_slice(src);
        Ok(())
    }

    fn download(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
        let end = offset
            .checked_add(dst.len())
            .ok_or_else(|| Error::OutOfBounds("offset overflow".to_string()))?;
        let src = self.bytes.get(offset..end).ok_or(Error::BufferTooSmall {
            required: end,
            available: self.bytes.len(),
        })?;
        dst.copy_from_slice(src);
        Ok(())
    }
}
