//! Serialization of the node array for the device.
//!
//! Wire format, every word little-endian:
//!
//! ```text
//! bytes 0..4        node count (also the device's atomic append cursor)
//! bytes 4..4+4n     n node words, in array order
//! ```
//!
//! Node words are transmitted verbatim; see [`crate::node`] for the bit layout.

use terrasvo_core::constants::WORD_SIZE;
use terrasvo_core::{Error, GpuBuffer, Result};
use tracing::{debug, info};

use crate::arena::NodeArena;
use crate::node::Node;
use crate::octree::Octree;

/// Encode `nodes` with its count header.
pub fn encode(nodes: &[Node]) -> Vec<u8> {
    let mut bytes = Vec::with_capacity((nodes.len() + 1) * WORD_SIZE);
    bytes.extend_from_slice(&(nodes.len() as u32).to_le_bytes());
    #[cfg(target_endian = "little")]
    bytes.extend_from_slice(bytemuck::cast_slice(nodes));
    #[cfg(not(target_endian = "little"))]
    for node in nodes {
        bytes.extend_from_slice(&node.to_le_bytes());
    }
    bytes
}

/// Decode raw node words (no count header).
pub fn decode_nodes(bytes: &[u8]) -> Result<Vec<Node>> {
    if bytes.len() % WORD_SIZE != 0 {
        return Err(Error::InvalidData(format!(
            "{} bytes is not a whole number of node words",
            bytes.len()
        )));
    }
    Ok(bytes
        .chunks_exact(WORD_SIZE)
        .map(|w| Node::from_le_bytes([w[0], w[1], w[2], w[3]]))
        .collect())
}

impl Octree {
    /// Bytes needed to upload this tree: the count word plus one word per node.
    pub fn upload_size(&self) -> usize {
        (self.nodes.len() + 1) * WORD_SIZE
    }

    /// Write the count and the node array at offset 0 of `buffer`.
    pub fn upload<B: GpuBuffer + ?Sized>(&self, buffer: &mut B) -> Result<()> {
        let required = self.upload_size();
        let available = buffer.size();
        if required > available {
            return Err(Error::BufferTooSmall {
                required,
                available,
            });
        }

        buffer.upload(0, &encode(self.nodes.as_slice()))?;
        info!("{} nodes uploaded.", self.nodes.len());
        Ok(())
    }

    /// Replace the node array with the one held in `buffer`.
    ///
    /// The count word may have been advanced by the device since the last
    /// upload; whatever it says now is read back.
    pub fn download<B: GpuBuffer + ?Sized>(&mut self, buffer: &B) -> Result<()> {
        let mut header = [0u8; WORD_SIZE];
        buffer.download(0, &mut header)?;
        let count = u32::from_le_bytes(header) as usize;

        if count == 0 {
            return Err(Error::InvalidData("buffer holds no root node".to_string()));
        }
        let required = (count + 1) * WORD_SIZE;
        if required > buffer.size() {
            return Err(Error::InvalidData(format!(
                "node count {} needs {} bytes, buffer holds {}",
                count,
                required,
                buffer.size()
            )));
        }

        let mut bytes = vec![0u8; count * WORD_SIZE];
        buffer.download(WORD_SIZE, &mut bytes)?;
        self.nodes = NodeArena::from_nodes(decode_nodes(&bytes)?, self.config.max_nodes)?;
        debug!("{} nodes downloaded.", count);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::OctreeConfig;
    use terrasvo_core::Material;

    /// Plain host memory standing in for a device buffer.
    struct VecBuffer(Vec<u8>);

    impl GpuBuffer for VecBuffer {
        fn size(&self) -> usize {
            self.0.len()
        }

        fn upload(&mut self, offset: usize, src: &[u8]) -> Result<()> {
            self.0[offset..offset + src.len()].copy_from_slice(src);
            Ok(())
        }

        fn download(&self, offset: usize, dst: &mut [u8]) -> Result<()> {
            dst.copy_from_slice(&self.0[offset..offset + dst.len()]);
            Ok(())
        }
    }

    fn terrain(x: i64, z: i64) -> i32 {
        ((x ^ z) % 6) as i32
    }

    fn generated() -> Octree {
        let mut tree = Octree::new(OctreeConfig::new(16)).unwrap();
        tree.generate(&terrain).unwrap();
        tree
    }

    #[test]
    fn encode_layout() {
        let nodes = [Node::internal(1), Node::leaf(Material::SOLID)];
        assert_eq!(
            encode(&nodes),
            vec![2, 0, 0, 0, 0x01, 0, 0, 0x80, 0x01, 0, 0, 0xC0]
        );
    }

    #[test]
    fn upload_size_counts_header() {
        let tree = generated();
        assert_eq!(tree.upload_size(), (tree.node_count() + 1) * 4);
    }

    #[test]
    fn upload_then_download_reproduces_nodes() {
        let tree = generated();
        let mut buffer = VecBuffer(vec![0xAA; tree.upload_size() + 64]);
        tree.upload(&mut buffer).unwrap();

        let mut copy = Octree::new(OctreeConfig::new(16)).unwrap();
        copy.download(&buffer).unwrap();
        assert_eq!(copy.nodes(), tree.nodes());
        assert_eq!(encode(copy.nodes()), buffer.0[..tree.upload_size()].to_vec());
    }

    #[test]
    fn upload_rejects_small_buffer() {
        let tree = generated();
        let mut buffer = VecBuffer(vec![0; tree.upload_size() - 1]);
        let err = tree.upload(&mut buffer).unwrap_err();
        assert!(matches!(err, Error::BufferTooSmall { .. }));
    }

    #[test]
    fn download_rejects_oversized_count() {
        let mut buffer = VecBuffer(vec![0; 16]);
        buffer.0[..4].copy_from_slice(&4u32.to_le_bytes());
        let mut tree = Octree::new(OctreeConfig::new(4)).unwrap();
        assert!(matches!(tree.download(&buffer), Err(Error::InvalidData(_))));
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn download_rejects_empty_buffer_header() {
        let buffer = VecBuffer(vec![0; 16]);
        let mut tree = Octree::new(OctreeConfig::new(4)).unwrap();
        assert!(tree.download(&buffer).is_err());
    }

    #[test]
    fn download_respects_node_budget() {
        let tree = generated();
        let mut buffer = VecBuffer(vec![0; tree.upload_size()]);
        tree.upload(&mut buffer).unwrap();

        let config = OctreeConfig::new(16).with_max_nodes(tree.node_count() - 1);
        let mut small = Octree::new(config).unwrap();
        assert!(matches!(
            small.download(&buffer),
            Err(Error::CapacityExceeded { .. })
        ));
    }

    #[test]
    fn decode_rejects_partial_words() {
        assert!(decode_nodes(&[1, 2, 3]).is_err());
        assert_eq!(decode_nodes(&[]).unwrap(), Vec::new());
    }
}
