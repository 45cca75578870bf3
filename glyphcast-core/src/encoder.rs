//! Frame encoding

use crate::constants::HEADER_SIZE;
use crate::error::FrameError;
use crate::types::{Block, BlockHeader};
use bytes::{BufMut, Bytes, BytesMut};

/// Encode a block into frame bytes
///
/// The frame is encoded with the following layout:
/// 1. Header:
///    - Block ID (4 bytes, native-endian)
///    - Total message size (4 bytes, native-endian)
///    - Payload length (4 bytes, native-endian)
/// 2. Payload (exactly `block_size` bytes)
pub fn encode_frame(block: &Block) -> Result<Bytes, FrameError> {
    block.validate()?;

    let mut buf = BytesMut::with_capacity(HEADER_SIZE + block.payload.len());

    buf.put_u32_ne(block.header.block_id);
    buf.put_u32_ne(block.header.total_size);
    buf.put_u32_ne(block.header.block_size);
    buf.put_slice(&block.payload);

    Ok(buf.freeze())
}

/// Builder for constructing blocks
pub struct BlockBuilder {
    block_id: u32,
    total_size: u32,
    payload: Bytes,
}

impl BlockBuilder {
    /// Create a new block builder
    pub fn new(block_id: u32) -> Self {
        Self {
            block_id,
            total_size: 0,
            payload: Bytes::new(),
        }
    }

    /// Set the total message size
    pub fn total_size(mut self, total_size: u32) -> Self {
        self.total_size = total_size;
        self
    }

    /// Set the payload; the header's block size follows its length
    pub fn payload(mut self, payload: Bytes) -> Self {
        self.payload = payload;
        self
    }

    /// Build the block struct without encoding
    pub fn build_struct(self) -> Result<Block, FrameError> {
        let block_size = u32::try_from(self.payload.len()).map_err(|_| {
            FrameError::LengthMismatch {
                declared: u32::MAX,
                actual: self.payload.len(),
            }
        })?;

        Ok(Block::new(
            BlockHeader::new(self.block_id, self.total_size, block_size),
            self.payload,
        ))
    }

    /// Build and encode the frame
    pub fn build(self) -> Result<Bytes, FrameError> {
        encode_frame(&self.build_struct()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_simple_frame() {
        let payload = b"Hello, Glyphcast!";
        let block = Block::new(
            BlockHeader::new(7, 1024, payload.len() as u32),
            Bytes::from_static(payload),
        );

        let encoded = encode_frame(&block).unwrap();

        assert_eq!(encoded.len(), HEADER_SIZE + payload.len());
        assert_eq!(&encoded[0..4], &7u32.to_ne_bytes());
        assert_eq!(&encoded[4..8], &1024u32.to_ne_bytes());
        assert_eq!(&encoded[8..12], &(payload.len() as u32).to_ne_bytes());
        assert_eq!(&encoded[12..], payload);
    }

    #[test]
    fn test_block_builder() {
        let encoded = BlockBuilder::new(42)
            .total_size(100)
            .payload(Bytes::from("test payload"))
            .build()
            .unwrap();

        assert_eq!(encoded.len(), HEADER_SIZE + 12);
        assert_eq!(&encoded[8..12], &12u32.to_ne_bytes());
    }

    #[test]
    fn test_encode_empty_payload() {
        let encoded = BlockBuilder::new(0).total_size(5).build().unwrap();
        assert_eq!(encoded.len(), HEADER_SIZE);
    }

    #[test]
    fn test_encode_rejects_inconsistent_block() {
        let block = Block::new(BlockHeader::new(1, 10, 8), Bytes::from_static(b"short"));
        assert!(matches!(
            encode_frame(&block),
            Err(FrameError::LengthMismatch { declared: 8, actual: 5 })
        ));
    }
}
