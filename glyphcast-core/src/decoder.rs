//! Frame decoding (strict mode)

use crate::constants::{BLOCK_ID_OFFSET, BLOCK_SIZE_OFFSET, HEADER_SIZE, TOTAL_SIZE_OFFSET};
use crate::error::FrameError;
use crate::types::{Block, BlockHeader};
use bytes::Bytes;

/// Decode a frame from a byte slice
///
/// This function performs strict validation:
/// - At least a full header must be present
/// - The payload must be exactly `block_size` bytes
///
/// A truncated frame (a common optical misread) yields `Malformed`.
pub fn decode_frame(data: &[u8]) -> Result<Block, FrameError> {
    decode_frame_zero_copy(Bytes::copy_from_slice(data))
}

/// Decode a frame from a byte buffer without copying the payload
///
/// The returned `Block` holds a slice of `buf` as its payload.
pub fn decode_frame_zero_copy(buf: Bytes) -> Result<Block, FrameError> {
    let header = decode_header(&buf)?;

    let expected = HEADER_SIZE + header.block_size as usize;
    if buf.len() != expected {
        return Err(FrameError::Malformed {
            expected,
            actual: buf.len(),
        });
    }

    let payload = buf.slice(HEADER_SIZE..expected);
    Ok(Block::new(header, payload))
}

/// Decode only the fixed header, leaving the payload unchecked
pub fn decode_header(data: &[u8]) -> Result<BlockHeader, FrameError> {
    if data.len() < HEADER_SIZE {
        return Err(FrameError::Malformed {
            expected: HEADER_SIZE,
            actual: data.len(),
        });
    }

    Ok(BlockHeader::new(
        read_u32(data, BLOCK_ID_OFFSET),
        read_u32(data, TOTAL_SIZE_OFFSET),
        read_u32(data, BLOCK_SIZE_OFFSET),
    ))
}

fn read_u32(data: &[u8], offset: usize) -> u32 {
    u32::from_ne_bytes([
        data[offset],
        data[offset + 1],
        data[offset + 2],
        data[offset + 3],
    ])
}
