//! Core types for Glyphcast blocks

use crate::constants::HEADER_SIZE;
use crate::error::FrameError;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Header fields carried in front of every block payload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlockHeader {
    /// Cycle counter assigned by the encode session
    pub block_id: u32,

    /// Length of the whole message in bytes
    pub total_size: u32,

    /// Number of valid payload bytes in this frame
    pub block_size: u32,
}

impl BlockHeader {
    /// Create a new block header
    pub fn new(block_id: u32, total_size: u32, block_size: u32) -> Self {
        Self {
            block_id,
            total_size,
            block_size,
        }
    }
}

/// One erasure-coded block together with its header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Block header
    pub header: BlockHeader,

    /// Coded payload bytes
    pub payload: Bytes,
}

impl Block {
    /// Create a new block
    pub fn new(header: BlockHeader, payload: Bytes) -> Self {
        Self { header, payload }
    }

    /// Validate that the header describes the payload
    pub fn validate(&self) -> Result<(), FrameError> {
        if self.payload.len() != self.header.block_size as usize {
            return Err(FrameError::LengthMismatch {
                declared: self.header.block_size,
                actual: self.payload.len(),
            });
        }
        Ok(())
    }

    /// Size of this block once framed
    pub fn frame_len(&self) -> usize {
        HEADER_SIZE + self.payload.len()
    }

    /// Get block ID
    pub fn block_id(&self) -> u32 {
        self.header.block_id
    }

    /// Get total message size
    pub fn total_size(&self) -> u32 {
        self.header.total_size
    }
}
