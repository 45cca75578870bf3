//! Constants and limits for the Glyphcast wire format

/// Size of the fixed frame header in bytes
/// 4 (block_id) + 4 (total_size) + 4 (block_size) = 12 bytes
pub const HEADER_SIZE: usize = 12;

/// Offset of the block id field
pub const BLOCK_ID_OFFSET: usize = 0;

/// Offset of the total message size field
pub const TOTAL_SIZE_OFFSET: usize = 4;

/// Offset of the payload length field
pub const BLOCK_SIZE_OFFSET: usize = 8;

/// Default payload bytes per block (1 KB)
pub const DEFAULT_BLOCK_SIZE: u32 = 1024;

/// Default scheduler cadence in milliseconds
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 30;

/// Byte-mode capacity of the largest QR symbol (version 40, ECC level L)
pub const QR_MAX_BYTE_CAPACITY: usize = 2953;

/// Consecutive parameter-mismatched frames tolerated before a decode session aborts
pub const DEFAULT_MISMATCH_ABORT_THRESHOLD: u32 = 64;

/// Largest symbol size the erasure engine accepts
pub const MAX_BLOCK_SIZE: u32 = u16::MAX as u32;

/// Largest number of source symbols in a single RaptorQ source block
pub const MAX_SOURCE_SYMBOLS: u32 = 56_403;

/// Encoding symbol ids are carried in 24 bits by the engine
pub const MAX_ENCODING_SYMBOL_ID: u32 = (1 << 24) - 1;
