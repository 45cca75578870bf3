//! Transport symbol codec
//!
//! Binary frames are carried through the optical channel as standard padded
//! base64 text, which every barcode symbology stores losslessly.

use crate::error::FrameError;
use base64::{engine::general_purpose::STANDARD as BASE64, Engine};

/// Map a binary frame into transport symbol text
pub fn encode_symbol(data: &[u8]) -> String {
    BASE64.encode(data)
}

/// Map transport symbol text back into the binary frame
///
/// Leading and trailing ASCII whitespace is ignored. Characters outside the
/// alphabet or padding that does not close a complete 4-character unit
/// yield `InvalidSymbol`.
pub fn decode_symbol(symbol: &[u8]) -> Result<Vec<u8>, FrameError> {
    BASE64
        .decode(trim_ascii_whitespace(symbol))
        .map_err(|e| FrameError::InvalidSymbol(e.to_string()))
}

/// Length of the symbol text produced for a frame of `frame_len` bytes
pub const fn encoded_len(frame_len: usize) -> usize {
    frame_len.div_ceil(3) * 4
}

/// Largest frame whose symbol text fits in `symbol_capacity` bytes
pub const fn max_frame_len(symbol_capacity: usize) -> usize {
    symbol_capacity / 4 * 3
}

fn trim_ascii_whitespace(data: &[u8]) -> &[u8] {
    let start = data
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(data.len());
    let end = data
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |pos| pos + 1);
    &data[start..end]
}
