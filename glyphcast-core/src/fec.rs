//! Erasure engine adapter
//!
//! This module defines the capabilities the sessions need from a rateless
//! erasure code and a RaptorQ-backed implementation of them.
//!
//! Handles are released by dropping them. Sessions keep their handle in an
//! `Option` and `take()` it, so release happens exactly once.

use crate::constants::{MAX_BLOCK_SIZE, MAX_ENCODING_SYMBOL_ID, MAX_SOURCE_SYMBOLS};
use crate::error::SessionError;
use bytes::Bytes;
use raptorq::{
    extended_source_block_symbols, EncodingPacket, ObjectTransmissionInformation, PayloadId,
    SourceBlockDecoder, SourceBlockEncoder,
};

#[cfg(feature = "logging")]
use tracing::debug;

/// Result of handing one block to a decoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestStatus {
    /// The block was stored for recovery
    Accepted,
    /// The block does not fit the decoder's parameters and was discarded
    Rejected,
}

/// Result of a recovery attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recovery {
    /// The full message was reconstructed
    Recovered(Bytes),
    /// More distinct blocks are needed; retry after the next accepted block
    Insufficient,
}

/// Factory for encoder and decoder handles
pub trait ErasureEngine {
    /// Encoder handle bound to one message
    type Encoder: BlockEncoder;

    /// Decoder handle bound to one (message size, block size) pair
    type Decoder: BlockDecoder;

    /// Create an encoder for `message`
    ///
    /// # Errors
    /// `EngineInitFailed` if the engine cannot encode this message with this block size.
    fn create_encoder(&self, message: &[u8], block_size: u32)
        -> Result<Self::Encoder, SessionError>;

    /// Create a decoder for a message of `message_size` bytes
    ///
    /// # Errors
    /// `EngineInitFailed` if the parameters are outside what the engine supports.
    fn create_decoder(&self, message_size: u32, block_size: u32)
        -> Result<Self::Decoder, SessionError>;
}

/// Produces coded blocks by id
pub trait BlockEncoder {
    /// Produce the payload for `block_id`
    ///
    /// The returned length is the number of bytes written, which may be less
    /// than the nominal block size for the final source block.
    fn encode_block(&mut self, block_id: u32) -> Result<Bytes, SessionError>;
}

/// Accumulates coded blocks and reconstructs the message
pub trait BlockDecoder {
    /// Hand one block to the decoder. Never fatal.
    fn ingest_block(&mut self, block_id: u32, payload: &[u8]) -> IngestStatus;

    /// Attempt to reconstruct the message from the blocks ingested so far
    fn try_recover(&mut self) -> Recovery;
}

/// RaptorQ (RFC 6330) engine using a single source block
///
/// Block ids below `K` (the source symbol count) carry the message directly;
/// ids from `K` upward are repair symbols, so the stream never runs out.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaptorqEngine;

impl ErasureEngine for RaptorqEngine {
    type Encoder = RaptorqEncoder;
    type Decoder = RaptorqDecoder;

    fn create_encoder(
        &self,
        message: &[u8],
        block_size: u32,
    ) -> Result<RaptorqEncoder, SessionError> {
        let message_size = u32::try_from(message.len()).map_err(|_| {
            SessionError::EngineInitFailed(format!(
                "message of {} bytes exceeds the 32-bit size field",
                message.len()
            ))
        })?;
        let layout = SymbolLayout::new(message_size, block_size)?;

        // The engine works on whole symbols; pad the tail with zeros
        let mut padded = message.to_vec();
        padded.resize(layout.padded_len(), 0);

        let inner = SourceBlockEncoder::new(0, &layout.transmission_info(), &padded);
        let source = inner.source_packets();

        #[cfg(feature = "logging")]
        debug!(
            "Created RaptorQ encoder: {} bytes, {} source symbols of {} bytes",
            message_size, layout.source_symbols, block_size
        );

        Ok(RaptorqEncoder {
            inner,
            source,
            layout,
        })
    }

    fn create_decoder(
        &self,
        message_size: u32,
        block_size: u32,
    ) -> Result<RaptorqDecoder, SessionError> {
        let layout = SymbolLayout::new(message_size, block_size)?;
        let inner =
            SourceBlockDecoder::new(0, &layout.transmission_info(), layout.padded_len() as u64);

        #[cfg(feature = "logging")]
        debug!(
            "Created RaptorQ decoder: {} bytes, {} source symbols of {} bytes",
            message_size, layout.source_symbols, block_size
        );

        Ok(RaptorqDecoder {
            inner,
            pending: Vec::new(),
            layout,
        })
    }
}

/// Encoder handle for [`RaptorqEngine`]
pub struct RaptorqEncoder {
    inner: SourceBlockEncoder,
    source: Vec<EncodingPacket>,
    layout: SymbolLayout,
}

impl RaptorqEncoder {
    /// Number of source symbols (K)
    pub fn source_symbols(&self) -> u32 {
        self.layout.source_symbols
    }
}

impl BlockEncoder for RaptorqEncoder {
    fn encode_block(&mut self, block_id: u32) -> Result<Bytes, SessionError> {
        let k = self.layout.source_symbols;

        if block_id < k {
            let packet = &self.source[block_id as usize];
            let len = self.layout.payload_len(block_id);
            return Ok(Bytes::copy_from_slice(&packet.data()[..len]));
        }

        if self.layout.encoding_symbol_id(block_id).is_none() {
            return Err(SessionError::EncodeFailed {
                block_id,
                reason: "encoding symbol id space exhausted".to_string(),
            });
        }

        let packet = self
            .inner
            .repair_packets(block_id - k, 1)
            .into_iter()
            .next()
            .ok_or_else(|| SessionError::EncodeFailed {
                block_id,
                reason: "engine produced no repair symbol".to_string(),
            })?;

        Ok(Bytes::copy_from_slice(packet.data()))
    }
}

/// Decoder handle for [`RaptorqEngine`]
pub struct RaptorqDecoder {
    inner: SourceBlockDecoder,
    pending: Vec<EncodingPacket>,
    layout: SymbolLayout,
}

impl BlockDecoder for RaptorqDecoder {
    fn ingest_block(&mut self, block_id: u32, payload: &[u8]) -> IngestStatus {
        let Some(esi) = self.layout.encoding_symbol_id(block_id) else {
            return IngestStatus::Rejected;
        };
        if payload.len() != self.layout.payload_len(block_id) {
            return IngestStatus::Rejected;
        }

        let mut data = payload.to_vec();
        data.resize(self.layout.block_size as usize, 0);
        self.pending
            .push(EncodingPacket::new(PayloadId::new(0, esi), data));

        IngestStatus::Accepted
    }

    fn try_recover(&mut self) -> Recovery {
        // Nothing new since the last attempt: the answer cannot have changed
        if self.pending.is_empty() {
            return Recovery::Insufficient;
        }

        match self.inner.decode(self.pending.drain(..)) {
            Some(mut message) => {
                message.truncate(self.layout.message_size as usize);
                Recovery::Recovered(Bytes::from(message))
            }
            None => Recovery::Insufficient,
        }
    }
}

/// How a message maps onto RaptorQ symbols
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct SymbolLayout {
    message_size: u32,
    block_size: u32,
    source_symbols: u32,
    extended_symbols: u32,
}

impl SymbolLayout {
    fn new(message_size: u32, block_size: u32) -> Result<Self, SessionError> {
        if message_size == 0 {
            return Err(SessionError::EngineInitFailed(
                "message must not be empty".to_string(),
            ));
        }
        if block_size == 0 || block_size > MAX_BLOCK_SIZE {
            return Err(SessionError::EngineInitFailed(format!(
                "block size {} outside 1..={}",
                block_size, MAX_BLOCK_SIZE
            )));
        }

        let source_symbols = message_size.div_ceil(block_size);
        if source_symbols > MAX_SOURCE_SYMBOLS {
            return Err(SessionError::EngineInitFailed(format!(
                "{} source symbols exceeds the limit of {}",
                source_symbols, MAX_SOURCE_SYMBOLS
            )));
        }

        Ok(Self {
            message_size,
            block_size,
            source_symbols,
            extended_symbols: extended_source_block_symbols(source_symbols),
        })
    }

    fn padded_len(&self) -> usize {
        self.source_symbols as usize * self.block_size as usize
    }

    fn transmission_info(&self) -> ObjectTransmissionInformation {
        ObjectTransmissionInformation::new(self.padded_len() as u64, self.block_size as u16, 1, 1, 1)
    }

    /// Bytes carried by `block_id`: the last source symbol only carries the
    /// message tail, everything else is a full symbol.
    fn payload_len(&self, block_id: u32) -> usize {
        if block_id + 1 == self.source_symbols {
            let tail = self.message_size - (self.source_symbols - 1) * self.block_size;
            tail as usize
        } else {
            self.block_size as usize
        }
    }

    /// Encoding symbol id carried on the wire for `block_id`, if the engine
    /// can address it.
    ///
    /// raptorq numbers repair packets `K + r` and adds the padding offset
    /// `K' - K` itself when decoding, so the block id is the ESI. The internal
    /// symbol id `K' + r` must still fit in 24 bits.
    fn encoding_symbol_id(&self, block_id: u32) -> Option<u32> {
        let internal = if block_id < self.source_symbols {
            block_id
        } else {
            (block_id - self.source_symbols).checked_add(self.extended_symbols)?
        };
        (internal <= MAX_ENCODING_SYMBOL_ID).then_some(block_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(len: usize) -> Vec<u8> {
        (0..len).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn test_rejects_bad_parameters() {
        let engine = RaptorqEngine;
        assert!(matches!(
            engine.create_encoder(&[], 16),
            Err(SessionError::EngineInitFailed(_))
        ));
        assert!(matches!(
            engine.create_encoder(&[1, 2, 3], 0),
            Err(SessionError::EngineInitFailed(_))
        ));
        assert!(matches!(
            engine.create_decoder(100, MAX_BLOCK_SIZE + 1),
            Err(SessionError::EngineInitFailed(_))
        ));
        assert!(matches!(
            engine.create_decoder(MAX_SOURCE_SYMBOLS + 1, 1),
            Err(SessionError::EngineInitFailed(_))
        ));
    }

    #[test]
    fn test_short_final_source_block() {
        let engine = RaptorqEngine;
        let msg = message(1000);
        let mut encoder = engine.create_encoder(&msg, 256).unwrap();

        assert_eq!(encoder.source_symbols(), 4);
        assert_eq!(encoder.encode_block(0).unwrap().as_ref(), &msg[..256]);
        assert_eq!(encoder.encode_block(3).unwrap().as_ref(), &msg[768..]);
        assert_eq!(encoder.encode_block(4).unwrap().len(), 256);
        assert_eq!(encoder.encode_block(100).unwrap().len(), 256);
    }

    #[test]
    fn test_recover_from_source_blocks() {
        let engine = RaptorqEngine;
        let msg = message(1000);
        let mut encoder = engine.create_encoder(&msg, 256).unwrap();
        let mut decoder = engine.create_decoder(1000, 256).unwrap();

        for id in [2, 0, 3] {
            let payload = encoder.encode_block(id).unwrap();
            assert_eq!(decoder.ingest_block(id, &payload), IngestStatus::Accepted);
            assert_eq!(decoder.try_recover(), Recovery::Insufficient);
        }

        let payload = encoder.encode_block(1).unwrap();
        assert_eq!(decoder.ingest_block(1, &payload), IngestStatus::Accepted);
        assert_eq!(decoder.try_recover(), Recovery::Recovered(Bytes::from(msg)));
    }

    #[test]
    fn test_recover_from_repair_blocks_only() {
        let engine = RaptorqEngine;
        let msg = message(2048);
        let mut encoder = engine.create_encoder(&msg, 128).unwrap();
        let mut decoder = engine.create_decoder(2048, 128).unwrap();

        // K = 16; skip every source block and use a generous repair margin
        let mut recovered = None;
        for id in 16..48 {
            let payload = encoder.encode_block(id).unwrap();
            assert_eq!(decoder.ingest_block(id, &payload), IngestStatus::Accepted);
            if let Recovery::Recovered(m) = decoder.try_recover() {
                recovered = Some(m);
                break;
            }
        }

        assert_eq!(recovered, Some(Bytes::from(msg)));
    }

    #[test]
    fn test_repair_blocks_match_engine_numbering() {
        let engine = RaptorqEngine;
        let msg = message(2048);
        let mut encoder = engine.create_encoder(&msg, 128).unwrap();
        assert_ne!(extended_source_block_symbols(16), 16);

        // The engine's own repair packets carry ESI K + r
        let packets = encoder.inner.repair_packets(0, 3);
        for (r, packet) in packets.iter().enumerate() {
            let block_id = 16 + r as u32;
            assert_eq!(packet.payload_id().encoding_symbol_id(), block_id);
            assert_eq!(encoder.encode_block(block_id).unwrap().as_ref(), packet.data());
        }
    }

    #[test]
    fn test_recover_from_far_repair_blocks() {
        let engine = RaptorqEngine;
        let msg: Vec<u8> = (0..100 * 1024).map(|i| (i * 31 % 256) as u8).collect();
        let mut encoder = engine.create_encoder(&msg, 1024).unwrap();
        let mut decoder = engine.create_decoder(msg.len() as u32, 1024).unwrap();

        let mut recovered = None;
        for id in 5000..5200 {
            let payload = encoder.encode_block(id).unwrap();
            decoder.ingest_block(id, &payload);
            if let Recovery::Recovered(m) = decoder.try_recover() {
                recovered = Some(m);
                break;
            }
        }

        assert_eq!(recovered, Some(Bytes::from(msg)));
    }

    #[test]
    fn test_decoder_rejects_wrong_length() {
        let engine = RaptorqEngine;
        let mut decoder = engine.create_decoder(1000, 256).unwrap();

        assert_eq!(decoder.ingest_block(0, &[0u8; 255]), IngestStatus::Rejected);
        assert_eq!(decoder.ingest_block(3, &[0u8; 256]), IngestStatus::Rejected);
        assert_eq!(decoder.ingest_block(3, &[0u8; 232]), IngestStatus::Accepted);
        assert_eq!(decoder.ingest_block(9, &[0u8; 100]), IngestStatus::Rejected);
    }

    #[test]
    fn test_symbol_id_space() {
        let layout = SymbolLayout::new(1000, 256).unwrap();
        assert_eq!(layout.encoding_symbol_id(0), Some(0));
        assert_eq!(layout.encoding_symbol_id(3), Some(3));
        assert_eq!(layout.encoding_symbol_id(4), Some(4));
        assert_eq!(layout.encoding_symbol_id(u32::MAX), None);

        // The padded source block pushes the last addressable repair id below 2^24
        let padding = layout.extended_symbols - layout.source_symbols;
        let last = MAX_ENCODING_SYMBOL_ID - padding;
        assert_eq!(layout.encoding_symbol_id(last), Some(last));
        assert_eq!(layout.encoding_symbol_id(last + 1), None);

        let mut encoder = RaptorqEngine.create_encoder(&message(1000), 256).unwrap();
        assert!(matches!(
            encoder.encode_block(u32::MAX),
            Err(SessionError::EncodeFailed { block_id: u32::MAX, .. })
        ));
    }

    #[test]
    fn test_recover_without_blocks_is_insufficient() {
        let mut decoder = RaptorqEngine.create_decoder(10, 4).unwrap();
        assert_eq!(decoder.try_recover(), Recovery::Insufficient);
        assert_eq!(decoder.try_recover(), Recovery::Insufficient);
    }
}
