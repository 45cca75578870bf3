//! Decode session: accumulates scanned blocks until the message recovers

use crate::constants::DEFAULT_MISMATCH_ABORT_THRESHOLD;
use crate::decoder::decode_frame_zero_copy;
use crate::error::{FrameError, SessionError};
use crate::fec::{BlockDecoder, ErasureEngine, IngestStatus, RaptorqEngine, Recovery};
use crate::symbol::decode_symbol;
use crate::types::BlockHeader;
use bytes::Bytes;
use std::collections::HashSet;

#[cfg(feature = "logging")]
use tracing::{debug, info, warn};

/// Where a decode session stands
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodeStatus {
    /// Waiting for more distinct blocks
    Collecting,
    /// The message was recovered; terminal
    Complete(Bytes),
    /// The session parameters do not match the incoming stream; terminal
    Aborted(String),
}

/// What a single `ingest` call did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestOutcome {
    /// Symbol or frame could not be decoded; dropped
    Dropped(FrameError),
    /// Frame header disagrees with the session parameters; dropped
    Mismatched(BlockHeader),
    /// Block id was already seen; no-op
    Duplicate(u32),
    /// Engine refused the block; dropped
    Rejected(u32),
    /// Block stored, message not yet recoverable
    Accepted(u32),
    /// This block completed recovery
    Completed(u32),
    /// Too many mismatched frames in a row; the session aborted
    Aborted,
    /// Session already finished; input ignored
    Ignored,
}

/// Counters kept across a session's lifetime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IngestStats {
    /// Raw symbols handed to `ingest`
    pub symbols_received: u64,
    /// Symbols that were not valid transport encoding
    pub invalid_symbols: u64,
    /// Symbols that decoded to a malformed frame
    pub malformed_frames: u64,
    /// Frames describing a different message
    pub mismatched_frames: u64,
    /// Frames whose block id was already seen
    pub duplicates: u64,
    /// Blocks the engine rejected
    pub rejected: u64,
    /// Blocks the engine accepted
    pub accepted: u64,
    /// Recovery attempts made
    pub recover_attempts: u64,
}

impl IngestStats {
    /// Symbols dropped before reaching the engine
    pub fn dropped(&self) -> u64 {
        self.invalid_symbols + self.malformed_frames + self.mismatched_frames
    }
}

/// Receiver-side session bound to one (message size, block size) pair
pub struct DecodeSession<E: ErasureEngine = RaptorqEngine> {
    handle: Option<E::Decoder>,
    message_size: u32,
    block_size: u32,
    seen_block_ids: HashSet<u32>,
    status: DecodeStatus,
    stats: IngestStats,
    mismatch_streak: u32,
    mismatch_abort_threshold: u32,
}

impl DecodeSession<RaptorqEngine> {
    /// Start a RaptorQ-backed session
    pub fn start_raptorq(message_size: u32, block_size: u32) -> Result<Self, SessionError> {
        Self::start(&RaptorqEngine, message_size, block_size)
    }
}

impl<E: ErasureEngine> DecodeSession<E> {
    /// Create a decoder for the given parameters and begin collecting
    pub fn start(engine: &E, message_size: u32, block_size: u32) -> Result<Self, SessionError> {
        let handle = engine.create_decoder(message_size, block_size)?;

        #[cfg(feature = "logging")]
        info!(
            "Decode session started: {} bytes, block size {}",
            message_size, block_size
        );

        Ok(Self {
            handle: Some(handle),
            message_size,
            block_size,
            seen_block_ids: HashSet::new(),
            status: DecodeStatus::Collecting,
            stats: IngestStats::default(),
            mismatch_streak: 0,
            mismatch_abort_threshold: DEFAULT_MISMATCH_ABORT_THRESHOLD,
        })
    }

    /// Abort after this many consecutive mismatched frames (0 disables)
    pub fn with_mismatch_abort_threshold(mut self, threshold: u32) -> Self {
        self.mismatch_abort_threshold = threshold;
        self
    }

    /// Ingest one raw symbol as delivered by the scanner
    ///
    /// Decoding failures and foreign frames are absorbed; they never turn
    /// into session errors.
    pub fn ingest(&mut self, raw: &[u8]) -> IngestOutcome {
        if !self.is_collecting() {
            return IngestOutcome::Ignored;
        }
        self.stats.symbols_received += 1;

        let frame = match decode_symbol(raw) {
            Ok(frame) => frame,
            Err(err) => {
                self.stats.invalid_symbols += 1;

                #[cfg(feature = "logging")]
                debug!("Dropped symbol: {}", err);

                return IngestOutcome::Dropped(err);
            }
        };

        self.ingest_decoded(Bytes::from(frame))
    }

    /// Ingest a frame that has already been taken out of its symbol encoding
    pub fn ingest_frame(&mut self, frame: &[u8]) -> IngestOutcome {
        if !self.is_collecting() {
            return IngestOutcome::Ignored;
        }
        self.stats.symbols_received += 1;
        self.ingest_decoded(Bytes::copy_from_slice(frame))
    }

    fn ingest_decoded(&mut self, frame: Bytes) -> IngestOutcome {
        let block = match decode_frame_zero_copy(frame) {
            Ok(block) => block,
            Err(err) => {
                self.stats.malformed_frames += 1;

                #[cfg(feature = "logging")]
                debug!("Dropped frame: {}", err);

                return IngestOutcome::Dropped(err);
            }
        };

        let header = block.header;
        if header.total_size != self.message_size || header.block_size > self.block_size {
            return self.on_mismatch(header);
        }
        self.mismatch_streak = 0;

        if !self.seen_block_ids.insert(header.block_id) {
            self.stats.duplicates += 1;
            return IngestOutcome::Duplicate(header.block_id);
        }

        let Some(handle) = self.handle.as_mut() else {
            return IngestOutcome::Ignored;
        };

        match handle.ingest_block(header.block_id, &block.payload) {
            IngestStatus::Rejected => {
                self.stats.rejected += 1;

                #[cfg(feature = "logging")]
                debug!("Engine rejected block {}", header.block_id);

                IngestOutcome::Rejected(header.block_id)
            }
            IngestStatus::Accepted => {
                self.stats.accepted += 1;
                self.stats.recover_attempts += 1;

                match handle.try_recover() {
                    Recovery::Recovered(message) => {
                        self.complete(message);
                        IngestOutcome::Completed(header.block_id)
                    }
                    Recovery::Insufficient => IngestOutcome::Accepted(header.block_id),
                }
            }
        }
    }

    fn on_mismatch(&mut self, header: BlockHeader) -> IngestOutcome {
        self.stats.mismatched_frames += 1;
        self.mismatch_streak += 1;

        #[cfg(feature = "logging")]
        warn!(
            "Frame {} describes a {} byte message in {} byte blocks; session expects {} / {}",
            header.block_id,
            header.total_size,
            header.block_size,
            self.message_size,
            self.block_size
        );

        if self.mismatch_abort_threshold > 0 && self.mismatch_streak >= self.mismatch_abort_threshold
        {
            self.abort(format!(
                "{} consecutive frames for a {} byte message; session expects {} bytes in {} byte blocks",
                self.mismatch_streak, header.total_size, self.message_size, self.block_size
            ));
            return IngestOutcome::Aborted;
        }

        IngestOutcome::Mismatched(header)
    }

    fn complete(&mut self, message: Bytes) {
        self.handle = None;

        #[cfg(feature = "logging")]
        info!(
            "Recovered {} byte message from {} distinct blocks",
            message.len(),
            self.seen_block_ids.len()
        );

        self.status = DecodeStatus::Complete(message);
    }

    /// Abandon collection and release the engine handle
    ///
    /// Has no effect once the session has finished.
    pub fn abort(&mut self, reason: impl Into<String>) {
        if !self.is_collecting() {
            return;
        }
        self.handle = None;
        let reason = reason.into();

        #[cfg(feature = "logging")]
        warn!("Decode session aborted: {}", reason);

        self.status = DecodeStatus::Aborted(reason);
    }

    /// Current status
    pub fn status(&self) -> &DecodeStatus {
        &self.status
    }

    /// Whether the session still accepts blocks
    pub fn is_collecting(&self) -> bool {
        matches!(self.status, DecodeStatus::Collecting)
    }

    /// Whether the message has been recovered
    pub fn is_complete(&self) -> bool {
        matches!(self.status, DecodeStatus::Complete(_))
    }

    /// The recovered message, once complete
    pub fn message(&self) -> Option<&Bytes> {
        match &self.status {
            DecodeStatus::Complete(message) => Some(message),
            _ => None,
        }
    }

    /// Consume the session, yielding the recovered message if there is one
    pub fn take_message(self) -> Option<Bytes> {
        match self.status {
            DecodeStatus::Complete(message) => Some(message),
            _ => None,
        }
    }

    /// Whether `block_id` has been seen
    pub fn has_seen(&self, block_id: u32) -> bool {
        self.seen_block_ids.contains(&block_id)
    }

    /// Number of distinct block ids seen
    pub fn seen_count(&self) -> usize {
        self.seen_block_ids.len()
    }

    /// Running counters
    pub fn stats(&self) -> &IngestStats {
        &self.stats
    }

    /// Expected message length
    pub fn message_size(&self) -> u32 {
        self.message_size
    }

    /// Nominal block size
    pub fn block_size(&self) -> u32 {
        self.block_size
    }
}
