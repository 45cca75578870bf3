//! Engines for exercising sessions without relying on the real codec's
//! failure modes: injected encode failures, forced rejections, and counters
//! that record every handle created and released.

use crate::error::SessionError;
use crate::fec::{
    BlockDecoder, BlockEncoder, ErasureEngine, IngestStatus, RaptorqDecoder, RaptorqEncoder,
    RaptorqEngine, Recovery,
};
use bytes::Bytes;
use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Shared tallies of handle lifecycle events
#[derive(Debug, Clone, Default)]
pub struct HandleCounters {
    encoders_created: Arc<AtomicUsize>,
    encoders_destroyed: Arc<AtomicUsize>,
    decoders_created: Arc<AtomicUsize>,
    decoders_destroyed: Arc<AtomicUsize>,
    recover_attempts: Arc<AtomicUsize>,
}

impl HandleCounters {
    /// Encoders handed out so far
    pub fn encoders_created(&self) -> usize {
        self.encoders_created.load(Ordering::SeqCst)
    }

    /// Encoders released so far
    pub fn encoders_destroyed(&self) -> usize {
        self.encoders_destroyed.load(Ordering::SeqCst)
    }

    /// Decoders handed out so far
    pub fn decoders_created(&self) -> usize {
        self.decoders_created.load(Ordering::SeqCst)
    }

    /// Decoders released so far
    pub fn decoders_destroyed(&self) -> usize {
        self.decoders_destroyed.load(Ordering::SeqCst)
    }

    /// Calls to `try_recover` across all decoders
    pub fn recover_attempts(&self) -> usize {
        self.recover_attempts.load(Ordering::SeqCst)
    }
}

/// RaptorQ engine wrapper with injectable faults
#[derive(Debug, Clone, Default)]
pub struct FaultyEngine {
    fail_encode_at: Option<u32>,
    reject_ids: HashSet<u32>,
    counters: HandleCounters,
}

impl FaultyEngine {
    /// Engine that behaves like [`RaptorqEngine`] but counts handles
    pub fn healthy(counters: HandleCounters) -> Self {
        Self {
            fail_encode_at: None,
            reject_ids: HashSet::new(),
            counters,
        }
    }

    /// Engine whose encoders fail on `block_id`
    pub fn failing_at(block_id: u32, counters: HandleCounters) -> Self {
        Self {
            fail_encode_at: Some(block_id),
            ..Self::healthy(counters)
        }
    }

    /// Decoders created from now on reject these block ids
    pub fn rejecting(mut self, ids: impl IntoIterator<Item = u32>) -> Self {
        self.reject_ids.extend(ids);
        self
    }
}

impl ErasureEngine for FaultyEngine {
    type Encoder = CountedEncoder;
    type Decoder = CountedDecoder;

    fn create_encoder(
        &self,
        message: &[u8],
        block_size: u32,
    ) -> Result<CountedEncoder, SessionError> {
        let inner = RaptorqEngine.create_encoder(message, block_size)?;
        self.counters.encoders_created.fetch_add(1, Ordering::SeqCst);
        Ok(CountedEncoder {
            inner,
            fail_at: self.fail_encode_at,
            counters: self.counters.clone(),
        })
    }

    fn create_decoder(
        &self,
        message_size: u32,
        block_size: u32,
    ) -> Result<CountedDecoder, SessionError> {
        let inner = RaptorqEngine.create_decoder(message_size, block_size)?;
        self.counters.decoders_created.fetch_add(1, Ordering::SeqCst);
        Ok(CountedDecoder {
            inner,
            reject_ids: self.reject_ids.clone(),
            counters: self.counters.clone(),
        })
    }
}

/// Encoder handle produced by [`FaultyEngine`]
pub struct CountedEncoder {
    inner: RaptorqEncoder,
    fail_at: Option<u32>,
    counters: HandleCounters,
}

impl BlockEncoder for CountedEncoder {
    fn encode_block(&mut self, block_id: u32) -> Result<Bytes, SessionError> {
        if self.fail_at == Some(block_id) {
            return Err(SessionError::EncodeFailed {
                block_id,
                reason: "injected failure".to_string(),
            });
        }
        self.inner.encode_block(block_id)
    }
}

impl Drop for CountedEncoder {
    fn drop(&mut self) {
        self.counters.encoders_destroyed.fetch_add(1, Ordering::SeqCst);
    }
}

/// Decoder handle produced by [`FaultyEngine`]
pub struct CountedDecoder {
    inner: RaptorqDecoder,
    reject_ids: HashSet<u32>,
    counters: HandleCounters,
}

impl BlockDecoder for CountedDecoder {
    fn ingest_block(&mut self, block_id: u32, payload: &[u8]) -> IngestStatus {
        if self.reject_ids.contains(&block_id) {
            return IngestStatus::Rejected;
        }
        self.inner.ingest_block(block_id, payload)
    }

    fn try_recover(&mut self) -> Recovery {
        self.counters.recover_attempts.fetch_add(1, Ordering::SeqCst);
        self.inner.try_recover()
    }
}

impl Drop for CountedDecoder {
    fn drop(&mut self) {
        self.counters.decoders_destroyed.fetch_add(1, Ordering::SeqCst);
    }
}
