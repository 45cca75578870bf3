//! Encode session: cycles erasure-coded blocks for one message

use crate::encoder::encode_frame;
use crate::error::SessionError;
use crate::fec::{BlockEncoder, ErasureEngine, RaptorqEngine};
use crate::symbol::encode_symbol;
use crate::types::{Block, BlockHeader};
use bytes::Bytes;

#[cfg(feature = "logging")]
use tracing::{debug, info, warn};

/// Lifecycle of an encode session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SenderState {
    /// Created, no message bound yet
    Idle,
    /// Producing blocks
    Active,
    /// Stopped by the caller or by an encode failure; terminal
    Stopped,
}

impl SenderState {
    /// State name for diagnostics
    pub const fn name(&self) -> &'static str {
        match self {
            SenderState::Idle => "Idle",
            SenderState::Active => "Active",
            SenderState::Stopped => "Stopped",
        }
    }
}

/// One produced block, ready to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Emitted {
    /// Id of the block carried by this symbol
    pub block_id: u32,

    /// Payload bytes the engine wrote for this block
    pub written_len: u32,

    /// Transport-encoded frame
    pub symbol: String,
}

/// Sender-side session bound to one message
///
/// `produce_next` takes `&mut self`, so a session can never be driven by two
/// overlapping ticks.
pub struct EncodeSession<E: ErasureEngine = RaptorqEngine> {
    engine: E,
    handle: Option<E::Encoder>,
    message: Bytes,
    block_size: u32,
    next_block_id: u32,
    state: SenderState,
    failure: Option<SessionError>,
}

impl EncodeSession<RaptorqEngine> {
    /// Create and start a RaptorQ-backed session in one step
    pub fn start_raptorq(message: Bytes, block_size: u32) -> Result<Self, SessionError> {
        let mut session = Self::new(RaptorqEngine);
        session.start(message, block_size)?;
        Ok(session)
    }
}

impl<E: ErasureEngine> EncodeSession<E> {
    /// Create an idle session over `engine`
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            handle: None,
            message: Bytes::new(),
            block_size: 0,
            next_block_id: 0,
            state: SenderState::Idle,
            failure: None,
        }
    }

    /// Bind `message` and begin producing from block 0
    ///
    /// On `EngineInitFailed` the session stays idle and owns no handle.
    pub fn start(&mut self, message: Bytes, block_size: u32) -> Result<(), SessionError> {
        if self.state != SenderState::Idle {
            return Err(SessionError::InvalidState {
                operation: "start",
                state: self.state.name(),
            });
        }

        let handle = self.engine.create_encoder(&message, block_size)?;

        #[cfg(feature = "logging")]
        info!(
            "Encode session started: {} bytes, block size {}",
            message.len(),
            block_size
        );

        self.handle = Some(handle);
        self.message = message;
        self.block_size = block_size;
        self.next_block_id = 0;
        self.state = SenderState::Active;
        Ok(())
    }

    /// Produce the next framed, transport-encoded block
    ///
    /// An encode failure stops the session: the failure is returned from this
    /// call only, and every later call returns `Stopped`.
    pub fn produce_next(&mut self) -> Result<Emitted, SessionError> {
        match self.state {
            SenderState::Active => {}
            SenderState::Stopped => return Err(SessionError::Stopped),
            SenderState::Idle => {
                return Err(SessionError::InvalidState {
                    operation: "produce_next",
                    state: self.state.name(),
                })
            }
        }

        let block_id = self.next_block_id;
        let Some(handle) = self.handle.as_mut() else {
            return Err(SessionError::Stopped);
        };

        let payload = match handle.encode_block(block_id) {
            Ok(payload) => payload,
            Err(err) => {
                #[cfg(feature = "logging")]
                warn!("Encode failed at block {}: {}", block_id, err);

                self.failure = Some(err.clone());
                self.stop();
                return Err(err);
            }
        };

        let written_len = payload.len() as u32;
        let block = Block::new(
            BlockHeader::new(block_id, self.message.len() as u32, written_len),
            payload,
        );
        let frame = encode_frame(&block)?;
        let symbol = encode_symbol(&frame);

        #[cfg(feature = "logging")]
        debug!("Block ID: {}, Size: {} bytes", block_id, written_len);

        self.next_block_id = self.next_block_id.wrapping_add(1);

        Ok(Emitted {
            block_id,
            written_len,
            symbol,
        })
    }

    /// Stop producing and release the engine handle. Idempotent.
    pub fn stop(&mut self) {
        if let Some(handle) = self.handle.take() {
            drop(handle);

            #[cfg(feature = "logging")]
            debug!("Encode session stopped after {} blocks", self.next_block_id);
        }
        self.state = SenderState::Stopped;
    }

    /// Current lifecycle state
    pub fn state(&self) -> SenderState {
        self.state
    }

    /// Id the next produced block will carry
    pub fn next_block_id(&self) -> u32 {
        self.next_block_id
    }

    /// Nominal block size given at start
    pub fn block_size(&self) -> u32 {
        self.block_size
    }

    /// Length of the bound message
    pub fn message_size(&self) -> u32 {
        self.message.len() as u32
    }

    /// The encode failure that stopped this session, if any
    pub fn failure(&self) -> Option<&SessionError> {
        self.failure.as_ref()
    }
}

impl<E: ErasureEngine> Drop for EncodeSession<E> {
    fn drop(&mut self) {
        self.stop();
    }
}
