//! Error types for Glyphcast operations

use thiserror::Error;

/// Per-frame errors. These are expected on a noisy optical channel and are
/// absorbed by the decode session rather than surfaced to its caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FrameError {
    /// Frame is shorter than its header or its declared payload
    #[error("Malformed frame: expected {expected} bytes, got {actual}")]
    Malformed {
        /// The number of bytes expected.
        expected: usize,
        /// The number of bytes actually found.
        actual: usize,
    },

    /// Block header and payload disagree on the payload length
    #[error("Payload length mismatch: header says {declared}, actual {actual}")]
    LengthMismatch {
        /// Payload length declared in the header.
        declared: u32,
        /// Payload length actually present.
        actual: usize,
    },

    /// Symbol text is not valid transport encoding
    #[error("Invalid symbol: {0}")]
    InvalidSymbol(String),
}

/// Session-level errors. Each is reported to the owning caller exactly once.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    /// The erasure engine refused the session parameters
    #[error("Erasure engine initialization failed: {0}")]
    EngineInitFailed(String),

    /// The erasure engine could not produce a block
    #[error("Encode failed at block {block_id}: {reason}")]
    EncodeFailed {
        /// Block id that failed.
        block_id: u32,
        /// Engine-provided reason.
        reason: String,
    },

    /// The session has stopped and produces nothing further
    #[error("Session stopped")]
    Stopped,

    /// Operation not valid in the current session state
    #[error("Operation '{operation}' not valid in state {state}")]
    InvalidState {
        /// The rejected operation.
        operation: &'static str,
        /// The state the session was in.
        state: &'static str,
    },

    /// Building a frame for a produced block failed
    #[error("Frame error: {0}")]
    Frame(#[from] FrameError),
}

/// Configuration parsing and validation errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// TOML could not be parsed
    #[error("Invalid config TOML: {0}")]
    Parse(String),

    /// A value failed validation
    #[error("Invalid value for {field}: {reason}")]
    Invalid {
        /// Offending field name.
        field: &'static str,
        /// Why it was rejected.
        reason: String,
    },
}
