//! # Glyphcast Core
//!
//! Erasure-coded transport for a one-way optical channel: a screen cycling
//! barcodes, read by a camera, with no path back to the sender.
//!
//! ## Modules
//!
//! - `constants`: Wire format constants and limits
//! - `types`: Core types (Block, BlockHeader)
//! - `encoder`: Frame encoding
//! - `decoder`: Strict frame decoding
//! - `symbol`: Transport symbol codec (base64)
//! - `fec`: Erasure engine adapter and the RaptorQ engine
//! - `sender`: Encode session
//! - `receiver`: Decode session
//! - `scheduler`: Fixed-cadence driver for encode sessions
//! - `config`: TOML stream configuration
//! - `testkit`: Fault-injecting engine for exercising sessions

#![warn(missing_docs)]

pub mod config;
pub mod constants;
pub mod decoder;
pub mod encoder;
pub mod error;
pub mod fec;
pub mod receiver;
pub mod scheduler;
pub mod sender;
pub mod symbol;
pub mod testkit;
pub mod types;

// Re-export commonly used types
pub use error::{ConfigError, FrameError, SessionError};
pub use receiver::{DecodeSession, DecodeStatus, IngestOutcome};
pub use sender::{EncodeSession, Emitted, SenderState};
pub use types::{Block, BlockHeader};

/// Result type alias for per-frame operations
pub type Result<T> = core::result::Result<T, FrameError>;
