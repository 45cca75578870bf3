//! Library entry for glyphcast-cli used by integration tests and embedding.

pub mod commands;

// Re-export commands for convenience
pub use commands::*;

pub use crate::commands::simulate::ChannelModel;
