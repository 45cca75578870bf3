//! Subcommand implementations

pub mod inspect;
pub mod receive;
pub mod send;
pub mod simulate;

use anyhow::{Context, Result};
use glyphcast_core::config::{StreamConfig, StreamConfigInput};
use std::fs;

/// Resolve the stream configuration from an optional TOML file plus flag overrides
pub fn load_config(path: Option<&str>, overrides: StreamConfigInput) -> Result<StreamConfig> {
    let file = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path))?;
            StreamConfigInput::from_toml_str(&text)
                .with_context(|| format!("Failed to parse config file: {}", path))?
        }
        None => StreamConfigInput::default(),
    };

    file.merge(overrides)
        .resolve()
        .context("Invalid stream configuration")
}

/// Hex BLAKE3 digest used to compare sent and recovered messages by eye
pub fn digest(data: &[u8]) -> String {
    blake3::hash(data).to_hex().to_string()
}
