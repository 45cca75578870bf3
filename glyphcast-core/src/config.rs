//! Stream configuration loaded from TOML

use std::time::Duration;

use serde::Deserialize;

use crate::constants::{
    DEFAULT_BLOCK_SIZE, DEFAULT_MISMATCH_ABORT_THRESHOLD, DEFAULT_TICK_INTERVAL_MS, HEADER_SIZE,
    MAX_BLOCK_SIZE, QR_MAX_BYTE_CAPACITY,
};
use crate::error::ConfigError;
use crate::symbol::max_frame_len;

/// Raw configuration as written by the user; every field is optional
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct StreamConfigInput {
    /// Payload bytes per block
    pub block_size: Option<u32>,
    /// Source data length
    pub message_size: Option<u32>,
    /// Scheduler cadence in milliseconds
    pub tick_interval_ms: Option<u64>,
    /// Bytes one optical symbol can hold
    pub symbol_capacity: Option<usize>,
    /// Consecutive foreign frames tolerated by a decode session
    pub mismatch_abort_threshold: Option<u32>,
}

/// Resolved and validated configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamConfig {
    /// Payload bytes per block
    pub block_size: u32,
    /// Source data length, when known up front (receiver side)
    pub message_size: Option<u32>,
    /// Scheduler cadence
    pub tick_interval: Duration,
    /// Bytes one optical symbol can hold
    pub symbol_capacity: usize,
    /// Consecutive foreign frames before a decode session gives up
    pub mismatch_abort_threshold: u32,
}

impl Default for StreamConfig {
    fn default() -> Self {
        Self {
            block_size: DEFAULT_BLOCK_SIZE,
            message_size: None,
            tick_interval: Duration::from_millis(DEFAULT_TICK_INTERVAL_MS),
            symbol_capacity: QR_MAX_BYTE_CAPACITY,
            mismatch_abort_threshold: DEFAULT_MISMATCH_ABORT_THRESHOLD,
        }
    }
}

impl StreamConfigInput {
    /// Parse raw input; an empty document yields all defaults
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        if input.trim().is_empty() {
            return Ok(Self::default());
        }
        toml::from_str(input).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Layer `overrides` on top of `self`; set fields in `overrides` win
    pub fn merge(self, overrides: StreamConfigInput) -> Self {
        Self {
            block_size: overrides.block_size.or(self.block_size),
            message_size: overrides.message_size.or(self.message_size),
            tick_interval_ms: overrides.tick_interval_ms.or(self.tick_interval_ms),
            symbol_capacity: overrides.symbol_capacity.or(self.symbol_capacity),
            mismatch_abort_threshold: overrides
                .mismatch_abort_threshold
                .or(self.mismatch_abort_threshold),
        }
    }

    /// Fill defaults and validate
    pub fn resolve(self) -> Result<StreamConfig, ConfigError> {
        let defaults = StreamConfig::default();

        let config = StreamConfig {
            block_size: self.block_size.unwrap_or(defaults.block_size),
            message_size: self.message_size,
            tick_interval: self
                .tick_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(defaults.tick_interval),
            symbol_capacity: self.symbol_capacity.unwrap_or(defaults.symbol_capacity),
            mismatch_abort_threshold: self
                .mismatch_abort_threshold
                .unwrap_or(defaults.mismatch_abort_threshold),
        };
        config.validate()?;
        Ok(config)
    }
}

impl StreamConfig {
    /// Parse and resolve a TOML document
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        StreamConfigInput::from_toml_str(input)?.resolve()
    }

    /// Largest block size whose framed, encoded form fits one symbol
    pub fn max_block_size(&self) -> usize {
        max_frame_len(self.symbol_capacity).saturating_sub(HEADER_SIZE)
    }

    /// Check value ranges and symbol fit
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.block_size == 0 || self.block_size > MAX_BLOCK_SIZE {
            return Err(ConfigError::Invalid {
                field: "block_size",
                reason: format!("must be in 1..={}", MAX_BLOCK_SIZE),
            });
        }
        if self.message_size == Some(0) {
            return Err(ConfigError::Invalid {
                field: "message_size",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.tick_interval.is_zero() {
            return Err(ConfigError::Invalid {
                field: "tick_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.block_size as usize > self.max_block_size() {
            return Err(ConfigError::Invalid {
                field: "block_size",
                reason: format!(
                    "{} byte blocks do not fit a {} byte symbol (max {})",
                    self.block_size,
                    self.symbol_capacity,
                    self.max_block_size()
                ),
            });
        }
        Ok(())
    }
}
