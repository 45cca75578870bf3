use anyhow::{Context, Result};
use bytes::Bytes;
use glyphcast_core::{config::StreamConfigInput, scheduler::Ticker, sender::EncodeSession};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::ops::ControlFlow;
use tracing::{info, warn};

use super::{digest, load_config};

/// What a send run produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SendSummary {
    /// Symbols written to the output
    pub symbols: u64,
    /// Bytes in the sent message
    pub message_size: u32,
    /// Payload bytes per block
    pub block_size: u32,
    /// BLAKE3 digest of the message
    pub digest: String,
}

/// Encode `input` and write one transport symbol per line to `output`
///
/// Symbols are produced on the configured tick cadence, standing in for a
/// display that refreshes one barcode per tick. Without `count` the run
/// covers every source block twice.
pub fn execute(
    input: &str,
    output: &str,
    config_path: Option<&str>,
    overrides: StreamConfigInput,
    count: Option<u64>,
) -> Result<SendSummary> {
    let config = load_config(config_path, overrides)?;
    info!("Sending {} to {}", input, output);

    let message =
        fs::read(input).with_context(|| format!("Failed to read input file: {}", input))?;
    let message_digest = digest(&message);
    let message_size = message.len();

    let mut session = EncodeSession::start_raptorq(Bytes::from(message), config.block_size)
        .with_context(|| format!("Failed to start encoder for {}", input))?;

    let limit = count.unwrap_or_else(|| {
        let source_blocks = message_size.div_ceil(config.block_size as usize) as u64;
        source_blocks * 2
    });

    info!(
        "Message: {} bytes, block size {}, blake3 {}",
        message_size, config.block_size, message_digest
    );

    let file = File::create(output)
        .with_context(|| format!("Failed to create output file: {}", output))?;
    let mut writer = BufWriter::new(file);
    let mut write_error = None;
    let mut written = 0u64;

    let ticker = Ticker::new(config.tick_interval);
    let run = ticker.run(&mut session, |emitted| {
        if written >= limit {
            return ControlFlow::Break(());
        }
        if let Err(err) = writeln!(writer, "{}", emitted.symbol) {
            write_error = Some(err);
            return ControlFlow::Break(());
        }
        written += 1;
        info!("block {} / {} bytes", emitted.block_id, emitted.written_len);

        if written >= limit {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    });

    if let Err(err) = run {
        warn!("Encoding stopped after {} symbols: {}", written, err);
        writer.flush().ok();
        return Err(err).context("Encoding failed");
    }
    if let Some(err) = write_error {
        return Err(err).with_context(|| format!("Failed to write output file: {}", output));
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write output file: {}", output))?;

    info!("Wrote {} symbols to {}", written, output);

    Ok(SendSummary {
        symbols: written,
        message_size: message_size as u32,
        block_size: config.block_size,
        digest: message_digest,
    })
}
