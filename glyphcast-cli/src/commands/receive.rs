use anyhow::{bail, Context, Result};
use colored::*;
use glyphcast_core::{
    config::StreamConfigInput,
    receiver::{DecodeSession, DecodeStatus, IngestStats},
};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs;
use tracing::{info, warn};

use super::{digest, load_config};

/// What a receive run recovered
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReceiveSummary {
    /// Symbol lines consumed before the session finished
    pub lines_read: usize,
    /// Distinct block ids accepted
    pub distinct_blocks: usize,
    /// Session counters
    pub stats: IngestStats,
    /// BLAKE3 digest of the recovered message
    pub digest: String,
}

/// Feed symbol lines from `input` to a decode session and write the message to `output`
///
/// The message size must come from the config file or `overrides`; the
/// receiver has no other way to learn it.
pub fn execute(
    input: &str,
    output: &str,
    config_path: Option<&str>,
    overrides: StreamConfigInput,
    progress: bool,
) -> Result<ReceiveSummary> {
    let config = load_config(config_path, overrides)?;
    let Some(message_size) = config.message_size else {
        bail!("Message size unknown; pass --message-size or set message_size in the config");
    };

    info!("Receiving from {} ({} bytes expected)", input, message_size);

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;

    let mut session = DecodeSession::start_raptorq(message_size, config.block_size)
        .context("Failed to start decoder")?
        .with_mismatch_abort_threshold(config.mismatch_abort_threshold);

    let spinner = if progress {
        let pb = ProgressBar::new_spinner();
        pb.set_style(ProgressStyle::with_template("{spinner} {msg}")?);
        Some(pb)
    } else {
        None
    };

    let mut lines_read = 0;
    for line in content.lines().filter(|l| !l.trim().is_empty()) {
        lines_read += 1;
        session.ingest(line.as_bytes());

        if let Some(pb) = &spinner {
            pb.set_message(format!(
                "{} symbols, {} distinct blocks",
                lines_read,
                session.seen_count()
            ));
            pb.tick();
        }
        if !session.is_collecting() {
            break;
        }
    }
    if let Some(pb) = spinner {
        pb.finish_and_clear();
    }

    print_stats(&session, lines_read);

    match session.status() {
        DecodeStatus::Complete(message) => {
            fs::write(output, message)
                .with_context(|| format!("Failed to write output file: {}", output))?;

            let message_digest = digest(message);
            info!(
                "Recovered {} bytes to {}, blake3 {}",
                message.len(),
                output,
                message_digest
            );
            println!("{} Message recovered", "✓".green());

            Ok(ReceiveSummary {
                lines_read,
                distinct_blocks: session.seen_count(),
                stats: session.stats().clone(),
                digest: message_digest,
            })
        }
        DecodeStatus::Aborted(reason) => {
            warn!("Decode session aborted: {}", reason);
            println!("{} Session aborted", "✗".red());
            bail!("Decode session aborted: {}", reason)
        }
        DecodeStatus::Collecting => {
            println!("{} Not enough blocks to recover", "✗".red());
            bail!(
                "Input ended after {} distinct blocks; message not recovered",
                session.seen_count()
            )
        }
    }
}

fn print_stats(session: &DecodeSession, lines_read: usize) {
    let stats = session.stats();

    println!("\n=== Receive Results ===");
    println!("Lines read:         {}", lines_read);
    println!(
        "Distinct blocks:    {}",
        session.seen_count().to_string().green()
    );
    println!("Duplicates:         {}", stats.duplicates);
    if stats.invalid_symbols > 0 {
        println!(
            "Invalid symbols:    {}",
            stats.invalid_symbols.to_string().red()
        );
    }
    if stats.malformed_frames > 0 {
        println!(
            "Malformed frames:   {}",
            stats.malformed_frames.to_string().red()
        );
    }
    if stats.mismatched_frames > 0 {
        println!(
            "Foreign frames:     {}",
            stats.mismatched_frames.to_string().yellow()
        );
    }
    if stats.rejected > 0 {
        println!("Rejected blocks:    {}", stats.rejected.to_string().yellow());
    }
    println!();
}
