use anyhow::{bail, Context, Result};
use bytes::Bytes;
use colored::*;
use glyphcast_core::{
    config::StreamConfigInput,
    receiver::{DecodeSession, IngestOutcome},
    sender::EncodeSession,
};
use rand::{rngs::StdRng, Rng, SeedableRng};
use serde::Serialize;
use std::fs;
use tracing::{debug, info};

use super::{digest, load_config};

/// How the simulated optical channel mistreats symbols
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelModel {
    /// Probability that a symbol is never scanned
    pub loss: f64,
    /// Probability that a scanned symbol is scanned again
    pub duplicate: f64,
    /// Probability that a scan is cut short
    pub truncate: f64,
    /// Symbols held back and released in random order
    pub reorder_window: usize,
    /// RNG seed, so runs are reproducible
    pub seed: u64,
}

impl ChannelModel {
    fn validate(&self) -> Result<()> {
        for (name, p) in [
            ("loss", self.loss),
            ("duplicate", self.duplicate),
            ("truncate", self.truncate),
        ] {
            if !(0.0..=1.0).contains(&p) {
                bail!("Channel {} probability must be within 0..=1, got {}", name, p);
            }
        }
        // A channel that loses everything can never recover
        if self.loss >= 1.0 {
            bail!("Channel loss must be below 1");
        }
        Ok(())
    }
}

impl Default for ChannelModel {
    fn default() -> Self {
        Self {
            loss: 0.2,
            duplicate: 0.1,
            truncate: 0.02,
            reorder_window: 8,
            seed: 0,
        }
    }
}

/// Outcome of a simulated transfer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationReport {
    pub message_size: u32,
    pub block_size: u32,
    pub source_blocks: u32,
    pub channel: ChannelModel,
    /// Symbols the sender produced
    pub symbols_sent: u64,
    /// Scans handed to the receiver, duplicates and damaged reads included
    pub symbols_delivered: u64,
    pub distinct_blocks: usize,
    pub duplicates: u64,
    pub dropped: u64,
    pub recovered: bool,
    /// Recovered message hashes the same as the sent one
    pub digest_match: bool,
    pub sent_digest: String,
    pub recovered_digest: Option<String>,
}

impl SimulationReport {
    /// Fail if a message was recovered but differs from the one sent
    ///
    /// Running out of symbols is not a failure; the report says so.
    pub fn verify(&self) -> Result<()> {
        if self.recovered && !self.digest_match {
            bail!(
                "Recovered message does not match the sent one (sent {}, recovered {})",
                self.sent_digest,
                self.recovered_digest.as_deref().unwrap_or("none")
            );
        }
        Ok(())
    }
}

/// Run a sender and receiver end to end over an in-memory lossy channel
///
/// The message is read from `input`, or generated from the channel seed when
/// no input is given. The sender stops after `max_symbols` symbols even if
/// the receiver has not recovered.
pub fn execute(
    input: Option<&str>,
    random_size: usize,
    config_path: Option<&str>,
    overrides: StreamConfigInput,
    channel: ChannelModel,
    max_symbols: u64,
    report: Option<&str>,
) -> Result<SimulationReport> {
    let config = load_config(config_path, overrides)?;
    channel.validate()?;
    let mut rng = StdRng::seed_from_u64(channel.seed);

    let message = match input {
        Some(path) => {
            fs::read(path).with_context(|| format!("Failed to read input file: {}", path))?
        }
        None => (0..random_size).map(|_| rng.gen()).collect(),
    };
    let sent_digest = digest(&message);
    let message_size = message.len() as u32;

    info!(
        "Simulating {} bytes in {} byte blocks, loss {:.0}%, duplicate {:.0}%",
        message_size,
        config.block_size,
        channel.loss * 100.0,
        channel.duplicate * 100.0
    );

    let mut sender = EncodeSession::start_raptorq(Bytes::from(message), config.block_size)
        .context("Failed to start encoder")?;
    let mut receiver = DecodeSession::start_raptorq(message_size, config.block_size)
        .context("Failed to start decoder")?
        .with_mismatch_abort_threshold(config.mismatch_abort_threshold);

    let mut in_flight: Vec<Vec<u8>> = Vec::new();
    let mut symbols_sent = 0u64;
    let mut symbols_delivered = 0u64;

    while symbols_sent < max_symbols && receiver.is_collecting() {
        let emitted = sender.produce_next().context("Encoding failed")?;
        symbols_sent += 1;

        if rng.gen_bool(channel.loss) {
            debug!("Channel lost block {}", emitted.block_id);
            continue;
        }

        let mut scan = emitted.symbol.into_bytes();
        if rng.gen_bool(channel.truncate) {
            let keep = rng.gen_range(0..scan.len().max(1));
            scan.truncate(keep);
        }
        if rng.gen_bool(channel.duplicate) {
            in_flight.push(scan.clone());
        }
        in_flight.push(scan);

        while in_flight.len() > channel.reorder_window {
            let pick = rng.gen_range(0..in_flight.len());
            let scan = in_flight.swap_remove(pick);
            symbols_delivered += 1;
            if let IngestOutcome::Completed(block_id) = receiver.ingest(&scan) {
                debug!("Block {} completed recovery", block_id);
            }
        }
    }

    // Flush whatever the reorder window still holds
    while receiver.is_collecting() && !in_flight.is_empty() {
        let pick = rng.gen_range(0..in_flight.len());
        let scan = in_flight.swap_remove(pick);
        symbols_delivered += 1;
        receiver.ingest(&scan);
    }
    sender.stop();

    let stats = receiver.stats();
    let recovered_digest = receiver.message().map(|m| digest(m));
    let report_data = SimulationReport {
        message_size,
        block_size: config.block_size,
        source_blocks: message_size.div_ceil(config.block_size),
        channel,
        symbols_sent,
        symbols_delivered,
        distinct_blocks: receiver.seen_count(),
        duplicates: stats.duplicates,
        dropped: stats.dropped(),
        recovered: receiver.is_complete(),
        digest_match: recovered_digest.as_deref() == Some(sent_digest.as_str()),
        sent_digest,
        recovered_digest,
    };

    print_report(&report_data);

    if let Some(path) = report {
        let json = serde_json::to_string_pretty(&report_data)
            .with_context(|| "Failed to serialize simulation report")?;
        fs::write(path, json).with_context(|| format!("Failed to write report: {}", path))?;
        info!("Report written to: {}", path);
    }

    report_data.verify()?;
    Ok(report_data)
}

fn print_report(report: &SimulationReport) {
    println!("\n=== Simulation Results ===");
    println!("Message size:       {} bytes", report.message_size);
    println!("Source blocks:      {}", report.source_blocks);
    println!("Symbols sent:       {}", report.symbols_sent);
    println!("Symbols delivered:  {}", report.symbols_delivered);
    println!("Distinct blocks:    {}", report.distinct_blocks);
    println!("Duplicates:         {}", report.duplicates);
    println!("Dropped:            {}", report.dropped);
    if report.source_blocks > 0 {
        println!(
            "Overhead:           {:.2}x",
            report.symbols_sent as f64 / report.source_blocks as f64
        );
    }
    println!();

    if report.digest_match {
        println!("{} Message recovered intact", "✓".green());
    } else if report.recovered {
        println!("{} Recovered message differs from the sent one", "✗".red());
    } else {
        println!("{} Not recovered within the symbol budget", "✗".red());
    }
}
