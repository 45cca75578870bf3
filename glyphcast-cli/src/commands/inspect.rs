use anyhow::{Context, Result};
use glyphcast_core::{decoder::decode_frame, symbol::decode_symbol};
use serde::Serialize;
use std::collections::{BTreeSet, HashSet};
use std::fs;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InspectedFrame {
    /// 1-based line number in the input
    pub line: usize,
    pub block_id: u32,
    pub total_size: u32,
    pub block_size: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct InspectReport {
    pub lines: usize,
    pub frames: Vec<InspectedFrame>,
    pub invalid_symbols: usize,
    pub malformed_frames: usize,
    pub distinct_blocks: usize,
    /// Every message size announced by a frame header
    pub message_sizes: BTreeSet<u32>,
}

/// Decode every symbol line in `input` and list the frame headers found
pub fn execute(input: &str, output: Option<&str>, stats_only: bool) -> Result<InspectReport> {
    info!("Inspecting symbols in: {}", input);

    let content = fs::read_to_string(input)
        .with_context(|| format!("Failed to read input file: {}", input))?;

    let mut report = InspectReport::default();
    let mut seen = HashSet::new();

    for (index, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        report.lines += 1;

        let frame = match decode_symbol(line.as_bytes()) {
            Ok(frame) => frame,
            Err(_) => {
                report.invalid_symbols += 1;
                continue;
            }
        };
        let block = match decode_frame(&frame) {
            Ok(block) => block,
            Err(_) => {
                report.malformed_frames += 1;
                continue;
            }
        };

        seen.insert(block.header.block_id);
        report.message_sizes.insert(block.header.total_size);
        report.frames.push(InspectedFrame {
            line: index + 1,
            block_id: block.header.block_id,
            total_size: block.header.total_size,
            block_size: block.header.block_size,
        });
    }
    report.distinct_blocks = seen.len();

    println!("\n=== Inspect Results ===");
    println!("Symbol lines:       {}", report.lines);
    println!("Valid frames:       {}", report.frames.len());
    println!("Distinct blocks:    {}", report.distinct_blocks);
    println!("Invalid symbols:    {}", report.invalid_symbols);
    println!("Malformed frames:   {}", report.malformed_frames);
    println!("Message sizes:      {:?}", report.message_sizes);
    println!();

    if stats_only {
        return Ok(report);
    }

    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(&report.frames)
            .with_context(|| "Failed to serialize frame headers")?;

        fs::write(output_path, json)
            .with_context(|| format!("Failed to write output file: {}", output_path))?;

        info!("Frame headers written to: {}", output_path);
    } else {
        println!("=== Frames ===");
        for frame in &report.frames {
            println!(
                "Block {} @ line {}: {} bytes of a {} byte message",
                frame.block_id, frame.line, frame.block_size, frame.total_size
            );
        }
    }

    Ok(report)
}
