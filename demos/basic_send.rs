//! Basic sending example
//!
//! Drives an encode session on a fixed cadence and prints each symbol the
//! display would render.

use std::ops::ControlFlow;
use std::time::Duration;

use bytes::Bytes;
use glyphcast_core::{scheduler::Ticker, sender::EncodeSession};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Glyphcast Basic Sending Example\n");

    let message = Bytes::from_static(
        b"Frames cross the air gap one barcode at a time; the camera never talks back.",
    );
    let mut session = EncodeSession::start_raptorq(message.clone(), 16)?;
    let ticker = Ticker::new(Duration::from_millis(30));

    let summary = ticker.run(&mut session, |emitted| {
        println!(
            "block {:>3} ({:>2} bytes): {}",
            emitted.block_id, emitted.written_len, emitted.symbol
        );
        if emitted.block_id >= 9 {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    })?;

    println!(
        "\nSent {} symbols for a {} byte message",
        summary.ticks,
        message.len()
    );

    Ok(())
}
