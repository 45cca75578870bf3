//! Lossy channel example
//!
//! Simulates a camera that misses a third of the symbols, reads some twice
//! and garbles a few, then recovers the message anyway.

use bytes::Bytes;
use glyphcast_core::{
    receiver::{DecodeSession, IngestOutcome},
    sender::EncodeSession,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Glyphcast Lossy Channel Example\n");

    let message: Vec<u8> = (0..5000u32).map(|i| (i * 31 % 256) as u8).collect();
    let block_size = 256;

    let mut sender = EncodeSession::start_raptorq(Bytes::from(message.clone()), block_size)?;
    let mut receiver = DecodeSession::start_raptorq(message.len() as u32, block_size)?;

    for tick in 0..200u32 {
        let emitted = sender.produce_next()?;

        // Every third symbol is missed entirely
        if tick % 3 == 0 {
            continue;
        }
        // Every seventh is cut short by a motion blur
        if tick % 7 == 0 {
            let half = &emitted.symbol.as_bytes()[..emitted.symbol.len() / 2];
            receiver.ingest(half);
            continue;
        }

        let outcome = receiver.ingest(emitted.symbol.as_bytes());
        // The camera lingers on some symbols
        if tick % 5 == 0 {
            receiver.ingest(emitted.symbol.as_bytes());
        }

        if let IngestOutcome::Completed(block_id) = outcome {
            println!("Recovered after {} ticks (last block {})", tick + 1, block_id);
            break;
        }
    }
    sender.stop();

    let stats = receiver.stats();
    println!("Symbols received: {}", stats.symbols_received);
    println!("Distinct blocks:  {}", receiver.seen_count());
    println!("Duplicates:       {}", stats.duplicates);
    println!("Dropped:          {}", stats.dropped());

    match receiver.message() {
        Some(recovered) if recovered.as_ref() == message.as_slice() => {
            println!("\n✓ Message recovered intact");
        }
        Some(_) => println!("\n✗ Recovered message differs"),
        None => println!("\n✗ Not enough blocks to recover"),
    }

    Ok(())
}
