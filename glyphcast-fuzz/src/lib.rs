//! Fuzz entry points for glyphcast-core
//!
//! Each function must return without panicking for any input. To drive
//! them with cargo-fuzz, call them from `fuzz_target!` bodies:
//! 1. Install cargo-fuzz: cargo install cargo-fuzz
//! 2. Run fuzzer: cargo fuzz run fuzz_ingest

use glyphcast_core::receiver::DecodeSession;

pub fn fuzz_decode_frame(data: &[u8]) {
    use glyphcast_core::decoder::decode_frame;

    // Try to decode - should never panic
    let _ = decode_frame(data);
}

pub fn fuzz_decode_symbol(data: &[u8]) {
    use glyphcast_core::symbol::decode_symbol;

    let _ = decode_symbol(data);
}

/// Feed `data` to a decode session, both as a raw scan and split into lines
///
/// The first four bytes pick the session parameters so the fuzzer can reach
/// the engine with frames that match them.
pub fn fuzz_ingest(data: &[u8]) {
    let (message_size, block_size, rest) = match data {
        [a, b, c, d, rest @ ..] => (
            u16::from_ne_bytes([*a, *b]) as u32 + 1,
            u16::from_ne_bytes([*c, *d]) as u32 % 2048 + 1,
            rest,
        ),
        _ => (1024, 256, data),
    };

    let Ok(mut session) = DecodeSession::start_raptorq(message_size, block_size) else {
        return;
    };

    session.ingest(rest);
    session.ingest_frame(rest);
    for line in rest.split(|&b| b == b'\n') {
        session.ingest(line);
        session.ingest_frame(line);
    }
}
