//! Wire format test vectors
//!
//! Each vector pairs a frame with its exact byte layout and transport text.
//! Header fields use the host's byte order, so expected bytes are assembled
//! with `to_ne_bytes` rather than written out literally.

use bytes::Bytes;
use glyphcast_core::{
    decoder::{decode_frame, decode_header},
    encoder::BlockBuilder,
    receiver::{DecodeSession, IngestOutcome},
    symbol::{decode_symbol, encode_symbol},
    FrameError,
};

struct Vector {
    name: &'static str,
    block_id: u32,
    total_size: u32,
    payload: &'static [u8],
}

const VECTORS: &[Vector] = &[
    Vector {
        name: "empty payload",
        block_id: 0,
        total_size: 0,
        payload: b"",
    },
    Vector {
        name: "single byte",
        block_id: 1,
        total_size: 1,
        payload: b"\x7f",
    },
    Vector {
        name: "ascii text",
        block_id: 0x0102_0304,
        total_size: 11,
        payload: b"hello world",
    },
    Vector {
        name: "max ids",
        block_id: u32::MAX,
        total_size: u32::MAX,
        payload: b"\x00\xff\x00\xff",
    },
];

fn expected_bytes(v: &Vector) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&v.block_id.to_ne_bytes());
    out.extend_from_slice(&v.total_size.to_ne_bytes());
    out.extend_from_slice(&(v.payload.len() as u32).to_ne_bytes());
    out.extend_from_slice(v.payload);
    out
}

#[test]
fn test_frame_vectors_encode() {
    for v in VECTORS {
        let frame = BlockBuilder::new(v.block_id)
            .total_size(v.total_size)
            .payload(Bytes::from_static(v.payload))
            .build()
            .unwrap();
        assert_eq!(frame.as_ref(), expected_bytes(v).as_slice(), "{}", v.name);
    }
}

#[test]
fn test_frame_vectors_decode() {
    for v in VECTORS {
        let block = decode_frame(&expected_bytes(v)).unwrap();
        assert_eq!(block.header.block_id, v.block_id, "{}", v.name);
        assert_eq!(block.header.total_size, v.total_size, "{}", v.name);
        assert_eq!(block.header.block_size as usize, v.payload.len(), "{}", v.name);
        assert_eq!(block.payload.as_ref(), v.payload, "{}", v.name);
    }
}

#[test]
fn test_header_only_vector() {
    let bytes = expected_bytes(&VECTORS[2]);
    let header = decode_header(&bytes[..12]).unwrap();
    assert_eq!(header.block_id, 0x0102_0304);
    assert_eq!(header.block_size, 11);
}

#[test]
fn test_symbol_vectors() {
    // RFC 4648 section 10
    let cases: &[(&[u8], &str)] = &[
        (b"", ""),
        (b"f", "Zg=="),
        (b"fo", "Zm8="),
        (b"foo", "Zm9v"),
        (b"foob", "Zm9vYg=="),
        (b"fooba", "Zm9vYmE="),
        (b"foobar", "Zm9vYmFy"),
    ];

    for (raw, text) in cases {
        assert_eq!(encode_symbol(raw), *text);
        assert_eq!(decode_symbol(text.as_bytes()).unwrap(), *raw);
    }
}

#[test]
fn test_framed_symbol_vector() {
    let v = &VECTORS[1];
    let frame = expected_bytes(v);
    let symbol = encode_symbol(&frame);

    // 13 bytes become five full 4-character units, the last padded twice
    assert_eq!(symbol.len(), 20);
    assert!(symbol.ends_with("=="));
    assert_eq!(decode_symbol(symbol.as_bytes()).unwrap(), frame);
}

#[test]
fn test_truncated_vector() {
    let frame = expected_bytes(&VECTORS[2]);

    for len in [0, 5, 11] {
        assert!(matches!(
            decode_frame(&frame[..len]),
            Err(FrameError::Malformed { expected: 12, .. })
        ));
    }
    assert_eq!(
        decode_frame(&frame[..frame.len() - 3]),
        Err(FrameError::Malformed {
            expected: 23,
            actual: 20
        })
    );
}

#[test]
fn test_trailing_bytes_vector() {
    let mut frame = expected_bytes(&VECTORS[2]);
    frame.push(0);

    assert_eq!(
        decode_frame(&frame),
        Err(FrameError::Malformed {
            expected: 23,
            actual: 24
        })
    );
}

#[test]
fn test_garbage_symbol_vectors() {
    let mut session = DecodeSession::start_raptorq(11, 11).unwrap();

    for raw in [&b"%%%%"[..], b"Zm9vY", b"AAAA", b"\xff\xfe"] {
        assert!(matches!(session.ingest(raw), IngestOutcome::Dropped(_)));
    }
    assert!(session.is_collecting());
    assert_eq!(session.seen_count(), 0);
}
