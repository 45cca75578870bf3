use bytes::Bytes;
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use glyphcast_core::{
    decoder::decode_frame,
    encoder::BlockBuilder,
    symbol::{decode_symbol, encode_symbol},
};

fn bench_encode_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("encode_frame");

    for size in [256, 1024, 2048] {
        let payload = Bytes::from(vec![0x42u8; size]);

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &size, |b, _| {
            b.iter(|| {
                BlockBuilder::new(1)
                    .total_size(1 << 20)
                    .payload(payload.clone())
                    .build()
                    .unwrap()
            });
        });
    }

    group.finish();
}

fn bench_decode_frame(c: &mut Criterion) {
    let mut group = c.benchmark_group("decode_frame");

    for size in [256, 1024, 2048] {
        let encoded = BlockBuilder::new(1)
            .total_size(1 << 20)
            .payload(Bytes::from(vec![0x42u8; size]))
            .build()
            .unwrap();

        group.throughput(Throughput::Bytes(encoded.len() as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &encoded, |b, data| {
            b.iter(|| decode_frame(black_box(data)).unwrap());
        });
    }

    group.finish();
}

fn bench_symbol_round_trip(c: &mut Criterion) {
    let mut group = c.benchmark_group("symbol_round_trip");

    for size in [256, 1024, 2214] {
        let frame = vec![0xA5u8; size];

        group.throughput(Throughput::Bytes(size as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &frame, |b, data| {
            b.iter(|| {
                let symbol = encode_symbol(black_box(data));
                black_box(decode_symbol(symbol.as_bytes()).unwrap());
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_encode_frame,
    bench_decode_frame,
    bench_symbol_round_trip
);
criterion_main!(benches);
