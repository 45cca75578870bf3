use bytes::Bytes;
use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion, Throughput};
use glyphcast_core::fec::{BlockDecoder, BlockEncoder, ErasureEngine, RaptorqEngine};

const MESSAGE_SIZE: usize = 64 * 1024;

fn bench_raptorq_encode(c: &mut Criterion) {
    let mut group = c.benchmark_group("raptorq_encode_block");
    let message: Vec<u8> = (0..MESSAGE_SIZE).map(|i| (i % 251) as u8).collect();

    for &block_size in &[256u32, 1024, 2048] {
        let k = MESSAGE_SIZE.div_ceil(block_size as usize) as u32;
        group.throughput(Throughput::Bytes(block_size as u64));
        group.bench_with_input(
            BenchmarkId::new("repair", block_size),
            &block_size,
            |b, &bs| {
                let mut encoder = RaptorqEngine.create_encoder(&message, bs).unwrap();
                let mut id = k;
                b.iter(|| {
                    let block = encoder.encode_block(id).unwrap();
                    id += 1;
                    block
                });
            },
        );
    }
    group.finish();
}

fn bench_raptorq_recover(c: &mut Criterion) {
    let mut group = c.benchmark_group("raptorq_recover");
    let message: Vec<u8> = (0..MESSAGE_SIZE).map(|i| (i * 7 % 256) as u8).collect();
    let block_size = 1024u32;
    let k = MESSAGE_SIZE.div_ceil(block_size as usize) as u32;

    // Half source, half repair, with a small margin
    let mut encoder = RaptorqEngine.create_encoder(&message, block_size).unwrap();
    let blocks: Vec<(u32, Bytes)> = (0..k / 2)
        .chain(k..k + k / 2 + 8)
        .map(|id| (id, encoder.encode_block(id).unwrap()))
        .collect();

    group.throughput(Throughput::Bytes(MESSAGE_SIZE as u64));
    group.bench_function("mixed_64k", |b| {
        b.iter_batched(
            || {
                RaptorqEngine
                    .create_decoder(MESSAGE_SIZE as u32, block_size)
                    .unwrap()
            },
            |mut decoder| {
                for (id, payload) in &blocks {
                    decoder.ingest_block(*id, payload);
                }
                decoder.try_recover()
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

criterion_group!(benches, bench_raptorq_encode, bench_raptorq_recover);
criterion_main!(benches);
