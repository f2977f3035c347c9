use criterion::{criterion_group, BatchSize, Criterion, Throughput};
use kzg_bridge::{hex, BYTES_PER_BLOB, BYTES_PER_CELL, BYTES_PER_PROOF};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::hint::black_box;

fn bench_hex(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut group = c.benchmark_group(module_path!());
    for len in [BYTES_PER_PROOF, BYTES_PER_CELL, BYTES_PER_BLOB] {
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_function(format!("op=encode len={len}"), |b| {
            b.iter_batched(
                || {
                    let mut bytes = vec![0u8; len];
                    rng.fill_bytes(&mut bytes);
                    bytes
                },
                |bytes| black_box(hex::encode(&bytes)),
                BatchSize::SmallInput,
            );
        });
        group.bench_function(format!("op=decode len={len}"), |b| {
            b.iter_batched(
                || {
                    let mut bytes = vec![0u8; len];
                    rng.fill_bytes(&mut bytes);
                    hex::encode(&bytes)
                },
                |encoded| black_box(hex::decode(&encoded, len).unwrap()),
                BatchSize::SmallInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hex);
