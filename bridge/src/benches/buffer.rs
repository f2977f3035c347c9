use criterion::{criterion_group, Criterion};
use kzg_bridge::{buffer, mocks, Blob, Session, BYTES_PER_FIELD_ELEMENT};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::hint::black_box;

fn bench_buffer(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut blob = Blob::zeroed();
    rng.fill_bytes(&mut blob);
    for element in blob.chunks_mut(BYTES_PER_FIELD_ELEMENT) {
        element[0] = 0;
    }

    let (g1_monomial, g1_lagrange, g2_monomial) = mocks::setup(0);
    let mut session = Session::<mocks::Engine>::default();
    session
        .load(&g1_monomial, &g1_lagrange, &g2_monomial, 0)
        .unwrap();
    let cells = session.compute_cells_and_proofs(&blob).unwrap();
    let encoded = buffer::encode(&cells).unwrap();

    let mut group = c.benchmark_group(module_path!());
    group.bench_function("op=encode", |b| {
        b.iter(|| black_box(buffer::encode(&cells).unwrap()));
    });
    group.bench_function("op=decode", |b| {
        b.iter(|| black_box(buffer::decode(&encoded).unwrap()));
    });
    group.finish();
}

criterion_group!(benches, bench_buffer);
