use criterion::{criterion_group, Criterion};
use kzg_bridge::{boundary, Blob, CKzg, Session, BYTES_PER_FIELD_ELEMENT};
use rand::{rngs::StdRng, RngCore, SeedableRng};
use std::{hint::black_box, time::Duration};

fn blob(rng: &mut StdRng) -> String {
    let mut blob = Blob::zeroed();
    rng.fill_bytes(&mut blob);
    for element in blob.chunks_mut(BYTES_PER_FIELD_ELEMENT) {
        element[0] = 0;
    }
    blob.to_hex()
}

fn bench_commitment(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let mut group = c.benchmark_group(module_path!());
    group.measurement_time(Duration::from_secs(10));
    group.sample_size(10);

    for precompute in [0, 8] {
        let mut session = Session::<CKzg>::default();
        session.load_ethereum(precompute).unwrap();
        let blob = blob(&mut rng);
        let commitment = boundary::blob_to_kzg_commitment(&session, &blob);
        let proof = boundary::compute_blob_kzg_proof(&session, &blob, &commitment);

        group.bench_function(format!("op=commit precompute={precompute}"), |b| {
            b.iter(|| black_box(boundary::blob_to_kzg_commitment(&session, &blob)));
        });
        group.bench_function(format!("op=verify_blob precompute={precompute}"), |b| {
            b.iter(|| {
                black_box(boundary::verify_blob_kzg_proof(
                    &session,
                    &blob,
                    &commitment,
                    &proof,
                ))
            });
        });
        group.bench_function(format!("op=cells precompute={precompute}"), |b| {
            b.iter(|| black_box(boundary::compute_cells_and_kzg_proofs(&session, &blob)));
        });
    }
    group.finish();
}

criterion_group!(benches, bench_commitment);
