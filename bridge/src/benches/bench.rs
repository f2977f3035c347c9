use criterion::criterion_main;

mod buffer;
mod commitment;
mod hex;

criterion_main!(hex::benches, buffer::benches, commitment::benches);
