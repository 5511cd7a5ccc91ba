use std::hint::black_box;

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use offsearch::hamming::hex_distance;
use rand::prelude::*;

fn random_fingerprint(rng: &mut impl Rng) -> String {
    (0..16).map(|_| char::from_digit(rng.random_range(0..16), 16).unwrap()).collect()
}

fn bench_hex_distance(c: &mut Criterion) {
    let mut group = c.benchmark_group("Hamming");
    let mut rng = rand::rng();

    let query = random_fingerprint(&mut rng);
    let store: Vec<String> = (0..10_000).map(|_| random_fingerprint(&mut rng)).collect();

    group.throughput(Throughput::Elements(store.len() as u64));
    group.bench_function("hex_distance_scan", |b| {
        b.iter(|| {
            store.iter().map(|fingerprint| hex_distance(black_box(&query), fingerprint)).sum::<u32>()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_hex_distance);
criterion_main!(benches);
