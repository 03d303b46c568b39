use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use hashring::partitioner::Xxh3Partitioner;
use hashring::ring::radix_sort;
use hashring::{HashRing, Server, DEFAULT_REPLICA_POINTS};

fn unsorted_positions(len: usize) -> Vec<u64> {
    (0..len as u64)
        .map(|i| i.wrapping_mul(0x9E37_79B9_7F4A_7C15))
        .collect()
}

fn bench_sort(c: &mut Criterion) {
    let mut group = c.benchmark_group("sort_10k_positions");
    let input = unsorted_positions(10_000);

    group.bench_function("radix", |b| {
        b.iter_batched(
            || (input.clone(), vec![0u64; input.len()]),
            |(mut values, mut scratch)| {
                radix_sort(&mut values, &mut scratch);
                values
            },
            BatchSize::SmallInput,
        )
    });
    group.bench_function("std_unstable", |b| {
        b.iter_batched(
            || input.clone(),
            |mut values| {
                values.sort_unstable();
                values
            },
            BatchSize::SmallInput,
        )
    });
    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let ring = HashRing::new(DEFAULT_REPLICA_POINTS, Xxh3Partitioner);
    let servers: Vec<Server> = (0..100)
        .map(|i| Server::new(format!("10.0.{}.{}:3000", i / 256, i % 256)))
        .collect();
    ring.add_servers(&servers);

    c.bench_function("lookup", |b| b.iter(|| ring.lookup(black_box("user:12345"))));
    c.bench_function("lookup_n_unique_3", |b| {
        b.iter(|| ring.lookup_n_unique(black_box("user:12345"), 3))
    });
}

criterion_group!(benches, bench_sort, bench_lookup);
criterion_main!(benches);
