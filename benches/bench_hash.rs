use std::time::Duration;

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use yespower_opt::{Hasher, Params, Version};

fn bench_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash");
    let mut counter = 0u64;

    for (version, n, r) in [
        (Version::V1_0, 1024u32, 8u32),
        (Version::V1_0, 2048, 32),
        (Version::V0_5, 2048, 32),
    ] {
        let mut hasher = Hasher::new(Params::new(version, n, r)).unwrap();

        // arena traffic per hash
        group.throughput(Throughput::Bytes(128 * r as u64 * n as u64));
        group.sample_size(20);
        group.warm_up_time(Duration::from_secs(2));
        group.measurement_time(Duration::from_secs(5));

        let label = match version {
            Version::V1_0 => "yespower",
            Version::V0_5 => "yescrypt",
        };
        group.bench_function(format!("{label}/n={n}/r={r}"), |b| {
            b.iter(|| {
                counter += 1;
                core::hint::black_box(hasher.hash(&counter.to_le_bytes(), b""));
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_hash);
criterion_main!(benches);
