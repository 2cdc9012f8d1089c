use ad_cuckoo_map::{CuckooConfig, CuckooMap};
use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};

fn filled_map(count: u64, init_capacity: usize) -> CuckooMap<u64> {
    let mut map: CuckooMap<u64> = CuckooMap::with_config(CuckooConfig {
        init_capacity,
        max_replace_size: 100,
    });
    for key in 0..count {
        map.insert(key, key.wrapping_mul(2654435761), false);
    }
    map
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert");
    for &count in &[1_000u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || CuckooMap::<u64>::with_config(CuckooConfig {
                    init_capacity: (count as usize).next_power_of_two(),
                    max_replace_size: 100,
                }),
                |mut map| {
                    for key in 0..count {
                        black_box(map.insert(key, key, false));
                    }
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit");
    for &count in &[1_000u64, 10_000, 100_000] {
        let map = filled_map(count, (count as usize).next_power_of_two());
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                for key in 0..count {
                    black_box(map.get(black_box(key)));
                }
            });
        });
    }
    group.finish();
}

fn bench_get_miss(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_miss");
    for &count in &[1_000u64, 10_000, 100_000] {
        let map = filled_map(count, (count as usize).next_power_of_two());
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                for key in count..(count * 2) {
                    black_box(map.get(black_box(key)));
                }
            });
        });
    }
    group.finish();
}

fn bench_erase(c: &mut Criterion) {
    let mut group = c.benchmark_group("erase");
    for &count in &[1_000u64, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter_batched(
                || filled_map(count, (count as usize).next_power_of_two()),
                |mut map| {
                    for key in 0..count {
                        black_box(map.erase(black_box(key)));
                    }
                },
                criterion::BatchSize::LargeInput,
            );
        });
    }
    group.finish();
}

criterion_group!(benches, bench_insert, bench_get_hit, bench_get_miss, bench_erase);
criterion_main!(benches);
