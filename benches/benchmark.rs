use criterion::{black_box, criterion_group, criterion_main, Criterion};
use rand::{rngs::StdRng, Rng, SeedableRng};

use forest::{BalancedMap, PrefixMap};

const N: usize = 100_000;

pub fn balanced_map(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let values: Vec<i32> = (1..=N).map(|_| rng.gen()).collect();

    c.bench_function("balanced_map_insert", |b| {
        b.iter(|| {
            let mut map = BalancedMap::new();
            for value in &values {
                let _ = map.insert(*value, *value);
            }
            map
        })
    });

    let mut map = BalancedMap::new();
    for value in &values {
        let _ = map.insert(*value, *value);
    }

    c.bench_function("balanced_map_get", |b| {
        b.iter(|| {
            for value in &values {
                black_box(map.get(value));
            }
        })
    });

    c.bench_function("balanced_map_remove", |b| {
        b.iter(|| {
            let mut map = map.clone();
            for value in &values {
                black_box(map.remove(value));
            }
        })
    });
}

pub fn prefix_map(c: &mut Criterion) {
    let mut rng = StdRng::seed_from_u64(0);
    let keys: Vec<Vec<u8>> = (1..=N)
        .map(|_| {
            let len = rng.gen_range(1..16);
            (0..len).map(|_| rng.gen_range(b'a'..=b'z')).collect()
        })
        .collect();

    c.bench_function("prefix_map_insert", |b| {
        b.iter(|| {
            let mut map = PrefixMap::new();
            for (i, key) in keys.iter().enumerate() {
                let _ = map.insert(key, i);
            }
            map
        })
    });

    let mut map = PrefixMap::new();
    for (i, key) in keys.iter().enumerate() {
        let _ = map.insert(key, i);
    }

    c.bench_function("prefix_map_get", |b| {
        b.iter(|| {
            for key in &keys {
                black_box(map.get(key));
            }
        })
    });

    c.bench_function("prefix_map_entries", |b| {
        b.iter(|| {
            for prefix in [&b""[..], &b"a"[..], &b"qu"[..], &b"xyz"[..]] {
                black_box(map.entries(prefix));
            }
        })
    });

    c.bench_function("prefix_map_remove", |b| {
        b.iter(|| {
            let mut map = map.clone();
            for key in &keys {
                black_box(map.remove(key));
            }
        })
    });
}

criterion_group!(benches, balanced_map, prefix_map);
criterion_main!(benches);
