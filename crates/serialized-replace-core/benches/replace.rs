//! Benchmarks for the replacement engines.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use serialized_replace_core::{
    batch_replace, find_ascii_case_insensitive, find_ascii_case_insensitive_naive,
    replace_in_serialized, Replacement,
};

/// Replace-all of each pair in turn, the way a naive migration script would.
fn sequential_replace(data: &[u8], pairs: &[Replacement<'_>]) -> Vec<u8> {
    let mut current = data.to_vec();
    for pair in pairs {
        if pair.old.is_empty() {
            continue;
        }
        let mut next = Vec::with_capacity(current.len());
        let mut pos = 0;
        while pos < current.len() {
            if current[pos..].starts_with(&pair.old) {
                next.extend_from_slice(&pair.new);
                pos += pair.old.len();
            } else {
                next.push(current[pos]);
                pos += 1;
            }
        }
        current = next;
    }
    current
}

/// A WordPress-style options blob with `count` serialized URLs.
fn wordpress_options(count: usize) -> Vec<u8> {
    let items: String = (0..count)
        .map(|i| {
            let key = format!("option_{}", i);
            let value = format!("http://old.example.com/wp-content/uploads/{}.jpg", i);
            format!(
                "s:{}:\"{}\";s:{}:\"{}\";",
                key.len(),
                key,
                value.len(),
                value
            )
        })
        .collect();
    format!("a:{}:{{{}}}", count, items).into_bytes()
}

fn search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");

    let haystack = format!("{}NEEDLE{}", "x".repeat(100_000), "y".repeat(100));
    let haystack = haystack.as_bytes();
    group.throughput(Throughput::Bytes(haystack.len() as u64));
    group.bench_function("horspool_100kb", |b| {
        b.iter(|| find_ascii_case_insensitive(black_box(haystack), black_box(b"needle")))
    });
    group.bench_function("naive_100kb", |b| {
        b.iter(|| find_ascii_case_insensitive_naive(black_box(haystack), black_box(b"needle")))
    });

    group.finish();
}

fn serialized(c: &mut Criterion) {
    let mut group = c.benchmark_group("serialized");

    let short = br#"s:15:"http://old.com/";"#;
    group.throughput(Throughput::Bytes(short.len() as u64));
    group.bench_function("single_element", |b| {
        b.iter(|| {
            replace_in_serialized(
                black_box(short),
                black_box(b"http://old.com"),
                black_box(b"https://new.com"),
            )
        })
    });

    for count in [10, 1000] {
        let data = wordpress_options(count);
        group.throughput(Throughput::Bytes(data.len() as u64));
        group.bench_function(format!("wordpress_{}", count), |b| {
            b.iter(|| {
                replace_in_serialized(
                    black_box(&data),
                    black_box(b"http://old.example.com"),
                    black_box(b"https://new.example.org"),
                )
            })
        });
    }

    group.finish();
}

fn batch(c: &mut Criterion) {
    let mut group = c.benchmark_group("batch");

    let content = format!("{}xyz{}", "a".repeat(10_000), "a".repeat(10_000));
    let content = content.as_bytes();
    let single = [Replacement::from(("xyz", "abc"))];
    group.throughput(Throughput::Bytes(content.len() as u64));
    group.bench_function("single_pair_20kb", |b| {
        b.iter(|| batch_replace(black_box(content), black_box(&single)))
    });

    let data = wordpress_options(1000);
    let pairs: Vec<Replacement<'static>> = (0..20)
        .map(|i| {
            Replacement::from((
                format!("option_{}", i * 7).into_bytes(),
                format!("renamed_{}", i).into_bytes(),
            ))
        })
        .chain(std::iter::once(Replacement::from((
            b"http://old.example.com".to_vec(),
            b"https://new.example.org".to_vec(),
        ))))
        .collect();
    group.throughput(Throughput::Bytes(data.len() as u64));
    group.bench_function("many_pairs", |b| {
        b.iter(|| batch_replace(black_box(&data), black_box(&pairs)))
    });
    group.bench_function("many_pairs_sequential_baseline", |b| {
        b.iter(|| sequential_replace(black_box(&data), black_box(&pairs)))
    });

    group.finish();
}

criterion_group!(benches, search, serialized, batch);
criterion_main!(benches);
