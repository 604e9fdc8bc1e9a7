//! Topic matching and access evaluation benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use topicgate_authz::{access, topics, AccessLevel};

fn pattern_set(count: usize) -> Vec<String> {
    (0..count)
        .map(|i| match i % 4 {
            0 => format!("sensors/{i}/#"),
            1 => format!("devices/+/telemetry/{i}"),
            2 => format!("users/%u/inbox/{i}"),
            _ => format!("plain/topic/{i}"),
        })
        .collect()
}

fn bench_topic_matching(c: &mut Criterion) {
    let mut group = c.benchmark_group("topic_matching");

    group.bench_function("exact", |b| {
        b.iter(|| topics::matches(black_box("a/b/c/d"), black_box("a/b/c/d")))
    });

    group.bench_function("trailing_hash", |b| {
        b.iter(|| topics::matches(black_box("a/b/#"), black_box("a/b/c/d/e/f")))
    });

    group.bench_function("single_level_wildcards", |b| {
        b.iter(|| topics::matches(black_box("a/+/c/+/e"), black_box("a/b/c/d/e")))
    });

    group.bench_function("substituted", |b| {
        b.iter(|| {
            topics::matches_substituted(
                black_box("users/%u/devices/%c/#"),
                black_box("users/alice/devices/c1/state"),
                black_box("alice"),
                black_box("c1"),
            )
        })
    });

    group.finish();
}

fn bench_access_evaluation(c: &mut Criterion) {
    let mut group = c.benchmark_group("access_evaluation");

    for count in [8, 64, 256].iter() {
        let read = pattern_set(*count);
        let write = pattern_set(*count);

        group.bench_with_input(BenchmarkId::new("readwrite", count), count, |b, _| {
            b.iter(|| {
                access::evaluate(
                    AccessLevel::ReadWrite,
                    black_box(&read),
                    black_box(&write),
                    black_box("plain/topic/3"),
                    black_box("alice"),
                    black_box("c1"),
                )
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_topic_matching, bench_access_evaluation);
criterion_main!(benches);
