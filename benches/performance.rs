//! Performance benchmarks for the FHIR search latency client
//!
//! Measures the CPU-side work done per search result and per run: Bundle
//! parsing, line formatting, sorting and timing statistics.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fhir_search_latency::{
    format_results, sort_by_given_name, SearchResult, Statistics, TimingCollector,
};
use serde_json::{json, Value};

/// Searchset Bundle with `count` patients
fn create_sample_bundle(count: usize) -> Value {
    let given = ["john", "Alice", "bob", "Zoe", "mary", "Émile"];
    let entries: Vec<Value> = (0..count)
        .map(|i| {
            json!({
                "resource": {
                    "resourceType": "Patient",
                    "id": format!("p{}", i),
                    "name": [{ "family": "Smith", "given": [given[i % given.len()], "X"] }],
                    "birthDate": format!("19{:02}-01-01", i % 100)
                }
            })
        })
        .collect();

    json!({ "resourceType": "Bundle", "type": "searchset", "total": count, "entry": entries })
}

fn create_sample_timings(count: usize) -> Vec<f64> {
    (0..count).map(|i| 80.0 + (i % 250) as f64 * 1.7).collect()
}

fn bench_bundle_parsing(c: &mut Criterion) {
    let mut group = c.benchmark_group("bundle_parsing");

    for size in [20, 100, 500] {
        let bundle = create_sample_bundle(size);
        group.bench_with_input(BenchmarkId::new("from_bundle", size), &bundle, |b, bundle| {
            b.iter(|| SearchResult::from_bundle(black_box(bundle.clone())))
        });
    }

    group.finish();
}

fn bench_formatting(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatting");

    for size in [20, 100, 500] {
        let Ok(results) = SearchResult::from_bundle(create_sample_bundle(size)) else {
            continue;
        };

        group.bench_with_input(BenchmarkId::new("format_results", size), &results, |b, results| {
            b.iter(|| format_results(black_box(results)))
        });
        group.bench_with_input(BenchmarkId::new("sort_by_given_name", size), &results, |b, results| {
            b.iter(|| sort_by_given_name(black_box(results)))
        });
    }

    group.finish();
}

fn bench_statistics(c: &mut Criterion) {
    let mut group = c.benchmark_group("statistics");

    for size in [10, 1_000, 10_000] {
        let timings = create_sample_timings(size);

        group.bench_with_input(BenchmarkId::new("from_samples", size), &timings, |b, timings| {
            b.iter(|| Statistics::from_samples(black_box(timings)))
        });
        group.bench_with_input(BenchmarkId::new("collector_average", size), &timings, |b, timings| {
            b.iter(|| {
                let mut collector = TimingCollector::new();
                for &t in timings {
                    collector.on_response(t);
                }
                collector.average()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_bundle_parsing, bench_formatting, bench_statistics);
criterion_main!(benches);
