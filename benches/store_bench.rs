//! Benchmarks for fsdb store operations

use std::hint::black_box;

use criterion::{criterion_group, criterion_main, Criterion};
use fsdb::Store;
use serde_json::json;
use tempfile::TempDir;

fn store_benchmarks(c: &mut Criterion) {
    let temp_dir = TempDir::new().unwrap();
    let store = Store::open_path(temp_dir.path()).unwrap();
    let value = json!({ "name": "bench", "tags": ["a", "b", "c"], "count": 42 });

    c.bench_function("write", |b| {
        b.iter(|| store.write("bench", "key", black_box(&value)).unwrap())
    });

    c.bench_function("read_cached", |b| {
        b.iter(|| {
            let v: serde_json::Value = store.read("bench", black_box("key")).unwrap();
            v
        })
    });

    // Reopening drops every cached document, so each read hits disk
    c.bench_function("read_cold", |b| {
        b.iter(|| {
            let reopened = Store::open_path(temp_dir.path()).unwrap();
            let v: serde_json::Value = reopened.read("bench", black_box("key")).unwrap();
            v
        })
    });
}

criterion_group!(benches, store_benchmarks);
criterion_main!(benches);
