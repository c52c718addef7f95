//! Benchmarks for context store operations.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ctxflow::context::ContextStore;

fn populated(entries: usize) -> ContextStore {
    let mut store = ContextStore::new();
    for i in 0..entries {
        store.put(format!("key-{i}").as_str(), "value").unwrap();
    }
    store
}

fn context_benchmark(c: &mut Criterion) {
    c.bench_function("put_in_place", |b| {
        let mut store = populated(8);
        b.iter(|| store.put("traceId", black_box("abc")).unwrap());
    });

    c.bench_function("put_after_snapshot", |b| {
        let mut store = populated(8);
        b.iter(|| {
            let snapshot = store.snapshot();
            store.put("traceId", black_box("abc")).unwrap();
            snapshot
        });
    });

    c.bench_function("inherit", |b| {
        let mut parent = populated(8);
        b.iter(|| ContextStore::inherit(parent.snapshot()));
    });
}

criterion_group!(benches, context_benchmark);
criterion_main!(benches);
