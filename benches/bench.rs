use criterion::{black_box, criterion_group, criterion_main, Criterion};
use futures_lite::future::{block_on, yield_now};
use futures_lite::prelude::*;
use futures_lite::stream;
use futures_pipelining::prelude::*;
use futures_pipelining::stream::merge_all;

fn criterion_benchmark(c: &mut Criterion) {
    for window in [1, 8, 64] {
        c.bench_function(&format!("buffered 1000 / window {window}"), |b| {
            b.iter(|| buffered_test(black_box(1000), window))
        });
        c.bench_function(&format!("buffered_unordered 1000 / window {window}"), |b| {
            b.iter(|| buffered_unordered_test(black_box(1000), window))
        });
    }
    c.bench_function("merge 10", |b| b.iter(|| merge_test(black_box(10))));
    c.bench_function("merge 100", |b| b.iter(|| merge_test(black_box(100))));
    c.bench_function("merge 1000", |b| b.iter(|| merge_test(black_box(1000))));
}

criterion_group!(benches, criterion_benchmark);
criterion_main!(benches);

/// A future which needs `n % 4 + 1` polls before it is ready, so the window
/// sees a mix of early and late finishers.
async fn work(n: usize) -> usize {
    for _ in 0..n % 4 {
        yield_now().await;
    }
    n
}

fn buffered_test(max: usize, window: usize) {
    block_on(async {
        let mut s = stream::iter(0..max)
            .map(work)
            .buffered(window)
            .unwrap()
            .into_stream();

        let mut counter = 0;
        while s.next().await.is_some() {
            counter += 1;
        }
        assert_eq!(counter, max);
    })
}

fn buffered_unordered_test(max: usize, window: usize) {
    block_on(async {
        let mut s = stream::iter(0..max)
            .map(work)
            .buffered_unordered(window)
            .unwrap()
            .into_stream();

        let mut counter = 0;
        while s.next().await.is_some() {
            counter += 1;
        }
        assert_eq!(counter, max);
    })
}

fn merge_test(max: usize) {
    block_on(async {
        let streams: Vec<_> = (0..max)
            .map(|n| stream::iter(0..4).then(move |i| work(n + i)).boxed_local())
            .collect();
        let mut s = merge_all(streams).into_stream();

        let mut counter = 0;
        while s.next().await.is_some() {
            counter += 1;
        }
        assert_eq!(counter, max * 4);
    })
}
