use core::{hint::black_box, num::NonZeroUsize, time::Duration};
use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use greeter::{Dispatcher, channel};
use std::time::Instant;
use tokio::runtime::Builder;

// Zero latency isolates the queue and scheduling overhead from the simulated
// work.
const NO_DELAY: Duration = Duration::ZERO;

#[derive(Clone, Copy, Debug)]
struct DispatchBenchParams {
    items: usize,
    workers: usize,
}

fn bench_dispatch(c: &mut Criterion) {
    let rt = Builder::new_multi_thread().enable_all().build().unwrap();
    let dispatcher = Dispatcher::new(NO_DELAY);

    let item_cases = [8, 1_024, 16_384];
    let worker_cases = [1, 5, 32];

    for &items in &item_cases {
        let names: Vec<String> = (0..items).map(|i| format!("name-{i}")).collect();

        let mut group = c.benchmark_group("dispatch/sequential");
        group.throughput(Throughput::Elements(items as u64));
        group.bench_function(format!("elems/{items}"), |b| {
            b.to_async(&rt).iter_custom(|iters| {
                let names = &names;
                async move {
                    let start = Instant::now();
                    for _ in 0..iters {
                        black_box(dispatcher.sequential(names).await);
                    }
                    start.elapsed()
                }
            });
        });
        group.finish();

        for &workers in &worker_cases {
            let params = DispatchBenchParams { items, workers };
            let num_workers = NonZeroUsize::new(params.workers).unwrap();

            let mut group = c.benchmark_group("dispatch/concurrent");
            group.throughput(Throughput::Elements(params.items as u64));
            group.bench_function(
                format!("elems/{}/workers/{}", params.items, params.workers),
                |b| {
                    b.to_async(&rt).iter_custom(|iters| {
                        let names = &names;
                        async move {
                            let start = Instant::now();
                            for _ in 0..iters {
                                black_box(dispatcher.concurrent(names, num_workers).await);
                            }
                            start.elapsed()
                        }
                    });
                },
            );
            group.finish();
        }
    }
}

fn bench_channel(c: &mut Criterion) {
    const TOTAL_ITEMS: usize = 4096;
    let rt = Builder::new_current_thread().enable_all().build().unwrap();

    let mut group = c.benchmark_group("channel/fill_then_drain");
    group.throughput(Throughput::Elements(TOTAL_ITEMS as u64));
    group.bench_function(format!("elems/{TOTAL_ITEMS}"), |b| {
        b.to_async(&rt).iter_custom(|iters| async move {
            let start = Instant::now();
            for _ in 0..iters {
                let (tx, rx) = channel(TOTAL_ITEMS);
                for i in 0..TOTAL_ITEMS {
                    tx.send(i).await;
                }
                tx.close();
                while let Some(i) = rx.recv().await {
                    black_box(i);
                }
            }
            start.elapsed()
        });
    });
    group.finish();
}

criterion_group!(benches, bench_dispatch, bench_channel);
criterion_main!(benches);
