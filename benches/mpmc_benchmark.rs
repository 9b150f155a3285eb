use std::{
    hint::black_box,
    thread::spawn,
    time::{Duration, SystemTime},
};

use criterion::{
    BenchmarkGroup, Criterion, criterion_group, criterion_main, measurement::WallTime,
};
use weir::mpmc::channel;

fn make_group<'a>(c: &'a mut Criterion, name: &str) -> BenchmarkGroup<'a, WallTime> {
    let mut group = c.benchmark_group(name);
    group.measurement_time(Duration::from_secs(3));
    group.sample_size(50);
    group.warm_up_time(Duration::from_secs(1));

    group
}

fn benchmark(c: &mut Criterion) {
    // ==================== CONTENDED THROUGHPUT ====================
    let mut group = make_group(c, "mpmc_throughput");

    for (producers, consumers) in [(1u64, 1usize), (2, 2), (4, 4)] {
        group.bench_function(format!("{producers}p_{consumers}c"), |b| {
            b.iter_custom(move |iter| {
                let (tx, rx) = channel::<u64>(1024);

                let start = SystemTime::now();

                let senders: Vec<_> = (0..producers)
                    .map(|_| {
                        let tx = tx.clone();
                        spawn(move || {
                            for i in 0..iter / producers {
                                tx.send(black_box(i)).unwrap();
                            }
                        })
                    })
                    .collect();

                let receivers: Vec<_> = (0..consumers)
                    .map(|_| {
                        let rx = rx.clone();
                        spawn(move || {
                            while let Ok(x) = rx.recv() {
                                black_box(x);
                            }
                        })
                    })
                    .collect();

                for h in senders {
                    h.join().unwrap();
                }
                tx.close();
                for h in receivers {
                    h.join().unwrap();
                }

                start.elapsed().unwrap()
            });
        });
    }
    group.finish();

    // ==================== ROUNDTRIP LATENCY ====================
    let mut group = make_group(c, "mpmc_roundtrip_latency");

    for size in [16usize, 1024] {
        group.bench_function(format!("size_{size}"), |b| {
            b.iter_custom(move |iter| {
                let (tx1, rx1) = channel::<u64>(size);
                let (tx2, rx2) = channel::<u64>(size);

                spawn(move || {
                    for i in 0..iter {
                        let x = rx1.recv().unwrap();
                        black_box(x);
                        tx2.send(black_box(i)).unwrap();
                    }
                });

                let start = SystemTime::now();

                for i in 0..iter {
                    tx1.send(black_box(i)).unwrap();
                    let x = rx2.recv().unwrap();
                    black_box(x);
                }

                start.elapsed().unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
