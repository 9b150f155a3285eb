use std::{
    hint::black_box,
    thread::spawn,
    time::{Duration, SystemTime},
};

use criterion::{
    BenchmarkGroup, Criterion, criterion_group, criterion_main, measurement::WallTime,
};
use weir::spsc::{WaitMode, channel};

fn make_group<'a>(c: &'a mut Criterion, name: &str) -> BenchmarkGroup<'a, WallTime> {
    let mut group = c.benchmark_group(name);
    group.measurement_time(Duration::from_secs(3));
    group.sample_size(50);
    group.warm_up_time(Duration::from_secs(1));

    group
}

fn benchmark(c: &mut Criterion) {
    const SIZES: [usize; 3] = [512, 4096, 65_536];

    for mode in [WaitMode::Busy, WaitMode::Park] {
        // ==================== ROUNDTRIP LATENCY ====================
        let mut group = make_group(c, &format!("spsc_roundtrip_latency_{mode:?}"));

        for size in SIZES {
            group.bench_function(format!("size_{size}"), |b| {
                b.iter_custom(move |iter| {
                    let (mut tx1, mut rx1) = channel::<u64>(size, mode);
                    let (mut tx2, mut rx2) = channel::<u64>(size, mode);

                    let iter = iter as usize;

                    spawn(move || {
                        for i in 0..iter {
                            let x = rx1.recv();
                            black_box(x);
                            tx2.send(black_box(i as u64));
                        }
                    });

                    let start = SystemTime::now();

                    for i in 0..iter {
                        tx1.send(black_box(i as u64));
                        let x = rx2.recv();
                        black_box(x);
                    }

                    start.elapsed().unwrap()
                });
            });
        }
        group.finish();

        // ==================== ONE-WAY THROUGHPUT ====================
        let mut group = make_group(c, &format!("spsc_throughput_{mode:?}"));

        for size in SIZES {
            group.bench_function(format!("size_{size}"), |b| {
                b.iter_custom(move |iter| {
                    let (mut tx, mut rx) = channel::<u64>(size, mode);

                    let producer = spawn(move || {
                        for i in 0..iter {
                            tx.send(black_box(i));
                        }
                    });

                    let start = SystemTime::now();

                    for _ in 0..iter {
                        let x = rx.recv();
                        black_box(x);
                    }

                    let elapsed = start.elapsed().unwrap();
                    producer.join().unwrap();
                    elapsed
                });
            });
        }
        group.finish();
    }
}

criterion_group!(benches, benchmark);
criterion_main!(benches);
