//! Long-haul throughput harness.
//!
//! Spawns the requested producer and consumer threads, each hammering one
//! queue and publishing its operation count into a cache-line-padded slot,
//! and prints aggregate and delta-window throughput every 10 seconds:
//!
//! ```sh
//! throughput mpmc [n_senders] [n_receivers]
//! throughput spsc [busy|park]
//! ```

use std::process::exit;
use std::str::FromStr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use weir::spsc::{self, WaitMode};
use weir::{RecvError, SendError, mpmc};

const CAPACITY: usize = 2 << 16;
const INTERVAL: Duration = Duration::from_secs(10);

/// One counter per worker thread, each on its own cache line so the racy
/// aggregation below never bounces the workers' lines.
#[repr(align(64))]
struct PaddedCount(AtomicU64);

impl PaddedCount {
    fn new() -> Self {
        Self(AtomicU64::new(0))
    }
}

fn counters(n: usize) -> Arc<Vec<PaddedCount>> {
    Arc::new((0..n).map(|_| PaddedCount::new()).collect())
}

fn sum(counts: &[PaddedCount]) -> u64 {
    counts.iter().map(|c| c.0.load(Ordering::Relaxed)).sum()
}

fn print_rates(side: &str, total: u64, delta: u64, since_start: Duration, since_last: Duration) {
    let total_ms = since_start.as_millis().max(1) as u64;
    let last_ms = since_last.as_millis().max(1) as u64;
    println!(
        "{side}: total: {} {side}/ms, {} ns/{side}. delta: {} {side}/ms, {} ns/{side}",
        total / total_ms,
        since_start.as_nanos() as u64 / total.max(1),
        delta / last_ms,
        since_last.as_nanos() as u64 / delta.max(1),
    );
}

fn report_loop(sent: Arc<Vec<PaddedCount>>, received: Arc<Vec<PaddedCount>>) -> ! {
    let start = Instant::now();
    let mut last_instant = start;
    let mut last_sent = sum(&sent);
    let mut last_received = sum(&received);

    loop {
        thread::sleep(INTERVAL);

        let total_sent = sum(&sent);
        let total_received = sum(&received);
        let now = Instant::now();

        print_rates(
            "send",
            total_sent,
            total_sent - last_sent,
            now - start,
            now - last_instant,
        );
        print_rates(
            "recv",
            total_received,
            total_received - last_received,
            now - start,
            now - last_instant,
        );

        last_sent = total_sent;
        last_received = total_received;
        last_instant = now;
    }
}

fn run_mpmc(n_senders: usize, n_receivers: usize) -> ! {
    let (tx, rx) = mpmc::channel::<i64>(CAPACITY);
    println!(
        "mpmc: capacity {CAPACITY}, {n_senders} sender(s), {n_receivers} receiver(s)"
    );

    let sent = counters(n_senders);
    let received = counters(n_receivers);

    for i in 0..n_receivers {
        let rx = rx.clone();
        let received = received.clone();
        thread::spawn(move || {
            let mut count = 0u64;
            loop {
                match rx.recv() {
                    Ok(_) => {
                        count += 1;
                        received[i].0.store(count, Ordering::Relaxed);
                    }
                    Err(RecvError) => return,
                }
            }
        });
    }

    for i in 0..n_senders {
        let tx = tx.clone();
        let sent = sent.clone();
        thread::spawn(move || {
            let mut count = 0u64;
            loop {
                match tx.send(123) {
                    Ok(()) => {
                        count += 1;
                        sent[i].0.store(count, Ordering::Relaxed);
                    }
                    Err(SendError(_)) => return,
                }
            }
        });
    }

    report_loop(sent, received)
}

fn run_spsc(mode: WaitMode) -> ! {
    let (mut tx, mut rx) = spsc::channel::<i64>(CAPACITY, mode);
    println!("spsc: capacity {CAPACITY}, wait mode {mode:?}");

    let sent = counters(1);
    let received = counters(1);

    {
        let received = received.clone();
        thread::spawn(move || {
            let mut count = 0u64;
            loop {
                let _ = rx.recv();
                count += 1;
                received[0].0.store(count, Ordering::Relaxed);
            }
        });
    }

    {
        let sent = sent.clone();
        thread::spawn(move || {
            let mut count = 0u64;
            loop {
                tx.send(123);
                count += 1;
                sent[0].0.store(count, Ordering::Relaxed);
            }
        });
    }

    report_loop(sent, received)
}

fn usage() -> ! {
    eprintln!("usage: throughput mpmc [n_senders] [n_receivers]");
    eprintln!("       throughput spsc [busy|park]");
    exit(2);
}

fn parse_count(arg: Option<&String>) -> usize {
    match arg {
        None => 1,
        Some(s) => match usize::from_str(s) {
            Ok(n) if n >= 1 => n,
            _ => {
                eprintln!("invalid thread count: {s}");
                usage();
            }
        },
    }
}

fn main() {
    let args: Vec<String> = std::env::args().collect();

    match args.get(1).map(String::as_str) {
        Some("mpmc") | None => {
            let n_senders = parse_count(args.get(2));
            let n_receivers = parse_count(args.get(3));
            run_mpmc(n_senders, n_receivers);
        }
        Some("spsc") => {
            let mode = match args.get(2).map(String::as_str) {
                Some("park") => WaitMode::Park,
                Some("busy") | None => WaitMode::Busy,
                Some(other) => {
                    eprintln!("invalid wait mode: {other}");
                    usage();
                }
            };
            run_spsc(mode);
        }
        Some(_) => usage(),
    }
}
