//! Single-producer single-consumer (SPSC) queue.
//!
//! The ring is synchronized through a single cache-line-padded occupancy
//! counter: the producer's increment publishes each write, the consumer's
//! decrement releases each slot. The write and read cursors are plain
//! values, each owned by exactly one side and each on its own cache line.
//!
//! The wait strategy is fixed at construction:
//!
//! - [`WaitMode::Busy`] spins on the counter. Lowest latency, burns a core
//!   while blocked.
//! - [`WaitMode::Park`] blocks on a condition variable once the queue is
//!   saturated (full on the producer side, empty on the consumer side).
//!   Wakeup latency is microseconds instead of nanoseconds, idle CPU is
//!   near zero.
//!
//! # When to use
//!
//! Use this queue for 1-to-1 thread communication; the single-role
//! restriction is what makes the counter protocol sufficient. For many
//! senders or receivers, use [`mpmc`](crate::mpmc).

pub use self::{receiver::Receiver, sender::Sender};

mod queue;
mod receiver;
mod sender;

/// How an endpoint waits when the queue cannot make progress.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WaitMode {
    /// Busy-spin on the occupancy counter.
    Busy,
    /// Park on a condition variable until the peer signals.
    Park,
}

/// Creates a new single-producer single-consumer queue.
///
/// `capacity` is rounded up to the next power of two so index wrap is a
/// bitwise mask.
///
/// # Panics
///
/// Panics if `capacity < 2`.
///
/// # Examples
///
/// ```
/// use weir::spsc::{WaitMode, channel};
///
/// let (tx, rx) = channel::<i64>(1024, WaitMode::Busy);
/// ```
pub fn channel<T>(capacity: usize, mode: WaitMode) -> (Sender<T>, Receiver<T>) {
    let queue = queue::QueuePtr::with_capacity(capacity, mode);
    (Sender::new(queue.clone()), Receiver::new(queue))
}

#[cfg(all(test, not(feature = "loom")))]
mod test {
    use super::*;
    use crate::thread;

    #[test]
    fn fill_then_drain_in_order() {
        let (mut tx, mut rx) = channel::<i64>(4, WaitMode::Busy);

        for v in [1, 2, 3, 4] {
            tx.send(v);
        }
        for v in [1, 2, 3, 4] {
            assert_eq!(rx.recv(), v);
        }
    }

    #[test]
    fn cross_thread_order_busy() {
        const COUNTS: usize = 4096;
        let (mut tx, mut rx) = channel::<usize>(COUNTS, WaitMode::Busy);

        thread::spawn(move || {
            for i in 0..COUNTS << 3 {
                tx.send(i);
            }
        });

        for i in 0..COUNTS << 3 {
            assert_eq!(rx.recv(), i);
        }
    }

    #[test]
    fn tight_capacity_park_no_deadlock() {
        let (mut tx, mut rx) = channel::<u64>(2, WaitMode::Park);

        let producer = thread::spawn(move || {
            for i in 1..=1000 {
                tx.send(i);
            }
        });

        for i in 1..=1000 {
            assert_eq!(rx.recv(), i);
        }
        producer.join().unwrap();
    }

    #[test]
    fn try_ops() {
        let (mut tx, mut rx) = channel::<usize>(4, WaitMode::Busy);
        for _ in 0..4 {
            assert!(rx.try_recv().is_none());
        }
        for i in 0..4 {
            tx.try_send(i).unwrap();
        }
        assert_eq!(tx.try_send(5), Err(5));

        for i in 0..4 {
            assert_eq!(rx.try_recv(), Some(i));
        }
        assert!(rx.try_recv().is_none());
        for i in 0..4 {
            tx.try_send(i).unwrap();
        }
    }

    #[test]
    fn parked_consumer_wakes() {
        let (mut tx, mut rx) = channel::<usize>(4, WaitMode::Park);

        let h = thread::spawn(move || rx.recv());

        // give the receiver time to park
        thread::sleep(std::time::Duration::from_millis(50));
        tx.send(42);

        assert_eq!(h.join().unwrap(), 42);
    }

    #[test]
    fn parked_producer_wakes() {
        let (mut tx, mut rx) = channel::<usize>(2, WaitMode::Park);
        tx.send(1);
        tx.send(2);

        let h = thread::spawn(move || {
            // queue is full, so this parks until the consumer makes room
            tx.send(3);
        });

        thread::sleep(std::time::Duration::from_millis(50));
        assert_eq!(rx.recv(), 1);
        assert_eq!(rx.recv(), 2);
        assert_eq!(rx.recv(), 3);
        h.join().unwrap();
    }

    #[test]
    fn capacity_rounds_up() {
        let (tx, rx) = channel::<u8>(5, WaitMode::Busy);
        assert_eq!(tx.capacity(), 8);
        assert_eq!(rx.capacity(), 8);
    }

    #[test]
    #[should_panic(expected = "capacity must be at least 2")]
    fn rejects_tiny_capacity() {
        let _ = channel::<u8>(1, WaitMode::Busy);
    }

    #[test]
    fn drop_remaining_elements() {
        use std::sync::Arc;
        use std::sync::atomic::{AtomicUsize, Ordering};

        struct DropCounter(Arc<AtomicUsize>);

        impl Drop for DropCounter {
            fn drop(&mut self) {
                self.0.fetch_add(1, Ordering::SeqCst);
            }
        }

        let dropped = Arc::new(AtomicUsize::new(0));

        {
            let (mut tx, mut rx) = channel::<DropCounter>(16, WaitMode::Busy);

            // send 5 items and deliver 2; 3 stay buffered
            for _ in 0..5 {
                tx.send(DropCounter(dropped.clone()));
            }
            drop(rx.recv());
            drop(rx.recv());

            drop(tx);
            drop(rx);
        }

        assert_eq!(dropped.load(Ordering::SeqCst), 5);
    }
}

#[cfg(all(test, feature = "loom"))]
mod loom_test {
    use super::*;
    use crate::thread;

    #[test]
    fn busy_order() {
        loom::model(|| {
            let (mut tx, mut rx) = channel::<usize>(2, WaitMode::Busy);

            thread::spawn(move || {
                for i in 0..3 {
                    tx.send(i);
                }
            });

            for i in 0..3 {
                assert_eq!(rx.recv(), i);
            }
        });
    }

    #[test]
    fn park_order() {
        loom::model(|| {
            let (mut tx, mut rx) = channel::<usize>(2, WaitMode::Park);

            thread::spawn(move || {
                for i in 0..3 {
                    tx.send(i);
                }
            });

            for i in 0..3 {
                assert_eq!(rx.recv(), i);
            }
        });
    }
}
