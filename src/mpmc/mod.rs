//! Multi-producer multi-consumer (MPMC) queue with close semantics.
//!
//! The ring is in the family of Dmitry Vyukov's bounded MPMC queue: every
//! slot carries a stamp that encodes its phase and lap, and producers and
//! consumers reserve slots by CAS-advancing a shared tail or head cursor.
//! A stamp equal to the tail means "empty for this lap"; the producer
//! publishes by storing `tail + 1`; the consumer releases by storing
//! `head + one_lap`, handing the slot to the next lap. A divergent stamp
//! means a peer is mid-operation and the caller backs off and retries.
//!
//! Two extensions over the classic algorithm:
//!
//! - **Close flag.** The lowest power of two at or above the capacity
//!   (`mark_bit`) is reserved inside the tail cursor. One CAS therefore
//!   advances the cursor atomically with respect to closing. After
//!   [`close`](Sender::close), sends fail with [`SendError`](crate::SendError)
//!   while buffered messages remain drainable; a receiver that finds the
//!   queue closed and empty gets [`RecvError`](crate::RecvError) as an
//!   unambiguous end-of-stream.
//! - **Hybrid waiting.** Contended operations spin, then yield (see
//!   [`Snoozer`](crate::Snoozer)), and finally park on a condition
//!   variable; wakeups are broadcast because any subset of peers may be
//!   parked. A waiter count skips the wake path when nobody is.
//!
//! The capacity is used as-is (it need not be a power of two): when a
//! cursor's index field reaches the capacity, the reservation jumps it to
//! the next lap.
//!
//! # Reference
//!
//! * [Dmitry Vyukov's Bounded MPMC Queue](http://www.1024cores.net/home/lock-free-algorithms/queues/bounded-mpmc-queue)

pub use self::{receiver::Receiver, sender::Sender};

mod queue;
mod receiver;
mod sender;

/// Creates a new multi-producer multi-consumer queue.
///
/// Both handles are cheap to clone; every clone operates on the same ring.
///
/// # Panics
///
/// Panics if `capacity < 2`.
///
/// # Examples
///
/// ```
/// use weir::mpmc::channel;
///
/// let (tx, rx) = channel::<u64>(1024);
/// ```
pub fn channel<T>(capacity: usize) -> (Sender<T>, Receiver<T>) {
    let queue = queue::QueuePtr::with_capacity(capacity);
    (Sender::new(queue.clone()), Receiver::new(queue))
}


#[cfg(all(test, feature = "loom"))]
mod loom_test {
    use super::*;
    use crate::error::RecvError;
    use crate::thread;

    #[test]
    fn two_producers_one_consumer() {
        loom::model(|| {
            let (tx, rx) = channel::<usize>(2);

            let t1 = {
                let tx = tx.clone();
                thread::spawn(move || tx.send(1).unwrap())
            };
            let t2 = {
                let tx = tx.clone();
                thread::spawn(move || tx.send(2).unwrap())
            };

            let a = rx.recv().unwrap();
            let b = rx.recv().unwrap();
            assert_eq!(a + b, 3);

            t1.join().unwrap();
            t2.join().unwrap();
        });
    }

    #[test]
    fn close_drains() {
        loom::model(|| {
            let (tx, rx) = channel::<usize>(2);

            let t = {
                let tx = tx.clone();
                thread::spawn(move || {
                    tx.send(7).unwrap();
                    tx.close();
                })
            };

            assert_eq!(rx.recv(), Ok(7));
            assert_eq!(rx.recv(), Err(RecvError));
            t.join().unwrap();
        });
    }
}
