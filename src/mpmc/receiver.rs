use crate::{
    Snoozer,
    atomic::Ordering,
    error::{RecvError, TryRecvError},
};

use super::queue::{QueuePtr, Reserve};

/// The consumer end of the MPMC queue.
///
/// `Clone`, `Send` and `Sync`: any number of threads may receive
/// concurrently; each message is delivered to exactly one of them.
#[derive(Clone)]
pub struct Receiver<T> {
    ptr: QueuePtr<T>,
}

impl<T> Receiver<T> {
    pub(crate) fn new(queue_ptr: QueuePtr<T>) -> Self {
        Self { ptr: queue_ptr }
    }

    /// Receives a message, blocking while the queue is empty.
    ///
    /// # Errors
    ///
    /// Returns [`RecvError`] once the queue is closed and every buffered
    /// message has been drained; this is the end-of-stream signal.
    ///
    /// # Examples
    ///
    /// ```
    /// use weir::mpmc::channel;
    /// use weir::RecvError;
    ///
    /// let (tx, rx) = channel::<i64>(8);
    /// tx.send(1).unwrap();
    /// tx.close();
    ///
    /// assert_eq!(rx.recv(), Ok(1));
    /// assert_eq!(rx.recv(), Err(RecvError));
    /// ```
    pub fn recv(&self) -> Result<T, RecvError> {
        loop {
            let mut snoozer = Snoozer::new();
            loop {
                match self.ptr.reserve_elem() {
                    Reserve::Granted { slot, stamp } => {
                        // SAFETY: the reservation makes this thread the
                        // slot's unique reader for this lap
                        let value = unsafe { slot.take() };
                        // release the slot to the producers' next lap
                        slot.stamp().store(stamp, Ordering::Release);
                        self.ptr.room().wake_all();
                        return Ok(value);
                    }
                    Reserve::Closed => return Err(RecvError),
                    Reserve::Blocked => {
                        if snoozer.completed() {
                            break;
                        }
                        snoozer.snooze();
                    }
                }
            }

            // spinning did not heal the queue; park until a producer
            // publishes or the queue closes, then try again
            if self.ptr.is_empty() {
                self.ptr
                    .elem()
                    .park_until(|| !self.ptr.is_empty() || self.ptr.is_closed());
            }
        }
    }

    /// Attempts to receive a message without blocking on an empty queue.
    ///
    /// # Errors
    ///
    /// [`TryRecvError::Empty`] if nothing is buffered right now,
    /// [`TryRecvError::Closed`] once the queue is closed and drained.
    pub fn try_recv(&self) -> Result<T, TryRecvError> {
        match self.ptr.reserve_elem() {
            Reserve::Granted { slot, stamp } => {
                // SAFETY: the reservation makes this thread the slot's
                // unique reader for this lap
                let value = unsafe { slot.take() };
                slot.stamp().store(stamp, Ordering::Release);
                self.ptr.room().wake_all();
                Ok(value)
            }
            Reserve::Closed => Err(TryRecvError::Closed),
            Reserve::Blocked => Err(TryRecvError::Empty),
        }
    }

    /// Closes the queue from the consumer side. Idempotent.
    pub fn close(&self) {
        self.ptr.close();
    }

    /// Racy snapshot; accurate only once it can no longer change.
    pub fn is_closed(&self) -> bool {
        self.ptr.is_closed()
    }

    /// Racy snapshot; accurate only once it can no longer change.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_empty()
    }

    /// Racy snapshot; accurate only once it can no longer change.
    pub fn is_full(&self) -> bool {
        self.ptr.is_full()
    }

    pub fn capacity(&self) -> usize {
        self.ptr.capacity
    }
}

unsafe impl<T: Send> Send for Receiver<T> {}
unsafe impl<T: Send> Sync for Receiver<T> {}
