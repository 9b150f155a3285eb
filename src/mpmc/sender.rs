use crate::{
    Snoozer,
    atomic::Ordering,
    error::{SendError, TrySendError},
};

use super::queue::{QueuePtr, Reserve};

/// The producer end of the MPMC queue.
///
/// `Clone`, `Send` and `Sync`: any number of threads may send concurrently,
/// through clones or through a shared reference.
#[derive(Clone)]
pub struct Sender<T> {
    ptr: QueuePtr<T>,
}

impl<T> Sender<T> {
    pub(crate) fn new(queue_ptr: QueuePtr<T>) -> Self {
        Self { ptr: queue_ptr }
    }

    /// Sends a value into the queue, blocking while it is full.
    ///
    /// Contention is handled in stages: spin, then yield, then park on a
    /// condition variable until a consumer frees a slot.
    ///
    /// # Errors
    ///
    /// Returns [`SendError`] holding the value if the queue is closed.
    ///
    /// # Examples
    ///
    /// ```
    /// use weir::mpmc::channel;
    ///
    /// let (tx, rx) = channel::<i64>(8);
    /// tx.send(1).unwrap();
    /// assert_eq!(rx.recv(), Ok(1));
    ///
    /// tx.close();
    /// assert!(tx.send(2).is_err());
    /// ```
    pub fn send(&self, value: T) -> Result<(), SendError<T>> {
        loop {
            let mut snoozer = Snoozer::new();
            loop {
                match self.ptr.reserve_room() {
                    Reserve::Granted { slot, stamp } => {
                        slot.put(value);
                        // release-publish the message to its consumer
                        slot.stamp().store(stamp, Ordering::Release);
                        self.ptr.elem().wake_all();
                        return Ok(());
                    }
                    Reserve::Closed => return Err(SendError(value)),
                    Reserve::Blocked => {
                        if snoozer.completed() {
                            break;
                        }
                        snoozer.snooze();
                    }
                }
            }

            // spinning did not heal the queue; park until a consumer frees
            // a slot or the queue closes, then try again
            if self.ptr.is_full() {
                self.ptr
                    .room()
                    .park_until(|| !self.ptr.is_full() || self.ptr.is_closed());
            }
        }
    }

    /// Attempts to send a value without blocking on a full queue.
    ///
    /// # Errors
    ///
    /// [`TrySendError::Full`] if every slot holds an unconsumed message,
    /// [`TrySendError::Closed`] if the queue is closed; both hand the value
    /// back.
    pub fn try_send(&self, value: T) -> Result<(), TrySendError<T>> {
        match self.ptr.reserve_room() {
            Reserve::Granted { slot, stamp } => {
                slot.put(value);
                slot.stamp().store(stamp, Ordering::Release);
                self.ptr.elem().wake_all();
                Ok(())
            }
            Reserve::Closed => Err(TrySendError::Closed(value)),
            Reserve::Blocked => Err(TrySendError::Full(value)),
        }
    }

    /// Closes the queue: subsequent and parked sends fail, buffered
    /// messages stay drainable. Idempotent.
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

unsafe impl<T: Send> Send for Sender<T> {}
unsafe impl<T: Send> Sync for Sender<T> {}
