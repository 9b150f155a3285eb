use crate::{atomic::Ordering, hint};

use super::{WaitMode, queue::QueuePtr};

/// The consumer end of the SPSC queue.
///
/// `Send` but neither `Sync` nor `Clone`: exactly one thread at a time may
/// hold the consumer role.
pub struct Receiver<T> {
    ptr: QueuePtr<T>,
}

impl<T> Receiver<T> {
    pub(crate) fn new(queue_ptr: QueuePtr<T>) -> Self {
        Self { ptr: queue_ptr }
    }

    /// Receives the oldest value, blocking while the queue is empty.
    ///
    /// # Examples
    ///
    /// ```
    /// use weir::spsc::{WaitMode, channel};
    ///
    /// let (mut tx, mut rx) = channel::<i64>(16, WaitMode::Busy);
    /// tx.send(7);
    /// assert_eq!(rx.recv(), 7);
    /// ```
    pub fn recv(&mut self) -> T {
        match self.ptr.mode() {
            WaitMode::Busy => {
                while self.ptr.count().load(Ordering::Acquire) == 0 {
                    hint::spin_loop();
                }
            }
            WaitMode::Park => {
                if self.ptr.count().load(Ordering::Acquire) == 0 {
                    self.ptr
                        .elem()
                        .park_until(|| self.ptr.count().load(Ordering::Acquire) > 0);
                }
            }
        }

        self.take()
    }

    /// Attempts to receive a value without blocking.
    ///
    /// # Examples
    ///
    /// ```
    /// use weir::spsc::{WaitMode, channel};
    ///
    /// let (mut tx, mut rx) = channel::<i64>(16, WaitMode::Busy);
    /// assert_eq!(rx.try_recv(), None);
    /// tx.send(42);
    /// assert_eq!(rx.try_recv(), Some(42));
    /// ```
    pub fn try_recv(&mut self) -> Option<T> {
        if self.ptr.count().load(Ordering::Acquire) == 0 {
            return None;
        }

        Some(self.take())
    }

    /// Returns the queue capacity (the requested one rounded up to a power
    /// of two).
    pub fn capacity(&self) -> usize {
        self.ptr.capacity
    }

    /// Reads the slot and releases it through the occupancy counter.
    /// Caller has established that at least one value is buffered.
    #[inline(always)]
    fn take(&mut self) -> T {
        // SAFETY: we are the unique consumer, and the producer published the
        // slot at `read` before it incremented `count`
        let read = unsafe { self.ptr.read_idx() };
        let value = unsafe { self.ptr.get(read) };
        unsafe { self.ptr.set_read_idx((read + 1) & self.ptr.mask) };

        // AcqRel: the release half returns the slot to the producer
        let prev = self.ptr.count().fetch_sub(1, Ordering::AcqRel);
        debug_assert!(prev > 0);

        // wake the producer only on the full -> non-full transition
        if prev == self.ptr.capacity && self.ptr.mode() == WaitMode::Park {
            self.ptr.room().wake_one();
        }

        value
    }
}

unsafe impl<T: Send> Send for Receiver<T> {}
