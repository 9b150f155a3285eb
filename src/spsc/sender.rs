use crate::{atomic::Ordering, hint};

use super::{WaitMode, queue::QueuePtr};

/// The producer end of the SPSC queue.
///
/// `Send` but neither `Sync` nor `Clone`: exactly one thread at a time may
/// hold the producer role.
///
/// # Examples
///
/// ```
/// use weir::spsc::{WaitMode, channel};
///
/// let (mut tx, mut rx) = channel::<i64>(16, WaitMode::Busy);
/// tx.send(1);
/// tx.send(2);
/// assert_eq!(rx.recv(), 1);
/// assert_eq!(rx.recv(), 2);
/// ```
pub struct Sender<T> {
    ptr: QueuePtr<T>,
}

impl<T> Sender<T> {
    pub(crate) fn new(queue_ptr: QueuePtr<T>) -> Self {
        Self { ptr: queue_ptr }
    }

    /// Sends a value into the queue, blocking while it is full.
    ///
    /// `WaitMode::Busy` spins on the occupancy counter; `WaitMode::Park`
    /// blocks on a condition variable after a double check.
    ///
    /// # Examples
    ///
    /// ```
    /// use weir::spsc::{WaitMode, channel};
    ///
    /// let (mut tx, mut rx) = channel::<i64>(16, WaitMode::Park);
    /// tx.send(42);
    /// assert_eq!(rx.recv(), 42);
    /// ```
    pub fn send(&mut self, value: T) {
        match self.ptr.mode() {
            WaitMode::Busy => {
                while self.ptr.count().load(Ordering::Acquire) == self.ptr.capacity {
                    hint::spin_loop();
                }
            }
            WaitMode::Park => {
                if self.ptr.count().load(Ordering::Acquire) == self.ptr.capacity {
                    self.ptr.room().park_until(|| {
                        self.ptr.count().load(Ordering::Acquire) < self.ptr.capacity
                    });
                }
            }
        }

        self.commit(value);
    }

    /// Attempts to send a value without blocking.
    ///
    /// Returns `Err(value)` if the queue is full, handing the value back.
    ///
    /// # Examples
    ///
    /// ```
    /// use weir::spsc::{WaitMode, channel};
    ///
    /// let (mut tx, mut rx) = channel::<i64>(2, WaitMode::Busy);
    ///
    /// assert!(tx.try_send(1).is_ok());
    /// assert!(tx.try_send(2).is_ok());
    ///
    /// // Queue is full
    /// assert_eq!(tx.try_send(3), Err(3));
    ///
    /// // After consuming, there is room again
    /// assert_eq!(rx.try_recv(), Some(1));
    /// assert!(tx.try_send(3).is_ok());
    /// ```
    pub fn try_send(&mut self, value: T) -> Result<(), T> {
        if self.ptr.count().load(Ordering::Acquire) == self.ptr.capacity {
            return Err(value);
        }

        self.commit(value);
        Ok(())
    }

    /// Returns the queue capacity (the requested one rounded up to a power
    /// of two).
    pub fn capacity(&self) -> usize {
        self.ptr.capacity
    }

    /// Writes the value and publishes it through the occupancy counter.
    /// Caller has established that at least one slot is free.
    #[inline(always)]
    fn commit(&mut self, value: T) {
        // SAFETY: we are the unique producer, and the slot at `write` was
        // released by the consumer before it decremented `count`
        let write = unsafe { self.ptr.write_idx() };
        unsafe { self.ptr.set(write, value) };
        unsafe { self.ptr.set_write_idx((write + 1) & self.ptr.mask) };

        // AcqRel: the release half publishes the slot write above
        let prev = self.ptr.count().fetch_add(1, Ordering::AcqRel);
        debug_assert!(prev < self.ptr.capacity);

        // wake the consumer only on the empty -> non-empty transition
        if prev == 0 && self.ptr.mode() == WaitMode::Park {
            self.ptr.elem().wake_one();
        }
    }
}

unsafe impl<T: Send> Send for Sender<T> {}
