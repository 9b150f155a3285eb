use crate::{
    atomic::{AtomicUsize, Ordering},
    sync::{Condvar, Mutex, MutexGuard},
};

/// One side of the park/wake handshake: a condition variable, the mutex
/// serializing its wait/signal edge, and a count of parked threads.
///
/// The mutex guards only the handshake, never payload state, so poison
/// left by a panicking peer is discarded.
pub(crate) struct Gate {
    waiters: AtomicUsize,
    lock: Mutex<()>,
    cond: Condvar,
}

impl Gate {
    pub(crate) fn new() -> Self {
        Self {
            waiters: AtomicUsize::new(0),
            lock: Mutex::new(()),
            cond: Condvar::new(),
        }
    }

    #[inline]
    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(|poison| poison.into_inner())
    }

    /// Parks the calling thread until `ready()` holds.
    ///
    /// `ready` is evaluated under the mutex (double-checked wait) and the
    /// loop absorbs spurious wakeups. The waiter count is incremented with
    /// SeqCst before the first check: pairs with the SeqCst load in
    /// [`wake_all`](Gate::wake_all) to keep the window where a sleeper is
    /// invisible to signalers vanishingly small.
    pub(crate) fn park_until(&self, mut ready: impl FnMut() -> bool) {
        let mut guard = self.guard();
        self.waiters.fetch_add(1, Ordering::SeqCst);
        while !ready() {
            guard = self
                .cond
                .wait(guard)
                .unwrap_or_else(|poison| poison.into_inner());
        }
        self.waiters.fetch_sub(1, Ordering::SeqCst);
    }

    /// Wakes one parked thread. Always takes the mutex; callers gate the
    /// call on a state transition that is rare by construction.
    pub(crate) fn wake_one(&self) {
        let _guard = self.guard();
        self.cond.notify_one();
    }

    /// Wakes every parked thread, skipping the mutex when nobody is parked.
    pub(crate) fn wake_all(&self) {
        if self.waiters.load(Ordering::SeqCst) > 0 {
            let _guard = self.guard();
            self.cond.notify_all();
        }
    }

    /// Wakes every parked thread without consulting the waiter count.
    /// Close must reach peers that have not yet published their count.
    pub(crate) fn wake_all_unchecked(&self) {
        let _guard = self.guard();
        self.cond.notify_all();
    }
}
