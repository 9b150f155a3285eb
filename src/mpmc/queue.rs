use core::{
    marker::PhantomData,
    mem::{MaybeUninit, align_of, size_of},
    ptr::NonNull,
};

use std::alloc;

use crate::{
    Snoozer,
    atomic::{AtomicUsize, Ordering},
    padded::CachePadded,
    park::Gate,
};

/// One ring slot. The stamp encodes the slot's phase and lap; see the
/// module docs for the protocol.
#[repr(C)]
#[repr(align(64))]
#[cfg_attr(all(target_arch = "aarch64", target_os = "macos"), repr(align(128)))]
pub(crate) struct Slot<T> {
    stamp: AtomicUsize,
    msg: MaybeUninit<T>,
}

pub(crate) struct SlotPtr<T> {
    ptr: NonNull<Slot<T>>,
}

impl<T> SlotPtr<T> {
    /// # Safety
    /// The slot must hold a published message that no one else will read.
    #[inline(always)]
    pub(crate) unsafe fn take(&self) -> T {
        unsafe { _field!(Slot<T>, self.ptr, msg, T).read() }
    }

    /// Caller must hold the reservation for this slot.
    #[inline(always)]
    pub(crate) fn put(&self, value: T) {
        unsafe { _field!(Slot<T>, self.ptr, msg, T).write(value) }
    }

    #[inline(always)]
    pub(crate) fn stamp(&self) -> &AtomicUsize {
        unsafe { _field!(Slot<T>, self.ptr, stamp, AtomicUsize).as_ref() }
    }

    /// # Safety
    /// The slot must hold a message and no thread may touch it again.
    #[inline(always)]
    pub(crate) unsafe fn drop_in_place(&self) {
        if core::mem::needs_drop::<T>() {
            unsafe {
                core::ptr::drop_in_place(_field!(Slot<T>, self.ptr, msg, T).as_ptr());
            }
        }
    }
}

impl<T> From<NonNull<Slot<T>>> for SlotPtr<T> {
    fn from(value: NonNull<Slot<T>>) -> Self {
        Self { ptr: value }
    }
}

/// Outcome of a cursor reservation.
pub(crate) enum Reserve<T> {
    /// The slot was seized; store `stamp` into it once the transfer is done.
    Granted { slot: SlotPtr<T>, stamp: usize },
    /// The close flag is set. For producers this means "rejected"; for
    /// consumers it additionally means the queue is drained.
    Closed,
    /// Full (producer side) or empty (consumer side). Transient.
    Blocked,
}

/// # Invariants
/// - `tail` carries the close flag at `mark_bit`; `head` never does.
/// - a slot's stamp uniquely identifies the next legal operation on it and
///   the lap on which it may proceed.
// avoid re-ordering fields
#[repr(C)]
struct Queue {
    tail: CachePadded<AtomicUsize>,
    head: CachePadded<AtomicUsize>,
    room: Gate,
    elem: Gate,
    rc: AtomicUsize,
}

pub(crate) struct QueuePtr<T> {
    ptr: NonNull<Queue>,
    buffer: NonNull<Slot<T>>,
    pub(crate) capacity: usize,
    /// Smallest power of two >= capacity. Doubles as the close flag inside
    /// the tail cursor and as the index-field frontier.
    pub(crate) mark_bit: usize,
    /// Cursor stride per full ring traversal (`mark_bit << 1`).
    pub(crate) one_lap: usize,
    _marker: PhantomData<T>,
}

impl<T> Clone for QueuePtr<T> {
    fn clone(&self) -> Self {
        let rc = unsafe { _field!(Queue, self.ptr, rc, AtomicUsize).as_ref() };
        rc.fetch_add(1, Ordering::AcqRel);
        Self {
            ptr: self.ptr,
            buffer: self.buffer,
            capacity: self.capacity,
            mark_bit: self.mark_bit,
            one_lap: self.one_lap,
            _marker: PhantomData,
        }
    }
}

impl<T> QueuePtr<T> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        assert!(capacity >= 2, "queue capacity must be at least 2");

        let mark_bit = capacity.next_power_of_two();
        let one_lap = mark_bit << 1;

        let (layout, buffer_offset) = Self::layout(capacity);

        // SAFETY: capacity >= 2, so layout is non-zero
        let Some(ptr) = NonNull::new(unsafe { alloc::alloc(layout) }) else {
            alloc::handle_alloc_error(layout);
        };
        let ptr = ptr.cast::<Queue>();

        // SAFETY: `ptr` was just checked by NonNull::new, so offsetting it by
        // the layout-derived buffer offset stays in the allocation
        let buffer = unsafe {
            NonNull::new_unchecked(ptr.as_ptr().byte_add(buffer_offset).cast::<Slot<T>>())
        };

        // SAFETY: freshly allocated and non-null
        unsafe {
            ptr.write(Queue {
                tail: CachePadded::new(AtomicUsize::new(0)),
                head: CachePadded::new(AtomicUsize::new(0)),
                room: Gate::new(),
                elem: Gate::new(),
                rc: AtomicUsize::new(1),
            });
        };

        // slot at index i starts as "empty for lap zero"
        for i in 0..capacity {
            unsafe {
                buffer.add(i).write(Slot {
                    stamp: AtomicUsize::new(i),
                    msg: MaybeUninit::uninit(),
                });
            }
        }

        Self {
            ptr,
            buffer,
            capacity,
            mark_bit,
            one_lap,
            _marker: PhantomData,
        }
    }

    fn layout(capacity: usize) -> (alloc::Layout, usize) {
        let header_layout =
            alloc::Layout::from_size_align(size_of::<Queue>(), align_of::<Queue>()).unwrap();
        let buffer_layout = alloc::Layout::array::<Slot<T>>(capacity).unwrap();
        let (layout, offset) = header_layout.extend(buffer_layout).unwrap();
        (layout.pad_to_align(), offset)
    }

    #[inline(always)]
    pub(crate) fn tail(&self) -> &AtomicUsize {
        unsafe { _field!(Queue, self.ptr, tail.0, AtomicUsize).as_ref() }
    }

    #[inline(always)]
    pub(crate) fn head(&self) -> &AtomicUsize {
        unsafe { _field!(Queue, self.ptr, head.0, AtomicUsize).as_ref() }
    }

    #[inline(always)]
    pub(crate) fn room(&self) -> &Gate {
        unsafe { _field!(Queue, self.ptr, room, Gate).as_ref() }
    }

    #[inline(always)]
    pub(crate) fn elem(&self) -> &Gate {
        unsafe { _field!(Queue, self.ptr, elem, Gate).as_ref() }
    }

    #[inline(always)]
    fn slot_at(&self, index: usize) -> SlotPtr<T> {
        debug_assert!(index < self.capacity);

        unsafe { self.buffer.add(index) }.into()
    }

    /// Tries to reserve the slot under the tail cursor for writing.
    ///
    /// Loops until the reservation is granted, the queue is observed full,
    /// or the close flag is observed; contention with peer producers and
    /// mid-flight consumers is absorbed here with spin/snooze backoff.
    pub(crate) fn reserve_room(&self) -> Reserve<T> {
        let mut snoozer = Snoozer::new();
        let mut tail = self.tail().load(Ordering::Relaxed);

        loop {
            if tail & self.mark_bit != 0 {
                return Reserve::Closed;
            }

            let index = tail & (self.mark_bit - 1);
            let lap = tail & !(self.one_lap - 1);
            let slot = self.slot_at(index);
            let stamp = slot.stamp().load(Ordering::Acquire);

            if stamp == tail {
                // the slot is empty for this lap
                let next_tail = if index + 1 < self.capacity {
                    tail.wrapping_add(1)
                } else {
                    // lap skip: cursor indices >= capacity never materialize
                    lap.wrapping_add(self.one_lap)
                };

                match self.tail().compare_exchange_weak(
                    tail,
                    next_tail,
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        return Reserve::Granted {
                            slot,
                            stamp: tail.wrapping_add(1),
                        };
                    }
                    Err(current) => {
                        snoozer.spin();
                        tail = current;
                    }
                }
            } else if stamp.wrapping_add(self.one_lap) == tail.wrapping_add(1) {
                // the slot is one lap behind: full, unless a consumer is
                // mid-flight on the head
                let head = self.head().load(Ordering::Acquire);
                if head.wrapping_add(self.one_lap) == tail {
                    return Reserve::Blocked;
                }
                snoozer.spin();
                tail = self.tail().load(Ordering::Relaxed);
            } else {
                // a peer producer holds the slot but has not published yet
                snoozer.snooze();
                tail = self.tail().load(Ordering::Relaxed);
            }
        }
    }

    /// Tries to reserve the slot under the head cursor for reading.
    /// Symmetric to [`reserve_room`](QueuePtr::reserve_room); `Closed` here
    /// means the queue is closed *and* fully drained.
    pub(crate) fn reserve_elem(&self) -> Reserve<T> {
        let mut snoozer = Snoozer::new();
        let mut head = self.head().load(Ordering::Relaxed);

        loop {
            let index = head & (self.mark_bit - 1);
            let lap = head & !(self.one_lap - 1);
            let slot = self.slot_at(index);
            let stamp = slot.stamp().load(Ordering::Acquire);

            if stamp == head.wrapping_add(1) {
                // a message was published for this lap
                let next_head = if index + 1 < self.capacity {
                    head.wrapping_add(1)
                } else {
                    lap.wrapping_add(self.one_lap)
                };

                match self.head().compare_exchange_weak(
                    head,
                    next_head,
                    Ordering::AcqRel,
                    Ordering::Relaxed,
                ) {
                    Ok(_) => {
                        return Reserve::Granted {
                            slot,
                            stamp: head.wrapping_add(self.one_lap),
                        };
                    }
                    Err(current) => {
                        snoozer.spin();
                        head = current;
                    }
                }
            } else if stamp == head {
                // possibly empty; the tail decides
                let tail = self.tail().load(Ordering::Acquire);
                if tail & !self.mark_bit == head {
                    if tail & self.mark_bit != 0 {
                        return Reserve::Closed;
                    }
                    return Reserve::Blocked;
                }
                // a producer advanced the tail but has not published yet
                snoozer.spin();
                head = self.head().load(Ordering::Relaxed);
            } else {
                snoozer.snooze();
                head = self.head().load(Ordering::Relaxed);
            }
        }
    }

    /// Sets the close flag on the tail cursor and wakes every parked peer.
    /// Idempotent: the flag is never cleared.
    pub(crate) fn close(&self) {
        let mut tail = self.tail().load(Ordering::Relaxed);
        while tail & self.mark_bit == 0 {
            match self.tail().compare_exchange_weak(
                tail,
                tail | self.mark_bit,
                Ordering::AcqRel,
                Ordering::Relaxed,
            ) {
                Ok(_) => break,
                Err(current) => tail = current,
            }
        }

        // parked peers must observe the flag even if their waiter count is
        // not visible yet, so skip the fast path
        self.room().wake_all_unchecked();
        self.elem().wake_all_unchecked();
    }

    pub(crate) fn is_closed(&self) -> bool {
        self.tail().load(Ordering::SeqCst) & self.mark_bit != 0
    }

    pub(crate) fn is_empty(&self) -> bool {
        let head = self.head().load(Ordering::SeqCst);
        let tail = self.tail().load(Ordering::SeqCst);
        tail & !self.mark_bit == head
    }

    pub(crate) fn is_full(&self) -> bool {
        let head = self.head().load(Ordering::SeqCst);
        let tail = self.tail().load(Ordering::SeqCst);
        head.wrapping_add(self.one_lap) == tail & !self.mark_bit
    }
}

impl<T> Drop for QueuePtr<T> {
    fn drop(&mut self) {
        let rc = unsafe { _field!(Queue, self.ptr, rc, AtomicUsize).as_ref() };
        if rc.fetch_sub(1, Ordering::AcqRel) == 1 {
            let (layout, _) = Self::layout(self.capacity);

            // Every endpoint is gone, so no reservation is in flight and
            // each stamp sits in a settled phase:
            //   stamp - index == 0 (mod one_lap) -> empty
            //   stamp - index == 1 (mod one_lap) -> undelivered message
            if core::mem::needs_drop::<T>() {
                for index in 0..self.capacity {
                    let slot = self.slot_at(index);
                    let stamp = slot.stamp().load(Ordering::Relaxed);
                    if stamp.wrapping_sub(index) & (self.one_lap - 1) == 1 {
                        unsafe { slot.drop_in_place() };
                    }
                }
            }

            unsafe {
                self.ptr.drop_in_place();
                alloc::dealloc(self.ptr.cast().as_ptr(), layout);
            }
        }
    }
}
