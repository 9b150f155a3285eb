use core::{
    marker::PhantomData,
    mem::{align_of, size_of},
    ptr::NonNull,
};

use std::alloc;

use crate::{
    atomic::{AtomicUsize, Ordering},
    padded::CachePadded,
    park::Gate,
};

use super::WaitMode;

/// # Invariants
/// - `0 <= count <= capacity`; `count` is the only field both sides write.
/// - `write` is touched only by the producer, `read` only by the consumer.
// avoid re-ordering fields
#[repr(C)]
struct Queue {
    count: CachePadded<AtomicUsize>,
    write: CachePadded<usize>,
    read: CachePadded<usize>,
    room: Gate,
    elem: Gate,
    mode: WaitMode,
    rc: AtomicUsize,
}

pub(crate) struct QueuePtr<T> {
    ptr: NonNull<Queue>,
    buffer: NonNull<T>,
    pub(crate) capacity: usize,
    pub(crate) mask: usize,
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
            mask: self.mask,
            _marker: PhantomData,
        }
    }
}

impl<T> QueuePtr<T> {
    pub(crate) fn with_capacity(capacity: usize, mode: WaitMode) -> Self {
        assert!(capacity >= 2, "queue capacity must be at least 2");
        // index wrap is a bitwise mask, so the ring must be a power of two
        let capacity = capacity.next_power_of_two();

        let (layout, buffer_offset) = Self::layout(capacity);

        // SAFETY: capacity >= 2, so layout is non-zero
        let Some(ptr) = NonNull::new(unsafe { alloc::alloc(layout) }) else {
            alloc::handle_alloc_error(layout);
        };
        let ptr = ptr.cast::<Queue>();

        // SAFETY: `ptr` was just checked by NonNull::new, so offsetting it by
        // the layout-derived buffer offset stays in the allocation
        let buffer =
            unsafe { NonNull::new_unchecked(ptr.as_ptr().byte_add(buffer_offset).cast::<T>()) };

        // SAFETY: freshly allocated and non-null
        unsafe {
            ptr.write(Queue {
                count: CachePadded::new(AtomicUsize::new(0)),
                write: CachePadded::new(0),
                read: CachePadded::new(0),
                room: Gate::new(),
                elem: Gate::new(),
                mode,
                rc: AtomicUsize::new(1),
            });
        };

        Self {
            ptr,
            buffer,
            capacity,
            mask: capacity - 1,
            _marker: PhantomData,
        }
    }

    fn layout(capacity: usize) -> (alloc::Layout, usize) {
        let header_layout =
            alloc::Layout::from_size_align(size_of::<Queue>(), align_of::<Queue>()).unwrap();
        let buffer_layout = alloc::Layout::array::<T>(capacity).unwrap();
        let (layout, offset) = header_layout.extend(buffer_layout).unwrap();
        (layout.pad_to_align(), offset)
    }

    #[inline(always)]
    pub(crate) fn count(&self) -> &AtomicUsize {
        unsafe { _field!(Queue, self.ptr, count.0, AtomicUsize).as_ref() }
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
    pub(crate) fn mode(&self) -> WaitMode {
        unsafe { _field!(Queue, self.ptr, mode, WaitMode).read() }
    }

    /// # Safety
    /// Only the producer may touch the write cursor.
    #[inline(always)]
    pub(crate) unsafe fn write_idx(&self) -> usize {
        unsafe { _field!(Queue, self.ptr, write.0, usize).read() }
    }

    /// # Safety
    /// Only the producer may touch the write cursor.
    #[inline(always)]
    pub(crate) unsafe fn set_write_idx(&self, index: usize) {
        unsafe { _field!(Queue, self.ptr, write.0, usize).write(index) }
    }

    /// # Safety
    /// Only the consumer may touch the read cursor.
    #[inline(always)]
    pub(crate) unsafe fn read_idx(&self) -> usize {
        unsafe { _field!(Queue, self.ptr, read.0, usize).read() }
    }

    /// # Safety
    /// Only the consumer may touch the read cursor.
    #[inline(always)]
    pub(crate) unsafe fn set_read_idx(&self, index: usize) {
        unsafe { _field!(Queue, self.ptr, read.0, usize).write(index) }
    }

    #[inline(always)]
    unsafe fn at(&self, index: usize) -> NonNull<T> {
        unsafe { NonNull::new_unchecked(self.buffer.as_ptr().add(index & self.mask)) }
    }

    /// # Safety
    /// The slot at `index` must hold an initialized value that no one else
    /// will read again.
    #[inline(always)]
    pub(crate) unsafe fn get(&self, index: usize) -> T {
        unsafe { self.at(index).read() }
    }

    /// # Safety
    /// The slot at `index` must be unoccupied.
    #[inline(always)]
    pub(crate) unsafe fn set(&self, index: usize, value: T) {
        unsafe { self.at(index).write(value) }
    }
}

impl<T> Drop for QueuePtr<T> {
    fn drop(&mut self) {
        let rc = unsafe { _field!(Queue, self.ptr, rc, AtomicUsize).as_ref() };
        if rc.fetch_sub(1, Ordering::AcqRel) == 1 {
            let (layout, _) = Self::layout(self.capacity);

            // Both endpoints are gone, so the cursors are quiescent: the
            // `count` slots starting at `read` are the undelivered values.
            if core::mem::needs_drop::<T>() {
                let count = self.count().load(Ordering::Relaxed);
                let read = unsafe { self.read_idx() };
                for i in 0..count {
                    unsafe {
                        core::ptr::drop_in_place(self.at(read.wrapping_add(i)).as_ptr());
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
