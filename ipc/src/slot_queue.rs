//! Multi-producer/single-consumer slot queue
//!
//! Producers claim a slot by compare-and-swap on the write cursor and only
//! then write the payload, so any number of producers may share one queue.
//! Each slot carries a ready flag; the consumer treats a claimed slot whose
//! payload has not landed yet as empty and tries again later.
//!
//! Cursors are free-running positions (slot = position % CAP) rather than
//! wrapped indices, which keeps a stalled producer's compare-and-swap from
//! succeeding against a cursor that has lapped it.

use core::cell::UnsafeCell;
use core::fmt;
use core::mem::MaybeUninit;
use core::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use crate::ring::CHANNEL_CAPACITY;

struct Slot<T> {
    ready: AtomicBool,
    value: UnsafeCell<MaybeUninit<T>>,
}

impl<T> Slot<T> {
    fn new() -> Self {
        Self {
            ready: AtomicBool::new(false),
            value: UnsafeCell::new(MaybeUninit::uninit()),
        }
    }
}

/// Bounded lock-free MPSC queue
///
/// Holds at most `CAP - 1` values, matching [`crate::RingChannel`]. There is
/// no send hook; this is a fan-in building block, not a stdio path.
pub struct ConcurrentSlotQueue<T, const CAP: usize = CHANNEL_CAPACITY> {
    slots: [Slot<T>; CAP],
    write_index: AtomicUsize,
    read_index: AtomicUsize,
}

// SAFETY: a slot's value is written only by the producer that won the
// compare-and-swap for its position, and read only by the single consumer
// after observing `ready` with acquire ordering.
unsafe impl<T: Send, const CAP: usize> Sync for ConcurrentSlotQueue<T, CAP> {}
unsafe impl<T: Send, const CAP: usize> Send for ConcurrentSlotQueue<T, CAP> {}

impl<T, const CAP: usize> ConcurrentSlotQueue<T, CAP> {
    const SHAPE_OK: () = assert!(CAP >= 2, "slot queue needs CAP >= 2");

    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SHAPE_OK;
        Self {
            slots: core::array::from_fn(|_| Slot::new()),
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
        }
    }

    /// Attempts to enqueue `value`
    ///
    /// Fails, handing the value back, when the queue is full or when another
    /// producer claimed the same slot first. There is no internal retry.
    pub fn try_send(&self, value: T) -> Result<(), T> {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Acquire);
        if write.wrapping_sub(read) >= CAP - 1 {
            return Err(value);
        }

        if self
            .write_index
            .compare_exchange(write, write.wrapping_add(1), Ordering::AcqRel, Ordering::Relaxed)
            .is_err()
        {
            return Err(value);
        }

        let slot = &self.slots[write % CAP];
        // SAFETY: the successful compare-and-swap gives this producer sole
        // ownership of the slot until `ready` is published, and the consumer
        // released it before advancing `read_index` past its previous use.
        unsafe {
            (*slot.value.get()).write(value);
        }
        slot.ready.store(true, Ordering::Release);
        Ok(())
    }

    /// Dequeues the oldest published value. Single consumer only.
    pub fn try_recv(&self) -> Option<T> {
        let read = self.read_index.load(Ordering::Acquire);
        let write = self.write_index.load(Ordering::Acquire);
        if read == write {
            return None;
        }

        let slot = &self.slots[read % CAP];
        if !slot.ready.load(Ordering::Acquire) {
            return None;
        }

        // SAFETY: `ready` was set after the value was fully written, and only
        // the consumer clears it.
        let value = unsafe { (*slot.value.get()).assume_init_read() };
        slot.ready.store(false, Ordering::Release);
        self.read_index.store(read.wrapping_add(1), Ordering::Release);
        Some(value)
    }

    /// Number of claimed positions not yet consumed
    pub fn len(&self) -> usize {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Acquire);
        write.wrapping_sub(read)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        CAP
    }
}

impl<T, const CAP: usize> Default for ConcurrentSlotQueue<T, CAP> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const CAP: usize> Drop for ConcurrentSlotQueue<T, CAP> {
    fn drop(&mut self) {
        while self.try_recv().is_some() {}
    }
}

impl<T, const CAP: usize> fmt::Debug for ConcurrentSlotQueue<T, CAP> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConcurrentSlotQueue")
            .field("capacity", &CAP)
            .field("len", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::string::String;
    use std::sync::Arc;

    #[test]
    fn test_send_recv_order() {
        let queue: ConcurrentSlotQueue<u32, 8> = ConcurrentSlotQueue::new();
        for i in 0..5 {
            assert!(queue.try_send(i).is_ok());
        }
        for i in 0..5 {
            assert_eq!(queue.try_recv(), Some(i));
        }
        assert_eq!(queue.try_recv(), None);
    }

    #[test]
    fn test_full_hands_value_back() {
        let queue: ConcurrentSlotQueue<String, 4> = ConcurrentSlotQueue::new();
        for name in ["a", "b", "c"] {
            assert!(queue.try_send(String::from(name)).is_ok());
        }
        let rejected = queue.try_send(String::from("d"));
        assert_eq!(rejected, Err(String::from("d")));

        assert_eq!(queue.try_recv().as_deref(), Some("a"));
        assert!(queue.try_send(String::from("d")).is_ok());
    }

    #[test]
    fn test_drop_releases_pending_values() {
        let marker = Arc::new(());
        {
            let queue: ConcurrentSlotQueue<Arc<()>, 4> = ConcurrentSlotQueue::new();
            queue.try_send(Arc::clone(&marker)).unwrap();
            queue.try_send(Arc::clone(&marker)).unwrap();
            assert_eq!(Arc::strong_count(&marker), 3);
        }
        assert_eq!(Arc::strong_count(&marker), 1);
    }

    #[test]
    fn test_wraps_many_times() {
        let queue: ConcurrentSlotQueue<usize, 3> = ConcurrentSlotQueue::new();
        for i in 0..1000 {
            queue.try_send(i).unwrap();
            assert_eq!(queue.try_recv(), Some(i));
        }
        assert!(queue.is_empty());
    }
}
