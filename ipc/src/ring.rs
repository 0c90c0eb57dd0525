//! Single-producer/single-consumer ring channel
//!
//! A [`RingChannel`] is a fixed array of message slots with two cursors:
//! `write_index`, advanced only by the producer, and `read_index`, advanced
//! only by the consumer. One slot is always left free so that
//! `write_index == read_index` means empty and
//! `(write_index + 1) % CAP == read_index` means full.
//!
//! Exactly one producer and one consumer may use an instance at a time. This
//! is a convention, not something the type enforces; slot bytes are stored in
//! atomics so that a violation corrupts messages instead of memory.

use crate::slot::{MessageSlot, MESSAGE_CAPACITY};
use alloc::boxed::Box;
use core::fmt;
use core::sync::atomic::{AtomicU8, AtomicUsize, Ordering};

/// Slots per channel in all stdio uses.
pub const CHANNEL_CAPACITY: usize = 32;

/// Send-completion hook
///
/// Invoked synchronously on the sender's call stack right after a message
/// has been published. The hook receives the channel it is attached to and
/// may drain it, but must not call [`RingChannel::send`] on that same channel.
pub type SendHook<const CAP: usize = CHANNEL_CAPACITY, const MSG: usize = MESSAGE_CAPACITY> =
    Box<dyn Fn(&RingChannel<CAP, MSG>) + Send + Sync>;

struct SharedSlot<const MSG: usize> {
    bytes: [AtomicU8; MSG],
    len: AtomicUsize,
}

impl<const MSG: usize> SharedSlot<MSG> {
    fn new() -> Self {
        Self {
            bytes: core::array::from_fn(|_| AtomicU8::new(0)),
            len: AtomicUsize::new(0),
        }
    }

    fn store(&self, bytes: &[u8]) {
        let len = bytes.len().min(MSG);
        for (cell, &byte) in self.bytes.iter().zip(&bytes[..len]) {
            cell.store(byte, Ordering::Relaxed);
        }
        self.len.store(len, Ordering::Relaxed);
    }

    fn load(&self) -> MessageSlot<MSG> {
        let len = self.len.load(Ordering::Relaxed).min(MSG);
        let mut bytes = [0u8; MSG];
        for (byte, cell) in bytes.iter_mut().zip(&self.bytes[..len]) {
            *byte = cell.load(Ordering::Relaxed);
        }
        MessageSlot::from_bytes(&bytes[..len])
    }
}

/// Bounded SPSC byte-message channel
pub struct RingChannel<const CAP: usize = CHANNEL_CAPACITY, const MSG: usize = MESSAGE_CAPACITY>
{
    slots: [SharedSlot<MSG>; CAP],
    write_index: AtomicUsize,
    read_index: AtomicUsize,
    hook: Option<SendHook<CAP, MSG>>,
}

impl<const CAP: usize, const MSG: usize> RingChannel<CAP, MSG> {
    const SHAPE_OK: () = assert!(CAP >= 2 && MSG > 0, "ring channel needs CAP >= 2 and MSG > 0");

    /// Creates an empty channel with no hook
    pub fn new() -> Self {
        #[allow(clippy::let_unit_value)]
        let () = Self::SHAPE_OK;
        Self {
            slots: core::array::from_fn(|_| SharedSlot::new()),
            write_index: AtomicUsize::new(0),
            read_index: AtomicUsize::new(0),
            hook: None,
        }
    }

    /// Builder form of [`RingChannel::on_send`]
    pub fn with_send_hook<F>(mut self, hook: F) -> Self
    where
        F: Fn(&RingChannel<CAP, MSG>) + Send + Sync + 'static,
    {
        self.on_send(hook);
        self
    }

    /// Registers the send-completion hook
    ///
    /// The last registration wins; hooks are not chained.
    pub fn on_send<F>(&mut self, hook: F)
    where
        F: Fn(&RingChannel<CAP, MSG>) + Send + Sync + 'static,
    {
        self.hook = Some(Box::new(hook));
    }

    /// Removes the send-completion hook
    pub fn clear_send_hook(&mut self) {
        self.hook = None;
    }

    pub fn has_send_hook(&self) -> bool {
        self.hook.is_some()
    }

    /// Enqueues a copy of `bytes` (truncated to `MSG` bytes)
    ///
    /// Returns false and drops the message when the channel is full. Never
    /// blocks. On success the hook, if any, runs before this returns.
    pub fn send(&self, bytes: &[u8]) -> bool {
        let write = self.write_index.load(Ordering::Relaxed);
        let next = (write + 1) % CAP;
        if next == self.read_index.load(Ordering::Acquire) {
            return false;
        }

        self.slots[write].store(bytes);
        self.write_index.store(next, Ordering::Release);

        if let Some(hook) = &self.hook {
            hook(self);
        }
        true
    }

    /// Dequeues the oldest message, if any
    pub fn recv(&self) -> Option<MessageSlot<MSG>> {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Acquire);
        if write == read {
            return None;
        }

        let message = self.slots[read].load();
        self.read_index.store((read + 1) % CAP, Ordering::Release);
        Some(message)
    }

    /// Number of messages waiting to be received
    pub fn len(&self) -> usize {
        let write = self.write_index.load(Ordering::Acquire);
        let read = self.read_index.load(Ordering::Acquire);
        (write + CAP - read) % CAP
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_full(&self) -> bool {
        self.len() == CAP - 1
    }

    /// Slot count; at most `CAP - 1` messages can be pending
    pub const fn capacity(&self) -> usize {
        CAP
    }

    pub const fn message_capacity(&self) -> usize {
        MSG
    }
}

impl<const CAP: usize, const MSG: usize> Default for RingChannel<CAP, MSG> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const CAP: usize, const MSG: usize> fmt::Debug for RingChannel<CAP, MSG> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RingChannel")
            .field("capacity", &CAP)
            .field("message_capacity", &MSG)
            .field("write_index", &self.write_index.load(Ordering::Relaxed))
            .field("read_index", &self.read_index.load(Ordering::Relaxed))
            .field("has_send_hook", &self.hook.is_some())
            .finish()
    }
}
