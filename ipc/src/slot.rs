//! Fixed-size message slots

use core::fmt;

/// Bytes per message slot.
pub const MESSAGE_CAPACITY: usize = 256;

/// A fixed-capacity byte message
///
/// Content beyond `len` is undefined and never observed through the API.
#[derive(Clone, Copy)]
pub struct MessageSlot<const N: usize = MESSAGE_CAPACITY> {
    bytes: [u8; N],
    len: usize,
}

impl<const N: usize> MessageSlot<N> {
    /// Creates an empty slot
    pub const fn empty() -> Self {
        Self {
            bytes: [0u8; N],
            len: 0,
        }
    }

    /// Creates a slot holding `bytes`, truncated to the slot capacity
    pub fn from_bytes(bytes: &[u8]) -> Self {
        let mut slot = Self::empty();
        slot.push_bytes(bytes);
        slot
    }

    /// Appends as many bytes as fit and returns how many were taken
    pub fn push_bytes(&mut self, bytes: &[u8]) -> usize {
        let take = bytes.len().min(N - self.len);
        self.bytes[self.len..self.len + take].copy_from_slice(&bytes[..take]);
        self.len += take;
        take
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes[..self.len]
    }

    /// Returns the content as text if it is valid UTF-8
    pub fn as_str(&self) -> Option<&str> {
        core::str::from_utf8(self.as_bytes()).ok()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Remaining space in bytes
    pub fn remaining(&self) -> usize {
        N - self.len
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    pub fn clear(&mut self) {
        self.len = 0;
    }
}

impl<const N: usize> Default for MessageSlot<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> PartialEq for MessageSlot<N> {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl<const N: usize> Eq for MessageSlot<N> {}

impl<const N: usize> fmt::Debug for MessageSlot<N> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(text) => write!(f, "MessageSlot({:?})", text),
            None => write!(f, "MessageSlot({:?})", self.as_bytes()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_bytes_truncates() {
        let slot: MessageSlot<4> = MessageSlot::from_bytes(b"abcdef");
        assert_eq!(slot.as_bytes(), b"abcd");
        assert_eq!(slot.len(), 4);
        assert_eq!(slot.remaining(), 0);
    }

    #[test]
    fn test_push_bytes_reports_taken() {
        let mut slot: MessageSlot<8> = MessageSlot::empty();
        assert_eq!(slot.push_bytes(b"hello"), 5);
        assert_eq!(slot.push_bytes(b"world"), 3);
        assert_eq!(slot.as_str(), Some("hellowor"));
    }

    #[test]
    fn test_equality_ignores_stale_bytes() {
        let mut a: MessageSlot<8> = MessageSlot::from_bytes(b"stale");
        a.clear();
        a.push_bytes(b"ok");
        let b: MessageSlot<8> = MessageSlot::from_bytes(b"ok");
        assert_eq!(a, b);
    }

    #[test]
    fn test_invalid_utf8() {
        let slot: MessageSlot = MessageSlot::from_bytes(&[0xff, 0xfe]);
        assert!(slot.as_str().is_none());
        assert!(!slot.is_empty());
    }
}
