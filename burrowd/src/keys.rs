//! Arrow key recognition for byte streams
//!
//! The console decodes one byte at a time and cannot see escape sequences.
//! Hosts that read a raw terminal pick `ESC [ A..D` out of the stream here
//! and deliver those keys out-of-band.

use input_types::ArrowKey;
use shell_console::Runtime;

const ESC: u8 = 0x1B;

/// A unit of host input
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostKey {
    Byte(u8),
    Arrow(ArrowKey),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Ground,
    Escape,
    Csi,
}

/// Splits a raw byte stream into plain bytes and arrow keys
#[derive(Debug, Clone)]
pub struct KeyReader {
    state: State,
}

impl KeyReader {
    pub fn new() -> Self {
        Self {
            state: State::Ground,
        }
    }

    /// Consumes one byte
    ///
    /// Bytes belonging to an escape sequence are swallowed. Other CSI
    /// sequences (function keys and the like) are dropped whole.
    pub fn push(&mut self, byte: u8) -> Option<HostKey> {
        match self.state {
            State::Ground if byte == ESC => {
                self.state = State::Escape;
                None
            }
            State::Ground => Some(HostKey::Byte(byte)),
            State::Escape if byte == b'[' => {
                self.state = State::Csi;
                None
            }
            State::Escape if byte == ESC => None,
            State::Escape => {
                self.state = State::Ground;
                Some(HostKey::Byte(byte))
            }
            State::Csi => match byte {
                0x20..=0x3F => None,
                _ => {
                    self.state = State::Ground;
                    ArrowKey::from_code(byte).map(HostKey::Arrow)
                }
            },
        }
    }

    /// Pushes `bytes` into `runtime`, batching plain bytes between arrows
    pub fn deliver(&mut self, runtime: &Runtime, bytes: &[u8]) {
        let mut plain = Vec::with_capacity(bytes.len());
        for &byte in bytes {
            match self.push(byte) {
                Some(HostKey::Byte(byte)) => plain.push(byte),
                Some(HostKey::Arrow(key)) => {
                    if !plain.is_empty() {
                        runtime.feed(&plain);
                        plain.clear();
                    }
                    runtime.arrow(key);
                }
                None => {}
            }
        }
        if !plain.is_empty() {
            runtime.feed(&plain);
        }
    }
}

impl Default for KeyReader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn read_all(bytes: &[u8]) -> Vec<HostKey> {
        let mut reader = KeyReader::new();
        bytes.iter().filter_map(|&byte| reader.push(byte)).collect()
    }

    #[test]
    fn test_plain_bytes_pass_through() {
        assert_eq!(
            read_all(b"ls\r"),
            vec![HostKey::Byte(b'l'), HostKey::Byte(b's'), HostKey::Byte(b'\r')]
        );
    }

    #[test]
    fn test_arrow_sequences() {
        assert_eq!(
            read_all(b"\x1b[A\x1b[B\x1b[C\x1b[D"),
            vec![
                HostKey::Arrow(ArrowKey::Up),
                HostKey::Arrow(ArrowKey::Down),
                HostKey::Arrow(ArrowKey::Right),
                HostKey::Arrow(ArrowKey::Left),
            ]
        );
    }

    #[test]
    fn test_other_csi_sequences_are_dropped() {
        assert_eq!(read_all(b"\x1b[3~x"), vec![HostKey::Byte(b'x')]);
    }

    #[test]
    fn test_modified_arrow_is_still_an_arrow() {
        assert_eq!(
            read_all(b"\x1b[1;5Cy"),
            vec![HostKey::Arrow(ArrowKey::Right), HostKey::Byte(b'y')]
        );
    }

    #[test]
    fn test_lone_escape_then_byte() {
        assert_eq!(read_all(b"\x1bq"), vec![HostKey::Byte(b'q')]);
    }
}
