#![no_std]

//! # Input Types
//!
//! This crate defines the structured input events that drive the Burrow
//! terminal, and the single-byte decoder that produces them.
//!
//! ## Philosophy
//!
//! - **Events, not bytes**: The shell reacts to decoded events, never to raw bytes
//! - **One byte, one event**: Decoding is stateless and prioritised
//! - **Testable**: Events are serializable and can be injected for testing
//!
//! ## Decoding
//!
//! | Byte(s)        | Event                         |
//! |----------------|-------------------------------|
//! | 3, 4, 12, 26   | Ctrl-C, Ctrl-D, Ctrl-L, Ctrl-Z |
//! | 9              | Tab                           |
//! | 13, 10         | Enter                         |
//! | 127, 8         | Backspace                     |
//! | 27             | Escape                        |
//! | 0x20..=0x7E    | literal key                   |
//! | 0x80..=0xFF    | literal key (UTF-8 fragment)  |
//!
//! Arrow keys have their own variant but no single byte maps to them; hosts
//! that know key identities inject [`InputEvent::Arrow`] directly.

use core::fmt;
use serde::{Deserialize, Serialize};

/// Input event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputEvent {
    /// A literal byte to insert into the line
    Key(u8),
    /// A control or editing key
    Control(ControlKey),
    /// A cursor or history navigation key
    Arrow(ArrowKey),
}

impl InputEvent {
    /// Decodes a single raw byte
    ///
    /// Returns `None` for control bytes that carry no meaning to the shell.
    pub fn decode(byte: u8) -> Option<Self> {
        if let Some(control) = ControlKey::from_byte(byte) {
            return Some(Self::Control(control));
        }
        match byte {
            0x20..=0x7E | 0x80..=0xFF => Some(Self::Key(byte)),
            _ => None,
        }
    }

    /// Returns true if this is a literal key
    pub fn is_key(&self) -> bool {
        matches!(self, Self::Key(_))
    }

    /// Returns the literal byte if this is a key event
    pub fn as_key(&self) -> Option<u8> {
        match self {
            Self::Key(byte) => Some(*byte),
            _ => None,
        }
    }
}

impl From<ControlKey> for InputEvent {
    fn from(key: ControlKey) -> Self {
        Self::Control(key)
    }
}

impl From<ArrowKey> for InputEvent {
    fn from(key: ArrowKey) -> Self {
        Self::Arrow(key)
    }
}

impl fmt::Display for InputEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(byte) if byte.is_ascii_graphic() || *byte == b' ' => {
                write!(f, "key '{}'", *byte as char)
            }
            Self::Key(byte) => write!(f, "key 0x{:02x}", byte),
            Self::Control(key) => write!(f, "{}", key),
            Self::Arrow(key) => write!(f, "{}", key),
        }
    }
}

/// Control and editing keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ControlKey {
    CtrlC,
    CtrlD,
    CtrlL,
    CtrlZ,
    Tab,
    Enter,
    Backspace,
    Escape,
}

impl ControlKey {
    /// Maps a raw byte to a control key, in decoder priority order
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
            3 => Some(Self::CtrlC),
            4 => Some(Self::CtrlD),
            12 => Some(Self::CtrlL),
            26 => Some(Self::CtrlZ),
            9 => Some(Self::Tab),
            13 | 10 => Some(Self::Enter),
            127 | 8 => Some(Self::Backspace),
            27 => Some(Self::Escape),
            _ => None,
        }
    }

    /// Canonical byte for this key
    pub fn to_byte(self) -> u8 {
        match self {
            Self::CtrlC => 3,
            Self::CtrlD => 4,
            Self::CtrlL => 12,
            Self::CtrlZ => 26,
            Self::Tab => 9,
            Self::Enter => 13,
            Self::Backspace => 127,
            Self::Escape => 27,
        }
    }
}

impl fmt::Display for ControlKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CtrlC => write!(f, "ctrl-c"),
            Self::CtrlD => write!(f, "ctrl-d"),
            Self::CtrlL => write!(f, "ctrl-l"),
            Self::CtrlZ => write!(f, "ctrl-z"),
            Self::Tab => write!(f, "tab"),
            Self::Enter => write!(f, "enter"),
            Self::Backspace => write!(f, "backspace"),
            Self::Escape => write!(f, "escape"),
        }
    }
}

/// Arrow keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArrowKey {
    Up,
    Down,
    Left,
    Right,
}

impl ArrowKey {
    /// Maps the final byte of an `ESC [ x` sequence, or a host key code
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            b'A' => Some(Self::Up),
            b'B' => Some(Self::Down),
            b'C' => Some(Self::Right),
            b'D' => Some(Self::Left),
            _ => None,
        }
    }
}

impl fmt::Display for ArrowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Up => write!(f, "up"),
            Self::Down => write!(f, "down"),
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_decode_control_bytes() {
        assert_eq!(InputEvent::decode(3), Some(InputEvent::Control(ControlKey::CtrlC)));
        assert_eq!(InputEvent::decode(4), Some(InputEvent::Control(ControlKey::CtrlD)));
        assert_eq!(InputEvent::decode(12), Some(InputEvent::Control(ControlKey::CtrlL)));
        assert_eq!(InputEvent::decode(26), Some(InputEvent::Control(ControlKey::CtrlZ)));
        assert_eq!(InputEvent::decode(9), Some(InputEvent::Control(ControlKey::Tab)));
        assert_eq!(InputEvent::decode(27), Some(InputEvent::Control(ControlKey::Escape)));
    }

    #[test]
    fn test_decode_enter_and_backspace_aliases() {
        assert_eq!(InputEvent::decode(13), Some(ControlKey::Enter.into()));
        assert_eq!(InputEvent::decode(10), Some(ControlKey::Enter.into()));
        assert_eq!(InputEvent::decode(127), Some(ControlKey::Backspace.into()));
        assert_eq!(InputEvent::decode(8), Some(ControlKey::Backspace.into()));
    }

    #[test]
    fn test_decode_printable() {
        assert_eq!(InputEvent::decode(b'a'), Some(InputEvent::Key(b'a')));
        assert_eq!(InputEvent::decode(b' '), Some(InputEvent::Key(b' ')));
        assert_eq!(InputEvent::decode(b'~'), Some(InputEvent::Key(b'~')));
        assert_eq!(InputEvent::decode(0xc3), Some(InputEvent::Key(0xc3)));
    }

    #[test]
    fn test_decode_ignored_bytes() {
        assert_eq!(InputEvent::decode(0), None);
        assert_eq!(InputEvent::decode(1), None);
        assert_eq!(InputEvent::decode(21), None);
    }

    #[test]
    fn test_decode_never_yields_arrow() {
        for byte in 0..=255u8 {
            assert!(!matches!(InputEvent::decode(byte), Some(InputEvent::Arrow(_))));
        }
    }

    #[test]
    fn test_control_round_trip_through_byte() {
        for key in [
            ControlKey::CtrlC,
            ControlKey::CtrlD,
            ControlKey::CtrlL,
            ControlKey::CtrlZ,
            ControlKey::Tab,
            ControlKey::Enter,
            ControlKey::Backspace,
            ControlKey::Escape,
        ] {
            assert_eq!(ControlKey::from_byte(key.to_byte()), Some(key));
        }
    }

    #[test]
    fn test_arrow_from_code() {
        assert_eq!(ArrowKey::from_code(b'A'), Some(ArrowKey::Up));
        assert_eq!(ArrowKey::from_code(b'D'), Some(ArrowKey::Left));
        assert_eq!(ArrowKey::from_code(b'x'), None);
    }

    #[test]
    fn test_display() {
        assert_eq!(InputEvent::Key(b'q').to_string(), "key 'q'");
        assert_eq!(InputEvent::Key(0x80).to_string(), "key 0x80");
        assert_eq!(InputEvent::from(ArrowKey::Up).to_string(), "up");
        assert_eq!(InputEvent::from(ControlKey::CtrlL).to_string(), "ctrl-l");
    }

    #[test]
    fn test_event_serialization() {
        let event = InputEvent::Arrow(ArrowKey::Down);
        let json = serde_json::to_string(&event).unwrap();
        let back: InputEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
    }
}
