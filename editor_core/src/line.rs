//! Cursor-tracked line buffer

use core::fmt;

/// Bytes a single command line can hold
pub const LINE_CAPACITY: usize = 256;

/// Expected length of a UTF-8 sequence from its first byte
fn sequence_len(lead: u8) -> Option<usize> {
    match lead {
        0x00..=0x7F => Some(1),
        0xC2..=0xDF => Some(2),
        0xE0..=0xEF => Some(3),
        0xF0..=0xF4 => Some(4),
        _ => None,
    }
}

/// A single-line text editor
///
/// The buffer is always valid UTF-8 and the cursor is a character offset
/// with `0 <= cursor <= char_count()`.
#[derive(Clone)]
pub struct LineEditor {
    buf: [u8; LINE_CAPACITY],
    len: usize,
    cursor: usize,
    /// Bytes of a multi-byte character still being fed in by `insert_byte`
    pending: [u8; 4],
    pending_len: usize,
}

impl LineEditor {
    pub const fn new() -> Self {
        Self {
            buf: [0u8; LINE_CAPACITY],
            len: 0,
            cursor: 0,
            pending: [0u8; 4],
            pending_len: 0,
        }
    }

    /// Feeds one raw input byte
    ///
    /// ASCII bytes are inserted immediately. Leading and continuation bytes of
    /// a multi-byte character are held until the character is complete.
    /// Returns the inserted character, or `None` while a sequence is pending,
    /// when the line is full, or when the byte cannot start or continue a
    /// valid sequence (the partial sequence is then discarded).
    pub fn insert_byte(&mut self, byte: u8) -> Option<char> {
        if self.pending_len > 0 {
            if byte & 0xC0 != 0x80 {
                self.pending_len = 0;
                return self.insert_byte(byte);
            }
            self.pending[self.pending_len] = byte;
            self.pending_len += 1;

            let expected = sequence_len(self.pending[0]).unwrap_or(1);
            if self.pending_len < expected {
                return None;
            }
            let complete = core::str::from_utf8(&self.pending[..self.pending_len])
                .ok()
                .and_then(|s| s.chars().next());
            self.pending_len = 0;
            return complete.filter(|&ch| self.insert_char(ch));
        }

        match sequence_len(byte) {
            Some(1) => {
                let ch = byte as char;
                self.insert_char(ch).then_some(ch)
            }
            Some(_) => {
                self.pending[0] = byte;
                self.pending_len = 1;
                None
            }
            None => None,
        }
    }

    /// Inserts `ch` at the cursor, shifting the rest of the line right
    ///
    /// Returns false if the character does not fit.
    pub fn insert_char(&mut self, ch: char) -> bool {
        let mut encoded = [0u8; 4];
        let bytes = ch.encode_utf8(&mut encoded).as_bytes();
        if self.len + bytes.len() > LINE_CAPACITY {
            return false;
        }

        let at = self.byte_offset(self.cursor);
        self.buf.copy_within(at..self.len, at + bytes.len());
        self.buf[at..at + bytes.len()].copy_from_slice(bytes);
        self.len += bytes.len();
        self.cursor += 1;
        true
    }

    /// Removes the character before the cursor
    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let end = self.byte_offset(self.cursor);
        let start = self.byte_offset(self.cursor - 1);
        self.buf.copy_within(end..self.len, start);
        self.len -= end - start;
        self.cursor -= 1;
        true
    }

    pub fn move_cursor_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor -= 1;
        true
    }

    pub fn move_cursor_right(&mut self) -> bool {
        if self.cursor >= self.char_count() {
            return false;
        }
        self.cursor += 1;
        true
    }

    /// Moves the cursor to the end and returns how many characters it moved
    pub fn move_cursor_to_end(&mut self) -> usize {
        let end = self.char_count();
        let moved = end - self.cursor;
        self.cursor = end;
        moved
    }

    /// Replaces the whole line and puts the cursor at its end
    ///
    /// Text longer than the buffer is cut at the last character boundary that
    /// fits; the return value says whether everything fit.
    pub fn set(&mut self, text: &str) -> bool {
        let mut end = text.len().min(LINE_CAPACITY);
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        self.buf[..end].copy_from_slice(&text.as_bytes()[..end]);
        self.len = end;
        self.pending_len = 0;
        self.cursor = self.char_count();
        end == text.len()
    }

    pub fn clear(&mut self) {
        self.len = 0;
        self.cursor = 0;
        self.pending_len = 0;
    }

    pub fn as_str(&self) -> &str {
        core::str::from_utf8(&self.buf[..self.len]).unwrap_or("")
    }

    /// Text before the cursor
    pub fn before_cursor(&self) -> &str {
        &self.as_str()[..self.byte_offset(self.cursor)]
    }

    /// Text from the cursor to the end of the line
    pub fn after_cursor(&self) -> &str {
        &self.as_str()[self.byte_offset(self.cursor)..]
    }

    /// Cursor position in characters
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn char_count(&self) -> usize {
        self.as_str().chars().count()
    }

    /// Length in bytes
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_full(&self) -> bool {
        self.len == LINE_CAPACITY
    }

    fn byte_offset(&self, char_index: usize) -> usize {
        self.as_str()
            .char_indices()
            .nth(char_index)
            .map_or(self.len, |(offset, _)| offset)
    }
}

impl Default for LineEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LineEditor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LineEditor")
            .field("text", &self.as_str())
            .field("cursor", &self.cursor)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn typed(text: &str) -> LineEditor {
        let mut editor = LineEditor::new();
        for byte in text.bytes() {
            editor.insert_byte(byte);
        }
        editor
    }

    #[test]
    fn test_insert_at_end() {
        let editor = typed("ls -a");
        assert_eq!(editor.as_str(), "ls -a");
        assert_eq!(editor.cursor(), 5);
    }

    #[test]
    fn test_insert_in_middle() {
        let mut editor = typed("mdir");
        editor.move_cursor_left();
        editor.move_cursor_left();
        editor.move_cursor_left();
        assert!(editor.insert_char('k'));
        assert_eq!(editor.as_str(), "mkdir");
        assert_eq!(editor.cursor(), 2);
        assert_eq!(editor.before_cursor(), "mk");
        assert_eq!(editor.after_cursor(), "dir");
    }

    #[test]
    fn test_backspace() {
        let mut editor = typed("cdd");
        assert!(editor.backspace());
        assert_eq!(editor.as_str(), "cd");
        editor.move_cursor_left();
        editor.move_cursor_left();
        assert!(!editor.backspace());
        assert_eq!(editor.as_str(), "cd");
    }

    #[test]
    fn test_multibyte_cursor_is_in_characters() {
        let mut editor = typed("añb");
        assert_eq!(editor.len(), 4);
        assert_eq!(editor.char_count(), 3);
        assert_eq!(editor.cursor(), 3);

        editor.move_cursor_left();
        assert!(editor.backspace());
        assert_eq!(editor.as_str(), "ab");
        assert_eq!(editor.cursor(), 1);
    }

    #[test]
    fn test_multibyte_reported_once_complete() {
        let mut editor = LineEditor::new();
        let bytes = "€".as_bytes();
        assert_eq!(editor.insert_byte(bytes[0]), None);
        assert_eq!(editor.insert_byte(bytes[1]), None);
        assert_eq!(editor.insert_byte(bytes[2]), Some('€'));
        assert_eq!(editor.as_str(), "€");
    }

    #[test]
    fn test_stray_continuation_is_dropped() {
        let mut editor = LineEditor::new();
        assert_eq!(editor.insert_byte(0x80), None);
        assert_eq!(editor.insert_byte(0xC3), None);
        // Broken sequence: the pending lead byte is discarded.
        assert_eq!(editor.insert_byte(b'x'), Some('x'));
        assert_eq!(editor.as_str(), "x");
    }

    #[test]
    fn test_cursor_bounds() {
        let mut editor = typed("ab");
        assert!(!editor.move_cursor_right());
        assert!(editor.move_cursor_left());
        assert!(editor.move_cursor_left());
        assert!(!editor.move_cursor_left());
        assert_eq!(editor.move_cursor_to_end(), 2);
    }

    #[test]
    fn test_set_and_clear() {
        let mut editor = LineEditor::new();
        assert!(editor.set("pwd"));
        assert_eq!(editor.cursor(), 3);
        editor.clear();
        assert!(editor.is_empty());
        assert_eq!(editor.cursor(), 0);
    }

    #[test]
    fn test_capacity() {
        let mut editor = LineEditor::new();
        for _ in 0..LINE_CAPACITY {
            assert!(editor.insert_char('a'));
        }
        assert!(editor.is_full());
        assert!(!editor.insert_char('b'));
        assert_eq!(editor.insert_byte(b'c'), None);
    }

    #[test]
    fn test_set_truncates_at_char_boundary() {
        let mut editor = LineEditor::new();
        let mut long = [b'a'; LINE_CAPACITY + 1];
        // Two-byte character straddling the capacity limit.
        long[LINE_CAPACITY - 1] = 0xC3;
        long[LINE_CAPACITY] = 0xA9;
        let text = core::str::from_utf8(&long).unwrap();
        assert!(!editor.set(text));
        assert_eq!(editor.len(), LINE_CAPACITY - 1);
    }
}
