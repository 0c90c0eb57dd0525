//! Command history ring

use crate::line::LINE_CAPACITY;
use ipc::MessageSlot;

/// Number of remembered commands
pub const HISTORY_SIZE: usize = 32;

type Entry = MessageSlot<LINE_CAPACITY>;

/// Fixed ring of previously committed command lines
///
/// Entries are stored oldest first. The browse index equals `len()` when the
/// user is on a fresh line, and moves down towards 0 with [`CommandHistory::up`].
#[derive(Clone)]
pub struct CommandHistory {
    entries: [Entry; HISTORY_SIZE],
    len: usize,
    browse: usize,
}

impl CommandHistory {
    pub const fn new() -> Self {
        Self {
            entries: [Entry::empty(); HISTORY_SIZE],
            len: 0,
            browse: 0,
        }
    }

    /// Commits a line
    ///
    /// Empty lines and immediate repeats of the newest entry are not stored.
    /// When full, the oldest entry is evicted. Browsing always resets.
    pub fn push(&mut self, line: &str) {
        let skip = line.is_empty() || self.newest() == Some(line);
        if !skip {
            if self.len == HISTORY_SIZE {
                self.entries.copy_within(1.., 0);
                self.len -= 1;
            }
            self.entries[self.len] = Entry::from_bytes(line.as_bytes());
            self.len += 1;
        }
        self.browse = self.len;
    }

    /// Steps back to an older entry
    ///
    /// Stays on the oldest entry once reached. Returns `None` only when the
    /// history is empty.
    pub fn up(&mut self) -> Option<&str> {
        if self.len == 0 {
            return None;
        }
        if self.browse > 0 {
            self.browse -= 1;
        }
        self.get(self.browse)
    }

    /// Steps forward to a newer entry
    ///
    /// Moving past the newest entry returns an empty string for the fresh
    /// line. Returns `None` when not browsing.
    pub fn down(&mut self) -> Option<&str> {
        if self.browse >= self.len {
            return None;
        }
        self.browse += 1;
        if self.browse == self.len {
            return Some("");
        }
        self.get(self.browse)
    }

    /// Returns to the fresh line without committing anything
    pub fn reset_browse(&mut self) {
        self.browse = self.len;
    }

    pub fn is_browsing(&self) -> bool {
        self.browse < self.len
    }

    /// Entry by age, 0 being the oldest
    pub fn get(&self, index: usize) -> Option<&str> {
        self.entries[..self.len].get(index).and_then(Entry::as_str)
    }

    pub fn newest(&self) -> Option<&str> {
        self.len.checked_sub(1).and_then(|i| self.get(i))
    }

    /// Iterates entries oldest first
    pub fn iter(&self) -> impl Iterator<Item = &str> + '_ {
        self.entries[..self.len].iter().filter_map(Entry::as_str)
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl Default for CommandHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::format;
    use std::string::String;
    use std::vec::Vec;

    #[test]
    fn test_up_returns_newest_first() {
        let mut history = CommandHistory::new();
        history.push("ls");
        history.push("pwd");
        assert_eq!(history.up(), Some("pwd"));
        assert_eq!(history.up(), Some("ls"));
        assert_eq!(history.up(), Some("ls"));
    }

    #[test]
    fn test_down_returns_to_fresh_line() {
        let mut history = CommandHistory::new();
        history.push("ls");
        history.push("pwd");
        assert_eq!(history.down(), None);
        history.up();
        history.up();
        assert_eq!(history.down(), Some("pwd"));
        assert_eq!(history.down(), Some(""));
        assert!(!history.is_browsing());
        assert_eq!(history.down(), None);
    }

    #[test]
    fn test_eviction_when_full() {
        let mut history = CommandHistory::new();
        let commands: Vec<String> = (0..=HISTORY_SIZE).map(|i| format!("cd dir{}", i)).collect();
        for command in &commands {
            history.push(command);
        }
        assert_eq!(history.len(), HISTORY_SIZE);
        assert_eq!(history.get(0), Some("cd dir1"));
        assert_eq!(history.up(), Some(commands[HISTORY_SIZE].as_str()));
    }

    #[test]
    fn test_push_resets_browse() {
        let mut history = CommandHistory::new();
        history.push("ls");
        history.push("pwd");
        history.up();
        history.up();
        assert!(history.is_browsing());
        history.push("help");
        assert!(!history.is_browsing());
        assert_eq!(history.up(), Some("help"));
    }

    #[test]
    fn test_skip_empty_and_repeats() {
        let mut history = CommandHistory::new();
        history.push("");
        history.push("ls");
        history.push("ls");
        assert_eq!(history.len(), 1);
        assert_eq!(history.iter().count(), 1);
    }

    #[test]
    fn test_empty_history() {
        let mut history = CommandHistory::new();
        assert_eq!(history.up(), None);
        assert_eq!(history.down(), None);
        assert_eq!(history.newest(), None);
    }
}
