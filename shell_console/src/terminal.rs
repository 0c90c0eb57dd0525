//! Terminal stage: line editing and echo
//!
//! The [`Terminal`] turns decoded input events into screen updates and, on
//! Enter, hands the finished line to the shell. While the user types, the
//! line is redrawn in [`VALID_COLOR`] once it forms a complete command and in
//! [`INVALID_COLOR`] otherwise.

use crate::ansi::{self, CRLF, INVALID_COLOR, RESET, VALID_COLOR};
use crate::command::{Arity, ShellCommand};
use core::fmt::{self, Write};
use editor_core::{CommandHistory, LineEditor, LINE_CAPACITY};
use input_types::{ArrowKey, ControlKey, InputEvent};
use ipc::MessageSlot;
use serde::{Deserialize, Serialize};
use services_logger::{LogEntry, LogLevel, Logger};

/// A submitted command line
pub type LineSlot = MessageSlot<LINE_CAPACITY>;

/// Serializable view of the editing state
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsoleSnapshot {
    pub line: String,
    pub cursor: usize,
    pub valid: bool,
    pub history: Vec<String>,
    pub browsing: bool,
}

pub struct Terminal {
    editor: LineEditor,
    history: CommandHistory,
    valid: bool,
    logger: Logger,
}

impl Terminal {
    pub fn new(logger: Logger) -> Self {
        Self {
            editor: LineEditor::new(),
            history: CommandHistory::new(),
            valid: false,
            logger,
        }
    }

    pub fn line(&self) -> &str {
        self.editor.as_str()
    }

    /// Whether the current line is highlighted as a valid command
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn history(&self) -> &CommandHistory {
        &self.history
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        ConsoleSnapshot {
            line: self.editor.as_str().to_string(),
            cursor: self.editor.cursor(),
            valid: self.valid,
            history: self.history.iter().map(str::to_string).collect(),
            browsing: self.history.is_browsing(),
        }
    }

    /// Applies one event, echoing to `out`
    ///
    /// Returns the line to execute when the event completes one. Ctrl-C
    /// submits an empty line so the shell re-prompts.
    pub fn handle<W: Write>(&mut self, event: InputEvent, out: &mut W) -> Option<LineSlot> {
        let result = match event {
            InputEvent::Key(byte) => self.insert(byte, out).map(|()| None),
            InputEvent::Control(key) => self.control(key, out),
            InputEvent::Arrow(key) => self.arrow(key, out).map(|()| None),
        };
        match result {
            Ok(submit) => submit,
            Err(fmt::Error) => {
                self.logger.warn("failed to format terminal echo");
                None
            }
        }
    }

    fn insert<W: Write>(&mut self, byte: u8, out: &mut W) -> fmt::Result {
        let old = self.editor.cursor();
        if self.editor.insert_byte(byte).is_none() {
            if self.editor.is_full() {
                self.logger.debug("line full, input ignored");
            }
            return Ok(());
        }
        self.refresh(old, old, false, out)
    }

    fn control<W: Write>(&mut self, key: ControlKey, out: &mut W) -> Result<Option<LineSlot>, fmt::Error> {
        match key {
            ControlKey::Enter => return self.submit(out).map(Some),
            ControlKey::Backspace => {
                let old = self.editor.cursor();
                if self.editor.backspace() {
                    self.refresh(self.editor.cursor(), old, true, out)?;
                }
            }
            ControlKey::Tab => self.complete(out)?,
            ControlKey::CtrlC => {
                write!(out, "^C{RESET}{CRLF}")?;
                self.discard();
                return Ok(Some(LineSlot::empty()));
            }
            ControlKey::CtrlD => {
                if self.editor.is_empty() {
                    out.write_str(CRLF)?;
                    self.discard();
                    return Ok(Some(LineSlot::from_bytes(b"exit")));
                }
            }
            ControlKey::CtrlL => {
                self.discard();
                return Ok(Some(LineSlot::from_bytes(b"clear")));
            }
            ControlKey::CtrlZ | ControlKey::Escape => {
                self.logger.emit(
                    LogEntry::new(LogLevel::Debug, "control key ignored").with_field("key", key),
                );
            }
        }
        Ok(None)
    }

    fn arrow<W: Write>(&mut self, key: ArrowKey, out: &mut W) -> fmt::Result {
        match key {
            ArrowKey::Left => {
                if self.editor.move_cursor_left() {
                    ansi::cursor_left(out, 1)?;
                }
                Ok(())
            }
            ArrowKey::Right => {
                if self.editor.move_cursor_right() {
                    ansi::cursor_right(out, 1)?;
                }
                Ok(())
            }
            ArrowKey::Up | ArrowKey::Down => {
                let entry = if key == ArrowKey::Up {
                    self.history.up()
                } else {
                    self.history.down()
                };
                match entry.map(|text| LineSlot::from_bytes(text.as_bytes())) {
                    Some(entry) => self.replace_line(entry.as_str().unwrap_or(""), out),
                    None => Ok(()),
                }
            }
        }
    }

    fn submit<W: Write>(&mut self, out: &mut W) -> Result<LineSlot, fmt::Error> {
        let line = LineSlot::from_bytes(self.editor.as_str().as_bytes());
        write!(out, "{RESET}{CRLF}")?;
        if self.valid {
            self.history.push(line.as_str().unwrap_or("").trim());
        } else {
            self.history.reset_browse();
        }
        self.editor.clear();
        self.valid = false;
        Ok(line)
    }

    /// Completes the command word when exactly one command matches
    fn complete<W: Write>(&mut self, out: &mut W) -> fmt::Result {
        let line = self.editor.as_str();
        if self.editor.cursor() != self.editor.char_count() || line.contains(char::is_whitespace) {
            return Ok(());
        }
        let Some(command) = ShellCommand::complete(line) else {
            return Ok(());
        };

        let rest = &command.name()[line.len()..];
        let old = self.editor.cursor();
        for ch in rest.chars() {
            self.editor.insert_char(ch);
        }
        if command.arity() != Arity::None {
            self.editor.insert_char(' ');
        }
        if self.editor.cursor() == old {
            return Ok(());
        }
        self.refresh(old, old, false, out)
    }

    /// Swaps the whole line for a history entry
    fn replace_line<W: Write>(&mut self, text: &str, out: &mut W) -> fmt::Result {
        let moved = self.editor.move_cursor_to_end();
        ansi::cursor_right(out, moved)?;
        ansi::erase_back(out, self.editor.len())?;
        self.editor.set(text);
        self.valid = ShellCommand::is_valid(self.editor.as_str());
        self.paint_from(0, false, out)
    }

    fn discard(&mut self) {
        self.editor.clear();
        self.valid = false;
        self.history.reset_browse();
    }

    /// Re-evaluates validity and repaints what changed
    ///
    /// `from` is the first character that changed and `column` is where the
    /// terminal cursor currently sits. A validity flip repaints the whole
    /// line so the color stays uniform. `blank` clears one trailing cell left
    /// over after a deletion.
    fn refresh<W: Write>(&mut self, from: usize, column: usize, blank: bool, out: &mut W) -> fmt::Result {
        let valid = ShellCommand::is_valid(self.editor.as_str());
        let from = if valid != self.valid { 0 } else { from };
        self.valid = valid;

        ansi::cursor_left(out, column.saturating_sub(from))?;
        self.paint_from(from, blank, out)
    }

    /// Writes the line from character `from` onward, then puts the terminal
    /// cursor back on the editor cursor
    fn paint_from<W: Write>(&self, from: usize, blank: bool, out: &mut W) -> fmt::Result {
        let text = self.editor.as_str();
        let tail = text.char_indices().nth(from).map_or("", |(at, _)| &text[at..]);
        let color = if self.valid { VALID_COLOR } else { INVALID_COLOR };
        ansi::color(out, color)?;
        out.write_str(tail)?;
        out.write_str(RESET)?;
        if blank {
            out.write_char(' ')?;
        }
        let end = from + tail.chars().count() + usize::from(blank);
        ansi::cursor_left(out, end.saturating_sub(self.editor.cursor()))
    }
}
