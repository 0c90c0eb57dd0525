//! ANSI escape output
//!
//! Everything the console draws goes through these helpers, so the byte
//! protocol seen by a host terminal is defined in one place.

use crate::command::ShellCommand;
use crate::platform::Target;
use core::fmt::{self, Write};

pub const RESET: &str = "\x1b[0m";
pub const CLEAR_SCREEN: &str = "\x1b[2J\x1b[H";
pub const CRLF: &str = "\r\n";

/// Backspace, blank, backspace: erases one cell to the left of the cursor
pub const ERASE_BACK: &str = "\x08 \x08";

pub const PROJECT_URL: &str = "https://github.com/burrow-sh/burrow";

/// Foreground colors used by the console
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Red = 31,
    Green = 32,
    Yellow = 33,
    Blue = 34,
    Magenta = 35,
    Cyan = 36,
    White = 37,
}

/// Color of a line that is a complete, valid command
pub const VALID_COLOR: Color = Color::Green;

/// Color of anything else typed at the prompt
pub const INVALID_COLOR: Color = Color::White;

pub fn color<W: Write>(out: &mut W, color: Color) -> fmt::Result {
    write!(out, "\x1b[{}m", color as u8)
}

pub fn bold_color<W: Write>(out: &mut W, color: Color) -> fmt::Result {
    write!(out, "\x1b[1;{}m", color as u8)
}

pub fn cursor_left<W: Write>(out: &mut W, cells: usize) -> fmt::Result {
    for _ in 0..cells {
        out.write_str("\x1b[D")?;
    }
    Ok(())
}

pub fn cursor_right<W: Write>(out: &mut W, cells: usize) -> fmt::Result {
    for _ in 0..cells {
        out.write_str("\x1b[C")?;
    }
    Ok(())
}

pub fn erase_back<W: Write>(out: &mut W, cells: usize) -> fmt::Result {
    for _ in 0..cells {
        out.write_str(ERASE_BACK)?;
    }
    Ok(())
}

/// OSC 8 hyperlink
pub fn hyperlink<W: Write>(out: &mut W, url: &str, text: &str) -> fmt::Result {
    write!(out, "\x1b]8;;{url}\x1b\\{text}\x1b]8;;\x1b\\")
}

/// The banner shown at startup and after `clear`
pub fn greeting<W: Write>(out: &mut W, target: Target) -> fmt::Result {
    bold_color(out, Color::Cyan)?;
    out.write_str("Burrow")?;
    out.write_str(RESET)?;
    write!(out, " terminal ({target}){CRLF}")?;
    out.write_str("Source: ")?;
    color(out, Color::Blue)?;
    hyperlink(out, PROJECT_URL, PROJECT_URL)?;
    out.write_str(RESET)?;
    out.write_str(CRLF)?;
    write!(
        out,
        "Type 'help' for commands. Commands turn green once complete.{CRLF}{CRLF}"
    )
}

/// The prompt for the given working directory
pub fn prompt<W: Write>(out: &mut W, cwd: &str) -> fmt::Result {
    bold_color(out, Color::Green)?;
    out.write_str("burrow")?;
    out.write_str(RESET)?;
    out.write_char(':')?;
    bold_color(out, Color::Blue)?;
    out.write_str(cwd)?;
    out.write_str(RESET)?;
    out.write_str("$ ")
}

pub fn help<W: Write>(out: &mut W) -> fmt::Result {
    write!(out, "Commands:{CRLF}")?;
    for command in ShellCommand::ALL {
        write!(out, "  {:<14}{}{CRLF}", command.usage(), command.summary())?;
    }
    write!(
        out,
        "Keys: Tab completes, Up/Down browse history, Ctrl-C cancels, Ctrl-L clears, Ctrl-D exits{CRLF}"
    )
}
