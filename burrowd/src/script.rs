//! # Input Script Parser
//!
//! Scripted keyboard input for deterministic runs and demos.
//!
//! ## Format
//!
//! Scripts are line-based:
//! - `# comment` lines are skipped
//! - `wait 100ms` (or `wait 2s`) pauses the replay
//! - Any other line is typed byte by byte and followed by Enter (`\r`)
//!
//! Typed lines understand the escapes `\n`, `\r`, `\t`, `\\` and `\xNN`. A
//! trailing `\c` suppresses the Enter, so partial input can be scripted.
//!
//! ## Example
//!
//! ```text
//! # Make a directory and look at it
//! mkdir docs
//! cd docs
//! wait 50ms
//! pw\t\c
//! \x1b[A
//! ```

use thiserror::Error;

/// Input script error types
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ScriptError {
    #[error("Parse error at line {line}: unknown escape \\{escape}")]
    UnknownEscape { line: usize, escape: char },

    #[error("Parse error at line {line}: \\x needs two hex digits")]
    InvalidHex { line: usize },

    #[error("Parse error at line {line}: dangling backslash")]
    DanglingEscape { line: usize },

    #[error("Invalid delay format: {0}")]
    InvalidDelay(String),
}

/// One replay step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScriptStep {
    /// Raw bytes to feed
    Bytes(Vec<u8>),
    /// Pause in milliseconds
    Wait(u64),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputScript {
    steps: Vec<ScriptStep>,
}

impl InputScript {
    /// Parses a script from text
    pub fn from_text(text: &str) -> Result<Self, ScriptError> {
        let mut steps = Vec::new();
        for (index, line) in text.lines().enumerate() {
            let line_num = index + 1;
            if line.trim_start().starts_with('#') {
                continue;
            }
            if let Some(delay) = line.trim().strip_prefix("wait ") {
                steps.push(ScriptStep::Wait(parse_delay(delay.trim())?));
                continue;
            }
            steps.push(ScriptStep::Bytes(parse_bytes(line, line_num)?));
        }
        Ok(Self { steps })
    }

    pub fn steps(&self) -> &[ScriptStep] {
        &self.steps
    }

    /// All bytes the script types, waits removed
    pub fn bytes(&self) -> Vec<u8> {
        self.steps
            .iter()
            .filter_map(|step| match step {
                ScriptStep::Bytes(bytes) => Some(bytes.as_slice()),
                ScriptStep::Wait(_) => None,
            })
            .flatten()
            .copied()
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Decodes one typed line, appending Enter unless it ends in `\c`
fn parse_bytes(line: &str, line_num: usize) -> Result<Vec<u8>, ScriptError> {
    let mut out = Vec::with_capacity(line.len() + 1);
    let mut enter = true;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        if ch != '\\' {
            let mut encoded = [0u8; 4];
            out.extend_from_slice(ch.encode_utf8(&mut encoded).as_bytes());
            continue;
        }
        match chars.next() {
            Some('n') => out.push(b'\n'),
            Some('r') => out.push(b'\r'),
            Some('t') => out.push(b'\t'),
            Some('\\') => out.push(b'\\'),
            Some('x') => {
                let hi = chars.next().and_then(|c| c.to_digit(16));
                let lo = chars.next().and_then(|c| c.to_digit(16));
                match (hi, lo) {
                    (Some(hi), Some(lo)) => out.push((hi * 16 + lo) as u8),
                    _ => return Err(ScriptError::InvalidHex { line: line_num }),
                }
            }
            Some('c') if chars.peek().is_none() => enter = false,
            Some(escape) => return Err(ScriptError::UnknownEscape { line: line_num, escape }),
            None => return Err(ScriptError::DanglingEscape { line: line_num }),
        }
    }

    if enter {
        out.push(b'\r');
    }
    Ok(out)
}

fn parse_delay(text: &str) -> Result<u64, ScriptError> {
    let invalid = || ScriptError::InvalidDelay(text.to_string());
    if let Some(ms) = text.strip_suffix("ms") {
        ms.trim().parse().map_err(|_| invalid())
    } else if let Some(secs) = text.strip_suffix('s') {
        secs.trim()
            .parse::<u64>()
            .ok()
            .and_then(|secs| secs.checked_mul(1000))
            .ok_or_else(invalid)
    } else {
        Err(invalid())
    }
}
