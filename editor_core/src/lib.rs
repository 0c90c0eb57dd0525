#![no_std]

//! # Editor Core
//!
//! Command-line editing state shared by every host.
//!
//! ## Philosophy
//!
//! - **Fixed capacity**: The line and the history live in fixed buffers
//! - **Characters, not bytes**: The cursor counts UTF-8 characters, so it can
//!   never land inside a multi-byte sequence
//! - **Mechanism over policy**: The core edits text; the shell decides what
//!   to echo and when
//!
//! ## Design
//!
//! - [`LineEditor`]: cursor-tracked text buffer with insert/remove at cursor
//! - [`CommandHistory`]: ring of committed lines with a browse cursor

pub mod history;
pub mod line;

pub use history::{CommandHistory, HISTORY_SIZE};
pub use line::{LineEditor, LINE_CAPACITY};
