//! # Shell Console
//!
//! The interactive terminal and shell that run on top of the IPC channels.
//!
//! ## Data flow
//!
//! ```text
//! raw bytes -> input channel --hook--> Terminal (line editing, highlighting)
//!                                         |
//!                                         v completed line
//!                               command channel --hook--> ShellEngine
//!                                                             |
//!                                                             v response bytes
//!                                                output channel --hook--> Platform sink
//! ```
//!
//! Every hook runs synchronously on the sender's call stack, so one call to
//! [`Runtime::key`] drives a keystroke all the way to the output sink with no
//! polling thread. The same code runs under OS threads and under a host that
//! calls in synchronously.

pub mod ansi;
pub mod command;
pub mod engine;
pub mod platform;
pub mod runtime;
pub mod terminal;
pub mod writer;

pub use command::{Arity, ShellCommand};
pub use engine::{Outcome, ShellEngine, ShellState};
pub use platform::{Platform, Target};
pub use runtime::{Runtime, StdioChannel};
pub use terminal::{ConsoleSnapshot, LineSlot, Terminal};
pub use writer::OutputWriter;
