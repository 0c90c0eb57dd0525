//! # Burrow Host Daemon
//!
//! Hosts the console on a real machine or inside a page.
//!
//! ## Responsibilities
//!
//! - Owns process-level I/O: stdin, stderr, the terminal mode, and storage
//! - Feeds raw bytes and out-of-band arrow keys into a [`shell_console::Runtime`]
//! - Runs the native heartbeat loop and the optional file watcher
//! - Replays byte scripts for deterministic runs
//!
//! ## Non-Responsibilities
//!
//! The host does NOT:
//! - Interpret keys or commands (the console does)
//! - Render anything itself; output bytes are passed through untouched

pub mod config;
pub mod keys;
pub mod native;
pub mod script;
pub mod watcher;
pub mod web;

pub use config::{parse_args, ConfigError, HostConfig, Invocation};
pub use keys::{HostKey, KeyReader};
pub use native::{HostRuntimeError, NativeHost, NativePlatform, RawMode};
pub use script::{InputScript, ScriptError, ScriptStep};
pub use watcher::{WatchEvent, WatchHandle, Watcher};
pub use web::{HostBridge, WebRuntime, STORAGE_KEY};
