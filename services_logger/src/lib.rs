//! # Logger Service
//!
//! This crate implements structured logging.
//!
//! ## Philosophy
//!
//! Logging is explicit and structured, not text-based or printf-style.
//! There is no ambient "current scope": every component receives a
//! [`Logger`] handle carrying its scope and the session it belongs to.
//!
//! Entries are forwarded to the `log` facade by default, so the host decides
//! where they go (the native binary installs `env_logger`).

use std::fmt;
use std::sync::{Arc, Mutex};
use uuid::Uuid;

/// Log level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    /// Debug information
    Debug,
    /// Informational messages
    Info,
    /// Warnings
    Warn,
    /// Errors
    Error,
}

impl LogLevel {
    fn to_log(self) -> log::Level {
        match self {
            Self::Debug => log::Level::Debug,
            Self::Info => log::Level::Info,
            Self::Warn => log::Level::Warn,
            Self::Error => log::Level::Error,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "debug"),
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A structured log entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogEntry {
    /// Log level
    pub level: LogLevel,
    /// Emitting component, filled in by the logger
    pub scope: String,
    /// Log message
    pub message: String,
    /// Structured fields
    pub fields: Vec<(String, String)>,
}

impl LogEntry {
    /// Creates a new log entry
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            scope: String::new(),
            message: message.into(),
            fields: Vec::new(),
        }
    }

    /// Adds a field to the log entry
    pub fn with_field(mut self, key: impl Into<String>, value: impl fmt::Display) -> Self {
        self.fields.push((key.into(), value.to_string()));
        self
    }

    /// Looks up a field value
    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)?;
        for (key, value) in &self.fields {
            write!(f, " {}={}", key, value)?;
        }
        Ok(())
    }
}

/// Destination for log entries
pub trait LogSink: Send + Sync {
    fn record(&self, entry: &LogEntry);
}

/// Forwards entries to the `log` facade, using the scope as target
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn record(&self, entry: &LogEntry) {
        log::log!(target: entry.scope.as_str(), entry.level.to_log(), "{}", entry);
    }
}

/// Keeps entries in memory (for testing)
#[derive(Debug, Default)]
pub struct MemorySink {
    entries: Mutex<Vec<LogEntry>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a copy of everything recorded so far
    pub fn entries(&self) -> Vec<LogEntry> {
        match self.entries.lock() {
            Ok(entries) => entries.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// Returns entries whose message matches exactly
    pub fn find(&self, message: &str) -> Vec<LogEntry> {
        self.entries()
            .into_iter()
            .filter(|entry| entry.message == message)
            .collect()
    }
}

impl LogSink for MemorySink {
    fn record(&self, entry: &LogEntry) {
        match self.entries.lock() {
            Ok(mut entries) => entries.push(entry.clone()),
            Err(poisoned) => poisoned.into_inner().push(entry.clone()),
        }
    }
}

/// Identifier shared by every logger of one runtime instance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(Uuid);

impl SessionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let simple = self.0.simple().to_string();
        write!(f, "{}", &simple[..8])
    }
}

/// A scoped logging handle
///
/// Cheap to clone. Child loggers share the session and sink.
#[derive(Clone)]
pub struct Logger {
    scope: String,
    session: SessionId,
    min_level: LogLevel,
    sink: Arc<dyn LogSink>,
}

impl Logger {
    /// Creates a root logger for a new session, writing to the `log` facade
    pub fn new(scope: impl Into<String>) -> Self {
        Self::with_sink(scope, Arc::new(FacadeSink))
    }

    /// Creates a root logger writing to `sink`
    pub fn with_sink(scope: impl Into<String>, sink: Arc<dyn LogSink>) -> Self {
        Self {
            scope: scope.into(),
            session: SessionId::new(),
            min_level: LogLevel::Debug,
            sink,
        }
    }

    /// Derives a logger for a sub-component: `parent::name`
    pub fn child(&self, name: &str) -> Self {
        Self {
            scope: format!("{}::{}", self.scope, name),
            ..self.clone()
        }
    }

    /// Drops entries below `level`
    pub fn with_min_level(mut self, level: LogLevel) -> Self {
        self.min_level = level;
        self
    }

    pub fn scope(&self) -> &str {
        &self.scope
    }

    pub fn session(&self) -> SessionId {
        self.session
    }

    /// Records an entry, stamping it with this logger's scope and session
    pub fn emit(&self, mut entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }
        entry.scope = self.scope.clone();
        entry.fields.push(("session".to_string(), self.session.to_string()));
        self.sink.record(&entry);
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.emit(LogEntry::new(LogLevel::Debug, message));
    }

    pub fn info(&self, message: impl Into<String>) {
        self.emit(LogEntry::new(LogLevel::Info, message));
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.emit(LogEntry::new(LogLevel::Warn, message));
    }

    pub fn error(&self, message: impl Into<String>) {
        self.emit(LogEntry::new(LogLevel::Error, message));
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("scope", &self.scope)
            .field("session", &self.session)
            .field("min_level", &self.min_level)
            .finish()
    }
}
