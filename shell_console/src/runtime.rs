//! Channel wiring
//!
//! A [`Runtime`] owns the three stdio channels and the two stages between
//! them. The channels are built output-first so that every send hook only
//! refers to stages downstream of it; no hook ever sends on its own channel.

use crate::engine::{Outcome, ShellEngine};
use crate::platform::Platform;
use crate::terminal::{ConsoleSnapshot, Terminal};
use crate::writer::OutputWriter;
use fs_tree::ImageError;
use input_types::{ArrowKey, InputEvent};
use ipc::{RingChannel, CHANNEL_CAPACITY, MESSAGE_CAPACITY};
use services_logger::{LogEntry, LogLevel, Logger};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Channel type used for input, command and output traffic
pub type StdioChannel = RingChannel<CHANNEL_CAPACITY, MESSAGE_CAPACITY>;

/// The assembled console
pub struct Runtime {
    input: Arc<StdioChannel>,
    commands: Arc<StdioChannel>,
    output: Arc<StdioChannel>,
    terminal: Arc<Mutex<Terminal>>,
    shell: Arc<Mutex<ShellEngine>>,
    logger: Logger,
}

impl Runtime {
    pub fn new(platform: Arc<dyn Platform>, logger: Logger) -> Self {
        let output = {
            let platform = Arc::clone(&platform);
            Arc::new(StdioChannel::new().with_send_hook(move |channel| {
                while let Some(message) = channel.recv() {
                    platform.write_output(message.as_bytes());
                }
            }))
        };

        let shell = Arc::new(Mutex::new(ShellEngine::new(
            Arc::clone(&platform),
            logger.child("shell"),
        )));

        let commands = {
            let shell = Arc::clone(&shell);
            let output = Arc::clone(&output);
            let logger = logger.child("commands");
            Arc::new(StdioChannel::new().with_send_hook(move |channel| {
                while let Some(message) = channel.recv() {
                    let line = message.as_str().unwrap_or("");
                    run_line(&shell, &output, platform.as_ref(), &logger, line);
                }
            }))
        };

        let terminal = Arc::new(Mutex::new(Terminal::new(logger.child("terminal"))));

        let input = {
            let terminal = Arc::clone(&terminal);
            let commands = Arc::clone(&commands);
            let output = Arc::clone(&output);
            let logger = logger.child("input");
            Arc::new(StdioChannel::new().with_send_hook(move |channel| {
                while let Some(message) = channel.recv() {
                    for &byte in message.as_bytes() {
                        match InputEvent::decode(byte) {
                            Some(event) => dispatch(&terminal, &commands, &output, &logger, event),
                            None => logger.emit(
                                LogEntry::new(LogLevel::Debug, "undecodable input byte")
                                    .with_field("byte", byte),
                            ),
                        }
                    }
                }
            }))
        };

        logger.info("console runtime assembled");
        Self {
            input,
            commands,
            output,
            terminal,
            shell,
            logger,
        }
    }

    /// Writes the greeting and the first prompt
    pub fn boot(&self) {
        let mut out = OutputWriter::new(&self.output, &self.logger);
        if lock(&self.shell).greet(&mut out).is_err() {
            self.logger.warn("failed to format greeting");
        }
        out.flush();
    }

    /// Loads a persisted filesystem image
    pub fn restore(&self, image: &[u8]) -> Result<(), ImageError> {
        lock(&self.shell).restore(image)
    }

    /// Delivers one raw input byte
    ///
    /// Returns false if the input channel was full and the byte was dropped.
    pub fn key(&self, byte: u8) -> bool {
        self.input.send(&[byte])
    }

    /// Delivers raw input bytes in channel-sized messages
    ///
    /// Returns how many bytes were accepted.
    pub fn feed(&self, bytes: &[u8]) -> usize {
        let mut accepted = 0;
        for chunk in bytes.chunks(MESSAGE_CAPACITY) {
            if !self.input.send(chunk) {
                self.logger.emit(
                    LogEntry::new(LogLevel::Warn, "input channel full, dropping input")
                        .with_field("bytes", bytes.len() - accepted),
                );
                break;
            }
            accepted += chunk.len();
        }
        accepted
    }

    /// Delivers an already decoded event, bypassing the byte decoder
    pub fn event(&self, event: InputEvent) {
        dispatch(&self.terminal, &self.commands, &self.output, &self.logger, event);
    }

    /// Delivers an arrow key reported out-of-band by the host
    pub fn arrow(&self, key: ArrowKey) {
        self.event(InputEvent::Arrow(key));
    }

    pub fn snapshot(&self) -> ConsoleSnapshot {
        lock(&self.terminal).snapshot()
    }

    /// Runs `f` against the shell
    pub fn with_shell<R>(&self, f: impl FnOnce(&ShellEngine) -> R) -> R {
        f(&lock(&self.shell))
    }

    pub fn logger(&self) -> &Logger {
        &self.logger
    }
}

/// Feeds one event through the terminal and forwards a completed line
fn dispatch(
    terminal: &Mutex<Terminal>,
    commands: &StdioChannel,
    output: &StdioChannel,
    logger: &Logger,
    event: InputEvent,
) {
    let submit = {
        let mut out = OutputWriter::new(output, logger);
        let submit = lock(terminal).handle(event, &mut out);
        out.flush();
        submit
    };

    if let Some(line) = submit {
        if !commands.send(line.as_bytes()) {
            logger.warn("command channel full, dropping line");
        }
    }
}

fn run_line(
    shell: &Mutex<ShellEngine>,
    output: &StdioChannel,
    platform: &dyn Platform,
    logger: &Logger,
    line: &str,
) {
    let outcome = {
        let mut out = OutputWriter::new(output, logger);
        let outcome = lock(shell).handle_line(line, &mut out);
        out.flush();
        outcome
    };

    if outcome == Outcome::Exit {
        logger.info("shell exited");
        platform.exit(0);
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
