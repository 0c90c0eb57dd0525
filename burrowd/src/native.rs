//! # Native Host
//!
//! Runs the console as an OS process: stdin on its own thread, output on
//! stderr, a heartbeat on the main thread, and an optional file watcher.

use crate::config::{ConfigError, HostConfig};
use crate::keys::KeyReader;
use crate::script::{InputScript, ScriptError, ScriptStep};
use crate::watcher::{WatchHandle, Watcher};
use services_logger::{LogEntry, LogLevel, Logger};
use shell_console::{Platform, Runtime, Target};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;
use std::process;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};
use thiserror::Error;

/// Host runtime error types
#[derive(Debug, Error)]
pub enum HostRuntimeError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Script error: {0}")]
    Script(#[from] ScriptError),

    #[error("Failed to read script {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to start {name} thread: {source}")]
    Spawn {
        name: &'static str,
        #[source]
        source: io::Error,
    },
}

/// Terminal raw mode, restored on drop
#[cfg(unix)]
pub struct RawMode {
    original: libc::termios,
}

#[cfg(unix)]
impl RawMode {
    /// Switches stdin to raw input, keeping output post-processing
    pub fn enable() -> io::Result<Self> {
        let fd = libc::STDIN_FILENO;
        // SAFETY: isatty only inspects the descriptor.
        if unsafe { libc::isatty(fd) } != 1 {
            return Err(io::Error::new(io::ErrorKind::Other, "stdin is not a terminal"));
        }

        let mut original = std::mem::MaybeUninit::<libc::termios>::uninit();
        // SAFETY: tcgetattr fills the struct on success, checked below.
        if unsafe { libc::tcgetattr(fd, original.as_mut_ptr()) } != 0 {
            return Err(io::Error::last_os_error());
        }
        // SAFETY: initialized by the successful tcgetattr above.
        let original = unsafe { original.assume_init() };

        let mut raw = original;
        // SAFETY: cfmakeraw only edits the struct it is given.
        unsafe { libc::cfmakeraw(&mut raw) };
        raw.c_oflag |= libc::OPOST;
        // SAFETY: raw is a fully initialized termios.
        if unsafe { libc::tcsetattr(fd, libc::TCSANOW, &raw) } != 0 {
            return Err(io::Error::last_os_error());
        }
        Ok(Self { original })
    }

    fn restore(&self) {
        // SAFETY: original came from tcgetattr on the same descriptor.
        unsafe {
            libc::tcsetattr(libc::STDIN_FILENO, libc::TCSANOW, &self.original);
        }
    }
}

/// Terminal raw mode (unsupported on this platform)
#[cfg(not(unix))]
pub struct RawMode;

#[cfg(not(unix))]
impl RawMode {
    pub fn enable() -> io::Result<Self> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "raw mode is only available on unix",
        ))
    }

    fn restore(&self) {}
}

impl Drop for RawMode {
    fn drop(&mut self) {
        self.restore();
    }
}

/// Platform for an OS process: output on stderr, exit via the process
pub struct NativePlatform {
    raw: Mutex<Option<RawMode>>,
    logger: Logger,
}

impl NativePlatform {
    pub fn new(logger: Logger) -> Self {
        Self {
            raw: Mutex::new(None),
            logger,
        }
    }

    pub fn enable_raw_mode(&self) -> io::Result<()> {
        let mode = RawMode::enable()?;
        if let Ok(mut raw) = self.raw.lock() {
            *raw = Some(mode);
        }
        Ok(())
    }

    /// Puts the terminal back the way it was found
    pub fn restore_terminal(&self) {
        if let Ok(mut raw) = self.raw.lock() {
            raw.take();
        }
    }
}

impl Platform for NativePlatform {
    fn target(&self) -> Target {
        Target::Native
    }

    fn write_output(&self, bytes: &[u8]) {
        let mut stderr = io::stderr().lock();
        if let Err(err) = stderr.write_all(bytes).and_then(|()| stderr.flush()) {
            self.logger.emit(
                LogEntry::new(LogLevel::Error, "failed to write output").with_field("error", err),
            );
        }
    }

    fn exit(&self, code: i32) {
        self.restore_terminal();
        self.logger.emit(LogEntry::new(LogLevel::Info, "exiting").with_field("code", code));
        process::exit(code);
    }
}

/// The console plus the native input and timing loops
pub struct NativeHost {
    config: HostConfig,
    runtime: Arc<Runtime>,
    logger: Logger,
}

impl NativeHost {
    pub fn new(config: HostConfig, platform: Arc<dyn Platform>, logger: Logger) -> Self {
        let runtime = Arc::new(Runtime::new(platform, logger.child("console")));
        Self {
            config,
            runtime,
            logger,
        }
    }

    pub fn runtime(&self) -> &Arc<Runtime> {
        &self.runtime
    }

    pub fn config(&self) -> &HostConfig {
        &self.config
    }

    /// Loads the configured script, if any
    pub fn load_script(&self) -> Result<Option<InputScript>, HostRuntimeError> {
        let Some(path) = &self.config.script else {
            return Ok(None);
        };
        let text = fs::read_to_string(path).map_err(|source| HostRuntimeError::ScriptRead {
            path: path.clone(),
            source,
        })?;
        Ok(Some(InputScript::from_text(&text)?))
    }

    /// Replays a script, honoring its waits
    pub fn play_script(&self, script: &InputScript) {
        let mut reader = KeyReader::new();
        for step in script.steps() {
            match step {
                ScriptStep::Bytes(bytes) => reader.deliver(&self.runtime, bytes),
                ScriptStep::Wait(millis) => thread::sleep(Duration::from_millis(*millis)),
            }
        }
        self.logger.emit(
            LogEntry::new(LogLevel::Info, "script finished").with_field("steps", script.steps().len()),
        );
    }

    /// Starts the stdin reader thread
    pub fn spawn_stdin_reader(&self) -> Result<JoinHandle<()>, HostRuntimeError> {
        let runtime = Arc::clone(&self.runtime);
        let logger = self.logger.child("stdin");
        let poll = self.config.input_poll();
        thread::Builder::new()
            .name("burrow-stdin".to_string())
            .spawn(move || {
                let mut stdin = io::stdin().lock();
                let mut reader = KeyReader::new();
                let mut buf = [0u8; 64];
                loop {
                    match stdin.read(&mut buf) {
                        Ok(0) => {
                            logger.info("stdin closed");
                            break;
                        }
                        Ok(n) => reader.deliver(&runtime, &buf[..n]),
                        Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
                        Err(err) => {
                            logger.emit(
                                LogEntry::new(LogLevel::Error, "stdin read failed")
                                    .with_field("error", err),
                            );
                            break;
                        }
                    }
                    thread::sleep(poll);
                }
            })
            .map_err(|source| HostRuntimeError::Spawn {
                name: "stdin",
                source,
            })
    }

    /// Beats until `max_heartbeats` is reached or `done` returns true
    ///
    /// Returns the number of heartbeats emitted.
    pub fn heartbeat_loop(&self, done: impl Fn() -> bool) -> u64 {
        let mut beats = 0;
        loop {
            if done() || (self.config.max_heartbeats > 0 && beats >= self.config.max_heartbeats) {
                break;
            }
            let deadline = Instant::now() + self.config.heartbeat();
            while Instant::now() < deadline {
                if done() {
                    return beats;
                }
                thread::sleep(
                    self.config
                        .input_poll()
                        .min(deadline.saturating_duration_since(Instant::now())),
                );
            }
            beats += 1;
            self.logger
                .emit(LogEntry::new(LogLevel::Debug, "heartbeat").with_field("beats", beats));
        }
        beats
    }

    fn spawn_watcher(&self) -> Option<WatchHandle> {
        let path = self.config.watch_path.as_ref()?;
        let watcher = Watcher::new(path, self.config.watch_interval());
        match watcher.spawn(self.logger.child("watch")) {
            Ok(handle) => Some(handle),
            Err(err) => {
                self.logger.emit(
                    LogEntry::new(LogLevel::Warn, "failed to start watcher").with_field("error", err),
                );
                None
            }
        }
    }
}

/// Runs the native host until stdin closes, the heartbeat limit is reached,
/// or the shell exits the process
pub fn run(config: HostConfig) -> Result<(), HostRuntimeError> {
    let logger = Logger::new("burrowd");
    let platform = Arc::new(NativePlatform::new(logger.child("platform")));
    let host = NativeHost::new(config, platform.clone(), logger.clone());
    let script = host.load_script()?;
    let _watcher = host.spawn_watcher();

    logger.emit(
        LogEntry::new(LogLevel::Info, "starting")
            .with_field("heartbeat_ms", host.config().heartbeat_ms)
            .with_field("scripted", script.is_some()),
    );
    host.runtime().boot();

    match script {
        Some(script) => {
            host.play_script(&script);
            if host.config().max_heartbeats > 0 {
                host.heartbeat_loop(|| false);
            }
        }
        None => {
            if host.config().raw_mode {
                if let Err(err) = platform.enable_raw_mode() {
                    logger.emit(
                        LogEntry::new(LogLevel::Warn, "raw mode unavailable, using line input")
                            .with_field("error", err),
                    );
                }
            }
            let stdin = host.spawn_stdin_reader()?;
            host.heartbeat_loop(|| stdin.is_finished());
        }
    }

    platform.restore_terminal();
    logger.info("stopped");
    Ok(())
}
