//! Hot-reload file watcher
//!
//! Polls a path's modification time on a fixed interval and reports changes.

use services_logger::{LogEntry, LogLevel, Logger};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, SystemTime};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WatchEvent {
    Created,
    Modified,
    Removed,
}

/// Modification-time poller for one path
#[derive(Debug)]
pub struct Watcher {
    path: PathBuf,
    interval: Duration,
    last: Option<SystemTime>,
}

impl Watcher {
    /// Creates a watcher, taking the current state as the baseline
    pub fn new(path: impl Into<PathBuf>, interval: Duration) -> Self {
        let path = path.into();
        let last = modified(&path);
        Self {
            path,
            interval,
            last,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Compares the current modification time against the last poll
    pub fn poll(&mut self) -> Option<WatchEvent> {
        let now = modified(&self.path);
        let event = match (self.last, now) {
            (None, Some(_)) => Some(WatchEvent::Created),
            (Some(_), None) => Some(WatchEvent::Removed),
            (Some(before), Some(after)) if before != after => Some(WatchEvent::Modified),
            _ => None,
        };
        self.last = now;
        event
    }

    /// Polls on a background thread, logging every change
    pub fn spawn(mut self, logger: Logger) -> io::Result<WatchHandle> {
        let stop = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&stop);
        let handle = thread::Builder::new()
            .name("burrow-watch".to_string())
            .spawn(move || {
                logger.emit(
                    LogEntry::new(LogLevel::Info, "watching for changes")
                        .with_field("path", self.path.display()),
                );
                while !flag.load(Ordering::Acquire) {
                    if let Some(event) = self.poll() {
                        logger.emit(
                            LogEntry::new(LogLevel::Info, "watched path changed")
                                .with_field("path", self.path.display())
                                .with_field("event", format!("{:?}", event)),
                        );
                    }
                    thread::sleep(self.interval);
                }
            })?;
        Ok(WatchHandle {
            stop,
            handle: Some(handle),
        })
    }
}

fn modified(path: &Path) -> Option<SystemTime> {
    fs::metadata(path).and_then(|meta| meta.modified()).ok()
}

/// Running watcher thread; stopped and joined on drop
pub struct WatchHandle {
    stop: Arc<AtomicBool>,
    handle: Option<JoinHandle<()>>,
}

impl WatchHandle {
    pub fn stop(mut self) {
        self.shutdown();
    }

    fn shutdown(&mut self) {
        self.stop.store(true, Ordering::Release);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for WatchHandle {
    fn drop(&mut self) {
        self.shutdown();
    }
}
