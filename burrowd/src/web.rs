//! # Hosted Bridge
//!
//! Runs the console inside a page. There are no threads: the host calls the
//! exported entry points and every hook completes before the call returns.
//! The filesystem image is kept in host storage under [`STORAGE_KEY`].

use input_types::ArrowKey;
use services_logger::{LogEntry, LogLevel, Logger};
use shell_console::{Platform, Runtime, Target};
use std::sync::Arc;

/// Storage key of the persisted filesystem image
pub const STORAGE_KEY: &str = "burrow.fs";

/// What the embedding page provides
pub trait HostBridge: Send + Sync {
    /// Writes ANSI output to the terminal widget
    fn write(&self, bytes: &[u8]);

    fn load(&self, key: &str) -> Option<Vec<u8>>;

    fn store(&self, key: &str, bytes: &[u8]);
}

struct HostedPlatform {
    bridge: Arc<dyn HostBridge>,
    logger: Logger,
}

impl Platform for HostedPlatform {
    fn target(&self) -> Target {
        Target::Hosted
    }

    fn write_output(&self, bytes: &[u8]) {
        self.bridge.write(bytes);
    }

    fn exit(&self, code: i32) {
        self.logger.emit(
            LogEntry::new(LogLevel::Warn, "process exit is not possible when hosted")
                .with_field("code", code),
        );
    }

    fn persist(&self, image: &[u8]) {
        self.bridge.store(STORAGE_KEY, image);
    }
}

/// A console wired to a [`HostBridge`]
pub struct WebRuntime {
    runtime: Runtime,
    logger: Logger,
}

impl WebRuntime {
    /// Builds the console, restores any stored filesystem and greets
    ///
    /// A stored image that fails to decode is logged and ignored.
    pub fn start(bridge: Arc<dyn HostBridge>, logger: Logger) -> Self {
        let platform = Arc::new(HostedPlatform {
            bridge: Arc::clone(&bridge),
            logger: logger.child("platform"),
        });
        let runtime = Runtime::new(platform, logger.child("console"));

        if let Some(image) = bridge.load(STORAGE_KEY) {
            match runtime.restore(&image) {
                Ok(()) => logger.info("restored stored filesystem"),
                Err(err) => logger.emit(
                    LogEntry::new(LogLevel::Warn, "ignoring stored filesystem image")
                        .with_field("error", err),
                ),
            }
        }

        runtime.boot();
        Self { runtime, logger }
    }

    /// Delivers a key byte
    pub fn key(&self, byte: u8) -> bool {
        self.runtime.key(byte)
    }

    /// Delivers an arrow key by its CSI final byte (`A`..`D`)
    pub fn arrow(&self, code: u8) -> bool {
        match ArrowKey::from_code(code) {
            Some(key) => {
                self.runtime.arrow(key);
                true
            }
            None => {
                self.logger.emit(
                    LogEntry::new(LogLevel::Debug, "unknown arrow code").with_field("code", code),
                );
                false
            }
        }
    }

    pub fn runtime(&self) -> &Runtime {
        &self.runtime
    }
}

#[cfg(target_arch = "wasm32")]
mod exports {
    use super::{HostBridge, WebRuntime};
    use fs_tree::IMAGE_SIZE;
    use services_logger::Logger;
    use std::cell::RefCell;
    use std::sync::Arc;

    extern "C" {
        fn burrow_host_write(ptr: *const u8, len: usize);
        fn burrow_host_store(key_ptr: *const u8, key_len: usize, ptr: *const u8, len: usize);
        fn burrow_host_load(key_ptr: *const u8, key_len: usize, buf: *mut u8, cap: usize) -> isize;
    }

    struct ImportedBridge;

    impl HostBridge for ImportedBridge {
        fn write(&self, bytes: &[u8]) {
            // SAFETY: the host only reads `len` bytes from `ptr` during the call.
            unsafe { burrow_host_write(bytes.as_ptr(), bytes.len()) }
        }

        fn load(&self, key: &str) -> Option<Vec<u8>> {
            let mut buf = vec![0u8; IMAGE_SIZE];
            // SAFETY: the host writes at most `cap` bytes into `buf`.
            let len = unsafe { burrow_host_load(key.as_ptr(), key.len(), buf.as_mut_ptr(), buf.len()) };
            let len = usize::try_from(len).ok()?;
            buf.truncate(len.min(IMAGE_SIZE));
            Some(buf)
        }

        fn store(&self, key: &str, bytes: &[u8]) {
            // SAFETY: both slices stay valid for the duration of the call.
            unsafe { burrow_host_store(key.as_ptr(), key.len(), bytes.as_ptr(), bytes.len()) }
        }
    }

    thread_local! {
        static CONSOLE: RefCell<Option<WebRuntime>> = const { RefCell::new(None) };
    }

    /// Starts the console; later calls are no-ops
    #[no_mangle]
    pub extern "C" fn burrow_init() {
        CONSOLE.with(|console| {
            let mut console = console.borrow_mut();
            if console.is_none() {
                *console = Some(WebRuntime::start(Arc::new(ImportedBridge), Logger::new("burrow")));
            }
        });
    }

    #[no_mangle]
    pub extern "C" fn burrow_key(byte: u8) -> u8 {
        CONSOLE.with(|console| match console.borrow().as_ref() {
            Some(console) => u8::from(console.key(byte)),
            None => 0,
        })
    }

    #[no_mangle]
    pub extern "C" fn burrow_arrow(code: u8) -> u8 {
        CONSOLE.with(|console| match console.borrow().as_ref() {
            Some(console) => u8::from(console.arrow(code)),
            None => 0,
        })
    }
}
