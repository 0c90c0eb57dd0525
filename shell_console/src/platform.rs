//! Host platform abstraction
//!
//! The console never touches stdout, the process or storage directly. A
//! [`Platform`] is injected at construction and receives the side effects.

use core::fmt;

/// Which kind of host the console runs on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// OS process with a real terminal
    Native,
    /// Embedded in a host page that drives it by calls
    Hosted,
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Native => write!(f, "native"),
            Target::Hosted => write!(f, "web"),
        }
    }
}

/// Side effects the console asks of its host
pub trait Platform: Send + Sync {
    fn target(&self) -> Target;

    /// Writes terminal output bytes
    fn write_output(&self, bytes: &[u8]);

    /// Ends the process. Only called on [`Target::Native`].
    fn exit(&self, code: i32);

    /// Stores a filesystem image. Hosts without storage ignore it.
    fn persist(&self, image: &[u8]) {
        let _ = image;
    }
}
