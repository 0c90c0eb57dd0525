//! Buffered writer onto an output channel

use crate::runtime::StdioChannel;
use core::fmt;
use ipc::MessageSlot;
use services_logger::{LogEntry, LogLevel, Logger};

/// Packs formatted output into channel-sized messages
///
/// Bytes accumulate in one message slot and are sent whenever it fills, on
/// [`OutputWriter::flush`], and on drop. When the channel is full the
/// message is dropped and a warning is logged; output never blocks.
pub struct OutputWriter<'a> {
    channel: &'a StdioChannel,
    logger: &'a Logger,
    pending: MessageSlot,
    dropped: usize,
}

impl<'a> OutputWriter<'a> {
    pub fn new(channel: &'a StdioChannel, logger: &'a Logger) -> Self {
        Self {
            channel,
            logger,
            pending: MessageSlot::empty(),
            dropped: 0,
        }
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        let mut rest = bytes;
        while !rest.is_empty() {
            let taken = self.pending.push_bytes(rest);
            rest = &rest[taken..];
            if self.pending.remaining() == 0 {
                self.flush();
            }
        }
    }

    /// Sends whatever is buffered
    pub fn flush(&mut self) {
        if self.pending.is_empty() {
            return;
        }
        if !self.channel.send(self.pending.as_bytes()) {
            self.dropped += self.pending.len();
            self.logger.emit(
                LogEntry::new(LogLevel::Warn, "output channel full, dropping message")
                    .with_field("bytes", self.pending.len()),
            );
        }
        self.pending.clear();
    }

    /// Bytes lost to a full channel so far
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl fmt::Write for OutputWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.write_bytes(s.as_bytes());
        Ok(())
    }
}

impl Drop for OutputWriter<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::fmt::Write;
    use ipc::MESSAGE_CAPACITY;
    use services_logger::MemorySink;
    use std::sync::Arc;

    #[test]
    fn test_small_writes_coalesce() {
        let channel = StdioChannel::new();
        let logger = Logger::new("test");
        {
            let mut out = OutputWriter::new(&channel, &logger);
            write!(out, "ab").unwrap();
            write!(out, "cd").unwrap();
            assert!(channel.is_empty());
        }
        let message = channel.recv().unwrap();
        assert_eq!(message.as_bytes(), b"abcd");
        assert!(channel.is_empty());
    }

    #[test]
    fn test_long_output_is_chunked() {
        let channel = StdioChannel::new();
        let logger = Logger::new("test");
        let text = "x".repeat(MESSAGE_CAPACITY * 2 + 10);
        {
            let mut out = OutputWriter::new(&channel, &logger);
            out.write_str(&text).unwrap();
        }
        assert_eq!(channel.len(), 3);
        assert_eq!(channel.recv().unwrap().len(), MESSAGE_CAPACITY);
        assert_eq!(channel.recv().unwrap().len(), MESSAGE_CAPACITY);
        assert_eq!(channel.recv().unwrap().len(), 10);
    }

    #[test]
    fn test_full_channel_drops_and_logs() {
        let channel = StdioChannel::new();
        for _ in 0..channel.capacity() - 1 {
            assert!(channel.send(b"fill"));
        }
        let sink = Arc::new(MemorySink::new());
        let logger = Logger::with_sink("test", sink.clone());
        let mut out = OutputWriter::new(&channel, &logger);
        out.write_bytes(b"lost");
        out.flush();
        assert_eq!(out.dropped(), 4);
        let warnings = sink.find("output channel full, dropping message");
        assert_eq!(warnings.len(), 1);
        assert_eq!(warnings[0].field("bytes"), Some("4"));
    }
}
