//! Test support utilities
//!
//! In-memory writers for exercising pipelines without touching the
//! filesystem. Only available with the `test-support` feature.

use crate::Writer;
use crate::writer::closed_error;
use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

#[derive(Debug, Default)]
struct State {
    bytes: Vec<u8>,
    writes: usize,
    flushes: usize,
    closes: usize,
    closed: bool,
    fail_writes: bool,
    fail_flushes: bool,
}

/// A writer that captures everything in memory and counts calls
///
/// Clones share the same storage, so a test can keep one handle while the
/// pipeline owns another.
#[derive(Clone, Debug, Default)]
pub struct MemoryWriter {
    state: Arc<Mutex<State>>,
}

impl MemoryWriter {
    /// Create an empty memory writer
    pub fn new() -> Self {
        Self::default()
    }

    /// Everything written so far
    pub fn contents(&self) -> Vec<u8> {
        self.state.lock().bytes.clone()
    }

    /// Captured bytes as UTF-8 (lossy)
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.state.lock().bytes).into_owned()
    }

    /// Number of successful `write` calls
    pub fn write_count(&self) -> usize {
        self.state.lock().writes
    }

    /// Number of successful `flush` calls
    pub fn flush_count(&self) -> usize {
        self.state.lock().flushes
    }

    /// Number of `close` calls
    pub fn close_count(&self) -> usize {
        self.state.lock().closes
    }

    /// Make subsequent writes fail
    pub fn set_fail_writes(&self, fail: bool) {
        self.state.lock().fail_writes = fail;
    }

    /// Make subsequent flushes fail
    pub fn set_fail_flushes(&self, fail: bool) {
        self.state.lock().fail_flushes = fail;
    }
}

impl Writer for MemoryWriter {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.state.lock();
        if state.closed {
            return Err(closed_error());
        }
        if state.fail_writes {
            return Err(io::Error::other("injected write failure"));
        }
        state.bytes.extend_from_slice(buf);
        state.writes += 1;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        if state.fail_flushes {
            return Err(io::Error::other("injected flush failure"));
        }
        state.flushes += 1;
        Ok(())
    }

    fn close(&self) -> io::Result<()> {
        let mut state = self.state.lock();
        state.closes += 1;
        state.closed = true;
        Ok(())
    }
}

/// A writer whose every operation fails with the given kind
#[derive(Clone, Copy, Debug)]
pub struct FailingWriter(pub io::ErrorKind);

impl Writer for FailingWriter {
    fn write(&self, _buf: &[u8]) -> io::Result<usize> {
        Err(io::Error::new(self.0, "write failed"))
    }

    fn flush(&self) -> io::Result<()> {
        Err(io::Error::new(self.0, "flush failed"))
    }

    fn close(&self) -> io::Result<()> {
        Err(io::Error::new(self.0, "close failed"))
    }
}
