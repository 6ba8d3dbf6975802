//! Console sinks for development

use super::Writer;
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stream {
    Stdout,
    Stderr,
}

/// Writes to the process stdout or stderr
///
/// Each `write` takes the stream's lock for the whole payload so records
/// from concurrent callers never interleave. `close` only flushes: the
/// process streams stay open.
#[derive(Debug, Clone, Copy)]
pub struct Console {
    stream: Stream,
}

impl Console {
    /// Console writer targeting stdout
    #[must_use]
    pub const fn stdout() -> Self {
        Self {
            stream: Stream::Stdout,
        }
    }

    /// Console writer targeting stderr
    #[must_use]
    pub const fn stderr() -> Self {
        Self {
            stream: Stream::Stderr,
        }
    }
}

impl Writer for Console {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        match self.stream {
            Stream::Stdout => io::stdout().lock().write_all(buf)?,
            Stream::Stderr => io::stderr().lock().write_all(buf)?,
        }
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        match self.stream {
            Stream::Stdout => io::stdout().flush(),
            Stream::Stderr => io::stderr().flush(),
        }
    }

    fn close(&self) -> io::Result<()> {
        self.flush()
    }
}
