//! Writers: the byte-accepting end of the pipeline
//!
//! Every writer exposes `write`, `flush` and `close`, so a chain can be
//! assembled from trait objects without probing what a sink supports:
//!
//! ```text
//! [Batch] -> [Buffer] -> [RotatingFile | Console | IoWriter]
//! ```
//!
//! Methods take `&self`; each implementation serializes its own state behind
//! a mutex, which also totally orders the bytes it forwards.

mod batch;
mod buffer;
mod console;

pub use batch::{Batch, DEFAULT_BATCH_SIZE};
pub use buffer::{Buffer, DEFAULT_BUFFER_SIZE};
pub use console::Console;

use parking_lot::Mutex;
use std::io;
use std::sync::Arc;

/// Byte sink with explicit durability points
pub trait Writer: Send + Sync + 'static {
    /// Accept the whole of `buf` or fail. Returns `buf.len()` on success.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;

    /// Push everything accepted so far towards durable storage.
    ///
    /// Must be cheap and harmless to call repeatedly.
    fn flush(&self) -> io::Result<()>;

    /// Flush and release the underlying resource.
    fn close(&self) -> io::Result<()>;
}

impl<W: Writer + ?Sized> Writer for Arc<W> {
    #[inline]
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    #[inline]
    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }

    #[inline]
    fn close(&self) -> io::Result<()> {
        (**self).close()
    }
}

impl<W: Writer + ?Sized> Writer for Box<W> {
    #[inline]
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        (**self).write(buf)
    }

    #[inline]
    fn flush(&self) -> io::Result<()> {
        (**self).flush()
    }

    #[inline]
    fn close(&self) -> io::Result<()> {
        (**self).close()
    }
}

pub(crate) fn closed_error() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "writer is closed")
}

/// Adapts any [`io::Write`] into a [`Writer`]
///
/// The wrapped value is dropped on `close`; later writes fail.
#[derive(Debug)]
pub struct IoWriter<W> {
    inner: Mutex<Option<W>>,
}

impl<W: io::Write + Send + 'static> IoWriter<W> {
    /// Wrap `inner`
    pub fn new(inner: W) -> Self {
        Self {
            inner: Mutex::new(Some(inner)),
        }
    }
}

impl<W: io::Write + Send + 'static> Writer for IoWriter<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.inner.lock();
        let inner = guard.as_mut().ok_or_else(closed_error)?;
        inner.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        match self.inner.lock().as_mut() {
            Some(inner) => inner.flush(),
            None => Ok(()),
        }
    }

    fn close(&self) -> io::Result<()> {
        let mut guard = self.inner.lock();
        match guard.take() {
            Some(mut inner) => inner.flush(),
            None => Ok(()),
        }
    }
}
