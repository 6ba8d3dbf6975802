//! Fixed-capacity byte buffering in front of another writer

use super::Writer;
use parking_lot::Mutex;
use std::io;

/// Default buffer capacity (16KB)
pub const DEFAULT_BUFFER_SIZE: usize = 16 * 1024;

/// Accumulates writes in memory and forwards them in large chunks
///
/// The buffer is written out when the next payload would not fit, or on
/// `flush`/`close`. A payload bigger than the whole capacity bypasses the
/// buffer (after whatever was pending) so it never has to be split.
///
/// If forwarding the buffered bytes fails they stay buffered and the error
/// is returned; nothing is dropped silently.
#[derive(Debug)]
pub struct Buffer<W> {
    inner: W,
    capacity: usize,
    buf: Mutex<Vec<u8>>,
}

impl<W: Writer> Buffer<W> {
    /// Wrap `inner` with a buffer of `capacity` bytes
    pub fn new(inner: W, capacity: usize) -> Self {
        Self {
            inner,
            capacity,
            buf: Mutex::new(Vec::with_capacity(capacity)),
        }
    }

    /// Configured capacity in bytes
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Bytes currently held
    pub fn buffered(&self) -> usize {
        self.buf.lock().len()
    }

    /// The wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    fn drain(&self, buf: &mut Vec<u8>) -> io::Result<()> {
        if buf.is_empty() {
            return Ok(());
        }
        self.inner.write(buf)?;
        buf.clear();
        Ok(())
    }
}

impl<W: Writer> Writer for Buffer<W> {
    fn write(&self, data: &[u8]) -> io::Result<usize> {
        let mut buf = self.buf.lock();

        if buf.len() + data.len() > self.capacity {
            self.drain(&mut buf)?;
        }

        if data.len() > self.capacity {
            return self.inner.write(data);
        }

        buf.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&self) -> io::Result<()> {
        let mut buf = self.buf.lock();
        self.drain(&mut buf)?;
        self.inner.flush()
    }

    fn close(&self) -> io::Result<()> {
        let mut buf = self.buf.lock();
        // Release the inner writer even when the last drain fails
        let drained = self.drain(&mut buf);
        let closed = self.inner.close();
        drained.and(closed)
    }
}
