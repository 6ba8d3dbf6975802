//! Count-based flush batching

use super::Writer;
use parking_lot::Mutex;
use std::io;

/// Default number of writes between forced flushes
pub const DEFAULT_BATCH_SIZE: usize = 64;

/// Forwards every write immediately but only flushes the inner writer
/// once every `threshold` writes
///
/// Trades a little durability for throughput when the inner `flush` is
/// expensive (an fsync, or draining a [`Buffer`](super::Buffer)).
#[derive(Debug)]
pub struct Batch<W> {
    inner: W,
    threshold: usize,
    count: Mutex<usize>,
}

impl<W: Writer> Batch<W> {
    /// Wrap `inner`, flushing every `threshold` writes (at least 1)
    pub fn new(inner: W, threshold: usize) -> Self {
        Self {
            inner,
            threshold: threshold.max(1),
            count: Mutex::new(0),
        }
    }

    /// Writes since the last flush
    pub fn pending(&self) -> usize {
        *self.count.lock()
    }

    /// The wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Writer> Writer for Batch<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut count = self.count.lock();
        let n = self.inner.write(buf)?;

        *count += 1;
        if *count >= self.threshold {
            self.inner.flush()?;
            *count = 0;
        }

        Ok(n)
    }

    fn flush(&self) -> io::Result<()> {
        let mut count = self.count.lock();
        *count = 0;
        self.inner.flush()
    }

    fn close(&self) -> io::Result<()> {
        let mut count = self.count.lock();
        *count = 0;
        self.inner.close()
    }
}
