//! Periodic background flushing
//!
//! Buffered and batched writers only reach the sink when they fill up or
//! are flushed. [`AutoSync`] bounds how stale that data can get by flushing
//! on a fixed interval from a Tokio task. Start exactly one per chain, on
//! the outermost writer.

use crate::report::ErrorSink;
use crate::{Error, Result, Writer};
use std::io;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at};
use tokio_util::sync::CancellationToken;
use tracing::debug;

/// Operation name reported when a periodic flush fails
pub const SYNC_OPERATION: &str = "writer.sync";

/// Handle to a running periodic flush task
///
/// The task stops when [`stop`](Self::stop) is called or the handle is
/// dropped.
#[derive(Debug)]
pub struct AutoSync {
    token: CancellationToken,
    handle: Option<JoinHandle<()>>,
}

impl AutoSync {
    /// Flush `writer` every `interval`, reporting failures process-wide
    ///
    /// Must be called from within a Tokio runtime.
    pub fn start(writer: Arc<dyn Writer>, interval: Duration) -> Result<Self> {
        Self::start_with(writer, interval, ErrorSink::Global)
    }

    /// Like [`start`](Self::start) but failures go to `errors`
    pub fn start_with(
        writer: Arc<dyn Writer>,
        interval: Duration,
        errors: ErrorSink,
    ) -> Result<Self> {
        if interval.is_zero() {
            return Err(Error::Configuration(
                "auto sync interval must be non-zero".to_string(),
            ));
        }

        let runtime = tokio::runtime::Handle::try_current().map_err(|_| Error::NoRuntime)?;
        let token = CancellationToken::new();
        let handle = runtime.spawn(Self::sync_loop(writer, interval, errors, token.clone()));

        Ok(Self {
            token,
            handle: Some(handle),
        })
    }

    async fn sync_loop(
        writer: Arc<dyn Writer>,
        period: Duration,
        errors: ErrorSink,
        token: CancellationToken,
    ) {
        let mut ticker = interval_at(Instant::now() + period, period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                () = token.cancelled() => break,
                _ = ticker.tick() => {
                    if let Err(e) = writer.flush() {
                        errors.report(SYNC_OPERATION, &e);
                    }
                }
            }
        }

        debug!("auto sync stopped");
    }

    /// Signal the task to stop without waiting for it
    pub fn stop(&self) {
        self.token.cancel();
    }

    /// Whether the task has been told to stop
    pub fn is_stopped(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Stop the task and wait for it to finish
    pub async fn shutdown(mut self) {
        self.token.cancel();
        if let Some(handle) = self.handle.take() {
            let _ = handle.await;
        }
    }
}

impl Drop for AutoSync {
    fn drop(&mut self) {
        self.token.cancel();
    }
}

/// A writer chain together with the task that keeps it flushed
///
/// Closing or dropping it stops the task, so the task never outlives the
/// chain it serves.
#[derive(Debug)]
pub struct AutoSyncWriter<W> {
    inner: Arc<W>,
    sync: AutoSync,
}

impl<W: Writer> AutoSyncWriter<W> {
    /// Wrap `inner` and start flushing it every `interval`
    pub fn new(inner: W, interval: Duration) -> Result<Self> {
        Self::with_errors(inner, interval, ErrorSink::Global)
    }

    /// Like [`new`](Self::new) but failures go to `errors`
    pub fn with_errors(inner: W, interval: Duration, errors: ErrorSink) -> Result<Self> {
        let inner = Arc::new(inner);
        let sync = AutoSync::start_with(inner.clone(), interval, errors)?;
        Ok(Self { inner, sync })
    }

    /// The wrapped writer
    pub fn get_ref(&self) -> &W {
        &self.inner
    }
}

impl<W: Writer> Writer for AutoSyncWriter<W> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&self) -> io::Result<()> {
        self.inner.flush()
    }

    fn close(&self) -> io::Result<()> {
        self.sync.stop();
        self.inner.close()
    }
}
