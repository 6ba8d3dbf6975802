//! Reporting of failures that have no caller to return to
//!
//! Background work (auto sync, backup pruning) cannot hand an error back to
//! anyone, so it goes to an [`ErrorHandler`]. One handler is installed
//! process-wide; components that want their own can be given one directly.

use arc_swap::ArcSwap;
use std::error::Error as StdError;
use std::sync::{Arc, LazyLock};
use tracing::error;

/// Receives `(operation, error)` pairs from background work
pub trait ErrorHandler: Send + Sync + 'static {
    /// Handle a failure of `operation`
    fn handle(&self, operation: &str, error: &(dyn StdError + 'static));
}

impl<F> ErrorHandler for F
where
    F: Fn(&str, &(dyn StdError + 'static)) + Send + Sync + 'static,
{
    fn handle(&self, operation: &str, error: &(dyn StdError + 'static)) {
        self(operation, error);
    }
}

/// Default handler: emits a `tracing` error event
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingErrorHandler;

impl ErrorHandler for TracingErrorHandler {
    fn handle(&self, operation: &str, error: &(dyn StdError + 'static)) {
        error!(operation, %error, "background log writer operation failed");
    }
}

/// Handler that ignores everything
#[derive(Clone, Copy, Debug, Default)]
pub struct IgnoreErrors;

impl ErrorHandler for IgnoreErrors {
    fn handle(&self, _operation: &str, _error: &(dyn StdError + 'static)) {}
}

static HANDLER: LazyLock<ArcSwap<Box<dyn ErrorHandler>>> =
    LazyLock::new(|| ArcSwap::from_pointee(Box::new(TracingErrorHandler)));

/// Replace the process-wide error handler
pub fn set_error_handler(handler: impl ErrorHandler) {
    HANDLER.store(Arc::new(Box::new(handler)));
}

/// Report a background failure to the process-wide handler
pub fn report_error(operation: &str, error: &(dyn StdError + 'static)) {
    HANDLER.load().handle(operation, error);
}

/// Where a component sends its background failures
#[derive(Clone, Default)]
pub enum ErrorSink {
    /// The process-wide handler
    #[default]
    Global,
    /// A handler owned by the component
    Local(Arc<dyn ErrorHandler>),
}

impl ErrorSink {
    /// Route to `handler` instead of the process-wide one
    pub fn local(handler: impl ErrorHandler) -> Self {
        Self::Local(Arc::new(handler))
    }

    /// Report `error` for `operation`
    pub fn report(&self, operation: &str, error: &(dyn StdError + 'static)) {
        match self {
            Self::Global => report_error(operation, error),
            Self::Local(handler) => handler.handle(operation, error),
        }
    }
}

impl std::fmt::Debug for ErrorSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Global => f.write_str("ErrorSink::Global"),
            Self::Local(_) => f.write_str("ErrorSink::Local(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parking_lot::Mutex;
    use std::io;
    use tracing_test::traced_test;

    #[test]
    fn test_local_sink_receives_operation() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let sink = ErrorSink::local(move |op: &str, err: &(dyn StdError + 'static)| {
            seen_clone.lock().push(format!("{op}: {err}"));
        });

        sink.report("writer.sync", &io::Error::other("disk gone"));

        assert_eq!(seen.lock().as_slice(), ["writer.sync: disk gone"]);
    }

    #[test]
    #[traced_test]
    fn test_tracing_handler_logs_event() {
        TracingErrorHandler.handle("rotate.prune", &io::Error::other("permission denied"));

        assert!(logs_contain("rotate.prune"));
        assert!(logs_contain("permission denied"));
    }

    #[test]
    #[traced_test]
    fn test_ignore_errors_stays_silent() {
        let sink = ErrorSink::local(IgnoreErrors);
        sink.report("writer.sync", &io::Error::other("nobody listens"));

        assert!(!logs_contain("nobody listens"));
    }
}
