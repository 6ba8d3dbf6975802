//! Logger trait and the dispatching implementation

use crate::report::ErrorSink;
use crate::{Level, LevelDispatchTable, Record};
use std::borrow::Cow;
use std::cell::RefCell;
use std::io;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};

/// Operation name reported when `Logger::log` cannot write a record
pub const WRITE_OPERATION: &str = "logger.write";

/// Core logger trait
pub trait Logger: Send + Sync + 'static {
    /// Log a record
    fn log(&self, record: Record<'_>);

    /// Flush any buffered logs
    fn flush(&self);

    /// Check if a level is enabled (for fast filtering)
    fn is_enabled(&self, level: Level) -> bool;
}

/// Extension trait for convenient logging methods
pub trait LoggerExt: Logger {
    /// Log an error
    #[inline]
    fn error(&self, msg: impl Into<Cow<'static, str>>) {
        if self.is_enabled(Level::Error) {
            self.log(Record::new(Level::Error, msg));
        }
    }

    /// Log a warning
    #[inline]
    fn warn(&self, msg: impl Into<Cow<'static, str>>) {
        if self.is_enabled(Level::Warn) {
            self.log(Record::new(Level::Warn, msg));
        }
    }

    /// Log info
    #[inline]
    fn info(&self, msg: impl Into<Cow<'static, str>>) {
        if self.is_enabled(Level::Info) {
            self.log(Record::new(Level::Info, msg));
        }
    }

    /// Log debug
    #[inline]
    fn debug(&self, msg: impl Into<Cow<'static, str>>) {
        if self.is_enabled(Level::Debug) {
            self.log(Record::new(Level::Debug, msg));
        }
    }

    /// Log trace
    #[inline]
    fn trace(&self, msg: impl Into<Cow<'static, str>>) {
        if self.is_enabled(Level::Trace) {
            self.log(Record::new(Level::Trace, msg));
        }
    }
}

impl<T: Logger + ?Sized> LoggerExt for T {}

thread_local! {
    static SCRATCH: RefCell<Vec<u8>> = RefCell::new(Vec::with_capacity(512));
}

/// Logger that resolves each record's encoder and writer from a
/// [`LevelDispatchTable`]
#[derive(Debug)]
pub struct DispatchLogger {
    table: Arc<LevelDispatchTable>,
    min_level: AtomicU8,
    errors: ErrorSink,
}

impl DispatchLogger {
    /// Create a logger over `table` that accepts every level
    pub fn new(table: Arc<LevelDispatchTable>) -> Self {
        Self {
            table,
            min_level: AtomicU8::new(Level::Trace as u8),
            errors: ErrorSink::Global,
        }
    }

    /// Set the minimum level
    #[must_use]
    pub fn with_level(self, level: Level) -> Self {
        self.set_level(level);
        self
    }

    /// Send `log` failures to `errors` instead of the process-wide handler
    #[must_use]
    pub fn with_errors(mut self, errors: ErrorSink) -> Self {
        self.errors = errors;
        self
    }

    /// Change the minimum level
    pub fn set_level(&self, level: Level) {
        self.min_level.store(level as u8, Ordering::Relaxed);
    }

    /// Current minimum level
    pub fn level(&self) -> Level {
        let raw = self.min_level.load(Ordering::Relaxed);
        Level::ALL
            .into_iter()
            .find(|l| *l as u8 == raw)
            .unwrap_or(Level::MOST_SEVERE)
    }

    /// The table this logger dispatches through
    pub fn table(&self) -> &Arc<LevelDispatchTable> {
        &self.table
    }

    /// Encode and write `record`, returning the writer's result
    ///
    /// Records below the minimum level are skipped and report 0 bytes.
    pub fn emit(&self, record: &Record<'_>) -> io::Result<usize> {
        if !self.is_enabled(record.level) {
            return Ok(0);
        }

        let route = self.table.of(record.level);
        let encode_and_write = |buf: &mut Vec<u8>| -> io::Result<usize> {
            buf.clear();
            route
                .encoder
                .encode(record, buf)
                .map_err(io::Error::other)?;
            route.writer.write(buf)
        };

        SCRATCH.with(|scratch| match scratch.try_borrow_mut() {
            Ok(mut buf) => encode_and_write(&mut *buf),
            // Re-entered from inside an encoder or writer
            Err(_) => encode_and_write(&mut Vec::new()),
        })
    }

    /// Flush every writer in the table
    pub fn sync(&self) -> io::Result<()> {
        self.table.sync()
    }

    /// Close every writer in the table
    pub fn close(&self) -> io::Result<()> {
        self.table.close()
    }
}

impl Logger for DispatchLogger {
    fn log(&self, record: Record<'_>) {
        if let Err(e) = self.emit(&record) {
            self.errors.report(WRITE_OPERATION, &e);
        }
    }

    fn flush(&self) {
        if let Err(e) = self.table.sync() {
            self.errors.report(crate::sync::SYNC_OPERATION, &e);
        }
    }

    #[inline]
    fn is_enabled(&self, level: Level) -> bool {
        level as u8 >= self.min_level.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::TextEncoder;
    use crate::test_support::{FailingWriter, MemoryWriter};
    use parking_lot::Mutex;

    fn logger_with(writer: MemoryWriter) -> DispatchLogger {
        let table = LevelDispatchTable::new(Arc::new(TextEncoder::new()), Arc::new(writer));
        DispatchLogger::new(Arc::new(table))
    }

    #[test]
    fn test_emit_encodes_and_writes() {
        let sink = MemoryWriter::new();
        let logger = logger_with(sink.clone());

        let record = Record::new(Level::Info, "started").with_target("app");
        let n = logger.emit(&record).unwrap();

        assert_eq!(sink.text(), "INFO [app] started\n");
        assert_eq!(n, sink.contents().len());
    }

    #[test]
    fn test_level_gate() {
        let sink = MemoryWriter::new();
        let logger = logger_with(sink.clone()).with_level(Level::Warn);

        logger.info("hidden");
        logger.warn("shown");

        assert_eq!(logger.level(), Level::Warn);
        assert!(!sink.text().contains("hidden"));
        assert!(sink.text().contains("shown"));
    }

    #[test]
    fn test_per_level_writers() {
        let general = MemoryWriter::new();
        let errors = MemoryWriter::new();
        let logger = logger_with(general.clone());
        logger.table().set_writer(Level::Error, Arc::new(errors.clone()));

        logger.info("fine");
        logger.error("broken");

        assert!(general.text().contains("fine"));
        assert!(!general.text().contains("broken"));
        assert!(errors.text().contains("broken"));
    }

    #[test]
    fn test_log_failure_goes_to_error_sink() {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let seen_clone = seen.clone();
        let table = LevelDispatchTable::new(
            Arc::new(TextEncoder::new()),
            Arc::new(FailingWriter(io::ErrorKind::StorageFull)),
        );
        let logger = DispatchLogger::new(Arc::new(table)).with_errors(ErrorSink::local(
            move |op: &str, _err: &(dyn std::error::Error + 'static)| {
                seen_clone.lock().push(op.to_string());
            },
        ));

        logger.info("lost");
        logger.flush();

        assert_eq!(seen.lock().as_slice(), [WRITE_OPERATION, "writer.sync"]);
    }

    #[test]
    fn test_emit_returns_write_error() {
        let table = LevelDispatchTable::new(
            Arc::new(TextEncoder::new()),
            Arc::new(FailingWriter(io::ErrorKind::PermissionDenied)),
        );
        let logger = DispatchLogger::new(Arc::new(table));

        let err = logger.emit(&Record::new(Level::Error, "x")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);
    }
}
