//! Output engine for Proven logging
//!
//! This crate covers everything between an encoded record and the bytes on
//! disk or console:
//! - Composable writers: direct sinks, [`Buffer`] and [`Batch`] decorators
//! - Periodic background flushing with [`AutoSync`]
//! - Per-level encoder/writer routing with [`LevelDispatchTable`]
//! - A process-wide hook for failures that have no caller ([`report`])
//!
//! File rotation lives in `proven-logger-file`.

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod dispatch;
mod encoder;
mod error;
mod level;
mod logger;
mod record;
pub mod report;
mod sync;
pub mod writer;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use dispatch::{LevelDispatchTable, Route};
pub use encoder::{Encoder, TextEncoder};
pub use error::{Error, Result};
pub use level::{Level, ParseLevelError};
pub use logger::{DispatchLogger, Logger, LoggerExt, WRITE_OPERATION};
pub use record::Record;
pub use report::{ErrorHandler, ErrorSink, report_error, set_error_handler};
pub use sync::{AutoSync, AutoSyncWriter, SYNC_OPERATION};
pub use writer::{Batch, Buffer, Console, IoWriter, Writer};
