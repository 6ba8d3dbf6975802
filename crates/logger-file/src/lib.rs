//! File output for `proven-logger`
//!
//! This crate provides:
//! - [`RotatingFile`], a [`Writer`](proven_logger::Writer) that rotates by
//!   size and prunes old backups by age and count
//! - [`Config`], a serde-friendly description of a complete writer chain
//! - Parsers for human-readable sizes and durations

#![warn(missing_docs, unreachable_pub)]
#![forbid(unsafe_code)]

mod clock;
mod config;
mod error;
mod names;
mod rotate;
mod units;

pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{Config, FileConfig, Mode, Target, WriterConfig};
pub use error::{Error, Result};
pub use names::{Backup, BackupNames};
pub use rotate::{
    DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_MAX_AGE, DEFAULT_MAX_BACKUPS, DEFAULT_MAX_SIZE,
    FileOptions, PRUNE_OPERATION, RotatingFile,
};
pub use units::{parse_byte_size, parse_duration};
