//! Log record handed to encoders

use crate::Level;
use chrono::{DateTime, Utc};
use std::borrow::Cow;

/// A log record - borrows its message where it can
#[derive(Debug, Clone)]
pub struct Record<'a> {
    /// Severity; selects the dispatch route
    pub level: Level,
    /// Message text, borrowed when possible
    pub message: Cow<'a, str>,
    /// Creation time (UTC)
    pub timestamp: DateTime<Utc>,
    /// Emitting module path
    pub target: &'static str,
    /// Source file, if captured
    pub file: Option<&'static str>,
    /// Source line, if captured
    pub line: Option<u32>,
}

impl<'a> Record<'a> {
    /// Create a new record stamped with the current time
    #[inline]
    pub fn new(level: Level, message: impl Into<Cow<'a, str>>) -> Self {
        Self {
            level,
            message: message.into(),
            timestamp: Utc::now(),
            target: module_path!(),
            file: None,
            line: None,
        }
    }

    /// Override the target
    #[inline]
    #[must_use]
    pub fn with_target(mut self, target: &'static str) -> Self {
        self.target = target;
        self
    }

    /// Attach the source location
    #[inline]
    #[must_use]
    pub fn with_location(mut self, file: &'static str, line: u32) -> Self {
        self.file = Some(file);
        self.line = Some(line);
        self
    }

    /// Replace the timestamp, e.g. when re-emitting a stored record
    #[inline]
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}
