//! Record encoding capability
//!
//! The dispatch table only needs something that turns a [`Record`] into
//! bytes. Formats live outside this crate; [`TextEncoder`] is the stock
//! line format.

use crate::{Record, Result};
use std::io::Write;

/// Turns a record into bytes appended to `buf`
pub trait Encoder: Send + Sync + 'static {
    /// Append the encoded form of `record` to `buf`
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Result<()>;
}

/// Plain single-line encoder: `LEVEL [target] file:line message`
#[derive(Debug, Clone, Copy, Default)]
pub struct TextEncoder {
    timestamps: bool,
}

impl TextEncoder {
    /// Create a text encoder without timestamps
    #[must_use]
    pub const fn new() -> Self {
        Self { timestamps: false }
    }

    /// Prefix every line with an RFC 3339 timestamp
    #[must_use]
    pub const fn with_timestamps(mut self) -> Self {
        self.timestamps = true;
        self
    }
}

impl Encoder for TextEncoder {
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Result<()> {
        let encode_err = |e: std::io::Error| crate::Error::Encode(e.to_string());

        if self.timestamps {
            write!(buf, "{} ", record.timestamp.to_rfc3339()).map_err(encode_err)?;
        }
        write!(buf, "{} [{}]", record.level, record.target).map_err(encode_err)?;
        if let (Some(file), Some(line)) = (record.file, record.line) {
            write!(buf, " {file}:{line}").map_err(encode_err)?;
        }
        writeln!(buf, " {}", record.message).map_err(encode_err)?;
        Ok(())
    }
}

impl<F> Encoder for F
where
    F: Fn(&Record<'_>, &mut Vec<u8>) -> Result<()> + Send + Sync + 'static,
{
    fn encode(&self, record: &Record<'_>, buf: &mut Vec<u8>) -> Result<()> {
        self(record, buf)
    }
}
