//! Declarative writer configuration
//!
//! Mirrors what an application puts in its config file:
//!
//! ```json
//! {
//!   "level": "info",
//!   "writer": { "target": "file", "mode": "buffer", "buffer_size": "64KB", "auto_sync": "10s" },
//!   "file": { "path": "/var/log/app/app.log", "rotate": true, "max_size": "100MB", "max_age": "7d" }
//! }
//! ```
//!
//! Every string is validated before any file is touched.

use crate::error::{Error, Result};
use crate::rotate::{
    DEFAULT_DIR_MODE, DEFAULT_FILE_MODE, DEFAULT_MAX_BACKUPS, FileOptions, RotatingFile,
};
use crate::units::{parse_byte_size, parse_duration};
use proven_logger::writer::{DEFAULT_BATCH_SIZE, DEFAULT_BUFFER_SIZE};
use proven_logger::{
    AutoSyncWriter, Batch, Buffer, Console, DispatchLogger, Encoder, Level, LevelDispatchTable,
    Writer,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// Where records end up
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Target {
    /// Process stdout
    #[default]
    Stdout,
    /// Process stderr
    Stderr,
    /// The file described by [`FileConfig`]
    File,
}

impl FromStr for Target {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "stdout" => Ok(Self::Stdout),
            "stderr" => Ok(Self::Stderr),
            "file" => Ok(Self::File),
            _ => Err(Error::InvalidTarget(s.to_string())),
        }
    }
}

/// How writes reach the target
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    /// Every write goes straight to the target
    #[default]
    Direct,
    /// Writes accumulate in a fixed-size buffer
    Buffer,
    /// The target is flushed every `batch_size` writes
    Batch,
}

impl FromStr for Mode {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "buffer" => Ok(Self::Buffer),
            "batch" => Ok(Self::Batch),
            _ => Err(Error::InvalidMode(s.to_string())),
        }
    }
}

/// Writer chain settings
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WriterConfig {
    /// Destination
    pub target: Target,
    /// Delivery mode
    pub mode: Mode,
    /// Buffer capacity, e.g. `"16KB"`; buffer mode only
    pub buffer_size: String,
    /// Writes between flushes; batch mode only
    pub batch_size: usize,
    /// Flush interval, e.g. `"30s"`; empty disables. Buffer and batch modes only
    pub auto_sync: String,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            target: Target::Stdout,
            mode: Mode::Direct,
            buffer_size: format!("{}KB", DEFAULT_BUFFER_SIZE / 1024),
            batch_size: DEFAULT_BATCH_SIZE,
            auto_sync: "30s".to_string(),
        }
    }
}

/// Log file settings; used when the target is [`Target::File`]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Path of the active file
    pub path: PathBuf,
    /// Permission bits of the file
    pub mode: u32,
    /// Permission bits of created directories
    pub dir_mode: u32,
    /// Rotate by size and keep backups
    pub rotate: bool,
    /// Rotation threshold, e.g. `"200MB"`
    pub max_size: String,
    /// Backup lifetime, e.g. `"90d"`; empty keeps backups forever
    pub max_age: String,
    /// Backups to keep; 0 keeps all
    pub max_backups: usize,
}

impl Default for FileConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("./logit.log"),
            mode: DEFAULT_FILE_MODE,
            dir_mode: DEFAULT_DIR_MODE,
            rotate: false,
            max_size: "200MB".to_string(),
            max_age: "90d".to_string(),
            max_backups: DEFAULT_MAX_BACKUPS,
        }
    }
}

impl FileConfig {
    /// Validate the settings into [`FileOptions`]
    pub fn options(&self) -> Result<FileOptions> {
        let mut options = FileOptions::default()
            .with_modes(self.mode, self.dir_mode)
            .with_max_age(optional(&self.max_age, parse_duration)?)
            .with_max_backups((self.max_backups > 0).then_some(self.max_backups));

        if let Some(max_size) = optional(&self.max_size, parse_byte_size)? {
            options.max_size = max_size;
        }
        options.rotate = self.rotate;

        Ok(options)
    }

    /// Open the configured file
    pub fn open(&self) -> Result<RotatingFile> {
        RotatingFile::open(&self.path, self.options()?)
    }
}

/// Complete logger output configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum level name
    pub level: String,
    /// Writer chain
    pub writer: WriterConfig,
    /// File settings for [`Target::File`]
    pub file: FileConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "debug".to_string(),
            writer: WriterConfig::default(),
            file: FileConfig::default(),
        }
    }
}

/// Settings parsed out of a [`WriterConfig`] before anything is opened
struct ChainPlan {
    buffer_size: usize,
    auto_sync: Option<Duration>,
}

impl Config {
    /// Settings suited to production: info level, batched writes to a
    /// rotating file
    pub fn production() -> Self {
        Self {
            level: "info".to_string(),
            writer: WriterConfig {
                target: Target::File,
                mode: Mode::Batch,
                batch_size: 16,
                ..WriterConfig::default()
            },
            file: FileConfig {
                rotate: true,
                ..FileConfig::default()
            },
        }
    }

    /// The configured minimum level
    pub fn level(&self) -> Result<Level> {
        Ok(self.level.parse()?)
    }

    fn plan(&self) -> Result<ChainPlan> {
        let buffer_size = match self.writer.mode {
            Mode::Buffer => {
                let size = parse_byte_size(&self.writer.buffer_size)?;
                usize::try_from(size)
                    .map_err(|_| Error::InvalidByteSize(self.writer.buffer_size.clone()))?
            }
            _ => DEFAULT_BUFFER_SIZE,
        };

        let auto_sync = match self.writer.mode {
            Mode::Direct => None,
            Mode::Buffer | Mode::Batch => optional(&self.writer.auto_sync, parse_duration)?,
        };

        Ok(ChainPlan {
            buffer_size,
            auto_sync,
        })
    }

    /// Build the writer chain
    ///
    /// Auto sync, when enabled, wraps the outermost layer only and needs a
    /// Tokio runtime.
    pub fn open_writer(&self) -> Result<Arc<dyn Writer>> {
        let plan = self.plan()?;
        let target: Box<dyn Writer> = match self.writer.target {
            Target::Stdout => Box::new(Console::stdout()),
            Target::Stderr => Box::new(Console::stderr()),
            Target::File => Box::new(self.file.open()?),
        };

        let chain: Box<dyn Writer> = match self.writer.mode {
            Mode::Direct => target,
            Mode::Buffer => Box::new(Buffer::new(target, plan.buffer_size)),
            Mode::Batch => Box::new(Batch::new(target, self.writer.batch_size)),
        };

        match plan.auto_sync {
            Some(interval) => Ok(Arc::new(AutoSyncWriter::new(chain, interval)?)),
            None => Ok(Arc::from(chain)),
        }
    }

    /// Build a logger routing every level through one writer chain
    pub fn open_logger(&self, encoder: Arc<dyn Encoder>) -> Result<DispatchLogger> {
        let level = self.level()?;
        let writer = self.open_writer()?;
        let table = LevelDispatchTable::new(encoder, writer);
        Ok(DispatchLogger::new(Arc::new(table)).with_level(level))
    }
}

fn optional<T>(value: &str, parse: impl FnOnce(&str) -> Result<T>) -> Result<Option<T>> {
    if value.trim().is_empty() {
        Ok(None)
    } else {
        parse(value).map(Some)
    }
}
