//! Size-rotating log file
//!
//! The active file always lives at the configured path. When the next write
//! would push it past `max_size`, it is renamed to a timestamped backup
//! beside it and a fresh file is opened in its place. Backups older than
//! `max_age`, or beyond the newest `max_backups`, are deleted afterwards.
//!
//! A single write is never split across files: a payload larger than
//! `max_size` lands whole in one (oversized) file.

use crate::clock::{Clock, SystemClock};
use crate::error::{Error, Result};
use crate::names::{Backup, BackupNames};
use chrono::{DateTime, TimeDelta, Utc};
use parking_lot::Mutex;
use proven_logger::{ErrorSink, Writer};
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, warn};

/// Operation name reported when deleting old backups fails
pub const PRUNE_OPERATION: &str = "rotate.prune";

/// Default permission bits for log files
pub const DEFAULT_FILE_MODE: u32 = 0o644;

/// Default permission bits for created directories
pub const DEFAULT_DIR_MODE: u32 = 0o755;

/// Default rotation threshold (200MB)
pub const DEFAULT_MAX_SIZE: u64 = 200 * 1024 * 1024;

/// Default backup lifetime (90 days)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(90 * 24 * 60 * 60);

/// Default number of backups kept
pub const DEFAULT_MAX_BACKUPS: usize = 100;

/// How a [`RotatingFile`] is opened and when it rotates
#[derive(Clone, Debug)]
pub struct FileOptions {
    /// Permission bits of log files (unix only)
    pub mode: u32,
    /// Permission bits of directories created for the file (unix only)
    pub dir_mode: u32,
    /// Whether to rotate at all; when false the file grows without bound
    pub rotate: bool,
    /// Rotate before a write that would take the file past this size
    pub max_size: u64,
    /// Delete backups older than this
    pub max_age: Option<Duration>,
    /// Keep at most this many backups
    pub max_backups: Option<usize>,
}

impl Default for FileOptions {
    fn default() -> Self {
        Self {
            mode: DEFAULT_FILE_MODE,
            dir_mode: DEFAULT_DIR_MODE,
            rotate: false,
            max_size: DEFAULT_MAX_SIZE,
            max_age: Some(DEFAULT_MAX_AGE),
            max_backups: Some(DEFAULT_MAX_BACKUPS),
        }
    }
}

impl FileOptions {
    /// Enable rotation at `max_size` bytes
    #[must_use]
    pub fn with_max_size(mut self, max_size: u64) -> Self {
        self.rotate = true;
        self.max_size = max_size;
        self
    }

    /// Set or clear the backup age limit
    #[must_use]
    pub fn with_max_age(mut self, max_age: Option<Duration>) -> Self {
        self.max_age = max_age;
        self
    }

    /// Set or clear the backup count limit
    #[must_use]
    pub fn with_max_backups(mut self, max_backups: Option<usize>) -> Self {
        self.max_backups = max_backups;
        self
    }

    /// Set file and directory permission bits
    #[must_use]
    pub fn with_modes(mut self, mode: u32, dir_mode: u32) -> Self {
        self.mode = mode;
        self.dir_mode = dir_mode;
        self
    }
}

struct Active {
    file: Option<File>,
    size: u64,
    names: BackupNames,
}

/// File sink that rotates by size and prunes its backups by age and count
pub struct RotatingFile {
    path: PathBuf,
    dir: PathBuf,
    options: FileOptions,
    clock: Arc<dyn Clock>,
    errors: ErrorSink,
    active: Mutex<Active>,
    #[cfg(test)]
    fail_reopen: std::sync::atomic::AtomicBool,
}

impl RotatingFile {
    /// Open (or create) the file at `path` for appending
    pub fn open(path: impl Into<PathBuf>, options: FileOptions) -> Result<Self> {
        Self::open_with(path, options, Arc::new(SystemClock), ErrorSink::Global)
    }

    /// Like [`open`](Self::open) with an explicit clock and error sink
    pub fn open_with(
        path: impl Into<PathBuf>,
        options: FileOptions,
        clock: Arc<dyn Clock>,
        errors: ErrorSink,
    ) -> Result<Self> {
        let path = path.into();
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        create_dir(&dir, options.dir_mode).map_err(|source| Error::CreateDirectory {
            path: dir.clone(),
            source,
        })?;

        let file = open_file(&path, options.mode).map_err(|source| Error::OpenFile {
            path: path.clone(),
            source,
        })?;
        let size = file.metadata()?.len();

        Ok(Self {
            active: Mutex::new(Active {
                file: Some(file),
                size,
                names: BackupNames::for_path(&path),
            }),
            path,
            dir,
            options,
            clock,
            errors,
            #[cfg(test)]
            fail_reopen: std::sync::atomic::AtomicBool::new(false),
        })
    }

    /// Path of the active file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Bytes written to the active file, including what it held when opened
    pub fn size(&self) -> u64 {
        self.active.lock().size
    }

    /// Backups of this file currently on disk, oldest first
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let active = self.active.lock();
        Ok(active
            .names
            .scan(&self.dir)?
            .into_iter()
            .map(|b| b.path)
            .collect())
    }

    /// Rotate now, regardless of size
    pub fn rotate(&self) -> io::Result<()> {
        let mut active = self.active.lock();
        if active.file.is_none() {
            return Err(closed());
        }
        self.rotate_locked(&mut active)
    }

    fn rotate_locked(&self, active: &mut Active) -> io::Result<()> {
        let now = self.clock.now();
        let backup = active.names.next_path(&self.dir, now);

        match fs::rename(&self.path, &backup) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return self.replace_missing(active, now);
            }
            Err(e) => return Err(e),
        }

        match self.reopen() {
            Ok(file) => {
                // Dropping the old handle closes the backup
                active.file = Some(file);
                active.size = 0;
                debug!(path = %self.path.display(), backup = %backup.display(), "rotated log file");
            }
            Err(e) => {
                // Keep writing to the old handle; put its name back if we can
                if let Err(undo) = fs::rename(&backup, &self.path) {
                    warn!(
                        backup = %backup.display(),
                        error = %undo,
                        "failed to restore log file after aborted rotation"
                    );
                }
                return Err(e);
            }
        }

        self.prune(&active.names, now);
        Ok(())
    }

    /// The active file was removed or moved away by someone else; there is
    /// nothing to keep as a backup, so start a fresh file at the same path.
    fn replace_missing(&self, active: &mut Active, now: DateTime<Utc>) -> io::Result<()> {
        warn!(path = %self.path.display(), "active log file disappeared, reopening");

        create_dir(&self.dir, self.options.dir_mode)?;
        active.file = Some(self.reopen()?);
        active.size = 0;

        self.prune(&active.names, now);
        Ok(())
    }

    fn reopen(&self) -> io::Result<File> {
        #[cfg(test)]
        {
            if self.fail_reopen.load(std::sync::atomic::Ordering::Relaxed) {
                return Err(io::Error::new(
                    io::ErrorKind::PermissionDenied,
                    "reopen disabled",
                ));
            }
        }
        open_file(&self.path, self.options.mode)
    }

    fn prune(&self, names: &BackupNames, now: DateTime<Utc>) {
        if self.options.max_age.is_none() && self.options.max_backups.is_none() {
            return;
        }

        let backups = match names.scan(&self.dir) {
            Ok(backups) => backups,
            Err(e) => {
                self.errors.report(PRUNE_OPERATION, &e);
                return;
            }
        };

        let max_age = self
            .options
            .max_age
            .and_then(|age| TimeDelta::from_std(age).ok());

        let mut kept: Vec<Backup> = Vec::with_capacity(backups.len());
        for backup in backups {
            let expired = max_age.is_some_and(|age| now - backup.created > age);
            if expired {
                self.remove(&backup);
            } else {
                kept.push(backup);
            }
        }

        if let Some(max_backups) = self.options.max_backups {
            let excess = kept.len().saturating_sub(max_backups);
            for backup in &kept[..excess] {
                self.remove(backup);
            }
        }
    }

    fn remove(&self, backup: &Backup) {
        match fs::remove_file(&backup.path) {
            Ok(()) => debug!(backup = %backup.path.display(), "removed old log backup"),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => self.errors.report(PRUNE_OPERATION, &e),
        }
    }
}

impl Writer for RotatingFile {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut active = self.active.lock();
        if active.file.is_none() {
            return Err(closed());
        }

        let len = buf.len() as u64;
        if self.options.rotate
            && active.size > 0
            && active.size.saturating_add(len) > self.options.max_size
        {
            self.rotate_locked(&mut active)?;
        }

        let file = active.file.as_mut().ok_or_else(closed)?;
        file.write_all(buf)?;
        active.size += len;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        match self.active.lock().file.as_mut() {
            Some(file) => {
                file.flush()?;
                file.sync_data()
            }
            None => Ok(()),
        }
    }

    fn close(&self) -> io::Result<()> {
        match self.active.lock().file.take() {
            Some(mut file) => {
                file.flush()?;
                file.sync_data()
            }
            None => Ok(()),
        }
    }
}

impl std::fmt::Debug for RotatingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RotatingFile")
            .field("path", &self.path)
            .field("options", &self.options)
            .field("errors", &self.errors)
            .finish_non_exhaustive()
    }
}

fn closed() -> io::Error {
    io::Error::new(io::ErrorKind::BrokenPipe, "log file is closed")
}

fn open_file(path: &Path, mode: u32) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.create(true).append(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    options.open(path)
}

fn create_dir(dir: &Path, mode: u32) -> io::Result<()> {
    let mut builder = fs::DirBuilder::new();
    builder.recursive(true);

    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(mode);
    }
    #[cfg(not(unix))]
    let _ = mode;

    builder.create(dir)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::Ordering;
    use tempfile::tempdir;

    fn options(max_size: u64) -> FileOptions {
        FileOptions::default()
            .with_max_size(max_size)
            .with_max_age(None)
            .with_max_backups(None)
    }

    #[test]
    fn test_failed_reopen_keeps_previous_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::open(&path, options(10)).unwrap();

        file.write(&[b'a'; 10]).unwrap();
        file.fail_reopen.store(true, Ordering::Relaxed);

        let err = file.write(&[b'b'; 5]).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::PermissionDenied);

        // Rename was rolled back and nothing of the failed write landed
        assert_eq!(fs::read(&path).unwrap(), vec![b'a'; 10]);
        assert!(file.backups().unwrap().is_empty());
        assert_eq!(file.size(), 10);

        file.fail_reopen.store(false, Ordering::Relaxed);
        file.write(&[b'c'; 5]).unwrap();

        let backups = file.backups().unwrap();
        assert_eq!(backups.len(), 1);
        assert_eq!(fs::read(&backups[0]).unwrap(), vec![b'a'; 10]);
        assert_eq!(fs::read(&path).unwrap(), vec![b'c'; 5]);
    }

    #[test]
    fn test_failed_explicit_rotate_keeps_writing_to_old_handle() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::open(&path, options(1024)).unwrap();

        file.write(b"before\n").unwrap();
        file.fail_reopen.store(true, Ordering::Relaxed);
        assert!(file.rotate().is_err());

        // Below the limit, so no rotation is attempted
        file.write(b"after\n").unwrap();
        file.flush().unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"before\nafter\n");
    }

    #[test]
    fn test_failed_reopen_of_missing_file_is_returned() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("app.log");
        let file = RotatingFile::open(&path, options(10)).unwrap();

        file.write(&[b'a'; 10]).unwrap();
        fs::remove_file(&path).unwrap();
        file.fail_reopen.store(true, Ordering::Relaxed);

        assert!(file.write(b"lost").is_err());

        file.fail_reopen.store(false, Ordering::Relaxed);
        file.write(b"found").unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"found");
    }
}
