//! Backup file naming
//!
//! A backup of `app.log` is named `app.<YYYYMMDDhhmmss>-<seq>.log` and sits
//! next to it. The timestamp is the UTC time the backup was rotated out;
//! `seq` tells apart backups created within the same second.

use chrono::{DateTime, NaiveDateTime, Utc};
use std::path::{Path, PathBuf};

const TIME_FORMAT: &str = "%Y%m%d%H%M%S";

/// A backup found on disk
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Backup {
    /// Full path of the backup
    pub path: PathBuf,
    /// UTC time embedded in the name
    pub created: DateTime<Utc>,
    /// Disambiguating counter embedded in the name
    pub seq: u64,
}

/// Generates and recognizes backup names for one active file
///
/// `next_path` is only ever called with the rotation lock held, so the
/// counter needs no synchronization of its own.
#[derive(Clone, Debug)]
pub struct BackupNames {
    prefix: String,
    suffix: String,
    seq: u64,
}

impl BackupNames {
    /// Names for backups of the file at `active`
    pub fn for_path(active: &Path) -> Self {
        let stem = active
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let suffix = active
            .extension()
            .map(|e| format!(".{}", e.to_string_lossy()))
            .unwrap_or_default();

        Self {
            prefix: format!("{stem}."),
            suffix,
            seq: 0,
        }
    }

    /// File name for a backup created at `now` with counter `seq`
    pub fn name(&self, now: DateTime<Utc>, seq: u64) -> String {
        format!(
            "{}{}-{seq}{}",
            self.prefix,
            now.format(TIME_FORMAT),
            self.suffix
        )
    }

    /// A path in `dir` that does not exist yet
    ///
    /// Bumps the counter past any name already taken on disk, e.g. by a
    /// previous process that rotated within the same second.
    pub fn next_path(&mut self, dir: &Path, now: DateTime<Utc>) -> PathBuf {
        loop {
            let path = dir.join(self.name(now, self.seq));
            self.seq = self.seq.wrapping_add(1);
            if !path.exists() {
                return path;
            }
        }
    }

    /// Parse a file name produced by [`name`](Self::name)
    pub fn parse(&self, file_name: &str) -> Option<(DateTime<Utc>, u64)> {
        let middle = file_name
            .strip_prefix(&self.prefix)?
            .strip_suffix(self.suffix.as_str())?;
        let (stamp, seq) = middle.split_once('-')?;
        if stamp.len() != 14 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }

        let created = NaiveDateTime::parse_from_str(stamp, TIME_FORMAT)
            .ok()?
            .and_utc();
        let seq = seq.parse().ok()?;
        Some((created, seq))
    }

    /// Every backup in `dir`, oldest first
    pub fn scan(&self, dir: &Path) -> std::io::Result<Vec<Backup>> {
        let mut backups = Vec::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else {
                continue;
            };
            if let Some((created, seq)) = self.parse(name) {
                backups.push(Backup {
                    path: entry.path(),
                    created,
                    seq,
                });
            }
        }

        backups.sort_by(|a, b| (a.created, a.seq).cmp(&(b.created, b.seq)));
        Ok(backups)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use tempfile::tempdir;

    fn at(h: u32, m: u32, s: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 14, h, m, s).unwrap()
    }

    #[test]
    fn test_name_round_trip() {
        let names = BackupNames::for_path(Path::new("/var/log/app.log"));
        let name = names.name(at(9, 26, 53), 7);

        assert_eq!(name, "app.20260314092653-7.log");
        assert_eq!(
            names.parse(&name),
            Some((at(9, 26, 53), 7))
        );
    }

    #[test]
    fn test_rejects_foreign_names() {
        let names = BackupNames::for_path(Path::new("app.log"));

        assert_eq!(names.parse("app.log"), None);
        assert_eq!(names.parse("other.20260314092653-1.log"), None);
        assert_eq!(names.parse("app.20260314092653-1.txt"), None);
        assert_eq!(names.parse("app.2026031409-1.log"), None);
        assert_eq!(names.parse("app.20261399092653-1.log"), None);
    }

    #[test]
    fn test_no_extension() {
        let names = BackupNames::for_path(Path::new("service"));
        let name = names.name(at(1, 2, 3), 0);

        assert_eq!(name, "service.20260314010203-0");
        assert!(names.parse(&name).is_some());
    }

    #[test]
    fn test_next_path_skips_existing() {
        let dir = tempdir().unwrap();
        let mut names = BackupNames::for_path(&dir.path().join("app.log"));
        let now = at(12, 0, 0);

        std::fs::write(dir.path().join(names.name(now, 0)), b"").unwrap();
        std::fs::write(dir.path().join(names.name(now, 1)), b"").unwrap();

        let path = names.next_path(dir.path(), now);
        assert_eq!(path, dir.path().join("app.20260314120000-2.log"));
    }

    #[test]
    fn test_same_second_names_are_unique() {
        let dir = tempdir().unwrap();
        let mut names = BackupNames::for_path(&dir.path().join("app.log"));
        let now = at(12, 0, 0);

        let first = names.next_path(dir.path(), now);
        let second = names.next_path(dir.path(), now);
        assert_ne!(first, second);
    }

    #[test]
    fn test_scan_orders_oldest_first() {
        let dir = tempdir().unwrap();
        let names = BackupNames::for_path(&dir.path().join("app.log"));

        for (time, seq) in [(at(10, 0, 0), 0), (at(8, 0, 0), 3), (at(10, 0, 0), 1)] {
            std::fs::write(dir.path().join(names.name(time, seq)), b"").unwrap();
        }
        std::fs::write(dir.path().join("app.log"), b"").unwrap();
        std::fs::write(dir.path().join("notes.txt"), b"").unwrap();

        let order: Vec<_> = names
            .scan(dir.path())
            .unwrap()
            .into_iter()
            .map(|b| (b.created.format("%H").to_string(), b.seq))
            .collect();

        assert_eq!(
            order,
            [
                ("08".to_string(), 3),
                ("10".to_string(), 0),
                ("10".to_string(), 1)
            ]
        );
    }
}
