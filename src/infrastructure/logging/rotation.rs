//! Size-triggered log file rotation
//!
//! When a write would push the active file past its size limit, the file is
//! renamed to `<name>.<timestamp>`, optionally gzipped, and a fresh file is
//! opened in its place. Backups beyond the configured count or age are
//! deleted after each rotation.

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use flate2::write::GzEncoder;
use flate2::Compression;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

use crate::infrastructure::config::RotationPolicy;

const BACKUP_TIME_FORMAT: &str = "%Y%m%d_%H%M%S%.3f";

/// A file writer that rotates itself according to a [`RotationPolicy`]
#[derive(Debug)]
pub struct RotatingFile {
    path: PathBuf,
    file: File,
    size: u64,
    max_bytes: u64,
    max_backups: usize,
    max_age_days: u32,
    compress: bool,
}

impl RotatingFile {
    /// Open `path` in append mode, rotating at the policy's size limit
    pub fn open(path: impl AsRef<Path>, policy: RotationPolicy) -> io::Result<Self> {
        Self::with_threshold(path, policy.max_size_bytes(), policy)
    }

    /// Like [`RotatingFile::open`] with an explicit threshold in bytes
    pub fn with_threshold(
        path: impl AsRef<Path>,
        max_bytes: u64,
        policy: RotationPolicy,
    ) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = open_append(&path)?;
        let size = file.metadata()?.len();

        Ok(Self {
            path,
            file,
            size,
            max_bytes: max_bytes.max(1),
            max_backups: policy.max_backups,
            max_age_days: policy.max_age_days,
            compress: policy.compress,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn should_rotate(&self, incoming: usize) -> bool {
        self.size > 0 && self.size.saturating_add(incoming as u64) > self.max_bytes
    }

    /// Rotate the active file now
    pub fn rotate(&mut self) -> io::Result<PathBuf> {
        self.file.flush()?;

        let backup = self.backup_path();
        fs::rename(&self.path, &backup)?;
        self.file = open_append(&self.path)?;
        self.size = 0;

        let backup = if self.compress {
            compress_file(&backup)?
        } else {
            backup
        };

        info!(
            path = %self.path.display(),
            backup = %backup.display(),
            "rotated log file"
        );

        if let Err(e) = self.prune_backups() {
            warn!(error = %e, path = %self.path.display(), "failed to prune log backups");
        }

        Ok(backup)
    }

    fn backup_path(&self) -> PathBuf {
        let stamp = Utc::now().format(BACKUP_TIME_FORMAT);
        let base = format!("{}.{stamp}", self.path.display());

        let mut candidate = PathBuf::from(&base);
        let mut n = 1;
        while candidate.exists() || PathBuf::from(format!("{}.gz", candidate.display())).exists() {
            candidate = PathBuf::from(format!("{base}-{n}"));
            n += 1;
        }
        candidate
    }

    /// Existing backups of this file, oldest first
    pub fn backups(&self) -> io::Result<Vec<PathBuf>> {
        let Some(file_name) = self.path.file_name().and_then(|n| n.to_str()) else {
            return Ok(Vec::new());
        };
        let prefix = format!("{file_name}.");
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };

        let mut backups: Vec<(DateTime<Utc>, PathBuf)> = Vec::new();
        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let name = entry.file_name();
            let Some(name) = name.to_str() else { continue };
            if !name.strip_prefix(&prefix).is_some_and(is_backup_suffix) {
                continue;
            }
            let modified: DateTime<Utc> = entry.metadata()?.modified()?.into();
            backups.push((modified, entry.path()));
        }

        backups.sort();
        Ok(backups.into_iter().map(|(_, path)| path).collect())
    }

    /// Delete backups beyond the count limit or older than the age limit
    ///
    /// Returns the number of deleted files.
    pub fn prune_backups(&self) -> io::Result<usize> {
        let mut backups = self.backups()?;
        let mut deleted = 0;

        if self.max_age_days > 0 {
            let cutoff = Utc::now() - Duration::days(i64::from(self.max_age_days));
            let mut kept = Vec::with_capacity(backups.len());
            for path in backups {
                let modified: DateTime<Utc> = fs::metadata(&path)?.modified()?.into();
                if modified < cutoff {
                    fs::remove_file(&path)?;
                    debug!(path = %path.display(), "deleted expired log backup");
                    deleted += 1;
                } else {
                    kept.push(path);
                }
            }
            backups = kept;
        }

        if self.max_backups > 0 && backups.len() > self.max_backups {
            let excess = backups.len() - self.max_backups;
            for path in backups.drain(..excess) {
                fs::remove_file(&path)?;
                debug!(path = %path.display(), "deleted surplus log backup");
                deleted += 1;
            }
        }

        Ok(deleted)
    }
}

impl Write for RotatingFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.should_rotate(buf.len()) {
            if let Err(e) = self.rotate() {
                warn!(error = %e, path = %self.path.display(), "log rotation failed, appending to current file");
            }
        }
        self.file.write_all(buf)?;
        self.size += buf.len() as u64;
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}

/// Whether `suffix` is `<stamp>`, `<stamp>-<n>`, optionally followed by `.gz`
fn is_backup_suffix(suffix: &str) -> bool {
    let suffix = suffix.strip_suffix(".gz").unwrap_or(suffix);
    let stamp = match suffix.rsplit_once('-') {
        Some((stamp, n)) if !n.is_empty() && n.bytes().all(|b| b.is_ascii_digit()) => stamp,
        Some(_) => return false,
        None => suffix,
    };
    NaiveDateTime::parse_from_str(stamp, BACKUP_TIME_FORMAT).is_ok()
}

/// Open `path` for appending, creating it and its parent directories
pub fn open_append(path: &Path) -> io::Result<File> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    OpenOptions::new().create(true).append(true).open(path)
}

fn compress_file(path: &Path) -> io::Result<PathBuf> {
    let target = PathBuf::from(format!("{}.gz", path.display()));
    let mut input = File::open(path)?;
    let mut encoder = GzEncoder::new(File::create(&target)?, Compression::default());
    io::copy(&mut input, &mut encoder)?;
    encoder.finish()?.sync_all()?;
    fs::remove_file(path)?;
    Ok(target)
}
