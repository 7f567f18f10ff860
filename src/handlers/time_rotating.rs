//! File handler that rotates when wall-clock time crosses an interval boundary
//!
//! Time is divided into buckets of `interval` seconds since the Unix epoch.
//! A record landing in a later bucket than the previous record rotates the
//! file first; the very first record only initialises the bucket.

use super::file::FileSink;
use super::rotation::{backup_path, list_backups};
use crate::core::dispatch::report;
use crate::core::handler::{delegate_handler_base, Handler, HandlerBase};
use crate::core::{Clock, LogRecord, LoggerError, Result, SystemClock};
use chrono::{DateTime, Local};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

/// Backup name suffix, minute resolution. Further rotations within the
/// same minute append `.01`, `.02`, ... so names still sort by age.
const BACKUP_TIME_FORMAT: &str = "%Y%m%d%H%M";

/// Rotation interval in seconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RotateInterval(u64);

impl RotateInterval {
    pub const MINUTE: RotateInterval = RotateInterval(60);
    pub const HALF_HOUR: RotateInterval = RotateInterval(1800);
    pub const HOUR: RotateInterval = RotateInterval(3600);
    pub const DAY: RotateInterval = RotateInterval(86400);

    pub const fn from_secs(secs: u64) -> Self {
        RotateInterval(secs)
    }

    pub const fn as_secs(&self) -> u64 {
        self.0
    }

    /// Bucket index of `now`
    pub fn bucket(&self, now: &DateTime<Local>) -> i64 {
        now.timestamp().div_euclid(self.0 as i64)
    }
}

impl Default for RotateInterval {
    fn default() -> Self {
        RotateInterval::DAY
    }
}

impl From<Duration> for RotateInterval {
    fn from(duration: Duration) -> Self {
        RotateInterval(duration.as_secs())
    }
}

pub struct TimeRotateFileHandler {
    base: HandlerBase,
    sink: FileSink,
    interval: RotateInterval,
    backup_count: usize,
    /// `None` until the first record arrives
    last_bucket: Option<i64>,
    clock: Arc<dyn Clock>,
}

impl TimeRotateFileHandler {
    /// # Errors
    ///
    /// Returns error if `interval` is zero or the file cannot be opened
    pub fn new(path: impl Into<PathBuf>, interval: RotateInterval, backup_count: usize) -> Result<Self> {
        if interval.as_secs() == 0 {
            return Err(LoggerError::config(
                "TimeRotateFileHandler",
                "rotation interval must be at least one second",
            ));
        }

        Ok(Self {
            base: HandlerBase::new(),
            sink: FileSink::open(path)?,
            interval,
            backup_count,
            last_bucket: None,
            clock: Arc::new(SystemClock),
        })
    }

    /// Read time from `clock` instead of the system clock
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    #[must_use]
    pub fn with_sync_write(mut self, sync_write: bool) -> Self {
        self.sink.set_sync_write(sync_write);
        self
    }

    pub fn set_sync_write(&mut self, sync_write: bool) {
        self.sink.set_sync_write(sync_write);
    }

    pub fn path(&self) -> &Path {
        self.sink.path()
    }

    pub fn interval(&self) -> RotateInterval {
        self.interval
    }

    pub fn backup_count(&self) -> usize {
        self.backup_count
    }

    pub fn last_bucket(&self) -> Option<i64> {
        self.last_bucket
    }

    fn should_rotate(&mut self, now: &DateTime<Local>) -> bool {
        let bucket = self.interval.bucket(now);
        let rotate = matches!(self.last_bucket, Some(last) if bucket > last);
        self.last_bucket = Some(bucket);
        rotate
    }

    /// Backup name for `now`. If `existing` already holds backups from the
    /// same minute, the next sequence number after the highest one is used,
    /// so an existing backup is never replaced and names keep sorting by age.
    fn backup_target(base_path: &Path, now: &DateTime<Local>, existing: &[PathBuf]) -> PathBuf {
        let stamp = now.format(BACKUP_TIME_FORMAT).to_string();
        let plain = backup_path(base_path, &stamp);
        let plain_name = plain.file_name().and_then(|n| n.to_str()).unwrap_or_default();

        let highest = existing
            .iter()
            .filter_map(|path| path.file_name().and_then(|n| n.to_str()))
            .filter_map(|name| {
                let rest = name.strip_prefix(plain_name)?;
                if rest.is_empty() {
                    Some(0)
                } else {
                    rest.strip_prefix('.')?.parse::<u32>().ok()
                }
            })
            .max();

        match highest {
            Some(seq) => backup_path(base_path, &format!("{}.{:02}", stamp, seq + 1)),
            None => plain,
        }
    }

    fn rotate(&mut self, now: &DateTime<Local>) -> Result<()> {
        self.sink.close()?;

        let base_path = self.sink.path().to_path_buf();

        let backups = list_backups(&base_path)?;
        if backups.len() >= self.backup_count {
            let excess = backups.len() - self.backup_count;
            for old in &backups[..excess] {
                fs::remove_file(old).map_err(|e| {
                    LoggerError::file_rotation(
                        old.display().to_string(),
                        format!("Failed to remove old backup: {}", e),
                    )
                })?;
            }
        }

        if base_path.exists() {
            let target = Self::backup_target(&base_path, now, &backups);
            fs::rename(&base_path, &target).map_err(|e| {
                LoggerError::file_rotation(
                    base_path.display().to_string(),
                    format!("Failed to rename to '{}': {}", target.display(), e),
                )
            })?;
        }

        self.sink.reopen()
    }
}

impl Handler for TimeRotateFileHandler {
    fn handle(&mut self, record: &LogRecord) -> Result<()> {
        if !self.base.accepts(record) {
            return Ok(());
        }

        let now = self.clock.now();
        if self.should_rotate(&now) {
            if let Err(e) = self.rotate(&now) {
                // Keep logging into whatever file is reachable.
                report("WARNING", format_args!("Log rotation failed: {}. Continuing with current file.", e));
            }
        }

        let bytes = self.base.formatter.format_at(record, &now);
        self.sink.write(&bytes)
    }

    delegate_handler_base!();

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn name(&self) -> &str {
        "time-rotate-file"
    }
}
