//! File handler that rotates once the active file would exceed a byte limit
//!
//! Backups are numbered `<name>_0001`, `<name>_0002`, ... with the newest at
//! the highest slot. Once `backup_count` slots are in use, every rotation
//! shifts the backups down one slot, dropping slot 1.

use super::file::FileSink;
use super::rotation::{max_numeric_suffix, numbered_path, rename_over};
use crate::core::dispatch::report;
use crate::core::handler::{delegate_handler_base, Handler, HandlerBase};
use crate::core::{LogRecord, Result};
use std::path::{Path, PathBuf};

pub struct SizeRotateFileHandler {
    base: HandlerBase,
    sink: FileSink,
    max_bytes: u64,
    current_bytes: u64,
    backup_count: u32,
    last_suffix: u32,
}

impl SizeRotateFileHandler {
    /// Open `path`, continuing byte accounting and backup numbering from
    /// whatever is already on disk.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be opened or its directory listed
    pub fn new(path: impl Into<PathBuf>, max_bytes: u64, backup_count: u32) -> Result<Self> {
        let sink = FileSink::open(path)?;
        let current_bytes = sink.len()?;
        let last_suffix = max_numeric_suffix(sink.path())?;

        Ok(Self {
            base: HandlerBase::new(),
            sink,
            max_bytes,
            current_bytes,
            backup_count,
            last_suffix,
        })
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

    pub fn max_bytes(&self) -> u64 {
        self.max_bytes
    }

    pub fn backup_count(&self) -> u32 {
        self.backup_count
    }

    /// Bytes written to the active file so far
    pub fn current_bytes(&self) -> u64 {
        self.current_bytes
    }

    /// Highest backup slot handed out by this handler
    pub fn last_suffix(&self) -> u32 {
        self.last_suffix
    }

    fn rotate(&mut self) -> Result<()> {
        self.sink.close()?;

        let base_path = self.sink.path().to_path_buf();
        let max_suffix = max_numeric_suffix(&base_path)?;

        let target = if max_suffix >= self.backup_count {
            for slot in 1..max_suffix {
                let from = numbered_path(&base_path, slot + 1);
                if from.exists() {
                    rename_over(&from, &numbered_path(&base_path, slot))?;
                }
            }
            numbered_path(&base_path, max_suffix)
        } else {
            self.last_suffix += 1;
            numbered_path(&base_path, self.last_suffix)
        };

        if base_path.exists() {
            rename_over(&base_path, &target)?;
        }

        self.sink.reopen()
    }
}

impl Handler for SizeRotateFileHandler {
    fn handle(&mut self, record: &LogRecord) -> Result<()> {
        if !self.base.accepts(record) {
            return Ok(());
        }

        let bytes = self.base.formatter.format(record);
        let len = bytes.len() as u64;

        if self.current_bytes + len > self.max_bytes {
            if let Err(e) = self.rotate() {
                report("WARNING", format_args!("Log rotation failed: {}. Continuing with current file.", e));
            }
            self.current_bytes = len;
        } else {
            self.current_bytes += len;
        }

        self.sink.write(&bytes)
    }

    delegate_handler_base!();

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn name(&self) -> &str {
        "size-rotate-file"
    }
}
