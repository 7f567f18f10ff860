//! File handler and the append-only sink shared by all file-backed handlers

use crate::core::handler::{delegate_handler_base, Handler, HandlerBase};
use crate::core::{LogRecord, LoggerError, Result};
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Append-mode file with optional fsync after every write.
///
/// Rotating handlers close the sink, move the file away and reopen the same
/// path.
#[derive(Debug)]
pub struct FileSink {
    path: PathBuf,
    writer: Option<BufWriter<File>>,
    sync_write: bool,
}

impl FileSink {
    /// Open (creating if needed) `path` for appending
    ///
    /// # Errors
    ///
    /// Returns error if the parent directory or the file cannot be created
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                LoggerError::io_operation(
                    "create log directory",
                    format!("Failed to create directory '{}'", parent.display()),
                    e,
                )
            })?;
        }

        let file = Self::open_file(&path)?;
        Ok(Self {
            path,
            writer: Some(BufWriter::new(file)),
            sync_write: false,
        })
    }

    fn open_file(path: &Path) -> Result<File> {
        let mut options = OpenOptions::new();
        options.create(true).append(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o644);
        }
        options.open(path).map_err(|e| {
            LoggerError::file_appender(path.display().to_string(), format!("Failed to open: {}", e))
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_sync_write(&mut self, sync_write: bool) {
        self.sync_write = sync_write;
    }

    pub fn sync_write(&self) -> bool {
        self.sync_write
    }

    pub fn is_open(&self) -> bool {
        self.writer.is_some()
    }

    /// Current length of the file on disk, including buffered bytes
    pub fn len(&self) -> Result<u64> {
        let on_disk = fs::metadata(&self.path)
            .map(|m| m.len())
            .map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Cannot access file metadata: {}", e),
                )
            })?;
        let buffered = self.writer.as_ref().map_or(0, |w| w.buffer().len() as u64);
        Ok(on_disk + buffered)
    }

    /// Write formatted bytes, reopening first if a previous rotation left
    /// the sink closed.
    pub fn write(&mut self, bytes: &[u8]) -> Result<()> {
        if self.writer.is_none() {
            self.reopen()?;
        }
        let Some(writer) = self.writer.as_mut() else {
            return Err(LoggerError::writer("File writer not initialized"));
        };

        writer.write_all(bytes).map_err(|e| {
            LoggerError::file_appender(
                self.path.display().to_string(),
                format!("Failed to write log entry: {}", e),
            )
        })?;

        if self.sync_write {
            writer.flush()?;
            writer.get_ref().sync_data().map_err(|e| {
                LoggerError::io_operation(
                    "syncing log file",
                    format!("fsync failed for '{}'", self.path.display()),
                    e,
                )
            })?;
        }
        Ok(())
    }

    pub fn flush(&mut self) -> Result<()> {
        if let Some(ref mut writer) = self.writer {
            writer.flush().map_err(|e| {
                LoggerError::file_appender(
                    self.path.display().to_string(),
                    format!("Failed to flush: {}", e),
                )
            })?;
        }
        Ok(())
    }

    /// Flush and release the file handle
    pub fn close(&mut self) -> Result<()> {
        if let Some(mut writer) = self.writer.take() {
            writer.flush().map_err(|e| {
                LoggerError::file_rotation(
                    self.path.display().to_string(),
                    format!("Failed to flush before rotation: {}", e),
                )
            })?;
        }
        Ok(())
    }

    /// Open the path again, creating a fresh file if it was moved away
    pub fn reopen(&mut self) -> Result<()> {
        self.close()?;
        let file = Self::open_file(&self.path)?;
        self.writer = Some(BufWriter::new(file));
        Ok(())
    }
}

impl Drop for FileSink {
    fn drop(&mut self) {
        if let Some(mut writer) = self.writer.take() {
            let _ = writer.flush();
        }
    }
}

/// Handler that appends every record to one file
pub struct FileHandler {
    base: HandlerBase,
    sink: FileSink,
}

impl FileHandler {
    pub fn new(path: impl Into<PathBuf>) -> Result<Self> {
        Ok(Self {
            base: HandlerBase::new(),
            sink: FileSink::open(path)?,
        })
    }

    /// fsync after every record
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
}

impl Handler for FileHandler {
    fn handle(&mut self, record: &LogRecord) -> Result<()> {
        if !self.base.accepts(record) {
            return Ok(());
        }
        let bytes = self.base.formatter.format(record);
        self.sink.write(&bytes)
    }

    delegate_handler_base!();

    fn flush(&mut self) -> Result<()> {
        self.sink.flush()
    }

    fn name(&self) -> &str {
        "file"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{Formatter, LogLevel};
    use tempfile::tempdir;

    #[test]
    fn test_file_handler_appends_and_filters() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("app.log");

        let mut handler = FileHandler::new(&path).unwrap().with_sync_write(true);
        handler.set_formatter(Formatter::compile("${levelname} ${message}").unwrap());
        handler.set_level(LogLevel::Warn);

        handler.handle(&LogRecord::new("app", LogLevel::Info, "skipped")).unwrap();
        handler.handle(&LogRecord::new("app", LogLevel::Error, "kept")).unwrap();

        // sync_write flushes through to disk without an explicit flush
        assert_eq!(fs::read_to_string(&path).unwrap(), "ERROR kept\n");
    }

    #[test]
    fn test_sink_reopen_after_move() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("moved.log");

        let mut sink = FileSink::open(&path).unwrap();
        sink.write(b"first\n").unwrap();
        sink.close().unwrap();
        assert!(!sink.is_open());

        fs::rename(&path, dir.path().join("moved.log_old")).unwrap();
        sink.write(b"second\n").unwrap();
        sink.flush().unwrap();

        assert_eq!(fs::read_to_string(&path).unwrap(), "second\n");
        assert_eq!(sink.len().unwrap(), 7);
    }
}
