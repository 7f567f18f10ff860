//! Logger configuration record and the handler factory that consumes it
//!
//! Field names match the keys of the logging configuration file
//! (`level`, `handler`, `backup-count`, ...). Anything left out falls back to
//! the defaults applied by [`LoggerConfig::resolve`].

use super::{
    error::{LoggerError, Result},
    formatter::{Formatter, DEFAULT_TEMPLATE},
    handler::Handler,
    log_level::LogLevel,
};
use crate::handlers::{RotateInterval, SizeRotateFileHandler, StreamHandler, TimeRotateFileHandler};
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const KB: u64 = 1024;
pub const MB: u64 = 1024 * KB;
pub const GB: u64 = 1024 * MB;

pub const DEFAULT_BACKUP_COUNT: u32 = 10;
pub const DEFAULT_MAX_BYTES: u64 = 100 * MB;
const LOG_SUFFIX: &str = ".log";

/// Handler variants that can be built from configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HandlerKind {
    Console,
    TimeRotateFile,
    SizeRotateFile,
}

impl HandlerKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            HandlerKind::Console => "ConsoleHandler",
            HandlerKind::TimeRotateFile => "TimeRotateFileHandler",
            HandlerKind::SizeRotateFile => "SizeRotateFileHandler",
        }
    }

    pub fn writes_file(&self) -> bool {
        !matches!(self, HandlerKind::Console)
    }
}

impl fmt::Display for HandlerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HandlerKind {
    type Err = LoggerError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "ConsoleHandler" => Ok(HandlerKind::Console),
            "TimeRotateFileHandler" => Ok(HandlerKind::TimeRotateFile),
            "SizeRotateFileHandler" => Ok(HandlerKind::SizeRotateFile),
            other => Err(LoggerError::UnknownHandler(other.to_string())),
        }
    }
}

fn deserialize_level<'de, D>(deserializer: D) -> std::result::Result<Option<LogLevel>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|s| s.parse::<LogLevel>().map_err(serde::de::Error::custom))
        .transpose()
}

/// Per-logger configuration as read from a configuration source.
///
/// Zero values for `interval`, `max-bytes` and `backup-count` are treated
/// the same as absent ones.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "kebab-case", default)]
pub struct LoggerConfig {
    #[serde(deserialize_with = "deserialize_level")]
    pub level: Option<LogLevel>,
    pub format: Option<String>,
    /// `ConsoleHandler`, `TimeRotateFileHandler` or `SizeRotateFileHandler`
    pub handler: String,
    pub interval: Option<RotateInterval>,
    pub max_bytes: Option<u64>,
    pub backup_count: Option<u32>,
    pub file_name: Option<String>,
    pub log_path: Option<PathBuf>,
    /// fsync after every record
    pub sync_write: bool,
    /// Log calls wait for this handler to write
    pub sync_mode: bool,
    /// Also attach the default console handler
    pub enable_console_log: bool,
}

impl LoggerConfig {
    pub fn new(kind: HandlerKind) -> Self {
        Self {
            handler: kind.as_str().to_string(),
            ..Self::default()
        }
    }

    /// Apply defaults for logger `name`.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::UnknownHandler`] for an unsupported handler
    /// kind, or an I/O error if a relative log path cannot be resolved.
    pub fn resolve(&self, name: &str) -> Result<ResolvedConfig> {
        let kind: HandlerKind = self.handler.parse()?;

        let mut file_name = self
            .file_name
            .clone()
            .filter(|f| !f.is_empty())
            .unwrap_or_else(|| name.to_string());
        if !file_name.ends_with(LOG_SUFFIX) {
            file_name.push_str(LOG_SUFFIX);
        }

        let log_path = self
            .log_path
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| PathBuf::from("."));
        let log_dir = if log_path.is_absolute() {
            log_path
        } else {
            std::env::current_dir()
                .map_err(|e| {
                    LoggerError::io_operation(
                        "resolving log path",
                        format!("Failed to read current directory for '{}'", log_path.display()),
                        e,
                    )
                })?
                .join(log_path)
        };

        Ok(ResolvedConfig {
            name: name.to_string(),
            kind,
            level: self.level.unwrap_or_default(),
            format: self
                .format
                .clone()
                .filter(|f| !f.is_empty())
                .unwrap_or_else(|| DEFAULT_TEMPLATE.to_string()),
            interval: self
                .interval
                .filter(|i| i.as_secs() > 0)
                .unwrap_or_default(),
            max_bytes: self.max_bytes.filter(|&b| b > 0).unwrap_or(DEFAULT_MAX_BYTES),
            backup_count: self
                .backup_count
                .filter(|&c| c > 0)
                .unwrap_or(DEFAULT_BACKUP_COUNT),
            path: log_dir.join(file_name),
            sync_write: self.sync_write,
            // The console handler is always synchronous.
            sync_mode: self.sync_mode || kind == HandlerKind::Console,
            enable_console_log: self.enable_console_log && kind.writes_file(),
        })
    }
}

/// A [`LoggerConfig`] with every default applied
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedConfig {
    pub name: String,
    pub kind: HandlerKind,
    pub level: LogLevel,
    pub format: String,
    pub interval: RotateInterval,
    pub max_bytes: u64,
    pub backup_count: u32,
    /// Absolute path of the active log file
    pub path: PathBuf,
    pub sync_write: bool,
    pub sync_mode: bool,
    pub enable_console_log: bool,
}

/// Build the handler described by `config`.
///
/// The template is compiled before any file is touched, so a bad template
/// leaves nothing behind on disk.
pub fn create_handler(config: &ResolvedConfig) -> Result<Box<dyn Handler>> {
    let formatter = Formatter::compile(&config.format)?;

    let mut handler: Box<dyn Handler> = match config.kind {
        HandlerKind::Console => Box::new(StreamHandler::stdout()),
        HandlerKind::TimeRotateFile => Box::new(
            TimeRotateFileHandler::new(&config.path, config.interval, config.backup_count as usize)?
                .with_sync_write(config.sync_write),
        ),
        HandlerKind::SizeRotateFile => Box::new(
            SizeRotateFileHandler::new(&config.path, config.max_bytes, config.backup_count)?
                .with_sync_write(config.sync_write),
        ),
    };

    handler.set_formatter(formatter);
    handler.set_level(config.level);
    handler.set_sync_mode(config.sync_mode);
    Ok(handler)
}
