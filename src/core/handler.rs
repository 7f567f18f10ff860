//! Handler trait for log output destinations

use super::{error::Result, formatter::Formatter, log_level::LogLevel, log_record::LogRecord};

/// A sink that turns records into persisted or displayed bytes.
///
/// A handler is owned by exactly one dispatch loop and only ever touched by
/// that loop's worker thread, so implementations need `Send` but not `Sync`.
pub trait Handler: Send {
    /// Render and write one record. Records below the handler's own level
    /// are ignored.
    fn handle(&mut self, record: &LogRecord) -> Result<()>;

    fn set_formatter(&mut self, formatter: Formatter);

    fn formatter(&self) -> &Formatter;

    fn set_level(&mut self, level: LogLevel);

    fn level(&self) -> LogLevel;

    /// In synchronous mode a log call returns only after this handler has
    /// written the record.
    fn set_sync_mode(&mut self, sync: bool);

    fn is_sync(&self) -> bool;

    /// Push buffered output to the underlying sink
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
}

/// State shared by every handler variant
#[derive(Debug, Clone, Default)]
pub struct HandlerBase {
    pub formatter: Formatter,
    pub level: LogLevel,
    pub sync: bool,
}

impl HandlerBase {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler-local level gate
    #[inline]
    pub fn accepts(&self, record: &LogRecord) -> bool {
        record.level >= self.level
    }
}

/// Implements the configuration half of [`Handler`] by delegating to a
/// `base: HandlerBase` field.
macro_rules! delegate_handler_base {
    () => {
        fn set_formatter(&mut self, formatter: $crate::core::Formatter) {
            self.base.formatter = formatter;
        }

        fn formatter(&self) -> &$crate::core::Formatter {
            &self.base.formatter
        }

        fn set_level(&mut self, level: $crate::core::LogLevel) {
            self.base.level = level;
        }

        fn level(&self) -> $crate::core::LogLevel {
            self.base.level
        }

        fn set_sync_mode(&mut self, sync: bool) {
            self.base.sync = sync;
        }

        fn is_sync(&self) -> bool {
            self.base.sync
        }
    };
}

pub(crate) use delegate_handler_base;
