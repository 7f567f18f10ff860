//! Named logger fanning records out to its dispatch loops

use super::{
    call_site::{BacktraceResolver, CallSiteResolver},
    dispatch::{report, DispatchLoop, DEFAULT_QUEUE_CAPACITY},
    error::Result,
    handler::Handler,
    log_level::LogLevel,
    log_record::LogRecord,
};
use parking_lot::RwLock;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Default timeout for [`Logger::shutdown`] (5 seconds)
pub const DEFAULT_SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

pub struct Logger {
    name: String,
    level: RwLock<LogLevel>,
    /// Replaced wholesale on `add_handler` so emitters never hold the lock
    /// while submitting.
    loops: RwLock<Arc<[Arc<DispatchLoop>]>>,
    resolver: Arc<dyn CallSiteResolver>,
    queue_capacity: usize,
}

impl Logger {
    /// Logger with no handlers, threshold `Info`
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_resolver(name, Arc::new(BacktraceResolver::new()))
    }

    #[must_use]
    pub fn with_resolver(name: impl Into<String>, resolver: Arc<dyn CallSiteResolver>) -> Self {
        Self {
            name: name.into(),
            level: RwLock::new(LogLevel::default()),
            loops: RwLock::new(Arc::from(Vec::new())),
            resolver,
            queue_capacity: DEFAULT_QUEUE_CAPACITY,
        }
    }

    /// Queue capacity for loops started by later `add_handler` calls
    #[must_use]
    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity.max(1);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_level(&self, level: LogLevel) {
        *self.level.write() = level;
    }

    pub fn level(&self) -> LogLevel {
        *self.level.read()
    }

    #[inline]
    pub fn is_enabled(&self, level: LogLevel) -> bool {
        level >= *self.level.read()
    }

    /// Attach `handler` and start its worker.
    ///
    /// # Errors
    ///
    /// Returns error if the worker thread cannot be spawned
    pub fn add_handler(&self, handler: Box<dyn Handler>) -> Result<()> {
        self.add_handler_with_capacity(handler, self.queue_capacity)
    }

    pub fn add_handler_with_capacity(&self, handler: Box<dyn Handler>, capacity: usize) -> Result<()> {
        let dispatch = Arc::new(DispatchLoop::spawn(handler, capacity.max(1))?);

        let mut loops = self.loops.write();
        let mut next: Vec<Arc<DispatchLoop>> = loops.iter().cloned().collect();
        next.push(dispatch);
        *loops = Arc::from(next);
        Ok(())
    }

    /// Snapshot of the attached loops
    pub fn loops(&self) -> Arc<[Arc<DispatchLoop>]> {
        self.loops.read().clone()
    }

    pub fn handler_count(&self) -> usize {
        self.loops.read().len()
    }

    pub fn log(&self, level: LogLevel, message: impl Into<String>) {
        if !self.is_enabled(level) {
            return;
        }
        self.emit(level, message.into());
    }

    /// Like [`Logger::log`], rendering `args` only when the level passes
    pub fn log_fmt(&self, level: LogLevel, args: fmt::Arguments<'_>) {
        if !self.is_enabled(level) {
            return;
        }
        self.emit(level, fmt::format(args));
    }

    pub fn debug(&self, message: impl Into<String>) {
        self.log(LogLevel::Debug, message);
    }

    pub fn info(&self, message: impl Into<String>) {
        self.log(LogLevel::Info, message);
    }

    pub fn warn(&self, message: impl Into<String>) {
        self.log(LogLevel::Warn, message);
    }

    pub fn error(&self, message: impl Into<String>) {
        self.log(LogLevel::Error, message);
    }

    /// Log `message` at `Error` with the error appended
    pub fn exception(&self, err: &dyn fmt::Display, message: impl AsRef<str>) {
        if !self.is_enabled(LogLevel::Error) {
            return;
        }
        self.emit(LogLevel::Error, format!("{}, err: {}", message.as_ref(), err));
    }

    /// Log at `Fatal`, wait for every handler to finish writing, then exit
    /// the process with status 1.
    pub fn fatal(&self, message: impl Into<String>) -> ! {
        self.log(LogLevel::Fatal, message);
        let _ = self.flush();
        std::process::exit(1);
    }

    fn emit(&self, level: LogLevel, message: String) {
        let loops = self.loops();
        let Some((last, rest)) = loops.split_last() else {
            return;
        };

        let mut record = LogRecord::new(self.name.as_str(), level, message);
        if loops.iter().any(|dispatch| dispatch.wants_call_site()) {
            record.call_site = Some(self.resolver.resolve());
        }

        for dispatch in rest {
            Self::submit(dispatch, record.clone());
        }
        Self::submit(last, record);
    }

    fn submit(dispatch: &DispatchLoop, record: LogRecord) {
        if let Err(e) = dispatch.submit(record) {
            report("WARNING", format_args!("Dropping record for handler '{}': {}", dispatch.name(), e));
        }
    }

    /// Block until every record logged so far has been written.
    ///
    /// # Errors
    ///
    /// Returns the first failure; remaining loops are still flushed
    pub fn flush(&self) -> Result<()> {
        let mut first_error = None;
        for dispatch in self.loops().iter() {
            if let Err(e) = dispatch.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Drain and stop every loop. Returns `true` if all stopped within
    /// `timeout` each.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let mut all_stopped = true;
        for dispatch in self.loops().iter() {
            all_stopped &= dispatch.shutdown(timeout);
        }
        all_stopped
    }
}

impl fmt::Debug for Logger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Logger")
            .field("name", &self.name)
            .field("level", &self.level())
            .field("handlers", &self.handler_count())
            .field("queue_capacity", &self.queue_capacity)
            .finish()
    }
}
