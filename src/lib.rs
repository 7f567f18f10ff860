//! # Rust Rotating Logger
//!
//! Named loggers filtered by severity, each fanning records out to handlers
//! that run on their own worker thread.
//!
//! ## Features
//!
//! - **Per-handler dispatch**: one bounded queue and one worker per handler,
//!   with an optional synchronous mode
//! - **Rotation**: by time interval or by file size, with bounded backups
//! - **Templates**: `${datetime} ${filename}:${lineno} ${message}` style
//!   formats compiled once per handler
//! - **Call sites**: file, line and function of the logging call
//!
//! ```
//! use rust_rotating_logger::prelude::*;
//!
//! let logger = Logger::new("app");
//! let mut handler = StreamHandler::stderr();
//! handler.set_formatter(Formatter::compile("[${levelname}] ${message}").unwrap());
//! handler.set_sync_mode(true);
//! logger.add_handler(Box::new(handler)).unwrap();
//!
//! logger.info("ready");
//! ```

pub mod core;
pub mod handlers;
pub mod macros;
pub mod root;

pub mod prelude {
    pub use crate::core::{
        CallSite, CallSiteResolver, Formatter, Handler, HandlerKind, LogLevel, LogRecord, Logger,
        LoggerConfig, LoggerError, Registry, Result, DEFAULT_SHUTDOWN_TIMEOUT,
    };
    pub use crate::handlers::{
        FileHandler, RotateInterval, SizeRotateFileHandler, StreamHandler, TimeRotateFileHandler,
    };
}

pub use self::core::{
    BacktraceResolver, CallSite, CallSiteResolver, Clock, CompileError, DispatchLoop,
    DispatchMetrics, FixedCallSite, Formatter, Handler, HandlerKind, LogLevel, LogRecord, Logger,
    LoggerConfig, LoggerError, ManualClock, Registry, ResolvedConfig, Result, DEFAULT_QUEUE_CAPACITY,
    DEFAULT_SHUTDOWN_TIMEOUT, DEFAULT_TEMPLATE,
};
pub use handlers::{
    FileHandler, RotateInterval, SizeRotateFileHandler, StreamHandler, TimeRotateFileHandler,
};
