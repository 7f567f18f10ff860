//! Process-wide registry and root-logger shortcuts
//!
//! ```no_run
//! use rust_rotating_logger::root;
//!
//! root::info("service starting");
//! let db = root::get_logger("db");
//! db.warn("pool exhausted");
//! ```

use crate::core::{Handler, LogLevel, Logger, LoggerConfig, Registry, Result};
use once_cell::sync::Lazy;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

static GLOBAL: Lazy<Registry> = Lazy::new(Registry::new);

/// The registry shared by the whole process
pub fn global() -> &'static Registry {
    &GLOBAL
}

pub fn get_logger(name: &str) -> Arc<Logger> {
    GLOBAL.get_logger(name)
}

pub fn configure(name: &str, config: &LoggerConfig) -> Result<Arc<Logger>> {
    GLOBAL.configure(name, config)
}

pub fn set_level(level: LogLevel) {
    GLOBAL.root().set_level(level);
}

pub fn add_handler(handler: Box<dyn Handler>) -> Result<()> {
    GLOBAL.root().add_handler(handler)
}

pub fn log(level: LogLevel, message: impl Into<String>) {
    GLOBAL.root().log(level, message);
}

pub fn debug(message: impl Into<String>) {
    GLOBAL.root().debug(message);
}

pub fn info(message: impl Into<String>) {
    GLOBAL.root().info(message);
}

pub fn warn(message: impl Into<String>) {
    GLOBAL.root().warn(message);
}

pub fn error(message: impl Into<String>) {
    GLOBAL.root().error(message);
}

pub fn exception(err: &dyn fmt::Display, message: impl AsRef<str>) {
    GLOBAL.root().exception(err, message);
}

/// Log on the root logger, flush every logger, then exit with status 1
pub fn fatal(message: impl Into<String>) -> ! {
    GLOBAL.root().log(LogLevel::Fatal, message);
    let _ = GLOBAL.flush_all();
    std::process::exit(1);
}

pub fn flush() -> Result<()> {
    GLOBAL.flush_all()
}

pub fn shutdown(timeout: Duration) -> bool {
    GLOBAL.shutdown(timeout)
}
