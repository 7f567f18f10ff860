//! Name-keyed logger registry
//!
//! At most one [`Logger`] exists per name. Loggers looked up for the first
//! time get the default console handler; loggers built from a
//! [`LoggerConfig`] get only the handlers the configuration asks for.

use super::{
    call_site::{BacktraceResolver, CallSiteResolver},
    config::{create_handler, LoggerConfig},
    dispatch::{report, DEFAULT_QUEUE_CAPACITY},
    error::{LoggerError, Result},
    logger::Logger,
};
use crate::handlers::StreamHandler;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Name of the logger used by the process-wide shortcuts
pub const ROOT_LOGGER: &str = "root";

pub struct Registry {
    loggers: Mutex<HashMap<String, Arc<Logger>>>,
    root: Arc<Logger>,
    resolver: Arc<dyn CallSiteResolver>,
    queue_capacity: usize,
}

impl Registry {
    pub fn new() -> Self {
        Self::with_options(Arc::new(BacktraceResolver::new()), DEFAULT_QUEUE_CAPACITY)
    }

    /// Registry whose loggers share `resolver` and start loops with
    /// `queue_capacity` slots.
    pub fn with_options(resolver: Arc<dyn CallSiteResolver>, queue_capacity: usize) -> Self {
        let root = Arc::new(Self::build_logger(ROOT_LOGGER, &resolver, queue_capacity, true));
        let mut loggers = HashMap::new();
        loggers.insert(ROOT_LOGGER.to_string(), Arc::clone(&root));

        Self {
            loggers: Mutex::new(loggers),
            root,
            resolver,
            queue_capacity,
        }
    }

    fn build_logger(
        name: &str,
        resolver: &Arc<dyn CallSiteResolver>,
        queue_capacity: usize,
        with_console: bool,
    ) -> Logger {
        let logger = Logger::with_resolver(name, Arc::clone(resolver)).with_queue_capacity(queue_capacity);
        if with_console {
            if let Err(e) = logger.add_handler(Box::new(StreamHandler::console())) {
                report("ERROR", format_args!("Failed to attach console handler to '{}': {}", name, e));
            }
        }
        logger
    }

    pub fn root(&self) -> &Arc<Logger> {
        &self.root
    }

    /// Return the logger called `name`, creating it with the default console
    /// handler if it does not exist yet.
    pub fn get_logger(&self, name: &str) -> Arc<Logger> {
        if let Some(logger) = self.find(name) {
            return logger;
        }

        // Worker threads are spawned with the lock released.
        let fresh = Arc::new(Self::build_logger(name, &self.resolver, self.queue_capacity, true));

        let existing = {
            let mut loggers = self.loggers.lock();
            match loggers.get(name) {
                Some(logger) => Some(Arc::clone(logger)),
                None => {
                    loggers.insert(name.to_string(), Arc::clone(&fresh));
                    None
                }
            }
        };

        match existing {
            Some(logger) => {
                fresh.shutdown(Duration::from_secs(1));
                logger
            }
            None => fresh,
        }
    }

    /// Look up an existing logger without creating one
    pub fn find(&self, name: &str) -> Option<Arc<Logger>> {
        self.loggers.lock().get(name).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.loggers.lock().contains_key(name)
    }

    /// Register a logger built elsewhere.
    ///
    /// # Errors
    ///
    /// Returns [`LoggerError::DuplicateLogger`] if the name is taken
    pub fn register(&self, logger: Arc<Logger>) -> Result<()> {
        let mut loggers = self.loggers.lock();
        if loggers.contains_key(logger.name()) {
            return Err(LoggerError::DuplicateLogger(logger.name().to_string()));
        }
        loggers.insert(logger.name().to_string(), logger);
        Ok(())
    }

    /// Create logger `name` from `config`. Each name can be configured once.
    ///
    /// # Errors
    ///
    /// Fails without registering anything if the name is taken, the handler
    /// kind is unknown, the template does not compile or the log file cannot
    /// be opened.
    pub fn configure(&self, name: &str, config: &LoggerConfig) -> Result<Arc<Logger>> {
        if self.contains(name) {
            return Err(LoggerError::DuplicateLogger(name.to_string()));
        }

        let resolved = config.resolve(name)?;
        let handler = create_handler(&resolved)?;

        let logger = Self::build_logger(name, &self.resolver, self.queue_capacity, resolved.enable_console_log);
        logger.set_level(resolved.level);
        logger.add_handler(handler)?;
        let logger = Arc::new(logger);

        if let Err(e) = self.register(Arc::clone(&logger)) {
            // Lost a race with another configure for the same name.
            logger.shutdown(Duration::from_secs(1));
            return Err(e);
        }
        Ok(logger)
    }

    /// Names of every registered logger
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.loggers.lock().keys().cloned().collect();
        names.sort();
        names
    }

    fn snapshot(&self) -> Vec<Arc<Logger>> {
        self.loggers.lock().values().cloned().collect()
    }

    /// Flush every registered logger
    pub fn flush_all(&self) -> Result<()> {
        let mut first_error = None;
        for logger in self.snapshot() {
            if let Err(e) = logger.flush() {
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }

    /// Stop every registered logger's loops
    pub fn shutdown(&self, timeout: Duration) -> bool {
        let mut all_stopped = true;
        for logger in self.snapshot() {
            all_stopped &= logger.shutdown(timeout);
        }
        all_stopped
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::HandlerKind;
    use crate::core::log_level::LogLevel;
    use tempfile::tempdir;

    #[test]
    fn test_get_logger_is_idempotent() {
        let registry = Registry::new();
        let first = registry.get_logger("svc");
        let second = registry.get_logger("svc");

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.handler_count(), 1);
        assert!(first.loops()[0].is_sync());
    }

    #[test]
    fn test_concurrent_get_logger_shares_one_instance() {
        let registry = Arc::new(Registry::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let registry = Arc::clone(&registry);
                std::thread::spawn(move || registry.get_logger("shared"))
            })
            .collect();
        let loggers: Vec<Arc<Logger>> = handles.into_iter().map(|h| h.join().unwrap()).collect();

        for logger in &loggers {
            assert!(Arc::ptr_eq(logger, &loggers[0]));
        }
        assert!(Arc::ptr_eq(&loggers[0], &registry.get_logger("shared")));
        assert_eq!(loggers[0].handler_count(), 1);
        assert_eq!(registry.names(), vec!["root".to_string(), "shared".to_string()]);
    }

    #[test]
    fn test_root_is_registered() {
        let registry = Registry::new();
        assert!(Arc::ptr_eq(registry.root(), &registry.get_logger(ROOT_LOGGER)));
        assert_eq!(registry.names(), vec![ROOT_LOGGER.to_string()]);
    }

    #[test]
    fn test_register_rejects_duplicates() {
        let registry = Registry::new();
        registry.register(Arc::new(Logger::new("jobs"))).unwrap();

        let err = registry.register(Arc::new(Logger::new("jobs"))).unwrap_err();
        assert!(matches!(err, LoggerError::DuplicateLogger(name) if name == "jobs"));
    }

    #[test]
    fn test_configure_builds_file_logger_without_console() {
        let dir = tempdir().unwrap();
        let registry = Registry::new();
        let config = LoggerConfig {
            level: Some(LogLevel::Debug),
            format: Some("${levelname} ${message}".into()),
            log_path: Some(dir.path().to_path_buf()),
            sync_mode: true,
            ..LoggerConfig::new(HandlerKind::SizeRotateFile)
        };

        let logger = registry.configure("orders", &config).unwrap();
        assert_eq!(logger.handler_count(), 1);
        assert_eq!(logger.level(), LogLevel::Debug);

        logger.debug("placed");
        assert_eq!(
            std::fs::read_to_string(dir.path().join("orders.log")).unwrap(),
            "DEBUG placed\n"
        );
        assert!(Arc::ptr_eq(&logger, &registry.get_logger("orders")));
    }

    #[test]
    fn test_configure_with_console_adds_second_handler() {
        let dir = tempdir().unwrap();
        let registry = Registry::new();
        let config = LoggerConfig {
            log_path: Some(dir.path().to_path_buf()),
            enable_console_log: true,
            ..LoggerConfig::new(HandlerKind::TimeRotateFile)
        };

        let logger = registry.configure("both", &config).unwrap();
        assert_eq!(logger.handler_count(), 2);
    }

    #[test]
    fn test_configure_errors_leave_registry_untouched() {
        let registry = Registry::new();
        registry.get_logger("taken");

        let config = LoggerConfig::new(HandlerKind::Console);
        assert!(matches!(
            registry.configure("taken", &config),
            Err(LoggerError::DuplicateLogger(_))
        ));

        let bogus = LoggerConfig {
            handler: "NullHandler".into(),
            ..LoggerConfig::default()
        };
        assert!(matches!(
            registry.configure("fresh", &bogus),
            Err(LoggerError::UnknownHandler(_))
        ));
        assert!(!registry.contains("fresh"));
    }

    #[test]
    fn test_flush_and_shutdown_all() {
        let registry = Registry::new();
        registry.get_logger("a").info("one");
        registry.get_logger("b").info("two");

        assert!(registry.flush_all().is_ok());
        assert!(registry.shutdown(Duration::from_secs(5)));
    }
}
