//! Log record structure

use super::call_site::CallSite;
use super::log_level::LogLevel;

/// One log event as handed to every attached dispatch loop.
///
/// The message body is rendered by the emitting thread before the record is
/// built. `call_site` stays `None` when no attached handler renders
/// call-site attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogRecord {
    pub logger_name: String,
    pub level: LogLevel,
    pub message: String,
    pub call_site: Option<CallSite>,
}

impl LogRecord {
    pub fn new(logger_name: impl Into<String>, level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            logger_name: logger_name.into(),
            level,
            message: message.into(),
            call_site: None,
        }
    }

    pub fn with_call_site(mut self, call_site: CallSite) -> Self {
        self.call_site = Some(call_site);
        self
    }
}
