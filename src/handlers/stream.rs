//! Stream handler: writes rendered records to any byte sink

use crate::core::handler::{delegate_handler_base, Handler, HandlerBase};
use crate::core::{LogRecord, Result};
use std::io::Write;

pub struct StreamHandler {
    base: HandlerBase,
    output: Box<dyn Write + Send>,
    use_colors: bool,
}

impl StreamHandler {
    pub fn new(output: impl Write + Send + 'static) -> Self {
        Self {
            base: HandlerBase::new(),
            output: Box::new(output),
            use_colors: false,
        }
    }

    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }

    pub fn stderr() -> Self {
        Self::new(std::io::stderr())
    }

    /// The handler attached to loggers created on first lookup: stdout,
    /// default template, synchronous.
    pub fn console() -> Self {
        let mut handler = Self::stdout();
        handler.set_sync_mode(true);
        handler
    }

    /// Colour each line by level (requires the `console` feature)
    #[must_use]
    pub fn with_colors(mut self, use_colors: bool) -> Self {
        self.use_colors = use_colors;
        self
    }

    pub fn set_output(&mut self, output: impl Write + Send + 'static) {
        self.output = Box::new(output);
    }

    #[cfg(feature = "console")]
    fn colorize(&self, record: &LogRecord, bytes: Vec<u8>) -> Vec<u8> {
        use colored::Colorize;

        if !self.use_colors {
            return bytes;
        }
        let text = String::from_utf8_lossy(&bytes);
        let line = text.strip_suffix('\n').unwrap_or(&text);
        format!("{}\n", line.color(record.level.color_code())).into_bytes()
    }

    #[cfg(not(feature = "console"))]
    fn colorize(&self, _record: &LogRecord, bytes: Vec<u8>) -> Vec<u8> {
        bytes
    }
}

impl Handler for StreamHandler {
    fn handle(&mut self, record: &LogRecord) -> Result<()> {
        if !self.base.accepts(record) {
            return Ok(());
        }
        let bytes = self.base.formatter.format(record);
        let bytes = self.colorize(record, bytes);
        self.output.write_all(&bytes)?;
        Ok(())
    }

    delegate_handler_base!();

    fn flush(&mut self) -> Result<()> {
        self.output.flush()?;
        Ok(())
    }

    fn name(&self) -> &str {
        "stream"
    }
}
