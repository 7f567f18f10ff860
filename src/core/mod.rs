//! Core logger types and traits

pub mod call_site;
pub mod clock;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod formatter;
pub mod handler;
pub mod log_level;
pub mod log_record;
pub mod logger;
pub mod metrics;
pub mod registry;

pub use call_site::{BacktraceResolver, CallSite, CallSiteResolver, FixedCallSite};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{create_handler, HandlerKind, LoggerConfig, ResolvedConfig, GB, KB, MB};
pub use dispatch::{DispatchLoop, DEFAULT_QUEUE_CAPACITY};
pub use error::{LoggerError, Result};
pub use formatter::{CompileError, Field, Formatter, Segment, DEFAULT_TEMPLATE};
pub use handler::{Handler, HandlerBase};
pub use log_level::LogLevel;
pub use log_record::LogRecord;
pub use logger::{Logger, DEFAULT_SHUTDOWN_TIMEOUT};
pub use metrics::DispatchMetrics;
pub use registry::{Registry, ROOT_LOGGER};
