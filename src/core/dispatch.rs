//! Per-handler dispatch loop
//!
//! Every (logger, handler) pair gets one bounded FIFO queue and one worker
//! thread that owns the handler outright. Producers block when the queue is
//! full; nothing is ever dropped. A synchronous handler additionally makes
//! each producer wait until its own record has been written.

use super::{
    error::{LoggerError, Result},
    handler::Handler,
    log_record::LogRecord,
    metrics::DispatchMetrics,
};
use chrono::Local;
use crossbeam_channel::{bounded, Receiver, SendTimeoutError, Sender, TrySendError};
use parking_lot::Mutex;
use std::fmt::Display;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Queue capacity used when none is configured
pub const DEFAULT_QUEUE_CAPACITY: usize = 100;

/// Write a diagnostic line to stderr. Handler failures end up here instead of
/// reaching the caller.
pub(crate) fn report(tag: &str, message: impl Display) {
    eprintln!(
        "{} [LOGGER {}] {}",
        Local::now().format("%Y-%m-%d %H:%M:%S"),
        tag,
        message
    );
}

enum Command {
    Record {
        record: LogRecord,
        ack: Option<Sender<()>>,
    },
    Flush(Sender<()>),
    Shutdown,
}

pub struct DispatchLoop {
    name: String,
    sender: Sender<Command>,
    worker: Mutex<Option<thread::JoinHandle<()>>>,
    sync: bool,
    wants_call_site: bool,
    capacity: usize,
    metrics: Arc<DispatchMetrics>,
    stopped: AtomicBool,
}

impl DispatchLoop {
    /// Start the worker for `handler`.
    ///
    /// The handler's sync mode and formatter are sampled here: the worker
    /// owns the handler from now on.
    pub fn spawn(handler: Box<dyn Handler>, capacity: usize) -> Result<Self> {
        let (sender, receiver) = bounded(capacity);
        let name = handler.name().to_string();
        let sync = handler.is_sync();
        let wants_call_site = handler.formatter().needs_call_site();
        let metrics = Arc::new(DispatchMetrics::new());
        let worker_metrics = Arc::clone(&metrics);

        let worker = thread::Builder::new()
            .name(format!("logger-{}", name))
            .spawn(move || Self::run(handler, receiver, worker_metrics))
            .map_err(|e| {
                LoggerError::io_operation(
                    "spawn handler worker",
                    format!("Failed to start worker for '{}'", name),
                    e,
                )
            })?;

        Ok(Self {
            name,
            sender,
            worker: Mutex::new(Some(worker)),
            sync,
            wants_call_site,
            capacity,
            metrics,
            stopped: AtomicBool::new(false),
        })
    }

    fn run(mut handler: Box<dyn Handler>, receiver: Receiver<Command>, metrics: Arc<DispatchMetrics>) {
        while let Ok(command) = receiver.recv() {
            match command {
                Command::Record { record, ack } => {
                    Self::handle_record(handler.as_mut(), &record, &metrics);

                    // Buffered output goes out once the backlog is drained or a
                    // producer is waiting on this record.
                    if ack.is_some() || receiver.is_empty() {
                        Self::flush_handler(handler.as_mut());
                    }
                    if let Some(ack) = ack {
                        let _ = ack.send(());
                    }
                }
                Command::Flush(ack) => {
                    Self::flush_handler(handler.as_mut());
                    let _ = ack.send(());
                }
                Command::Shutdown => break,
            }
        }

        Self::flush_handler(handler.as_mut());
    }

    /// Run the handler with panic isolation so one bad record cannot stop
    /// the loop.
    fn handle_record(handler: &mut dyn Handler, record: &LogRecord, metrics: &DispatchMetrics) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.handle(record)));

        match result {
            Ok(Ok(())) => metrics.record_handled(),
            Ok(Err(e)) => {
                report("ERROR", format_args!("Handler '{}' failed to handle: {}", handler.name(), e));
                metrics.record_failed();
            }
            Err(panic_info) => {
                let panic_msg = if let Some(s) = panic_info.downcast_ref::<&str>() {
                    s.to_string()
                } else if let Some(s) = panic_info.downcast_ref::<String>() {
                    s.clone()
                } else {
                    "Unknown panic".to_string()
                };
                report(
                    "CRITICAL",
                    format_args!("Handler '{}' panicked: {}. The loop continues.", handler.name(), panic_msg),
                );
                metrics.record_failed();
            }
        }
    }

    fn flush_handler(handler: &mut dyn Handler) {
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| handler.flush()));
        match result {
            Ok(Ok(())) => {}
            Ok(Err(e)) => report("ERROR", format_args!("Handler '{}' flush failed: {}", handler.name(), e)),
            Err(_) => report("CRITICAL", format_args!("Handler '{}' panicked during flush", handler.name())),
        }
    }

    /// Queue a record for the worker.
    ///
    /// Blocks while the queue is full. For a synchronous handler, also blocks
    /// until the worker has handled this record.
    pub fn submit(&self, record: LogRecord) -> Result<()> {
        let (ack, done) = if self.sync {
            let (tx, rx) = bounded(1);
            (Some(tx), Some(rx))
        } else {
            (None, None)
        };

        let command = Command::Record { record, ack };
        match self.sender.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                self.metrics.record_blocked();
                self.sender
                    .send(command)
                    .map_err(|_| LoggerError::LoggerStopped(self.name.clone()))?;
            }
            Err(TrySendError::Disconnected(_)) => {
                return Err(LoggerError::LoggerStopped(self.name.clone()));
            }
        }
        self.metrics.record_submitted();

        if let Some(done) = done {
            done.recv()
                .map_err(|_| LoggerError::LoggerStopped(self.name.clone()))?;
        }
        Ok(())
    }

    /// Wait until every record submitted before this call has been handled
    /// and the handler flushed.
    pub fn flush(&self) -> Result<()> {
        let (tx, rx) = bounded(1);
        self.sender
            .send(Command::Flush(tx))
            .map_err(|_| LoggerError::LoggerStopped(self.name.clone()))?;
        rx.recv()
            .map_err(|_| LoggerError::LoggerStopped(self.name.clone()))
    }

    /// Drain the queue, flush and stop the worker.
    ///
    /// Returns `true` if the worker finished within `timeout`.
    pub fn shutdown(&self, timeout: Duration) -> bool {
        if self.stopped.swap(true, Ordering::SeqCst) {
            return self.worker.lock().is_none();
        }

        let start = Instant::now();
        match self.sender.send_timeout(Command::Shutdown, timeout) {
            Ok(()) | Err(SendTimeoutError::Disconnected(_)) => {}
            Err(SendTimeoutError::Timeout(_)) => {
                report(
                    "WARNING",
                    format_args!("Queue for '{}' still full after {:?}; shutdown abandoned.", self.name, timeout),
                );
                return false;
            }
        }

        let Some(handle) = self.worker.lock().take() else {
            return true;
        };

        loop {
            if handle.is_finished() {
                if let Err(e) = handle.join() {
                    report("ERROR", format_args!("Worker for '{}' panicked during shutdown: {:?}", self.name, e));
                    return false;
                }
                return true;
            }

            if start.elapsed() >= timeout {
                report(
                    "WARNING",
                    format_args!("Worker for '{}' did not finish within {:?}. Some logs may be lost.", self.name, timeout),
                );
                // Put the handle back so a later shutdown can still join it.
                *self.worker.lock() = Some(handle);
                return false;
            }

            thread::sleep(Duration::from_millis(5));
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_sync(&self) -> bool {
        self.sync
    }

    /// Whether records for this loop need call-site information
    pub fn wants_call_site(&self) -> bool {
        self.wants_call_site
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn metrics(&self) -> &DispatchMetrics {
        &self.metrics
    }
}
