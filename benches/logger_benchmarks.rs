//! Criterion benchmarks for rust_rotating_logger

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use rust_rotating_logger::core::{BacktraceResolver, FixedCallSite};
use rust_rotating_logger::prelude::*;
use std::sync::Arc;

/// Discards everything it is given
struct NullHandler {
    formatter: Formatter,
    level: LogLevel,
    sync: bool,
}

impl NullHandler {
    fn boxed(template: &str, sync: bool) -> Box<dyn Handler> {
        Box::new(Self {
            formatter: Formatter::compile(template).unwrap(),
            level: LogLevel::Debug,
            sync,
        })
    }
}

impl Handler for NullHandler {
    fn handle(&mut self, record: &LogRecord) -> Result<()> {
        black_box(self.formatter.format(record));
        Ok(())
    }

    fn set_formatter(&mut self, formatter: Formatter) {
        self.formatter = formatter;
    }

    fn formatter(&self) -> &Formatter {
        &self.formatter
    }

    fn set_level(&mut self, level: LogLevel) {
        self.level = level;
    }

    fn level(&self) -> LogLevel {
        self.level
    }

    fn set_sync_mode(&mut self, sync: bool) {
        self.sync = sync;
    }

    fn is_sync(&self) -> bool {
        self.sync
    }

    fn name(&self) -> &str {
        "null"
    }
}

// ============================================================================
// Formatter Benchmarks
// ============================================================================

fn bench_formatter(c: &mut Criterion) {
    let mut group = c.benchmark_group("formatter");
    group.throughput(Throughput::Elements(1));

    group.bench_function("compile_default", |b| {
        b.iter(|| black_box(Formatter::compile(black_box(rust_rotating_logger::DEFAULT_TEMPLATE)).unwrap()));
    });

    let formatter = Formatter::default();
    let record = LogRecord::new("bench", LogLevel::Info, "Test message")
        .with_call_site(CallSite::new("src/bench.rs", 42, "bench::main"));

    group.bench_function("format_default", |b| {
        b.iter(|| black_box(formatter.format(black_box(&record))));
    });

    let message_only = Formatter::compile("${message}").unwrap();
    group.bench_function("format_message_only", |b| {
        b.iter(|| black_box(message_only.format(black_box(&record))));
    });

    group.finish();
}

// ============================================================================
// Dispatch Benchmarks
// ============================================================================

fn bench_dispatch(c: &mut Criterion) {
    let mut group = c.benchmark_group("dispatch");
    group.throughput(Throughput::Elements(1));

    let fixed: Arc<dyn CallSiteResolver> = Arc::new(FixedCallSite(CallSite::unknown()));

    let async_logger = Logger::with_resolver("async", Arc::clone(&fixed)).with_queue_capacity(10_000);
    async_logger.add_handler(NullHandler::boxed("${message}", false)).unwrap();
    group.bench_function("async_submit", |b| {
        b.iter(|| async_logger.info(black_box("Info message")));
    });
    async_logger.flush().unwrap();

    let sync_logger = Logger::with_resolver("sync", Arc::clone(&fixed));
    sync_logger.add_handler(NullHandler::boxed("${message}", true)).unwrap();
    group.bench_function("sync_submit", |b| {
        b.iter(|| sync_logger.info(black_box("Info message")));
    });

    group.finish();
}

fn bench_call_site(c: &mut Criterion) {
    let mut group = c.benchmark_group("call_site");
    group.throughput(Throughput::Elements(1));

    let resolver = BacktraceResolver::new();
    group.bench_function("backtrace_resolve", |b| {
        b.iter(|| black_box(resolver.resolve()));
    });

    let logger = Logger::new("site");
    logger
        .add_handler(NullHandler::boxed("${filename}:${lineno} ${message}", true))
        .unwrap();
    group.bench_function("log_with_call_site", |b| {
        b.iter(|| logger.info(black_box("Info message")));
    });

    group.finish();
}

// ============================================================================
// Filtering Benchmarks
// ============================================================================

fn bench_level_filtering(c: &mut Criterion) {
    let mut group = c.benchmark_group("level_filtering");
    group.throughput(Throughput::Elements(1));

    let logger = Logger::new("filter");
    logger.add_handler(NullHandler::boxed("${message}", false)).unwrap();
    logger.set_level(LogLevel::Warn);

    group.bench_function("below_threshold", |b| {
        b.iter(|| logger.debug(black_box("This should be filtered")));
    });

    group.bench_function("below_threshold_macro", |b| {
        b.iter(|| rust_rotating_logger::debug!(logger, "filtered {}", black_box(7)));
    });

    group.finish();
}

// ============================================================================
// Criterion Configuration
// ============================================================================

criterion_group!(
    benches,
    bench_formatter,
    bench_dispatch,
    bench_call_site,
    bench_level_filtering
);

criterion_main!(benches);
