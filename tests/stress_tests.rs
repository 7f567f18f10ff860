//! Stress tests for the dispatch loops
//!
//! These tests verify:
//! - No record is dropped when producers outrun a small queue
//! - Concurrent producers against several handlers
//! - Size rotation under sustained load keeps every line

use rust_rotating_logger::prelude::*;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use std::thread;
use tempfile::TempDir;

fn file_handler(path: &Path) -> Box<dyn Handler> {
    let mut handler = FileHandler::new(path).expect("Failed to create handler");
    handler.set_formatter(Formatter::compile("${name} ${message}").expect("Failed to compile template"));
    Box::new(handler)
}

fn count_lines(dir: &Path, prefix: &str) -> usize {
    fs::read_dir(dir)
        .expect("Failed to read dir")
        .filter_map(|e| e.ok())
        .filter(|e| e.file_name().to_string_lossy().starts_with(prefix))
        .map(|e| fs::read_to_string(e.path()).expect("Failed to read file").lines().count())
        .sum()
}

/// A tiny queue only applies backpressure; nothing is lost
#[test]
fn test_rapid_burst_logging() {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("burst.log");

    let logger = Logger::new("burst").with_queue_capacity(2);
    logger.add_handler(file_handler(&log_file)).expect("Failed to add handler");

    for i in 0..5000 {
        logger.info(format!("Burst message {}", i));
    }
    logger.flush().expect("Failed to flush");

    let loops = logger.loops();
    let dispatch = &loops[0];
    assert_eq!(dispatch.metrics().submitted(), 5000);
    assert_eq!(dispatch.metrics().handled(), 5000);
    assert_eq!(dispatch.metrics().failed(), 0);

    let content = fs::read_to_string(&log_file).expect("Failed to read log file");
    assert_eq!(content.lines().count(), 5000);
}

/// Several threads, two handlers each receiving every admitted record
#[test]
fn test_concurrent_logging_multiple_handlers() {
    const THREADS: usize = 8;
    const PER_THREAD: usize = 500;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let logger = Arc::new(Logger::new("multi").with_queue_capacity(16));
    logger
        .add_handler(file_handler(&temp_dir.path().join("a.log")))
        .expect("Failed to add handler");
    logger
        .add_handler(file_handler(&temp_dir.path().join("b.log")))
        .expect("Failed to add handler");

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    if i % 2 == 0 {
                        logger.info(format!("thread {} message {}", t, i));
                    } else {
                        logger.debug(format!("thread {} filtered {}", t, i));
                    }
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    logger.flush().expect("Failed to flush");

    let expected = THREADS * PER_THREAD / 2;
    assert_eq!(count_lines(temp_dir.path(), "a.log"), expected);
    assert_eq!(count_lines(temp_dir.path(), "b.log"), expected);
    assert!(logger.shutdown(DEFAULT_SHUTDOWN_TIMEOUT));
}

/// Rotation interleaved with concurrent writes keeps every line somewhere
#[test]
fn test_size_rotation_under_load() {
    const THREADS: usize = 4;
    const PER_THREAD: usize = 300;

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let log_file = temp_dir.path().join("load.log");

    let mut handler = SizeRotateFileHandler::new(&log_file, 2048, 1000).expect("Failed to create handler");
    handler.set_formatter(Formatter::compile("${message}").expect("Failed to compile template"));

    let logger = Arc::new(Logger::new("load"));
    logger.add_handler(Box::new(handler)).expect("Failed to add handler");

    let handles: Vec<_> = (0..THREADS)
        .map(|t| {
            let logger = Arc::clone(&logger);
            thread::spawn(move || {
                for i in 0..PER_THREAD {
                    logger.warn(format!("worker {} wrote line {:05}", t, i));
                }
            })
        })
        .collect();
    for handle in handles {
        handle.join().expect("Thread panicked");
    }
    logger.flush().expect("Failed to flush");

    assert_eq!(count_lines(temp_dir.path(), "load.log"), THREADS * PER_THREAD);
    assert!(temp_dir.path().join("load.log_0001").exists());
    for entry in fs::read_dir(temp_dir.path()).expect("Failed to read dir") {
        let entry = entry.expect("Failed to read entry");
        assert!(entry.metadata().expect("Failed to stat").len() <= 2048);
    }
}
