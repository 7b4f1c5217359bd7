//! Stress drivers for the resource manager.
//!
//! These run many operations, possibly from many threads, and report what
//! succeeded. Contention failures are expected under load and counted
//! separately from real failures.

use blobstate_resources::{PutRequest, ResourceManager};
use std::thread;
use std::time::{Duration, Instant};

/// Result of a stress test run.
#[derive(Debug, Clone)]
pub struct StressTestResult {
    /// Total operations performed.
    pub total_ops: usize,
    /// Successful operations.
    pub successful_ops: usize,
    /// Operations that gave up because of concurrent writers.
    pub contended_ops: usize,
    /// Operations that failed for any other reason.
    pub failed_ops: usize,
    /// Total duration.
    pub duration: Duration,
    /// Operations per second.
    pub ops_per_second: f64,
}

impl StressTestResult {
    /// Creates a new result.
    pub fn new(successful: usize, contended: usize, failed: usize, duration: Duration) -> Self {
        let total = successful + contended + failed;
        let ops_per_second = if duration.as_secs_f64() > 0.0 {
            total as f64 / duration.as_secs_f64()
        } else {
            0.0
        };

        Self {
            total_ops: total,
            successful_ops: successful,
            contended_ops: contended,
            failed_ops: failed,
            duration,
            ops_per_second,
        }
    }

    /// Prints a summary of the test.
    pub fn print_summary(&self, name: &str) {
        println!("\n=== {name} ===");
        println!("Total operations: {}", self.total_ops);
        println!("Successful: {}", self.successful_ops);
        println!("Contended: {}", self.contended_ops);
        println!("Failed: {}", self.failed_ops);
        println!("Duration: {:?}", self.duration);
        println!("Throughput: {:.2} ops/sec", self.ops_per_second);
    }
}

/// Configuration for stress tests.
#[derive(Debug, Clone)]
pub struct StressConfig {
    /// Operations per thread.
    pub operations: usize,
    /// Number of concurrent threads.
    pub threads: usize,
    /// Size of each stored payload in bytes.
    pub content_size: usize,
    /// Resource path the writers compete for.
    pub path: String,
}

impl Default for StressConfig {
    fn default() -> Self {
        Self {
            operations: 50,
            threads: 4,
            content_size: 256,
            path: "/blob/s/trusty/contended".to_string(),
        }
    }
}

/// Payload written by `thread` for its `op`-th operation.
fn payload(thread: usize, op: usize, size: usize) -> Vec<u8> {
    let tag = format!("{thread}:{op}:");
    tag.bytes().cycle().take(size.max(tag.len())).collect()
}

/// Runs `config.threads` writers that all put to `config.path`.
pub fn stress_same_path(manager: &ResourceManager, config: &StressConfig) -> StressTestResult {
    let start = Instant::now();

    let per_thread: Vec<(usize, usize, usize)> = thread::scope(|scope| {
        let handles: Vec<_> = (0..config.threads)
            .map(|t| {
                let manager = manager.clone();
                scope.spawn(move || {
                    let (mut ok, mut contended, mut failed) = (0, 0, 0);
                    for op in 0..config.operations {
                        let content = payload(t, op, config.content_size);
                        match manager.put(&PutRequest::new(config.path.as_str()), &content[..]) {
                            Ok(_) => ok += 1,
                            Err(e) if e.is_excessive_contention() => contended += 1,
                            Err(_) => failed += 1,
                        }
                    }
                    (ok, contended, failed)
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or((0, 0, config.operations)))
            .collect()
    });

    let (ok, contended, failed) = per_thread
        .into_iter()
        .fold((0, 0, 0), |acc, (o, c, f)| (acc.0 + o, acc.1 + c, acc.2 + f));
    StressTestResult::new(ok, contended, failed, start.elapsed())
}

/// Single-threaded put/get/delete cycle over `paths`.
///
/// A get or delete of a path not currently stored counts as a success when
/// it reports not-found.
pub fn stress_mixed_operations(
    manager: &ResourceManager,
    paths: &[String],
    config: &StressConfig,
) -> StressTestResult {
    let start = Instant::now();
    let (mut ok, mut failed) = (0usize, 0usize);

    for op in 0..config.operations {
        let Some(path) = paths.get(op % paths.len().max(1)) else {
            break;
        };
        let result = match op % 3 {
            0 => manager
                .put(
                    &PutRequest::new(path.as_str()),
                    &payload(0, op, config.content_size)[..],
                )
                .map(|_| ()),
            1 => manager.get(path).map(|_| ()),
            _ => manager.delete(path),
        };
        match result {
            Ok(()) => ok += 1,
            Err(e) if e.is_not_found() => ok += 1,
            Err(_) => failed += 1,
        }
    }

    StressTestResult::new(ok, 0, failed, start.elapsed())
}
