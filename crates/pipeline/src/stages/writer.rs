//! Writer stage: aggregate results to NDJSON output.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, error};

use crate::metrics::Metrics;
use crate::queue::BoundedQueue;
use crate::types::AggregateResult;

/// Writer loop: one compact JSON object per result, LF terminated, keys in
/// declaration order (`key`, `count`, `sum`, `avg`).
///
/// When the output file cannot be opened, or a write fails mid-stream, the
/// stage keeps draining its input without writing so a bounded result
/// queue can never wedge the aggregator's flush.
pub fn run(output_file: &Path, input: &BoundedQueue<AggregateResult>, metrics: &Metrics) {
    let mut writer = match File::create(output_file) {
        Ok(file) => Some(BufWriter::new(file)),
        Err(source) => {
            error!(path = %output_file.display(), %source, "failed to open output file");
            None
        }
    };

    let mut written: u64 = 0;
    while let Some(result) = input.pop() {
        let Some(out) = writer.as_mut() else {
            continue;
        };

        let started = Instant::now();
        let outcome = serde_json::to_string(&result)
            .map_err(std::io::Error::from)
            .and_then(|line| writeln!(out, "{line}"));
        metrics.add_writer_time(started.elapsed());

        match outcome {
            Ok(()) => written += 1,
            Err(source) => {
                error!(%source, "failed to write aggregate result, discarding the rest");
                writer = None;
            }
        }
    }

    if let Some(mut out) = writer {
        if let Err(source) = out.flush() {
            error!(%source, "failed to flush output file");
        }
    }
    debug!(written, "writer finished");
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn result(key: &str, count: i64, sum: i64, avg: f64) -> AggregateResult {
        AggregateResult {
            key: key.to_string(),
            count,
            sum,
            avg,
        }
    }

    #[test]
    fn writes_one_compact_object_per_line() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregate-results.ndjson");

        let input = BoundedQueue::new(4);
        assert!(input.push(result("click", 2, 40, 20.0)));
        assert!(input.push(result("purchase", 1, 100, 100.0)));
        input.close();
        let metrics = Metrics::new();

        run(&path, &input, &metrics);

        let contents = std::fs::read_to_string(&path).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], r#"{"key":"click","count":2,"sum":40,"avg":20.0}"#);
        assert_eq!(
            lines[1],
            r#"{"key":"purchase","count":1,"sum":100,"avg":100.0}"#
        );
        assert!(contents.ends_with('\n'));
    }

    #[test]
    fn unopenable_output_drains_without_deadlock() {
        let queue = std::sync::Arc::new(BoundedQueue::new(1));
        let metrics = Metrics::new();

        // Capacity 1 with two results: the second push would block forever
        // if the writer stopped consuming on open failure.
        let producer = {
            let queue = std::sync::Arc::clone(&queue);
            std::thread::spawn(move || {
                assert!(queue.push(result("click", 1, 10, 10.0)));
                assert!(queue.push(result("purchase", 1, 100, 100.0)));
                queue.close();
            })
        };

        run(
            Path::new("/nonexistent/dir/aggregate-results.ndjson"),
            &queue,
            &metrics,
        );
        producer.join().unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn empty_input_leaves_an_empty_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("aggregate-results.ndjson");

        let input: BoundedQueue<AggregateResult> = BoundedQueue::new(4);
        input.close();
        let metrics = Metrics::new();

        run(&path, &input, &metrics);

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "");
    }
}
