//! Execution metrics shared across all pipeline stages.
//!
//! Counters and time accumulators are plain atomics mutated with relaxed
//! ordering; nothing here serializes the stages. Durations accumulate as
//! integer microseconds so the hot paths never touch floating point.
//! `snapshot` is only meaningful after every stage thread has joined; the
//! join itself provides the necessary fencing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::Serialize;

/// Shared pipeline metrics. One instance per run, shared by reference
/// between the coordinator and every stage.
#[derive(Debug, Default)]
pub struct Metrics {
    read_events: AtomicU64,
    parsed_events: AtomicU64,
    invalid_events: AtomicU64,
    filtered_events: AtomicU64,
    aggregated_events: AtomicU64,

    reader_processing_us: AtomicU64,
    parser_processing_us: AtomicU64,
    rules_processing_us: AtomicU64,
    aggregator_processing_us: AtomicU64,
    writer_processing_us: AtomicU64,
    queue_overhead_us: AtomicU64,

    // Cold path: written once per run, never contended with the counters.
    start: Mutex<Option<Instant>>,
    end: Mutex<Option<Instant>>,
}

impl Metrics {
    /// Create a zeroed metrics instance.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the run start time. Called before any stage thread runs.
    pub fn mark_start(&self) {
        *self.start.lock() = Some(Instant::now());
    }

    /// Record the run end time. Called after the last stage join.
    pub fn mark_end(&self) {
        *self.end.lock() = Some(Instant::now());
    }

    /// Count one line pushed by the reader.
    pub fn increment_read(&self) {
        self.read_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one successfully parsed event.
    pub fn increment_parsed(&self) {
        self.parsed_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one dropped invalid record.
    pub fn increment_invalid(&self) {
        self.invalid_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one record rejected by the rules predicate.
    pub fn increment_filtered(&self) {
        self.filtered_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Count one event folded into the aggregation map.
    pub fn increment_aggregated(&self) {
        self.aggregated_events.fetch_add(1, Ordering::Relaxed);
    }

    /// Charge time to the reader stage.
    pub fn add_reader_time(&self, elapsed: Duration) {
        self.reader_processing_us
            .fetch_add(as_micros(elapsed), Ordering::Relaxed);
    }

    /// Charge time to the parser stage.
    pub fn add_parser_time(&self, elapsed: Duration) {
        self.parser_processing_us
            .fetch_add(as_micros(elapsed), Ordering::Relaxed);
    }

    /// Charge time to the rules stage.
    pub fn add_rules_time(&self, elapsed: Duration) {
        self.rules_processing_us
            .fetch_add(as_micros(elapsed), Ordering::Relaxed);
    }

    /// Charge time to the aggregator stage.
    pub fn add_aggregator_time(&self, elapsed: Duration) {
        self.aggregator_processing_us
            .fetch_add(as_micros(elapsed), Ordering::Relaxed);
    }

    /// Charge time to the writer stage.
    pub fn add_writer_time(&self, elapsed: Duration) {
        self.writer_processing_us
            .fetch_add(as_micros(elapsed), Ordering::Relaxed);
    }

    /// Charge time spent blocked in a downstream queue push.
    pub fn add_queue_overhead(&self, elapsed: Duration) {
        self.queue_overhead_us
            .fetch_add(as_micros(elapsed), Ordering::Relaxed);
    }

    /// Produce a consistent read of the final values.
    ///
    /// Throughput and duration are 0 unless both marks were recorded.
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        let aggregated_events = self.aggregated_events.load(Ordering::Relaxed);

        let duration_sec = match (*self.start.lock(), *self.end.lock()) {
            (Some(start), Some(end)) => end.saturating_duration_since(start).as_secs_f64(),
            _ => 0.0,
        };
        let throughput_per_sec = if duration_sec > 0.0 {
            aggregated_events as f64 / duration_sec
        } else {
            0.0
        };

        MetricsSnapshot {
            read_events: self.read_events.load(Ordering::Relaxed),
            parsed_events: self.parsed_events.load(Ordering::Relaxed),
            invalid_events: self.invalid_events.load(Ordering::Relaxed),
            filtered_events: self.filtered_events.load(Ordering::Relaxed),
            aggregated_events,
            reader_processing_ms: to_ms(&self.reader_processing_us),
            parser_processing_ms: to_ms(&self.parser_processing_us),
            rules_processing_ms: to_ms(&self.rules_processing_us),
            aggregator_processing_ms: to_ms(&self.aggregator_processing_us),
            writer_processing_ms: to_ms(&self.writer_processing_us),
            queue_overhead_ms: to_ms(&self.queue_overhead_us),
            duration_sec,
            throughput_per_sec,
        }
    }
}

fn as_micros(elapsed: Duration) -> u64 {
    u64::try_from(elapsed.as_micros()).unwrap_or(u64::MAX)
}

fn to_ms(accumulator: &AtomicU64) -> f64 {
    accumulator.load(Ordering::Relaxed) as f64 / 1_000.0
}

/// Read-only snapshot of a finished run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Lines pushed by the reader
    pub read_events: u64,
    /// Successfully parsed events
    pub parsed_events: u64,
    /// Records dropped as invalid
    pub invalid_events: u64,
    /// Records rejected by the rules predicate
    pub filtered_events: u64,
    /// Events folded into aggregates
    pub aggregated_events: u64,

    /// Reader processing time in milliseconds
    pub reader_processing_ms: f64,
    /// Parser processing time in milliseconds (summed over the pool)
    pub parser_processing_ms: f64,
    /// Rules processing time in milliseconds
    pub rules_processing_ms: f64,
    /// Aggregator processing time in milliseconds
    pub aggregator_processing_ms: f64,
    /// Writer processing time in milliseconds
    pub writer_processing_ms: f64,
    /// Time spent blocked pushing into queues, in milliseconds
    pub queue_overhead_ms: f64,

    /// Wall-clock duration between the start and end marks, in seconds
    pub duration_sec: f64,
    /// `aggregated_events / duration_sec`; 0 when the duration is 0
    pub throughput_per_sec: f64,
}
