//! Aggregator stage: fold enriched events into per-type totals.

use std::collections::HashMap;
use std::time::Instant;

use crate::metrics::Metrics;
use crate::queue::BoundedQueue;
use crate::types::{AggregateResult, EnrichedEvent, EventType};

#[derive(Debug, Default, Clone, Copy)]
struct Totals {
    count: i64,
    sum: i64,
}

/// Aggregator loop.
///
/// Folds every enriched event with `passed_rules` set into a per-type
/// `(count, sum)` map; events without the flag should never arrive here
/// and are ignored. Once the enriched queue drains, one
/// [`AggregateResult`] per distinct type is flushed downstream in map
/// iteration order, which is deliberately unspecified. A push failure
/// aborts the flush; the result queue is closed on exit either way.
pub fn run(
    input: &BoundedQueue<EnrichedEvent>,
    output: &BoundedQueue<AggregateResult>,
    metrics: &Metrics,
) {
    let mut totals: HashMap<EventType, Totals> = HashMap::new();

    while let Some(enriched) = input.pop() {
        let started = Instant::now();
        if enriched.passed_rules {
            let entry = totals.entry(enriched.event.event_type).or_default();
            entry.count += 1;
            entry.sum += enriched.event.value;
            metrics.increment_aggregated();
        }
        metrics.add_aggregator_time(started.elapsed());
    }

    for (event_type, entry) in &totals {
        let started = Instant::now();
        let result = AggregateResult {
            key: event_type.as_str().to_string(),
            count: entry.count,
            sum: entry.sum,
            avg: average(entry.count, entry.sum),
        };
        metrics.add_aggregator_time(started.elapsed());

        let push_started = Instant::now();
        let accepted = output.push(result);
        metrics.add_queue_overhead(push_started.elapsed());
        if !accepted {
            break;
        }
    }

    output.close();
}

/// `sum / count` as floating point. Zero-count entries cannot exist by
/// construction; guarded anyway.
#[must_use]
pub fn average(count: i64, sum: i64) -> f64 {
    if count == 0 {
        0.0
    } else {
        sum as f64 / count as f64
    }
}
