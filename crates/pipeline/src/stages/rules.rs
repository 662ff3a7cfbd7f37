//! Rules stage: fixed filter predicate plus rule metadata.

use std::collections::HashMap;
use std::time::Instant;

use crate::metrics::Metrics;
use crate::queue::BoundedQueue;
use crate::types::{EnrichedEvent, EventType, ParsedEvent};

/// Minimum `value` an event must carry to pass the rules.
pub const MIN_VALUE: i64 = 10;

/// Metadata key naming the rule that admitted an event.
pub const RULE_KEY: &str = "rule";

/// Name of the one rule this stage applies.
pub const RULE_NAME: &str = "min_value_and_type";

/// Whether the fixed predicate accepts `event`.
///
/// The predicate is part of the pipeline contract: `value >= 10` and the
/// type is not `view`. Changing it is a breaking change for every
/// consumer of the aggregate output.
#[must_use]
pub fn passes(event: &ParsedEvent) -> bool {
    event.value >= MIN_VALUE && event.event_type != EventType::View
}

/// Rules stage loop.
///
/// Pops parsed events until the parsed queue drains or the enriched queue
/// rejects a push; rejected events are counted as filtered and dropped.
/// Closes the enriched queue on exit.
pub fn run(
    input: &BoundedQueue<ParsedEvent>,
    output: &BoundedQueue<EnrichedEvent>,
    metrics: &Metrics,
) {
    while let Some(event) = input.pop() {
        let started = Instant::now();
        if !passes(&event) {
            metrics.add_rules_time(started.elapsed());
            metrics.increment_filtered();
            continue;
        }

        let mut metadata = HashMap::new();
        metadata.insert(RULE_KEY.to_string(), RULE_NAME.to_string());
        let enriched = EnrichedEvent {
            event,
            metadata,
            passed_rules: true,
        };
        metrics.add_rules_time(started.elapsed());

        let push_started = Instant::now();
        let accepted = output.push(enriched);
        metrics.add_queue_overhead(push_started.elapsed());
        if !accepted {
            break;
        }
    }

    output.close();
}
