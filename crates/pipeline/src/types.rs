//! Event record types flowing through the pipeline stages.
//!
//! Ownership of every event is exclusive to one stage at a time; a queue
//! handoff transfers it to the next stage.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Supported event categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventType {
    /// A click event
    Click,
    /// A view event
    View,
    /// A purchase event
    Purchase,
}

impl EventType {
    /// Parse a raw type string; `None` for unsupported types.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "click" => Some(Self::Click),
            "view" => Some(Self::View),
            "purchase" => Some(Self::Purchase),
            _ => None,
        }
    }

    /// Lowercase wire form, also used as the aggregation key.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Click => "click",
            Self::View => "view",
            Self::Purchase => "purchase",
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One raw input line plus its ingest sequence number.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawEvent {
    /// Unmodified line text
    pub raw_text: String,

    /// Unique within a run, strictly increasing from 0
    pub sequence: u64,
}

/// Event with all required fields extracted and validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedEvent {
    /// Event category
    pub event_type: EventType,

    /// User identifier
    pub user: String,

    /// Event value
    pub value: i64,

    /// Epoch milliseconds derived from the `ts` field; 0 when unparsable
    pub timestamp_ms: i64,

    /// Sequence number inherited from the raw event
    pub sequence: u64,

    /// Always `true` on events the parser emits
    pub valid: bool,
}

/// Parsed event that passed the rules stage, with rule metadata attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedEvent {
    /// The underlying event
    pub event: ParsedEvent,

    /// Rule metadata; contains at least `rule -> min_value_and_type`
    pub metadata: HashMap<String, String>,

    /// Whether the rules predicate accepted the event
    pub passed_rules: bool,
}

/// Per-type aggregate emitted when the aggregator flushes.
///
/// Serde field order is the on-wire key order: `key`, `count`, `sum`,
/// `avg`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AggregateResult {
    /// Aggregation key (the event type)
    pub key: String,

    /// Number of aggregated events, at least 1
    pub count: i64,

    /// Sum of event values
    pub sum: i64,

    /// `sum / count` as floating point
    pub avg: f64,
}
