//! Parser stage: raw lines to validated events.
//!
//! Field extraction is deliberate substring scanning, not a JSON parser: a
//! string field is the text between the two quotes following the key's
//! colon, an integer field is the first `-`/digit run after the colon.
//! The scheme tolerates extra fields and whitespace but is fooled by keys
//! appearing inside string values, nested objects and exponent-spelled
//! numbers; such lines become invalid records or carry whatever the first
//! match yields. Replacing it with a real JSON parser would change which
//! inputs are accepted and is a contract change.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use chrono::NaiveDateTime;
use tracing::debug;

use crate::metrics::Metrics;
use crate::queue::BoundedQueue;
use crate::types::{EventType, ParsedEvent, RawEvent};

const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";
const TIMESTAMP_LEN: usize = 19;

/// Parser worker loop.
///
/// Pops raw events until the raw queue drains or the parsed queue rejects
/// a push. Invalid records are counted and dropped without stopping the
/// stream; their extraction time is still charged to the parser.
///
/// `active_parsers` carries the fan-in termination invariant: the worker
/// that decrements it from 1 to 0 is the last one out and closes the
/// parsed queue, exactly once per pool.
pub fn run(
    input: &BoundedQueue<RawEvent>,
    output: &BoundedQueue<ParsedEvent>,
    metrics: &Metrics,
    active_parsers: &AtomicUsize,
) {
    while let Some(raw) = input.pop() {
        let started = Instant::now();
        let parsed = parse_event(&raw);
        metrics.add_parser_time(started.elapsed());

        let Some(event) = parsed else {
            metrics.increment_invalid();
            continue;
        };
        metrics.increment_parsed();

        let push_started = Instant::now();
        let accepted = output.push(event);
        metrics.add_queue_overhead(push_started.elapsed());
        if !accepted {
            break;
        }
    }

    if active_parsers.fetch_sub(1, Ordering::AcqRel) == 1 {
        debug!("last parser worker closing the parsed queue");
        output.close();
    }
}

/// Extract and validate the required fields of one raw line.
///
/// Returns `None` when `type`, `user` or `value` is missing or the type is
/// unsupported. A missing or malformed `ts` never invalidates the record;
/// it only zeroes `timestamp_ms`.
#[must_use]
pub fn parse_event(raw: &RawEvent) -> Option<ParsedEvent> {
    let type_field = extract_string_field(&raw.raw_text, "type")?;
    let event_type = EventType::parse(&type_field)?;
    let user = extract_string_field(&raw.raw_text, "user")?;
    let value = extract_int_field(&raw.raw_text, "value")?;
    let timestamp_ms = extract_string_field(&raw.raw_text, "ts")
        .map_or(0, |ts| parse_timestamp_ms(&ts));

    Some(ParsedEvent {
        event_type,
        user,
        value,
        timestamp_ms,
        sequence: raw.sequence,
        valid: true,
    })
}

/// Locate `"key"`, the colon after it, then return the text between the
/// next two double quotes.
#[must_use]
pub fn extract_string_field(raw: &str, key: &str) -> Option<String> {
    let rest = seek_value(raw, key)?;
    let open = rest.find('"')?;
    let value = &rest[open + 1..];
    let close = value.find('"')?;
    Some(value[..close].to_string())
}

/// Locate `"key"`, the colon after it, then parse the first run of `-` or
/// digit characters as a signed 64-bit integer.
#[must_use]
pub fn extract_int_field(raw: &str, key: &str) -> Option<i64> {
    let rest = seek_value(raw, key)?;
    let is_numeric = |c: char| c == '-' || c.is_ascii_digit();
    let start = rest.find(is_numeric)?;
    let digits = &rest[start..];
    let end = digits
        .find(|c: char| !is_numeric(c))
        .unwrap_or(digits.len());
    digits[..end].parse().ok()
}

/// Parse the first 19 characters as `YYYY-MM-DDTHH:MM:SS` interpreted as
/// UTC and convert to epoch milliseconds. Fractional seconds, `Z` and
/// offset suffixes past the 19th character are ignored; any failure yields
/// 0.
#[must_use]
pub fn parse_timestamp_ms(ts: &str) -> i64 {
    let Some(prefix) = ts.get(..TIMESTAMP_LEN) else {
        return 0;
    };
    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT)
        .map_or(0, |datetime| datetime.and_utc().timestamp_millis())
}

/// Position the scan just after the colon following `"key"`. The first
/// occurrence of the quoted key wins, even inside a string value.
fn seek_value<'a>(raw: &'a str, key: &str) -> Option<&'a str> {
    let needle = format!("\"{key}\"");
    let key_pos = raw.find(&needle)?;
    let after_key = &raw[key_pos + needle.len()..];
    let colon = after_key.find(':')?;
    Some(&after_key[colon + 1..])
}
