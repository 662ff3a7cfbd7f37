//! Reader stage: source file to raw-event queue.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Instant;

use tracing::{debug, error, warn};

use crate::metrics::Metrics;
use crate::queue::BoundedQueue;
use crate::types::RawEvent;

/// Read `input_file` line by line and push each line as a [`RawEvent`].
///
/// Sequence numbers start at 0 and increase by one per line; line contents
/// are not validated here. The raw queue is closed on return no matter how
/// the loop ends, and an unreadable input file closes it immediately so
/// the downstream stages drain and terminate.
pub fn run(input_file: &Path, output: &BoundedQueue<RawEvent>, metrics: &Metrics) {
    let file = match File::open(input_file) {
        Ok(file) => file,
        Err(source) => {
            error!(path = %input_file.display(), %source, "failed to open input file");
            output.close();
            return;
        }
    };

    let mut lines = BufReader::new(file).lines();
    let mut sequence: u64 = 0;
    loop {
        let started = Instant::now();
        let raw_text = match lines.next() {
            Some(Ok(line)) => line,
            Some(Err(source)) => {
                warn!(%source, "stopped reading input after I/O error");
                break;
            }
            None => break,
        };
        let event = RawEvent { raw_text, sequence };
        metrics.add_reader_time(started.elapsed());

        let push_started = Instant::now();
        let accepted = output.push(event);
        metrics.add_queue_overhead(push_started.elapsed());
        if !accepted {
            break;
        }
        metrics.increment_read();
        sequence += 1;
    }

    debug!(lines = sequence, "reader finished");
    output.close();
}
