//! Pipeline coordinator.
//!
//! Owns the four inter-stage queues, spawns one thread per stage task
//! (reader, N parser workers, rules, aggregator, writer) and joins them in
//! dataflow order. `Metrics::mark_start` runs before the first spawn and
//! `Metrics::mark_end` after the last join, so a snapshot taken afterwards
//! covers the whole run.

use std::sync::atomic::AtomicUsize;
use std::sync::Arc;
use std::thread::{self, JoinHandle};

use tracing::{debug, info};

use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};
use crate::metrics::Metrics;
use crate::queue::BoundedQueue;
use crate::stages::{aggregator, parser, reader, rules, writer};
use crate::types::{AggregateResult, EnrichedEvent, ParsedEvent, RawEvent};

/// Owns one pipeline run end to end.
#[derive(Debug)]
pub struct PipelineCoordinator {
    config: PipelineConfig,
}

impl PipelineCoordinator {
    /// Validate `config` and build a coordinator.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Config`] when the configuration is
    /// invalid.
    pub fn new(config: PipelineConfig) -> PipelineResult<Self> {
        let config = config.validated()?;
        Ok(Self { config })
    }

    /// The validated configuration.
    #[must_use]
    pub const fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run the pipeline to completion.
    ///
    /// Stage threads are spawned source-first and joined in the same
    /// order. Termination flows through queue closes: the reader closes
    /// the raw queue at EOF, the last parser worker out closes the parsed
    /// queue, and each single-task stage closes its own output.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Stage`] when a stage thread cannot be
    /// spawned or panics. Data-level problems (unreadable input, invalid
    /// records, unwritable output) are not errors here; they surface in
    /// the metrics and logs.
    pub fn run(&self, metrics: &Arc<Metrics>) -> PipelineResult<()> {
        let queue_size = self.config.queue_size;
        let raw_queue = Arc::new(BoundedQueue::<RawEvent>::new(queue_size));
        let parsed_queue = Arc::new(BoundedQueue::<ParsedEvent>::new(queue_size));
        let enriched_queue = Arc::new(BoundedQueue::<EnrichedEvent>::new(queue_size));
        let result_queue = Arc::new(BoundedQueue::<AggregateResult>::new(queue_size));
        let active_parsers = Arc::new(AtomicUsize::new(self.config.parser_threads));

        debug!(
            workers = self.config.parser_threads,
            queue_size, "starting pipeline"
        );
        metrics.mark_start();

        let mut handles: Vec<(&'static str, JoinHandle<()>)> =
            Vec::with_capacity(self.config.parser_threads + 4);
        let spawned = self.spawn_stages(
            &mut handles,
            &raw_queue,
            &parsed_queue,
            &enriched_queue,
            &result_queue,
            &active_parsers,
            metrics,
        );

        if let Err(source) = spawned {
            // Unblock whatever was already spawned before surfacing the
            // spawn failure.
            raw_queue.close();
            parsed_queue.close();
            enriched_queue.close();
            result_queue.close();
            for (_, handle) in handles {
                drop(handle.join());
            }
            return Err(PipelineError::Stage {
                stage: "spawn",
                reason: source.to_string(),
            });
        }

        let mut panicked: Option<&'static str> = None;
        for (stage, handle) in handles {
            if handle.join().is_err() && panicked.is_none() {
                panicked = Some(stage);
            }
        }

        metrics.mark_end();

        if let Some(stage) = panicked {
            return Err(PipelineError::Stage {
                stage,
                reason: "stage thread panicked".to_string(),
            });
        }

        info!("pipeline run complete");
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    fn spawn_stages(
        &self,
        handles: &mut Vec<(&'static str, JoinHandle<()>)>,
        raw_queue: &Arc<BoundedQueue<RawEvent>>,
        parsed_queue: &Arc<BoundedQueue<ParsedEvent>>,
        enriched_queue: &Arc<BoundedQueue<EnrichedEvent>>,
        result_queue: &Arc<BoundedQueue<AggregateResult>>,
        active_parsers: &Arc<AtomicUsize>,
        metrics: &Arc<Metrics>,
    ) -> std::io::Result<()> {
        {
            let input_file = self.config.input_file.clone();
            let raw_queue = Arc::clone(raw_queue);
            let metrics = Arc::clone(metrics);
            let handle = thread::Builder::new()
                .name("pipeline-reader".to_string())
                .spawn(move || reader::run(&input_file, &raw_queue, &metrics))?;
            handles.push(("reader", handle));
        }

        for index in 0..self.config.parser_threads {
            let raw_queue = Arc::clone(raw_queue);
            let parsed_queue = Arc::clone(parsed_queue);
            let metrics = Arc::clone(metrics);
            let active_parsers = Arc::clone(active_parsers);
            let handle = thread::Builder::new()
                .name(format!("pipeline-parser-{index}"))
                .spawn(move || {
                    parser::run(&raw_queue, &parsed_queue, &metrics, &active_parsers);
                })?;
            handles.push(("parser", handle));
        }

        {
            let parsed_queue = Arc::clone(parsed_queue);
            let enriched_queue = Arc::clone(enriched_queue);
            let metrics = Arc::clone(metrics);
            let handle = thread::Builder::new()
                .name("pipeline-rules".to_string())
                .spawn(move || rules::run(&parsed_queue, &enriched_queue, &metrics))?;
            handles.push(("rules", handle));
        }

        {
            let enriched_queue = Arc::clone(enriched_queue);
            let result_queue = Arc::clone(result_queue);
            let metrics = Arc::clone(metrics);
            let handle = thread::Builder::new()
                .name("pipeline-aggregator".to_string())
                .spawn(move || aggregator::run(&enriched_queue, &result_queue, &metrics))?;
            handles.push(("aggregator", handle));
        }

        {
            let output_file = self.config.output_file.clone();
            let result_queue = Arc::clone(result_queue);
            let metrics = Arc::clone(metrics);
            let handle = thread::Builder::new()
                .name("pipeline-writer".to_string())
                .spawn(move || writer::run(&output_file, &result_queue, &metrics))?;
            handles.push(("writer", handle));
        }

        Ok(())
    }
}
