//! `EventFlow` Pipeline - multi-stage NDJSON event aggregation.
//!
//! Ingests a newline-delimited JSON file of event records, parses and
//! validates each record in parallel, filters survivors through a rules
//! stage, aggregates by event type and writes per-type summaries back out
//! as NDJSON. Every stage runs on its own OS thread and the stages are
//! connected by bounded blocking queues, so a slow stage transparently
//! backpressures everything upstream.
//!
//! # Architecture
//!
//! ```text
//!                       +-- parser --+
//! reader -- raw_q ------+-- parser --+-- parsed_q -- rules -- enriched_q -- aggregator -- result_q -- writer
//!                       +-- parser --+
//!                        (N workers)
//! ```
//!
//! - [`queue::BoundedQueue`] - blocking MPMC queue with idempotent close
//! - [`stages`] - the five stage tasks (reader, parser pool, rules,
//!   aggregator, writer)
//! - [`metrics::Metrics`] - lock-free counters and per-stage timing shared
//!   by all stages
//! - [`coordinator::PipelineCoordinator`] - spawns and joins the stage
//!   threads in dataflow order
//! - [`generator`] - seeded synthetic input generation for benchmarks and
//!   load tests
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use eventflow_pipeline::{Metrics, PipelineConfig, PipelineCoordinator, PipelineResult};
//!
//! fn main() -> PipelineResult<()> {
//!     let config = PipelineConfig::new("events.ndjson");
//!     let coordinator = PipelineCoordinator::new(config)?;
//!
//!     let metrics = Arc::new(Metrics::new());
//!     coordinator.run(&metrics)?;
//!
//!     let snapshot = metrics.snapshot();
//!     println!("aggregated {} events", snapshot.aggregated_events);
//!     Ok(())
//! }
//! ```

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs
)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::multiple_crate_versions,
    clippy::cast_precision_loss,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::module_name_repetitions
)]

pub mod config;
pub mod coordinator;
pub mod error;
pub mod generator;
pub mod metrics;
pub mod queue;
pub mod stages;
pub mod types;

pub use config::PipelineConfig;
pub use coordinator::PipelineCoordinator;
pub use error::{PipelineError, PipelineResult};
pub use metrics::{Metrics, MetricsSnapshot};
pub use queue::BoundedQueue;
pub use types::{AggregateResult, EnrichedEvent, EventType, ParsedEvent, RawEvent};
