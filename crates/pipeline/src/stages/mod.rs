//! Pipeline stage tasks.
//!
//! One module per stage, each exposing a single `run` entry point that
//! loops until its input queue drains or a downstream push fails. Every
//! stage owns exactly one end of its queues and closes its output on exit,
//! which propagates termination through the whole dataflow; the parser
//! pool shares an active-worker counter so the parsed queue is closed
//! exactly once, by the last worker out.

pub mod aggregator;
pub mod parser;
pub mod reader;
pub mod rules;
pub mod writer;
