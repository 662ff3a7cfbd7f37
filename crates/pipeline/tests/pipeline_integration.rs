//! End-to-end pipeline runs over temporary files.
//!
//! Aggregate output order is unspecified (hash map flush), so every
//! comparison here treats the output as a set of (key, count, sum)
//! triples.

use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use chrono::TimeZone;
use eventflow_pipeline::generator::{generate_events, GeneratorConfig};
use eventflow_pipeline::{Metrics, MetricsSnapshot, PipelineConfig, PipelineCoordinator};

fn run_pipeline(
    lines: &[String],
    parser_threads: usize,
    queue_size: usize,
) -> (Vec<serde_json::Value>, MetricsSnapshot) {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("events.ndjson");
    let contents = if lines.is_empty() {
        String::new()
    } else {
        lines.join("\n") + "\n"
    };
    fs::write(&input, contents).unwrap();
    run_pipeline_on(&input, dir.path(), parser_threads, queue_size)
}

fn run_pipeline_on(
    input: &Path,
    scratch: &Path,
    parser_threads: usize,
    queue_size: usize,
) -> (Vec<serde_json::Value>, MetricsSnapshot) {
    let output = scratch.join("aggregate-results.ndjson");
    let config = PipelineConfig {
        input_file: input.to_path_buf(),
        output_file: output.clone(),
        parser_threads,
        queue_size,
    };
    let coordinator = PipelineCoordinator::new(config).unwrap();
    let metrics = Arc::new(Metrics::new());
    coordinator.run(&metrics).unwrap();

    let contents = fs::read_to_string(&output).unwrap();
    let results = contents
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    (results, metrics.snapshot())
}

fn owned(lines: &[&str]) -> Vec<String> {
    lines.iter().map(|line| (*line).to_string()).collect()
}

fn triples(results: &[serde_json::Value]) -> HashSet<(String, i64, i64)> {
    results
        .iter()
        .map(|value| {
            (
                value["key"].as_str().unwrap().to_string(),
                value["count"].as_i64().unwrap(),
                value["sum"].as_i64().unwrap(),
            )
        })
        .collect()
}

#[test]
fn s1_single_click_survives() {
    let (results, snapshot) = run_pipeline(
        &owned(&[r#"{"ts":"2024-01-01T00:00:00Z","type":"click","user":"u1","value":10}"#]),
        2,
        16,
    );

    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["key"], "click");
    assert_eq!(results[0]["count"], 1);
    assert_eq!(results[0]["sum"], 10);
    assert!((results[0]["avg"].as_f64().unwrap() - 10.0).abs() < 1e-9);

    assert_eq!(snapshot.read_events, 1);
    assert_eq!(snapshot.parsed_events, 1);
    assert_eq!(snapshot.aggregated_events, 1);
    assert_eq!(snapshot.invalid_events, 0);
    assert_eq!(snapshot.filtered_events, 0);
}

#[test]
fn s2_view_is_filtered() {
    let (results, snapshot) = run_pipeline(
        &owned(&[r#"{"ts":"2024-01-01T00:00:00Z","type":"view","user":"u1","value":100}"#]),
        2,
        16,
    );

    assert!(results.is_empty());
    assert_eq!(snapshot.filtered_events, 1);
    assert_eq!(snapshot.aggregated_events, 0);
}

#[test]
fn s3_value_below_threshold_is_filtered() {
    let (results, snapshot) = run_pipeline(
        &owned(&[r#"{"ts":"2024-01-01T00:00:00Z","type":"click","user":"u1","value":9}"#]),
        2,
        16,
    );

    assert!(results.is_empty());
    assert_eq!(snapshot.filtered_events, 1);
}

#[test]
fn s4_unsupported_type_is_invalid() {
    let (results, snapshot) = run_pipeline(
        &owned(&[r#"{"ts":"2024-01-01T00:00:00Z","type":"login","user":"u1","value":50}"#]),
        2,
        16,
    );

    assert!(results.is_empty());
    assert_eq!(snapshot.invalid_events, 1);
    assert_eq!(snapshot.parsed_events, 0);
}

#[test]
fn s5_mixed_aggregation() {
    let (results, snapshot) = run_pipeline(
        &owned(&[
            r#"{"ts":"2024-01-01T00:00:00Z","type":"click","user":"u","value":10}"#,
            r#"{"ts":"2024-01-01T00:00:00Z","type":"click","user":"u","value":30}"#,
            r#"{"ts":"2024-01-01T00:00:00Z","type":"purchase","user":"u","value":100}"#,
        ]),
        4,
        16,
    );

    let expected: HashSet<(String, i64, i64)> = [
        ("click".to_string(), 2, 40),
        ("purchase".to_string(), 1, 100),
    ]
    .into_iter()
    .collect();
    assert_eq!(triples(&results), expected);

    for result in &results {
        let avg = result["avg"].as_f64().unwrap();
        let count = result["count"].as_i64().unwrap() as f64;
        let sum = result["sum"].as_i64().unwrap() as f64;
        assert!((avg * count - sum).abs() < 1e-9 * sum.abs().max(1.0));
    }
    assert_eq!(snapshot.aggregated_events, 3);
}

#[test]
fn s6_invalid_timestamp_still_aggregates() {
    let (results, snapshot) = run_pipeline(
        &owned(&[r#"{"ts":"not-a-date","type":"click","user":"u","value":10}"#]),
        2,
        16,
    );

    let expected: HashSet<(String, i64, i64)> =
        [("click".to_string(), 1, 10)].into_iter().collect();
    assert_eq!(triples(&results), expected);
    assert_eq!(snapshot.invalid_events, 0);
}

#[test]
fn empty_input_produces_an_empty_output_file() {
    let (results, snapshot) = run_pipeline(&[], 3, 16);

    assert!(results.is_empty());
    assert_eq!(snapshot.read_events, 0);
    assert_eq!(snapshot.aggregated_events, 0);
}

#[test]
fn missing_input_file_terminates_cleanly() {
    let dir = tempfile::tempdir().unwrap();
    let (results, snapshot) = run_pipeline_on(
        &dir.path().join("does-not-exist.ndjson"),
        dir.path(),
        2,
        16,
    );

    assert!(results.is_empty());
    assert_eq!(snapshot.read_events, 0);
    assert_eq!(snapshot.parsed_events, 0);
}

#[test]
fn counters_conserve_across_stages() {
    let mut lines = Vec::new();
    for i in 0..300_i64 {
        match i % 5 {
            // Survives: click or purchase with value >= 10.
            0 => lines.push(format!(
                r#"{{"ts":"2024-01-01T00:00:00Z","type":"click","user":"u{i}","value":{}}}"#,
                10 + i
            )),
            1 => lines.push(format!(
                r#"{{"ts":"2024-01-01T00:00:00Z","type":"purchase","user":"u{i}","value":{}}}"#,
                20 + i
            )),
            // Filtered: view, or value below the threshold.
            2 => lines.push(format!(
                r#"{{"ts":"2024-01-01T00:00:00Z","type":"view","user":"u{i}","value":99}}"#
            )),
            3 => lines.push(format!(
                r#"{{"ts":"2024-01-01T00:00:00Z","type":"click","user":"u{i}","value":3}}"#
            )),
            // Invalid: unsupported type.
            _ => lines.push(format!(
                r#"{{"ts":"2024-01-01T00:00:00Z","type":"login","user":"u{i}","value":50}}"#
            )),
        }
    }

    let (results, snapshot) = run_pipeline(&lines, 4, 32);

    assert_eq!(snapshot.read_events, 300);
    assert_eq!(
        snapshot.read_events,
        snapshot.parsed_events + snapshot.invalid_events
    );
    assert_eq!(
        snapshot.parsed_events,
        snapshot.filtered_events + snapshot.aggregated_events
    );

    let emitted: i64 = results
        .iter()
        .map(|value| value["count"].as_i64().unwrap())
        .sum();
    assert_eq!(emitted as u64, snapshot.aggregated_events);
}

#[test]
fn aggregate_sums_conserve_values() {
    let values = [10, 15, 20, 25, 100, 200];
    let lines: Vec<String> = values
        .iter()
        .map(|value| {
            format!(r#"{{"ts":"2024-01-01T00:00:00Z","type":"purchase","user":"u","value":{value}}}"#)
        })
        .collect();

    let (results, _) = run_pipeline(&lines, 3, 8);

    let total: i64 = results
        .iter()
        .map(|value| value["sum"].as_i64().unwrap())
        .sum();
    assert_eq!(total, values.iter().sum::<i64>());
}

#[test]
fn only_click_and_purchase_keys_are_emitted() {
    let mut lines = Vec::new();
    for i in 0..90_i64 {
        let event_type = ["click", "view", "purchase"][(i % 3) as usize];
        lines.push(format!(
            r#"{{"ts":"2024-01-01T00:00:00Z","type":"{event_type}","user":"u","value":{}}}"#,
            10 + i
        ));
    }

    let (results, _) = run_pipeline(&lines, 4, 16);

    for result in &results {
        let key = result["key"].as_str().unwrap();
        assert!(key == "click" || key == "purchase", "unexpected key {key}");
    }
}

#[test]
fn queue_size_one_terminates_with_the_same_aggregates() {
    let mut lines = Vec::new();
    for i in 0..1_200_i64 {
        let event_type = ["click", "view", "purchase"][(i % 3) as usize];
        lines.push(format!(
            r#"{{"ts":"2024-01-01T00:00:00Z","type":"{event_type}","user":"u{}","value":{}}}"#,
            i % 7,
            i % 40
        ));
    }

    let (tiny, _) = run_pipeline(&lines, 4, 1);
    let (wide, _) = run_pipeline(&lines, 4, 10_000);

    assert_eq!(triples(&tiny), triples(&wide));
    assert!(!triples(&wide).is_empty());
}

#[test]
fn aggregates_are_deterministic_across_worker_counts() {
    let mut lines = Vec::new();
    for i in 0..500_i64 {
        let event_type = ["click", "purchase", "view", "click"][(i % 4) as usize];
        lines.push(format!(
            r#"{{"ts":"2024-01-01T00:00:00Z","type":"{event_type}","user":"u{}","value":{}}}"#,
            i % 11,
            i % 60
        ));
    }

    let (single, _) = run_pipeline(&lines, 1, 64);
    let (few, _) = run_pipeline(&lines, 2, 64);
    let (many, _) = run_pipeline(&lines, 8, 64);

    assert_eq!(triples(&single), triples(&few));
    assert_eq!(triples(&few), triples(&many));
}

#[test]
fn unbounded_queues_still_terminate() {
    let lines = owned(&[
        r#"{"ts":"2024-01-01T00:00:00Z","type":"click","user":"u1","value":10}"#,
        r#"{"ts":"2024-01-01T00:00:00Z","type":"purchase","user":"u2","value":50}"#,
    ]);

    let (results, snapshot) = run_pipeline(&lines, 2, 0);

    assert_eq!(results.len(), 2);
    assert_eq!(snapshot.aggregated_events, 2);
}

#[test]
fn generated_input_preserves_the_conservation_invariants() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("events.ndjson");
    let config = GeneratorConfig {
        seed: Some(7),
        start_time: Some(chrono::Utc.with_ymd_and_hms(2024, 6, 1, 12, 0, 0).unwrap()),
        ..GeneratorConfig::new(&input, 2_000, 100)
    };
    generate_events(&config).unwrap();

    let (results, snapshot) = run_pipeline_on(&input, dir.path(), 4, 64);

    assert_eq!(snapshot.read_events, 2_000);
    assert_eq!(
        snapshot.read_events,
        snapshot.parsed_events + snapshot.invalid_events
    );
    assert_eq!(
        snapshot.parsed_events,
        snapshot.filtered_events + snapshot.aggregated_events
    );
    let emitted: i64 = results
        .iter()
        .map(|value| value["count"].as_i64().unwrap())
        .sum();
    assert_eq!(emitted as u64, snapshot.aggregated_events);

    // Generated values span 1..=100 and types are uniform, so both
    // surviving keys are present with overwhelming probability.
    let keys: HashSet<&str> = results
        .iter()
        .map(|value| value["key"].as_str().unwrap())
        .collect();
    assert_eq!(keys, HashSet::from(["click", "purchase"]));
}

#[test]
fn zero_worker_config_is_rejected() {
    let config = PipelineConfig {
        parser_threads: 0,
        ..PipelineConfig::new("events.ndjson")
    };
    assert!(PipelineCoordinator::new(config).is_err());
}
