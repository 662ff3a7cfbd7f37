//! Synthetic NDJSON event generation.
//!
//! Produces reproducible input files for benchmarks, demos and load
//! tests: a seeded RNG, a configurable user-pick distribution and
//! timestamps advancing a random 250-1249 ms step per event. With a fixed
//! seed and start time the output is byte-identical across runs.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use clap::ValueEnum;
use garde::Validate;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{PipelineError, PipelineResult};

/// Event types drawn from when none are configured.
pub const DEFAULT_EVENT_TYPES: &[&str] = &["click", "view", "purchase"];

/// How generated events are spread across the user space.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Every user is equally likely
    #[default]
    Uniform,
    /// Low-index users dominate (cubic skew)
    Zipf,
    /// Mostly uniform with occasional single-user bursts
    Burst,
}

impl std::fmt::Display for Distribution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Uniform => "uniform",
            Self::Zipf => "zipf",
            Self::Burst => "burst",
        };
        f.write_str(name)
    }
}

/// Configuration for one generated NDJSON file.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct GeneratorConfig {
    /// Number of events to emit
    #[garde(range(min = 1))]
    pub event_count: u64,

    /// Destination path
    #[garde(skip)]
    pub output_file: PathBuf,

    /// Number of distinct users
    #[garde(range(min = 1))]
    pub user_count: u64,

    /// Event types to draw from
    #[garde(length(min = 1))]
    pub event_types: Vec<String>,

    /// RNG seed; `None` self-seeds
    #[garde(skip)]
    pub seed: Option<u64>,

    /// User-pick distribution
    #[garde(skip)]
    pub distribution: Distribution,

    /// First timestamp; `None` starts at the current wall clock
    #[garde(skip)]
    pub start_time: Option<DateTime<Utc>>,
}

impl GeneratorConfig {
    /// Build a configuration with the default event types and
    /// distribution.
    #[must_use]
    pub fn new(output_file: impl Into<PathBuf>, event_count: u64, user_count: u64) -> Self {
        Self {
            event_count,
            output_file: output_file.into(),
            user_count,
            event_types: DEFAULT_EVENT_TYPES
                .iter()
                .map(|name| (*name).to_string())
                .collect(),
            seed: None,
            distribution: Distribution::Uniform,
            start_time: None,
        }
    }
}

#[derive(Serialize)]
struct EventRecord<'a> {
    ts: String,
    #[serde(rename = "type")]
    event_type: &'a str,
    user: String,
    value: i64,
}

struct UserPicker {
    distribution: Distribution,
    user_count: u64,
    burst_remaining: u64,
    burst_user: u64,
}

impl UserPicker {
    const fn new(distribution: Distribution, user_count: u64) -> Self {
        Self {
            distribution,
            user_count,
            burst_remaining: 0,
            burst_user: 0,
        }
    }

    fn pick(&mut self, rng: &mut StdRng) -> String {
        match self.distribution {
            Distribution::Uniform => user_id(rng.gen_range(0..self.user_count)),
            Distribution::Zipf => {
                let skewed = rng.gen::<f64>().powi(3);
                user_id((skewed * self.user_count as f64) as u64)
            }
            Distribution::Burst => {
                if self.burst_remaining > 0 {
                    self.burst_remaining -= 1;
                    return user_id(self.burst_user);
                }
                if rng.gen::<f64>() < 0.02 {
                    self.burst_remaining = 49 + rng.gen_range(0..200);
                    self.burst_user = rng.gen_range(0..self.user_count);
                    return user_id(self.burst_user);
                }
                user_id(rng.gen_range(0..self.user_count))
            }
        }
    }
}

fn user_id(index: u64) -> String {
    format!("u{index:04}")
}

/// Generate the configured NDJSON file.
///
/// # Errors
///
/// Returns [`PipelineError::Config`] for an invalid configuration and
/// [`PipelineError::Io`] when the output file cannot be written.
pub fn generate_events(config: &GeneratorConfig) -> PipelineResult<()> {
    config.validate().map_err(|report| PipelineError::Config {
        message: report.to_string(),
    })?;

    let mut rng = config
        .seed
        .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
    let mut picker = UserPicker::new(config.distribution, config.user_count);
    let mut current = config.start_time.unwrap_or_else(Utc::now);

    let mut writer = BufWriter::new(File::create(&config.output_file)?);
    for _ in 0..config.event_count {
        current += ChronoDuration::milliseconds(250 + rng.gen_range(0..1_000));

        let type_index = rng.gen_range(0..config.event_types.len());
        let record = EventRecord {
            ts: current.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
            event_type: &config.event_types[type_index],
            user: picker.pick(&mut rng),
            value: rng.gen_range(1..=100),
        };

        let line = serde_json::to_string(&record)?;
        writeln!(writer, "{line}")?;
    }
    writer.flush()?;

    info!(
        events = config.event_count,
        path = %config.output_file.display(),
        "generated event stream"
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn seeded_config(dir: &std::path::Path, name: &str) -> GeneratorConfig {
        GeneratorConfig {
            seed: Some(42),
            start_time: Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()),
            ..GeneratorConfig::new(dir.join(name), 200, 50)
        }
    }

    #[test]
    fn seeded_runs_are_byte_identical() -> PipelineResult<()> {
        let dir = tempfile::tempdir()?;

        let first = seeded_config(dir.path(), "a.ndjson");
        let second = seeded_config(dir.path(), "b.ndjson");
        generate_events(&first)?;
        generate_events(&second)?;

        let a = std::fs::read(dir.path().join("a.ndjson"))?;
        let b = std::fs::read(dir.path().join("b.ndjson"))?;
        assert!(!a.is_empty());
        assert_eq!(a, b);
        Ok(())
    }

    #[test]
    fn emits_the_configured_number_of_parseable_lines() -> PipelineResult<()> {
        let dir = tempfile::tempdir()?;
        let config = seeded_config(dir.path(), "events.ndjson");
        generate_events(&config)?;

        let contents = std::fs::read_to_string(dir.path().join("events.ndjson"))?;
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 200);

        for line in lines {
            let value: serde_json::Value = serde_json::from_str(line)?;
            let user = value["user"].as_str().unwrap();
            assert!(user.starts_with('u'));
            let event_value = value["value"].as_i64().unwrap();
            assert!((1..=100).contains(&event_value));
            assert!(DEFAULT_EVENT_TYPES.contains(&value["type"].as_str().unwrap()));
            assert!(value["ts"].as_str().unwrap().len() >= 19);
        }
        Ok(())
    }

    #[test]
    fn zero_counts_are_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let config = GeneratorConfig {
            event_count: 0,
            ..GeneratorConfig::new(dir.path().join("events.ndjson"), 1, 1)
        };
        assert!(matches!(
            generate_events(&config),
            Err(PipelineError::Config { .. })
        ));

        let config = GeneratorConfig {
            user_count: 0,
            ..GeneratorConfig::new(dir.path().join("events.ndjson"), 1, 1)
        };
        assert!(matches!(
            generate_events(&config),
            Err(PipelineError::Config { .. })
        ));
    }

    #[test]
    fn burst_and_zipf_stay_inside_the_user_space() -> PipelineResult<()> {
        let dir = tempfile::tempdir()?;
        for distribution in [Distribution::Zipf, Distribution::Burst] {
            let config = GeneratorConfig {
                distribution,
                ..seeded_config(dir.path(), "events.ndjson")
            };
            generate_events(&config)?;

            let contents = std::fs::read_to_string(dir.path().join("events.ndjson"))?;
            for line in contents.lines() {
                let value: serde_json::Value = serde_json::from_str(line)?;
                let user = value["user"].as_str().unwrap();
                let index: u64 = user[1..].parse().unwrap();
                assert!(index < 50, "user {user} outside the configured space");
            }
        }
        Ok(())
    }
}
