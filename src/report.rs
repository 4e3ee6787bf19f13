//! Evergreen perf-format report rendering.
//!
//! Two schemas are supported. [`ReportFormat::Legacy`] emits a list with a
//! `<name>-throughput` entry and, for data-bound cases, a `<name>-MB-adjusted`
//! entry. [`ReportFormat::Single`] emits one `<name>` entry whose throughput
//! prefers the data-adjusted figure. The `results` map is keyed by the literal
//! string `"1"` in both; the ingestion service depends on that.

use std::time::Duration;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::error;

use crate::error::{ReportError, StatsError};
use crate::result::BenchResult;
use crate::stats::Throughput;

/// Report schema selection.
#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    /// Per-case list of `-throughput` and `-MB-adjusted` entries.
    #[default]
    Legacy,
    /// One entry per case with trial counts and the preferred throughput.
    Single,
}

/// One named report entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerfEntry<T> {
    pub name: String,
    pub results: PerfResults<T>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PerfResults<T> {
    #[serde(rename = "1")]
    pub one: T,
}

/// Values of a legacy entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ThroughputValues {
    pub seconds: f64,
    pub ops_per_second: f64,
    pub ops_per_second_values: [f64; 2],
}

/// Values of a single-schema entry.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TrialValues {
    pub trials: usize,
    pub ops_per_trial: u64,
    pub seconds: f64,
    pub ops_per_second: f64,
    pub ops_per_second_values: [f64; 2],
}

impl<T> PerfEntry<T> {
    fn new(name: String, values: T) -> Self {
        Self {
            name,
            results: PerfResults { one: values },
        }
    }
}

/// Duration rounded to the nearest millisecond, in seconds.
pub fn rounded_seconds(duration: Duration) -> f64 {
    let millis = (duration.as_nanos() + 500_000) / 1_000_000;
    millis as f64 / 1_000.0
}

fn throughput_values(seconds: f64, throughput: &Throughput) -> ThroughputValues {
    ThroughputValues {
        seconds,
        ops_per_second: throughput.median,
        ops_per_second_values: throughput.values(),
    }
}

/// Entries of the legacy list schema for one case.
pub fn legacy_entries(result: &BenchResult) -> Result<Vec<PerfEntry<ThroughputValues>>, StatsError> {
    let seconds = rounded_seconds(result.duration());

    let mut out = vec![PerfEntry::new(
        format!("{}-throughput", result.name()),
        throughput_values(seconds, &result.ops_throughput()?),
    )];

    if let Some(adjusted) = result.data_throughput()? {
        out.push(PerfEntry::new(
            format!("{}-MB-adjusted", result.name()),
            throughput_values(seconds, &adjusted),
        ));
    }

    Ok(out)
}

/// The single-object schema entry for one case.
pub fn single_entry(result: &BenchResult) -> Result<PerfEntry<TrialValues>, StatsError> {
    let throughput = result.preferred_throughput()?;
    Ok(PerfEntry::new(
        result.name().to_string(),
        TrialValues {
            trials: result.trials(),
            ops_per_trial: result.operations(),
            seconds: rounded_seconds(result.duration()),
            ops_per_second: throughput.median,
            ops_per_second_values: throughput.values(),
        },
    ))
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Legacy => "legacy",
            ReportFormat::Single => "single",
        }
    }

    /// Render `result` as JSON report entries.
    pub fn render(&self, result: &BenchResult) -> Result<Vec<Value>, ReportError> {
        let tag = |source| ReportError::Statistics {
            case: result.name().to_string(),
            source,
        };
        match self {
            ReportFormat::Legacy => legacy_entries(result)
                .map_err(tag)?
                .into_iter()
                .map(|entry| serde_json::to_value(entry).map_err(ReportError::from))
                .collect(),
            ReportFormat::Single => {
                let entry = single_entry(result).map_err(tag)?;
                Ok(vec![serde_json::to_value(entry)?])
            }
        }
    }
}

/// Report entries for a batch of cases plus the cases that could not be rendered.
#[derive(Debug, Default)]
pub struct RenderedReport {
    pub entries: Vec<Value>,
    pub failures: Vec<ReportError>,
}

impl RenderedReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    pub fn to_json_pretty(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }
}

/// Render every result, keeping going past cases whose statistics fail.
pub fn render_all<'a>(
    results: impl IntoIterator<Item = &'a BenchResult>,
    format: ReportFormat,
) -> RenderedReport {
    let mut report = RenderedReport::default();
    for result in results {
        match format.render(result) {
            Ok(entries) => report.entries.extend(entries),
            Err(err) => {
                error!(case = result.name(), error = %err, "report generation failed");
                report.failures.push(err);
            }
        }
    }
    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{CaseFailure, WorkloadError};
    use crate::result::TrialResult;
    use serde_json::json;

    fn bench(data_size: i64) -> BenchResult {
        let raw = [500, 400, 600]
            .into_iter()
            .map(|ms| TrialResult::success(Duration::from_millis(ms), 1000))
            .collect();
        BenchResult::new("enc", 1000, data_size, raw)
    }

    fn close(value: &Value, expected: f64) -> bool {
        value
            .as_f64()
            .map(|v| (v - expected).abs() < 1e-6 * expected.abs().max(1.0))
            .unwrap_or(false)
    }

    #[test]
    fn legacy_without_data_size_has_one_entry() {
        let entries = ReportFormat::Legacy.render(&bench(0)).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry["name"], "enc-throughput");
        let one = &entry["results"]["1"];
        assert!(close(&one["seconds"], 1.5));
        assert!(close(&one["ops_per_second"], 2000.0));
        assert!(close(&one["ops_per_second_values"][0], 1000.0 / 0.6));
        assert!(close(&one["ops_per_second_values"][1], 2500.0));
    }

    #[test]
    fn legacy_with_data_size_adds_adjusted_entry() {
        let entries = ReportFormat::Legacy.render(&bench(5_000_000)).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0]["name"], "enc-throughput");
        assert_eq!(entries[1]["name"], "enc-MB-adjusted");

        let one = &entries[1]["results"]["1"];
        assert!(close(&one["ops_per_second"], 10_000_000.0));
        assert!(close(&one["ops_per_second_values"][0], 5_000_000.0 / 0.6));
        assert!(close(&one["ops_per_second_values"][1], 12_500_000.0));
    }

    #[test]
    fn negative_data_size_never_adjusts() {
        let entries = legacy_entries(&bench(-1)).unwrap();
        assert!(entries.iter().all(|e| !e.name.ends_with("-MB-adjusted")));
    }

    #[test]
    fn single_schema_shape() {
        let entries = ReportFormat::Single.render(&bench(0)).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_eq!(entry["name"], "enc");

        let one = &entry["results"]["1"];
        assert_eq!(one["trials"], json!(3));
        assert_eq!(one["ops_per_trial"], json!(1000));
        assert!(close(&one["seconds"], 1.5));
        assert!(close(&one["ops_per_second"], 2000.0));
        assert_eq!(one.as_object().map(|o| o.len()), Some(5));
    }

    #[test]
    fn single_schema_prefers_data_adjusted() {
        let entry = single_entry(&bench(5_000_000)).unwrap();
        assert_eq!(entry.name, "enc");
        assert!((entry.results.one.ops_per_second - 10_000_000.0).abs() < 1e-3);
        assert!((entry.results.one.ops_per_second_values[1] - 12_500_000.0).abs() < 1e-3);
    }

    #[test]
    fn empty_result_fails_reporting() {
        let empty = BenchResult::new("enc", 1000, 0, Vec::new());
        for format in [ReportFormat::Legacy, ReportFormat::Single] {
            let err = format.render(&empty).unwrap_err();
            assert!(matches!(
                err,
                ReportError::Statistics {
                    source: StatsError::EmptyInput,
                    ..
                }
            ));
        }
    }

    #[test]
    fn all_failed_trials_fail_reporting() {
        let raw = vec![TrialResult::failed(
            Duration::from_millis(3),
            10,
            CaseFailure {
                case: "enc".to_string(),
                source: WorkloadError::Cancelled,
            },
        )];
        let result = BenchResult::new("enc", 10, 0, raw);
        assert!(result.has_errors());
        assert!(ReportFormat::Single.render(&result).is_err());
    }

    #[test]
    fn render_all_skips_unrenderable_cases() {
        let empty = BenchResult::new("empty", 1000, 0, Vec::new());
        let results = vec![bench(5_000_000), empty, bench(0)];
        let report = render_all(&results, ReportFormat::Legacy);
        assert_eq!(report.entries.len(), 3);
        assert_eq!(report.failures.len(), 1);
        assert!(!report.is_complete());

        let json: Value = serde_json::from_str(&report.to_json_pretty().unwrap()).unwrap();
        assert!(json.is_array());
        assert_eq!(json[1]["name"], "enc-MB-adjusted");
    }

    #[test]
    fn seconds_round_to_millis() {
        assert_eq!(rounded_seconds(Duration::from_micros(1_234_499)), 1.234);
        assert_eq!(rounded_seconds(Duration::from_micros(1_234_500)), 1.235);
        assert_eq!(rounded_seconds(Duration::ZERO), 0.0);
    }
}
