//! Robust summary statistics over trial durations and the throughput figures
//! derived from them.
//!
//! Throughput is inversely related to duration: the shortest trial yields the
//! highest throughput. [`Throughput`] stores its spread as `[low, high]`, so
//! `low` comes from the longest trial and `high` from the shortest.

use crate::error::StatsError;
use crate::result::BenchResult;

/// Median, minimum and maximum of a set of durations, in seconds.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct StatSummary {
    pub median: f64,
    pub min: f64,
    pub max: f64,
}

/// Median of `samples`, averaging the two middle values for even lengths.
pub fn median(samples: &[f64]) -> Result<f64, StatsError> {
    if samples.is_empty() {
        return Err(StatsError::EmptyInput);
    }
    let mut sorted = samples.to_vec();
    sorted.sort_by(f64::total_cmp);

    let mid = sorted.len() / 2;
    if sorted.len() % 2 == 0 {
        Ok((sorted[mid - 1] + sorted[mid]) / 2.0)
    } else {
        Ok(sorted[mid])
    }
}

pub fn min(samples: &[f64]) -> Result<f64, StatsError> {
    samples
        .iter()
        .copied()
        .min_by(f64::total_cmp)
        .ok_or(StatsError::EmptyInput)
}

pub fn max(samples: &[f64]) -> Result<f64, StatsError> {
    samples
        .iter()
        .copied()
        .max_by(f64::total_cmp)
        .ok_or(StatsError::EmptyInput)
}

/// Reduce `samples` to a [`StatSummary`].
pub fn summarize(samples: &[f64]) -> Result<StatSummary, StatsError> {
    Ok(StatSummary {
        median: median(samples)?,
        min: min(samples)?,
        max: max(samples)?,
    })
}

/// Throughput at the median plus its two-sided spread.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Throughput {
    pub median: f64,
    /// Throughput of the slowest trial.
    pub low: f64,
    /// Throughput of the fastest trial.
    pub high: f64,
}

impl Throughput {
    /// Throughput of `amount` units per trial over the summarized durations.
    pub fn from_summary(amount: f64, summary: &StatSummary) -> Self {
        Self {
            median: amount / summary.median,
            low: amount / summary.max,
            high: amount / summary.min,
        }
    }

    /// `[low, high]`, the spread layout of the perf report.
    pub fn values(&self) -> [f64; 2] {
        [self.low, self.high]
    }
}

impl BenchResult {
    /// Summary over the successful trial durations.
    ///
    /// Recomputed on every call; the result is frozen so this is side-effect free.
    pub fn summary(&self) -> Result<StatSummary, StatsError> {
        summarize(&self.timings())
    }

    /// Declared operations processed per second.
    pub fn ops_throughput(&self) -> Result<Throughput, StatsError> {
        let summary = self.summary()?;
        Ok(Throughput::from_summary(self.operations() as f64, &summary))
    }

    /// Declared payload bytes processed per second, `None` when the case is not
    /// data bound.
    pub fn data_throughput(&self) -> Result<Option<Throughput>, StatsError> {
        if self.data_size() <= 0 {
            return Ok(None);
        }
        let summary = self.summary()?;
        Ok(Some(Throughput::from_summary(self.data_size() as f64, &summary)))
    }

    /// Data-adjusted throughput when the case is data bound, else operation based.
    pub fn preferred_throughput(&self) -> Result<Throughput, StatsError> {
        match self.data_throughput()? {
            Some(throughput) => Ok(throughput),
            None => self.ops_throughput(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::TrialResult;
    use proptest::prelude::*;
    use std::time::Duration;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-6 * b.abs().max(1.0)
    }

    fn bench(data_size: i64) -> BenchResult {
        let raw = [500, 400, 600]
            .into_iter()
            .map(|ms| TrialResult::success(Duration::from_millis(ms), 1000))
            .collect();
        BenchResult::new("enc", 1000, data_size, raw)
    }

    #[test]
    fn median_odd_and_even() {
        assert_eq!(median(&[0.5, 0.4, 0.6]).unwrap(), 0.5);
        assert_eq!(median(&[4.0, 1.0, 3.0, 2.0]).unwrap(), 2.5);
        assert_eq!(median(&[7.0]).unwrap(), 7.0);
    }

    #[test]
    fn empty_input_is_an_error() {
        assert_eq!(median(&[]), Err(StatsError::EmptyInput));
        assert_eq!(min(&[]), Err(StatsError::EmptyInput));
        assert_eq!(max(&[]), Err(StatsError::EmptyInput));
        assert_eq!(summarize(&[]), Err(StatsError::EmptyInput));

        let empty = BenchResult::new("enc", 1000, 0, Vec::new());
        assert_eq!(empty.summary(), Err(StatsError::EmptyInput));
        assert_eq!(empty.ops_throughput(), Err(StatsError::EmptyInput));
    }

    #[test]
    fn summary_is_ordered() {
        let samples = [0.9, 0.1, 0.35, 0.35, 2.0, 0.7];
        let s = summarize(&samples).unwrap();
        assert!(s.min <= s.median && s.median <= s.max);
        assert_eq!(s.min, 0.1);
        assert_eq!(s.max, 2.0);
    }

    #[test]
    fn ops_throughput_inverts_durations() {
        let t = bench(0).ops_throughput().unwrap();
        assert!(approx(t.median, 2000.0));
        assert!(approx(t.low, 1000.0 / 0.6));
        assert!(approx(t.high, 2500.0));
        assert!(t.high >= t.median && t.median >= t.low);
    }

    #[test]
    fn data_throughput_only_when_bound() {
        assert_eq!(bench(0).data_throughput().unwrap(), None);
        assert_eq!(bench(-1).data_throughput().unwrap(), None);

        let t = bench(5_000_000).data_throughput().unwrap().unwrap();
        assert!(approx(t.median, 10_000_000.0));
        assert!(approx(t.low, 5_000_000.0 / 0.6));
        assert!(approx(t.high, 12_500_000.0));
    }

    #[test]
    fn zero_length_trials_are_not_samples() {
        let raw = vec![
            TrialResult::success(Duration::ZERO, 1000),
            TrialResult::success(Duration::from_millis(500), 1000),
        ];
        let t = BenchResult::new("enc", 1000, 0, raw).ops_throughput().unwrap();
        assert!(approx(t.median, 2000.0));
        assert!(t.high.is_finite());

        let zero_only =
            BenchResult::new("enc", 1000, 0, vec![TrialResult::success(Duration::ZERO, 1000)]);
        assert_eq!(zero_only.ops_throughput(), Err(StatsError::EmptyInput));
    }

    /// Trial durations from 1us to 10s.
    fn durations() -> impl Strategy<Value = Vec<Duration>> {
        prop::collection::vec((1u64..=10_000_000).prop_map(Duration::from_micros), 1..64)
    }

    /// Few distinct values, so medians often land on duplicates.
    fn repetitive_durations() -> impl Strategy<Value = Vec<Duration>> {
        prop::collection::vec(
            prop::sample::select(vec![1u64, 2, 2, 3]).prop_map(Duration::from_millis),
            1..32,
        )
    }

    fn bench_from(durations: &[Duration], operations: u64) -> BenchResult {
        let raw = durations
            .iter()
            .map(|d| TrialResult::success(*d, operations))
            .collect();
        BenchResult::new("prop", operations, 0, raw)
    }

    fn assert_inverted(t: &Throughput) -> Result<(), TestCaseError> {
        prop_assert!(t.low <= t.median && t.median <= t.high, "{:?}", t);
        let [low, high] = t.values();
        prop_assert!(low <= t.median && t.median <= high);
        Ok(())
    }

    proptest! {
        #[test]
        fn summary_is_ordered_for_any_input(durations in durations()) {
            let secs: Vec<f64> = durations.iter().map(Duration::as_secs_f64).collect();
            let s = summarize(&secs).unwrap();
            prop_assert!(s.min <= s.median && s.median <= s.max, "{:?}", s);
        }

        #[test]
        fn throughput_inverts_any_durations(durations in durations(), ops in 1u64..=1_000_000) {
            let t = bench_from(&durations, ops).ops_throughput().unwrap();
            assert_inverted(&t)?;
        }

        #[test]
        fn throughput_inverts_repetitive_durations(durations in repetitive_durations(), ops in 1u64..=10_000) {
            let s = bench_from(&durations, ops).summary().unwrap();
            prop_assert!(s.min <= s.median && s.median <= s.max);
            assert_inverted(&Throughput::from_summary(ops as f64, &s))?;
        }
    }

    #[test]
    fn preferred_throughput_falls_back_to_ops() {
        assert!(approx(bench(0).preferred_throughput().unwrap().median, 2000.0));
        assert!(approx(
            bench(5_000_000).preferred_throughput().unwrap().median,
            10_000_000.0
        ));
    }
}
