/// Running descriptive statistics and threshold counters for one sensor
///
/// Keeps O(1) state: extrema, an incrementally updated mean and two
/// advisory counters. No sample history is retained, so standard
/// deviation is not available.
use crate::models::ThresholdLevel;

/// Alert and critical boundaries; a value must be strictly greater to cross
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Thresholds {
    pub alert: f64,
    pub critical: f64,
}

/// Which thresholds a single value crossed. Both flags may be set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ThresholdResult {
    pub alert: bool,
    pub critical: bool,
}

impl ThresholdResult {
    pub fn level(&self) -> ThresholdLevel {
        if self.critical {
            ThresholdLevel::Critical
        } else if self.alert {
            ThresholdLevel::Alert
        } else {
            ThresholdLevel::Normal
        }
    }
}

/// Copy of the aggregate state. Extrema and mean are `None` until the
/// first sample arrives.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Stats {
    pub sample_count: u64,
    pub min_value: Option<f64>,
    pub max_value: Option<f64>,
    pub mean_value: Option<f64>,
    pub alert_count: u64,
    pub critical_count: u64,
}

impl Stats {
    /// Share of samples that crossed the critical threshold, in percent
    pub fn critical_rate_percent(&self) -> f64 {
        if self.sample_count == 0 {
            return 0.0;
        }
        self.critical_count as f64 / self.sample_count as f64 * 100.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct StatisticsAggregator {
    sample_count: u64,
    extrema: Option<(f64, f64)>,
    mean: f64,
    alert_count: u64,
    critical_count: u64,
}

impl StatisticsAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one value into extrema, mean and sample count
    ///
    /// Non-finite values are ignored.
    pub fn record(&mut self, value: f64) {
        if !value.is_finite() {
            return;
        }

        self.extrema = Some(match self.extrema {
            Some((lo, hi)) => (lo.min(value), hi.max(value)),
            None => (value, value),
        });

        // Mean uses the count from before this sample
        let n = self.sample_count as f64;
        self.mean = (self.mean * n + value) / (n + 1.0);
        self.sample_count += 1;
    }

    /// Pure check of `value` against both thresholds
    pub fn check_thresholds(value: f64, alert_threshold: f64, critical_threshold: f64) -> ThresholdResult {
        ThresholdResult {
            alert: value > alert_threshold,
            critical: value > critical_threshold,
        }
    }

    /// Bump the advisory counters for each flag set in `result`
    pub fn count_crossings(&mut self, result: ThresholdResult) {
        if result.alert {
            self.alert_count += 1;
        }
        if result.critical {
            self.critical_count += 1;
        }
    }

    /// Record `value`, check it against `thresholds` and count the crossings
    ///
    /// A non-finite value is neither recorded nor counted.
    pub fn observe(&mut self, value: f64, thresholds: &Thresholds) -> ThresholdResult {
        if !value.is_finite() {
            return ThresholdResult::default();
        }
        self.record(value);
        let result = Self::check_thresholds(value, thresholds.alert, thresholds.critical);
        self.count_crossings(result);
        result
    }

    pub fn snapshot(&self) -> Stats {
        let (min_value, max_value, mean_value) = match self.extrema {
            // Rounding in the mean recurrence can drift a ulp past the extrema
            Some((lo, hi)) if lo <= hi => (Some(lo), Some(hi), Some(self.mean.clamp(lo, hi))),
            Some((lo, hi)) => (Some(lo), Some(hi), Some(self.mean)),
            None => (None, None, None),
        };

        Stats {
            sample_count: self.sample_count,
            min_value,
            max_value,
            mean_value,
            alert_count: self.alert_count,
            critical_count: self.critical_count,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn empty_snapshot_has_no_extrema() {
        let stats = StatisticsAggregator::new().snapshot();
        assert_eq!(stats.sample_count, 0);
        assert_eq!(stats.min_value, None);
        assert_eq!(stats.max_value, None);
        assert_eq!(stats.mean_value, None);
        assert_eq!(stats.critical_rate_percent(), 0.0);
    }

    #[test]
    fn tracks_min_max_and_mean() {
        let values = [21.5, 19.25, 24.0, 22.75, 18.5, 23.0];
        let mut agg = StatisticsAggregator::new();
        for v in values {
            agg.record(v);
        }

        let stats = agg.snapshot();
        let expected_mean = values.iter().sum::<f64>() / values.len() as f64;
        assert_eq!(stats.sample_count, 6);
        assert_eq!(stats.min_value, Some(18.5));
        assert_eq!(stats.max_value, Some(24.0));
        assert_relative_eq!(stats.mean_value.unwrap(), expected_mean, epsilon = 1e-9);
    }

    #[test]
    fn mean_stays_within_extrema_for_repeated_values() {
        let mut agg = StatisticsAggregator::new();
        for _ in 0..1000 {
            agg.record(0.1);
        }
        let stats = agg.snapshot();
        let mean = stats.mean_value.unwrap();
        assert!(stats.min_value.unwrap() <= mean);
        assert!(mean <= stats.max_value.unwrap());
    }

    #[test]
    fn non_finite_values_leave_statistics_untouched() {
        let thresholds = Thresholds { alert: 40.0, critical: 45.0 };
        let mut agg = StatisticsAggregator::new();
        agg.observe(21.0, &thresholds);
        agg.observe(43.0, &thresholds);
        let before = agg.snapshot();

        agg.record(f64::NAN);
        agg.record(f64::INFINITY);
        assert_eq!(agg.observe(f64::NAN, &thresholds), ThresholdResult::default());
        assert_eq!(agg.observe(f64::INFINITY, &thresholds), ThresholdResult::default());
        agg.observe(f64::NEG_INFINITY, &thresholds);

        assert_eq!(agg.snapshot(), before);
        assert_relative_eq!(agg.snapshot().mean_value.unwrap(), 32.0);
    }

    #[test]
    fn nan_first_sample_keeps_snapshot_empty() {
        let mut agg = StatisticsAggregator::new();
        agg.record(f64::NAN);
        assert_eq!(agg.snapshot(), Stats::default());
    }

    #[test]
    fn reset_restores_initial_state() {
        let mut agg = StatisticsAggregator::new();
        agg.observe(47.0, &Thresholds { alert: 40.0, critical: 45.0 });
        agg.record(10.0);
        agg.reset();
        assert_eq!(agg.snapshot(), Stats::default());

        agg.record(31.5);
        let stats = agg.snapshot();
        assert_eq!(stats.sample_count, 1);
        assert_eq!(stats.min_value, Some(31.5));
        assert_eq!(stats.max_value, Some(31.5));
        assert_eq!(stats.mean_value, Some(31.5));
    }

    #[test]
    fn critical_crossing_also_counts_alert() {
        let thresholds = Thresholds { alert: 40.0, critical: 45.0 };
        let mut agg = StatisticsAggregator::new();

        let result = agg.observe(46.0, &thresholds);
        assert!(result.alert && result.critical);
        assert_eq!(result.level(), ThresholdLevel::Critical);

        let result = agg.observe(42.0, &thresholds);
        assert!(result.alert && !result.critical);
        assert_eq!(result.level(), ThresholdLevel::Alert);

        // Equal to the threshold is not a crossing
        let result = agg.observe(40.0, &thresholds);
        assert_eq!(result, ThresholdResult::default());

        let stats = agg.snapshot();
        assert_eq!(stats.alert_count, 2);
        assert_eq!(stats.critical_count, 1);
        assert_eq!(stats.sample_count, 3);
    }

    #[test]
    fn critical_rate() {
        let thresholds = Thresholds { alert: 40.0, critical: 45.0 };
        let mut agg = StatisticsAggregator::new();
        for v in [20.0, 50.0, 21.0, 22.0] {
            agg.observe(v, &thresholds);
        }
        assert_relative_eq!(agg.snapshot().critical_rate_percent(), 25.0);
    }
}
