//! Correlation engine: relate any two catalogue metrics by day.
//!
//! ## Pipeline
//!
//! 1. **Unification**: activities and daily logs are merged into one record per
//!    UTC calendar date ([`unify_records`])
//! 2. **Smoothing** (optional): each metric is replaced by its trailing mean over
//!    the current and up to 6 preceding unified days
//! 3. **Lag** (optional): X is taken from the preceding unified day, if that day
//!    is less than 1.5 days earlier
//! 4. **Pairing**: only days with both X and Y present are kept
//! 5. **Statistics**: Pearson r, least-squares trend and an interpretation
//!
//! Fewer than `min_pairs` pairs yields [`CorrelationOutcome::Insufficient`]
//! instead of statistics.
//!
//! ## Example
//! ```rust
//! use chrono::NaiveDate;
//! use endurance_lab::{correlate, CorrelationOutcome, CorrelationRequest, DailyLog, Metric};
//!
//! let logs: Vec<DailyLog> = (1..=5)
//!     .map(|d| {
//!         let mut log = DailyLog::new(NaiveDate::from_ymd_opt(2024, 3, d).unwrap());
//!         log.sleep_score = Some(60.0 + d as f64 * 5.0);
//!         log.hrv = Some(40.0 + d as f64 * 2.0);
//!         log
//!     })
//!     .collect();
//!
//! let request = CorrelationRequest::new(Metric::SleepScore, Metric::Hrv);
//! match correlate(&[], &logs, &request) {
//!     CorrelationOutcome::Ready(report) => assert!((report.r - 1.0).abs() < 1e-9),
//!     CorrelationOutcome::Insufficient { .. } => unreachable!(),
//! }
//! ```

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

use crate::catalogue::{Metric, MetricSource, PreferredDirection};
use crate::{utc_date, ActivitySummary, DailyLog};

/// Relative tolerance below which a variance term counts as zero.
const VARIANCE_EPSILON: f64 = 1e-12;

/// Configuration for correlation analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationConfig {
    /// Minimum number of paired days before statistics are computed.
    /// Default: 3
    pub min_pairs: usize,
    /// Number of unified days in the trailing smoothing window, including
    /// the current one. Default: 7
    pub smoothing_window: usize,
    /// Largest gap between consecutive unified days for a lagged pair.
    /// Default: 1.5 days
    pub lag_max_gap_days: f64,
    /// |r| above this is a strong correlation. Default: 0.7
    pub strong_threshold: f64,
    /// |r| above this is a moderate correlation. Default: 0.3
    pub moderate_threshold: f64,
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            min_pairs: 3,
            smoothing_window: 7,
            lag_max_gap_days: 1.5,
            strong_threshold: 0.7,
            moderate_threshold: 0.3,
        }
    }
}

/// Which metrics to relate and how.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CorrelationRequest {
    pub x: Metric,
    pub y: Metric,
    pub smoothing: bool,
    pub lag: bool,
}

impl CorrelationRequest {
    /// Plain same-day correlation without smoothing or lag.
    pub fn new(x: Metric, y: Metric) -> Self {
        Self {
            x,
            y,
            smoothing: false,
            lag: false,
        }
    }

    pub fn with_smoothing(mut self, smoothing: bool) -> Self {
        self.smoothing = smoothing;
        self
    }

    pub fn with_lag(mut self, lag: bool) -> Self {
        self.lag = lag;
        self
    }
}

/// All metric values known for one UTC calendar date.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnifiedDay {
    pub date: NaiveDate,
    /// Timestamp of the first record merged into this day
    pub timestamp: DateTime<Utc>,
    pub values: BTreeMap<Metric, f64>,
}

impl UnifiedDay {
    fn new(date: NaiveDate, timestamp: DateTime<Utc>) -> Self {
        Self {
            date,
            timestamp,
            values: BTreeMap::new(),
        }
    }

    pub fn get(&self, metric: Metric) -> Option<f64> {
        self.values.get(&metric).copied()
    }

    pub fn has(&self, metric: Metric) -> bool {
        self.values.contains_key(&metric)
    }
}

/// Merge activities and daily logs into one record per UTC date, ordered by date.
///
/// Logs are merged first, activities second. Within each source, later records
/// overwrite earlier values for the same metric on the same date.
pub fn unify_records(activities: &[ActivitySummary], logs: &[DailyLog]) -> Vec<UnifiedDay> {
    let mut days: BTreeMap<NaiveDate, UnifiedDay> = BTreeMap::new();

    for log in logs {
        let date = utc_date(log.timestamp);
        let day = days
            .entry(date)
            .or_insert_with(|| UnifiedDay::new(date, log.timestamp));
        for metric in Metric::for_source(MetricSource::Log) {
            if let Some(value) = metric.from_log(log) {
                day.values.insert(metric, value);
            }
        }
    }

    for activity in activities {
        let date = utc_date(activity.timestamp);
        let day = days
            .entry(date)
            .or_insert_with(|| UnifiedDay::new(date, activity.timestamp));
        for metric in Metric::for_source(MetricSource::Activity) {
            if let Some(value) = metric.from_activity(activity) {
                day.values.insert(metric, value);
            }
        }
    }

    days.into_values().collect()
}

/// Trailing mean of every metric over `window` unified days.
///
/// Days where a metric is absent are excluded from that metric's mean; a day
/// whose window holds no value for a metric keeps no value.
pub fn smooth_days(days: &[UnifiedDay], window: usize) -> Vec<UnifiedDay> {
    let window = window.max(1);
    days.iter()
        .enumerate()
        .map(|(i, day)| {
            let start = (i + 1).saturating_sub(window);
            let slice = &days[start..=i];
            let mut smoothed = UnifiedDay::new(day.date, day.timestamp);
            for metric in Metric::ALL {
                let (sum, count) = slice
                    .iter()
                    .filter_map(|d| d.get(metric))
                    .fold((0.0, 0usize), |(s, c), v| (s + v, c + 1));
                if count > 0 {
                    smoothed.values.insert(metric, sum / count as f64);
                }
            }
            smoothed
        })
        .collect()
}

/// One (x, y) observation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pair {
    /// Date of the Y value
    pub date: NaiveDate,
    pub x: f64,
    pub y: f64,
}

/// Extract paired observations from unified days.
///
/// With `lag`, X comes from the preceding unified day when it lies less than
/// `max_gap_days` earlier; otherwise the day is dropped.
pub fn extract_pairs(
    days: &[UnifiedDay],
    x: Metric,
    y: Metric,
    lag: bool,
    max_gap_days: f64,
) -> Vec<Pair> {
    days.iter()
        .enumerate()
        .filter_map(|(i, day)| {
            let x_value = if lag {
                let prev = days.get(i.checked_sub(1)?)?;
                let gap_days =
                    (day.timestamp - prev.timestamp).num_milliseconds() as f64 / 86_400_000.0;
                if gap_days >= max_gap_days {
                    return None;
                }
                prev.get(x)?
            } else {
                day.get(x)?
            };
            Some(Pair {
                date: day.date,
                x: x_value,
                y: day.get(y)?,
            })
        })
        .collect()
}

/// Point on a trend line.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TrendPoint {
    pub x: f64,
    pub y: f64,
}

/// Least-squares line `y = slope * x + intercept`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub slope: f64,
    pub intercept: f64,
    /// Line endpoints at min(x) and max(x)
    pub line: [TrendPoint; 2],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Strength {
    Strong,
    Moderate,
    Weak,
}

impl Strength {
    pub fn label(&self) -> &'static str {
        match self {
            Strength::Strong => "STRONG",
            Strength::Moderate => "MODERATE",
            Strength::Weak => "WEAK",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Direction {
    Positive,
    Negative,
}

impl Direction {
    pub fn label(&self) -> &'static str {
        match self {
            Direction::Positive => "POSITIVE",
            Direction::Negative => "NEGATIVE",
        }
    }
}

/// Qualitative reading of a correlation coefficient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interpretation {
    pub strength: Strength,
    pub direction: Direction,
    pub description: String,
}

impl Interpretation {
    /// Classify `r` for metrics `x` and `y`.
    pub fn from_r(r: f64, x: Metric, y: Metric, config: &CorrelationConfig) -> Self {
        let abs_r = r.abs();
        let strength = if abs_r > config.strong_threshold {
            Strength::Strong
        } else if abs_r > config.moderate_threshold {
            Strength::Moderate
        } else {
            Strength::Weak
        };
        let direction = if r > 0.0 {
            Direction::Positive
        } else {
            Direction::Negative
        };
        let description = if abs_r > config.moderate_threshold {
            match direction {
                Direction::Positive => {
                    format!("When {} goes UP, {} also tends to go UP.", x.label(), y.label())
                }
                Direction::Negative => {
                    format!("When {} goes UP, {} tends to go DOWN.", x.label(), y.label())
                }
            }
        } else {
            "These metrics don't seem related.".to_string()
        };
        Self {
            strength,
            direction,
            description,
        }
    }
}

/// Statistics for a correlation with enough data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CorrelationReport {
    pub x: Metric,
    pub y: Metric,
    pub pairs: Vec<Pair>,
    pub n: usize,
    /// Pearson coefficient in [-1, 1]; 0 when either axis has no variance
    pub r: f64,
    /// `None` when X has no variance
    pub trend: Option<Trend>,
    pub min_y: f64,
    pub max_y: f64,
    pub interpretation: Interpretation,
}

impl CorrelationReport {
    /// Preference colour for each pair's Y value, relative to the Y range.
    pub fn pair_colors(&self) -> Vec<(u8, u8, u8)> {
        self.pairs
            .iter()
            .map(|p| score_color(preference_score(self.y, p.y, self.min_y, self.max_y)))
            .collect()
    }
}

/// Result of a correlation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CorrelationOutcome {
    /// Too few paired days; no statistics computed.
    Insufficient { pairs: usize, required: usize },
    Ready(CorrelationReport),
}

impl CorrelationOutcome {
    pub fn report(&self) -> Option<&CorrelationReport> {
        match self {
            CorrelationOutcome::Ready(report) => Some(report),
            CorrelationOutcome::Insufficient { .. } => None,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.report().is_some()
    }
}

/// Correlate two metrics with the default configuration.
pub fn correlate(
    activities: &[ActivitySummary],
    logs: &[DailyLog],
    request: &CorrelationRequest,
) -> CorrelationOutcome {
    correlate_with_config(activities, logs, request, &CorrelationConfig::default())
}

/// Correlate two metrics.
pub fn correlate_with_config(
    activities: &[ActivitySummary],
    logs: &[DailyLog],
    request: &CorrelationRequest,
    config: &CorrelationConfig,
) -> CorrelationOutcome {
    let days = unify_records(activities, logs);
    correlate_days(&days, request, config)
}

/// Correlate two metrics over already unified days.
pub fn correlate_days(
    days: &[UnifiedDay],
    request: &CorrelationRequest,
    config: &CorrelationConfig,
) -> CorrelationOutcome {
    let smoothed;
    let days = if request.smoothing {
        smoothed = smooth_days(days, config.smoothing_window);
        &smoothed[..]
    } else {
        days
    };

    let pairs = extract_pairs(days, request.x, request.y, request.lag, config.lag_max_gap_days);

    debug!(
        "[Correlation] {} vs {} (smoothing={}, lag={}): {} days, {} pairs",
        request.x.key(),
        request.y.key(),
        request.smoothing,
        request.lag,
        days.len(),
        pairs.len()
    );

    if pairs.len() < config.min_pairs {
        return CorrelationOutcome::Insufficient {
            pairs: pairs.len(),
            required: config.min_pairs,
        };
    }

    CorrelationOutcome::Ready(build_report(request.x, request.y, pairs, config))
}

fn build_report(x: Metric, y: Metric, pairs: Vec<Pair>, config: &CorrelationConfig) -> CorrelationReport {
    let n = pairs.len() as f64;
    let mut sum_x = 0.0;
    let mut sum_y = 0.0;
    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    let mut min_x = f64::INFINITY;
    let mut max_x = f64::NEG_INFINITY;
    let mut min_y = f64::INFINITY;
    let mut max_y = f64::NEG_INFINITY;

    for p in &pairs {
        sum_x += p.x;
        sum_y += p.y;
        sum_xy += p.x * p.y;
        sum_xx += p.x * p.x;
        sum_yy += p.y * p.y;
        min_x = min_x.min(p.x);
        max_x = max_x.max(p.x);
        min_y = min_y.min(p.y);
        max_y = max_y.max(p.y);
    }

    let numerator = n * sum_xy - sum_x * sum_y;
    let var_x = n * sum_xx - sum_x * sum_x;
    let var_y = n * sum_yy - sum_y * sum_y;
    let flat_x = is_degenerate(var_x, n * sum_xx);
    let flat_y = is_degenerate(var_y, n * sum_yy);

    let r = if flat_x || flat_y {
        0.0
    } else {
        (numerator / (var_x * var_y).sqrt()).clamp(-1.0, 1.0)
    };

    let trend = if flat_x {
        None
    } else {
        let slope = numerator / var_x;
        let intercept = (sum_y - slope * sum_x) / n;
        Some(Trend {
            slope,
            intercept,
            line: [
                TrendPoint {
                    x: min_x,
                    y: slope * min_x + intercept,
                },
                TrendPoint {
                    x: max_x,
                    y: slope * max_x + intercept,
                },
            ],
        })
    };

    CorrelationReport {
        x,
        y,
        n: pairs.len(),
        pairs,
        r,
        trend,
        min_y,
        max_y,
        interpretation: Interpretation::from_r(r, x, y, config),
    }
}

/// A variance term is zero when it is non-positive or negligible relative to
/// the sum of squares it was computed from.
fn is_degenerate(variance: f64, scale: f64) -> bool {
    variance <= 0.0 || variance <= scale.abs() * VARIANCE_EPSILON
}

/// How many days carry a metric, and how many carry it together with X.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricAvailability {
    pub metric: Metric,
    /// Days where the metric is present
    pub days: usize,
    /// Days where both X and the metric are present
    pub paired_with_x: usize,
}

/// Per-metric data counts, used to guide the choice of axes.
pub fn metric_availability(days: &[UnifiedDay], x: Metric) -> Vec<MetricAvailability> {
    Metric::ALL
        .into_iter()
        .map(|metric| MetricAvailability {
            metric,
            days: days.iter().filter(|d| d.has(metric)).count(),
            paired_with_x: days.iter().filter(|d| d.has(x) && d.has(metric)).count(),
        })
        .collect()
}

/// Normalise a value into [0, 1] within `[min, max]`, where 1 is best.
///
/// Lower-is-better metrics are inverted. A zero range scores 0.5.
pub fn preference_score(metric: Metric, value: f64, min: f64, max: f64) -> f64 {
    let range = max - min;
    let norm = if range == 0.0 {
        0.5
    } else {
        (value - min) / range
    };
    match metric.preferred_direction() {
        PreferredDirection::Higher => norm,
        PreferredDirection::Lower => 1.0 - norm,
    }
}

/// RGB on a red (0) -> yellow (0.5) -> green (1) scale.
pub fn score_color(score: f64) -> (u8, u8, u8) {
    let score = score.clamp(0.0, 1.0);
    if score < 0.5 {
        let p = score * 2.0;
        (255, (255.0 * p).round() as u8, 0)
    } else {
        let p = (score - 0.5) * 2.0;
        ((255.0 * (1.0 - p)).round() as u8, 255, 0)
    }
}
