//! Period totals and period-over-period trends.
//!
//! Periods are expressed in days before `as_of`: a record belongs to the
//! period `(start_days_ago, end_days_ago)` when
//! `as_of - end_days_ago < timestamp <= as_of - start_days_ago`.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{ActivitySummary, DailyLog};

/// Totals over one period.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodStats {
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub steps: u64,
    pub calories: u64,
    /// Mean SpO2 over logs reporting a positive value; 0 when none do
    pub avg_spo2: f64,
    pub activity_count: usize,
}

/// Aggregate activities and logs inside a period.
pub fn period_stats(
    history: &[ActivitySummary],
    logs: &[DailyLog],
    as_of: DateTime<Utc>,
    start_days_ago: i64,
    end_days_ago: i64,
) -> PeriodStats {
    let newest = as_of - Duration::days(start_days_ago);
    let oldest = as_of - Duration::days(end_days_ago);
    let in_range = |ts: DateTime<Utc>| ts <= newest && ts > oldest;

    let mut stats = PeriodStats::default();
    for activity in history.iter().filter(|a| in_range(a.timestamp)) {
        stats.distance_km += activity.distance_km;
        stats.elevation_gain_m += activity.elevation_gain_m;
        stats.activity_count += 1;
    }

    let mut spo2_sum = 0.0;
    let mut spo2_count = 0usize;
    for log in logs.iter().filter(|l| in_range(l.timestamp)) {
        stats.steps += u64::from(log.steps.unwrap_or(0));
        stats.calories += u64::from(log.calories.unwrap_or(0));
        if let Some(spo2) = log.spo2.filter(|v| *v > 0.0) {
            spo2_sum += spo2;
            spo2_count += 1;
        }
    }
    if spo2_count > 0 {
        stats.avg_spo2 = spo2_sum / spo2_count as f64;
    }

    stats
}

/// Change from `previous` to `current` in percent; `None` when `previous` is 0.
pub fn trend_percent(current: f64, previous: f64) -> Option<f64> {
    if previous == 0.0 {
        None
    } else {
        Some((current - previous) / previous * 100.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TrendDirection {
    Up,
    Down,
    /// Less than 1% change
    Flat,
}

impl TrendDirection {
    pub fn between(current: f64, previous: f64) -> Option<Self> {
        trend_percent(current, previous).map(|pct| {
            if pct.abs() < 1.0 {
                TrendDirection::Flat
            } else if pct > 0.0 {
                TrendDirection::Up
            } else {
                TrendDirection::Down
            }
        })
    }
}

/// Weekly, monthly and yearly totals as of one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Overview {
    pub week: PeriodStats,
    pub previous_week: PeriodStats,
    pub month: PeriodStats,
    pub previous_month: PeriodStats,
    pub year: PeriodStats,
}

impl Overview {
    pub fn build(history: &[ActivitySummary], logs: &[DailyLog], as_of: DateTime<Utc>) -> Self {
        let period = |start, end| period_stats(history, logs, as_of, start, end);
        Self {
            week: period(0, 7),
            previous_week: period(7, 14),
            month: period(0, 30),
            previous_month: period(30, 60),
            year: period(0, 365),
        }
    }

    /// Week-over-week distance change in percent.
    pub fn weekly_distance_trend(&self) -> Option<f64> {
        trend_percent(self.week.distance_km, self.previous_week.distance_km)
    }

    /// Month-over-month distance change in percent.
    pub fn monthly_distance_trend(&self) -> Option<f64> {
        trend_percent(self.month.distance_km, self.previous_month.distance_km)
    }
}
