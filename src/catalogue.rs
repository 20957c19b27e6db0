//! Closed catalogue of metrics available to the correlation engine.
//!
//! Each metric is read from exactly one record kind: a [`DailyLog`] or an
//! [`ActivitySummary`]. Keys are the stable string identifiers used by callers
//! when selecting metrics.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AnalyticsError, OptionExt};
use crate::{ActivitySummary, DailyLog};

/// Which record kind a metric is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MetricSource {
    Log,
    Activity,
}

/// Whether higher or lower values of a metric are considered better.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PreferredDirection {
    Higher,
    Lower,
}

/// A metric that can be selected as either axis of a correlation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Metric {
    SleepScore,
    StressLevel,
    Spo2,
    Hrv,
    RestingHr,
    Weight,
    Steps,
    Calories,
    Efficiency,
    DistanceKm,
    AvgHr,
    #[serde(rename = "totalElevationGain")]
    ElevationGain,
    AvgPower,
    #[serde(rename = "durationMinutes")]
    Duration,
}

impl Metric {
    /// Every metric, in catalogue order.
    pub const ALL: [Metric; 14] = [
        Metric::SleepScore,
        Metric::StressLevel,
        Metric::Spo2,
        Metric::Hrv,
        Metric::RestingHr,
        Metric::Weight,
        Metric::Steps,
        Metric::Calories,
        Metric::Efficiency,
        Metric::DistanceKm,
        Metric::AvgHr,
        Metric::ElevationGain,
        Metric::AvgPower,
        Metric::Duration,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            Metric::SleepScore => "sleepScore",
            Metric::StressLevel => "stressLevel",
            Metric::Spo2 => "spo2",
            Metric::Hrv => "hrv",
            Metric::RestingHr => "restingHr",
            Metric::Weight => "weight",
            Metric::Steps => "steps",
            Metric::Calories => "calories",
            Metric::Efficiency => "efficiency",
            Metric::DistanceKm => "distanceKm",
            Metric::AvgHr => "avgHr",
            Metric::ElevationGain => "totalElevationGain",
            Metric::AvgPower => "avgPower",
            Metric::Duration => "durationMinutes",
        }
    }

    /// Human readable name.
    pub fn label(&self) -> &'static str {
        match self {
            Metric::SleepScore => "Sleep Score",
            Metric::StressLevel => "Stress Level",
            Metric::Spo2 => "SpO2",
            Metric::Hrv => "HRV",
            Metric::RestingHr => "Resting HR",
            Metric::Weight => "Weight",
            Metric::Steps => "Steps",
            Metric::Calories => "Calories",
            Metric::Efficiency => "Efficiency (EF)",
            Metric::DistanceKm => "Distance",
            Metric::AvgHr => "Avg HR",
            Metric::ElevationGain => "Elevation",
            Metric::AvgPower => "Avg Power",
            Metric::Duration => "Duration",
        }
    }

    pub fn source(&self) -> MetricSource {
        match self {
            Metric::SleepScore
            | Metric::StressLevel
            | Metric::Spo2
            | Metric::Hrv
            | Metric::RestingHr
            | Metric::Weight
            | Metric::Steps
            | Metric::Calories => MetricSource::Log,
            Metric::Efficiency
            | Metric::DistanceKm
            | Metric::AvgHr
            | Metric::ElevationGain
            | Metric::AvgPower
            | Metric::Duration => MetricSource::Activity,
        }
    }

    /// Display unit, empty for unitless scores.
    pub fn unit(&self) -> &'static str {
        match self {
            Metric::SleepScore | Metric::StressLevel | Metric::Efficiency | Metric::Steps => "",
            Metric::Spo2 => "%",
            Metric::Hrv => "ms",
            Metric::RestingHr | Metric::AvgHr => "bpm",
            Metric::Weight => "kg",
            Metric::Calories => "kcal",
            Metric::DistanceKm => "km",
            Metric::ElevationGain => "m",
            Metric::AvgPower => "W",
            Metric::Duration => "min",
        }
    }

    pub fn preferred_direction(&self) -> PreferredDirection {
        match self {
            Metric::StressLevel | Metric::RestingHr | Metric::Weight | Metric::AvgHr => {
                PreferredDirection::Lower
            }
            _ => PreferredDirection::Higher,
        }
    }

    /// Value of a log metric; `None` for activity metrics or absent fields.
    pub fn from_log(&self, log: &DailyLog) -> Option<f64> {
        match self {
            Metric::SleepScore => log.sleep_score,
            Metric::StressLevel => log.stress,
            Metric::Spo2 => log.spo2,
            Metric::Hrv => log.hrv,
            Metric::RestingHr => log.resting_hr,
            Metric::Weight => log.weight,
            Metric::Steps => log.steps.map(f64::from),
            Metric::Calories => log.calories.map(f64::from),
            _ => None,
        }
    }

    /// Value of an activity metric; `None` for log metrics.
    ///
    /// Activity summaries always carry every field, so activity metrics are
    /// always present (possibly 0).
    pub fn from_activity(&self, activity: &ActivitySummary) -> Option<f64> {
        match self {
            Metric::Efficiency => Some(activity.efficiency),
            Metric::DistanceKm => Some(activity.distance_km),
            Metric::AvgHr => Some(activity.avg_hr),
            Metric::ElevationGain => Some(activity.elevation_gain_m),
            Metric::AvgPower => Some(activity.avg_power),
            Metric::Duration => Some(f64::from(activity.duration_minutes)),
            _ => None,
        }
    }

    /// Metrics read from a given source.
    pub fn for_source(source: MetricSource) -> impl Iterator<Item = Metric> {
        Metric::ALL.into_iter().filter(move |m| m.source() == source)
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Metric {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Metric::ALL
            .into_iter()
            .find(|m| m.key() == s)
            .ok_or_unknown_metric(s)
    }
}
