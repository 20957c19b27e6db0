//! # Endurance Lab
//!
//! Quantitative analytics for a personal endurance-training dashboard.
//!
//! This library provides:
//! - Track reduction: distance, elevation gain, averages and heart rate zone time
//!   from a recorded GPS/biometric point stream
//! - Training load modelling: Banister TRIMP per session and a daily
//!   Fitness/Fatigue/Form (CTL/ATL/TSB) timeline
//! - Metric correlation: align any two catalogue metrics by day, optionally
//!   smoothed or lagged, and compute Pearson r, a linear trend and an
//!   interpretation
//!
//! All analytics are pure functions of their inputs. Storage, file parsing and
//! presentation are left to the caller; see [`store::AnalyticsStore`] for the
//! boundary the dashboard facade expects.
//!
//! ## Features
//!
//! - **`parallel`** - Enable parallel batch ingestion with rayon
//!
//! ## Quick Start
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use endurance_lab::{summarize_track, fitness_timeline, GeoPoint};
//!
//! let start = Utc.with_ymd_and_hms(2024, 5, 1, 7, 0, 0).unwrap();
//! let points: Vec<GeoPoint> = (0..600)
//!     .map(|i| {
//!         GeoPoint::new(start + Duration::seconds(i), 46.0 + i as f64 * 0.0001, 7.0, 500.0)
//!             .with_heart_rate(145.0)
//!             .with_power(210.0)
//!     })
//!     .collect();
//!
//! let summary = summarize_track(&points);
//! assert_eq!(summary.duration_minutes, 9);
//!
//! let timeline = fitness_timeline(&[summary], None, start + Duration::days(3));
//! assert_eq!(timeline.len(), 4);
//! ```

use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{AnalyticsError, OptionExt, Result};

// Geographic utilities (haversine, elevation gain, rounding)
pub mod geo_utils;

// Heart rate zone classification
pub mod zones;
pub use zones::{calculate_hr_zones, HrZoneConfig, ZoneDistribution};

// Track reduction into activity summaries
pub mod ingest;
#[cfg(feature = "parallel")]
pub use ingest::summarize_tracks_parallel;
pub use ingest::{summarize_track, summarize_track_with_config, IngestConfig};

// Training load (TRIMP, CTL/ATL/TSB)
pub mod training_load;
pub use training_load::{
    calculate_trimp, daily_loads, fitness_timeline, fitness_timeline_with_config, FitnessMetric,
    FormStatus, LoadConfig,
};

// Metric catalogue for correlation analysis
pub mod catalogue;
pub use catalogue::{Metric, MetricSource, PreferredDirection};

// Correlation engine
pub mod correlation;
pub use correlation::{
    correlate, correlate_with_config, unify_records, CorrelationConfig, CorrelationOutcome,
    CorrelationReport, CorrelationRequest, Interpretation, UnifiedDay,
};

// LRU memo for repeated dashboard queries
pub mod memo;
pub use memo::{AnalyticsMemo, CorrelationKey, LruCache, TimelineKey};

// Persistence boundary
pub mod store;
pub use store::{AnalyticsStore, InMemoryStore};

// Period totals and trends
pub mod overview;
pub use overview::{period_stats, trend_percent, Overview, PeriodStats};

// XP, levels and milestones
pub mod achievements;
pub use achievements::{achievement_progress, AchievementProgress};

// Dashboard facade
pub mod dashboard;
pub use dashboard::DashboardSnapshot;

// ============================================================================
// Core Types
// ============================================================================

/// A single recorded sample: position, elevation and optional sensor values.
///
/// # Example
/// ```
/// use chrono::Utc;
/// use endurance_lab::GeoPoint;
///
/// let p = GeoPoint::new(Utc::now(), 46.5197, 6.6323, 372.0).with_heart_rate(142.0);
/// assert!(p.is_valid());
/// assert_eq!(p.power, None);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub timestamp: DateTime<Utc>,
    pub latitude: f64,
    pub longitude: f64,
    /// Elevation in metres
    pub elevation: f64,
    /// Power in watts
    pub power: Option<f64>,
    /// Heart rate in bpm
    pub heart_rate: Option<f64>,
    /// Cadence in rpm
    pub cadence: Option<f64>,
}

impl GeoPoint {
    /// Create a point without sensor values.
    pub fn new(timestamp: DateTime<Utc>, latitude: f64, longitude: f64, elevation: f64) -> Self {
        Self {
            timestamp,
            latitude,
            longitude,
            elevation,
            power: None,
            heart_rate: None,
            cadence: None,
        }
    }

    pub fn with_heart_rate(mut self, bpm: f64) -> Self {
        self.heart_rate = Some(bpm);
        self
    }

    pub fn with_power(mut self, watts: f64) -> Self {
        self.power = Some(watts);
        self
    }

    pub fn with_cadence(mut self, rpm: f64) -> Self {
        self.cadence = Some(rpm);
        self
    }

    /// Check if the point has finite, in-range coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.elevation.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

/// Reduced statistics for one recorded session.
///
/// Created once per ingested recording and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivitySummary {
    /// `act_<start unix millis>`
    pub id: String,
    /// UTC calendar date of the first sample
    pub date: NaiveDate,
    /// Timestamp of the first sample
    pub timestamp: DateTime<Utc>,
    pub duration_minutes: u32,
    pub distance_km: f64,
    pub elevation_gain_m: f64,
    pub avg_hr: f64,
    pub max_hr: f64,
    pub avg_power: f64,
    pub max_power: f64,
    pub avg_cadence: f64,
    /// Efficiency factor: avg power / avg HR (0 when there is no HR)
    pub efficiency: f64,
    pub zones: ZoneDistribution,
    /// Raw samples; may be empty for records loaded without their track
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub points: Vec<GeoPoint>,
}

impl ActivitySummary {
    /// Copy of this summary without the raw track, for lightweight storage.
    pub fn without_points(&self) -> Self {
        Self {
            points: Vec::new(),
            ..self.clone()
        }
    }
}

/// Sleep phase minutes reported by a wearable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct SleepBreakdown {
    pub deep: f64,
    pub light: f64,
    pub rem: f64,
    pub awake: f64,
}

/// External recovery metrics for one calendar day. All values are optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyLog {
    pub date: NaiveDate,
    pub timestamp: DateTime<Utc>,
    pub steps: Option<u32>,
    pub calories: Option<u32>,
    pub sleep_score: Option<f64>,
    pub sleep_breakdown: Option<SleepBreakdown>,
    /// Body weight in kg
    pub weight: Option<f64>,
    /// Heart rate variability in ms
    pub hrv: Option<f64>,
    /// Blood oxygen saturation in %
    pub spo2: Option<f64>,
    /// Stress score, 0-100
    pub stress: Option<f64>,
    /// Resting heart rate in bpm
    pub resting_hr: Option<f64>,
    pub notes: Option<String>,
}

impl DailyLog {
    /// Empty log for a date, stamped at midnight UTC.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            timestamp: date.and_time(NaiveTime::MIN).and_utc(),
            ..Default::default()
        }
    }

    /// Merge a newer log for the same day into this one.
    ///
    /// Fields present in `newer` overwrite; fields it leaves empty are kept.
    /// The date and timestamp of `self` are kept.
    pub fn merge_from(&mut self, newer: &DailyLog) {
        macro_rules! take {
            ($($field:ident),*) => {
                $(if newer.$field.is_some() {
                    self.$field = newer.$field.clone();
                })*
            };
        }
        take!(
            steps,
            calories,
            sleep_score,
            sleep_breakdown,
            weight,
            hrv,
            spo2,
            stress,
            resting_hr,
            notes
        );
    }
}

/// Athlete profile. Only the birthdate is used by the analytics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub birthdate: NaiveDate,
    pub height_cm: Option<f64>,
    pub weight_kg: Option<f64>,
    pub main_goal: Option<String>,
}

impl UserProfile {
    pub fn new(name: &str, birthdate: NaiveDate) -> Self {
        Self {
            name: name.to_string(),
            birthdate,
            height_cm: None,
            weight_kg: None,
            main_goal: None,
        }
    }

    /// Age in whole years on a given date.
    ///
    /// Returns an error if the birthdate lies after `on`.
    pub fn age_on(&self, on: NaiveDate) -> Result<u32> {
        if self.birthdate > on {
            return Err(AnalyticsError::InvalidProfile {
                message: format!("birthdate {} is after {}", self.birthdate, on),
            });
        }
        let mut age = on.year() - self.birthdate.year();
        if (on.month(), on.day()) < (self.birthdate.month(), self.birthdate.day()) {
            age -= 1;
        }
        Ok(age.max(0) as u32)
    }
}

/// UTC calendar date of a timestamp.
#[inline]
pub(crate) fn utc_date(ts: DateTime<Utc>) -> NaiveDate {
    ts.date_naive()
}

// ============================================================================
// Tests
// ============================================================================
