//! Track reduction: one recorded point stream into an [`ActivitySummary`].
//!
//! The input is assumed to be already parsed and validated by the caller
//! (vendor file parsing is not part of this crate). Reduction never fails:
//! empty or single-point tracks produce zeroed summaries.
//!
//! ## Example
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use endurance_lab::{summarize_track, GeoPoint};
//!
//! let start = Utc.with_ymd_and_hms(2024, 4, 2, 18, 0, 0).unwrap();
//! let track = vec![
//!     GeoPoint::new(start, 46.0, 7.0, 400.0).with_heart_rate(120.0),
//!     GeoPoint::new(start + Duration::seconds(5), 46.0005, 7.0, 402.0).with_heart_rate(124.0),
//! ];
//! let summary = summarize_track(&track);
//! assert_eq!(summary.elevation_gain_m, 2.0);
//! assert_eq!(summary.avg_hr, 122.0);
//! ```

use log::debug;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::geo_utils::{elevation_gain_m, round_to, track_length_km};
use crate::zones::{calculate_hr_zones, HrZoneConfig};
use crate::{utc_date, ActivitySummary, GeoPoint};

/// Configuration for track reduction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IngestConfig {
    /// Gaps between samples longer than this are pauses and are not zoned.
    /// Default: 10 seconds
    pub pause_threshold_secs: f64,
    /// Heart rate zone model.
    pub zones: HrZoneConfig,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            pause_threshold_secs: 10.0,
            zones: HrZoneConfig::default(),
        }
    }
}

/// Running mean/max over the samples where a field is present.
#[derive(Debug, Default, Clone, Copy)]
struct FieldStats {
    sum: f64,
    count: usize,
    max: f64,
}

impl FieldStats {
    fn push(&mut self, value: Option<f64>) {
        if let Some(v) = value {
            self.sum += v;
            self.count += 1;
            if v > self.max {
                self.max = v;
            }
        }
    }

    /// Mean rounded to whole units, 0 when nothing was recorded.
    fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            (self.sum / self.count as f64).round()
        }
    }
}

/// Reduce a track to an activity summary with the default configuration.
pub fn summarize_track(points: &[GeoPoint]) -> ActivitySummary {
    summarize_track_with_config(points, &IngestConfig::default())
}

/// Reduce a track to an activity summary.
///
/// - Distance: haversine between consecutive points, rounded to 0.01 km
/// - Elevation gain: positive deltas only, rounded to whole metres
/// - Duration: first to last sample, floored to whole minutes
/// - Averages: over samples where the field is present, rounded to whole units
/// - Efficiency: avg power / avg HR rounded to 2 decimals, 0 without HR
/// - Zones: see [`calculate_hr_zones`]
pub fn summarize_track_with_config(points: &[GeoPoint], config: &IngestConfig) -> ActivitySummary {
    let start = points
        .first()
        .map(|p| p.timestamp)
        .unwrap_or_default();

    let duration_minutes = match (points.first(), points.last()) {
        (Some(first), Some(last)) if points.len() >= 2 => {
            (last.timestamp - first.timestamp).num_seconds().max(0) as u32 / 60
        }
        _ => 0,
    };

    let mut hr = FieldStats::default();
    let mut power = FieldStats::default();
    let mut cadence = FieldStats::default();
    for p in points {
        // A zero heart rate is a dropped sensor reading, not a measurement
        hr.push(p.heart_rate.filter(|v| *v > 0.0));
        power.push(p.power);
        cadence.push(p.cadence);
    }

    let avg_hr = hr.mean();
    let avg_power = power.mean();
    let efficiency = if avg_hr > 0.0 {
        round_to(avg_power / avg_hr, 2)
    } else {
        0.0
    };

    let zones = calculate_hr_zones(points, &config.zones, config.pause_threshold_secs);

    let summary = ActivitySummary {
        id: format!("act_{}", start.timestamp_millis()),
        date: utc_date(start),
        timestamp: start,
        duration_minutes,
        distance_km: round_to(track_length_km(points), 2),
        elevation_gain_m: elevation_gain_m(points).round(),
        avg_hr,
        max_hr: hr.max,
        avg_power,
        max_power: power.max,
        avg_cadence: cadence.mean(),
        efficiency,
        zones,
        points: points.to_vec(),
    };

    debug!(
        "[Ingest] {}: {} points, {:.2} km, {} min, avg HR {}",
        summary.id,
        points.len(),
        summary.distance_km,
        summary.duration_minutes,
        summary.avg_hr
    );

    summary
}

/// Reduce many independent tracks using parallel processing.
#[cfg(feature = "parallel")]
pub fn summarize_tracks_parallel(
    tracks: &[Vec<GeoPoint>],
    config: &IngestConfig,
) -> Vec<ActivitySummary> {
    tracks
        .par_iter()
        .map(|track| summarize_track_with_config(track, config))
        .collect()
}
