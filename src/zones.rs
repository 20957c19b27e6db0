//! Heart rate zone classification for recorded tracks.
//!
//! Zones are five ordered intensity bands defined as fractions of a reference
//! maximum heart rate. Time in zone is weighted by the real gap between
//! consecutive samples, so irregular sampling rates are handled correctly.
//!
//! ## Example
//! ```rust
//! use endurance_lab::zones::HrZoneConfig;
//!
//! let config = HrZoneConfig::default();
//! let reference = config.reference_max_hr(172.0); // floor of 185 applies
//! assert_eq!(config.get_zone(150.0, reference), 4);
//! ```

use serde::{Deserialize, Serialize};

use crate::GeoPoint;

/// Configuration for heart rate zone calculation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HrZoneConfig {
    /// Lowest reference max HR used for classification. Sessions with little
    /// or low heart rate data would otherwise produce inflated percentages.
    /// Default: 185 bpm
    pub reference_floor_hr: f64,
    /// Upper bounds (exclusive) of Z1..Z4 as fractions of the reference max HR.
    /// Z5 is everything at or above the last threshold.
    /// Default: [0.60, 0.70, 0.80, 0.90]
    pub zone_thresholds: [f64; 4],
}

impl HrZoneConfig {
    /// Create config with a custom reference floor and thresholds.
    pub fn with_thresholds(reference_floor_hr: f64, zone_thresholds: [f64; 4]) -> Self {
        Self {
            reference_floor_hr,
            zone_thresholds,
        }
    }

    /// Reference max HR for a session: the observed max, never below the floor.
    pub fn reference_max_hr(&self, observed_max_hr: f64) -> f64 {
        observed_max_hr.max(self.reference_floor_hr)
    }

    /// Determine which zone (1-5) a heart rate falls into.
    pub fn get_zone(&self, hr: f64, reference_max_hr: f64) -> u8 {
        let ratio = hr / reference_max_hr;
        for (i, &threshold) in self.zone_thresholds.iter().enumerate() {
            if ratio < threshold {
                return (i + 1) as u8;
            }
        }
        5
    }
}

impl Default for HrZoneConfig {
    fn default() -> Self {
        Self::with_thresholds(185.0, [0.60, 0.70, 0.80, 0.90])
    }
}

/// Whole minutes spent in each of the five heart rate zones.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ZoneDistribution {
    pub z1: u32,
    pub z2: u32,
    pub z3: u32,
    pub z4: u32,
    pub z5: u32,
}

impl ZoneDistribution {
    /// Minutes for a specific zone (1-5); 0 for anything else.
    pub fn get_zone_minutes(&self, zone: u8) -> u32 {
        match zone {
            1 => self.z1,
            2 => self.z2,
            3 => self.z3,
            4 => self.z4,
            5 => self.z5,
            _ => 0,
        }
    }

    /// Total minutes attributed to any zone.
    pub fn total_minutes(&self) -> u32 {
        self.z1 + self.z2 + self.z3 + self.z4 + self.z5
    }

    /// Share of zoned time per zone, in percent. All zeros when nothing was zoned.
    pub fn zone_percentages(&self) -> [f32; 5] {
        let total = self.total_minutes();
        if total == 0 {
            return [0.0; 5];
        }
        let mut out = [0.0f32; 5];
        for (i, slot) in out.iter_mut().enumerate() {
            *slot = self.get_zone_minutes((i + 1) as u8) as f32 / total as f32 * 100.0;
        }
        out
    }
}

/// Accumulates zone time in seconds and converts to minutes once at the end,
/// so sub-minute intervals are not lost to per-interval rounding.
#[derive(Debug, Clone, Default)]
pub(crate) struct ZoneAccumulator {
    seconds: [f64; 5],
}

impl ZoneAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a duration to a zone (1-5). Other zone numbers are ignored.
    pub fn add(&mut self, zone: u8, seconds: f64) {
        if (1..=5).contains(&zone) {
            self.seconds[(zone - 1) as usize] += seconds;
        }
    }

    /// Round each zone's accumulated seconds to whole minutes.
    pub fn finish(&self) -> ZoneDistribution {
        let minutes = |s: f64| (s / 60.0).round() as u32;
        ZoneDistribution {
            z1: minutes(self.seconds[0]),
            z2: minutes(self.seconds[1]),
            z3: minutes(self.seconds[2]),
            z4: minutes(self.seconds[3]),
            z5: minutes(self.seconds[4]),
        }
    }
}

/// Calculate time in heart rate zones for a track.
///
/// Each consecutive point pair contributes its time gap to the zone of the
/// first point's heart rate. Pairs with a gap above `pause_threshold_secs`
/// are treated as pauses, and pairs whose first point has no (or zero) heart
/// rate are skipped; neither is attributed to any zone.
///
/// # Arguments
/// * `points` - Chronologically ordered track points
/// * `config` - HR zone configuration
/// * `pause_threshold_secs` - Largest gap still counted as continuous recording
pub fn calculate_hr_zones(
    points: &[GeoPoint],
    config: &HrZoneConfig,
    pause_threshold_secs: f64,
) -> ZoneDistribution {
    let observed_max = points
        .iter()
        .filter_map(|p| p.heart_rate)
        .fold(0.0f64, f64::max);
    let reference = config.reference_max_hr(observed_max);

    let mut acc = ZoneAccumulator::new();
    for pair in points.windows(2) {
        let gap_secs = (pair[1].timestamp - pair[0].timestamp).num_milliseconds() as f64 / 1000.0;
        if gap_secs > pause_threshold_secs || gap_secs < 0.0 {
            continue;
        }
        let hr = match pair[0].heart_rate {
            Some(hr) if hr > 0.0 => hr,
            _ => continue,
        };
        acc.add(config.get_zone(hr, reference), gap_secs);
    }

    acc.finish()
}
