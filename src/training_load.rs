//! Training load calculations (TRIMP, CTL/ATL/TSB).
//!
//! Implements a Banister impulse-response model:
//! - TRIMP (Training Impulse): per-session load from heart rate reserve and duration
//! - CTL (Chronic Training Load, "Fitness"): 42-day exponentially weighted average
//! - ATL (Acute Training Load, "Fatigue"): 7-day exponentially weighted average
//! - TSB (Training Stress Balance, "Form"): CTL - ATL
//!
//! The timeline is contiguous: every calendar day from the first session
//! through `as_of` gets an entry, with zero load on rest days.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::{utc_date, ActivitySummary, UserProfile};

/// Configuration for the training load model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadConfig {
    /// Resting heart rate used for heart rate reserve.
    /// Default: 60 bpm
    pub resting_hr: f64,
    /// Age assumed when no usable profile is available.
    /// Default: 30
    pub default_age: u32,
    /// CTL time constant in days. Default: 42
    pub ctl_days: f64,
    /// ATL time constant in days. Default: 7
    pub atl_days: f64,
    /// TRIMP weighting factor. Default: 0.64
    pub trimp_weight: f64,
    /// TRIMP exponential factor. Default: 1.92
    pub trimp_exponent: f64,
}

impl LoadConfig {
    /// Daily retention factor for CTL: e^(-1/ctl_days).
    pub fn ctl_decay(&self) -> f64 {
        (-1.0 / self.ctl_days).exp()
    }

    /// Daily retention factor for ATL: e^(-1/atl_days).
    pub fn atl_decay(&self) -> f64 {
        (-1.0 / self.atl_days).exp()
    }

    /// Age-predicted max heart rate (220 - age) on a given date.
    ///
    /// Falls back to `default_age` without a profile, or when the profile's
    /// birthdate is unusable.
    pub fn max_hr(&self, profile: Option<&UserProfile>, on: NaiveDate) -> f64 {
        let age = match profile.map(|p| p.age_on(on)) {
            Some(Ok(age)) => age,
            Some(Err(err)) => {
                warn!("[TrainingLoad] {}; using default age {}", err, self.default_age);
                self.default_age
            }
            None => self.default_age,
        };
        220.0 - age as f64
    }
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            resting_hr: 60.0,
            default_age: 30,
            ctl_days: 42.0,
            atl_days: 7.0,
            trimp_weight: 0.64,
            trimp_exponent: 1.92,
        }
    }
}

/// Banister TRIMP for one session.
///
/// `duration * hrr * weight * e^(exponent * hrr)` where
/// `hrr = max(0, (avg_hr - resting) / (max_hr - resting))`, rounded to a whole
/// number. Sessions without heart rate or duration score 0, as does a max HR
/// at or below the resting HR.
pub fn calculate_trimp(avg_hr: f64, duration_minutes: u32, max_hr: f64, config: &LoadConfig) -> u32 {
    if avg_hr <= 0.0 || duration_minutes == 0 {
        return 0;
    }
    let reserve_range = max_hr - config.resting_hr;
    if reserve_range <= 0.0 {
        return 0;
    }
    let hr_reserve = ((avg_hr - config.resting_hr) / reserve_range).max(0.0);
    let trimp = duration_minutes as f64
        * hr_reserve
        * config.trimp_weight
        * (config.trimp_exponent * hr_reserve).exp();
    trimp.round() as u32
}

/// Summed TRIMP per UTC calendar date, for sessions up to and including `as_of`.
pub fn daily_loads(
    history: &[ActivitySummary],
    profile: Option<&UserProfile>,
    as_of: NaiveDate,
    config: &LoadConfig,
) -> BTreeMap<NaiveDate, u32> {
    let max_hr = config.max_hr(profile, as_of);
    let mut loads = BTreeMap::new();
    for activity in history {
        let date = utc_date(activity.timestamp);
        if date > as_of {
            continue;
        }
        let trimp = calculate_trimp(activity.avg_hr, activity.duration_minutes, max_hr, config);
        *loads.entry(date).or_insert(0) += trimp;
    }
    loads
}

/// Unrounded CTL/ATL carried from one day to the next.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct LoadState {
    pub ctl: f64,
    pub atl: f64,
}

impl LoadState {
    /// Advance one day with the given daily load.
    pub fn step(&self, daily_load: f64, ctl_decay: f64, atl_decay: f64) -> LoadState {
        LoadState {
            ctl: self.ctl * ctl_decay + daily_load * (1.0 - ctl_decay),
            atl: self.atl * atl_decay + daily_load * (1.0 - atl_decay),
        }
    }
}

/// One day of the fitness timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FitnessMetric {
    pub date: NaiveDate,
    /// Midnight UTC of `date`
    pub timestamp: DateTime<Utc>,
    /// Summed TRIMP for the day
    pub daily_load: u32,
    /// Fitness, rounded
    pub ctl: u32,
    /// Fatigue, rounded
    pub atl: u32,
    /// Form: always exactly `ctl - atl`
    pub tsb: i32,
}

impl FitnessMetric {
    fn from_state(date: NaiveDate, daily_load: u32, state: &LoadState) -> Self {
        let ctl = state.ctl.round().max(0.0) as u32;
        let atl = state.atl.round().max(0.0) as u32;
        Self {
            date,
            timestamp: date.and_time(NaiveTime::MIN).and_utc(),
            daily_load,
            ctl,
            atl,
            tsb: ctl as i32 - atl as i32,
        }
    }

    /// Readiness classification for this day.
    pub fn form_status(&self) -> FormStatus {
        FormStatus::classify(self.tsb, self.ctl)
    }
}

/// Build the daily fitness timeline with the default configuration.
///
/// `as_of` is "today": the timeline runs from the first session's date
/// through the date of `as_of`, inclusive.
pub fn fitness_timeline(
    history: &[ActivitySummary],
    profile: Option<&UserProfile>,
    as_of: DateTime<Utc>,
) -> Vec<FitnessMetric> {
    fitness_timeline_with_config(history, profile, as_of, &LoadConfig::default())
}

/// Build the daily fitness timeline.
///
/// Running values stay unrounded between days; only emitted values are rounded.
/// Empty history, or an `as_of` before every session, yields an empty timeline.
pub fn fitness_timeline_with_config(
    history: &[ActivitySummary],
    profile: Option<&UserProfile>,
    as_of: DateTime<Utc>,
    config: &LoadConfig,
) -> Vec<FitnessMetric> {
    let end = utc_date(as_of);
    let loads = daily_loads(history, profile, end, config);

    let start = match loads.keys().next() {
        Some(first) => *first,
        None => return Vec::new(),
    };

    let ctl_decay = config.ctl_decay();
    let atl_decay = config.atl_decay();

    let mut state = LoadState::default();
    let timeline: Vec<FitnessMetric> = start
        .iter_days()
        .take_while(|date| *date <= end)
        .map(|date| {
            let load = loads.get(&date).copied().unwrap_or(0);
            state = state.step(load as f64, ctl_decay, atl_decay);
            FitnessMetric::from_state(date, load, &state)
        })
        .collect();

    debug!(
        "[TrainingLoad] {} sessions -> {} days ({} to {})",
        history.len(),
        timeline.len(),
        start,
        end
    );

    timeline
}

/// Readiness classification from form (TSB) and fitness (CTL).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormStatus {
    /// CTL < 20: too little training for TSB to mean much.
    LowVolume,
    /// TSB > 25: very rested; fitness fades if prolonged.
    Recovery,
    /// TSB 6..=25: fresh and fit.
    PerformanceReady,
    /// TSB -10..=5: absorbing training well.
    Maintenance,
    /// TSB -30..=-11: heavy block, fatigue is high.
    HighStrain,
    /// TSB < -30: excessive fatigue.
    Overload,
}

impl FormStatus {
    pub fn classify(tsb: i32, ctl: u32) -> Self {
        if ctl < 20 {
            FormStatus::LowVolume
        } else if tsb > 25 {
            FormStatus::Recovery
        } else if tsb > 5 {
            FormStatus::PerformanceReady
        } else if tsb >= -10 {
            FormStatus::Maintenance
        } else if tsb >= -30 {
            FormStatus::HighStrain
        } else {
            FormStatus::Overload
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            FormStatus::LowVolume => "LOW VOLUME / DETRAINING",
            FormStatus::Recovery => "RECOVERY / TAPERING",
            FormStatus::PerformanceReady => "PERFORMANCE READY",
            FormStatus::Maintenance => "MAINTENANCE / PRODUCTIVE",
            FormStatus::HighStrain => "HIGH STRAIN (BUILD)",
            FormStatus::Overload => "OVERLOAD WARNING",
        }
    }

    /// Get recommendation text.
    pub fn recommendation(&self) -> &'static str {
        match self {
            FormStatus::LowVolume => {
                "Training load is very low. Consistency is key to building a base."
            }
            FormStatus::Recovery => {
                "Very rested. Good for race tapering, but fitness drops if prolonged."
            }
            FormStatus::PerformanceReady => {
                "Fresh and fit! You are in the sweet spot for a peak performance."
            }
            FormStatus::Maintenance => "Balanced load. You are absorbing training well.",
            FormStatus::HighStrain => {
                "Heavy training block. Fitness is building, but fatigue is high."
            }
            FormStatus::Overload => {
                "Excessive fatigue. High risk of injury or burnout. Take a rest week."
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn session(ts: DateTime<Utc>, avg_hr: f64, minutes: u32) -> ActivitySummary {
        let mut summary = crate::summarize_track(&[]);
        summary.id = format!("act_{}", ts.timestamp_millis());
        summary.timestamp = ts;
        summary.date = ts.date_naive();
        summary.avg_hr = avg_hr;
        summary.duration_minutes = minutes;
        summary
    }

    #[test]
    fn test_trimp_default_profile() {
        // age 30 -> max HR 190, hrr = 90/130
        let config = LoadConfig::default();
        assert_eq!(calculate_trimp(150.0, 60, 190.0, &config), 100);
    }

    #[test]
    fn test_trimp_zero_inputs() {
        let config = LoadConfig::default();
        assert_eq!(calculate_trimp(0.0, 60, 190.0, &config), 0);
        assert_eq!(calculate_trimp(150.0, 0, 190.0, &config), 0);
        // Below resting HR clamps to 0
        assert_eq!(calculate_trimp(50.0, 60, 190.0, &config), 0);
        // Degenerate max HR guarded
        assert_eq!(calculate_trimp(150.0, 60, 60.0, &config), 0);
        assert_eq!(calculate_trimp(150.0, 60, 40.0, &config), 0);
    }

    #[test]
    fn test_max_hr_from_profile() {
        let config = LoadConfig::default();
        let on = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let profile = UserProfile::new("A", NaiveDate::from_ymd_opt(1984, 1, 1).unwrap());
        assert_eq!(config.max_hr(Some(&profile), on), 180.0);
        assert_eq!(config.max_hr(None, on), 190.0);

        let unborn = UserProfile::new("B", NaiveDate::from_ymd_opt(2030, 1, 1).unwrap());
        assert_eq!(config.max_hr(Some(&unborn), on), 190.0);
    }

    #[test]
    fn test_same_day_sessions_sum() {
        let day = Utc.with_ymd_and_hms(2024, 2, 1, 7, 0, 0).unwrap();
        let history = vec![
            session(day, 150.0, 60),
            session(day + chrono::Duration::hours(10), 150.0, 60),
        ];
        let loads = daily_loads(&history, None, day.date_naive(), &LoadConfig::default());
        assert_eq!(loads.get(&day.date_naive()), Some(&200));
    }

    #[test]
    fn test_state_decays_toward_zero() {
        let config = LoadConfig::default();
        let (cd, ad) = (config.ctl_decay(), config.atl_decay());
        let mut state = LoadState::default().step(100.0, cd, ad);
        for _ in 0..200 {
            let next = state.step(0.0, cd, ad);
            assert!(next.ctl < state.ctl);
            assert!(next.atl < state.atl);
            assert!(next.ctl > 0.0 && next.atl > 0.0);
            state = next;
        }
    }

    #[test]
    fn test_form_status_thresholds() {
        assert_eq!(FormStatus::classify(40, 10), FormStatus::LowVolume);
        assert_eq!(FormStatus::classify(26, 50), FormStatus::Recovery);
        assert_eq!(FormStatus::classify(25, 50), FormStatus::PerformanceReady);
        assert_eq!(FormStatus::classify(5, 50), FormStatus::Maintenance);
        assert_eq!(FormStatus::classify(-10, 50), FormStatus::Maintenance);
        assert_eq!(FormStatus::classify(-11, 50), FormStatus::HighStrain);
        assert_eq!(FormStatus::classify(-30, 50), FormStatus::HighStrain);
        assert_eq!(FormStatus::classify(-31, 50), FormStatus::Overload);
        assert!(!FormStatus::Overload.recommendation().is_empty());
    }
}
