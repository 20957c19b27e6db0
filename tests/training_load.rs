//! Fitness timeline integration tests.

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use endurance_lab::{
    calculate_trimp, fitness_timeline, fitness_timeline_with_config, summarize_track, ActivitySummary,
    FormStatus, LoadConfig, UserProfile,
};

fn session(ts: DateTime<Utc>, avg_hr: f64, minutes: u32) -> ActivitySummary {
    let mut summary = summarize_track(&[]);
    summary.id = format!("act_{}", ts.timestamp_millis());
    summary.timestamp = ts;
    summary.date = ts.date_naive();
    summary.avg_hr = avg_hr;
    summary.duration_minutes = minutes;
    summary
}

fn day0() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 4, 17, 45, 0).unwrap()
}

#[test]
fn test_empty_history() {
    assert!(fitness_timeline(&[], None, day0()).is_empty());
}

#[test]
fn test_single_session_observed_same_day() {
    let timeline = fitness_timeline(&[session(day0(), 150.0, 60)], None, day0());
    assert_eq!(timeline.len(), 1);

    let config = LoadConfig::default();
    let load = 100.0;
    let ctl0 = load * (1.0 - config.ctl_decay());
    let atl0 = load * (1.0 - config.atl_decay());

    let day = &timeline[0];
    assert_eq!(day.daily_load, 100);
    assert_eq!(day.ctl, ctl0.round() as u32);
    assert_eq!(day.atl, atl0.round() as u32);
    assert_eq!((day.ctl, day.atl, day.tsb), (2, 13, -11));
    assert_eq!(day.date, day0().date_naive());
}

#[test]
fn test_rest_days_decay() {
    let as_of = day0() + Duration::days(4);
    let timeline = fitness_timeline(&[session(day0(), 150.0, 60)], None, as_of);
    let atl: Vec<u32> = timeline.iter().map(|d| d.atl).collect();
    let ctl: Vec<u32> = timeline.iter().map(|d| d.ctl).collect();
    assert_eq!(atl, vec![13, 12, 10, 9, 8]);
    assert_eq!(ctl, vec![2, 2, 2, 2, 2]);
    assert!(timeline[1..].iter().all(|d| d.daily_load == 0));
}

#[test]
fn test_tsb_is_ctl_minus_atl_every_day() {
    let history: Vec<ActivitySummary> = (0..60)
        .filter(|d| d % 3 != 2)
        .map(|d| session(day0() + Duration::days(d), 135.0 + (d % 5) as f64 * 6.0, 45 + (d % 4) as u32 * 20))
        .collect();
    let timeline = fitness_timeline(&history, None, day0() + Duration::days(70));
    assert_eq!(timeline.len(), 71);
    for day in &timeline {
        assert_eq!(day.tsb, day.ctl as i32 - day.atl as i32);
    }
    // contiguous calendar days
    for pair in timeline.windows(2) {
        assert_eq!(pair[1].date, pair[0].date.succ_opt().unwrap());
    }
}

#[test]
fn test_sessions_after_as_of_ignored() {
    let history = vec![session(day0(), 150.0, 60), session(day0() + Duration::days(5), 170.0, 90)];
    let timeline = fitness_timeline(&history, None, day0() + Duration::days(2));
    assert_eq!(timeline.len(), 3);
    assert!(fitness_timeline(&history, None, day0() - Duration::days(1)).is_empty());
}

#[test]
fn test_profile_age_changes_load() {
    let as_of = day0();
    let young = UserProfile::new("Young", NaiveDate::from_ymd_opt(2000, 1, 1).unwrap());
    let older = UserProfile::new("Older", NaiveDate::from_ymd_opt(1960, 1, 1).unwrap());
    let history = vec![session(day0(), 150.0, 60)];

    let young_load = fitness_timeline(&history, Some(&young), as_of)[0].daily_load;
    let older_load = fitness_timeline(&history, Some(&older), as_of)[0].daily_load;
    assert!(older_load > young_load);
}

#[test]
fn test_extreme_age_guarded() {
    // Age 170: max HR 50 is below the resting HR
    let ancient = UserProfile::new("Ancient", NaiveDate::from_ymd_opt(1854, 1, 1).unwrap());
    let timeline = fitness_timeline(&[session(day0(), 150.0, 60)], Some(&ancient), day0());
    assert_eq!(timeline[0].daily_load, 0);
    assert_eq!(calculate_trimp(150.0, 60, 50.0, &LoadConfig::default()), 0);
}

#[test]
fn test_sustained_block_reaches_high_strain() {
    // Two weeks of hard daily sessions after a long base
    let mut history: Vec<ActivitySummary> = (0..90)
        .map(|d| session(day0() + Duration::days(d), 145.0, 60))
        .collect();
    history.extend((90..104).map(|d| session(day0() + Duration::days(d), 170.0, 150)));

    let config = LoadConfig::default();
    let timeline = fitness_timeline_with_config(&history, None, day0() + Duration::days(103), &config);
    let last = timeline.last().unwrap();
    assert!(last.ctl >= 20);
    assert!(last.tsb < -10);
    assert!(matches!(last.form_status(), FormStatus::HighStrain | FormStatus::Overload));
}
