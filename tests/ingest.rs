//! Track reduction integration tests.

use chrono::{DateTime, Duration, TimeZone, Utc};
use endurance_lab::geo_utils::EARTH_RADIUS_KM;
use endurance_lab::{summarize_track, summarize_track_with_config, GeoPoint, IngestConfig, ZoneDistribution};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn start() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 7, 14, 6, 30, 0).unwrap()
}

/// Latitude span of exactly one kilometre along a meridian.
fn one_km_in_degrees() -> f64 {
    1.0 / (EARTH_RADIUS_KM * std::f64::consts::PI / 180.0)
}

#[test]
fn test_one_kilometre_in_one_minute() {
    init_logger();
    // 61 samples at 1 Hz spread evenly over one kilometre
    let step = one_km_in_degrees() / 60.0;
    let track: Vec<GeoPoint> = (0..=60)
        .map(|i| {
            GeoPoint::new(start() + Duration::seconds(i), 45.0 + i as f64 * step, 7.0, 300.0)
                .with_heart_rate(150.0)
        })
        .collect();
    let summary = summarize_track(&track);

    assert_eq!(summary.distance_km, 1.0);
    assert_eq!(summary.duration_minutes, 1);
    assert_eq!(summary.zones, ZoneDistribution { z4: 1, ..Default::default() });
}

#[test]
fn test_single_minute_gap_is_a_pause() {
    let track = vec![
        GeoPoint::new(start(), 45.0, 7.0, 300.0).with_heart_rate(150.0),
        GeoPoint::new(start() + Duration::seconds(60), 45.0 + one_km_in_degrees(), 7.0, 300.0)
            .with_heart_rate(150.0),
    ];
    let summary = summarize_track(&track);

    assert_eq!(summary.distance_km, 1.0);
    assert_eq!(summary.duration_minutes, 1);
    assert_eq!(summary.zones.total_minutes(), 0);
}

#[test]
fn test_short_tracks_are_zeroed() {
    init_logger();
    let single = [GeoPoint::new(start(), 45.0, 7.0, 1200.0)];
    for track in [&[][..], &single[..]] {
        let summary = summarize_track(track);
        assert_eq!(summary.distance_km, 0.0);
        assert_eq!(summary.elevation_gain_m, 0.0);
        assert_eq!(summary.duration_minutes, 0);
    }
}

#[test]
fn test_efficiency_without_heart_rate() {
    let track: Vec<GeoPoint> = (0..30)
        .map(|i| GeoPoint::new(start() + Duration::seconds(i), 45.0, 7.0, 0.0).with_power(250.0))
        .collect();
    let summary = summarize_track(&track);
    assert_eq!(summary.avg_power, 250.0);
    assert_eq!(summary.efficiency, 0.0);
}

#[test]
fn test_climb_and_pause() {
    // 10 minutes climbing at 1 Hz, a 5 minute stop, then 10 more minutes
    let mut track = Vec::new();
    let mut ts = start();
    let mut elevation = 500.0;
    for segment in 0..2 {
        for _ in 0..600 {
            track.push(
                GeoPoint::new(ts, 45.0, 7.0, elevation)
                    .with_heart_rate(130.0)
                    .with_cadence(85.0),
            );
            ts += Duration::seconds(1);
            elevation += 0.1;
        }
        if segment == 0 {
            ts += Duration::minutes(5);
        }
    }
    let summary = summarize_track(&track);

    // 1499 s from first to last sample, stop included
    assert_eq!(summary.duration_minutes, 24);
    assert_eq!(summary.elevation_gain_m, 120.0);
    assert_eq!(summary.avg_cadence, 85.0);
    // only the 1198 one-second gaps are zoned: 130/185 = 70.3% -> Z3
    assert_eq!(summary.zones.z3, 20);
    assert_eq!(summary.zones.total_minutes(), 20);

    let strict = IngestConfig {
        pause_threshold_secs: 0.5,
        ..IngestConfig::default()
    };
    assert_eq!(summarize_track_with_config(&track, &strict).zones.total_minutes(), 0);
}

#[test]
fn test_reduction_is_deterministic() {
    let track: Vec<GeoPoint> = (0..500)
        .map(|i| {
            GeoPoint::new(start() + Duration::seconds(i), 45.0 + i as f64 * 1e-4, 7.0, (i % 17) as f64)
                .with_heart_rate(120.0 + (i % 40) as f64)
                .with_power(180.0 + (i % 25) as f64)
        })
        .collect();
    assert_eq!(summarize_track(&track), summarize_track(&track));
}

#[cfg(feature = "parallel")]
#[test]
fn test_parallel_batch_matches_sequential() {
    use endurance_lab::summarize_tracks_parallel;

    let tracks: Vec<Vec<GeoPoint>> = (0..8)
        .map(|t| {
            (0..120)
                .map(|i| {
                    GeoPoint::new(start() + Duration::hours(t) + Duration::seconds(i), 45.0, 7.0 + i as f64 * 1e-4, 0.0)
                        .with_heart_rate(140.0)
                })
                .collect()
        })
        .collect();
    let config = IngestConfig::default();
    let parallel = summarize_tracks_parallel(&tracks, &config);
    let sequential: Vec<_> = tracks.iter().map(|t| summarize_track_with_config(t, &config)).collect();
    assert_eq!(parallel, sequential);
}
