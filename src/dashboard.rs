//! Dashboard facade: one snapshot of every derived view.
//!
//! Pulls all collections from an [`AnalyticsStore`] once and runs the
//! analytics over them. The memoized variant reuses timelines and correlation
//! outcomes across snapshots for as long as the store version is unchanged.

use chrono::{DateTime, Utc};
use log::info;
use serde::{Deserialize, Serialize};

use crate::achievements::{achievement_progress, AchievementProgress};
use crate::catalogue::Metric;
use crate::correlation::{correlate_with_config, CorrelationConfig, CorrelationOutcome, CorrelationRequest};
use crate::error::Result;
use crate::memo::AnalyticsMemo;
use crate::overview::Overview;
use crate::store::AnalyticsStore;
use crate::training_load::{fitness_timeline_with_config, FitnessMetric, FormStatus, LoadConfig};
use crate::{utc_date, ActivitySummary, DailyLog, UserProfile};

/// Everything the dashboard shows, as of one instant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardSnapshot {
    pub as_of: DateTime<Utc>,
    pub athlete: Option<String>,
    pub age: Option<u32>,
    pub activity_count: usize,
    pub log_count: usize,
    /// Most recent activity, without its raw track
    pub latest_activity: Option<ActivitySummary>,
    pub timeline: Vec<FitnessMetric>,
    pub form_status: Option<FormStatus>,
    pub overview: Overview,
    pub achievements: AchievementProgress,
    /// Default pairing shown on first load: sleep score against efficiency
    pub correlation: CorrelationOutcome,
}

impl DashboardSnapshot {
    /// Metric pair correlated by default.
    pub const DEFAULT_CORRELATION: (Metric, Metric) = (Metric::SleepScore, Metric::Efficiency);

    /// Build a snapshot without memoization.
    pub fn build(store: &dyn AnalyticsStore, as_of: DateTime<Utc>) -> Result<Self> {
        let (activities, logs, profile) = fetch(store)?;
        let request = default_request();
        let timeline =
            fitness_timeline_with_config(&activities, profile.as_ref(), as_of, &LoadConfig::default());
        let correlation =
            correlate_with_config(&activities, &logs, &request, &CorrelationConfig::default());
        Ok(Self::assemble(activities, logs, profile, as_of, timeline, correlation))
    }

    /// Build a snapshot, reusing results cached under the store's version.
    ///
    /// Timeline and correlation use the configs the memo was built with.
    pub fn build_with_memo(
        store: &dyn AnalyticsStore,
        as_of: DateTime<Utc>,
        memo: &mut AnalyticsMemo,
    ) -> Result<Self> {
        let version = store.version();
        let (activities, logs, profile) = fetch(store)?;
        let request = default_request();
        let timeline = memo.get_or_compute_timeline(version, &activities, profile.as_ref(), as_of);
        let correlation = memo.get_or_compute_correlation(version, &activities, &logs, &request);
        memo.retain_version(version);
        Ok(Self::assemble(activities, logs, profile, as_of, timeline, correlation))
    }

    fn assemble(
        activities: Vec<ActivitySummary>,
        logs: Vec<DailyLog>,
        profile: Option<UserProfile>,
        as_of: DateTime<Utc>,
        timeline: Vec<FitnessMetric>,
        correlation: CorrelationOutcome,
    ) -> Self {
        let today = utc_date(as_of);
        let latest_activity = activities
            .iter()
            .filter(|a| a.timestamp <= as_of)
            .max_by_key(|a| a.timestamp)
            .map(ActivitySummary::without_points);
        let form_status = timeline.last().map(FitnessMetric::form_status);

        let snapshot = Self {
            as_of,
            athlete: profile.as_ref().map(|p| p.name.clone()),
            age: profile.as_ref().and_then(|p| p.age_on(today).ok()),
            activity_count: activities.len(),
            log_count: logs.len(),
            latest_activity,
            overview: Overview::build(&activities, &logs, as_of),
            achievements: achievement_progress(&activities),
            timeline,
            form_status,
            correlation,
        };

        info!(
            "[Dashboard] Snapshot for {}: {} activities, {} logs, {} timeline days, form {:?}",
            today,
            snapshot.activity_count,
            snapshot.log_count,
            snapshot.timeline.len(),
            snapshot.form_status
        );

        snapshot
    }

    /// Latest day of the fitness timeline.
    pub fn current_fitness(&self) -> Option<&FitnessMetric> {
        self.timeline.last()
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }
}

fn default_request() -> CorrelationRequest {
    let (x, y) = DashboardSnapshot::DEFAULT_CORRELATION;
    CorrelationRequest::new(x, y)
}

type Collections = (Vec<ActivitySummary>, Vec<DailyLog>, Option<UserProfile>);

fn fetch(store: &dyn AnalyticsStore) -> Result<Collections> {
    Ok((store.activities()?, store.daily_logs()?, store.profile()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalyticsError;
    use crate::store::InMemoryStore;
    use chrono::{Duration, NaiveDate, TimeZone};

    struct FailingStore;

    impl AnalyticsStore for FailingStore {
        fn activities(&self) -> Result<Vec<ActivitySummary>> {
            Err(AnalyticsError::Store {
                message: "disk unavailable".to_string(),
            })
        }
        fn daily_logs(&self) -> Result<Vec<DailyLog>> {
            Ok(Vec::new())
        }
        fn profile(&self) -> Result<Option<UserProfile>> {
            Ok(None)
        }
        fn version(&self) -> u64 {
            0
        }
    }

    #[test]
    fn test_empty_store() {
        let as_of = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let snapshot = DashboardSnapshot::build(&InMemoryStore::new(), as_of).unwrap();
        assert!(snapshot.timeline.is_empty());
        assert!(snapshot.form_status.is_none());
        assert!(snapshot.latest_activity.is_none());
        assert_eq!(snapshot.achievements.xp, 0);
        assert_eq!(
            snapshot.correlation,
            CorrelationOutcome::Insufficient { pairs: 0, required: 3 }
        );
    }

    #[test]
    fn test_store_error_propagates() {
        let as_of = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        assert!(matches!(
            DashboardSnapshot::build(&FailingStore, as_of),
            Err(AnalyticsError::Store { .. })
        ));
    }

    #[test]
    fn test_snapshot_with_data() {
        let start = Utc.with_ymd_and_hms(2024, 4, 1, 7, 0, 0).unwrap();
        let mut store = InMemoryStore::new();
        store.save_profile(UserProfile::new("Kim", NaiveDate::from_ymd_opt(1994, 4, 10).unwrap()));
        let mut session = crate::summarize_track(&[]);
        session.id = "act_a".to_string();
        session.timestamp = start;
        session.date = start.date_naive();
        session.avg_hr = 150.0;
        session.duration_minutes = 60;
        session.distance_km = 30.0;
        store.add_activity(session);

        let as_of = start + Duration::days(2);
        let snapshot = DashboardSnapshot::build(&store, as_of).unwrap();
        assert_eq!(snapshot.age, Some(29));
        assert_eq!(snapshot.timeline.len(), 3);
        assert_eq!(snapshot.form_status, Some(FormStatus::LowVolume));
        assert_eq!(snapshot.latest_activity.as_ref().map(|a| a.id.as_str()), Some("act_a"));
        assert_eq!(snapshot.overview.week.distance_km, 30.0);

        let json = snapshot.to_json().unwrap();
        assert!(json.contains("\"timeline\""));
    }

    #[test]
    fn test_memoized_snapshot_reuses_results() {
        let as_of = Utc.with_ymd_and_hms(2024, 4, 3, 12, 0, 0).unwrap();
        let mut store = InMemoryStore::new();
        store.save_daily_log(DailyLog::new(NaiveDate::from_ymd_opt(2024, 4, 2).unwrap()));
        let mut memo = AnalyticsMemo::default();

        let first = DashboardSnapshot::build_with_memo(&store, as_of, &mut memo).unwrap();
        let second = DashboardSnapshot::build_with_memo(&store, as_of, &mut memo).unwrap();
        assert_eq!(first, second);
        assert_eq!(memo.stats().misses, 2);
        assert_eq!(memo.stats().hits, 2);

        store.save_daily_log(DailyLog::new(NaiveDate::from_ymd_opt(2024, 4, 3).unwrap()));
        DashboardSnapshot::build_with_memo(&store, as_of, &mut memo).unwrap();
        assert_eq!(memo.stats().misses, 4);
        assert_eq!(memo.stats().timelines, 1);
    }
}
