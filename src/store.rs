//! Persistence boundary.
//!
//! The analytics never read storage themselves: callers fetch collections
//! through an [`AnalyticsStore`] and pass them in. [`InMemoryStore`] is the
//! reference implementation used by the dashboard facade and the tests.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{OptionExt, Result};
use crate::{utc_date, ActivitySummary, DailyLog, UserProfile};

/// Read access to the collections the analytics consume.
pub trait AnalyticsStore {
    /// All activity summaries, newest first.
    fn activities(&self) -> Result<Vec<ActivitySummary>>;

    /// All daily logs (at most one per date), newest first.
    fn daily_logs(&self) -> Result<Vec<DailyLog>>;

    /// The athlete profile, if one was saved.
    fn profile(&self) -> Result<Option<UserProfile>>;

    /// Monotonic counter that changes on every write; used as a memo version.
    fn version(&self) -> u64;
}

/// Full contents of a store, for export and import.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    pub profile: Option<UserProfile>,
    pub history: Vec<ActivitySummary>,
    pub logs: Vec<DailyLog>,
}

/// In-memory store: activities keyed by id, logs keyed by date.
#[derive(Debug, Clone, Default)]
pub struct InMemoryStore {
    activities: BTreeMap<String, ActivitySummary>,
    logs: BTreeMap<NaiveDate, DailyLog>,
    profile: Option<UserProfile>,
    version: u64,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn bump(&mut self) {
        self.version += 1;
    }

    // ========================================================================
    // Activities
    // ========================================================================

    /// Add an activity. Returns `false` if one with the same id already exists;
    /// the stored record is left untouched.
    pub fn add_activity(&mut self, activity: ActivitySummary) -> bool {
        if self.activities.contains_key(&activity.id) {
            debug!("[Store] Skipping duplicate activity {}", activity.id);
            return false;
        }
        self.activities.insert(activity.id.clone(), activity);
        self.bump();
        true
    }

    /// Remove an activity by id.
    pub fn remove_activity(&mut self, id: &str) -> Result<ActivitySummary> {
        let removed = self
            .activities
            .remove(id)
            .ok_or_store(&format!("no activity with id {}", id))?;
        self.bump();
        Ok(removed)
    }

    pub fn activity(&self, id: &str) -> Option<&ActivitySummary> {
        self.activities.get(id)
    }

    pub fn activity_count(&self) -> usize {
        self.activities.len()
    }

    // ========================================================================
    // Daily Logs
    // ========================================================================

    /// Save a daily log, merging into any existing log for the same date.
    ///
    /// A reported weight is also copied onto the profile. A timestamp that
    /// falls on another UTC day than `date` is reset to midnight of `date`.
    pub fn save_daily_log(&mut self, mut log: DailyLog) {
        if utc_date(log.timestamp) != log.date {
            debug!(
                "[Store] Log for {} stamped {}, resetting to midnight",
                log.date, log.timestamp
            );
            log.timestamp = DailyLog::new(log.date).timestamp;
        }
        if let (Some(weight), Some(profile)) = (log.weight, self.profile.as_mut()) {
            profile.weight_kg = Some(weight);
        }
        match self.logs.get_mut(&log.date) {
            Some(existing) => existing.merge_from(&log),
            None => {
                self.logs.insert(log.date, log);
            }
        }
        self.bump();
    }

    /// Save many logs in order; later logs for a date merge over earlier ones.
    pub fn save_daily_logs(&mut self, logs: impl IntoIterator<Item = DailyLog>) {
        let mut count = 0;
        for log in logs {
            self.save_daily_log(log);
            count += 1;
        }
        info!("[Store] Saved {} daily logs ({} days stored)", count, self.logs.len());
    }

    pub fn remove_daily_log(&mut self, date: NaiveDate) -> Result<DailyLog> {
        let removed = self
            .logs
            .remove(&date)
            .ok_or_store(&format!("no daily log for {}", date))?;
        self.bump();
        Ok(removed)
    }

    pub fn daily_log(&self, date: NaiveDate) -> Option<&DailyLog> {
        self.logs.get(&date)
    }

    // ========================================================================
    // Profile / Maintenance
    // ========================================================================

    pub fn save_profile(&mut self, profile: UserProfile) {
        self.profile = Some(profile);
        self.bump();
    }

    /// Remove everything. The version keeps increasing.
    pub fn clear(&mut self) {
        self.activities.clear();
        self.logs.clear();
        self.profile = None;
        self.bump();
        info!("[Store] Cleared");
    }

    pub fn export_backup(&self) -> Result<Backup> {
        Ok(Backup {
            profile: self.profile()?,
            history: self.activities()?,
            logs: self.daily_logs()?,
        })
    }

    /// Serialise the full store contents to JSON.
    pub fn export_json(&self) -> Result<String> {
        Ok(serde_json::to_string(&self.export_backup()?)?)
    }

    /// Replace the profile and add activities/logs from a JSON backup.
    ///
    /// Existing activities win over imported ones with the same id; imported
    /// logs merge into existing ones.
    pub fn import_json(&mut self, json: &str) -> Result<()> {
        let backup: Backup = serde_json::from_str(json)?;
        if let Some(profile) = backup.profile {
            self.save_profile(profile);
        }
        let mut added = 0;
        for activity in backup.history {
            if self.add_activity(activity) {
                added += 1;
            }
        }
        self.save_daily_logs(backup.logs);
        info!("[Store] Imported backup ({} new activities)", added);
        Ok(())
    }
}

impl AnalyticsStore for InMemoryStore {
    fn activities(&self) -> Result<Vec<ActivitySummary>> {
        let mut all: Vec<ActivitySummary> = self.activities.values().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(all)
    }

    fn daily_logs(&self) -> Result<Vec<DailyLog>> {
        let mut all: Vec<DailyLog> = self.logs.values().cloned().collect();
        all.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        Ok(all)
    }

    fn profile(&self) -> Result<Option<UserProfile>> {
        Ok(self.profile.clone())
    }

    fn version(&self) -> u64 {
        self.version
    }
}
