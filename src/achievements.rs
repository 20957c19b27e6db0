//! Experience points, rank levels and cumulative milestones.
//!
//! Progress is derived from lifetime totals over the whole activity history:
//!
//! ## Features
//! - XP: 10 per km plus 20 per 100 m of climbing
//! - Rank levels from ROOKIE to GOAT with progress towards the next one
//! - Distance milestones (Marathon to the Moon)
//! - Elevation milestones (Burj Khalifa to the Karman line)
//!
//! ## Example
//! ```rust
//! use endurance_lab::achievement_progress;
//!
//! let progress = achievement_progress(&[]);
//! assert_eq!(progress.xp, 0);
//! assert_eq!(progress.level.name, "ROOKIE");
//! ```

use serde::{Deserialize, Serialize};

use crate::ActivitySummary;

/// XP awarded per kilometre.
const XP_PER_KM: f64 = 10.0;

/// XP awarded per 100 m of elevation gain.
const XP_PER_100M_CLIMB: f64 = 20.0;

/// Rank names and the XP needed to reach them, ascending.
const LEVELS: &[(&str, u64)] = &[
    ("ROOKIE", 0),
    ("AMATEUR", 1_000),
    ("SEMI-PRO", 5_000),
    ("PRO", 15_000),
    ("ELITE", 50_000),
    ("LEGEND", 150_000),
    ("GOAT", 500_000),
];

/// Cumulative distance milestones in km.
const DISTANCE_MILESTONES: &[(&str, f64)] = &[
    ("Marathon", 42.0),
    ("London to Paris", 460.0),
    ("Italy Top-to-Bottom", 1_200.0),
    ("Route 66", 3_940.0),
    ("Great Wall of China", 21_196.0),
    ("Earth Equator", 40_075.0),
    ("Distance to Moon", 384_400.0),
];

/// Cumulative elevation milestones in m.
const ELEVATION_MILESTONES: &[(&str, f64)] = &[
    ("Burj Khalifa", 828.0),
    ("Mount Olympus", 2_917.0),
    ("Mont Blanc", 4_807.0),
    ("Kilimanjaro", 5_895.0),
    ("Mount Everest", 8_848.0),
    ("Mariana Trench Depth", 11_034.0),
    ("Olympus Mons (Mars)", 21_229.0),
    ("Space (Karman Line)", 100_000.0),
];

/// A rank level.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Level {
    pub name: String,
    pub min_xp: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MilestoneStatus {
    Unlocked,
    /// First milestone not yet reached
    Next,
    Locked,
}

/// Progress towards one milestone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Milestone {
    pub name: String,
    pub target: f64,
    pub unit: String,
    pub status: MilestoneStatus,
    /// `min(100, total / target * 100)`
    pub percent: f64,
}

/// Lifetime totals and the progress derived from them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementProgress {
    pub total_distance_km: f64,
    pub total_elevation_m: f64,
    pub xp: u64,
    pub level: Level,
    pub next_level: Option<Level>,
    /// Progress from the current level to the next, 100 at the top rank
    pub level_percent: f64,
    pub distance_milestones: Vec<Milestone>,
    pub elevation_milestones: Vec<Milestone>,
}

/// XP for lifetime totals, floored.
pub fn experience_points(total_distance_km: f64, total_elevation_m: f64) -> u64 {
    let xp = total_distance_km * XP_PER_KM + total_elevation_m / 100.0 * XP_PER_100M_CLIMB;
    xp.max(0.0).floor() as u64
}

/// Index into `LEVELS` of the highest level reached.
fn level_index(xp: u64) -> usize {
    LEVELS
        .iter()
        .rposition(|(_, min_xp)| xp >= *min_xp)
        .unwrap_or(0)
}

fn level_at(index: usize) -> Option<Level> {
    LEVELS.get(index).map(|(name, min_xp)| Level {
        name: name.to_string(),
        min_xp: *min_xp,
    })
}

fn milestones(total: f64, table: &[(&str, f64)], unit: &str) -> Vec<Milestone> {
    let mut next_assigned = false;
    table
        .iter()
        .map(|(name, target)| {
            let status = if total >= *target {
                MilestoneStatus::Unlocked
            } else if !next_assigned {
                next_assigned = true;
                MilestoneStatus::Next
            } else {
                MilestoneStatus::Locked
            };
            Milestone {
                name: name.to_string(),
                target: *target,
                unit: unit.to_string(),
                status,
                percent: (total / target * 100.0).min(100.0),
            }
        })
        .collect()
}

/// Compute XP, level and milestone progress over a history.
pub fn achievement_progress(history: &[ActivitySummary]) -> AchievementProgress {
    let total_distance_km: f64 = history.iter().map(|a| a.distance_km).sum();
    let total_elevation_m: f64 = history.iter().map(|a| a.elevation_gain_m).sum();
    let xp = experience_points(total_distance_km, total_elevation_m);

    let index = level_index(xp);
    let (_, current_min) = LEVELS[index];
    let next_level = level_at(index + 1);
    let level_percent = match &next_level {
        Some(next) => (xp - current_min) as f64 / (next.min_xp - current_min) as f64 * 100.0,
        None => 100.0,
    };

    AchievementProgress {
        total_distance_km,
        total_elevation_m,
        xp,
        level: Level {
            name: LEVELS[index].0.to_string(),
            min_xp: current_min,
        },
        next_level,
        level_percent,
        distance_milestones: milestones(total_distance_km, DISTANCE_MILESTONES, "km"),
        elevation_milestones: milestones(total_elevation_m, ELEVATION_MILESTONES, "m"),
    }
}
