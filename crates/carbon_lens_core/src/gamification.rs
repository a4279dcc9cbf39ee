//! Levels, streaks and achievements derived from the scan history.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;

use crate::domain::{add_carbon, round2, Achievement, HistorySummary, ScanRecord, TransportMode, UserLevel, UserProfile};

//=========================================================================================
// Levels
//=========================================================================================

/// (level, title, minimum scans), ascending by threshold.
const LEVELS: &[(u8, &str, u32)] = &[
    (1, "Eco Beginner", 0),
    (2, "Green Explorer", 5),
    (3, "Carbon Conscious", 20),
    (4, "Sustainability Champion", 50),
    (5, "Planet Guardian", 100),
];

/// The highest level whose threshold is at most `total_scans`.
pub fn derive_level(total_scans: u32) -> UserLevel {
    let index = LEVELS
        .iter()
        .rposition(|(_, _, min)| *min <= total_scans)
        .unwrap_or(0);
    let (level, title, min_scans) = LEVELS[index];
    UserLevel {
        level,
        title: title.to_string(),
        min_scans,
        next_level_scans: LEVELS.get(index + 1).map(|(_, _, min)| *min),
    }
}

//=========================================================================================
// Streaks
//=========================================================================================

/// Returns the new `(current, longest)` streak after activity on `today`.
///
/// Activity yesterday extends the streak, activity earlier today leaves it
/// alone, and anything else starts a new streak of one.
pub fn update_streak(
    last_activity: Option<NaiveDate>,
    today: NaiveDate,
    current: u32,
    longest: u32,
) -> (u32, u32) {
    let current = match last_activity.map(|last| (today - last).num_days()) {
        Some(0) => current.max(1),
        Some(1) => current + 1,
        _ => 1,
    };
    (current, longest.max(current))
}

//=========================================================================================
// Achievements
//=========================================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Metric {
    TotalScans,
    CurrentStreak,
    LongestStreak,
    CarFreeDays,
}

struct AchievementRule {
    id: &'static str,
    title: &'static str,
    requirement: &'static str,
    metric: Metric,
    threshold: u32,
}

const CATALOG: &[AchievementRule] = &[
    AchievementRule {
        id: "first_scan",
        title: "First Steps",
        requirement: "Complete your first scan",
        metric: Metric::TotalScans,
        threshold: 1,
    },
    AchievementRule {
        id: "eco_explorer",
        title: "Eco Explorer",
        requirement: "Complete 10 scans",
        metric: Metric::TotalScans,
        threshold: 10,
    },
    AchievementRule {
        id: "scan_master",
        title: "Scan Master",
        requirement: "Complete 50 scans",
        metric: Metric::TotalScans,
        threshold: 50,
    },
    AchievementRule {
        id: "week_warrior",
        title: "Week Warrior",
        requirement: "Keep a 7 day scanning streak",
        metric: Metric::CurrentStreak,
        threshold: 7,
    },
    AchievementRule {
        id: "streak_legend",
        title: "Streak Legend",
        requirement: "Reach a 30 day longest streak",
        metric: Metric::LongestStreak,
        threshold: 30,
    },
    AchievementRule {
        id: "car_free_week",
        title: "Car-Free Week",
        requirement: "Go 7 days without logging a car trip",
        metric: Metric::CarFreeDays,
        threshold: 7,
    },
];

/// Every catalog achievement in its initial, locked state.
pub fn locked_catalog() -> Vec<Achievement> {
    CATALOG
        .iter()
        .map(|rule| Achievement {
            id: rule.id.to_string(),
            title: rule.title.to_string(),
            requirement: rule.requirement.to_string(),
            unlocked: false,
            unlocked_at: None,
            progress: 0,
        })
        .collect()
}

/// Days since the later of the first scan and the last car trip.
fn car_free_days(history: &[ScanRecord], today: NaiveDate) -> u32 {
    let Some(first) = history.iter().map(|r| r.scanned_at.date_naive()).min() else {
        return 0;
    };
    let last_car = history
        .iter()
        .filter(|r| r.transport_modes().any(|m| m == TransportMode::Car))
        .map(|r| r.scanned_at.date_naive())
        .max();
    let since = last_car.map_or(first, |car| car.max(first));
    (today - since).num_days().max(0) as u32
}

fn measure(metric: Metric, profile: &UserProfile, summary: &HistorySummary, history: &[ScanRecord], today: NaiveDate) -> u32 {
    match metric {
        Metric::TotalScans => summary.total_scans,
        Metric::CurrentStreak => profile.current_streak,
        Metric::LongestStreak => profile.longest_streak,
        Metric::CarFreeDays => car_free_days(history, today),
    }
}

/// Re-evaluates every catalog achievement against the current state.
///
/// Unlocking is one-way: an achievement already unlocked in `profile` stays
/// unlocked with its original timestamp whatever the inputs say now.
pub fn evaluate_achievements(
    profile: &UserProfile,
    summary: &HistorySummary,
    history: &[ScanRecord],
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    let today = now.date_naive();
    CATALOG
        .iter()
        .map(|rule| {
            let previous = profile.achievements.iter().find(|a| a.id == rule.id);
            if let Some(unlocked) = previous.filter(|a| a.unlocked) {
                return Achievement { progress: 100, ..unlocked.clone() };
            }

            let measured = measure(rule.metric, profile, summary, history, today);
            let unlocked = measured >= rule.threshold;
            let progress = if unlocked {
                100
            } else {
                (u64::from(measured) * 100 / u64::from(rule.threshold.max(1))).min(100) as u8
            };
            Achievement {
                id: rule.id.to_string(),
                title: rule.title.to_string(),
                requirement: rule.requirement.to_string(),
                unlocked,
                unlocked_at: unlocked.then_some(now),
                progress,
            }
        })
        .collect()
}

/// Achievements unlocked in `after` that were locked or absent in `before`.
pub fn newly_unlocked(before: &[Achievement], after: &[Achievement]) -> Vec<Achievement> {
    after
        .iter()
        .filter(|a| a.unlocked)
        .filter(|a| !before.iter().any(|b| b.id == a.id && b.unlocked))
        .cloned()
        .collect()
}

/// Folds a freshly recorded scan into the profile: streak, lifetime totals and
/// achievements. Returns the achievements this scan unlocked.
pub fn apply_scan(
    profile: &mut UserProfile,
    record: &ScanRecord,
    summary: &HistorySummary,
    history: &[ScanRecord],
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    let today = now.date_naive();
    let (current, longest) =
        update_streak(profile.last_activity_date, today, profile.current_streak, profile.longest_streak);
    profile.current_streak = current;
    profile.longest_streak = longest;
    profile.last_activity_date = Some(today);
    profile.lifetime_scans += 1;
    profile.lifetime_carbon_kg = round2(add_carbon(profile.lifetime_carbon_kg, record.total_carbon_kg));

    refresh_achievements(profile, summary, history, now)
}

/// Re-evaluates achievements in place and returns the fresh unlocks.
pub fn refresh_achievements(
    profile: &mut UserProfile,
    summary: &HistorySummary,
    history: &[ScanRecord],
    now: DateTime<Utc>,
) -> Vec<Achievement> {
    let updated = evaluate_achievements(profile, summary, history, now);
    let fresh = newly_unlocked(&profile.achievements, &updated);
    profile.achievements = updated;
    fresh
}

/// Carbon logged on `day`, for comparing against the daily budget.
pub fn carbon_on(history: &[ScanRecord], day: NaiveDate) -> Decimal {
    round2(
        history
            .iter()
            .filter(|r| r.scanned_at.date_naive() == day)
            .fold(Decimal::ZERO, |acc, r| add_carbon(acc, r.total_carbon_kg)),
    )
}
