//! Study activity data models

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Reviews completed on one local day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct StudyEvent {
    pub id: Uuid,
    /// Local date (YYYY-MM-DD), unique key
    pub date: NaiveDate,
    pub count: u32,
}

impl StudyEvent {
    pub fn new(date: NaiveDate, count: u32) -> Self {
        Self {
            id: Uuid::new_v4(),
            date,
            count,
        }
    }
}

/// Review count per day
pub type ActivityMap = BTreeMap<NaiveDate, u32>;

/// Consecutive days with at least one review, ending at `today`
///
/// A day without reviews today means no current streak.
pub fn compute_streak(events: &ActivityMap, today: NaiveDate) -> u32 {
    let mut streak = 0;
    let mut day = Some(today);
    while let Some(d) = day {
        if events.get(&d).copied().unwrap_or(0) == 0 {
            break;
        }
        streak += 1;
        day = d.checked_sub_days(Days::new(1));
    }
    streak
}

/// One day of the activity heatmap
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct HeatmapCell {
    pub date: NaiveDate,
    pub count: u32,
    /// 0 (no reviews) to 4 (busiest)
    pub level: u8,
    pub is_today: bool,
}

/// Intensity bucket for a day's review count
pub fn intensity_level(count: u32) -> u8 {
    match count {
        0 => 0,
        1 => 1,
        2..=3 => 2,
        4..=6 => 3,
        _ => 4,
    }
}

/// Widest heatmap, in weeks (ten years)
pub const MAX_HEATMAP_COLUMNS: usize = 520;

/// First day shown by a heatmap `columns` weeks wide ending at `today`.
/// `columns` is clamped to `1..=MAX_HEATMAP_COLUMNS`.
pub fn heatmap_start(today: NaiveDate, columns: usize) -> NaiveDate {
    let columns = columns.clamp(1, MAX_HEATMAP_COLUMNS);
    let span = columns.saturating_mul(7).saturating_sub(1) as u64;
    today.checked_sub_days(Days::new(span)).unwrap_or(NaiveDate::MIN)
}

/// One cell per day from `heatmap_start` through `today`, oldest first
pub fn heatmap(events: &ActivityMap, today: NaiveDate, columns: usize) -> Vec<HeatmapCell> {
    let start = heatmap_start(today, columns);
    start
        .iter_days()
        .take_while(|d| *d <= today)
        .map(|date| {
            let count = events.get(&date).copied().unwrap_or(0);
            HeatmapCell {
                date,
                count,
                level: intensity_level(count),
                is_today: date == today,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_streak_counts_consecutive_days() {
        let mut events = ActivityMap::new();
        events.insert(day(2024, 3, 10), 1);
        events.insert(day(2024, 3, 9), 2);
        events.insert(day(2024, 3, 8), 0);
        events.insert(day(2024, 3, 7), 5);

        assert_eq!(compute_streak(&events, day(2024, 3, 10)), 2);
    }

    #[test]
    fn test_streak_zero_without_today() {
        let mut events = ActivityMap::new();
        events.insert(day(2024, 3, 9), 4);
        assert_eq!(compute_streak(&events, day(2024, 3, 10)), 0);
        assert_eq!(compute_streak(&ActivityMap::new(), day(2024, 3, 10)), 0);
    }

    #[test]
    fn test_streak_across_month_boundary() {
        let mut events = ActivityMap::new();
        events.insert(day(2024, 3, 1), 1);
        events.insert(day(2024, 2, 29), 1);
        events.insert(day(2024, 2, 28), 1);
        assert_eq!(compute_streak(&events, day(2024, 3, 1)), 3);
    }

    #[test]
    fn test_intensity_levels() {
        assert_eq!(intensity_level(0), 0);
        assert_eq!(intensity_level(1), 1);
        assert_eq!(intensity_level(3), 2);
        assert_eq!(intensity_level(6), 3);
        assert_eq!(intensity_level(7), 4);
        assert_eq!(intensity_level(120), 4);
    }

    #[test]
    fn test_heatmap_shape() {
        let today = day(2024, 3, 10);
        let mut events = ActivityMap::new();
        events.insert(today, 2);
        events.insert(day(2024, 3, 4), 9);

        let cells = heatmap(&events, today, 2);
        assert_eq!(cells.len(), 14);
        assert_eq!(cells[0].date, day(2024, 2, 26));
        let last = cells.last().unwrap();
        assert_eq!(last.date, today);
        assert!(last.is_today);
        assert_eq!(last.level, 2);
        assert_eq!(cells.iter().find(|c| c.date == day(2024, 3, 4)).unwrap().level, 4);
        assert_eq!(cells.iter().filter(|c| c.is_today).count(), 1);
    }

    #[test]
    fn test_heatmap_width_is_clamped() {
        let today = day(2024, 3, 10);
        let widest = heatmap_start(today, MAX_HEATMAP_COLUMNS);

        assert_eq!(heatmap_start(today, usize::MAX / 2), widest);
        assert_eq!(heatmap_start(today, usize::MAX), widest);
        assert_eq!(heatmap_start(today, 0), heatmap_start(today, 1));
        assert_eq!(heatmap(&ActivityMap::new(), today, usize::MAX).len(), MAX_HEATMAP_COLUMNS * 7);
    }
}
