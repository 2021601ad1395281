//! Time-of-day to pixel math for the week grid, and week boundaries.
//!
//! All time arithmetic is in fractional hours. Half-hour steps are exact
//! in `f64`, so grid positions for 30-minute slots compare exactly.

use chrono::{Datelike, Duration, NaiveDate};
use serde::Deserialize;

use crate::types::{Day, Lesson, LessonTime};

/// Week navigation step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Prev,
    Next,
}

/// Hours between the top of the grid and `start`
pub fn hours_from(start: LessonTime, grid_start_hour: u32) -> f64 {
    (f64::from(start.hour()) - f64::from(grid_start_hour)) + f64::from(start.minute()) / 60.0
}

/// Vertical offset of `start` in pixels below the top of the grid
pub fn position(start: LessonTime, grid_start_hour: u32, px_per_hour: f64) -> f64 {
    hours_from(start, grid_start_hour) * px_per_hour
}

/// Length of a lesson in hours. Inverted ranges count as zero.
pub fn duration(start: LessonTime, end: LessonTime) -> f64 {
    let hours = (f64::from(end.hour()) - f64::from(start.hour()))
        + (f64::from(end.minute()) - f64::from(start.minute())) / 60.0;
    hours.max(0.0)
}

/// Monday and Saturday of the week containing `date`
pub fn week_bounds(date: NaiveDate) -> (NaiveDate, NaiveDate) {
    let monday = date - Duration::days(i64::from(date.weekday().num_days_from_monday()));
    (monday, monday + Duration::days(5))
}

/// The six teaching dates of the week containing `date`
pub fn week_dates(date: NaiveDate) -> [NaiveDate; 6] {
    let (monday, _) = week_bounds(date);
    Day::ALL.map(|day| monday + Duration::days(day.offset_from_monday()))
}

/// Move the reference date one week back or forward
pub fn shift_week(date: NaiveDate, direction: Direction) -> NaiveDate {
    match direction {
        Direction::Prev => date - Duration::days(7),
        Direction::Next => date + Duration::days(7),
    }
}

/// Placement of one lesson inside its day column
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Block {
    pub top: f64,
    pub height: f64,
}

/// Grid dimensions used to lay out lesson blocks
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridLayout {
    pub start_hour: u32,
    pub px_per_hour: f64,
    /// Height of the day-name header above the first hour row
    pub header_px: f64,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self {
            start_hour: 8,
            px_per_hour: 80.0,
            header_px: 64.0,
        }
    }
}

impl GridLayout {
    pub fn block(&self, lesson: &Lesson) -> Block {
        Block {
            top: position(lesson.start_time, self.start_hour, self.px_per_hour) + self.header_px,
            height: duration(lesson.start_time, lesson.end_time) * self.px_per_hour,
        }
    }

    /// Total column height for `rows` hourly rows
    pub fn column_height(&self, rows: usize) -> f64 {
        self.header_px + rows as f64 * self.px_per_hour
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Color;
    use chrono::Weekday;

    fn t(s: &str) -> LessonTime {
        s.parse().unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_position_reference_values() {
        assert_eq!(position(t("09:00"), 8, 80.0), 80.0);
        assert_eq!(position(t("09:30"), 8, 80.0), 120.0);
        assert_eq!(position(t("08:00"), 8, 80.0), 0.0);
    }

    #[test]
    fn test_position_before_grid_start_is_negative() {
        assert_eq!(position(t("07:30"), 8, 80.0), -40.0);
    }

    #[test]
    fn test_position_monotonic_within_day() {
        let mut previous = f64::NEG_INFINITY;
        for hour in 0..24 {
            for minute in [0, 15, 30, 45] {
                let p = position(LessonTime::new(hour, minute).unwrap(), 8, 80.0);
                assert!(p > previous, "{}:{} not after previous", hour, minute);
                previous = p;
            }
        }
    }

    #[test]
    fn test_duration_reference_values() {
        assert_eq!(duration(t("09:00"), t("10:30")), 1.5);
        assert_eq!(duration(t("09:00"), t("09:00")), 0.0);
        assert_eq!(duration(t("11:45"), t("12:15")), 0.5);
    }

    #[test]
    fn test_duration_inverted_is_zero() {
        assert_eq!(duration(t("12:00"), t("10:00")), 0.0);
    }

    #[test]
    fn test_week_bounds_monday_to_saturday() {
        // 2025-03-31 is a Monday
        let (monday, saturday) = week_bounds(date(2025, 4, 2));
        assert_eq!(monday, date(2025, 3, 31));
        assert_eq!(saturday, date(2025, 4, 5));
        assert_eq!(monday.weekday(), Weekday::Mon);
        assert_eq!(saturday.weekday(), Weekday::Sat);
    }

    #[test]
    fn test_week_bounds_same_for_whole_week() {
        let expected = week_bounds(date(2025, 3, 31));
        for offset in 0..7 {
            let day = date(2025, 3, 31) + Duration::days(offset);
            assert_eq!(week_bounds(day), expected, "differs for {}", day);
        }
    }

    #[test]
    fn test_week_bounds_across_year_boundary() {
        // Thursday 2026-01-01
        let (monday, saturday) = week_bounds(date(2026, 1, 1));
        assert_eq!(monday, date(2025, 12, 29));
        assert_eq!(saturday, date(2026, 1, 3));
    }

    #[test]
    fn test_week_bounds_leap_february() {
        let (monday, saturday) = week_bounds(date(2024, 2, 29));
        assert_eq!(monday, date(2024, 2, 26));
        assert_eq!(saturday, date(2024, 3, 2));
    }

    #[test]
    fn test_week_bounds_sunday_belongs_to_previous_monday() {
        let (monday, _) = week_bounds(date(2025, 4, 6));
        assert_eq!(monday, date(2025, 3, 31));
    }

    #[test]
    fn test_week_dates() {
        let dates = week_dates(date(2025, 4, 3));
        assert_eq!(dates[0], date(2025, 3, 31));
        assert_eq!(dates[5], date(2025, 4, 5));
        for (day, d) in Day::ALL.iter().zip(dates) {
            assert_eq!(d.weekday(), day.weekday());
        }
    }

    #[test]
    fn test_shift_week() {
        assert_eq!(shift_week(date(2025, 12, 29), Direction::Next), date(2026, 1, 5));
        assert_eq!(shift_week(date(2025, 3, 3), Direction::Prev), date(2025, 2, 24));
    }

    #[test]
    fn test_grid_block() {
        let lesson = Lesson {
            id: 1,
            title: "Ingliz tili".to_string(),
            teacher: "Kamola Saidova".to_string(),
            day: Day::new(1).unwrap(),
            start_time: t("09:00"),
            end_time: t("10:30"),
            room: "205".to_string(),
            color: Color::Blue,
            notes: None,
        };

        let block = GridLayout::default().block(&lesson);
        assert_eq!(block.top, 144.0);
        assert_eq!(block.height, 120.0);
    }

    #[test]
    fn test_column_height() {
        assert_eq!(GridLayout::default().column_height(11), 944.0);
    }
}
