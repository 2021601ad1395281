//! Derived views over the lesson list. Nothing here holds state.

use crate::types::{Day, Lesson, LessonTime};

/// Row labels of the week grid, one per hour
pub const HOURLY_SLOTS: &[&str] = &[
    "08:00", "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00",
    "18:00",
];

/// Rows of the slot table, every 30 minutes
pub const HALF_HOUR_SLOTS: &[&str] = &[
    "09:00", "09:30", "10:00", "10:30", "11:00", "11:30", "12:00", "12:30", "13:00", "13:30",
    "14:00", "14:30", "15:00", "15:30", "16:00", "16:30",
];

/// Parse a slot list into times. The lists above are always well formed.
pub fn parse_slots(slots: &[&str]) -> Vec<LessonTime> {
    slots.iter().filter_map(|s| s.parse().ok()).collect()
}

/// Lessons held on `day`, in stored order
pub fn lessons_for_day(lessons: &[Lesson], day: Day) -> Vec<&Lesson> {
    lessons.iter().filter(|l| l.day == day).collect()
}

/// Lessons on `day` that start exactly at `slot`. Overlapping lessons are all returned.
pub fn lessons_for_slot(lessons: &[Lesson], day: Day, slot: LessonTime) -> Vec<&Lesson> {
    lessons
        .iter()
        .filter(|l| l.day == day && l.start_time == slot)
        .collect()
}

/// Lessons on `day` ordered by start time
pub fn sorted_for_day(lessons: &[Lesson], day: Day) -> Vec<&Lesson> {
    let mut result = lessons_for_day(lessons, day);
    result.sort_by_key(|l| l.start_time);
    result
}

/// Number of lessons on each day, Monday first
pub fn count_by_day(lessons: &[Lesson]) -> [usize; 6] {
    let mut counts = [0; 6];
    for lesson in lessons {
        counts[usize::from(lesson.day.number() - 1)] += 1;
    }
    counts
}
