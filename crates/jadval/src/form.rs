//! Lesson form: raw input from the create/edit screens, turned into a
//! typed `LessonDraft` or a set of field errors.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::FieldErrors;
use crate::types::{Color, Day, Lesson, LessonDraft, LessonTime};

/// Selector codes and the display names stored on a lesson
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Catalog {
    pub courses: BTreeMap<String, String>,
    pub teachers: BTreeMap<String, String>,
}

impl Default for Catalog {
    fn default() -> Self {
        let courses = [
            ("ingliz", "Ingliz tili"),
            ("matematika", "Matematika"),
            ("rus", "Rus tili"),
            ("kompyuter", "Kompyuter savodxonligi"),
            ("fizika", "Fizika"),
            ("kimyo", "Kimyo"),
            ("biologiya", "Biologiya"),
            ("tarix", "Tarix"),
        ];
        let teachers = [
            ("kamola", "Kamola Saidova"),
            ("akmal", "Akmal Rahimov"),
            ("olga", "Olga Petrova"),
            ("bobur", "Bobur Karimov"),
            ("jahongir", "Jahongir Azimov"),
            ("nilufar", "Nilufar Qodirova"),
            ("sardor", "Sardor Qosimov"),
            ("dilshod", "Dilshod Kamolov"),
        ];

        Self {
            courses: to_map(&courses),
            teachers: to_map(&teachers),
        }
    }
}

fn to_map(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
    pairs
        .iter()
        .map(|(code, name)| (code.to_string(), name.to_string()))
        .collect()
}

impl Catalog {
    /// Load a catalog from a JSON file with `courses` and `teachers` maps
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read catalog {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse catalog {}", path.display()))
    }

    /// Display title for a course code; unknown codes are kept as typed
    pub fn course_title(&self, code: &str) -> String {
        lookup(&self.courses, code)
    }

    pub fn teacher_name(&self, code: &str) -> String {
        lookup(&self.teachers, code)
    }

    /// Code for a stored title, or the title itself when it is not in the catalog
    pub fn course_code(&self, title: &str) -> String {
        reverse_lookup(&self.courses, title)
    }

    pub fn teacher_code(&self, name: &str) -> String {
        reverse_lookup(&self.teachers, name)
    }
}

fn lookup(map: &BTreeMap<String, String>, code: &str) -> String {
    map.get(code).cloned().unwrap_or_else(|| code.to_string())
}

fn reverse_lookup(map: &BTreeMap<String, String>, name: &str) -> String {
    map.iter()
        .find(|(_, display)| display.as_str() == name)
        .map(|(code, _)| code.clone())
        .unwrap_or_else(|| name.to_string())
}

/// Raw form fields as submitted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonForm {
    #[serde(default)]
    pub course: String,
    #[serde(default)]
    pub teacher: String,
    #[serde(default)]
    pub day: String,
    #[serde(default)]
    pub start_time: String,
    #[serde(default)]
    pub end_time: String,
    #[serde(default)]
    pub room: String,
    #[serde(default)]
    pub color: String,
    #[serde(default)]
    pub notes: String,
}

impl Default for LessonForm {
    /// Values shown on an empty create screen
    fn default() -> Self {
        Self {
            course: String::new(),
            teacher: String::new(),
            day: String::new(),
            start_time: "09:00".to_string(),
            end_time: "10:30".to_string(),
            room: String::new(),
            color: Color::Blue.to_string(),
            notes: String::new(),
        }
    }
}

impl LessonForm {
    /// Pre-fill the edit screen from a stored lesson
    pub fn from_lesson(lesson: &Lesson, catalog: &Catalog) -> Self {
        Self {
            course: catalog.course_code(&lesson.title),
            teacher: catalog.teacher_code(&lesson.teacher),
            day: lesson.day.to_string(),
            start_time: lesson.start_time.to_string(),
            end_time: lesson.end_time.to_string(),
            room: lesson.room.clone(),
            color: lesson.color.to_string(),
            notes: lesson.notes.clone().unwrap_or_default(),
        }
    }

    /// Check every field and build the lesson; all problems are reported at once
    pub fn validate(&self, catalog: &Catalog) -> Result<LessonDraft, FieldErrors> {
        let mut errors = FieldErrors::new();

        let course = required(&self.course, "course", "Select a course", &mut errors);
        let teacher = required(&self.teacher, "teacher", "Select a teacher", &mut errors);
        let room = required(&self.room, "room", "Enter a room number", &mut errors);

        let day = required(&self.day, "day", "Select a day", &mut errors).and_then(|raw| {
            raw.parse::<Day>()
                .map_err(|_| errors.add("day", "Day must be a number from 1 to 6"))
                .ok()
        });

        let start_time = parse_time(&self.start_time, "startTime", "Enter a start time", &mut errors);
        let end_time = parse_time(&self.end_time, "endTime", "Enter an end time", &mut errors);
        if let (Some(start), Some(end)) = (start_time, end_time) {
            if end <= start {
                errors.add("endTime", "End time must be after start time");
            }
        }

        let color = required(&self.color, "color", "Select a color", &mut errors).and_then(|raw| {
            raw.parse::<Color>()
                .map_err(|_| errors.add("color", "Unknown color"))
                .ok()
        });

        match (course, teacher, day, start_time, end_time, room, color) {
            (Some(course), Some(teacher), Some(day), Some(start), Some(end), Some(room), Some(color))
                if errors.is_empty() =>
            {
                let notes = self.notes.trim();
                Ok(LessonDraft {
                    title: catalog.course_title(course),
                    teacher: catalog.teacher_name(teacher),
                    day,
                    start_time: start,
                    end_time: end,
                    room: room.to_string(),
                    color,
                    notes: (!notes.is_empty()).then(|| notes.to_string()),
                })
            }
            _ => Err(errors),
        }
    }
}

fn required<'a>(
    value: &'a str,
    field: &'static str,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        errors.add(field, message);
        None
    } else {
        Some(trimmed)
    }
}

fn parse_time(
    value: &str,
    field: &'static str,
    message: &str,
    errors: &mut FieldErrors,
) -> Option<LessonTime> {
    let raw = required(value, field, message, errors)?;
    match raw.parse() {
        Ok(time) => Some(time),
        Err(_) => {
            errors.add(field, "Use the HH:MM format");
            None
        }
    }
}
