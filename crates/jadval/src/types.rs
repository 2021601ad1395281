use chrono::{NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

use crate::error::FieldErrors;

/// Teaching day, Monday (1) through Saturday (6)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Day(u8);

impl Day {
    pub const ALL: [Day; 6] = [Day(1), Day(2), Day(3), Day(4), Day(5), Day(6)];

    pub fn new(number: u8) -> Option<Self> {
        (1..=6).contains(&number).then_some(Self(number))
    }

    pub fn number(self) -> u8 {
        self.0
    }

    /// Days between Monday and this day
    pub fn offset_from_monday(self) -> i64 {
        i64::from(self.0 - 1)
    }

    pub fn short_name(self) -> &'static str {
        match self.0 {
            1 => "Dush",
            2 => "Sesh",
            3 => "Chor",
            4 => "Pay",
            5 => "Jum",
            _ => "Shan",
        }
    }

    pub fn full_name(self) -> &'static str {
        match self.0 {
            1 => "Dushanba",
            2 => "Seshanba",
            3 => "Chorshanba",
            4 => "Payshanba",
            5 => "Juma",
            _ => "Shanba",
        }
    }

    pub fn weekday(self) -> Weekday {
        match self.0 {
            1 => Weekday::Mon,
            2 => Weekday::Tue,
            3 => Weekday::Wed,
            4 => Weekday::Thu,
            5 => Weekday::Fri,
            _ => Weekday::Sat,
        }
    }

    /// Sunday has no lessons and maps to `None`
    pub fn from_weekday(weekday: Weekday) -> Option<Self> {
        Self::new(weekday.number_from_monday() as u8)
    }
}

impl TryFrom<u8> for Day {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Day::new(value).ok_or_else(|| format!("day must be between 1 and 6, got {}", value))
    }
}

impl From<Day> for u8 {
    fn from(day: Day) -> Self {
        day.0
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let number: u8 = s
            .trim()
            .parse()
            .map_err(|_| format!("day must be a number, got '{}'", s.trim()))?;
        Day::try_from(number)
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Wall-clock time of day, always written as `HH:MM`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct LessonTime(NaiveTime);

impl LessonTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    pub fn hour(self) -> u32 {
        self.0.hour()
    }

    pub fn minute(self) -> u32 {
        self.0.minute()
    }

    /// Time of day as fractional hours since midnight
    pub fn as_hours(self) -> f64 {
        f64::from(self.hour()) + f64::from(self.minute()) / 60.0
    }
}

impl FromStr for LessonTime {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = s.as_bytes();
        let well_formed = bytes.len() == 5
            && bytes[2] == b':'
            && [0, 1, 3, 4].iter().all(|&i| bytes[i].is_ascii_digit());
        if !well_formed {
            return Err(format!("time must be HH:MM, got '{}'", s));
        }

        let hour: u32 = s[..2].parse().map_err(|_| format!("bad hour in '{}'", s))?;
        let minute: u32 = s[3..].parse().map_err(|_| format!("bad minute in '{}'", s))?;
        LessonTime::new(hour, minute).ok_or_else(|| format!("time out of range: '{}'", s))
    }
}

impl TryFrom<String> for LessonTime {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<LessonTime> for String {
    fn from(time: LessonTime) -> Self {
        time.to_string()
    }
}

impl fmt::Display for LessonTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}

/// Palette used to tell lessons apart on the grid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Color {
    Blue,
    Purple,
    Red,
    Green,
    Orange,
    Teal,
    Emerald,
    Amber,
}

impl Color {
    pub const ALL: [Color; 8] = [
        Color::Blue,
        Color::Purple,
        Color::Red,
        Color::Green,
        Color::Orange,
        Color::Teal,
        Color::Emerald,
        Color::Amber,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Color::Blue => "blue",
            Color::Purple => "purple",
            Color::Red => "red",
            Color::Green => "green",
            Color::Orange => "orange",
            Color::Teal => "teal",
            Color::Emerald => "emerald",
            Color::Amber => "amber",
        }
    }

    /// Border and background colors for a lesson block
    pub fn swatch(self) -> (&'static str, &'static str) {
        match self {
            Color::Blue => ("#3b82f6", "#eff6ff"),
            Color::Purple => ("#a855f7", "#faf5ff"),
            Color::Red => ("#ef4444", "#fef2f2"),
            Color::Green => ("#22c55e", "#f0fdf4"),
            Color::Orange => ("#f97316", "#fff7ed"),
            Color::Teal => ("#14b8a6", "#f0fdfa"),
            Color::Emerald => ("#10b981", "#ecfdf5"),
            Color::Amber => ("#f59e0b", "#fffbeb"),
        }
    }
}

impl FromStr for Color {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Color::ALL
            .into_iter()
            .find(|c| c.as_str() == wanted)
            .ok_or_else(|| format!("unknown color '{}'", wanted))
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A scheduled lesson as stored and sent over the wire
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: i64,
    pub title: String,
    pub teacher: String,
    pub day: Day,
    pub start_time: LessonTime,
    pub end_time: LessonTime,
    pub room: String,
    pub color: Color,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl Lesson {
    pub fn from_draft(id: i64, draft: LessonDraft) -> Self {
        Self {
            id,
            title: draft.title,
            teacher: draft.teacher,
            day: draft.day,
            start_time: draft.start_time,
            end_time: draft.end_time,
            room: draft.room,
            color: draft.color,
            notes: draft.notes,
        }
    }

    /// The lesson's fields without its id
    pub fn to_draft(&self) -> LessonDraft {
        LessonDraft {
            title: self.title.clone(),
            teacher: self.teacher.clone(),
            day: self.day,
            start_time: self.start_time,
            end_time: self.end_time,
            room: self.room.clone(),
            color: self.color,
            notes: self.notes.clone(),
        }
    }
}

/// A lesson that has not been assigned an id yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDraft {
    pub title: String,
    pub teacher: String,
    pub day: Day,
    pub start_time: LessonTime,
    pub end_time: LessonTime,
    pub room: String,
    pub color: Color,
    #[serde(
        default,
        deserialize_with = "empty_as_none",
        skip_serializing_if = "Option::is_none"
    )]
    pub notes: Option<String>,
}

impl LessonDraft {
    /// Check the rules the typed fields cannot express on their own
    pub fn check(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::new();
        if self.title.trim().is_empty() {
            errors.add("title", "Title is required");
        }
        if self.teacher.trim().is_empty() {
            errors.add("teacher", "Teacher is required");
        }
        if self.room.trim().is_empty() {
            errors.add("room", "Room is required");
        }
        if self.end_time <= self.start_time {
            errors.add("endTime", "End time must be after start time");
        }
        errors.into_result()
    }
}

/// Partial update for a stored lesson; absent fields stay unchanged
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LessonPatch {
    pub title: Option<String>,
    pub teacher: Option<String>,
    pub day: Option<Day>,
    pub start_time: Option<LessonTime>,
    pub end_time: Option<LessonTime>,
    pub room: Option<String>,
    pub color: Option<Color>,
    /// `Some(None)` clears the notes
    pub notes: Option<Option<String>>,
}

impl LessonPatch {
    pub fn is_empty(&self) -> bool {
        *self == LessonPatch::default()
    }

    /// Merge this patch over an existing lesson
    pub fn apply(&self, lesson: &Lesson) -> Lesson {
        Lesson {
            id: lesson.id,
            title: self.title.clone().unwrap_or_else(|| lesson.title.clone()),
            teacher: self.teacher.clone().unwrap_or_else(|| lesson.teacher.clone()),
            day: self.day.unwrap_or(lesson.day),
            start_time: self.start_time.unwrap_or(lesson.start_time),
            end_time: self.end_time.unwrap_or(lesson.end_time),
            room: self.room.clone().unwrap_or_else(|| lesson.room.clone()),
            color: self.color.unwrap_or(lesson.color),
            notes: match &self.notes {
                Some(notes) => notes.clone().filter(|n| !n.trim().is_empty()),
                None => lesson.notes.clone(),
            },
        }
    }
}

impl From<LessonDraft> for LessonPatch {
    fn from(draft: LessonDraft) -> Self {
        Self {
            title: Some(draft.title),
            teacher: Some(draft.teacher),
            day: Some(draft.day),
            start_time: Some(draft.start_time),
            end_time: Some(draft.end_time),
            room: Some(draft.room),
            color: Some(draft.color),
            notes: Some(draft.notes),
        }
    }
}

fn empty_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let notes = Option::<String>::deserialize(deserializer)?;
    Ok(notes.filter(|n| !n.trim().is_empty()))
}

// ========== JSON API input ==========

impl LessonPatch {
    /// Decode a JSON object sent to the API, field by field.
    ///
    /// Every problem is reported under the camelCase key it belongs to.
    /// `id` may be sent along with the rest of a record; when `expected_id`
    /// is given it has to match.
    pub fn from_json(
        fields: &Map<String, Value>,
        expected_id: Option<i64>,
    ) -> Result<Self, FieldErrors> {
        let mut errors = FieldErrors::new();
        let mut patch = LessonPatch::default();

        for (key, value) in fields {
            match key.as_str() {
                "id" => {
                    if let Some(expected) = expected_id {
                        if value.as_i64() != Some(expected) {
                            errors.add("id", format!("id must be {} for this lesson", expected));
                        }
                    }
                }
                "title" => patch.title = json_text(value, "title", &mut errors),
                "teacher" => patch.teacher = json_text(value, "teacher", &mut errors),
                "room" => patch.room = json_text(value, "room", &mut errors),
                "day" => patch.day = json_parsed(value, "day", &mut errors),
                "startTime" => patch.start_time = json_parsed(value, "startTime", &mut errors),
                "endTime" => patch.end_time = json_parsed(value, "endTime", &mut errors),
                "color" => patch.color = json_parsed(value, "color", &mut errors),
                "notes" => match value {
                    Value::Null => patch.notes = Some(None),
                    Value::String(notes) => {
                        patch.notes = Some(Some(notes.clone()).filter(|n| !n.trim().is_empty()))
                    }
                    _ => errors.add("notes", "notes must be a string or null"),
                },
                other => errors.add("body", format!("unknown field '{}'", other)),
            }
        }

        errors.into_result().map(|()| patch)
    }
}

impl LessonDraft {
    /// Decode a complete lesson sent to the API. A client-side `id` is ignored.
    pub fn from_json(fields: &Map<String, Value>) -> Result<Self, FieldErrors> {
        let patch = LessonPatch::from_json(fields, None)?;
        let mut errors = FieldErrors::new();

        let title = required(patch.title, "title", &mut errors);
        let teacher = required(patch.teacher, "teacher", &mut errors);
        let day = required(patch.day, "day", &mut errors);
        let start_time = required(patch.start_time, "startTime", &mut errors);
        let end_time = required(patch.end_time, "endTime", &mut errors);
        let room = required(patch.room, "room", &mut errors);
        let color = required(patch.color, "color", &mut errors);

        match (title, teacher, day, start_time, end_time, room, color) {
            (
                Some(title),
                Some(teacher),
                Some(day),
                Some(start_time),
                Some(end_time),
                Some(room),
                Some(color),
            ) => Ok(LessonDraft {
                title,
                teacher,
                day,
                start_time,
                end_time,
                room,
                color,
                notes: patch.notes.flatten(),
            }),
            _ => Err(errors),
        }
    }
}

fn required<T>(value: Option<T>, field: &'static str, errors: &mut FieldErrors) -> Option<T> {
    if value.is_none() {
        errors.add(field, format!("{} is required", field));
    }
    value
}

fn json_text(value: &Value, field: &'static str, errors: &mut FieldErrors) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        _ => {
            errors.add(field, format!("{} must be a string", field));
            None
        }
    }
}

/// Numbers and strings both go through the type's `FromStr`
fn json_parsed<T>(value: &Value, field: &'static str, errors: &mut FieldErrors) -> Option<T>
where
    T: FromStr<Err = String>,
{
    let text = match value {
        Value::String(text) => text.clone(),
        Value::Number(number) => number.to_string(),
        _ => {
            errors.add(field, format!("{} must be a string or number", field));
            return None;
        }
    };
    match text.parse() {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            errors.add(field, message);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn t(s: &str) -> LessonTime {
        s.parse().unwrap()
    }

    fn sample_lesson() -> Lesson {
        Lesson {
            id: 2,
            title: "Matematika".to_string(),
            teacher: "Akmal Rahimov".to_string(),
            day: Day::new(1).unwrap(),
            start_time: t("11:00"),
            end_time: t("12:20"),
            room: "301".to_string(),
            color: Color::Purple,
            notes: None,
        }
    }

    #[test]
    fn test_day_range() {
        assert!(Day::new(0).is_none());
        assert!(Day::new(7).is_none());
        assert_eq!(Day::new(1).unwrap().number(), 1);
        assert_eq!(Day::new(6).unwrap().full_name(), "Shanba");
        assert_eq!(Day::ALL.len(), 6);
    }

    #[test]
    fn test_day_from_str() {
        assert_eq!("3".parse::<Day>().unwrap(), Day::new(3).unwrap());
        assert_eq!(" 5 ".parse::<Day>().unwrap(), Day::new(5).unwrap());
        assert!("7".parse::<Day>().is_err());
        assert!("".parse::<Day>().is_err());
        assert!("mon".parse::<Day>().is_err());
    }

    #[test]
    fn test_day_weekday_mapping() {
        assert_eq!(Day::new(1).unwrap().weekday(), Weekday::Mon);
        assert_eq!(Day::from_weekday(Weekday::Sat), Day::new(6));
        assert_eq!(Day::from_weekday(Weekday::Sun), None);
    }

    #[test]
    fn test_lesson_time_parse_strict() {
        assert_eq!(t("09:30").hour(), 9);
        assert_eq!(t("09:30").minute(), 30);
        assert!("9:30".parse::<LessonTime>().is_err());
        assert!("09:3".parse::<LessonTime>().is_err());
        assert!("24:00".parse::<LessonTime>().is_err());
        assert!("12:60".parse::<LessonTime>().is_err());
        assert!("12-30".parse::<LessonTime>().is_err());
        assert!("+1:30".parse::<LessonTime>().is_err());
    }

    #[test]
    fn test_lesson_time_display_pads() {
        assert_eq!(LessonTime::new(8, 5).unwrap().to_string(), "08:05");
        assert_eq!(t("16:30").as_hours(), 16.5);
    }

    #[test]
    fn test_lesson_time_ordering_matches_text() {
        let mut times = vec![t("13:00"), t("09:30"), t("09:00"), t("10:15")];
        times.sort();
        let text: Vec<String> = times.iter().map(|t| t.to_string()).collect();
        let mut sorted_text = text.clone();
        sorted_text.sort();
        assert_eq!(text, sorted_text);
    }

    #[test]
    fn test_color_parse() {
        assert_eq!("emerald".parse::<Color>().unwrap(), Color::Emerald);
        assert!("gray".parse::<Color>().is_err());
        assert_eq!(Color::ALL.len(), 8);
    }

    #[test]
    fn test_lesson_serialization_shape() {
        let json = serde_json::to_value(sample_lesson()).unwrap();

        assert_eq!(json["id"], 2);
        assert_eq!(json["day"], 1);
        assert_eq!(json["startTime"], "11:00");
        assert_eq!(json["endTime"], "12:20");
        assert_eq!(json["color"], "purple");
        assert!(json.get("notes").is_none());
    }

    #[test]
    fn test_lesson_deserialization_empty_notes() {
        let json = r#"{"id":1,"title":"Ingliz tili","teacher":"Kamola Saidova","day":1,
            "startTime":"09:00","endTime":"10:20","room":"205","color":"blue","notes":""}"#;
        let lesson: Lesson = serde_json::from_str(json).unwrap();

        assert_eq!(lesson.notes, None);
        assert_eq!(lesson.start_time, t("09:00"));
    }

    #[test]
    fn test_lesson_deserialization_rejects_bad_day() {
        let json = r#"{"id":1,"title":"X","teacher":"Y","day":7,
            "startTime":"09:00","endTime":"10:20","room":"205","color":"blue"}"#;
        assert!(serde_json::from_str::<Lesson>(json).is_err());
    }

    #[test]
    fn test_draft_check() {
        let mut draft = sample_lesson().to_draft();
        assert!(draft.check().is_ok());

        draft.room = "  ".to_string();
        draft.end_time = t("11:00");
        let errors = draft.check().unwrap_err();
        assert!(errors.get("room").is_some());
        assert!(errors.get("endTime").is_some());
        assert!(errors.get("title").is_none());
    }

    #[test]
    fn test_patch_changes_only_given_fields() {
        let lesson = sample_lesson();
        let patch = LessonPatch {
            room: Some("302".to_string()),
            ..Default::default()
        };

        let updated = patch.apply(&lesson);
        assert_eq!(updated.room, "302");
        assert_eq!(
            Lesson {
                room: lesson.room.clone(),
                ..updated
            },
            lesson
        );
    }

    #[test]
    fn test_patch_notes_tristate() {
        let mut lesson = sample_lesson();
        lesson.notes = Some("Bring calculators".to_string());

        let keep = patch_json(json!({ "room": "1" }), None).unwrap();
        assert_eq!(keep.apply(&lesson).notes.as_deref(), Some("Bring calculators"));

        let clear = patch_json(json!({ "notes": null }), None).unwrap();
        assert_eq!(clear.apply(&lesson).notes, None);

        let blank = patch_json(json!({ "notes": "  " }), None).unwrap();
        assert_eq!(blank.apply(&lesson).notes, None);

        let set = patch_json(json!({ "notes": "Exam" }), None).unwrap();
        assert_eq!(set.apply(&lesson).notes.as_deref(), Some("Exam"));
    }

    fn patch_json(value: Value, expected_id: Option<i64>) -> Result<LessonPatch, FieldErrors> {
        LessonPatch::from_json(value.as_object().unwrap(), expected_id)
    }

    #[test]
    fn test_patch_rejects_unknown_fields() {
        let errors = patch_json(json!({ "rooom": "1" }), None).unwrap_err();
        assert_eq!(errors.get("body"), Some("unknown field 'rooom'"));
        assert!(LessonPatch::default().is_empty());
    }

    #[test]
    fn test_patch_accepts_full_record_with_matching_id() {
        let lesson = sample_lesson();
        let mut record = serde_json::to_value(&lesson).unwrap();
        record["room"] = json!("302");

        let patch = patch_json(record.clone(), Some(lesson.id)).unwrap();
        assert_eq!(patch.apply(&lesson).room, "302");

        let errors = patch_json(record, Some(lesson.id + 1)).unwrap_err();
        assert!(errors.get("id").is_some());
    }

    #[test]
    fn test_patch_reports_bad_values_per_field() {
        let errors = patch_json(
            json!({ "day": 7, "startTime": "9:00", "color": "indigo", "title": 5, "notes": [] }),
            None,
        )
        .unwrap_err();

        assert_eq!(errors.get("day"), Some("day must be between 1 and 6, got 7"));
        assert!(errors.get("startTime").unwrap().contains("HH:MM"));
        assert_eq!(errors.get("color"), Some("unknown color 'indigo'"));
        assert_eq!(errors.get("title"), Some("title must be a string"));
        assert!(errors.get("notes").is_some());
        assert_eq!(errors.len(), 5);
    }

    #[test]
    fn test_draft_from_json() {
        let draft = LessonDraft::from_json(
            json!({
                "id": 99,
                "title": "Kimyo",
                "teacher": "Nilufar Qodirova",
                "day": "3",
                "startTime": "11:00",
                "endTime": "12:20",
                "room": "305",
                "color": "teal",
                "notes": ""
            })
            .as_object()
            .unwrap(),
        )
        .unwrap();

        assert_eq!(draft.day, Day::new(3).unwrap());
        assert_eq!(draft.color, Color::Teal);
        assert_eq!(draft.notes, None);
    }

    #[test]
    fn test_draft_from_json_lists_missing_fields() {
        let errors =
            LessonDraft::from_json(json!({ "title": "Kimyo" }).as_object().unwrap()).unwrap_err();

        assert!(errors.get("title").is_none());
        for field in ["teacher", "day", "startTime", "endTime", "room", "color"] {
            assert_eq!(errors.get(field), Some(format!("{} is required", field).as_str()));
        }
    }
}
