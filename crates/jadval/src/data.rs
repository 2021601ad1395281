//! Persistence backends for the lesson collection.
//!
//! The store only ever loads the whole collection and writes it back in
//! full, so a backend needs exactly two operations. This module holds the
//! trait, the JSON file backend and the demo timetable used by `seed`.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::types::{Color, Day, Lesson, LessonDraft};

/// Name of the lesson collection in every backend
pub const COLLECTION: &str = "lessons";

/// Where the schedule store keeps its lessons
pub trait Persistence: Send {
    /// Read every stored lesson
    fn load_all(&self) -> Result<Vec<Lesson>>;

    /// Replace the stored collection with `lessons`
    fn save_all(&mut self, lessons: &[Lesson]) -> Result<()>;
}

impl<P: Persistence + ?Sized> Persistence for Box<P> {
    fn load_all(&self) -> Result<Vec<Lesson>> {
        (**self).load_all()
    }

    fn save_all(&mut self, lessons: &[Lesson]) -> Result<()> {
        (**self).save_all(lessons)
    }
}

/// Lessons kept as a pretty-printed JSON array in `<dir>/lessons.json`
pub struct JsonFile {
    path: PathBuf,
}

impl JsonFile {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(format!("{}.json", COLLECTION)),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Persistence for JsonFile {
    fn load_all(&self) -> Result<Vec<Lesson>> {
        load_json(&self.path)
    }

    fn save_all(&mut self, lessons: &[Lesson]) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        save_json(lessons, &self.path)
    }
}

/// Load lessons from a JSON file; a missing file is an empty collection
pub fn load_json(path: &Path) -> Result<Vec<Lesson>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let lessons: Vec<Lesson> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse {}", path.display()))?;

    debug!(count = lessons.len(), path = %path.display(), "Loaded lessons");
    Ok(lessons)
}

/// Write lessons to a JSON file, replacing it atomically
pub fn save_json(lessons: &[Lesson], path: &Path) -> Result<()> {
    let json = serde_json::to_string_pretty(lessons)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, json).with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace {}", path.display()))?;
    debug!(count = lessons.len(), path = %path.display(), "Saved lessons");
    Ok(())
}

/// (title, teacher, day, start, end, room, color)
const DEMO_TIMETABLE: &[(&str, &str, u8, &str, &str, &str, Color)] = &[
    ("Ingliz tili", "Kamola Saidova", 1, "09:00", "10:20", "205", Color::Blue),
    ("Matematika", "Akmal Rahimov", 1, "11:00", "12:20", "301", Color::Purple),
    ("Rus tili", "Olga Petrova", 2, "09:00", "10:20", "207", Color::Red),
    ("Kompyuter savodxonligi", "Bobur Karimov", 2, "11:00", "12:20", "404", Color::Green),
    ("Fizika", "Jahongir Azimov", 3, "09:00", "10:20", "302", Color::Orange),
    ("Kimyo", "Nilufar Qodirova", 3, "11:00", "12:20", "305", Color::Teal),
    ("Ingliz tili", "Kamola Saidova", 4, "09:00", "10:20", "205", Color::Blue),
    ("Matematika", "Akmal Rahimov", 4, "11:00", "12:20", "301", Color::Purple),
    ("Rus tili", "Olga Petrova", 5, "09:00", "10:20", "207", Color::Red),
    ("Kompyuter savodxonligi", "Bobur Karimov", 5, "11:00", "12:20", "404", Color::Green),
    ("Fizika", "Jahongir Azimov", 6, "09:00", "10:20", "302", Color::Orange),
    ("Kimyo", "Nilufar Qodirova", 6, "11:00", "12:20", "305", Color::Teal),
    ("Biologiya", "Sardor Qosimov", 1, "13:00", "14:20", "203", Color::Emerald),
    ("Tarix", "Dilshod Kamolov", 3, "13:00", "14:20", "201", Color::Amber),
];

/// The sample week a fresh installation can be seeded with
pub fn demo_timetable() -> Result<Vec<LessonDraft>> {
    DEMO_TIMETABLE
        .iter()
        .map(|&(title, teacher, day, start, end, room, color)| {
            Ok(LessonDraft {
                title: title.to_string(),
                teacher: teacher.to_string(),
                day: Day::try_from(day).map_err(anyhow::Error::msg)?,
                start_time: start.parse().map_err(anyhow::Error::msg)?,
                end_time: end.parse().map_err(anyhow::Error::msg)?,
                room: room.to_string(),
                color,
                notes: None,
            })
        })
        .collect()
}

/// In-memory backend for tests, with a switch to simulate storage failures
#[cfg(test)]
#[derive(Default, Clone)]
pub struct MemoryPersistence {
    pub lessons: std::sync::Arc<std::sync::Mutex<Vec<Lesson>>>,
    pub fail_saves: std::sync::Arc<std::sync::atomic::AtomicBool>,
}

#[cfg(test)]
impl MemoryPersistence {
    pub fn with_lessons(lessons: Vec<Lesson>) -> Self {
        let memory = Self::default();
        *memory.lessons.lock().unwrap() = lessons;
        memory
    }

    pub fn set_failing(&self, failing: bool) {
        self.fail_saves
            .store(failing, std::sync::atomic::Ordering::SeqCst);
    }

    pub fn snapshot(&self) -> Vec<Lesson> {
        self.lessons.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl Persistence for MemoryPersistence {
    fn load_all(&self) -> Result<Vec<Lesson>> {
        Ok(self.snapshot())
    }

    fn save_all(&mut self, lessons: &[Lesson]) -> Result<()> {
        if self.fail_saves.load(std::sync::atomic::Ordering::SeqCst) {
            anyhow::bail!("simulated storage failure");
        }
        *self.lessons.lock().unwrap() = lessons.to_vec();
        Ok(())
    }
}
