use tracing::{debug, info, warn};

use crate::data::Persistence;
use crate::error::{ScheduleError, ScheduleResult};
use crate::types::{Lesson, LessonDraft, LessonPatch};

/// Owner of the lesson collection. Every read and write goes through here.
///
/// Mutations build the new collection, hand it to the backend and only
/// then replace the in-memory copy, so a failed save leaves the store
/// exactly as it was.
pub struct ScheduleStore<P> {
    lessons: Vec<Lesson>,
    persistence: P,
    next_id: i64,
}

impl<P: Persistence> ScheduleStore<P> {
    /// Load the collection from `persistence`
    pub fn open(persistence: P) -> ScheduleResult<Self> {
        let lessons = persistence
            .load_all()
            .map_err(ScheduleError::Persistence)?;
        let next_id = next_id_after(&lessons);
        info!(count = lessons.len(), "Loaded schedule");

        Ok(Self {
            lessons,
            persistence,
            next_id,
        })
    }

    /// Every lesson, in insertion order
    pub fn list_all(&self) -> &[Lesson] {
        &self.lessons
    }

    pub fn get(&self, id: i64) -> Option<&Lesson> {
        self.lessons.iter().find(|l| l.id == id)
    }

    pub fn contains(&self, id: i64) -> bool {
        self.get(id).is_some()
    }

    /// Store a new lesson under a fresh id
    pub fn create(&mut self, draft: LessonDraft) -> ScheduleResult<Lesson> {
        draft.check()?;

        let lesson = Lesson::from_draft(self.next_id, draft);
        let mut lessons = self.lessons.clone();
        lessons.push(lesson.clone());
        self.commit(lessons)?;
        self.next_id += 1;

        info!(id = lesson.id, title = %lesson.title, day = %lesson.day, "Created lesson");
        Ok(lesson)
    }

    /// Merge `patch` into the lesson with `id`
    pub fn update(&mut self, id: i64, patch: &LessonPatch) -> ScheduleResult<Lesson> {
        let index = self.position(id)?;
        let updated = patch.apply(&self.lessons[index]);
        updated.to_draft().check()?;

        let mut lessons = self.lessons.clone();
        lessons[index] = updated.clone();
        self.commit(lessons)?;

        info!(id = id, "Updated lesson");
        Ok(updated)
    }

    /// Remove the lesson with `id`. Removing an unknown id is an error.
    pub fn delete(&mut self, id: i64) -> ScheduleResult<()> {
        let index = self.position(id)?;

        let mut lessons = self.lessons.clone();
        let removed = lessons.remove(index);
        self.commit(lessons)?;

        info!(id = id, title = %removed.title, "Deleted lesson");
        Ok(())
    }

    /// Throw away the in-memory copy and read the backend again
    pub fn reload(&mut self) -> ScheduleResult<usize> {
        let lessons = self
            .persistence
            .load_all()
            .map_err(ScheduleError::Persistence)?;
        // Never hand out an id that was already used in this process
        self.next_id = self.next_id.max(next_id_after(&lessons));
        self.lessons = lessons;
        debug!(count = self.lessons.len(), "Reloaded schedule");
        Ok(self.lessons.len())
    }

    fn position(&self, id: i64) -> ScheduleResult<usize> {
        self.lessons
            .iter()
            .position(|l| l.id == id)
            .ok_or(ScheduleError::NotFound(id))
    }

    fn commit(&mut self, lessons: Vec<Lesson>) -> ScheduleResult<()> {
        if let Err(e) = self.persistence.save_all(&lessons) {
            warn!(error = %e, "Failed to save schedule");
            return Err(ScheduleError::Persistence(e));
        }
        self.lessons = lessons;
        Ok(())
    }
}

fn next_id_after(lessons: &[Lesson]) -> i64 {
    lessons.iter().map(|l| l.id).max().unwrap_or(0) + 1
}
