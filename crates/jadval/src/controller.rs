//! Schedule view controller: the state behind the schedule screens.
//!
//! Holds which week is shown, whether the week grid or a single day is
//! visible, a pending delete waiting for confirmation, and the flash
//! notifications produced by the last actions. Store failures never
//! escape as panics; they become error notifications and the previous
//! state stays in place.

use chrono::NaiveDate;
use serde::Serialize;
use tracing::{debug, warn};

use crate::data::Persistence;
use crate::error::{ScheduleError, ScheduleResult};
use crate::form::{Catalog, LessonForm};
use crate::geometry::{self, Block, Direction, GridLayout};
use crate::index;
use crate::store::ScheduleStore;
use crate::types::{Day, Lesson, LessonPatch};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewMode {
    Week,
    Day,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Success,
    Error,
}

/// A dismissable message for the operator
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notification {
    pub level: Level,
    pub title: String,
    pub message: String,
}

impl Notification {
    fn success(title: &str, message: impl Into<String>) -> Self {
        Self {
            level: Level::Success,
            title: title.to_string(),
            message: message.into(),
        }
    }

    pub fn error(err: &ScheduleError) -> Self {
        let title = match err {
            ScheduleError::Validation(_) => "Check the form",
            ScheduleError::NotFound(_) => "Lesson not found",
            ScheduleError::Persistence(_) => "Operation failed",
        };
        Self {
            level: Level::Error,
            title: title.to_string(),
            message: err.to_string(),
        }
    }
}

/// One lesson with its place in the week grid
#[derive(Debug, Clone, Copy)]
pub struct PlacedLesson<'a> {
    pub lesson: &'a Lesson,
    pub block: Block,
}

#[derive(Debug, Clone)]
pub struct DayColumn<'a> {
    pub day: Day,
    pub date: NaiveDate,
    pub lessons: Vec<PlacedLesson<'a>>,
}

/// Read model of the week grid
#[derive(Debug, Clone)]
pub struct WeekView<'a> {
    pub monday: NaiveDate,
    pub saturday: NaiveDate,
    pub columns: Vec<DayColumn<'a>>,
}

/// Read model of the single-day list
#[derive(Debug, Clone)]
pub struct DayView<'a> {
    pub day: Day,
    pub date: NaiveDate,
    pub lessons: Vec<&'a Lesson>,
}

fn local_today() -> NaiveDate {
    chrono::Local::now().date_naive()
}

pub struct ScheduleController<P> {
    store: ScheduleStore<P>,
    catalog: Catalog,
    layout: GridLayout,
    clock: fn() -> NaiveDate,
    view_mode: ViewMode,
    selected_day: Option<Day>,
    current_week_reference: NaiveDate,
    pending_delete: Option<i64>,
    notifications: Vec<Notification>,
}

impl<P: Persistence> ScheduleController<P> {
    pub fn new(store: ScheduleStore<P>, catalog: Catalog, layout: GridLayout) -> Self {
        Self::with_clock(store, catalog, layout, local_today)
    }

    /// Same as `new`, with a custom source for "today"
    pub fn with_clock(
        store: ScheduleStore<P>,
        catalog: Catalog,
        layout: GridLayout,
        clock: fn() -> NaiveDate,
    ) -> Self {
        Self {
            store,
            catalog,
            layout,
            clock,
            view_mode: ViewMode::Week,
            selected_day: None,
            current_week_reference: clock(),
            pending_delete: None,
            notifications: Vec::new(),
        }
    }

    pub fn view_mode(&self) -> ViewMode {
        self.view_mode
    }

    pub fn selected_day(&self) -> Option<Day> {
        self.selected_day
    }

    pub fn current_week_reference(&self) -> NaiveDate {
        self.current_week_reference
    }

    pub fn pending_delete(&self) -> Option<&Lesson> {
        self.pending_delete.and_then(|id| self.store.get(id))
    }

    pub fn store(&self) -> &ScheduleStore<P> {
        &self.store
    }

    /// Direct store access for callers that report errors themselves (JSON API)
    pub fn store_mut(&mut self) -> &mut ScheduleStore<P> {
        &mut self.store
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn layout(&self) -> &GridLayout {
        &self.layout
    }

    // ========== navigation ==========

    pub fn select_day(&mut self, day: Day) {
        self.view_mode = ViewMode::Day;
        self.selected_day = Some(day);
    }

    pub fn select_week(&mut self) {
        self.view_mode = ViewMode::Week;
        self.selected_day = None;
    }

    pub fn go_to_today(&mut self) {
        self.current_week_reference = (self.clock)();
        self.selected_day = None;
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.current_week_reference = geometry::shift_week(self.current_week_reference, direction);
        debug!(reference = %self.current_week_reference, "Navigated week");
    }

    // ========== create / edit ==========

    /// Validate the form and store a new lesson. Validation problems are
    /// returned for inline display; other failures also raise a notification.
    pub fn create(&mut self, form: &LessonForm) -> ScheduleResult<Lesson> {
        let draft = form.validate(&self.catalog)?;
        let result = self.store.create(draft);
        self.report(result, "Lesson added", |l| {
            format!("{} on {} at {}", l.title, l.day.full_name(), l.start_time)
        })
    }

    pub fn update(&mut self, id: i64, form: &LessonForm) -> ScheduleResult<Lesson> {
        if !self.store.contains(id) {
            return self.report(Err(ScheduleError::NotFound(id)), "", |_| String::new());
        }
        let patch = LessonPatch::from(form.validate(&self.catalog)?);
        let result = self.store.update(id, &patch);
        self.report(result, "Lesson updated", |l| format!("{} saved", l.title))
    }

    // ========== delete with confirmation ==========

    /// Ask for confirmation before deleting `id`
    pub fn request_delete(&mut self, id: i64) -> bool {
        if self.store.contains(id) {
            self.pending_delete = Some(id);
            true
        } else {
            self.push_error(&ScheduleError::NotFound(id));
            false
        }
    }

    /// Delete the lesson waiting for confirmation. Returns the deleted id.
    pub fn confirm_delete(&mut self) -> Option<i64> {
        let id = self.pending_delete.take()?;
        match self.store.delete(id) {
            Ok(()) => {
                self.notifications
                    .push(Notification::success("Lesson deleted", "The lesson was removed"));
                Some(id)
            }
            Err(e) => {
                self.push_error(&e);
                None
            }
        }
    }

    pub fn cancel_delete(&mut self) {
        self.pending_delete = None;
    }

    // ========== notifications ==========

    pub fn notifications(&self) -> &[Notification] {
        &self.notifications
    }

    /// Hand over pending notifications, clearing them
    pub fn take_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    pub fn reload(&mut self) -> ScheduleResult<usize> {
        let result = self.store.reload();
        if let Err(e) = &result {
            self.push_error(e);
        }
        result
    }

    fn report(
        &mut self,
        result: ScheduleResult<Lesson>,
        title: &str,
        message: impl FnOnce(&Lesson) -> String,
    ) -> ScheduleResult<Lesson> {
        match &result {
            Ok(lesson) => self
                .notifications
                .push(Notification::success(title, message(lesson))),
            // Field errors are shown next to the inputs instead
            Err(ScheduleError::Validation(_)) => {}
            Err(e) => self.push_error(e),
        }
        result
    }

    fn push_error(&mut self, err: &ScheduleError) {
        warn!(error = %err, "Schedule action failed");
        self.notifications.push(Notification::error(err));
    }

    // ========== read models ==========

    pub fn week_view(&self) -> WeekView<'_> {
        let (monday, saturday) = geometry::week_bounds(self.current_week_reference);
        let dates = geometry::week_dates(self.current_week_reference);
        let lessons = self.store.list_all();

        let columns = Day::ALL
            .iter()
            .zip(dates)
            .map(|(&day, date)| DayColumn {
                day,
                date,
                lessons: index::lessons_for_day(lessons, day)
                    .into_iter()
                    .map(|lesson| PlacedLesson {
                        lesson,
                        block: self.layout.block(lesson),
                    })
                    .collect(),
            })
            .collect();

        WeekView {
            monday,
            saturday,
            columns,
        }
    }

    /// The shown day's lessons in start-time order; `None` in week mode.
    /// Day mode without a selected day shows Monday.
    pub fn day_view(&self) -> Option<DayView<'_>> {
        if self.view_mode != ViewMode::Day {
            return None;
        }
        let day = self.selected_day.unwrap_or(Day::ALL[0]);
        let dates = geometry::week_dates(self.current_week_reference);
        Some(DayView {
            day,
            date: dates[(day.number() - 1) as usize],
            lessons: index::sorted_for_day(self.store.list_all(), day),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::MemoryPersistence;
    use chrono::Duration;

    fn fixed_today() -> NaiveDate {
        // Wednesday
        NaiveDate::from_ymd_opt(2025, 4, 2).unwrap()
    }

    fn setup() -> (MemoryPersistence, ScheduleController<MemoryPersistence>) {
        let memory = MemoryPersistence::default();
        let store = ScheduleStore::open(memory.clone()).unwrap();
        let controller =
            ScheduleController::with_clock(store, Catalog::default(), GridLayout::default(), fixed_today);
        (memory, controller)
    }

    fn matematika_form() -> LessonForm {
        LessonForm {
            course: "matematika".to_string(),
            teacher: "akmal".to_string(),
            day: "1".to_string(),
            start_time: "11:00".to_string(),
            end_time: "12:30".to_string(),
            room: "301".to_string(),
            color: "purple".to_string(),
            notes: String::new(),
        }
    }

    #[test]
    fn test_initial_state() {
        let (_memory, controller) = setup();

        assert_eq!(controller.view_mode(), ViewMode::Week);
        assert_eq!(controller.selected_day(), None);
        assert_eq!(controller.current_week_reference(), fixed_today());
        assert!(controller.pending_delete().is_none());
        assert!(controller.notifications().is_empty());
    }

    #[test]
    fn test_select_day_and_week() {
        let (_memory, mut controller) = setup();
        let friday = Day::new(5).unwrap();

        controller.select_day(friday);
        assert_eq!(controller.view_mode(), ViewMode::Day);
        assert_eq!(controller.selected_day(), Some(friday));

        controller.select_week();
        assert_eq!(controller.view_mode(), ViewMode::Week);
        assert_eq!(controller.selected_day(), None);
    }

    #[test]
    fn test_navigate_keeps_view_mode() {
        let (_memory, mut controller) = setup();
        controller.select_day(Day::new(2).unwrap());

        controller.navigate(Direction::Next);
        assert_eq!(controller.current_week_reference(), fixed_today() + Duration::days(7));
        assert_eq!(controller.view_mode(), ViewMode::Day);

        controller.navigate(Direction::Prev);
        controller.navigate(Direction::Prev);
        assert_eq!(controller.current_week_reference(), fixed_today() - Duration::days(7));
    }

    #[test]
    fn test_go_to_today_resets_week_and_day() {
        let (_memory, mut controller) = setup();
        controller.navigate(Direction::Next);
        controller.navigate(Direction::Next);
        controller.select_day(Day::new(3).unwrap());

        controller.go_to_today();

        assert_eq!(controller.current_week_reference(), fixed_today());
        assert_eq!(controller.selected_day(), None);
    }

    #[test]
    fn test_today_in_day_mode_falls_back_to_monday() {
        let (_memory, mut controller) = setup();
        controller.select_day(Day::new(4).unwrap());

        controller.go_to_today();

        assert_eq!(controller.view_mode(), ViewMode::Day);
        assert_eq!(controller.selected_day(), None);
        let view = controller.day_view().unwrap();
        assert_eq!(view.day, Day::new(1).unwrap());
        assert_eq!(view.date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn test_create_pushes_success() {
        let (memory, mut controller) = setup();

        let lesson = controller.create(&matematika_form()).unwrap();

        assert_eq!(lesson.title, "Matematika");
        assert_eq!(memory.snapshot().len(), 1);
        let notes = controller.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Success);
        assert!(controller.notifications().is_empty());
    }

    #[test]
    fn test_create_invalid_form_has_no_notification() {
        let (memory, mut controller) = setup();
        let mut form = matematika_form();
        form.day = "9".to_string();

        let err = controller.create(&form).unwrap_err();

        assert!(matches!(err, ScheduleError::Validation(_)));
        assert!(controller.notifications().is_empty());
        assert!(memory.snapshot().is_empty());
    }

    #[test]
    fn test_create_storage_failure_becomes_notification() {
        let (memory, mut controller) = setup();
        memory.set_failing(true);

        assert!(controller.create(&matematika_form()).is_err());

        let notes = controller.take_notifications();
        assert_eq!(notes.len(), 1);
        assert_eq!(notes[0].level, Level::Error);
        assert_eq!(notes[0].title, "Operation failed");
        assert!(controller.store().list_all().is_empty());
    }

    #[test]
    fn test_update_unknown_id_notifies() {
        let (_memory, mut controller) = setup();

        let err = controller.update(77, &matematika_form()).unwrap_err();

        assert!(matches!(err, ScheduleError::NotFound(77)));
        assert_eq!(controller.notifications()[0].title, "Lesson not found");
    }

    #[test]
    fn test_delete_requires_confirmation() {
        let (_memory, mut controller) = setup();
        let lesson = controller.create(&matematika_form()).unwrap();

        assert!(controller.request_delete(lesson.id));
        assert_eq!(controller.pending_delete().map(|l| l.id), Some(lesson.id));
        assert!(controller.store().contains(lesson.id));

        controller.cancel_delete();
        assert!(controller.pending_delete().is_none());
        assert!(controller.store().contains(lesson.id));

        controller.request_delete(lesson.id);
        assert_eq!(controller.confirm_delete(), Some(lesson.id));
        assert!(!controller.store().contains(lesson.id));
        assert!(controller.pending_delete().is_none());
    }

    #[test]
    fn test_confirm_without_request_is_noop() {
        let (_memory, mut controller) = setup();
        assert_eq!(controller.confirm_delete(), None);
        assert!(controller.notifications().is_empty());
    }

    #[test]
    fn test_request_delete_unknown_id() {
        let (_memory, mut controller) = setup();
        assert!(!controller.request_delete(5));
        assert!(controller.pending_delete().is_none());
        assert_eq!(controller.notifications()[0].level, Level::Error);
    }

    #[test]
    fn test_confirm_delete_storage_failure_keeps_lesson() {
        let (memory, mut controller) = setup();
        let lesson = controller.create(&matematika_form()).unwrap();
        controller.take_notifications();

        controller.request_delete(lesson.id);
        memory.set_failing(true);

        assert_eq!(controller.confirm_delete(), None);
        assert!(controller.store().contains(lesson.id));
        assert_eq!(controller.notifications()[0].level, Level::Error);
    }

    #[test]
    fn test_week_view_places_lessons() {
        let (_memory, mut controller) = setup();
        controller.create(&matematika_form()).unwrap();

        let week = controller.week_view();

        assert_eq!(week.monday, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
        assert_eq!(week.saturday, NaiveDate::from_ymd_opt(2025, 4, 5).unwrap());
        assert_eq!(week.columns.len(), 6);
        let monday = &week.columns[0];
        assert_eq!(monday.lessons.len(), 1);
        // 11:00 is three hours below 08:00, plus the header
        assert_eq!(monday.lessons[0].block.top, 3.0 * 80.0 + 64.0);
        assert_eq!(monday.lessons[0].block.height, 120.0);
        assert!(week.columns[1..].iter().all(|c| c.lessons.is_empty()));
    }

    #[test]
    fn test_day_view_sorted() {
        let (_memory, mut controller) = setup();
        controller.create(&matematika_form()).unwrap();
        let mut early = matematika_form();
        early.start_time = "08:30".to_string();
        early.end_time = "09:30".to_string();
        controller.create(&early).unwrap();

        assert!(controller.day_view().is_none());

        controller.select_day(Day::new(1).unwrap());
        let view = controller.day_view().unwrap();
        let starts: Vec<String> = view.lessons.iter().map(|l| l.start_time.to_string()).collect();
        assert_eq!(starts, vec!["08:30", "11:00"]);
        assert_eq!(view.date, NaiveDate::from_ymd_opt(2025, 3, 31).unwrap());
    }

    #[test]
    fn test_end_to_end_scenario() {
        let (memory, mut controller) = setup();

        let lesson = controller.create(&matematika_form()).unwrap();
        assert_eq!(lesson.teacher, "Akmal Rahimov");
        let monday = index::lessons_for_day(controller.store().list_all(), Day::new(1).unwrap());
        assert!(monday.iter().any(|l| l.id == lesson.id));

        let before = controller.current_week_reference();
        controller.navigate(Direction::Next);
        assert_eq!(controller.current_week_reference() - before, Duration::days(7));

        let patch = LessonPatch {
            room: Some("302".to_string()),
            ..Default::default()
        };
        let updated = controller.store_mut().update(lesson.id, &patch).unwrap();
        assert_eq!(Lesson { room: "301".to_string(), ..updated.clone() }, lesson);
        assert_eq!(updated.room, "302");

        controller.request_delete(lesson.id);
        controller.confirm_delete();
        assert!(controller.store().list_all().iter().all(|l| l.id != lesson.id));
        assert!(memory.snapshot().is_empty());
    }
}
