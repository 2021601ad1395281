use maud::{html, Markup, PreEscaped, DOCTYPE};

use crate::controller::{DayView, Level, Notification, ScheduleController, ViewMode, WeekView};
use crate::data::Persistence;
use crate::error::FieldErrors;
use crate::form::{Catalog, LessonForm};
use crate::geometry::GridLayout;
use crate::index::{self, HALF_HOUR_SLOTS, HOURLY_SLOTS};
use crate::types::{Color, Day, Lesson};

const BASE: &str = "/lesson-schedule";

/// Which submit target the lesson form posts to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormMode {
    Create,
    Edit(i64),
}

fn page(title: &str, notifications: &[Notification], body: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="uz" {
            head {
                meta charset="UTF-8";
                meta name="viewport" content="width=device-width, initial-scale=1.0";
                title { (title) " | Jadval" }
                style { (PreEscaped(CSS)) }
            }
            body {
                div.container {
                    @if !notifications.is_empty() {
                        div.notifications {
                            @for note in notifications {
                                (render_notification(note))
                            }
                        }
                    }
                    (body)
                }
            }
        }
    }
}

fn render_notification(note: &Notification) -> Markup {
    let class = match note.level {
        Level::Success => "toast success",
        Level::Error => "toast error",
    };
    html! {
        div class=(class) role="status" {
            strong { (note.title) }
            " "
            span { (note.message) }
        }
    }
}

/// Main schedule screen: week grid or single-day list
pub fn render_schedule<P: Persistence>(
    controller: &ScheduleController<P>,
    notifications: &[Notification],
) -> Markup {
    let week = controller.week_view();
    let counts = index::count_by_day(controller.store().list_all());

    let day_view = controller.day_view();
    let shown_day = day_view.as_ref().map(|view| view.day);

    let body = html! {
        (render_header(&week, controller.view_mode(), shown_day, &counts))
        @match &day_view {
            Some(day) => { (render_day_list(day)) }
            None => { (render_week_grid(&week, controller.layout())) }
        }
        @if let Some(lesson) = controller.pending_delete() {
            (render_delete_dialog(lesson))
        }
    };

    page("Dars jadvali", notifications, body)
}

fn render_header(
    week: &WeekView<'_>,
    mode: ViewMode,
    selected: Option<Day>,
    counts: &[usize; 6],
) -> Markup {
    html! {
        header.toolbar {
            div {
                h1 { "Dars jadvali" }
                div.week-range {
                    (week.monday.format("%-d %b")) " – " (week.saturday.format("%-d %b %Y"))
                }
            }
            div.actions {
                form method="post" action={(BASE) "/nav/prev"} { button.btn type="submit" { "‹ Prev" } }
                form method="post" action={(BASE) "/nav/today"} { button.btn type="submit" { "Today" } }
                form method="post" action={(BASE) "/nav/next"} { button.btn type="submit" { "Next ›" } }
                a.btn.secondary href={(BASE) "/table"} { "Slot table" }
                a.btn.primary href={(BASE) "/create"} { "+ Add lesson" }
            }
        }
        nav.view-switch {
            form method="post" action={(BASE) "/view/week"} {
                button.chip.active[mode == ViewMode::Week] type="submit" { "Week" }
            }
            @for day in Day::ALL {
                form method="post" action={(BASE) "/view/day/" (day)} {
                    button.chip.active[selected == Some(day)] type="submit" title=(day.full_name()) {
                        (day.short_name())
                        span.count { (counts[usize::from(day.number() - 1)]) }
                    }
                }
            }
        }
    }
}

fn render_week_grid(week: &WeekView<'_>, layout: &GridLayout) -> Markup {
    let column_height = layout.column_height(HOURLY_SLOTS.len());

    html! {
        div.week-grid {
            div.time-column style={"height: " (column_height) "px"} {
                div.column-header style={"height: " (layout.header_px) "px"} {}
                @for slot in HOURLY_SLOTS {
                    div.time-label style={"height: " (layout.px_per_hour) "px"} { (slot) }
                }
            }
            @for column in &week.columns {
                div.day-column style={"height: " (column_height) "px"} {
                    div.column-header style={"height: " (layout.header_px) "px"} {
                        div.day-name { (column.day.full_name()) }
                        div.day-date { (column.date.format("%-d %b")) }
                    }
                    @for _ in HOURLY_SLOTS {
                        div.hour-line style={"height: " (layout.px_per_hour) "px"} {}
                    }
                    @for placed in &column.lessons {
                        @let (border, background) = placed.lesson.color.swatch();
                        div.lesson-block
                            style={
                                "top: " (placed.block.top) "px; height: " (placed.block.height) "px; "
                                "border-left-color: " (border) "; background: " (background) ";"
                            } {
                            a href={(BASE) "/" (placed.lesson.id) "/edit"} {
                                div.lesson-title { (placed.lesson.title) }
                                div.lesson-meta {
                                    (placed.lesson.start_time) "–" (placed.lesson.end_time)
                                    " · " (placed.lesson.room)
                                }
                                div.lesson-meta { (placed.lesson.teacher) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn render_day_list(view: &DayView<'_>) -> Markup {
    html! {
        section.day-list {
            h2 { (view.day.full_name()) ", " (view.date.format("%-d %B")) }
            @if view.lessons.is_empty() {
                div.empty-state { p { "No lessons on this day." } }
            } @else {
                @for lesson in &view.lessons {
                    (render_lesson_card(lesson))
                }
            }
        }
    }
}

fn render_lesson_card(lesson: &Lesson) -> Markup {
    let (border, background) = lesson.color.swatch();
    html! {
        div.lesson-card style={"border-left-color: " (border) "; background: " (background) ";"} {
            div.card-main {
                div.card-time { (lesson.start_time) " – " (lesson.end_time) }
                div.lesson-title { (lesson.title) }
                div.lesson-meta { (lesson.teacher) " · Room " (lesson.room) }
                @if let Some(notes) = &lesson.notes {
                    div.lesson-notes { (notes) }
                }
            }
            div.card-actions {
                a.btn href={(BASE) "/" (lesson.id) "/edit"} { "Edit" }
                form method="post" action={(BASE) "/" (lesson.id) "/delete"} {
                    button.btn.danger type="submit" { "Delete" }
                }
            }
        }
    }
}

fn render_delete_dialog(lesson: &Lesson) -> Markup {
    html! {
        div.dialog-backdrop {
            div.dialog role="alertdialog" {
                h3 { "Delete this lesson?" }
                p {
                    (lesson.title) ", " (lesson.day.full_name()) " "
                    (lesson.start_time) "–" (lesson.end_time)
                    ". This cannot be undone."
                }
                div.dialog-actions {
                    form method="post" action={(BASE) "/delete/cancel"} {
                        button.btn type="submit" { "Cancel" }
                    }
                    form method="post" action={(BASE) "/delete/confirm"} {
                        button.btn.danger type="submit" { "Delete" }
                    }
                }
            }
        }
    }
}

/// Half-hour slot table for the current week
pub fn render_slot_table<P: Persistence>(
    controller: &ScheduleController<P>,
    notifications: &[Notification],
) -> Markup {
    let week = controller.week_view();
    let lessons = controller.store().list_all();
    let slots = index::parse_slots(HALF_HOUR_SLOTS);

    let body = html! {
        header.toolbar {
            div {
                h1 { "Dars jadvali" }
                div.week-range {
                    (week.monday.format("%-d %b")) " – " (week.saturday.format("%-d %b %Y"))
                }
            }
            div.actions {
                a.btn href=(BASE) { "Week grid" }
                a.btn.primary href={(BASE) "/create"} { "+ Add lesson" }
            }
        }
        table.slot-table {
            thead {
                tr {
                    th { "Time" }
                    @for column in &week.columns {
                        th { (column.day.full_name()) br; small { (column.date.format("%-d %b")) } }
                    }
                }
            }
            tbody {
                @for slot in &slots {
                    tr {
                        td.slot-time { (slot) }
                        @for day in Day::ALL {
                            td {
                                @for lesson in index::lessons_for_slot(lessons, day, *slot) {
                                    a class={"slot-lesson color-" (lesson.color)} href={(BASE) "/" (lesson.id) "/edit"} {
                                        (lesson.title)
                                        small { (lesson.room) }
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    page("Slot table", notifications, body)
}

/// Create or edit screen
pub fn render_form_page(
    mode: FormMode,
    form: &LessonForm,
    errors: &FieldErrors,
    catalog: &Catalog,
    notifications: &[Notification],
) -> Markup {
    let (heading, action) = match mode {
        FormMode::Create => ("New lesson".to_string(), BASE.to_string()),
        FormMode::Edit(id) => ("Edit lesson".to_string(), format!("{}/{}", BASE, id)),
    };

    let body = html! {
        header.toolbar {
            h1 { (heading) }
            div.actions { a.btn href=(BASE) { "‹ Back to schedule" } }
        }
        form.lesson-form method="post" action=(action) {
            (select_field("course", "Course", &form.course, &catalog.courses, errors))
            (select_field("teacher", "Teacher", &form.teacher, &catalog.teachers, errors))
            div.field {
                label for="day" { "Day" }
                select #day name="day" {
                    option value="" { "Select a day" }
                    @for day in Day::ALL {
                        option value=(day) selected[form.day == day.to_string()] { (day.full_name()) }
                    }
                }
                (field_error(errors, "day"))
            }
            div.field-row {
                div.field {
                    label for="startTime" { "Start" }
                    input #startTime type="time" name="startTime" value=(form.start_time);
                    (field_error(errors, "startTime"))
                }
                div.field {
                    label for="endTime" { "End" }
                    input #endTime type="time" name="endTime" value=(form.end_time);
                    (field_error(errors, "endTime"))
                }
            }
            div.field {
                label for="room" { "Room" }
                input #room type="text" name="room" value=(form.room) placeholder="e.g. 301";
                (field_error(errors, "room"))
            }
            fieldset.field {
                legend { "Color" }
                div.palette {
                    @for color in Color::ALL {
                        @let (border, _) = color.swatch();
                        label.swatch title=(color) {
                            input type="radio" name="color" value=(color) checked[form.color == color.as_str()];
                            span style={"background: " (border)} {}
                        }
                    }
                }
                (field_error(errors, "color"))
            }
            div.field {
                label for="notes" { "Notes" }
                textarea #notes name="notes" rows="3" { (form.notes) }
            }
            div.form-actions {
                a.btn href=(BASE) { "Cancel" }
                button.btn.primary type="submit" { "Save" }
            }
        }
    };

    page(&heading, notifications, body)
}

fn select_field(
    name: &'static str,
    label: &str,
    current: &str,
    options: &std::collections::BTreeMap<String, String>,
    errors: &FieldErrors,
) -> Markup {
    let unknown = !current.is_empty() && !options.contains_key(current);
    html! {
        div.field {
            label for=(name) { (label) }
            select id=(name) name=(name) {
                option value="" { "Select…" }
                @for (code, display) in options {
                    option value=(code) selected[current == code] { (display) }
                }
                @if unknown {
                    option value=(current) selected { (current) }
                }
            }
            (field_error(errors, name))
        }
    }
}

fn field_error(errors: &FieldErrors, field: &str) -> Markup {
    html! {
        @if let Some(message) = errors.get(field) {
            p.field-error { (message) }
        }
    }
}

const CSS: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', sans-serif;
    background: #f8fafc;
    color: #0f172a;
    line-height: 1.4;
}

.container {
    max-width: 1200px;
    margin: 0 auto;
    padding: 32px 24px 60px;
}

h1 { font-size: 1.8em; font-weight: 800; }
h2 { font-size: 1.3em; margin-bottom: 16px; }

.toolbar {
    display: flex;
    justify-content: space-between;
    align-items: flex-end;
    gap: 16px;
    flex-wrap: wrap;
    margin-bottom: 20px;
}

.week-range { color: #64748b; font-weight: 600; }

.actions, .view-switch, .dialog-actions, .form-actions, .card-actions {
    display: flex;
    gap: 8px;
    align-items: center;
    flex-wrap: wrap;
}

.view-switch { margin-bottom: 20px; }

.btn, .chip {
    display: inline-block;
    border: 1px solid #cbd5e1;
    background: #fff;
    color: #0f172a;
    padding: 6px 14px;
    border-radius: 6px;
    font-size: 0.9em;
    text-decoration: none;
    cursor: pointer;
}

.btn.primary { background: #2563eb; border-color: #2563eb; color: #fff; }
.btn.secondary { background: #f1f5f9; }
.btn.danger { background: #dc2626; border-color: #dc2626; color: #fff; }

.chip { border-radius: 999px; }
.chip.active { background: #0f172a; color: #fff; border-color: #0f172a; }
.chip .count {
    margin-left: 6px;
    font-size: 0.8em;
    opacity: 0.7;
}

.notifications { margin-bottom: 16px; display: grid; gap: 8px; }
.toast { padding: 10px 14px; border-radius: 6px; border: 1px solid; }
.toast.success { background: #f0fdf4; border-color: #86efac; }
.toast.error { background: #fef2f2; border-color: #fca5a5; }

.week-grid {
    display: grid;
    grid-template-columns: 64px repeat(6, 1fr);
    border: 1px solid #e2e8f0;
    border-radius: 8px;
    background: #fff;
    overflow-x: auto;
}

.time-column, .day-column {
    position: relative;
    border-right: 1px solid #e2e8f0;
}

.column-header {
    border-bottom: 1px solid #e2e8f0;
    background: #f1f5f9;
    display: flex;
    flex-direction: column;
    justify-content: center;
    align-items: center;
}

.day-name { font-weight: 700; }
.day-date { color: #64748b; font-size: 0.85em; }

.time-label {
    font-size: 0.8em;
    color: #64748b;
    padding: 4px 8px;
    border-bottom: 1px solid #f1f5f9;
}

.hour-line { border-bottom: 1px dashed #f1f5f9; }

.lesson-block {
    position: absolute;
    left: 4px;
    right: 4px;
    border-left: 4px solid;
    border-radius: 6px;
    padding: 6px 8px;
    overflow: hidden;
    box-shadow: 0 1px 2px rgba(0,0,0,0.08);
    font-size: 0.85em;
}

.lesson-block a { color: inherit; text-decoration: none; display: block; }
.lesson-title { font-weight: 700; }
.lesson-meta { color: #475569; font-size: 0.9em; }
.lesson-notes { margin-top: 6px; font-style: italic; color: #475569; }

.day-list { display: grid; gap: 12px; }

.lesson-card {
    display: flex;
    justify-content: space-between;
    gap: 16px;
    padding: 16px;
    border-left: 4px solid;
    border-radius: 8px;
    box-shadow: 0 1px 2px rgba(0,0,0,0.08);
}

.card-time { font-weight: 600; color: #334155; margin-bottom: 4px; }

.empty-state {
    padding: 60px 20px;
    text-align: center;
    color: #94a3b8;
}

.dialog-backdrop {
    position: fixed;
    inset: 0;
    background: rgba(15,23,42,0.45);
    display: flex;
    align-items: center;
    justify-content: center;
}

.dialog {
    background: #fff;
    border-radius: 10px;
    padding: 24px;
    max-width: 420px;
    display: grid;
    gap: 12px;
}

.slot-table {
    width: 100%;
    border-collapse: collapse;
    background: #fff;
}

.slot-table th, .slot-table td {
    border: 1px solid #e2e8f0;
    padding: 6px;
    vertical-align: top;
    font-size: 0.85em;
}

.slot-time { color: #64748b; white-space: nowrap; }

.slot-lesson {
    display: block;
    border-radius: 4px;
    padding: 4px 6px;
    margin-bottom: 4px;
    text-decoration: none;
    color: #0f172a;
    background: #f1f5f9;
}

.slot-lesson small { display: block; color: #475569; }
.color-blue { background: #dbeafe; }
.color-purple { background: #f3e8ff; }
.color-red { background: #fee2e2; }
.color-green { background: #dcfce7; }
.color-orange { background: #ffedd5; }
.color-teal { background: #ccfbf1; }
.color-emerald { background: #d1fae5; }
.color-amber { background: #fef3c7; }

.lesson-form {
    display: grid;
    gap: 16px;
    max-width: 560px;
    background: #fff;
    padding: 24px;
    border-radius: 10px;
    border: 1px solid #e2e8f0;
}

.field { display: grid; gap: 6px; border: none; }
.field-row { display: grid; grid-template-columns: 1fr 1fr; gap: 12px; }
.field input, .field select, .field textarea {
    padding: 8px 10px;
    border: 1px solid #cbd5e1;
    border-radius: 6px;
    font: inherit;
}

.field-error { color: #dc2626; font-size: 0.85em; }

.palette { display: flex; gap: 10px; }
.swatch input { display: none; }
.swatch span {
    display: inline-block;
    width: 26px;
    height: 26px;
    border-radius: 50%;
    cursor: pointer;
    border: 3px solid transparent;
}
.swatch input:checked + span { border-color: #0f172a; }

@media (max-width: 768px) {
    .container { padding: 20px 12px 40px; }
    .week-grid { grid-template-columns: 48px repeat(6, minmax(120px, 1fr)); }
}
"#;
