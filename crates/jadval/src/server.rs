use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde_json::{json, Map, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::Mutex;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::controller::{Notification, ScheduleController};
use crate::data::Persistence;
use crate::error::{FieldErrors, ScheduleError};
use crate::form::LessonForm;
use crate::geometry::Direction;
use crate::html::{self, FormMode};
use crate::types::{Day, Lesson, LessonDraft, LessonPatch};

const BASE: &str = "/lesson-schedule";

pub type Controller = ScheduleController<Box<dyn Persistence>>;

/// Application state shared across requests
pub struct AppState {
    pub controller: Mutex<Controller>,
}

impl AppState {
    pub fn new(controller: Controller) -> Arc<Self> {
        Arc::new(Self {
            controller: Mutex::new(controller),
        })
    }
}

/// All page and API routes
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(root_handler))
        .route(BASE, get(schedule_handler).post(create_handler))
        .route("/lesson-schedule/table", get(table_handler))
        .route("/lesson-schedule/create", get(create_form_handler))
        .route("/lesson-schedule/nav/{direction}", post(navigate_handler))
        .route("/lesson-schedule/view/week", post(view_week_handler))
        .route("/lesson-schedule/view/day/{day}", post(view_day_handler))
        .route("/lesson-schedule/delete/confirm", post(confirm_delete_handler))
        .route("/lesson-schedule/delete/cancel", post(cancel_delete_handler))
        .route("/lesson-schedule/{id}", post(update_handler))
        .route("/lesson-schedule/{id}/edit", get(edit_form_handler))
        .route("/lesson-schedule/{id}/delete", post(request_delete_handler))
        .route("/api/lessons", get(list_lessons_handler).post(api_create_handler))
        .route(
            "/api/lessons/{id}",
            axum::routing::put(api_update_handler).delete(api_delete_handler),
        )
        .route("/api/refresh", get(refresh_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Start the web server
pub async fn serve(port: u16, state: Arc<AppState>) -> anyhow::Result<()> {
    let app = router(state);

    let addr = SocketAddr::from(([127, 0, 0, 1], port));
    info!("Server running at http://{}{}", addr, BASE);
    info!("Press Ctrl+C to stop");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to listen for Ctrl+C");
    }
}

fn back_to_schedule() -> Redirect {
    Redirect::to(BASE)
}

// ========== pages ==========

async fn root_handler() -> Redirect {
    back_to_schedule()
}

/// Week grid or day list, with notifications from the previous action
async fn schedule_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut controller = state.controller.lock().await;
    let notifications = controller.take_notifications();
    let markup = html::render_schedule(&controller, &notifications);
    Html(markup.into_string())
}

async fn table_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut controller = state.controller.lock().await;
    let notifications = controller.take_notifications();
    let markup = html::render_slot_table(&controller, &notifications);
    Html(markup.into_string())
}

async fn navigate_handler(
    State(state): State<Arc<AppState>>,
    Path(direction): Path<String>,
) -> Response {
    let mut controller = state.controller.lock().await;
    match direction.as_str() {
        "prev" => controller.navigate(Direction::Prev),
        "next" => controller.navigate(Direction::Next),
        "today" => controller.go_to_today(),
        _ => return StatusCode::NOT_FOUND.into_response(),
    }
    back_to_schedule().into_response()
}

async fn view_week_handler(State(state): State<Arc<AppState>>) -> Redirect {
    state.controller.lock().await.select_week();
    back_to_schedule()
}

async fn view_day_handler(
    State(state): State<Arc<AppState>>,
    Path(day): Path<u8>,
) -> Response {
    let Some(day) = Day::new(day) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    state.controller.lock().await.select_day(day);
    back_to_schedule().into_response()
}

async fn create_form_handler(State(state): State<Arc<AppState>>) -> Html<String> {
    let mut controller = state.controller.lock().await;
    let notifications = controller.take_notifications();
    let markup = html::render_form_page(
        FormMode::Create,
        &LessonForm::default(),
        &FieldErrors::new(),
        controller.catalog(),
        &notifications,
    );
    Html(markup.into_string())
}

async fn edit_form_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Response {
    let mut controller = state.controller.lock().await;
    let Some(form) = controller
        .store()
        .get(id)
        .map(|lesson| LessonForm::from_lesson(lesson, controller.catalog()))
    else {
        let mut notifications = controller.take_notifications();
        notifications.push(Notification::error(&ScheduleError::NotFound(id)));
        let markup = html::render_schedule(&controller, &notifications);
        return (StatusCode::NOT_FOUND, Html(markup.into_string())).into_response();
    };

    let notifications = controller.take_notifications();
    let markup = html::render_form_page(
        FormMode::Edit(id),
        &form,
        &FieldErrors::new(),
        controller.catalog(),
        &notifications,
    );
    Html(markup.into_string()).into_response()
}

/// Re-render the form with field errors, or go back to the schedule where
/// the success or failure notification is shown
fn form_outcome(
    controller: &mut Controller,
    mode: FormMode,
    form: &LessonForm,
    result: Result<Lesson, ScheduleError>,
) -> Response {
    match result {
        Err(ScheduleError::Validation(errors)) => {
            let notifications = controller.take_notifications();
            let markup =
                html::render_form_page(mode, form, &errors, controller.catalog(), &notifications);
            (StatusCode::UNPROCESSABLE_ENTITY, Html(markup.into_string())).into_response()
        }
        _ => back_to_schedule().into_response(),
    }
}

async fn create_handler(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LessonForm>,
) -> Response {
    let mut controller = state.controller.lock().await;
    let result = controller.create(&form);
    form_outcome(&mut controller, FormMode::Create, &form, result)
}

async fn update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    Form(form): Form<LessonForm>,
) -> Response {
    let mut controller = state.controller.lock().await;
    let result = controller.update(id, &form);
    form_outcome(&mut controller, FormMode::Edit(id), &form, result)
}

async fn request_delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Redirect {
    state.controller.lock().await.request_delete(id);
    back_to_schedule()
}

async fn confirm_delete_handler(State(state): State<Arc<AppState>>) -> Redirect {
    if let Some(id) = state.controller.lock().await.confirm_delete() {
        info!(id, "Lesson deleted");
    }
    back_to_schedule()
}

async fn cancel_delete_handler(State(state): State<Arc<AppState>>) -> Redirect {
    state.controller.lock().await.cancel_delete();
    back_to_schedule()
}

// ========== JSON API ==========

/// Maps store errors and unreadable bodies onto HTTP status codes
pub enum ApiError {
    Schedule(ScheduleError),
    Body(JsonRejection),
}

impl From<ScheduleError> for ApiError {
    fn from(err: ScheduleError) -> Self {
        Self::Schedule(err)
    }
}

impl From<FieldErrors> for ApiError {
    fn from(errors: FieldErrors) -> Self {
        Self::Schedule(ScheduleError::Validation(errors))
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Body(rejection)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, body) = match &self {
            ApiError::Body(rejection) => {
                let message = rejection.body_text();
                (
                    rejection.status(),
                    json!({ "error": message, "fields": { "body": message } }),
                )
            }
            ApiError::Schedule(err @ ScheduleError::Validation(fields)) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                json!({ "error": err.to_string(), "fields": fields }),
            ),
            ApiError::Schedule(err @ ScheduleError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, json!({ "error": err.to_string() }))
            }
            ApiError::Schedule(err @ ScheduleError::Persistence(_)) => {
                warn!(error = %err, "API request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    json!({ "error": err.to_string() }),
                )
            }
        };
        (status, Json(body)).into_response()
    }
}

/// The request body as a JSON object
fn json_object(payload: Result<Json<Value>, JsonRejection>) -> Result<Map<String, Value>, ApiError> {
    match payload? {
        Json(Value::Object(fields)) => Ok(fields),
        Json(_) => {
            let mut errors = FieldErrors::new();
            errors.add("body", "Expected a JSON object");
            Err(errors.into())
        }
    }
}

/// Return lessons as JSON
async fn list_lessons_handler(State(state): State<Arc<AppState>>) -> Json<Vec<Lesson>> {
    let controller = state.controller.lock().await;
    Json(controller.store().list_all().to_vec())
}

async fn api_create_handler(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<(StatusCode, Json<Lesson>), ApiError> {
    let draft = LessonDraft::from_json(&json_object(payload)?)?;
    let mut controller = state.controller.lock().await;
    let lesson = controller.store_mut().create(draft)?;
    Ok((StatusCode::CREATED, Json(lesson)))
}

async fn api_update_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<Lesson>, ApiError> {
    let patch = LessonPatch::from_json(&json_object(payload)?, Some(id))?;
    let mut controller = state.controller.lock().await;
    let lesson = controller.store_mut().update(id, &patch)?;
    Ok(Json(lesson))
}

async fn api_delete_handler(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    let mut controller = state.controller.lock().await;
    controller.store_mut().delete(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// Reload lessons from storage (manual trigger)
async fn refresh_handler(State(state): State<Arc<AppState>>) -> (StatusCode, &'static str) {
    info!("Manual refresh triggered");
    let mut controller = state.controller.lock().await;
    match controller.reload() {
        Ok(count) => {
            info!(count, "Lessons reloaded");
            (StatusCode::OK, "OK")
        }
        Err(_) => (StatusCode::INTERNAL_SERVER_ERROR, "ERROR"),
    }
}
