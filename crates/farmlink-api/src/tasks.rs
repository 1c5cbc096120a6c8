use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
};
use uuid::Uuid;

use farmlink_types::api::{CreateTaskRequest, StatusMessage, UpdateTaskRequest};
use farmlink_types::models::{Task, TaskKind, TaskStatus, timestamp_now};

use crate::error::ApiError;
use crate::extract::{Json, Path};
use crate::middleware::CurrentUser;
use crate::state::{AppState, run_blocking};

/// GET /api/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = me.id;
    let tasks = run_blocking(&state, move |db| db.tasks_for_user(user_id)).await?;
    Ok(Json(tasks))
}

/// POST /api/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let title = req.title.trim();
    if title.is_empty() {
        return Err(ApiError::invalid("title is required"));
    }

    let task = Task {
        id: Uuid::new_v4(),
        user_id: me.id,
        title: title.to_string(),
        date: req.date,
        kind: req.kind.unwrap_or(TaskKind::General),
        status: TaskStatus::Pending,
        description: req.description,
        created_at: timestamp_now(),
    };

    let stored = task.clone();
    run_blocking(&state, move |db| db.insert_task(&stored)).await?;

    Ok((StatusCode::CREATED, Json(task)))
}

/// PUT /api/tasks/{id}
pub async fn update_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
    Json(req): Json<UpdateTaskRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = me.id;
    let task = run_blocking(&state, move |db| db.update_task(user_id, id, &req))
        .await?
        .ok_or_else(|| ApiError::not_found("Task"))?;

    Ok(Json(task))
}

/// DELETE /api/tasks/{id}
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Extension(CurrentUser(me)): Extension<CurrentUser>,
) -> Result<impl IntoResponse, ApiError> {
    let user_id = me.id;
    if !run_blocking(&state, move |db| db.delete_task(user_id, id)).await? {
        return Err(ApiError::not_found("Task"));
    }

    Ok(Json(StatusMessage {
        message: "Task deleted".to_string(),
    }))
}
