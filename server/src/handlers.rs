use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use uuid::Uuid;

use crate::error::{ApiError, JsonBody, JsonOrForm, TASK_DATA_MISSING};
use crate::todo::{Empty, Message, TodoEnvelope, TodoList, UpdateTodo};
use crate::validation::{validate_create, validate_update};
use crate::AppState;

pub async fn hello() -> Json<Message> {
    Json(Message { message: "Hi!" })
}

pub async fn create_todo(
    State(state): State<AppState>,
    JsonOrForm(body): JsonOrForm,
) -> Result<(StatusCode, Json<TodoEnvelope>), ApiError> {
    let input = validate_create(body)?;
    let Some(value) = input.value.filter(|value| !value.is_empty()) else {
        return Err(ApiError::Validation(TASK_DATA_MISSING.to_string()));
    };

    let todo = state.store.insert_last(value).await?;
    tracing::info!(id = %todo.id, order = todo.order, "todo created");
    Ok((StatusCode::CREATED, Json(TodoEnvelope { todo })))
}

pub async fn list_todos(State(state): State<AppState>) -> Json<TodoList> {
    let todos = state.store.list_sorted().await;
    Json(TodoList { todos })
}

pub async fn update_todo(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
    JsonBody(patch): JsonBody<UpdateTodo>,
) -> Result<Json<Empty>, ApiError> {
    let id = parse_todo_id(&todo_id)?;
    validate_update(&patch)?;
    let todo = state
        .store
        .update(id, &patch)
        .await?
        .ok_or_else(ApiError::todo_not_found)?;
    tracing::info!(id = %todo.id, order = todo.order, done = todo.done_at.is_some(), "todo updated");
    Ok(Json(Empty {}))
}

pub async fn delete_todo(
    State(state): State<AppState>,
    Path(todo_id): Path<String>,
) -> Result<Json<Empty>, ApiError> {
    let id = parse_todo_id(&todo_id)?;
    if !state.store.delete(id).await? {
        return Err(ApiError::todo_not_found());
    }
    tracing::info!(%id, "todo deleted");
    Ok(Json(Empty {}))
}

/// An id that does not parse can never name a stored todo.
fn parse_todo_id(raw: &str) -> Result<Uuid, ApiError> {
    Uuid::parse_str(raw).map_err(|_| ApiError::todo_not_found())
}
