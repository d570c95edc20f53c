use axum::{
    body::Bytes,
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::instrument;

use super::{
    dto::{
        CreateTodoRequest, MessageResponse, StatsResponse, TodoListResponse, TodoMessageResponse,
        TodoResponse, TodoStats, UpdateTodoRequest,
    },
    services::parse_todo_id,
};
use crate::{
    auth::extractors::AuthUser,
    error::{AppError, JsonBody},
    state::TodoState,
};

/// Every route requires a verified bearer token; the owner is the token's uuid.
pub fn todo_routes() -> Router<TodoState> {
    Router::new()
        .route("/", get(list_todos).post(create_todo))
        .route("/stats", get(todo_stats))
        .route("/:id", get(get_todo).put(update_todo).delete(delete_todo))
}

#[instrument(skip(state, user, payload))]
pub async fn create_todo(
    State(state): State<TodoState>,
    AuthUser(user): AuthUser,
    JsonBody(payload): JsonBody<CreateTodoRequest>,
) -> Result<(StatusCode, Json<TodoMessageResponse>), AppError> {
    let todo = state.todos.create(user.user_uuid, &payload.content).await?;
    Ok((
        StatusCode::CREATED,
        Json(TodoMessageResponse {
            message: "Todo created successfully",
            todo,
        }),
    ))
}

#[instrument(skip(state, user))]
pub async fn list_todos(
    State(state): State<TodoState>,
    AuthUser(user): AuthUser,
) -> Result<Json<TodoListResponse>, AppError> {
    let todos = state.todos.list(user.user_uuid).await?;
    Ok(Json(TodoListResponse {
        count: todos.len(),
        todos,
    }))
}

#[instrument(skip(state, user))]
pub async fn todo_stats(
    State(state): State<TodoState>,
    AuthUser(user): AuthUser,
) -> Result<Json<StatsResponse>, AppError> {
    let total = state.todos.total(user.user_uuid).await?;
    Ok(Json(StatsResponse {
        stats: TodoStats { total },
    }))
}

#[instrument(skip(state, user))]
pub async fn get_todo(
    State(state): State<TodoState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<TodoResponse>, AppError> {
    let id = parse_todo_id(&id)?;
    let todo = state.todos.get(id, user.user_uuid).await?;
    Ok(Json(TodoResponse { todo }))
}

#[instrument(skip(state, user, body))]
pub async fn update_todo(
    State(state): State<TodoState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
    body: Bytes,
) -> Result<Json<TodoMessageResponse>, AppError> {
    let id = parse_todo_id(&id)?;
    // an empty body is the same as `{}`
    let payload: UpdateTodoRequest = if body.is_empty() {
        UpdateTodoRequest::default()
    } else {
        serde_json::from_slice(&body).map_err(|e| AppError::BadRequest(format!("Invalid JSON body: {e}")))?
    };
    let todo = state
        .todos
        .update(id, user.user_uuid, payload.content()?)
        .await?;
    Ok(Json(TodoMessageResponse {
        message: "Todo updated successfully",
        todo,
    }))
}

#[instrument(skip(state, user))]
pub async fn delete_todo(
    State(state): State<TodoState>,
    AuthUser(user): AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_todo_id(&id)?;
    state.todos.delete(id, user.user_uuid).await?;
    Ok(Json(MessageResponse {
        message: "Todo deleted successfully",
    }))
}
