use crate::{
    auth::{AuthenticatedUser, MessageResponse},
    error::AppError,
    models::{CreateTaskInput, Pagination, Task, TaskPage, TaskQuery, UpdateTaskInput},
    store::TaskStore,
};
use actix_web::{delete, get, patch, post, web, HttpResponse, Responder};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

fn not_found() -> AppError {
    AppError::NotFound("Task not found".into())
}

/// Retrieves a page of the authenticated user's tasks.
///
/// ## Query Parameters:
/// - `page` (optional): 1-based page number, defaults to 1.
/// - `limit` (optional): Page size between 1 and 100, defaults to 10.
/// - `status` (optional): `PENDING`, `IN_PROGRESS` or `COMPLETED`.
/// - `search` (optional): Case-insensitive substring of the title.
///
/// ## Responses:
/// - `200 OK`: `{ tasks, pagination: { page, limit, total, totalPages } }`, newest first.
/// - `400 Bad Request`: If a query parameter is malformed or out of range.
/// - `401 Unauthorized`: If the request lacks a valid access token.
#[get("")]
pub async fn get_tasks(
    store: web::Data<dyn TaskStore>,
    query_params: web::Query<TaskQuery>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    query_params.validate()?;

    let filter = query_params.to_filter();
    let (tasks, total) = store.list(user.0.user_id, &filter).await?;

    Ok(HttpResponse::Ok().json(TaskPage {
        tasks,
        pagination: Pagination::new(query_params.page(), query_params.limit(), total),
    }))
}

/// Creates a new task owned by the authenticated user.
///
/// The title is trimmed before validation; `status` defaults to `PENDING`.
///
/// ## Responses:
/// - `201 Created`: `{ message, task }`.
/// - `400 Bad Request`: If validation fails.
/// - `401 Unauthorized`: If the request lacks a valid access token.
#[post("")]
pub async fn create_task(
    store: web::Data<dyn TaskStore>,
    task_data: web::Json<CreateTaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let input = task_data.into_inner().trimmed();
    input.validate()?;

    let task = store.create(Task::new(input, user.0.user_id)).await?;

    Ok(HttpResponse::Created().json(json!({
        "message": "Task created successfully",
        "task": task,
    })))
}

/// Retrieves a specific task by its ID.
///
/// Tasks owned by other users answer `404 Not Found`, exactly like missing ones.
#[get("/{id}")]
pub async fn get_task(
    store: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let task = store
        .find(user.0.user_id, task_id.into_inner())
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(json!({ "task": task })))
}

/// Partially updates a task the caller owns. Absent fields are left unchanged.
#[patch("/{id}")]
pub async fn update_task(
    store: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskInput>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let changes = task_data.into_inner().trimmed();
    changes.validate()?;

    let task = store
        .update(user.0.user_id, task_id.into_inner(), changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task updated successfully",
        "task": task,
    })))
}

#[delete("/{id}")]
pub async fn delete_task(
    store: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    if !store.delete(user.0.user_id, task_id.into_inner()).await? {
        return Err(not_found());
    }

    Ok(HttpResponse::Ok().json(MessageResponse::new("Task deleted successfully")))
}

/// Advances the task status: `PENDING -> IN_PROGRESS -> COMPLETED -> PENDING`.
#[post("/{id}/toggle")]
pub async fn toggle_task(
    store: web::Data<dyn TaskStore>,
    task_id: web::Path<Uuid>,
    user: AuthenticatedUser,
) -> Result<impl Responder, AppError> {
    let user_id = user.0.user_id;
    let id = task_id.into_inner();

    let current = store.find(user_id, id).await?.ok_or_else(not_found)?;
    let changes = UpdateTaskInput {
        status: Some(current.status.next()),
        ..UpdateTaskInput::default()
    };
    let task = store
        .update(user_id, id, changes)
        .await?
        .ok_or_else(not_found)?;

    Ok(HttpResponse::Ok().json(json!({
        "message": "Task status toggled successfully",
        "task": task,
    })))
}

