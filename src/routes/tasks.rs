use crate::{
    error::AppError,
    models::{TaskIdInput, TaskInput, TaskUpdateInput},
    routes::ApiMessage,
    session::Session,
    tasks::{TaskService, UPDATE_FAILED},
};
use actix_web::{delete, get, post, web, HttpResponse, Responder};
use serde_json::json;

pub const TASK_NOT_FOUND: &str = "Task not found or not owned by user";

/// Lists the authenticated user's tasks.
///
/// ## Responses:
/// - `200 OK`: `{"data": [TaskView, ...]}`, newest first, dates formatted for display.
/// - `401 Unauthorized`: no logged-in session.
/// - `500 Internal Server Error`: "Failed to fetch tasks".
#[get("")]
pub async fn list_tasks(
    service: web::Data<TaskService>,
    session: Session,
) -> Result<impl Responder, AppError> {
    let tasks = service.list(&session).await?;
    Ok(HttpResponse::Ok().json(json!({ "data": tasks })))
}

/// Creates a new task for the authenticated user.
///
/// ## Request Body:
/// - `title`: required, at most 200 characters.
/// - `description`: required, at most 1000 characters.
/// - `due_date` (optional): `YYYY-MM-DD`.
///
/// ## Responses:
/// - `201 Created`: `{"success": true, "message": "Task created"}`.
/// - `400 Bad Request`: "Title and Description are required".
/// - `401 Unauthorized`: no logged-in session.
/// - `422 Unprocessable Entity`: a field is too long.
/// - `500 Internal Server Error`: "Failed to create task".
#[post("")]
pub async fn create_task(
    service: web::Data<TaskService>,
    session: Session,
    task_data: web::Json<TaskInput>,
) -> Result<impl Responder, AppError> {
    service.create(&session, task_data.into_inner()).await?;
    Ok(HttpResponse::Created().json(ApiMessage::ok("Task created")))
}

/// Updates title, description, due date and optionally status.
///
/// Answers `{"success": false}` when the task does not exist or is not the caller's.
#[post("/update")]
pub async fn update_task(
    service: web::Data<TaskService>,
    session: Session,
    task_data: web::Json<TaskUpdateInput>,
) -> Result<impl Responder, AppError> {
    let success = service.update(&session, task_data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(json!({ "success": success })))
}

#[post("/complete")]
pub async fn complete_task(
    service: web::Data<TaskService>,
    session: Session,
    task_data: web::Json<TaskIdInput>,
) -> Result<impl Responder, AppError> {
    let body = if service.mark_complete(&session, task_data.task_id).await? {
        ApiMessage::ok("Task marked complete")
    } else {
        ApiMessage::failed(UPDATE_FAILED)
    };
    Ok(HttpResponse::Ok().json(body))
}

/// Deletes a task owned by the caller.
///
/// ## Responses:
/// - `200 OK`: "Task deleted successfully".
/// - `400 Bad Request`: "Task ID required".
/// - `404 Not Found`: no such task, or it belongs to another user.
#[post("/delete")]
pub async fn delete_task(
    service: web::Data<TaskService>,
    session: Session,
    task_data: web::Json<TaskIdInput>,
) -> Result<impl Responder, AppError> {
    remove(&service, &session, task_data.into_inner()).await
}

/// `DELETE /tasks` with the task id in the body; same contract as `POST /tasks/delete`.
#[delete("")]
pub async fn delete_task_by_body(
    service: web::Data<TaskService>,
    session: Session,
    task_data: web::Json<TaskIdInput>,
) -> Result<impl Responder, AppError> {
    remove(&service, &session, task_data.into_inner()).await
}

async fn remove(
    service: &TaskService,
    session: &Session,
    input: TaskIdInput,
) -> Result<HttpResponse, AppError> {
    if service.delete(session, input.task_id).await? {
        Ok(HttpResponse::Ok().json(ApiMessage::ok("Task deleted successfully")))
    } else {
        Err(AppError::NotFound(TASK_NOT_FOUND.into()))
    }
}
