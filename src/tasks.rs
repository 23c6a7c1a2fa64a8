//! Task operations on behalf of the logged-in user.
//!
//! Every operation resolves the caller from the [`Session`] before touching the
//! store, and every store call is scoped by that user's id, so a task owned by
//! someone else is indistinguishable from one that does not exist.

use uuid::Uuid;
use validator::Validate;

use crate::auth::UNAUTHORIZED;
use crate::error::AppError;
use crate::models::{Task, TaskChanges, TaskInput, TaskStatus, TaskUpdateInput, TaskView};
use crate::session::Session;
use crate::store::{SharedStore, StoreError};

pub const FIELDS_REQUIRED: &str = "Title and Description are required";
pub const TASK_ID_REQUIRED: &str = "Task ID required";
pub const CREATE_FAILED: &str = "Failed to create task";
pub const FETCH_FAILED: &str = "Failed to fetch tasks";
pub const UPDATE_FAILED: &str = "Failed to update task";
pub const DELETE_FAILED: &str = "Failed to delete task";

pub struct TaskService {
    store: SharedStore,
}

impl TaskService {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub async fn create(&self, session: &Session, input: TaskInput) -> Result<Task, AppError> {
        let user_id = require_user(session)?;
        if !input.has_required_fields() {
            return Err(AppError::BadRequest(FIELDS_REQUIRED.into()));
        }
        input.validate()?;

        let task = Task::new(input.sanitized(), user_id);
        let task = self
            .store
            .insert_task(task)
            .await
            .map_err(|e| store_failure(e, CREATE_FAILED))?;
        log::info!("user {} created task {}", user_id, task.id);
        Ok(task)
    }

    /// The caller's tasks, newest first, formatted for display.
    pub async fn list(&self, session: &Session) -> Result<Vec<TaskView>, AppError> {
        let user_id = require_user(session)?;
        let tasks = self
            .store
            .list_tasks(user_id)
            .await
            .map_err(|e| store_failure(e, FETCH_FAILED))?;
        Ok(tasks.into_iter().map(TaskView::from).collect())
    }

    /// Returns `false` when the task does not exist or belongs to someone else.
    pub async fn update(&self, session: &Session, input: TaskUpdateInput) -> Result<bool, AppError> {
        let user_id = require_user(session)?;
        let task_id = require_task_id(input.task_id)?;
        if !input.fields.has_required_fields() {
            return Err(AppError::BadRequest(FIELDS_REQUIRED.into()));
        }
        input.validate()?;

        let fields = input.fields.sanitized();
        let changes = TaskChanges {
            title: fields.title,
            description: fields.description,
            due_date: fields.due_date,
            status: input.status,
        };
        let updated = self
            .store
            .update_task(user_id, task_id, &changes)
            .await
            .map_err(|e| store_failure(e, UPDATE_FAILED))?;
        if !updated {
            log::info!("user {} tried to update unknown task {}", user_id, task_id);
        }
        Ok(updated)
    }

    pub async fn mark_complete(&self, session: &Session, task_id: Option<Uuid>) -> Result<bool, AppError> {
        let user_id = require_user(session)?;
        let task_id = require_task_id(task_id)?;
        self.store
            .set_task_status(user_id, task_id, TaskStatus::Completed)
            .await
            .map_err(|e| store_failure(e, UPDATE_FAILED))
    }

    pub async fn delete(&self, session: &Session, task_id: Option<Uuid>) -> Result<bool, AppError> {
        let user_id = require_user(session)?;
        let task_id = require_task_id(task_id)?;
        let deleted = self
            .store
            .delete_task(user_id, task_id)
            .await
            .map_err(|e| store_failure(e, DELETE_FAILED))?;
        if deleted {
            log::info!("user {} deleted task {}", user_id, task_id);
        }
        Ok(deleted)
    }
}

fn require_user(session: &Session) -> Result<i32, AppError> {
    session
        .user_id()
        .ok_or_else(|| AppError::Unauthorized(UNAUTHORIZED.into()))
}

fn require_task_id(task_id: Option<Uuid>) -> Result<Uuid, AppError> {
    task_id.ok_or_else(|| AppError::BadRequest(TASK_ID_REQUIRED.into()))
}

fn store_failure(error: StoreError, message: &str) -> AppError {
    log::error!("{}: {}", message, error);
    AppError::InternalServerError(message.into())
}
