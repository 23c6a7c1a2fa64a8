//! Persistence seams.
//!
//! Every task query is scoped by the owning `user_id`; a store method never
//! touches a task row whose owner differs from the id it was given. Each method
//! is a single atomic statement against the backing store.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

use crate::models::{NewUser, SessionRecord, Task, TaskChanges, TaskStatus, User};

pub use memory::MemoryStore;
pub use postgres::PgStore;

#[derive(Debug)]
pub enum StoreError {
    /// A uniqueness constraint rejected the write.
    Duplicate(String),
    /// Any other failure of the backing store.
    Backend(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            StoreError::Duplicate(what) => write!(f, "duplicate {}", what),
            StoreError::Backend(msg) => write!(f, "backend failure: {}", msg),
        }
    }
}

impl std::error::Error for StoreError {}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Inserts a user, failing with `StoreError::Duplicate` if the username is taken.
    async fn insert_user(&self, user: NewUser) -> StoreResult<User>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn insert_task(&self, task: Task) -> StoreResult<Task>;

    /// All tasks owned by `user_id`, most recent first.
    async fn list_tasks(&self, user_id: i32) -> StoreResult<Vec<Task>>;

    /// Returns `false` when no task with `task_id` is owned by `user_id`.
    async fn update_task(&self, user_id: i32, task_id: Uuid, changes: &TaskChanges) -> StoreResult<bool>;

    async fn set_task_status(&self, user_id: i32, task_id: Uuid, status: TaskStatus) -> StoreResult<bool>;

    async fn delete_task(&self, user_id: i32, task_id: Uuid) -> StoreResult<bool>;
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Loads an unexpired session by token digest.
    async fn load_session(&self, token_hash: &str) -> StoreResult<Option<SessionRecord>>;

    /// Inserts or replaces the session keyed by its token digest.
    async fn save_session(&self, record: &SessionRecord) -> StoreResult<()>;

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()>;

    /// Removes every expired session, returning how many were removed.
    async fn purge_expired_sessions(&self) -> StoreResult<u64>;
}

/// The complete backing store the application runs against.
pub trait Store: CredentialStore + TaskStore + SessionStore {}

impl<T> Store for T where T: CredentialStore + TaskStore + SessionStore {}

/// Shared handle, constructed once at bootstrap and injected into services.
pub type SharedStore = Arc<dyn Store>;
