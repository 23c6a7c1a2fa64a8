use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;
use std::collections::HashMap;
use uuid::Uuid;

use super::{CredentialStore, SessionStore, StoreError, StoreResult, TaskStore};
use crate::models::{NewUser, SessionRecord, Task, TaskChanges, TaskStatus, User};

/// In-process store used by the test suite and by `DATABASE_URL=memory`.
///
/// Each table sits behind its own mutex; every method takes the lock once, so
/// the check and the write of a method are atomic just like a single SQL statement.
#[derive(Debug, Default)]
pub struct MemoryStore {
    users: Mutex<UserTable>,
    // Insertion order is kept so ties on `created_at` list newest-inserted first.
    tasks: Mutex<Vec<Task>>,
    sessions: Mutex<HashMap<String, SessionRecord>>,
}

#[derive(Debug, Default)]
struct UserTable {
    next_id: i32,
    rows: Vec<User>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored sessions, expired ones included.
    pub fn session_count(&self) -> usize {
        self.sessions.lock().len()
    }

    pub fn user_count(&self) -> usize {
        self.users.lock().rows.len()
    }

    /// Removes a user together with everything that references it.
    pub fn remove_user(&self, user_id: i32) {
        self.users.lock().rows.retain(|u| u.id != user_id);
        self.tasks.lock().retain(|t| t.user_id != user_id);
        self.sessions.lock().retain(|_, s| s.user_id != Some(user_id));
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn insert_user(&self, user: NewUser) -> StoreResult<User> {
        let mut table = self.users.lock();
        if table.rows.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Duplicate(format!("username {:?}", user.username)));
        }

        table.next_id += 1;
        let row = User {
            id: table.next_id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            created_at: Utc::now(),
        };
        table.rows.push(row.clone());
        Ok(row)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        Ok(self
            .users
            .lock()
            .rows
            .iter()
            .find(|u| u.username == username)
            .cloned())
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn insert_task(&self, task: Task) -> StoreResult<Task> {
        let mut tasks = self.tasks.lock();
        if tasks.iter().any(|t| t.id == task.id) {
            return Err(StoreError::Duplicate(format!("task {}", task.id)));
        }
        tasks.push(task.clone());
        Ok(task)
    }

    async fn list_tasks(&self, user_id: i32) -> StoreResult<Vec<Task>> {
        let mut owned: Vec<Task> = self
            .tasks
            .lock()
            .iter()
            .rev()
            .filter(|t| t.user_id == user_id)
            .cloned()
            .collect();
        owned.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(owned)
    }

    async fn update_task(&self, user_id: i32, task_id: Uuid, changes: &TaskChanges) -> StoreResult<bool> {
        let mut tasks = self.tasks.lock();
        match tasks.iter_mut().find(|t| t.id == task_id && t.user_id == user_id) {
            Some(task) => {
                task.title = changes.title.clone();
                task.description = changes.description.clone();
                task.due_date = changes.due_date;
                if let Some(status) = changes.status {
                    task.status = status;
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn set_task_status(&self, user_id: i32, task_id: Uuid, status: TaskStatus) -> StoreResult<bool> {
        let mut tasks = self.tasks.lock();
        match tasks.iter_mut().find(|t| t.id == task_id && t.user_id == user_id) {
            Some(task) => {
                task.status = status;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_task(&self, user_id: i32, task_id: Uuid) -> StoreResult<bool> {
        let mut tasks = self.tasks.lock();
        let before = tasks.len();
        tasks.retain(|t| !(t.id == task_id && t.user_id == user_id));
        Ok(tasks.len() < before)
    }
}

#[async_trait]
impl SessionStore for MemoryStore {
    async fn load_session(&self, token_hash: &str) -> StoreResult<Option<SessionRecord>> {
        let now = Utc::now();
        Ok(self
            .sessions
            .lock()
            .get(token_hash)
            .filter(|s| !s.is_expired(now))
            .cloned())
    }

    async fn save_session(&self, record: &SessionRecord) -> StoreResult<()> {
        if let Some(user_id) = record.user_id {
            if !self.users.lock().rows.iter().any(|u| u.id == user_id) {
                return Err(StoreError::Backend(format!("session references unknown user {}", user_id)));
            }
        }
        self.sessions
            .lock()
            .insert(record.token_hash.clone(), record.clone());
        Ok(())
    }

    async fn delete_session(&self, token_hash: &str) -> StoreResult<()> {
        self.sessions.lock().remove(token_hash);
        Ok(())
    }

    async fn purge_expired_sessions(&self) -> StoreResult<u64> {
        let now = Utc::now();
        let mut sessions = self.sessions.lock();
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - sessions.len()) as u64)
    }
}
