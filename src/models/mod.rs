pub mod session;
pub mod task;
pub mod user;

pub use session::{SessionRecord, SessionState};
pub use task::{Task, TaskChanges, TaskIdInput, TaskInput, TaskStatus, TaskUpdateInput, TaskView};
pub use user::{NewUser, User};
