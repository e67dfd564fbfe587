pub mod task;
pub mod user;

pub use task::{
    CreateTaskInput, Pagination, Task, TaskFilter, TaskPage, TaskQuery, TaskStatus,
    UpdateTaskInput,
};
pub use user::{normalize_email, PublicUser, User};
