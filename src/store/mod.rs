//! Persistence interfaces.
//!
//! Handlers and the auth service only see these traits; `main` decides whether they are
//! backed by Postgres or by process memory and injects the handles at construction time.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskFilter, UpdateTaskInput, User};

pub use memory::{MemoryTaskStore, MemoryUserStore};
pub use postgres::{PgTaskStore, PgUserStore};

/// User accounts and their single active refresh token.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a new user. Fails with `AppError::Conflict` when the email is taken.
    async fn create_user(&self, user: User) -> Result<User, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError>;

    /// Replaces the stored refresh token with `next`, but only while the stored value still
    /// equals `expected`. Returns `false` when the user is gone or the value changed.
    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: Option<&str>,
        next: &str,
    ) -> Result<bool, AppError>;

    /// Clears the stored refresh token. Returns `false` when the user does not exist.
    async fn clear_refresh_token(&self, id: Uuid) -> Result<bool, AppError>;
}

/// Tasks, always scoped to their owner.
#[async_trait]
pub trait TaskStore: Send + Sync {
    /// One page of the owner's tasks, newest first, and the total number of matches.
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> Result<(Vec<Task>, u64), AppError>;

    async fn create(&self, task: Task) -> Result<Task, AppError>;

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError>;

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: UpdateTaskInput,
    ) -> Result<Option<Task>, AppError>;

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError>;
}
