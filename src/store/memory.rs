use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};
use uuid::Uuid;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{Task, TaskFilter, UpdateTaskInput, User};

fn lock<T>(mutex: &Mutex<T>) -> Result<MutexGuard<'_, T>, AppError> {
    mutex
        .lock()
        .map_err(|_| AppError::Internal("in-memory store lock poisoned".into()))
}

/// Process-local `UserStore`. Data is lost on restart.
#[derive(Default)]
pub struct MemoryUserStore {
    users: Mutex<HashMap<Uuid, User>>,
}

impl MemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        let mut users = lock(&self.users)?;
        if users.values().any(|existing| existing.email == user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        users.insert(user.id, user.clone());
        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = lock(&self.users)?;
        Ok(users.values().find(|user| user.email == email).cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        Ok(lock(&self.users)?.get(&id).cloned())
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: Option<&str>,
        next: &str,
    ) -> Result<bool, AppError> {
        let mut users = lock(&self.users)?;
        match users.get_mut(&id) {
            Some(user) if user.refresh_token.as_deref() == expected => {
                user.refresh_token = Some(next.to_string());
                user.updated_at = Utc::now();
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<bool, AppError> {
        let mut users = lock(&self.users)?;
        match users.get_mut(&id) {
            Some(user) => {
                user.refresh_token = None;
                user.updated_at = Utc::now();
                Ok(true)
            }
            None => Ok(false),
        }
    }
}

/// Process-local `TaskStore`. Tasks are kept in insertion order.
#[derive(Default)]
pub struct MemoryTaskStore {
    tasks: Mutex<Vec<Task>>,
}

impl MemoryTaskStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(task: &Task, user_id: Uuid, filter: &TaskFilter) -> bool {
    task.user_id == user_id
        && filter.status.map_or(true, |status| task.status == status)
        && filter.search.as_deref().map_or(true, |needle| {
            task.title.to_lowercase().contains(&needle.to_lowercase())
        })
}

#[async_trait]
impl TaskStore for MemoryTaskStore {
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> Result<(Vec<Task>, u64), AppError> {
        let tasks = lock(&self.tasks)?;
        let matching: Vec<&Task> = tasks
            .iter()
            .rev()
            .filter(|task| matches_filter(task, user_id, filter))
            .collect();

        let total = matching.len() as u64;
        let page = matching
            .into_iter()
            .skip(usize::try_from(filter.offset).unwrap_or(0))
            .take(usize::try_from(filter.limit).unwrap_or(0))
            .cloned()
            .collect();
        Ok((page, total))
    }

    async fn create(&self, task: Task) -> Result<Task, AppError> {
        lock(&self.tasks)?.push(task.clone());
        Ok(task)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = lock(&self.tasks)?;
        Ok(tasks
            .iter()
            .find(|task| task.id == id && task.user_id == user_id)
            .cloned())
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: UpdateTaskInput,
    ) -> Result<Option<Task>, AppError> {
        let mut tasks = lock(&self.tasks)?;
        Ok(tasks
            .iter_mut()
            .find(|task| task.id == id && task.user_id == user_id)
            .map(|task| {
                task.apply(changes);
                task.clone()
            }))
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = lock(&self.tasks)?;
        let before = tasks.len();
        tasks.retain(|task| !(task.id == id && task.user_id == user_id));
        Ok(tasks.len() != before)
    }
}
