use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use super::{TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{Task, TaskFilter, UpdateTaskInput, User};

const USER_COLUMNS: &str = "id, email, password_hash, refresh_token, created_at, updated_at";
const TASK_COLUMNS: &str = "id, title, description, status, user_id, created_at, updated_at";

/// `UserStore` backed by the `users` table.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn create_user(&self, user: User) -> Result<User, AppError> {
        // A unique violation on `email` surfaces as AppError::Conflict via From<sqlx::Error>.
        let created = sqlx::query_as::<_, User>(&format!(
            "INSERT INTO users (id, email, password_hash, refresh_token, created_at, updated_at)
             VALUES ($1, $2, $3, NULL, $4, $5)
             RETURNING {USER_COLUMNS}"
        ))
        .bind(user.id)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE email = $1"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn swap_refresh_token(
        &self,
        id: Uuid,
        expected: Option<&str>,
        next: &str,
    ) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE users SET refresh_token = $1, updated_at = NOW()
             WHERE id = $2 AND refresh_token IS NOT DISTINCT FROM $3",
        )
        .bind(next)
        .bind(id)
        .bind(expected)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear_refresh_token(&self, id: Uuid) -> Result<bool, AppError> {
        let result =
            sqlx::query("UPDATE users SET refresh_token = NULL, updated_at = NOW() WHERE id = $1")
                .bind(id)
                .execute(&self.pool)
                .await?;

        Ok(result.rows_affected() == 1)
    }
}

/// `TaskStore` backed by the `tasks` table.
#[derive(Clone)]
pub struct PgTaskStore {
    pool: PgPool,
}

impl PgTaskStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// Builds the `WHERE` clause shared by the page and count queries. `$1` is always the owner;
/// optional conditions take the following placeholders. Returns the clause and the next free
/// placeholder index.
fn filter_clause(filter: &TaskFilter) -> (String, usize) {
    let mut sql = String::from(" WHERE user_id = $1");
    let mut param_count = 2;

    if filter.status.is_some() {
        sql.push_str(&format!(" AND status = ${}", param_count));
        param_count += 1;
    }
    if filter.search.is_some() {
        sql.push_str(&format!(" AND title ILIKE ${} ESCAPE '\\'", param_count));
        param_count += 1;
    }

    (sql, param_count)
}

/// Escapes LIKE metacharacters so the search term matches literally.
fn like_pattern(search: &str) -> String {
    let escaped = search
        .replace('\\', "\\\\")
        .replace('%', "\\%")
        .replace('_', "\\_");
    format!("%{}%", escaped)
}

#[async_trait]
impl TaskStore for PgTaskStore {
    async fn list(&self, user_id: Uuid, filter: &TaskFilter) -> Result<(Vec<Task>, u64), AppError> {
        let (clause, next_param) = filter_clause(filter);
        let search = filter.search.as_deref().map(like_pattern);

        let page_sql = format!(
            "SELECT {TASK_COLUMNS} FROM tasks{clause} ORDER BY created_at DESC LIMIT ${} OFFSET ${}",
            next_param,
            next_param + 1
        );
        let mut page_query = sqlx::query_as::<_, Task>(&page_sql).bind(user_id);
        if let Some(status) = filter.status {
            page_query = page_query.bind(status);
        }
        if let Some(pattern) = &search {
            page_query = page_query.bind(pattern);
        }
        let tasks = page_query
            .bind(filter.limit)
            .bind(filter.offset)
            .fetch_all(&self.pool)
            .await?;

        let count_sql = format!("SELECT COUNT(*) FROM tasks{clause}");
        let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql).bind(user_id);
        if let Some(status) = filter.status {
            count_query = count_query.bind(status);
        }
        if let Some(pattern) = &search {
            count_query = count_query.bind(pattern);
        }
        let total = count_query.fetch_one(&self.pool).await?;

        Ok((tasks, u64::try_from(total).unwrap_or(0)))
    }

    async fn create(&self, task: Task) -> Result<Task, AppError> {
        let created = sqlx::query_as::<_, Task>(&format!(
            "INSERT INTO tasks (id, title, description, status, user_id, created_at, updated_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7)
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(task.id)
        .bind(&task.title)
        .bind(&task.description)
        .bind(task.status)
        .bind(task.user_id)
        .bind(task.created_at)
        .bind(task.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find(&self, user_id: Uuid, id: Uuid) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn update(
        &self,
        user_id: Uuid,
        id: Uuid,
        changes: UpdateTaskInput,
    ) -> Result<Option<Task>, AppError> {
        let task = sqlx::query_as::<_, Task>(&format!(
            "UPDATE tasks
             SET title = COALESCE($1, title),
                 description = CASE WHEN $2 THEN $3 ELSE description END,
                 status = COALESCE($4, status),
                 updated_at = NOW()
             WHERE id = $5 AND user_id = $6
             RETURNING {TASK_COLUMNS}"
        ))
        .bind(changes.title)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .bind(changes.status)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(task)
    }

    async fn delete(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1 AND user_id = $2")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
