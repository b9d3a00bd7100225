use super::{ensure_owned, OwnedResource, Repository};
use crate::database::{CreateTaskRequest, Hobby, ShoppingItem, Task, TaskFilter, TaskStatus};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};
use uuid::Uuid;

impl OwnedResource for Task {
    const TABLE: &'static str = "tasks";
    const ENTITY: &'static str = "Task";
}

impl Repository {
    /// Create a task. Referenced category, hobby and shopping item must be
    /// visible to the owner.
    pub async fn create_task(
        &self,
        user_id: &str,
        req: CreateTaskRequest,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let mut conn = self.pool.acquire().await?;

        // Linked rows must be visible to the caller
        if let Some(category_id) = &req.category_id {
            ensure_category_visible(&mut conn, user_id, category_id).await?;
        }
        if let Some(hobby_id) = &req.hobby_id {
            ensure_owned::<Hobby>(&mut conn, user_id, hobby_id).await?;
        }
        if let Some(item_id) = &req.shopping_item_id {
            ensure_owned::<ShoppingItem>(&mut conn, user_id, item_id).await?;
        }

        let id = Uuid::new_v4().to_string();
        // Created as done: stamped complete, never rewarded
        let completed = req.status == TaskStatus::Done;
        let completed_at = completed.then_some(now);

        let task = sqlx::query_as::<_, Task>(
            r#"
            INSERT INTO tasks (
                id, user_id, title, description, category_id, priority, status,
                estimated_minutes, preferred_datetime, due_date, custom_fields,
                frozen, preferred_focus_mode, shopping_item_id, hobby_id,
                completed, completed_at, created_at, updated_at
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.description)
        .bind(&req.category_id)
        .bind(req.priority)
        .bind(req.status)
        .bind(req.estimated_minutes)
        .bind(req.preferred_datetime)
        .bind(req.due_date)
        .bind(Json(&req.custom_fields))
        .bind(&req.preferred_focus_mode)
        .bind(&req.shopping_item_id)
        .bind(&req.hobby_id)
        .bind(completed)
        .bind(completed_at)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Created task: {} for user: {}", id, user_id);
        Ok(task)
    }

    /// List tasks, optionally narrowed by category, priority or status
    pub async fn list_tasks(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>> {
        let mut query = QueryBuilder::<Sqlite>::new("SELECT * FROM tasks WHERE user_id = ");
        query.push_bind(user_id);

        if let Some(category_id) = &filter.category_id {
            query.push(" AND category_id = ").push_bind(category_id);
        }
        if let Some(priority) = filter.priority {
            query.push(" AND priority = ").push_bind(priority);
        }
        if let Some(status) = filter.status {
            query.push(" AND status = ").push_bind(status);
        }
        query.push(" ORDER BY created_at DESC");

        let tasks = query.build_query_as::<Task>().fetch_all(&self.pool).await?;
        Ok(tasks)
    }

    pub async fn set_task_frozen(
        &self,
        user_id: &str,
        id: &str,
        frozen: bool,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let rows = sqlx::query(
            "UPDATE tasks SET frozen = ?, updated_at = ? WHERE id = ? AND user_id = ?",
        )
        .bind(frozen)
        .bind(now)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found(Task::ENTITY, id));
        }

        self.get_owned(user_id, id).await
    }
}

/// Write back every mutable column of a task fetched in the same unit of work
pub(crate) async fn save_task(conn: &mut SqliteConnection, task: &Task) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE tasks SET
            title = ?, description = ?, category_id = ?, priority = ?, status = ?,
            estimated_minutes = ?, preferred_datetime = ?, due_date = ?,
            custom_fields = ?, frozen = ?, preferred_focus_mode = ?,
            completed = ?, completed_at = ?, updated_at = ?
        WHERE id = ? AND user_id = ?
        "#,
    )
    .bind(&task.title)
    .bind(&task.description)
    .bind(&task.category_id)
    .bind(task.priority)
    .bind(task.status)
    .bind(task.estimated_minutes)
    .bind(task.preferred_datetime)
    .bind(task.due_date)
    .bind(&task.custom_fields)
    .bind(task.frozen)
    .bind(&task.preferred_focus_mode)
    .bind(task.completed)
    .bind(task.completed_at)
    .bind(task.updated_at)
    .bind(&task.id)
    .bind(&task.user_id)
    .execute(&mut *conn)
    .await?;

    tracing::debug!("Saved task: {}", task.id);
    Ok(())
}

/// Tasks in `done` whose completion falls within `[start, end)`
pub(crate) async fn count_completed_between(
    conn: &mut SqliteConnection,
    user_id: &str,
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<i64> {
    let count = sqlx::query_scalar(
        r#"
        SELECT COUNT(*) FROM tasks
        WHERE user_id = ? AND status = ? AND completed_at >= ? AND completed_at < ?
        "#,
    )
    .bind(user_id)
    .bind(TaskStatus::Done)
    .bind(start)
    .bind(end)
    .fetch_one(&mut *conn)
    .await?;

    Ok(count)
}

/// Global categories are visible to everyone, the rest only to their owner
pub(crate) async fn ensure_category_visible(
    conn: &mut SqliteConnection,
    user_id: &str,
    category_id: &str,
) -> Result<()> {
    let found: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM categories WHERE id = ? AND (user_id IS NULL OR user_id = ?)",
    )
    .bind(category_id)
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    if found == 0 {
        return Err(AppError::not_found("Category", category_id));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;
    use crate::database::Priority;

    #[tokio::test]
    async fn test_create_task_defaults() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo, "bun").await;

        let task = repo
            .create_task(
                &user.id,
                CreateTaskRequest {
                    title: "Water the plants".to_string(),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap();

        assert_eq!(task.status, TaskStatus::Todo);
        assert_eq!(task.priority, Priority::Medium);
        assert!(!task.completed);
        assert!(task.completed_at.is_none());
        assert!(task.custom_fields.is_empty());
    }

    #[tokio::test]
    async fn test_create_task_rejects_foreign_category() {
        let repo = create_test_repo().await;
        let alice = create_test_user(&repo, "alice").await;
        let bob = create_test_user(&repo, "bob").await;

        let category = repo
            .create_category(&alice.id, "Garden", "#00ff00", t0())
            .await
            .unwrap();

        let err = repo
            .create_task(
                &bob.id,
                CreateTaskRequest {
                    title: "Dig".to_string(),
                    category_id: Some(category.id.clone()),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "Category", .. }));

        // Global seed categories are usable by everyone
        let task = repo
            .create_task(
                &bob.id,
                CreateTaskRequest {
                    title: "Sweep".to_string(),
                    category_id: Some("seed-chores".to_string()),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap();
        assert_eq!(task.category_id.as_deref(), Some("seed-chores"));
    }

    #[tokio::test]
    async fn test_list_tasks_with_filter() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo, "bun").await;

        for (title, priority) in [("a", Priority::High), ("b", Priority::Low), ("c", Priority::High)] {
            repo.create_task(
                &user.id,
                CreateTaskRequest {
                    title: title.to_string(),
                    priority,
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap();
        }

        let filter = TaskFilter {
            priority: Some(Priority::High),
            ..Default::default()
        };
        assert_eq!(repo.list_tasks(&user.id, &filter).await.unwrap().len(), 2);
        assert_eq!(
            repo.list_tasks(&user.id, &TaskFilter::default()).await.unwrap().len(),
            3
        );
    }
}
