//! Tasks service
//!
//! Task lifecycle. Every path into `done` goes through `mark_done`, which
//! publishes `TaskCompleted` the first time a task is completed and settles
//! the rewards in the same transaction.

use crate::clock::{day_bounds, Clock};
use crate::database::repository::{
    count_completed_between, ensure_category_visible, fetch_owned, save_task,
};
use crate::database::{
    CreateTaskRequest, Repository, Task, TaskFilter, TaskStatus, UpdateTaskRequest,
};
use crate::error::{AppError, Result};
use crate::rewards::{apply_effects, DomainEvent, EventDispatcher, Settlement};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::SqliteConnection;
use std::sync::Arc;

#[derive(Debug, Clone, Serialize)]
pub struct StartTaskResponse {
    pub status: TaskStatus,
}

/// Result of completing a task; `xp` and `coins` are the user's ledger
/// totals afterwards
#[derive(Debug, Clone, Serialize)]
pub struct CompleteTaskResponse {
    pub status: TaskStatus,
    pub xp: i64,
    pub coins: i64,
}

/// Service for managing tasks
#[derive(Clone)]
pub struct TaskService {
    repo: Repository,
    dispatcher: Arc<EventDispatcher>,
    clock: Arc<dyn Clock>,
}

impl TaskService {
    pub fn new(repo: Repository, dispatcher: Arc<EventDispatcher>, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            dispatcher,
            clock,
        }
    }

    /// Create a task. A task created as `done` is stamped complete but earns nothing.
    pub async fn create_task(&self, user_id: &str, req: CreateTaskRequest) -> Result<Task> {
        if req.title.trim().is_empty() {
            return Err(AppError::Validation("task title is required".to_string()));
        }

        tracing::info!("Creating task for {}: {}", user_id, req.title);
        self.repo.create_task(user_id, req, self.clock.now()).await
    }

    pub async fn get_task(&self, user_id: &str, id: &str) -> Result<Task> {
        self.repo.get_owned(user_id, id).await
    }

    pub async fn list_tasks(&self, user_id: &str, filter: &TaskFilter) -> Result<Vec<Task>> {
        self.repo.list_tasks(user_id, filter).await
    }

    /// Partial update. Setting `status` to `done` completes the task the same
    /// way `complete_task` does, but is not an error when already done.
    pub async fn update_task(&self, user_id: &str, id: &str, req: UpdateTaskRequest) -> Result<Task> {
        if matches!(&req.title, Some(title) if title.trim().is_empty()) {
            return Err(AppError::Validation("task title is required".to_string()));
        }

        let now = self.clock.now();
        let mut tx = self.repo.begin().await?;
        let mut task: Task = fetch_owned(&mut tx, user_id, id).await?;

        // Apply the provided fields
        if let Some(category_id) = &req.category_id {
            ensure_category_visible(&mut tx, user_id, category_id).await?;
            task.category_id = Some(category_id.clone());
        }
        if let Some(title) = req.title {
            task.title = title;
        }
        if let Some(description) = req.description {
            task.description = description;
        }
        if let Some(priority) = req.priority {
            task.priority = priority;
        }
        if let Some(minutes) = req.estimated_minutes {
            task.estimated_minutes = Some(minutes);
        }
        if let Some(at) = req.preferred_datetime {
            task.preferred_datetime = Some(at);
        }
        if let Some(due) = req.due_date {
            task.due_date = Some(due);
        }
        if let Some(mode) = req.preferred_focus_mode {
            task.preferred_focus_mode = Some(mode);
        }
        if let Some(fields) = req.custom_fields {
            task.custom_fields.0 = fields;
        }
        task.updated_at = now;

        // Only a transition into done goes through the reward path
        match req.status {
            Some(TaskStatus::Done) if task.status != TaskStatus::Done => {
                self.mark_done(&mut tx, &mut task, now).await?;
            }
            Some(status) => {
                task.status = status;
                task.completed = status == TaskStatus::Done;
                save_task(&mut tx, &task).await?;
            }
            None => save_task(&mut tx, &task).await?,
        }

        tx.commit().await?;

        tracing::debug!("Task updated: {}", id);
        Ok(task)
    }

    pub async fn delete_task(&self, user_id: &str, id: &str) -> Result<()> {
        tracing::info!("Deleting task: {}", id);
        self.repo.delete_owned::<Task>(user_id, id).await
    }

    pub async fn freeze_task(&self, user_id: &str, id: &str) -> Result<Task> {
        self.repo.set_task_frozen(user_id, id, true, self.clock.now()).await
    }

    pub async fn unfreeze_task(&self, user_id: &str, id: &str) -> Result<Task> {
        self.repo.set_task_frozen(user_id, id, false, self.clock.now()).await
    }

    /// Move a task to `in_progress`
    pub async fn start_task(&self, user_id: &str, id: &str) -> Result<StartTaskResponse> {
        let mut tx = self.repo.begin().await?;
        let mut task: Task = fetch_owned(&mut tx, user_id, id).await?;

        if task.frozen {
            return Err(AppError::Conflict("task is frozen".to_string()));
        }
        if matches!(task.status, TaskStatus::InProgress | TaskStatus::Done) {
            return Err(AppError::Conflict(
                "task already started or done".to_string(),
            ));
        }

        task.status = TaskStatus::InProgress;
        task.updated_at = self.clock.now();
        save_task(&mut tx, &task).await?;
        tx.commit().await?;

        tracing::info!("Task started: {}", id);
        Ok(StartTaskResponse {
            status: task.status,
        })
    }

    /// Move a task to `done`. Fails with `Conflict` if it already is.
    pub async fn complete_task(&self, user_id: &str, id: &str) -> Result<CompleteTaskResponse> {
        let now = self.clock.now();
        let mut tx = self.repo.begin().await?;
        let mut task: Task = fetch_owned(&mut tx, user_id, id).await?;

        // A duplicate request lands here once the first one commits
        if task.status == TaskStatus::Done {
            return Err(AppError::Conflict("task already done".to_string()));
        }

        task.updated_at = now;
        let settlement = self.mark_done(&mut tx, &mut task, now).await?;
        tx.commit().await?;

        Ok(CompleteTaskResponse {
            status: task.status,
            xp: settlement.summary.xp,
            coins: settlement.summary.coins,
        })
    }

    /// Persist the transition into `done`. Rewards are only settled on the
    /// first completion; `completed_at` is never overwritten.
    async fn mark_done(
        &self,
        conn: &mut SqliteConnection,
        task: &mut Task,
        now: DateTime<Utc>,
    ) -> Result<Settlement> {
        let first_completion = task.completed_at.is_none();

        task.status = TaskStatus::Done;
        task.completed = true;
        if first_completion {
            task.completed_at = Some(now);
        }
        save_task(conn, task).await?;

        if !first_completion {
            tracing::info!("Task {} completed again, no reward", task.id);
            return apply_effects(conn, &task.user_id, &[], now).await;
        }

        // Today's count includes this task
        let (start, end) = day_bounds(now.date_naive());
        let completed_today = count_completed_between(conn, &task.user_id, start, end).await?;

        let event = DomainEvent::TaskCompleted {
            user_id: task.user_id.clone(),
            task_id: task.id.clone(),
            title: task.title.clone(),
            completed_today,
        };
        let effects = self.dispatcher.dispatch(&event);
        let settlement = apply_effects(conn, &task.user_id, &effects, now).await?;

        tracing::info!(
            "Task {} completed ({} today): +{} xp, +{} coins",
            task.id,
            completed_today,
            settlement.xp_awarded,
            settlement.coins_awarded
        );

        Ok(settlement)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::repository::test_support::*;
    use crate::database::{Badge, Notification, NotificationType};
    use chrono::Duration;

    async fn create_test_service() -> (TaskService, Repository, FixedClock) {
        let repo = create_test_repo().await;
        let clock = FixedClock::new(t0());
        let service = TaskService::new(
            repo.clone(),
            Arc::new(EventDispatcher::with_default_rules()),
            Arc::new(clock.clone()),
        );
        (service, repo, clock)
    }

    async fn new_task(service: &TaskService, user_id: &str, title: &str) -> Task {
        service
            .create_task(
                user_id,
                CreateTaskRequest {
                    title: title.to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap()
    }

    async fn badge_keys(repo: &Repository, user_id: &str) -> Vec<String> {
        let mut keys: Vec<String> = repo
            .list_owned::<Badge>(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|b| b.key)
            .collect();
        keys.sort();
        keys
    }

    #[tokio::test]
    async fn test_complete_task_rewards_once() {
        let (service, repo, _clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;
        let task = new_task(&service, &user.id, "Wash dishes").await;

        let response = service.complete_task(&user.id, &task.id).await.unwrap();
        assert_eq!(response.status, TaskStatus::Done);
        assert_eq!((response.xp, response.coins), (0, 210));

        let err = service.complete_task(&user.id, &task.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let summary = repo.reward_summary(&user.id, t0()).await.unwrap();
        assert_eq!((summary.xp, summary.coins, summary.level), (0, 210, 2));

        let stored = service.get_task(&user.id, &task.id).await.unwrap();
        assert!(stored.completed);
        assert_eq!(stored.completed_at, Some(t0()));
    }

    #[tokio::test]
    async fn test_completion_notifications() {
        let (service, repo, _clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;
        let task = new_task(&service, &user.id, "Wash dishes").await;

        service.complete_task(&user.id, &task.id).await.unwrap();

        let mut kinds: Vec<NotificationType> = repo
            .list_owned::<Notification>(&user.id)
            .await
            .unwrap()
            .into_iter()
            .map(|n| n.kind)
            .collect();
        kinds.sort_by_key(|k| format!("{:?}", k));
        assert_eq!(kinds, vec![NotificationType::LevelUp, NotificationType::TaskComplete]);
    }

    #[tokio::test]
    async fn test_daily_badges_follow_completion_count() {
        let (service, repo, _clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;

        let first = new_task(&service, &user.id, "one").await;
        service.complete_task(&user.id, &first.id).await.unwrap();
        assert!(badge_keys(&repo, &user.id).await.is_empty());

        let second = new_task(&service, &user.id, "two").await;
        service.complete_task(&user.id, &second.id).await.unwrap();
        assert_eq!(badge_keys(&repo, &user.id).await, vec!["daily_2_tasks"]);

        let third = new_task(&service, &user.id, "three").await;
        service.complete_task(&user.id, &third.id).await.unwrap();
        assert_eq!(
            badge_keys(&repo, &user.id).await,
            vec!["daily_2_tasks", "daily_3_tasks"]
        );
    }

    #[tokio::test]
    async fn test_completions_on_other_days_do_not_count() {
        let (service, repo, clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;

        let yesterday = new_task(&service, &user.id, "yesterday").await;
        clock.set(t0() - Duration::days(1));
        service.complete_task(&user.id, &yesterday.id).await.unwrap();

        clock.set(t0());
        let today = new_task(&service, &user.id, "today").await;
        service.complete_task(&user.id, &today.id).await.unwrap();

        assert!(badge_keys(&repo, &user.id).await.is_empty());
    }

    #[tokio::test]
    async fn test_recompletion_after_reopen_is_not_rewarded() {
        let (service, repo, clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;
        let task = new_task(&service, &user.id, "Laundry").await;

        service.complete_task(&user.id, &task.id).await.unwrap();
        let before = repo.reward_summary(&user.id, t0()).await.unwrap();

        clock.advance(Duration::hours(2));
        let reopened = service
            .update_task(
                &user.id,
                &task.id,
                UpdateTaskRequest {
                    status: Some(TaskStatus::Todo),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(!reopened.completed);
        assert_eq!(reopened.completed_at, Some(t0()));

        service.complete_task(&user.id, &task.id).await.unwrap();

        let after = repo.reward_summary(&user.id, t0()).await.unwrap();
        assert_eq!(after, before);

        let stored = service.get_task(&user.id, &task.id).await.unwrap();
        assert_eq!(stored.status, TaskStatus::Done);
        assert_eq!(stored.completed_at, Some(t0()));
    }

    #[tokio::test]
    async fn test_update_into_done_rewards_like_complete() {
        let (service, repo, _clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;
        let task = new_task(&service, &user.id, "Homework").await;

        let done = UpdateTaskRequest {
            status: Some(TaskStatus::Done),
            ..Default::default()
        };
        service.update_task(&user.id, &task.id, done.clone()).await.unwrap();
        service.update_task(&user.id, &task.id, done).await.unwrap();

        let summary = repo.reward_summary(&user.id, t0()).await.unwrap();
        assert_eq!(summary.level, 2);
        assert_eq!(summary.coins, 210);
    }

    #[tokio::test]
    async fn test_created_done_is_not_rewarded() {
        let (service, repo, _clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;

        let task = service
            .create_task(
                &user.id,
                CreateTaskRequest {
                    title: "Already did it".to_string(),
                    status: TaskStatus::Done,
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert!(task.completed);
        assert_eq!(task.completed_at, Some(t0()));

        let summary = repo.reward_summary(&user.id, t0()).await.unwrap();
        assert_eq!((summary.xp, summary.coins, summary.level), (0, 0, 1));
    }

    #[tokio::test]
    async fn test_start_task_rules() {
        let (service, repo, _clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;
        let task = new_task(&service, &user.id, "Read chapter 3").await;

        service.freeze_task(&user.id, &task.id).await.unwrap();
        let err = service.start_task(&user.id, &task.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(msg) if msg == "task is frozen"));

        service.unfreeze_task(&user.id, &task.id).await.unwrap();
        let response = service.start_task(&user.id, &task.id).await.unwrap();
        assert_eq!(response.status, TaskStatus::InProgress);

        let err = service.start_task(&user.id, &task.id).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_foreign_task_is_not_found() {
        let (service, repo, _clock) = create_test_service().await;
        let alice = create_test_user(&repo, "alice").await;
        let bob = create_test_user(&repo, "bob").await;
        let task = new_task(&service, &alice.id, "Private").await;

        assert!(matches!(
            service.complete_task(&bob.id, &task.id).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service.start_task(&bob.id, &task.id).await,
            Err(AppError::NotFound { .. })
        ));
        assert!(matches!(
            service.delete_task(&bob.id, &task.id).await,
            Err(AppError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_empty_title_rejected() {
        let (service, repo, _clock) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;

        let err = service
            .create_task(&user.id, CreateTaskRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
