use super::{ensure_owned, OwnedResource, Repository};
use crate::database::{CreateReminderRequest, NewNotification, Notification, Reminder, Task};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

impl OwnedResource for Notification {
    const TABLE: &'static str = "notifications";
    const ENTITY: &'static str = "Notification";
}

impl OwnedResource for Reminder {
    const TABLE: &'static str = "reminders";
    const ENTITY: &'static str = "Reminder";
    const ORDER_BY: &'static str = "remind_at ASC";
}

impl Repository {
    pub async fn unread_notification_count(&self, user_id: &str) -> Result<i64> {
        let count = sqlx::query_scalar(
            "SELECT COUNT(*) FROM notifications WHERE user_id = ? AND is_read = 0",
        )
        .bind(user_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(count)
    }

    pub async fn mark_notification_read(&self, user_id: &str, id: &str) -> Result<()> {
        let rows = sqlx::query("UPDATE notifications SET is_read = 1 WHERE id = ? AND user_id = ?")
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found(Notification::ENTITY, id));
        }
        Ok(())
    }

    // ===== Reminders =====

    pub async fn create_reminder(
        &self,
        user_id: &str,
        req: CreateReminderRequest,
        now: DateTime<Utc>,
    ) -> Result<Reminder> {
        let mut conn = self.pool.acquire().await?;
        if let Some(task_id) = &req.task_id {
            ensure_owned::<Task>(&mut conn, user_id, task_id).await?;
        }

        let id = Uuid::new_v4().to_string();

        let reminder = sqlx::query_as::<_, Reminder>(
            r#"
            INSERT INTO reminders (id, user_id, task_id, title, note, remind_at, repeat_rule, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.task_id)
        .bind(&req.title)
        .bind(&req.note)
        .bind(req.remind_at)
        .bind(&req.repeat_rule)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Created reminder: {} at {:?}", id, req.remind_at);
        Ok(reminder)
    }

    pub async fn set_reminder_frozen(
        &self,
        user_id: &str,
        id: &str,
        frozen: bool,
        reason: &str,
    ) -> Result<Reminder> {
        let reason = if frozen { reason } else { "" };

        let rows = sqlx::query(
            "UPDATE reminders SET frozen = ?, freeze_reason = ? WHERE id = ? AND user_id = ?",
        )
        .bind(frozen)
        .bind(reason)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found(Reminder::ENTITY, id));
        }

        self.get_owned(user_id, id).await
    }

    pub async fn snooze_reminder(
        &self,
        user_id: &str,
        id: &str,
        until: DateTime<Utc>,
    ) -> Result<Reminder> {
        let rows = sqlx::query(
            "UPDATE reminders SET snoozed_until = ? WHERE id = ? AND user_id = ?",
        )
        .bind(until)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found(Reminder::ENTITY, id));
        }

        self.get_owned(user_id, id).await
    }

    /// Reminders whose time has come: not yet notified, not frozen, and not
    /// snoozed past `now`
    pub async fn due_reminders(&self, user_id: &str, now: DateTime<Utc>) -> Result<Vec<Reminder>> {
        let reminders = sqlx::query_as::<_, Reminder>(
            r#"
            SELECT * FROM reminders
            WHERE user_id = ?
              AND remind_at IS NOT NULL AND remind_at <= ?
              AND notified = 0
              AND frozen = 0
              AND (snoozed_until IS NULL OR snoozed_until <= ?)
            ORDER BY remind_at ASC
            "#,
        )
        .bind(user_id)
        .bind(now)
        .bind(now)
        .fetch_all(&self.pool)
        .await?;

        Ok(reminders)
    }
}

/// Append a notification; the sink is append-only apart from `is_read`
pub(crate) async fn insert_notification(
    conn: &mut SqliteConnection,
    user_id: &str,
    notification: &NewNotification,
    now: DateTime<Utc>,
) -> Result<Notification> {
    let id = Uuid::new_v4().to_string();

    let row = sqlx::query_as::<_, Notification>(
        r#"
        INSERT INTO notifications (
            id, user_id, type, title, message, related_task_id, related_reminder_id, is_read, created_at
        )
        VALUES (?, ?, ?, ?, ?, ?, ?, 0, ?)
        RETURNING *
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(notification.kind)
    .bind(&notification.title)
    .bind(&notification.message)
    .bind(&notification.related_task_id)
    .bind(&notification.related_reminder_id)
    .bind(now)
    .fetch_one(&mut *conn)
    .await?;

    tracing::debug!("Appended {:?} notification for {}", notification.kind, user_id);
    Ok(row)
}

/// Flag a reminder as delivered. Returns false if another caller got there first.
pub(crate) async fn mark_reminder_notified(conn: &mut SqliteConnection, id: &str) -> Result<bool> {
    let rows = sqlx::query("UPDATE reminders SET notified = 1 WHERE id = ? AND notified = 0")
        .bind(id)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    Ok(rows == 1)
}
