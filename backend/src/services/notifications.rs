//! Notifications and reminders
//!
//! Reminders become `reminder_due` notifications when the sweep (or any
//! caller) runs `fire_due_reminders`. Each reminder fires once.

use crate::clock::Clock;
use crate::database::repository::{insert_notification, mark_reminder_notified};
use crate::database::{
    CreateReminderRequest, NewNotification, Notification, NotificationType, Reminder, Repository,
};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};
use std::sync::Arc;

/// Service for the notification feed
#[derive(Clone)]
pub struct NotificationService {
    repo: Repository,
}

impl NotificationService {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Newest first
    pub async fn list_notifications(&self, user_id: &str) -> Result<Vec<Notification>> {
        self.repo.list_owned(user_id).await
    }

    pub async fn unread_count(&self, user_id: &str) -> Result<i64> {
        self.repo.unread_notification_count(user_id).await
    }

    pub async fn mark_read(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.mark_notification_read(user_id, id).await
    }
}

/// Service for reminders
#[derive(Clone)]
pub struct ReminderService {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl ReminderService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn create_reminder(
        &self,
        user_id: &str,
        req: CreateReminderRequest,
    ) -> Result<Reminder> {
        if req.title.trim().is_empty() {
            return Err(AppError::Validation("reminder title is required".to_string()));
        }

        tracing::info!("Creating reminder for {} at {:?}", user_id, req.remind_at);
        self.repo.create_reminder(user_id, req, self.clock.now()).await
    }

    pub async fn list_reminders(&self, user_id: &str) -> Result<Vec<Reminder>> {
        self.repo.list_owned(user_id).await
    }

    pub async fn delete_reminder(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.delete_owned::<Reminder>(user_id, id).await
    }

    pub async fn freeze_reminder(&self, user_id: &str, id: &str, reason: &str) -> Result<Reminder> {
        self.repo.set_reminder_frozen(user_id, id, true, reason).await
    }

    pub async fn unfreeze_reminder(&self, user_id: &str, id: &str) -> Result<Reminder> {
        self.repo.set_reminder_frozen(user_id, id, false, "").await
    }

    pub async fn snooze_reminder(
        &self,
        user_id: &str,
        id: &str,
        until: DateTime<Utc>,
    ) -> Result<Reminder> {
        if until <= self.clock.now() {
            return Err(AppError::Validation(
                "snooze time must be in the future".to_string(),
            ));
        }
        self.repo.snooze_reminder(user_id, id, until).await
    }

    /// Turn every due reminder into a `reminder_due` notification.
    /// Returns the number of notifications created.
    pub async fn fire_due_reminders(&self, user_id: &str) -> Result<usize> {
        let now = self.clock.now();
        let due = self.repo.due_reminders(user_id, now).await?;
        let mut fired = 0;

        for reminder in due {
            let mut tx = self.repo.begin().await?;

            // Another sweep got there first
            if !mark_reminder_notified(&mut tx, &reminder.id).await? {
                continue;
            }

            let message = if reminder.note.is_empty() {
                reminder.title.clone()
            } else {
                format!("{}: {}", reminder.title, reminder.note)
            };
            let notice = NewNotification {
                kind: NotificationType::ReminderDue,
                title: "Reminder".to_string(),
                message,
                related_task_id: reminder.task_id.clone(),
                related_reminder_id: Some(reminder.id.clone()),
            };
            insert_notification(&mut tx, user_id, &notice, now).await?;
            tx.commit().await?;

            tracing::info!("Triggered reminder {} for {}", reminder.id, user_id);
            fired += 1;
        }

        Ok(fired)
    }
}
