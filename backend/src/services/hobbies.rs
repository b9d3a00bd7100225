//! Hobbies service

use crate::clock::Clock;
use crate::database::{
    CreateHobbyRequest, CreateTaskRequest, Hobby, HobbyActivity, Metadata, Repository, Task,
};
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

#[derive(Clone)]
pub struct HobbyService {
    repo: Repository,
    clock: Arc<dyn Clock>,
    inactivity_days: i64,
}

impl HobbyService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>, inactivity_days: i64) -> Self {
        Self {
            repo,
            clock,
            inactivity_days,
        }
    }

    pub async fn create_hobby(&self, user_id: &str, req: CreateHobbyRequest) -> Result<Hobby> {
        if req.name.trim().is_empty() {
            return Err(AppError::Validation("hobby name is required".to_string()));
        }
        self.repo.create_hobby(user_id, req, self.clock.now()).await
    }

    pub async fn get_hobby(&self, user_id: &str, id: &str) -> Result<Hobby> {
        self.repo.get_owned(user_id, id).await
    }

    pub async fn list_hobbies(&self, user_id: &str) -> Result<Vec<Hobby>> {
        self.repo.list_owned(user_id).await
    }

    pub async fn delete_hobby(&self, user_id: &str, id: &str) -> Result<()> {
        tracing::info!("Deleting hobby: {}", id);
        self.repo.delete_owned::<Hobby>(user_id, id).await
    }

    pub async fn freeze_hobby(&self, user_id: &str, id: &str, reason: &str) -> Result<Hobby> {
        self.repo.set_hobby_frozen(user_id, id, true, reason).await
    }

    pub async fn unfreeze_hobby(&self, user_id: &str, id: &str) -> Result<Hobby> {
        self.repo.set_hobby_frozen(user_id, id, false, "").await
    }

    /// Log an activity; `timestamp` defaults to now
    pub async fn log_activity(
        &self,
        user_id: &str,
        hobby_id: &str,
        timestamp: Option<DateTime<Utc>>,
        notes: &str,
        custom_data: Metadata,
    ) -> Result<HobbyActivity> {
        // Backdated activities keep their own timestamp
        let now = self.clock.now();
        self.repo
            .log_hobby_activity(
                user_id,
                hobby_id,
                timestamp.unwrap_or(now),
                notes,
                &custom_data,
                now,
            )
            .await
    }

    pub async fn list_activities(&self, user_id: &str, hobby_id: &str) -> Result<Vec<HobbyActivity>> {
        self.repo.list_hobby_activities(user_id, hobby_id).await
    }

    /// Turn a logged activity into a task linked to the same hobby
    pub async fn convert_activity_to_task(&self, user_id: &str, activity_id: &str) -> Result<Task> {
        let activity: HobbyActivity = self.repo.get_owned(user_id, activity_id).await?;
        let hobby: Hobby = self.repo.get_owned(user_id, &activity.hobby_id).await?;

        // Title from the first line of the notes, if any
        let title = match activity.notes.lines().next() {
            Some(line) if !line.trim().is_empty() => format!("{}: {}", hobby.name, line.trim()),
            _ => hobby.name.clone(),
        };
        let req = CreateTaskRequest {
            title,
            description: activity.notes.clone(),
            hobby_id: Some(hobby.id.clone()),
            ..Default::default()
        };

        let task = self.repo.create_task(user_id, req, self.clock.now()).await?;
        tracing::info!("Converted hobby activity {} into task {}", activity_id, task.id);
        Ok(task)
    }

    /// Unfrozen hobbies with no activity inside the inactivity window
    pub async fn inactive_hobbies(&self, user_id: &str) -> Result<Vec<Hobby>> {
        let cutoff = self.clock.now() - Duration::days(self.inactivity_days);
        let mut inactive = Vec::new();

        for hobby in self.repo.list_owned::<Hobby>(user_id).await? {
            // Frozen hobbies are paused on purpose
            if hobby.frozen {
                continue;
            }
            match self.repo.last_activity_at(user_id, &hobby.id).await? {
                Some(last) if last >= cutoff => {}
                _ => inactive.push(hobby),
            }
        }

        Ok(inactive)
    }
}
