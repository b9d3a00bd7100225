//! Journal service: notes to self and mood logs

use crate::clock::Clock;
use crate::database::{CreateNoteRequest, MoodLog, Note, Repository};
use crate::error::{AppError, Result};
use chrono::NaiveDate;
use std::sync::Arc;

#[derive(Clone)]
pub struct JournalService {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl JournalService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn create_note(&self, user_id: &str, req: CreateNoteRequest) -> Result<Note> {
        if req.body.trim().is_empty() {
            return Err(AppError::Validation("note body is required".to_string()));
        }

        let note = self.repo.create_note(user_id, req, self.clock.now()).await?;
        tracing::debug!("Note created: {}", note.id);
        Ok(note)
    }

    /// Notes newest first, optionally only those attached to `task_id`
    pub async fn list_notes(&self, user_id: &str, task_id: Option<&str>) -> Result<Vec<Note>> {
        self.repo.list_notes(user_id, task_id).await
    }

    pub async fn delete_note(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.delete_owned::<Note>(user_id, id).await
    }

    /// Schedule a note for the user's future self
    pub async fn send_to_future(&self, user_id: &str, id: &str, date: NaiveDate) -> Result<Note> {
        if date <= self.clock.today() {
            return Err(AppError::Validation(
                "future_date must be after today".to_string(),
            ));
        }

        tracing::info!("Note {} scheduled for {}", id, date);
        self.repo.schedule_note_for_future(user_id, id, date).await
    }

    /// Record a mood; `rating`, when given, must be at least 1
    pub async fn log_mood(
        &self,
        user_id: &str,
        mood: &str,
        rating: Option<i64>,
        note: &str,
    ) -> Result<MoodLog> {
        if mood.trim().is_empty() {
            return Err(AppError::Validation("mood is required".to_string()));
        }
        if matches!(rating, Some(r) if r < 1) {
            return Err(AppError::Validation("rating must be at least 1".to_string()));
        }

        self.repo
            .create_mood_log(user_id, mood, rating, note, self.clock.now())
            .await
    }

    /// Mood history, newest first
    pub async fn list_moods(&self, user_id: &str) -> Result<Vec<MoodLog>> {
        self.repo.list_owned(user_id).await
    }

    pub async fn delete_mood(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.delete_owned::<MoodLog>(user_id, id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::repository::test_support::*;
    use crate::database::CreateTaskRequest;
    use chrono::Duration;

    async fn create_test_service() -> (JournalService, Repository) {
        let repo = create_test_repo().await;
        let service = JournalService::new(repo.clone(), Arc::new(FixedClock::new(t0())));
        (service, repo)
    }

    #[tokio::test]
    async fn test_notes_filtered_by_task() {
        let (service, repo) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;
        let task = repo
            .create_task(
                &user.id,
                CreateTaskRequest {
                    title: "Essay".to_string(),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap();

        service
            .create_note(
                &user.id,
                CreateNoteRequest {
                    body: "Outline first".to_string(),
                    task_id: Some(task.id.clone()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        service
            .create_note(
                &user.id,
                CreateNoteRequest {
                    body: "Unrelated thought".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(service.list_notes(&user.id, None).await.unwrap().len(), 2);
        let for_task = service.list_notes(&user.id, Some(&task.id)).await.unwrap();
        assert_eq!(for_task.len(), 1);
        assert_eq!(for_task[0].body, "Outline first");
    }

    #[tokio::test]
    async fn test_send_to_future() {
        let (service, repo) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;
        let note = service
            .create_note(
                &user.id,
                CreateNoteRequest {
                    body: "Dear future me".to_string(),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        let today = t0().date_naive();
        assert!(matches!(
            service.send_to_future(&user.id, &note.id, today).await,
            Err(AppError::Validation(_))
        ));

        let date = today + Duration::days(30);
        let scheduled = service.send_to_future(&user.id, &note.id, date).await.unwrap();
        assert!(scheduled.send_to_future);
        assert_eq!(scheduled.future_date, Some(date));
    }

    #[tokio::test]
    async fn test_mood_rating_validation() {
        let (service, repo) = create_test_service().await;
        let user = create_test_user(&repo, "bun").await;

        assert!(matches!(
            service.log_mood(&user.id, "tired", Some(0), "").await,
            Err(AppError::Validation(_))
        ));

        service.log_mood(&user.id, "calm", None, "").await.unwrap();
        service.log_mood(&user.id, "happy", Some(4), "sunny").await.unwrap();
        assert_eq!(service.list_moods(&user.id).await.unwrap().len(), 2);
    }
}
