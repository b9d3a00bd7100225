//! Categories, hobbies and journal records

use super::{ensure_owned, OwnedResource, Repository};
use crate::database::{
    Category, CreateHobbyRequest, CreateNoteRequest, Hobby, HobbyActivity, Metadata, MoodLog,
    Note, Task,
};
use crate::error::{conflict_on_unique, AppError, Result};
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::types::Json;
use uuid::Uuid;

impl OwnedResource for Category {
    const TABLE: &'static str = "categories";
    const ENTITY: &'static str = "Category";
    const ORDER_BY: &'static str = "name ASC";
}

impl OwnedResource for Hobby {
    const TABLE: &'static str = "hobbies";
    const ENTITY: &'static str = "Hobby";
}

impl OwnedResource for HobbyActivity {
    const TABLE: &'static str = "hobby_activities";
    const ENTITY: &'static str = "Hobby activity";
    const ORDER_BY: &'static str = "timestamp DESC";
}

impl OwnedResource for Note {
    const TABLE: &'static str = "notes";
    const ENTITY: &'static str = "Note";
}

impl OwnedResource for MoodLog {
    const TABLE: &'static str = "mood_logs";
    const ENTITY: &'static str = "Mood log";
}

impl Repository {
    // ===== Categories =====

    pub async fn create_category(
        &self,
        user_id: &str,
        name: &str,
        color: &str,
        now: DateTime<Utc>,
    ) -> Result<Category> {
        let id = Uuid::new_v4().to_string();

        let category = sqlx::query_as::<_, Category>(
            r#"
            INSERT INTO categories (id, user_id, name, color, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(name)
        .bind(color)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("category '{}' already exists", name)))?;

        tracing::debug!("Created category: {} ({})", name, id);
        Ok(category)
    }

    /// Global seed categories followed by the user's own, each sorted by name
    pub async fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        let categories = sqlx::query_as::<_, Category>(
            r#"
            SELECT * FROM categories
            WHERE user_id IS NULL OR user_id = ?
            ORDER BY user_id IS NOT NULL, name ASC
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(categories)
    }

    // ===== Hobbies =====

    pub async fn create_hobby(
        &self,
        user_id: &str,
        req: CreateHobbyRequest,
        now: DateTime<Utc>,
    ) -> Result<Hobby> {
        let id = Uuid::new_v4().to_string();

        let hobby = sqlx::query_as::<_, Hobby>(
            r#"
            INSERT INTO hobbies (id, user_id, name, description, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.name)
        .bind(&req.description)
        .bind(&req.note)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Created hobby: {}", id);
        Ok(hobby)
    }

    /// Freeze with a reason, or unfreeze (reason cleared)
    pub async fn set_hobby_frozen(
        &self,
        user_id: &str,
        id: &str,
        frozen: bool,
        reason: &str,
    ) -> Result<Hobby> {
        let reason = if frozen { reason } else { "" };

        let rows = sqlx::query(
            "UPDATE hobbies SET frozen = ?, freeze_reason = ? WHERE id = ? AND user_id = ?",
        )
        .bind(frozen)
        .bind(reason)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found(Hobby::ENTITY, id));
        }

        self.get_owned(user_id, id).await
    }

    pub async fn log_hobby_activity(
        &self,
        user_id: &str,
        hobby_id: &str,
        timestamp: DateTime<Utc>,
        notes: &str,
        custom_data: &Metadata,
        now: DateTime<Utc>,
    ) -> Result<HobbyActivity> {
        let mut conn = self.pool.acquire().await?;
        ensure_owned::<Hobby>(&mut conn, user_id, hobby_id).await?;

        let id = Uuid::new_v4().to_string();

        let activity = sqlx::query_as::<_, HobbyActivity>(
            r#"
            INSERT INTO hobby_activities (id, user_id, hobby_id, timestamp, notes, custom_data, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(hobby_id)
        .bind(timestamp)
        .bind(notes)
        .bind(Json(custom_data))
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Logged activity {} for hobby {}", id, hobby_id);
        Ok(activity)
    }

    pub async fn list_hobby_activities(
        &self,
        user_id: &str,
        hobby_id: &str,
    ) -> Result<Vec<HobbyActivity>> {
        let mut conn = self.pool.acquire().await?;
        ensure_owned::<Hobby>(&mut conn, user_id, hobby_id).await?;

        let activities = sqlx::query_as::<_, HobbyActivity>(
            "SELECT * FROM hobby_activities WHERE hobby_id = ? AND user_id = ? ORDER BY timestamp DESC",
        )
        .bind(hobby_id)
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;

        Ok(activities)
    }

    /// Timestamp of the hobby's most recent activity, if any
    pub async fn last_activity_at(
        &self,
        user_id: &str,
        hobby_id: &str,
    ) -> Result<Option<DateTime<Utc>>> {
        let last = sqlx::query_scalar(
            r#"
            SELECT timestamp FROM hobby_activities
            WHERE hobby_id = ? AND user_id = ?
            ORDER BY timestamp DESC
            LIMIT 1
            "#,
        )
        .bind(hobby_id)
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(last)
    }

    // ===== Journal =====

    pub async fn create_note(
        &self,
        user_id: &str,
        req: CreateNoteRequest,
        now: DateTime<Utc>,
    ) -> Result<Note> {
        let mut conn = self.pool.acquire().await?;
        // A note may only point at the caller's own task
        if let Some(task_id) = &req.task_id {
            ensure_owned::<Task>(&mut conn, user_id, task_id).await?;
        }

        let id = Uuid::new_v4().to_string();

        let note = sqlx::query_as::<_, Note>(
            r#"
            INSERT INTO notes (id, user_id, title, body, task_id, mood_at_time, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(&req.title)
        .bind(&req.body)
        .bind(&req.task_id)
        .bind(&req.mood_at_time)
        .bind(now)
        .fetch_one(&mut *conn)
        .await?;

        tracing::debug!("Created note: {}", id);
        Ok(note)
    }

    /// Notes newest first, optionally only those attached to one task
    pub async fn list_notes(&self, user_id: &str, task_id: Option<&str>) -> Result<Vec<Note>> {
        let notes = match task_id {
            Some(task_id) => {
                sqlx::query_as::<_, Note>(
                    "SELECT * FROM notes WHERE user_id = ? AND task_id = ? ORDER BY created_at DESC",
                )
                .bind(user_id)
                .bind(task_id)
                .fetch_all(&self.pool)
                .await?
            }
            None => self.list_owned::<Note>(user_id).await?,
        };

        Ok(notes)
    }

    /// Mark a note for delivery to the user's future self on `date`
    pub async fn schedule_note_for_future(
        &self,
        user_id: &str,
        id: &str,
        date: NaiveDate,
    ) -> Result<Note> {
        let rows = sqlx::query(
            "UPDATE notes SET send_to_future = 1, future_date = ? WHERE id = ? AND user_id = ?",
        )
        .bind(date)
        .bind(id)
        .bind(user_id)
        .execute(&self.pool)
        .await?
        .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found(Note::ENTITY, id));
        }

        // Return updated note
        self.get_owned(user_id, id).await
    }

    pub async fn create_mood_log(
        &self,
        user_id: &str,
        mood: &str,
        rating: Option<i64>,
        note: &str,
        now: DateTime<Utc>,
    ) -> Result<MoodLog> {
        let id = Uuid::new_v4().to_string();

        let log = sqlx::query_as::<_, MoodLog>(
            r#"
            INSERT INTO mood_logs (id, user_id, mood, rating, note, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(user_id)
        .bind(mood)
        .bind(rating)
        .bind(note)
        .bind(now)
        .fetch_one(&self.pool)
        .await?;

        tracing::debug!("Logged mood: {}", id);
        Ok(log)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::*;

    #[tokio::test]
    async fn test_categories_global_then_own() {
        let repo = create_test_repo().await;
        let alice = create_test_user(&repo, "alice").await;
        let bob = create_test_user(&repo, "bob").await;

        repo.create_category(&alice.id, "Aquarium", "#0000ff", t0())
            .await
            .unwrap();

        let names: Vec<String> = repo
            .list_categories(&alice.id)
            .await
            .unwrap()
            .into_iter()
            .map(|c| c.name)
            .collect();
        assert_eq!(
            names,
            vec!["Chores", "Hobby", "School", "SmallBusiness", "Work", "Aquarium"]
        );

        assert_eq!(repo.list_categories(&bob.id).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_duplicate_category_name_conflicts() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo, "bun").await;

        repo.create_category(&user.id, "Garden", "", t0()).await.unwrap();
        let err = repo
            .create_category(&user.id, "Garden", "", t0())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_seed_category_cannot_be_deleted() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo, "bun").await;

        let err = repo
            .delete_owned::<Category>(&user.id, "seed-chores")
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_hobby_freeze_clears_reason_on_unfreeze() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo, "bun").await;
        let hobby = repo
            .create_hobby(
                &user.id,
                CreateHobbyRequest {
                    name: "Knitting".to_string(),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap();

        let frozen = repo
            .set_hobby_frozen(&user.id, &hobby.id, true, "busy month")
            .await
            .unwrap();
        assert!(frozen.frozen);
        assert_eq!(frozen.freeze_reason, "busy month");

        let thawed = repo
            .set_hobby_frozen(&user.id, &hobby.id, false, "ignored")
            .await
            .unwrap();
        assert!(!thawed.frozen);
        assert_eq!(thawed.freeze_reason, "");
    }

    #[tokio::test]
    async fn test_activity_requires_owned_hobby() {
        let repo = create_test_repo().await;
        let alice = create_test_user(&repo, "alice").await;
        let bob = create_test_user(&repo, "bob").await;
        let hobby = repo
            .create_hobby(
                &alice.id,
                CreateHobbyRequest {
                    name: "Painting".to_string(),
                    ..Default::default()
                },
                t0(),
            )
            .await
            .unwrap();

        let err = repo
            .log_hobby_activity(&bob.id, &hobby.id, t0(), "", &Metadata::new(), t0())
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound { entity: "Hobby", .. }));

        assert!(repo.last_activity_at(&alice.id, &hobby.id).await.unwrap().is_none());
        repo.log_hobby_activity(&alice.id, &hobby.id, t0(), "sketch", &Metadata::new(), t0())
            .await
            .unwrap();
        assert_eq!(
            repo.last_activity_at(&alice.id, &hobby.id).await.unwrap(),
            Some(t0())
        );
    }

    #[tokio::test]
    async fn test_mood_rating_must_be_positive() {
        let repo = create_test_repo().await;
        let user = create_test_user(&repo, "bun").await;

        assert!(repo
            .create_mood_log(&user.id, "meh", Some(0), "", t0())
            .await
            .is_err());

        let log = repo
            .create_mood_log(&user.id, "happy", Some(5), "", t0())
            .await
            .unwrap();
        assert_eq!(log.rating, Some(5));
    }
}
