use super::Repository;
use crate::database::User;
use crate::error::{conflict_on_unique, AppError, Result};
use chrono::{DateTime, Utc};
use uuid::Uuid;

impl Repository {
    /// Register a user; usernames are unique
    pub async fn create_user(
        &self,
        username: &str,
        email: &str,
        salary_cents: i64,
        now: DateTime<Utc>,
    ) -> Result<User> {
        let id = Uuid::new_v4().to_string();

        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, username, email, salary_cents, created_at)
            VALUES (?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(&id)
        .bind(username)
        .bind(email)
        .bind(salary_cents)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| conflict_on_unique(e, format!("username '{}' is taken", username)))?;

        tracing::debug!("Created user: {}", id);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::not_found("User", id))
    }

    pub async fn list_user_ids(&self) -> Result<Vec<String>> {
        let ids = sqlx::query_scalar("SELECT id FROM users ORDER BY created_at ASC")
            .fetch_all(&self.pool)
            .await?;

        Ok(ids)
    }

    pub async fn set_salary(&self, user_id: &str, salary_cents: i64) -> Result<()> {
        let rows = sqlx::query("UPDATE users SET salary_cents = ? WHERE id = ?")
            .bind(salary_cents)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found("User", user_id));
        }
        Ok(())
    }
}
