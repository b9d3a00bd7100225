//! Users and categories

use crate::clock::Clock;
use crate::database::{Category, Repository, User};
use crate::error::{AppError, Result};
use std::sync::Arc;

/// Service for user accounts
#[derive(Clone)]
pub struct UserService {
    repo: Repository,
    clock: Arc<dyn Clock>,
    default_salary_cents: i64,
}

impl UserService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>, default_salary_cents: i64) -> Self {
        Self {
            repo,
            clock,
            default_salary_cents,
        }
    }

    pub async fn create_user(&self, username: &str, email: &str) -> Result<User> {
        let username = username.trim();
        if username.is_empty() {
            return Err(AppError::Validation("username is required".to_string()));
        }

        // New users start on the configured salary
        let user = self
            .repo
            .create_user(username, email, self.default_salary_cents, self.clock.now())
            .await?;

        tracing::info!("Registered user {} ({})", user.username, user.id);
        Ok(user)
    }

    pub async fn get_user(&self, id: &str) -> Result<User> {
        self.repo.get_user(id).await
    }

    pub async fn list_user_ids(&self) -> Result<Vec<String>> {
        self.repo.list_user_ids().await
    }

    pub async fn set_salary(&self, user_id: &str, salary_cents: i64) -> Result<()> {
        if salary_cents < 0 {
            return Err(AppError::Validation("salary cannot be negative".to_string()));
        }
        self.repo.set_salary(user_id, salary_cents).await
    }
}

/// Service for task categories
#[derive(Clone)]
pub struct CategoryService {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl CategoryService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    pub async fn create_category(&self, user_id: &str, name: &str, color: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("category name is required".to_string()));
        }
        self.repo
            .create_category(user_id, name, color, self.clock.now())
            .await
    }

    /// Global categories plus the user's own
    pub async fn list_categories(&self, user_id: &str) -> Result<Vec<Category>> {
        self.repo.list_categories(user_id).await
    }

    /// Only the user's own categories can be deleted
    pub async fn delete_category(&self, user_id: &str, id: &str) -> Result<()> {
        self.repo.delete_owned::<Category>(user_id, id).await
    }
}
