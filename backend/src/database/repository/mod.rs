//! Repository layer for database operations
//!
//! Every user-owned table is read and written through `Repository`, always
//! filtered by the owning user. Methods on `Repository` run against the pool;
//! the `pub(crate)` free functions in each submodule take a connection so the
//! services can compose them inside one transaction.

mod focus;
mod notifications;
mod records;
mod rewards;
mod shopping;
mod tasks;
mod users;

pub(crate) use focus::{attach_tasks, finish_session, insert_session};
pub(crate) use notifications::{insert_notification, mark_reminder_notified};
pub(crate) use rewards::{award_badge_in, deposit_in, grant_coins_in, summary_in};
pub(crate) use shopping::impulsive_expense_since;
pub(crate) use tasks::{count_completed_between, ensure_category_visible, save_task};

use crate::error::{AppError, Result};
use sqlx::sqlite::SqliteRow;
use sqlx::{FromRow, Sqlite, SqliteConnection, SqlitePool, Transaction};

/// A table whose rows each belong to exactly one user
pub trait OwnedResource: for<'r> FromRow<'r, SqliteRow> + Send + Unpin {
    const TABLE: &'static str;
    /// Human-readable name used in `NotFound` errors
    const ENTITY: &'static str;
    const ORDER_BY: &'static str = "created_at DESC";
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start a unit of work holding the write lock.
    ///
    /// A concurrent duplicate waits up to the busy timeout, then reads the
    /// committed state.
    pub async fn begin(&self) -> Result<Transaction<'static, Sqlite>> {
        Ok(self.pool.begin_with("BEGIN IMMEDIATE").await?)
    }

    /// Get a resource owned by `user_id`
    pub async fn get_owned<T: OwnedResource>(&self, user_id: &str, id: &str) -> Result<T> {
        let mut conn = self.pool.acquire().await?;
        fetch_owned(&mut conn, user_id, id).await
    }

    /// List every resource of a kind owned by `user_id`
    pub async fn list_owned<T: OwnedResource>(&self, user_id: &str) -> Result<Vec<T>> {
        let sql = format!(
            "SELECT * FROM {} WHERE user_id = ? ORDER BY {}",
            T::TABLE,
            T::ORDER_BY
        );

        let rows = sqlx::query_as::<_, T>(&sql)
            .bind(user_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows)
    }

    /// Delete a resource owned by `user_id`
    pub async fn delete_owned<T: OwnedResource>(&self, user_id: &str, id: &str) -> Result<()> {
        let sql = format!("DELETE FROM {} WHERE id = ? AND user_id = ?", T::TABLE);

        let rows = sqlx::query(&sql)
            .bind(id)
            .bind(user_id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        if rows == 0 {
            return Err(AppError::not_found(T::ENTITY, id));
        }

        tracing::debug!("Deleted {} {} for user {}", T::ENTITY, id, user_id);
        Ok(())
    }
}

pub(crate) async fn fetch_owned<T: OwnedResource>(
    conn: &mut SqliteConnection,
    user_id: &str,
    id: &str,
) -> Result<T> {
    let sql = format!("SELECT * FROM {} WHERE id = ? AND user_id = ?", T::TABLE);

    sqlx::query_as::<_, T>(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_optional(&mut *conn)
        .await?
        .ok_or_else(|| AppError::not_found(T::ENTITY, id))
}

/// Fail with `NotFound` unless `id` names a row owned by `user_id`
pub(crate) async fn ensure_owned<T: OwnedResource>(
    conn: &mut SqliteConnection,
    user_id: &str,
    id: &str,
) -> Result<()> {
    let sql = format!("SELECT COUNT(*) FROM {} WHERE id = ? AND user_id = ?", T::TABLE);

    let found: i64 = sqlx::query_scalar(&sql)
        .bind(id)
        .bind(user_id)
        .fetch_one(&mut *conn)
        .await?;

    if found == 0 {
        return Err(AppError::not_found(T::ENTITY, id));
    }
    Ok(())
}
