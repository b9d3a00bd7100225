use super::{OwnedResource, Repository};
use crate::config::BadgeSpec;
use crate::database::{Badge, RewardSummary};
use crate::error::Result;
use crate::rewards::{settle_level, Deposit};
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;
use uuid::Uuid;

impl OwnedResource for Badge {
    const TABLE: &'static str = "badges";
    const ENTITY: &'static str = "Badge";
    const ORDER_BY: &'static str = "earned_at DESC";
}

impl Repository {
    /// The user's reward summary, created at level 1 if missing
    pub async fn reward_summary(&self, user_id: &str, now: DateTime<Utc>) -> Result<RewardSummary> {
        let mut tx = self.begin().await?;
        let summary = summary_in(&mut tx, user_id, now).await?;
        tx.commit().await?;
        Ok(summary)
    }

    /// Add XP and coins, then settle levels
    pub async fn deposit(
        &self,
        user_id: &str,
        xp: i64,
        coins: i64,
        now: DateTime<Utc>,
    ) -> Result<Deposit> {
        let mut tx = self.begin().await?;
        let deposit = deposit_in(&mut tx, user_id, xp, coins, now).await?;
        tx.commit().await?;
        Ok(deposit)
    }

    /// Issue a badge unless the user already holds it. Returns true on first issuance.
    pub async fn award_badge_once(
        &self,
        user_id: &str,
        badge: &BadgeSpec,
        now: DateTime<Utc>,
    ) -> Result<bool> {
        let mut conn = self.pool.acquire().await?;
        award_badge_in(&mut conn, user_id, badge, now).await
    }

    pub async fn count_badges(&self, user_id: &str) -> Result<i64> {
        let count = sqlx::query_scalar("SELECT COUNT(*) FROM badges WHERE user_id = ?")
            .bind(user_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    /// Whether the badge was earned within `[start, end)`
    pub async fn badge_earned_between(
        &self,
        user_id: &str,
        key: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM badges
            WHERE user_id = ? AND key = ? AND earned_at >= ? AND earned_at < ?
            "#,
        )
        .bind(user_id)
        .bind(key)
        .bind(start)
        .bind(end)
        .fetch_one(&self.pool)
        .await?;

        Ok(count > 0)
    }
}

/// Get-or-create. The insert comes first so the unit of work holds the
/// write lock before reading.
pub(crate) async fn summary_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    now: DateTime<Utc>,
) -> Result<RewardSummary> {
    sqlx::query(
        r#"
        INSERT INTO reward_summaries (user_id, xp, coins, level, updated_at)
        VALUES (?, 0, 0, 1, ?)
        ON CONFLICT(user_id) DO NOTHING
        "#,
    )
    .bind(user_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    // Read back the current row
    let summary = sqlx::query_as::<_, RewardSummary>(
        "SELECT * FROM reward_summaries WHERE user_id = ?",
    )
    .bind(user_id)
    .fetch_one(&mut *conn)
    .await?;

    Ok(summary)
}

async fn store_summary(conn: &mut SqliteConnection, summary: &RewardSummary) -> Result<()> {
    sqlx::query(
        "UPDATE reward_summaries SET xp = ?, coins = ?, level = ?, updated_at = ? WHERE user_id = ?",
    )
    .bind(summary.xp)
    .bind(summary.coins)
    .bind(summary.level)
    .bind(summary.updated_at)
    .bind(&summary.user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

pub(crate) async fn deposit_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    xp: i64,
    coins: i64,
    now: DateTime<Utc>,
) -> Result<Deposit> {
    let mut summary = summary_in(conn, user_id, now).await?;

    // Credit first, then drain XP into levels
    summary.xp += xp;
    summary.coins += coins;
    let levels_gained = settle_level(&mut summary);
    summary.updated_at = now;

    store_summary(conn, &summary).await?;

    tracing::debug!(
        "Deposited {} xp / {} coins for {} (level {}, +{} levels)",
        xp,
        coins,
        user_id,
        summary.level,
        levels_gained
    );

    Ok(Deposit {
        summary,
        levels_gained,
    })
}

/// Flat coin grant that does not touch XP or level
pub(crate) async fn grant_coins_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    coins: i64,
    now: DateTime<Utc>,
) -> Result<RewardSummary> {
    let mut summary = summary_in(conn, user_id, now).await?;
    summary.coins += coins;
    summary.updated_at = now;

    store_summary(conn, &summary).await?;

    tracing::debug!("Granted {} coins to {}", coins, user_id);
    Ok(summary)
}

pub(crate) async fn award_badge_in(
    conn: &mut SqliteConnection,
    user_id: &str,
    badge: &BadgeSpec,
    now: DateTime<Utc>,
) -> Result<bool> {
    let id = Uuid::new_v4().to_string();

    // The unique (user_id, key) pair makes a repeat award a no-op
    let rows = sqlx::query(
        r#"
        INSERT INTO badges (id, user_id, key, title, description, earned_at)
        VALUES (?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, key) DO NOTHING
        "#,
    )
    .bind(&id)
    .bind(user_id)
    .bind(badge.key)
    .bind(badge.title)
    .bind(badge.description)
    .bind(now)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    Ok(rows == 1)
}
