//! Weekly discipline check
//!
//! Awards the discipline badge to users with no impulsive purchases in the
//! trailing week. Runs on demand (profile fetch, sweep binary); nothing
//! schedules it internally.

use crate::clock::{day_bounds, Clock};
use crate::config::{BADGE_DISCIPLINE, DISCIPLINE_BONUS_COINS, DISCIPLINE_WINDOW_DAYS};
use crate::database::repository::impulsive_expense_since;
use crate::database::{NotificationType, Repository};
use crate::error::Result;
use crate::rewards::{apply_effects, RewardEffect};
use chrono::Duration;
use std::sync::Arc;

#[derive(Clone)]
pub struct DisciplineService {
    repo: Repository,
    clock: Arc<dyn Clock>,
}

impl DisciplineService {
    pub fn new(repo: Repository, clock: Arc<dyn Clock>) -> Self {
        Self { repo, clock }
    }

    /// Idempotent. Skipped when the badge was already earned today; the bonus
    /// coins are only paid when the badge is issued for the first time.
    pub async fn check_weekly_discipline(&self, user_id: &str) -> Result<()> {
        let now = self.clock.now();
        let (day_start, day_end) = day_bounds(now.date_naive());

        if self
            .repo
            .badge_earned_between(user_id, BADGE_DISCIPLINE.key, day_start, day_end)
            .await?
        {
            tracing::debug!("Discipline already evaluated today for {}", user_id);
            return Ok(());
        }

        // Look back over the trailing week
        let since = now - Duration::days(DISCIPLINE_WINDOW_DAYS);
        let mut tx = self.repo.begin().await?;

        if impulsive_expense_since(&mut tx, user_id, since).await? {
            tracing::debug!("Impulsive purchase in the last week for {}", user_id);
            return Ok(());
        }

        let effect = RewardEffect::AwardBadge {
            badge: BADGE_DISCIPLINE,
            bonus_coins: DISCIPLINE_BONUS_COINS,
            notice: NotificationType::WeeklyDiscipline,
        };
        let settlement = apply_effects(&mut tx, user_id, &[effect], now).await?;
        tx.commit().await?;

        if !settlement.badges_awarded.is_empty() {
            tracing::info!("Weekly discipline badge awarded to {}", user_id);
        }
        Ok(())
    }
}
