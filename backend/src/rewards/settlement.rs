//! Applies reward effects inside the caller's unit of work.

use super::events::RewardEffect;
use crate::config::BadgeSpec;
use crate::database::repository::{
    award_badge_in, deposit_in, grant_coins_in, insert_notification, summary_in,
};
use crate::database::{NewNotification, NotificationType, RewardSummary};
use crate::error::Result;
use chrono::{DateTime, Utc};
use sqlx::SqliteConnection;

/// What applying a batch of effects changed
#[derive(Debug, Clone)]
pub struct Settlement {
    pub summary: RewardSummary,
    pub xp_awarded: i64,
    /// Coins from deposits and badge bonuses, level bonuses excluded
    pub coins_awarded: i64,
    pub levels_gained: i64,
    /// Badges issued for the first time by this batch
    pub badges_awarded: Vec<BadgeSpec>,
}

pub async fn apply_effects(
    conn: &mut SqliteConnection,
    user_id: &str,
    effects: &[RewardEffect],
    now: DateTime<Utc>,
) -> Result<Settlement> {
    let mut settlement = Settlement {
        summary: summary_in(conn, user_id, now).await?,
        xp_awarded: 0,
        coins_awarded: 0,
        levels_gained: 0,
        badges_awarded: Vec::new(),
    };

    for effect in effects {
        match effect {
            RewardEffect::Deposit { xp, coins } => {
                let deposit = deposit_in(conn, user_id, *xp, *coins, now).await?;
                settlement.xp_awarded += xp;
                settlement.coins_awarded += coins;

                // One notice per deposit, naming the final level
                if deposit.levels_gained > 0 {
                    settlement.levels_gained += deposit.levels_gained;
                    let level = deposit.summary.level;
                    tracing::info!("User {} reached level {}", user_id, level);

                    let notice = NewNotification {
                        kind: NotificationType::LevelUp,
                        title: "Level up!".to_string(),
                        message: format!("You reached level {}!", level),
                        related_task_id: None,
                        related_reminder_id: None,
                    };
                    insert_notification(conn, user_id, &notice, now).await?;
                }
                settlement.summary = deposit.summary;
            }
            RewardEffect::AwardBadge {
                badge,
                bonus_coins,
                notice,
            } => {
                // Already held: no bonus, no notice
                if !award_badge_in(conn, user_id, badge, now).await? {
                    continue;
                }
                tracing::info!("User {} earned badge {}", user_id, badge.key);
                settlement.badges_awarded.push(*badge);

                if *bonus_coins > 0 {
                    settlement.summary = grant_coins_in(conn, user_id, *bonus_coins, now).await?;
                    settlement.coins_awarded += bonus_coins;
                }

                let notice = NewNotification {
                    kind: *notice,
                    title: format!("Badge earned: {}", badge.title),
                    message: badge.description.to_string(),
                    related_task_id: None,
                    related_reminder_id: None,
                };
                insert_notification(conn, user_id, &notice, now).await?;
            }
            RewardEffect::Notify {
                kind,
                title,
                message,
                related_task_id,
            } => {
                let notice = NewNotification {
                    kind: *kind,
                    title: title.clone(),
                    message: message.clone(),
                    related_task_id: related_task_id.clone(),
                    related_reminder_id: None,
                };
                insert_notification(conn, user_id, &notice, now).await?;
            }
        }
    }

    Ok(settlement)
}
