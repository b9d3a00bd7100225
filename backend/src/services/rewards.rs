//! Rewards service
//!
//! Read side of the reward ledger and badge registry.

use super::DisciplineService;
use crate::clock::Clock;
use crate::database::{Badge, Repository};
use crate::error::Result;
use serde::Serialize;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewardProfile {
    pub level: i64,
    pub xp: i64,
    pub coins: i64,
    pub badge_count: i64,
}

#[derive(Clone)]
pub struct RewardService {
    repo: Repository,
    discipline: DisciplineService,
    clock: Arc<dyn Clock>,
}

impl RewardService {
    pub fn new(repo: Repository, discipline: DisciplineService, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo,
            discipline,
            clock,
        }
    }

    /// Level, XP, coins and badge count. Runs the weekly discipline check first.
    pub async fn profile(&self, user_id: &str) -> Result<RewardProfile> {
        self.discipline.check_weekly_discipline(user_id).await?;

        let summary = self.repo.reward_summary(user_id, self.clock.now()).await?;
        let badge_count = self.repo.count_badges(user_id).await?;

        Ok(RewardProfile {
            level: summary.level,
            xp: summary.xp,
            coins: summary.coins,
            badge_count,
        })
    }

    /// Badges, most recently earned first
    pub async fn list_badges(&self, user_id: &str) -> Result<Vec<Badge>> {
        self.repo.list_owned(user_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::database::repository::test_support::*;

    #[tokio::test]
    async fn test_profile_triggers_discipline_check() {
        let repo = create_test_repo().await;
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(t0()));
        let service = RewardService::new(
            repo.clone(),
            DisciplineService::new(repo.clone(), clock.clone()),
            clock,
        );
        let user = create_test_user(&repo, "bun").await;

        let profile = service.profile(&user.id).await.unwrap();
        assert_eq!(
            profile,
            RewardProfile {
                level: 1,
                xp: 0,
                coins: 100,
                badge_count: 1
            }
        );

        // Second fetch the same day changes nothing
        assert_eq!(service.profile(&user.id).await.unwrap(), profile);

        let badges = service.list_badges(&user.id).await.unwrap();
        assert_eq!(badges[0].key, "no_impulsive_week");
    }
}
