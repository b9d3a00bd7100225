//! Reward rules
//!
//! Each rule looks at one event and answers with the effects it wants
//! applied. Rules never touch storage, so they can be tested on their own.

use super::events::{DomainEvent, RewardEffect};
use crate::config::{
    BADGE_PRODUCTIVE_BUNNY, BADGE_TASK_MASTER, FOCUS_MINUTES_PER_COIN, PRODUCTIVE_DAY_TASKS,
    TASK_COMPLETION_COINS, TASK_COMPLETION_XP, TASK_MASTER_DAY_TASKS,
};
use crate::database::NotificationType;

pub trait RewardRule: Send + Sync {
    fn name(&self) -> &'static str;

    fn evaluate(&self, event: &DomainEvent) -> Vec<RewardEffect>;
}

/// 50 XP and 10 coins per completed task
pub struct TaskCompletionReward;

impl RewardRule for TaskCompletionReward {
    fn name(&self) -> &'static str {
        "task_completion_reward"
    }

    fn evaluate(&self, event: &DomainEvent) -> Vec<RewardEffect> {
        match event {
            DomainEvent::TaskCompleted { .. } => vec![RewardEffect::Deposit {
                xp: TASK_COMPLETION_XP,
                coins: TASK_COMPLETION_COINS,
            }],
            _ => Vec::new(),
        }
    }
}

/// Task Master at three completions in a day, otherwise Productive Bunny at two
pub struct DailyTaskBadges;

impl RewardRule for DailyTaskBadges {
    fn name(&self) -> &'static str {
        "daily_task_badges"
    }

    fn evaluate(&self, event: &DomainEvent) -> Vec<RewardEffect> {
        let DomainEvent::TaskCompleted {
            completed_today, ..
        } = event
        else {
            return Vec::new();
        };

        let badge = if *completed_today >= TASK_MASTER_DAY_TASKS {
            BADGE_TASK_MASTER
        } else if *completed_today >= PRODUCTIVE_DAY_TASKS {
            BADGE_PRODUCTIVE_BUNNY
        } else {
            return Vec::new();
        };

        vec![RewardEffect::AwardBadge {
            badge,
            bonus_coins: 0,
            notice: NotificationType::BadgeEarned,
        }]
    }
}

pub struct TaskCompletionNotice;

impl RewardRule for TaskCompletionNotice {
    fn name(&self) -> &'static str {
        "task_completion_notice"
    }

    fn evaluate(&self, event: &DomainEvent) -> Vec<RewardEffect> {
        match event {
            DomainEvent::TaskCompleted { task_id, title, .. } => vec![RewardEffect::Notify {
                kind: NotificationType::TaskComplete,
                title: "Task completed".to_string(),
                message: format!(
                    "Great job! You've completed '{}'. +{} XP and +{} coins!",
                    title, TASK_COMPLETION_XP, TASK_COMPLETION_COINS
                ),
                related_task_id: Some(task_id.clone()),
            }],
            _ => Vec::new(),
        }
    }
}

/// One XP per focused minute, one coin per ten
pub struct FocusSessionReward;

impl RewardRule for FocusSessionReward {
    fn name(&self) -> &'static str {
        "focus_session_reward"
    }

    fn evaluate(&self, event: &DomainEvent) -> Vec<RewardEffect> {
        match event {
            DomainEvent::FocusSessionCompleted {
                effective_minutes, ..
            } if *effective_minutes > 0 => vec![RewardEffect::Deposit {
                xp: *effective_minutes,
                coins: effective_minutes / FOCUS_MINUTES_PER_COIN,
            }],
            _ => Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn completed(count: i64) -> DomainEvent {
        DomainEvent::TaskCompleted {
            user_id: "u".to_string(),
            task_id: "t".to_string(),
            title: "Feed the bunny".to_string(),
            completed_today: count,
        }
    }

    fn session(minutes: i64) -> DomainEvent {
        DomainEvent::FocusSessionCompleted {
            user_id: "u".to_string(),
            session_id: "s".to_string(),
            effective_minutes: minutes,
        }
    }

    fn badge_key(effects: &[RewardEffect]) -> Option<&'static str> {
        effects.iter().find_map(|e| match e {
            RewardEffect::AwardBadge { badge, .. } => Some(badge.key),
            _ => None,
        })
    }

    #[test]
    fn test_task_completion_deposit() {
        assert_eq!(
            TaskCompletionReward.evaluate(&completed(1)),
            vec![RewardEffect::Deposit { xp: 50, coins: 10 }]
        );
        assert!(TaskCompletionReward.evaluate(&session(30)).is_empty());
    }

    #[test]
    fn test_daily_badges_use_higher_tier_only() {
        assert_eq!(badge_key(&DailyTaskBadges.evaluate(&completed(1))), None);
        assert_eq!(
            badge_key(&DailyTaskBadges.evaluate(&completed(2))),
            Some("daily_2_tasks")
        );
        assert_eq!(
            badge_key(&DailyTaskBadges.evaluate(&completed(3))),
            Some("daily_3_tasks")
        );
        assert_eq!(DailyTaskBadges.evaluate(&completed(5)).len(), 1);
    }

    #[test]
    fn test_completion_notice_names_task() {
        let effects = TaskCompletionNotice.evaluate(&completed(1));
        match &effects[..] {
            [RewardEffect::Notify {
                kind,
                message,
                related_task_id,
                ..
            }] => {
                assert_eq!(*kind, NotificationType::TaskComplete);
                assert_eq!(
                    message,
                    "Great job! You've completed 'Feed the bunny'. +50 XP and +10 coins!"
                );
                assert_eq!(related_task_id.as_deref(), Some("t"));
            }
            other => panic!("unexpected effects: {:?}", other),
        }
    }

    #[test]
    fn test_focus_reward_floors_coins() {
        assert_eq!(
            FocusSessionReward.evaluate(&session(42)),
            vec![RewardEffect::Deposit { xp: 42, coins: 4 }]
        );
        assert_eq!(
            FocusSessionReward.evaluate(&session(9)),
            vec![RewardEffect::Deposit { xp: 9, coins: 0 }]
        );
        assert!(FocusSessionReward.evaluate(&session(0)).is_empty());
    }
}
