//! Domain events published by services after a successful state transition,
//! and the effects reward rules answer them with.

use crate::config::BadgeSpec;
use crate::database::NotificationType;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DomainEvent {
    /// A task moved into `done` for the first time
    TaskCompleted {
        user_id: String,
        task_id: String,
        title: String,
        /// Tasks completed today, this one included
        completed_today: i64,
    },

    /// A focus session gained its `effective_minutes`
    FocusSessionCompleted {
        user_id: String,
        session_id: String,
        effective_minutes: i64,
    },
}

impl DomainEvent {
    pub fn user_id(&self) -> &str {
        match self {
            DomainEvent::TaskCompleted { user_id, .. }
            | DomainEvent::FocusSessionCompleted { user_id, .. } => user_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewardEffect {
    /// XP and coins through the ledger, leveling included
    Deposit { xp: i64, coins: i64 },

    /// Issue a badge once; `bonus_coins` are paid only on first issuance
    AwardBadge {
        badge: BadgeSpec,
        bonus_coins: i64,
        notice: NotificationType,
    },

    Notify {
        kind: NotificationType,
        title: String,
        message: String,
        related_task_id: Option<String>,
    },
}
