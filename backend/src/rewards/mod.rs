//! Reward engine
//!
//! Services publish a `DomainEvent` after a state transition. The
//! `EventDispatcher` asks each registered `RewardRule` for effects, and
//! `apply_effects` writes them to the ledger, the badge registry and the
//! notification sink within the same transaction as the transition.

mod dispatcher;
mod events;
mod ledger;
mod rules;
mod settlement;

pub use dispatcher::EventDispatcher;
pub use events::{DomainEvent, RewardEffect};
pub use ledger::{settle_level, Deposit};
pub use rules::{
    DailyTaskBadges, FocusSessionReward, RewardRule, TaskCompletionNotice, TaskCompletionReward,
};
pub use settlement::{apply_effects, Settlement};
