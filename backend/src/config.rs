//! Application configuration constants
//!
//! Central location for the reward rules, focus-mode limits and badge
//! definitions. Deployment-specific values (database file, salary default,
//! look-back windows) live in `services::settings::AppSettings` instead.

// ===== Leveling =====

/// XP needed to gain one level. Leveling drains XP in steps of this size.
pub const XP_PER_LEVEL: i64 = 50;

/// Coin bonus per level reached: reaching level N pays `N * 100` coins.
pub const LEVEL_COIN_BONUS_PER_LEVEL: i64 = 100;

// ===== Task rewards =====

pub const TASK_COMPLETION_XP: i64 = 50;
pub const TASK_COMPLETION_COINS: i64 = 10;

/// Completions in one day needed for the "Productive Bunny" badge
pub const PRODUCTIVE_DAY_TASKS: i64 = 2;

/// Completions in one day needed for the "Task Master" badge
pub const TASK_MASTER_DAY_TASKS: i64 = 3;

// ===== Focus rewards and limits =====

/// One coin per this many effective focus minutes (floored)
pub const FOCUS_MINUTES_PER_COIN: i64 = 10;

/// Flow (hyperfocus) sessions a user may run per day
pub const FLOW_SESSIONS_MAX_DAILY: i64 = 2;

/// Mode key that marks a session as hyperfocus
pub const FLOW_MODE_KEY: &str = "flow";

/// Mode key whose sessions store a randomized task order
pub const SHUFFLE_MODE_KEY: &str = "shuffle";

/// Default pomodoro work interval when the user has no pomodoro preset (25 minutes)
pub const DEFAULT_POMODORO_WORK_SECONDS: i64 = 25 * 60;

/// Default pomodoro break interval when the user has no pomodoro preset (5 minutes)
pub const DEFAULT_POMODORO_BREAK_SECONDS: i64 = 5 * 60;

/// Suggested lengths for a mini ("hop in") session
pub const MINI_SUGGESTED_MINUTES: &[i64] = &[5, 7, 10];

pub const MINI_SESSION_PROMPT: &str = "Let's hop for 5 minutes, no pressure.";

/// Longest span accepted when logging a past session
pub const MAX_RECORDED_SESSION_HOURS: i64 = 24;

/// Number of recent sessions averaged for the adaptive length recommendation
pub const ADAPTIVE_HISTORY_LIMIT: i64 = 20;

// ===== Weekly discipline =====

/// Trailing window inspected for impulsive purchases
pub const DISCIPLINE_WINDOW_DAYS: i64 = 7;

/// Flat coin grant paid the first time the discipline badge is issued
pub const DISCIPLINE_BONUS_COINS: i64 = 100;

// ===== Badges =====

/// Static description of an achievement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BadgeSpec {
    pub key: &'static str,
    pub title: &'static str,
    pub description: &'static str,
}

pub const BADGE_PRODUCTIVE_BUNNY: BadgeSpec = BadgeSpec {
    key: "daily_2_tasks",
    title: "Productive Bunny",
    description: "Completed 2 tasks today",
};

pub const BADGE_TASK_MASTER: BadgeSpec = BadgeSpec {
    key: "daily_3_tasks",
    title: "Task Master",
    description: "Completed 3 tasks in one day",
};

pub const BADGE_DISCIPLINE: BadgeSpec = BadgeSpec {
    key: "no_impulsive_week",
    title: "Discipline Bunny",
    description: "No impulsive buys for 7 days!",
};
