//! Leveling arithmetic for the reward ledger.

use crate::config::{LEVEL_COIN_BONUS_PER_LEVEL, XP_PER_LEVEL};
use crate::database::RewardSummary;

/// Outcome of a deposit: the settled summary and how many levels it crossed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Deposit {
    pub summary: RewardSummary,
    pub levels_gained: i64,
}

/// Drain XP in steps of `XP_PER_LEVEL`. Each step raises the level by one and
/// pays `new_level * LEVEL_COIN_BONUS_PER_LEVEL` coins. Afterwards `xp < XP_PER_LEVEL`.
///
/// Returns the number of levels gained.
pub fn settle_level(summary: &mut RewardSummary) -> i64 {
    let mut gained = 0;

    while summary.xp >= XP_PER_LEVEL {
        summary.xp -= XP_PER_LEVEL;
        summary.level += 1;
        summary.coins += summary.level * LEVEL_COIN_BONUS_PER_LEVEL;
        gained += 1;
    }

    gained
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn summary(xp: i64, coins: i64, level: i64) -> RewardSummary {
        RewardSummary {
            user_id: "u".to_string(),
            xp,
            coins,
            level,
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_below_threshold_is_untouched() {
        let mut s = summary(49, 7, 1);
        assert_eq!(settle_level(&mut s), 0);
        assert_eq!((s.xp, s.coins, s.level), (49, 7, 1));
    }

    #[test]
    fn test_exact_threshold() {
        let mut s = summary(50, 0, 1);
        assert_eq!(settle_level(&mut s), 1);
        assert_eq!((s.xp, s.coins, s.level), (0, 200, 2));
    }

    #[test]
    fn test_multiple_levels_in_one_pass() {
        let mut s = summary(140, 0, 1);
        assert_eq!(settle_level(&mut s), 2);
        assert_eq!((s.xp, s.coins, s.level), (40, 500, 3));
    }

    #[test]
    fn test_levels_gained_matches_floor_division() {
        for (xp, level) in [(0, 1), (99, 4), (250, 2), (1_234, 7)] {
            let mut s = summary(xp, 0, level);
            let gained = settle_level(&mut s);

            assert_eq!(gained, xp / XP_PER_LEVEL);
            assert!((0..XP_PER_LEVEL).contains(&s.xp));
            assert_eq!(s.level, level + gained);
        }
    }
}
