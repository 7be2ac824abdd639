use serde::{Deserialize, Serialize};

/// Scoring configuration: additive modifiers layered on the raw hit count.
/// Bonuses reward 10+ hits, penalties punish 3 or fewer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub bonus15: i32,
    pub bonus14: i32,
    pub bonus13: i32,
    pub bonus12: i32,
    pub bonus11: i32,
    pub bonus10: i32,
    pub penalty3: i32,
    pub penalty2: i32,
    pub penalty1: i32,
    pub penalty0: i32,
}

impl Default for RuleSet {
    fn default() -> Self {
        Self {
            bonus15: 30,
            bonus14: 30,
            bonus13: 15,
            bonus12: 10,
            bonus11: 5,
            bonus10: 3,
            penalty3: -1,
            penalty2: -2,
            penalty1: -3,
            penalty0: -5,
        }
    }
}

impl RuleSet {
    /// Table lookup for the bonus/penalty tier. Hit counts outside the
    /// defined tiers contribute nothing.
    pub fn adjustment(&self, hits: i32) -> i32 {
        match hits {
            h if h >= 15 => self.bonus15,
            14 => self.bonus14,
            13 => self.bonus13,
            12 => self.bonus12,
            11 => self.bonus11,
            10 => self.bonus10,
            3 => self.penalty3,
            2 => self.penalty2,
            1 => self.penalty1,
            0 => self.penalty0,
            _ => 0,
        }
    }

    /// Points for a hit count. A negative count is the "not submitted"
    /// sentinel and short-circuits to zero without consulting the table.
    pub fn score(&self, hits: i32) -> i32 {
        if hits < 0 {
            return 0;
        }
        hits + self.adjustment(hits)
    }
}
