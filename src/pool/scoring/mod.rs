mod history;
mod rules;

pub use history::{RuleChange, RuleHistory};
pub use rules::RuleSet;

use serde::Serialize;

use super::domain::{OfficialResult, Pick, SlotKind, SLOTS};

/// Sentinel hit count for a member with no submission on record.
pub const NOT_SUBMITTED: i32 = -1;

/// Result of scoring one selection against one round's official results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Evaluation {
    pub hits: i32,
    pub points: i32,
    pub bonus: i32,
}

impl Evaluation {
    pub fn not_submitted() -> Self {
        Self {
            hits: NOT_SUBMITTED,
            points: 0,
            bonus: 0,
        }
    }

    pub fn was_submitted(&self) -> bool {
        self.hits >= 0
    }
}

/// Counts correctly predicted slots. Regular slots hit when the pick's sign
/// combination contains the normalized official sign; the Pleno hits on an
/// exact literal match or a plain-sign match. Slots with pending results are
/// skipped entirely.
pub fn count_hits(selection: &[Option<Pick>], results: &[Option<OfficialResult>]) -> i32 {
    let mut hits = 0;

    let limit = SLOTS.min(selection.len()).min(results.len());
    for index in 0..limit {
        let (Some(pick), Some(official)) = (&selection[index], &results[index]) else {
            continue;
        };

        let hit = match SlotKind::of(index) {
            SlotKind::Regular => pick.covers(official),
            SlotKind::Pleno => pick.matches_pleno(official),
        };
        if hit {
            hits += 1;
        }
    }

    hits
}

/// Scores a selection under a rule set: `points = hits + adjustment(hits)`,
/// `bonus = points - hits`. Pure over its inputs.
pub fn evaluate(
    selection: &[Option<Pick>],
    results: &[Option<OfficialResult>],
    rules: &RuleSet,
) -> Evaluation {
    let hits = count_hits(selection, results);
    let points = rules.score(hits);

    Evaluation {
        hits,
        points,
        bonus: points - hits,
    }
}
