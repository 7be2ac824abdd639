use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::rules::RuleSet;

/// One append-only rule revision.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleChange {
    pub effective: NaiveDate,
    pub rules: RuleSet,
}

/// Time-versioned scoring-rule store. Entries are never mutated or removed,
/// so historical rounds can be re-scored under the rules active at the time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RuleHistory {
    entries: Vec<RuleChange>,
}

impl RuleHistory {
    pub fn new(mut entries: Vec<RuleChange>) -> Self {
        entries.sort_by_key(|entry| entry.effective);
        Self { entries }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[RuleChange] {
        &self.entries
    }

    /// Rules in effect on `date`: the latest entry effective at or before
    /// it, or the earliest entry when the date predates all history. With no
    /// date, the latest entry. An empty history yields the defaults.
    pub fn rules_for(&self, date: Option<NaiveDate>) -> RuleSet {
        let Some(last) = self.entries.last() else {
            return RuleSet::default();
        };

        match date {
            None => last.rules,
            Some(target) => self
                .entries
                .iter()
                .rev()
                .find(|entry| entry.effective <= target)
                .unwrap_or(&self.entries[0])
                .rules,
        }
    }

    /// Appends a revision. The effective date is supplied by the caller so
    /// the core stays free of ambient clock reads.
    pub fn record_change(&mut self, rules: RuleSet, effective: NaiveDate) {
        let at = self
            .entries
            .partition_point(|entry| entry.effective <= effective);
        self.entries.insert(at, RuleChange { effective, rules });
    }
}
