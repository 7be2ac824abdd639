use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::domain::{Prediction, Round};
use super::scoring;

/// Per-round mapping from hit count to prize money. Supplied externally per
/// round; tiers may legitimately be zero or missing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrizeTable(pub BTreeMap<String, PrizeValue>);

/// Store documents mix plain numbers with locale-formatted strings such as
/// "1,50 €"; both are accepted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrizeValue {
    Number(f64),
    Text(String),
}

impl PrizeValue {
    pub fn amount(&self) -> f64 {
        match self {
            PrizeValue::Number(value) => *value,
            PrizeValue::Text(text) => parse_money(text),
        }
    }
}

impl PrizeTable {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Prize for a hit count. Missing tiers, unparseable values, and
    /// non-positive amounts all resolve to zero.
    pub fn amount_for(&self, hits: i32) -> f64 {
        if hits < 0 {
            return 0.0;
        }
        let amount = self
            .0
            .get(&hits.to_string())
            .map(PrizeValue::amount)
            .unwrap_or(0.0);
        if amount > 0.0 {
            amount
        } else {
            0.0
        }
    }

    /// True when the hit count lands on a strictly positive tier.
    pub fn awards(&self, hits: i32) -> bool {
        self.amount_for(hits) > 0.0
    }
}

/// Permissive numeric coercion for locale-formatted money strings: strips a
/// trailing euro symbol, accepts a comma decimal separator, and treats
/// anything unparseable as zero.
pub fn parse_money(raw: &str) -> f64 {
    let cleaned = raw
        .trim()
        .trim_end_matches('€')
        .trim()
        .replace(',', ".");
    cleaned.parse().unwrap_or(0.0)
}

/// Season-long prize accounting across every played round, including the
/// secondary/doubles columns evaluated against the same per-round tables.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonPrizeSummary {
    pub total: f64,
    pub awards: u32,
}

pub fn season_prize_total(
    rounds: &[Round],
    predictions: &[Prediction],
    doubles: &[Prediction],
) -> SeasonPrizeSummary {
    let mut summary = SeasonPrizeSummary::default();

    for round in rounds.iter().filter(|round| round.is_played()) {
        let results = round.official_results();
        let columns = predictions
            .iter()
            .chain(doubles.iter())
            .filter(|prediction| prediction.round_id == round.id);

        for prediction in columns {
            let hits = scoring::count_hits(&prediction.selection, &results);
            let amount = round.prizes.amount_for(hits);
            if amount > 0.0 {
                summary.total += amount;
                summary.awards += 1;
            }
        }
    }

    summary
}
