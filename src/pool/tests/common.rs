use std::sync::Arc;

use chrono::NaiveDate;
use serde_json::json;

use crate::pool::repository::{collections, DocumentStore, LEDGER_DOC, SCORING_RULES_DOC};
use crate::pool::{
    CashEntry, Fixture, LedgerConfig, Member, MemberId, MemoryStore, Pick, PoolService,
    Prediction, Round, RoundId, RuleSet,
};

pub(super) fn member(id: u32, name: &str) -> Member {
    Member {
        id: MemberId(id),
        name: name.to_string(),
        nickname: None,
    }
}

pub(super) fn roster() -> Vec<Member> {
    vec![
        member(1, "Alvaro"),
        member(2, "Carlos"),
        member(3, "Edu"),
        member(4, "Marcelo"),
    ]
}

/// Builds a round from a comma-separated list of 15 result cells. Empty
/// cells stay pending.
pub(super) fn round(id: &str, number: u32, date: &str, results: &str) -> Round {
    let matches = results
        .split(',')
        .enumerate()
        .map(|(index, result)| Fixture {
            home: format!("Home {}", index + 1),
            away: format!("Away {}", index + 1),
            result: result.trim().to_string(),
        })
        .collect();

    Round {
        id: RoundId(id.to_string()),
        number,
        date: date.to_string(),
        matches,
        active: true,
        min_hits_to_win: 10,
        prizes: Default::default(),
    }
}

pub(super) fn with_prizes(mut round: Round, table: serde_json::Value) -> Round {
    round.prizes = serde_json::from_value(table).expect("prize table fixture");
    round
}

/// A 14-character sign string plus a Pleno cell. `.` leaves a slot empty.
pub(super) fn column(signs: &str, pleno: &str) -> Vec<Option<Pick>> {
    let mut selection: Vec<Option<Pick>> = signs
        .chars()
        .map(|sign| {
            if sign == '.' {
                None
            } else {
                Some(Pick::new(sign.to_string()))
            }
        })
        .collect();
    selection.push(if pleno.is_empty() {
        None
    } else {
        Some(Pick::new(pleno))
    });
    selection
}

/// Full 15-slot selection from explicit cells, for reduced forms. Empty
/// cells stay unset.
pub(super) fn picks(cells: [&str; 15]) -> Vec<Option<Pick>> {
    cells
        .iter()
        .map(|cell| {
            if cell.is_empty() {
                None
            } else {
                Some(Pick::new(*cell))
            }
        })
        .collect()
}

pub(super) fn prediction(round: &Round, member_id: u32, signs: &str, pleno: &str) -> Prediction {
    let member_id = MemberId(member_id);
    Prediction {
        id: Prediction::storage_id(&round.id, member_id),
        round_id: round.id.clone(),
        member_id,
        selection: column(signs, pleno),
        submitted_at: None,
        late: false,
        pardoned: false,
    }
}

pub(super) fn late(mut prediction: Prediction) -> Prediction {
    prediction.late = true;
    prediction
}

/// Round 1: every regular fixture ends "1", Pleno "2-0".
/// Alvaro sweeps, Carlos reaches the 11-hit tier, Edu blanks, Marcelo
/// scrapes 3 hits.
pub(super) fn round_one() -> Round {
    with_prizes(
        round("j1", 1, "24/08/2025", "1,1,1,1,1,1,1,1,1,1,1,1,1,1,2-0"),
        json!({ "15": "20,00 €", "11": 2.0 }),
    )
}

/// Round 2: every regular fixture ends "2", Pleno "0-2". Carlos sweeps,
/// Edu never hands a column in.
pub(super) fn round_two() -> Round {
    with_prizes(
        round("j2", 2, "31/08/2025", "2,2,2,2,2,2,2,2,2,2,2,2,2,2,0-2"),
        json!({ "15": 30.0, "11": 3.0 }),
    )
}

pub(super) fn sample_rounds() -> Vec<Round> {
    vec![round_one(), round_two()]
}

pub(super) fn sample_predictions() -> Vec<Prediction> {
    let one = round_one();
    let two = round_two();
    vec![
        prediction(&one, 1, "11111111111111", "2-0"),
        prediction(&one, 2, "1111111111XXXX", "1"),
        prediction(&one, 3, "XXXXXXXXXXXXXX", "X"),
        prediction(&one, 4, "11122222222222", "0-1"),
        prediction(&two, 1, "XXXXXXXXXXXXXX", "X"),
        prediction(&two, 2, "22222222222222", "0-2"),
        prediction(&two, 4, "22222222221111", "2"),
    ]
}

pub(super) fn ledger_config() -> LedgerConfig {
    LedgerConfig {
        column_cost: 0.75,
        doubles_cost: 12.0,
        weekly_due: 1.0,
        initial_fund: 100.0,
    }
}

pub(super) fn cash_entries() -> Vec<CashEntry> {
    vec![CashEntry {
        id: "ing-1".to_string(),
        member_id: MemberId(2),
        date: NaiveDate::from_ymd_opt(2025, 8, 30).expect("valid date"),
        amount: 20.0,
    }]
}

pub(super) fn save_json<T: serde::Serialize>(
    store: &dyn DocumentStore,
    collection: &str,
    record: &T,
) {
    let document = serde_json::to_value(record).expect("fixture serializes");
    store.save(collection, document).expect("fixture saves");
}

/// A store preloaded with the two-round sample season, its config
/// documents, and one manual cash entry.
pub(super) fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::default());

    for member in roster() {
        save_json(store.as_ref(), collections::MEMBERS, &member);
    }
    for round in sample_rounds() {
        save_json(store.as_ref(), collections::ROUNDS, &round);
    }
    for prediction in sample_predictions() {
        save_json(store.as_ref(), collections::PREDICTIONS, &prediction);
    }
    for entry in cash_entries() {
        save_json(store.as_ref(), collections::CASH_ENTRIES, &entry);
    }

    let mut ledger_doc = serde_json::to_value(ledger_config()).expect("config serializes");
    ledger_doc["id"] = json!(LEDGER_DOC);
    store
        .save(collections::CONFIG, ledger_doc)
        .expect("config saves");

    let rules_doc = json!({
        "id": SCORING_RULES_DOC,
        "entries": [{ "effective": "2025-08-01", "rules": RuleSet::default() }],
    });
    store
        .save(collections::CONFIG, rules_doc)
        .expect("config saves");

    store
}

pub(super) fn build_service() -> (PoolService<MemoryStore>, Arc<MemoryStore>) {
    let store = seeded_store();
    (PoolService::new(store.clone()), store)
}
