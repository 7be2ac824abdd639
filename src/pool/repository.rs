use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::de::DeserializeOwned;
use serde_json::Value;

use super::domain::{Member, Prediction, Round};
use super::ledger::{CashEntry, LedgerConfig};
use super::scoring::{RuleChange, RuleHistory};

/// Collection names as the backing store knows them.
pub mod collections {
    pub const MEMBERS: &str = "members";
    pub const ROUNDS: &str = "jornadas";
    pub const PREDICTIONS: &str = "pronosticos";
    pub const DOUBLES: &str = "pronosticos_extra";
    pub const CONFIG: &str = "config";
    pub const CASH_ENTRIES: &str = "ingresos";
}

/// Document ids inside the config collection.
pub const SCORING_RULES_DOC: &str = "scoring_rules";
pub const LEDGER_DOC: &str = "ledger";

/// Error enumeration for store failures. The core surfaces these to the
/// caller without retrying.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("record in '{collection}' is missing an id")]
    MissingId { collection: String },
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed document in '{collection}': {source}")]
    Malformed {
        collection: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Generic document-store interface consumed from the environment. No
/// filtering server-side; the core filters in memory over wholesale reads.
pub trait DocumentStore: Send + Sync {
    fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError>;
    /// Upsert keyed by the record's `id` field.
    fn save(&self, collection: &str, record: Value) -> Result<(), StoreError>;
    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError>;
}

/// In-memory reference store used by the demo command and the test suites.
#[derive(Debug, Default)]
pub struct MemoryStore {
    collections: Mutex<BTreeMap<String, BTreeMap<String, Value>>>,
}

fn record_id(collection: &str, record: &Value) -> Result<String, StoreError> {
    match record.get("id") {
        Some(Value::String(id)) if !id.is_empty() => Ok(id.clone()),
        Some(Value::Number(id)) => Ok(id.to_string()),
        _ => Err(StoreError::MissingId {
            collection: collection.to_string(),
        }),
    }
}

impl DocumentStore for MemoryStore {
    fn get_all(&self, collection: &str) -> Result<Vec<Value>, StoreError> {
        let guard = self.collections.lock().expect("store mutex poisoned");
        Ok(guard
            .get(collection)
            .map(|records| records.values().cloned().collect())
            .unwrap_or_default())
    }

    fn save(&self, collection: &str, record: Value) -> Result<(), StoreError> {
        let id = record_id(collection, &record)?;
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        guard
            .entry(collection.to_string())
            .or_default()
            .insert(id, record);
        Ok(())
    }

    fn delete(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let mut guard = self.collections.lock().expect("store mutex poisoned");
        if let Some(records) = guard.get_mut(collection) {
            records.remove(id);
        }
        Ok(())
    }
}

/// Immutable in-memory view of every collection, fetched wholesale before
/// any calculation starts. Computations fold over this snapshot; a store
/// mutated mid-flight is only observed after the next explicit load.
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub members: Vec<Member>,
    pub rounds: Vec<Round>,
    pub predictions: Vec<Prediction>,
    pub doubles: Vec<Prediction>,
    pub rule_history: RuleHistory,
    pub ledger_config: LedgerConfig,
    pub cash_entries: Vec<CashEntry>,
}

impl Snapshot {
    pub fn load(store: &dyn DocumentStore) -> Result<Self, StoreError> {
        let members = decode_all(store, collections::MEMBERS)?;
        let rounds = decode_all(store, collections::ROUNDS)?;
        let predictions = decode_all(store, collections::PREDICTIONS)?;
        let doubles = decode_all(store, collections::DOUBLES)?;
        let cash_entries = decode_all(store, collections::CASH_ENTRIES)?;

        let mut rule_history = RuleHistory::default();
        let mut ledger_config = LedgerConfig::default();
        for document in store.get_all(collections::CONFIG)? {
            match document.get("id").and_then(Value::as_str) {
                Some(SCORING_RULES_DOC) => {
                    if let Some(entries_value) = document.get("entries") {
                        let entries: Vec<RuleChange> =
                            decode_field(collections::CONFIG, entries_value.clone())?;
                        rule_history = RuleHistory::new(entries);
                    }
                }
                Some(LEDGER_DOC) => {
                    ledger_config = decode_field(collections::CONFIG, document)?;
                }
                _ => {}
            }
        }

        Ok(Self {
            members,
            rounds,
            predictions,
            doubles,
            rule_history,
            ledger_config,
            cash_entries,
        })
    }

    pub fn round_by_number(&self, number: u32) -> Option<&Round> {
        self.rounds.iter().find(|round| round.number == number)
    }

    pub fn member(&self, id: super::domain::MemberId) -> Option<&Member> {
        self.members.iter().find(|member| member.id == id)
    }
}

fn decode_all<T: DeserializeOwned>(
    store: &dyn DocumentStore,
    collection: &str,
) -> Result<Vec<T>, StoreError> {
    store
        .get_all(collection)?
        .into_iter()
        .map(|document| {
            serde_json::from_value(document).map_err(|source| StoreError::Malformed {
                collection: collection.to_string(),
                source,
            })
        })
        .collect()
}

fn decode_field<T: DeserializeOwned>(collection: &str, value: Value) -> Result<T, StoreError> {
    serde_json::from_value(value).map_err(|source| StoreError::Malformed {
        collection: collection.to_string(),
        source,
    })
}
