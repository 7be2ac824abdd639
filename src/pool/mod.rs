//! Scoring and outcome-resolution core of the prediction pool, plus the
//! service facade and HTTP surface wrapping it. Everything below `service`
//! is pure computation over an immutable snapshot of the document store.

pub mod domain;
pub mod eligibility;
pub mod ledger;
pub mod outcome;
pub mod prizes;
pub mod repository;
pub mod router;
pub mod scoring;
pub mod season;
pub mod service;

#[cfg(test)]
mod tests;

pub use domain::{
    parse_round_date, validate_reduction, Fixture, Member, MemberId, OfficialResult, Pick,
    Prediction, ReductionError, Round, RoundId, Sign, SlotKind, REGULAR_SLOTS, SLOTS,
};
pub use eligibility::{doubles_eligibility, Eligibility, EligibilityReason};
pub use ledger::{CashEntry, LedgerConfig, LedgerLine, LedgerReport};
pub use outcome::{MemberRoundScore, PointsHistory, PrizeAward, RoundOutcome, TieGoal};
pub use prizes::{parse_money, PrizeTable, PrizeValue, SeasonPrizeSummary};
pub use repository::{DocumentStore, MemoryStore, Snapshot, StoreError};
pub use router::pool_router;
pub use scoring::{Evaluation, RuleChange, RuleHistory, RuleSet};
pub use season::{MemberSeasonTotal, RoundStanding, SeasonSummary};
pub use service::{PoolService, PoolServiceError, PredictionSubmission};
