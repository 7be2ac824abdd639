use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use serde::Deserialize;

use super::domain::{validate_reduction, MemberId, Pick, Prediction, ReductionError};
use super::eligibility::{self, Eligibility};
use super::ledger::{self, LedgerReport};
use super::outcome::{self, RoundOutcome};
use super::prizes::{self, SeasonPrizeSummary};
use super::repository::{
    collections, DocumentStore, Snapshot, StoreError, SCORING_RULES_DOC,
};
use super::scoring::{RuleHistory, RuleSet};
use super::season::{self, SeasonSummary};

/// Error raised by the pool service facade.
#[derive(Debug, thiserror::Error)]
pub enum PoolServiceError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Reduction(#[from] ReductionError),
    #[error("member {member} is not eligible for the doubles form of round {round}")]
    NotEligible { round: u32, member: MemberId },
    #[error("round {0} is not on the calendar")]
    UnknownRound(u32),
    #[error("member {0} is not on the roster")]
    UnknownMember(MemberId),
    #[error("no prediction on record for member {member} in round {round}")]
    MissingPrediction { round: u32, member: MemberId },
    #[error("round {0} has no submissions to rank")]
    NoSubmissions(u32),
    #[error("ledger export failed: {0}")]
    Export(#[from] csv::Error),
}

/// Inbound prediction payload; the service derives the storage id.
#[derive(Debug, Clone, Deserialize)]
pub struct PredictionSubmission {
    pub member_id: MemberId,
    pub selection: Vec<Option<Pick>>,
    #[serde(default)]
    pub late: bool,
    #[serde(default)]
    pub submitted_at: Option<NaiveDateTime>,
}

/// Facade composing the document store with the scoring, outcome,
/// eligibility, prize, season, and ledger calculators. Every read loads a
/// fresh snapshot; every derived figure is recomputed from it.
pub struct PoolService<S> {
    store: Arc<S>,
}

impl<S: DocumentStore> PoolService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub fn snapshot(&self) -> Result<Snapshot, PoolServiceError> {
        Ok(Snapshot::load(self.store.as_ref())?)
    }

    pub fn season_summary(&self) -> Result<SeasonSummary, PoolServiceError> {
        let snapshot = self.snapshot()?;
        Ok(season::accumulate(
            &snapshot.members,
            &snapshot.rounds,
            &snapshot.predictions,
            &snapshot.rule_history,
        ))
    }

    pub fn season_prizes(&self) -> Result<SeasonPrizeSummary, PoolServiceError> {
        let snapshot = self.snapshot()?;
        Ok(prizes::season_prize_total(
            &snapshot.rounds,
            &snapshot.predictions,
            &snapshot.doubles,
        ))
    }

    /// Winner/loser/prize resolution for one round, tie-breaking against
    /// the accumulated history of the rounds played before it.
    pub fn round_outcome(&self, round_number: u32) -> Result<RoundOutcome, PoolServiceError> {
        let snapshot = self.snapshot()?;
        let round = snapshot
            .round_by_number(round_number)
            .ok_or(PoolServiceError::UnknownRound(round_number))?;

        let prior_rounds: Vec<_> = snapshot
            .rounds
            .iter()
            .filter(|candidate| candidate.number < round_number)
            .cloned()
            .collect();
        let history = season::accumulate(
            &snapshot.members,
            &prior_rounds,
            &snapshot.predictions,
            &snapshot.rule_history,
        )
        .history;

        let rules = snapshot.rule_history.rules_for(round.date());
        let scores = season::score_round(round, &snapshot.members, &snapshot.predictions, &rules);

        outcome::resolve(round, &scores, &history, &snapshot.members)
            .ok_or(PoolServiceError::NoSubmissions(round_number))
    }

    pub fn doubles_eligibility(
        &self,
        round_number: u32,
        member_id: MemberId,
    ) -> Result<Eligibility, PoolServiceError> {
        let snapshot = self.snapshot()?;
        snapshot
            .member(member_id)
            .ok_or(PoolServiceError::UnknownMember(member_id))?;

        Ok(eligibility::doubles_eligibility(
            round_number,
            member_id,
            &snapshot.members,
            &snapshot.rounds,
            &snapshot.predictions,
            &snapshot.rule_history,
        ))
    }

    /// Upserts a member's main column for a round.
    pub fn submit_prediction(
        &self,
        round_number: u32,
        submission: PredictionSubmission,
    ) -> Result<Prediction, PoolServiceError> {
        let snapshot = self.snapshot()?;
        let round = snapshot
            .round_by_number(round_number)
            .ok_or(PoolServiceError::UnknownRound(round_number))?;
        snapshot
            .member(submission.member_id)
            .ok_or(PoolServiceError::UnknownMember(submission.member_id))?;

        let prediction = Prediction {
            id: Prediction::storage_id(&round.id, submission.member_id),
            round_id: round.id.clone(),
            member_id: submission.member_id,
            selection: submission.selection,
            submitted_at: submission.submitted_at,
            late: submission.late,
            pardoned: false,
        };

        self.persist(collections::PREDICTIONS, &prediction)?;
        Ok(prediction)
    }

    /// Upserts a secondary/doubles column. The reduction shape is the one
    /// hard precondition enforced before persisting; eligibility is derived
    /// from the previous round's outcome.
    pub fn submit_doubles(
        &self,
        round_number: u32,
        submission: PredictionSubmission,
    ) -> Result<Prediction, PoolServiceError> {
        let snapshot = self.snapshot()?;
        let round = snapshot
            .round_by_number(round_number)
            .ok_or(PoolServiceError::UnknownRound(round_number))?;
        snapshot
            .member(submission.member_id)
            .ok_or(PoolServiceError::UnknownMember(submission.member_id))?;

        validate_reduction(&submission.selection)?;

        let access = eligibility::doubles_eligibility(
            round_number,
            submission.member_id,
            &snapshot.members,
            &snapshot.rounds,
            &snapshot.predictions,
            &snapshot.rule_history,
        );
        if !access.eligible {
            return Err(PoolServiceError::NotEligible {
                round: round_number,
                member: submission.member_id,
            });
        }

        let prediction = Prediction {
            id: Prediction::storage_id(&round.id, submission.member_id),
            round_id: round.id.clone(),
            member_id: submission.member_id,
            selection: submission.selection,
            submitted_at: submission.submitted_at,
            late: submission.late,
            pardoned: false,
        };

        self.persist(collections::DOUBLES, &prediction)?;
        Ok(prediction)
    }

    /// Lifts the late sanction from a stored prediction.
    pub fn pardon_prediction(
        &self,
        round_number: u32,
        member_id: MemberId,
    ) -> Result<Prediction, PoolServiceError> {
        let snapshot = self.snapshot()?;
        let round = snapshot
            .round_by_number(round_number)
            .ok_or(PoolServiceError::UnknownRound(round_number))?;

        let mut prediction = snapshot
            .predictions
            .iter()
            .find(|prediction| {
                prediction.round_id == round.id && prediction.member_id == member_id
            })
            .cloned()
            .ok_or(PoolServiceError::MissingPrediction {
                round: round_number,
                member: member_id,
            })?;

        prediction.pardoned = true;
        self.persist(collections::PREDICTIONS, &prediction)?;
        Ok(prediction)
    }

    /// Appends a scoring-rule revision effective from the given date.
    pub fn record_rule_change(
        &self,
        rules: RuleSet,
        effective: NaiveDate,
    ) -> Result<RuleHistory, PoolServiceError> {
        let snapshot = self.snapshot()?;
        let mut history = snapshot.rule_history;
        history.record_change(rules, effective);

        let document = serde_json::json!({
            "id": SCORING_RULES_DOC,
            "entries": history.entries(),
        });
        self.store.save(collections::CONFIG, document)?;
        Ok(history)
    }

    pub fn ledger(&self) -> Result<LedgerReport, PoolServiceError> {
        let snapshot = self.snapshot()?;
        Ok(ledger::compute_movements(
            &snapshot.members,
            &snapshot.rounds,
            &snapshot.predictions,
            &snapshot.cash_entries,
            &snapshot.ledger_config,
            &snapshot.rule_history,
        ))
    }

    pub fn ledger_csv(&self) -> Result<String, PoolServiceError> {
        let report = self.ledger()?;
        Ok(ledger::export_csv_string(&report)?)
    }

    fn persist(
        &self,
        collection: &str,
        prediction: &Prediction,
    ) -> Result<(), PoolServiceError> {
        let document =
            serde_json::to_value(prediction).expect("prediction serializes to json");
        self.store.save(collection, document)?;
        Ok(())
    }
}
