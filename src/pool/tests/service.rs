use super::common::*;
use crate::pool::repository::collections;
use crate::pool::{
    DocumentStore, MemberId, PoolServiceError, PredictionSubmission, ReductionError, RuleSet,
};
use chrono::NaiveDate;

#[test]
fn submit_prediction_upserts_by_round_and_member() {
    let (service, store) = build_service();

    let submission = PredictionSubmission {
        member_id: MemberId(3),
        selection: column("22222222222222", "0-2"),
        late: false,
        submitted_at: None,
    };
    let stored = service
        .submit_prediction(2, submission)
        .expect("submission persists");
    assert_eq!(stored.id, "j2_3");

    // Overwriting the same (round, member) pair keeps a single record.
    let replacement = PredictionSubmission {
        member_id: MemberId(3),
        selection: column("2222222222222X", "0-2"),
        late: true,
        submitted_at: None,
    };
    service
        .submit_prediction(2, replacement)
        .expect("overwrite persists");

    let records = store
        .get_all(collections::PREDICTIONS)
        .expect("store reads");
    let for_edu: Vec<_> = records
        .iter()
        .filter(|record| record.get("id").and_then(|id| id.as_str()) == Some("j2_3"))
        .collect();
    assert_eq!(for_edu.len(), 1);
    assert_eq!(
        for_edu[0].get("late").and_then(|late| late.as_bool()),
        Some(true)
    );
}

#[test]
fn unknown_round_and_member_are_rejected() {
    let (service, _) = build_service();

    let submission = PredictionSubmission {
        member_id: MemberId(1),
        selection: column("11111111111111", "1"),
        late: false,
        submitted_at: None,
    };
    match service.submit_prediction(9, submission) {
        Err(PoolServiceError::UnknownRound(9)) => {}
        other => panic!("expected unknown round, got {other:?}"),
    }

    let submission = PredictionSubmission {
        member_id: MemberId(42),
        selection: column("11111111111111", "1"),
        late: false,
        submitted_at: None,
    };
    match service.submit_prediction(1, submission) {
        Err(PoolServiceError::UnknownMember(MemberId(42))) => {}
        other => panic!("expected unknown member, got {other:?}"),
    }
}

#[test]
fn doubles_with_too_many_doubles_are_rejected() {
    let (service, _) = build_service();

    // Eight two-sign slots exceeds the seven-double maximum.
    let submission = PredictionSubmission {
        member_id: MemberId(2),
        selection: picks([
            "1X", "1X", "1X", "1X", "1X", "1X", "1X", "1X", "1", "1", "1", "1", "1", "1", "1",
        ]),
        late: false,
        submitted_at: None,
    };

    match service.submit_doubles(2, submission) {
        Err(PoolServiceError::Reduction(ReductionError::TooManyDoubles(8))) => {}
        other => panic!("expected reduction rejection, got {other:?}"),
    }
}

#[test]
fn mixed_reductions_are_rejected() {
    let (service, _) = build_service();

    let submission = PredictionSubmission {
        member_id: MemberId(2),
        selection: picks([
            "1X", "1X2", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1",
        ]),
        late: false,
        submitted_at: None,
    };

    match service.submit_doubles(2, submission) {
        Err(PoolServiceError::Reduction(ReductionError::Mixed {
            doubles: 1,
            triples: 1,
        })) => {}
        other => panic!("expected mixed rejection, got {other:?}"),
    }
}

#[test]
fn valid_doubles_from_an_eligible_member_persist() {
    let (service, store) = build_service();

    // Carlos holds a prize tier from round 1.
    let submission = PredictionSubmission {
        member_id: MemberId(2),
        selection: picks([
            "1X", "1X", "1X", "1X", "1X", "1X", "1X", "1", "1", "1", "1", "1", "1", "1", "1-0",
        ]),
        late: false,
        submitted_at: None,
    };

    let stored = service
        .submit_doubles(2, submission)
        .expect("doubles persist");
    assert_eq!(stored.id, "j2_2");

    let records = store.get_all(collections::DOUBLES).expect("store reads");
    assert_eq!(records.len(), 1);
}

#[test]
fn ineligible_members_cannot_save_doubles() {
    let (service, _) = build_service();

    // Marcelo neither won round 1 nor reached its prize tier.
    let submission = PredictionSubmission {
        member_id: MemberId(4),
        selection: picks([
            "1X", "1X", "1X", "1X", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1", "1",
        ]),
        late: false,
        submitted_at: None,
    };

    match service.submit_doubles(2, submission) {
        Err(PoolServiceError::NotEligible {
            round: 2,
            member: MemberId(4),
        }) => {}
        other => panic!("expected eligibility rejection, got {other:?}"),
    }
}

#[test]
fn pardoning_lifts_the_late_sanction() {
    let (service, _) = build_service();

    let submission = PredictionSubmission {
        member_id: MemberId(3),
        selection: column("22222222222222", "0-2"),
        late: true,
        submitted_at: None,
    };
    service
        .submit_prediction(2, submission)
        .expect("submission persists");

    // Late and unpardoned: the round-2 sweep scores zero hits.
    let before = service.season_summary().expect("summary builds");
    let edu = before
        .totals
        .iter()
        .find(|total| total.member_id == MemberId(3))
        .expect("edu present");
    assert_eq!(edu.hits, 0);

    let pardoned = service
        .pardon_prediction(2, MemberId(3))
        .expect("pardon persists");
    assert!(pardoned.pardoned);

    let after = service.season_summary().expect("summary builds");
    let edu = after
        .totals
        .iter()
        .find(|total| total.member_id == MemberId(3))
        .expect("edu present");
    assert_eq!(edu.hits, 15);
}

#[test]
fn pardoning_requires_an_existing_prediction() {
    let (service, _) = build_service();

    match service.pardon_prediction(2, MemberId(3)) {
        Err(PoolServiceError::MissingPrediction {
            round: 2,
            member: MemberId(3),
        }) => {}
        other => panic!("expected missing prediction, got {other:?}"),
    }
}

#[test]
fn round_outcome_uses_prior_rounds_for_tie_breaks() {
    let (service, _) = build_service();

    let outcome = service.round_outcome(2).expect("outcome resolves");
    assert_eq!(outcome.winner, MemberId(2));
    assert_eq!(outcome.loser, MemberId(3));
    assert_eq!(outcome.round_number, 2);
}

#[test]
fn rule_changes_append_and_survive_reload() {
    let (service, _) = build_service();

    let stricter = RuleSet {
        penalty0: -8,
        ..RuleSet::default()
    };
    let effective = NaiveDate::from_ymd_opt(2025, 9, 1).expect("valid date");
    let history = service
        .record_rule_change(stricter, effective)
        .expect("rule change persists");
    assert_eq!(history.entries().len(), 2);

    let reloaded = service.snapshot().expect("snapshot reloads");
    assert_eq!(reloaded.rule_history.entries().len(), 2);
    assert_eq!(
        reloaded.rule_history.rules_for(Some(effective)).penalty0,
        -8
    );
    // Rounds before the change keep the old penalty.
    assert_eq!(
        reloaded
            .rule_history
            .rules_for(Some(NaiveDate::from_ymd_opt(2025, 8, 15).expect("valid date")))
            .penalty0,
        -5
    );
}

#[test]
fn ledger_csv_round_trips_through_the_service() {
    let (service, _) = build_service();
    let csv = service.ledger_csv().expect("export builds");
    assert!(csv.starts_with("member,round,date,hits,"));
    assert!(csv.lines().count() > 1);
}
