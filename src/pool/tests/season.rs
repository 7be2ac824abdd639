use super::common::*;
use crate::pool::scoring::{RuleHistory, RuleSet};
use crate::pool::season::accumulate;
use crate::pool::MemberId;

#[test]
fn totals_fold_points_hits_bonus_and_prizes() {
    let summary = accumulate(
        &roster(),
        &sample_rounds(),
        &sample_predictions(),
        &RuleHistory::default(),
    );
    let rules = RuleSet::default();

    assert_eq!(summary.played_rounds, 2);

    // Carlos: 11 hits (+5) in round 1, 15 hits (+30) in round 2.
    let carlos = summary
        .totals
        .iter()
        .find(|total| total.member_id == MemberId(2))
        .expect("carlos present");
    assert_eq!(carlos.hits, 26);
    assert_eq!(carlos.points, 26 + rules.bonus11 + rules.bonus15);
    assert_eq!(carlos.bonus, rules.bonus11 + rules.bonus15);
    assert!((carlos.prize_money - 32.0).abs() < 1e-9);

    // Carlos outscores Alvaro (45 + -5 = 40) and leads the table.
    assert_eq!(summary.totals[0].member_id, MemberId(2));
}

#[test]
fn missing_submissions_add_nothing_to_totals() {
    let summary = accumulate(
        &roster(),
        &sample_rounds(),
        &sample_predictions(),
        &RuleHistory::default(),
    );

    // Edu blanked round 1 (-5) and skipped round 2 entirely.
    let edu = summary
        .totals
        .iter()
        .find(|total| total.member_id == MemberId(3))
        .expect("edu present");
    assert_eq!(edu.points, -5);
    assert_eq!(edu.hits, 0);

    // The skipped round still shows in his trail as zero points.
    assert_eq!(summary.history.get(&MemberId(3)), Some(&vec![-5, 0]));
}

#[test]
fn rounds_are_processed_in_ascending_number_order() {
    let mut rounds = sample_rounds();
    rounds.reverse();

    let summary = accumulate(
        &roster(),
        &rounds,
        &sample_predictions(),
        &RuleHistory::default(),
    );

    let alvaro_rows: Vec<_> = summary
        .standings
        .iter()
        .filter(|row| row.member_id == MemberId(1))
        .collect();
    assert_eq!(alvaro_rows.len(), 2);
    assert_eq!(alvaro_rows[0].round_number, 1);
    assert_eq!(alvaro_rows[1].round_number, 2);
    // 45 in round 1, -5 in round 2.
    assert_eq!(alvaro_rows[0].cumulative_points, 45);
    assert_eq!(alvaro_rows[1].cumulative_points, 40);
}

#[test]
fn unplayed_and_gap_rounds_do_not_break_the_chain() {
    let mut rounds = sample_rounds();
    // A placeholder round with no results and a gap in the numbering.
    rounds.push(round("j3", 3, "", ",,,,,,,,,,,,,,"));
    rounds.push(with_prizes(
        round("j5", 5, "14/09/2025", "1,1,1,1,1,1,1,1,1,1,1,1,1,1,1-0"),
        serde_json::json!({}),
    ));
    let mut predictions = sample_predictions();
    predictions.push(prediction(&rounds[3], 4, "11111111111111", "1-0"));

    let summary = accumulate(&roster(), &rounds, &predictions, &RuleHistory::default());

    assert_eq!(summary.played_rounds, 3);
    let marcelo = summary
        .totals
        .iter()
        .find(|total| total.member_id == MemberId(4))
        .expect("marcelo present");
    // 3 hits (-1) + 11 hits (+5) + 15 hits (+30).
    assert_eq!(marcelo.hits, 29);
    assert_eq!(marcelo.points, 29 - 1 + 5 + 30);
}

#[test]
fn accumulate_is_idempotent_over_a_snapshot() {
    let members = roster();
    let rounds = sample_rounds();
    let predictions = sample_predictions();
    let history = RuleHistory::default();

    let first = accumulate(&members, &rounds, &predictions, &history);
    let second = accumulate(&members, &rounds, &predictions, &history);

    assert_eq!(first, second);
}

#[test]
fn late_unpardoned_columns_score_zero_hits() {
    let mut predictions = sample_predictions();
    predictions[0] = late(predictions[0].clone());

    let summary = accumulate(
        &roster(),
        &sample_rounds(),
        &predictions,
        &RuleHistory::default(),
    );

    let alvaro = summary
        .totals
        .iter()
        .find(|total| total.member_id == MemberId(1))
        .expect("alvaro present");
    // Round 1 collapses to penalty0, round 2 stays a genuine 0-hit column.
    assert_eq!(alvaro.points, -10);
    assert_eq!(alvaro.hits, 0);
}

#[test]
fn pardoned_late_column_scores_normally() {
    let mut predictions = sample_predictions();
    predictions[0] = late(predictions[0].clone());
    predictions[0].pardoned = true;

    let summary = accumulate(
        &roster(),
        &sample_rounds(),
        &predictions,
        &RuleHistory::default(),
    );

    let alvaro = summary
        .totals
        .iter()
        .find(|total| total.member_id == MemberId(1))
        .expect("alvaro present");
    assert_eq!(alvaro.points, 45 - 5);
}
