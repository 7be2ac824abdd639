use serde::Serialize;

use super::domain::{Member, MemberId, Prediction, Round};
use super::outcome::{MemberRoundScore, PointsHistory};
use super::scoring::{self, Evaluation, RuleHistory, RuleSet};

/// Season-long running totals for one member.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemberSeasonTotal {
    pub member_id: MemberId,
    pub name: String,
    pub points: i32,
    pub hits: i32,
    pub bonus: i32,
    pub prize_money: f64,
}

/// One member's line for one played round, with the running cumulative.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundStanding {
    pub round_number: u32,
    pub member_id: MemberId,
    pub hits: i32,
    pub points: i32,
    pub bonus: i32,
    pub cumulative_points: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SeasonSummary {
    pub played_rounds: u32,
    pub totals: Vec<MemberSeasonTotal>,
    pub standings: Vec<RoundStanding>,
    #[serde(skip)]
    pub history: PointsHistory,
}

/// Evaluates every member against one round. Late, unpardoned submissions
/// score as zero hits through the rule table; missing submissions carry the
/// negative-hits sentinel and zero points.
pub fn score_round(
    round: &Round,
    members: &[Member],
    predictions: &[Prediction],
    rules: &RuleSet,
) -> Vec<MemberRoundScore> {
    let results = round.official_results();

    members
        .iter()
        .map(|member| {
            let prediction = predictions.iter().find(|prediction| {
                prediction.round_id == round.id && prediction.member_id == member.id
            });

            match prediction {
                None => MemberRoundScore::absent(member.id),
                Some(p) if p.counts_as_late() => {
                    let points = rules.score(0);
                    let evaluation = Evaluation {
                        hits: 0,
                        points,
                        bonus: points,
                    };
                    MemberRoundScore::submitted(member.id, evaluation, p.late, p.pardoned)
                }
                Some(p) => {
                    let evaluation = scoring::evaluate(&p.selection, &results, rules);
                    MemberRoundScore::submitted(member.id, evaluation, p.late, p.pardoned)
                }
            }
        })
        .collect()
}

/// Folds per-round evaluations into season totals. Rounds are processed
/// strictly in ascending `number` order so "the previous round" stays
/// well-defined for tie-breaking and eligibility; gaps in the numbering are
/// tolerated, unplayed rounds are skipped. Re-running over the same
/// snapshot yields identical totals.
pub fn accumulate(
    members: &[Member],
    rounds: &[Round],
    predictions: &[Prediction],
    rule_history: &RuleHistory,
) -> SeasonSummary {
    let mut ordered: Vec<&Round> = rounds.iter().filter(|round| round.is_played()).collect();
    ordered.sort_by_key(|round| round.number);

    let mut summary = SeasonSummary::default();
    let mut totals: Vec<MemberSeasonTotal> = members
        .iter()
        .map(|member| MemberSeasonTotal {
            member_id: member.id,
            name: member.name.clone(),
            points: 0,
            hits: 0,
            bonus: 0,
            prize_money: 0.0,
        })
        .collect();

    for round in &ordered {
        let rules = rule_history.rules_for(round.date());
        let scores = score_round(round, members, predictions, &rules);

        for score in &scores {
            let total = totals
                .iter_mut()
                .find(|total| total.member_id == score.member_id)
                .expect("totals cover every member");

            if score.has_submission {
                total.points += score.points;
                total.hits += score.hits;
                total.bonus += score.points - score.hits;
                total.prize_money += round.prizes.amount_for(score.hits);
            }

            summary.standings.push(RoundStanding {
                round_number: round.number,
                member_id: score.member_id,
                hits: score.hits,
                points: score.points,
                bonus: if score.has_submission {
                    score.points - score.hits
                } else {
                    0
                },
                cumulative_points: total.points,
            });

            summary
                .history
                .entry(score.member_id)
                .or_default()
                .push(score.points);
        }
    }

    summary.played_rounds = ordered.len() as u32;
    totals.sort_by(|a, b| b.points.cmp(&a.points).then(a.member_id.cmp(&b.member_id)));
    summary.totals = totals;
    summary
}
