use serde::Serialize;

use super::domain::{Member, MemberId, Prediction, Round};
use super::scoring::{self, RuleHistory};

/// Why a member may open the doubles form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EligibilityReason {
    Winner,
    Prize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Eligibility {
    pub eligible: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<EligibilityReason>,
}

impl Eligibility {
    pub fn no() -> Self {
        Self {
            eligible: false,
            reason: None,
        }
    }

    fn because(reason: EligibilityReason) -> Self {
        Self {
            eligible: true,
            reason: Some(reason),
        }
    }
}

/// Gate for the secondary ("doubles/reduced") form of round N, decided from
/// round N−1. The previous round is keyed literally to `number - 1`; a gap
/// in the numbering means nobody qualifies. The previous round must have at
/// least 14 published results (the Pleno often lands late).
pub fn doubles_eligibility(
    round_number: u32,
    member_id: MemberId,
    members: &[Member],
    rounds: &[Round],
    predictions: &[Prediction],
    history: &RuleHistory,
) -> Eligibility {
    if round_number <= 1 {
        return Eligibility::no();
    }

    let Some(previous) = rounds.iter().find(|round| round.number == round_number - 1) else {
        return Eligibility::no();
    };
    if previous.results_known() < 14 {
        return Eligibility::no();
    }

    let results = previous.official_results();
    let rules = history.rules_for(previous.date());

    // Recompute the previous round for every member. Absent and
    // late-unpardoned entries score as zero hits through the rule table.
    let standings: Vec<(MemberId, i32, i32)> = members
        .iter()
        .map(|member| {
            let prediction = predictions.iter().find(|prediction| {
                prediction.round_id == previous.id && prediction.member_id == member.id
            });

            match prediction {
                Some(p) if !p.counts_as_late() => {
                    let evaluation = scoring::evaluate(&p.selection, &results, &rules);
                    (member.id, evaluation.points, evaluation.hits)
                }
                _ => (member.id, rules.score(0), 0),
            }
        })
        .collect();

    let Some(top) = standings.iter().map(|(_, points, _)| *points).max() else {
        return Eligibility::no();
    };

    let is_winner = standings
        .iter()
        .any(|(id, points, _)| *id == member_id && *points == top);
    if is_winner {
        return Eligibility::because(EligibilityReason::Winner);
    }

    // Prize-tier access: the member's hits reached the round's threshold,
    // provided the threshold is a real prize range (15 would mean "hit
    // everything", which is the winner case, not a tier).
    if previous.min_hits_to_win < 15 {
        let reached = standings.iter().any(|(id, _, hits)| {
            *id == member_id && *hits >= previous.min_hits_to_win as i32
        });
        if reached {
            return Eligibility::because(EligibilityReason::Prize);
        }
    }

    Eligibility::no()
}
