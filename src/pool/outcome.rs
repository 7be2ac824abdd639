use std::collections::BTreeMap;

use serde::Serialize;

use super::domain::{Member, MemberId, Round};
use super::scoring::Evaluation;

/// Per-member point trail over prior rounds, in ascending round order. The
/// last entry is the round immediately preceding the one being resolved.
pub type PointsHistory = BTreeMap<MemberId, Vec<i32>>;

/// One member's evaluated standing inside a single round. The late override
/// (late and unpardoned scores as zero hits) is already applied by the
/// caller; this module only ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemberRoundScore {
    pub member_id: MemberId,
    pub hits: i32,
    pub points: i32,
    pub has_submission: bool,
    pub late: bool,
    pub pardoned: bool,
}

impl MemberRoundScore {
    pub fn submitted(member_id: MemberId, evaluation: Evaluation, late: bool, pardoned: bool) -> Self {
        Self {
            member_id,
            hits: evaluation.hits,
            points: evaluation.points,
            has_submission: true,
            late,
            pardoned,
        }
    }

    pub fn absent(member_id: MemberId) -> Self {
        Self {
            member_id,
            hits: super::scoring::NOT_SUBMITTED,
            points: 0,
            has_submission: false,
            late: false,
            pardoned: false,
        }
    }
}

/// Tie-break direction: winners chase the maximum, losers the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TieGoal {
    Highest,
    Lowest,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrizeAward {
    pub member_id: MemberId,
    pub hits: i32,
    pub amount: f64,
}

/// Resolved standing of one round: who won, who stamps the next ticket, who
/// cashed a prize, and who may play the doubles column next week.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RoundOutcome {
    pub round_number: u32,
    pub winner: MemberId,
    pub winner_candidates: Vec<MemberId>,
    pub loser: MemberId,
    pub loser_candidates: Vec<MemberId>,
    pub prize_winners: Vec<PrizeAward>,
    pub doubles_eligible: Vec<MemberId>,
}

/// Determines the round's winner and loser with recursive historical
/// tie-breaking, plus prize winners and the doubles-eligible set for the
/// following round. Pure over its inputs; returns `None` when the round has
/// no submissions at all.
pub fn resolve(
    round: &Round,
    scores: &[MemberRoundScore],
    history: &PointsHistory,
    members: &[Member],
) -> Option<RoundOutcome> {
    let submitted: Vec<&MemberRoundScore> =
        scores.iter().filter(|score| score.has_submission).collect();
    if submitted.is_empty() {
        return None;
    }

    // Winner: maximal points among submissions, historical tie-break, then
    // lowest member id as the deterministic fallback.
    let top = submitted.iter().map(|score| score.points).max()?;
    let winner_pool: Vec<MemberId> = submitted
        .iter()
        .filter(|score| score.points == top)
        .map(|score| score.member_id)
        .collect();
    let winner_candidates = narrow_by_history(&winner_pool, history, TieGoal::Highest);
    let winner = *winner_candidates.iter().min()?;

    // Loser: automatic offenders first (no submission, or late and
    // unpardoned below the prize threshold); otherwise minimal points.
    let threshold = round.min_hits_to_win as i32;
    let offenders: Vec<MemberId> = scores
        .iter()
        .filter(|score| {
            !score.has_submission
                || (score.late && !score.pardoned && score.hits < threshold)
        })
        .map(|score| score.member_id)
        .collect();

    let loser_pool: Vec<MemberId> = if offenders.is_empty() {
        let bottom = submitted.iter().map(|score| score.points).min()?;
        submitted
            .iter()
            .filter(|score| score.points == bottom)
            .map(|score| score.member_id)
            .collect()
    } else {
        offenders
    };
    let loser_candidates = narrow_by_history(&loser_pool, history, TieGoal::Lowest);
    let loser = *loser_candidates.iter().max()?;

    let prize_winners: Vec<PrizeAward> = submitted
        .iter()
        .filter(|score| round.prizes.awards(score.hits))
        .map(|score| PrizeAward {
            member_id: score.member_id,
            hits: score.hits,
            amount: round.prizes.amount_for(score.hits),
        })
        .collect();

    // Doubles access for the next round: the absolute winner plus every
    // prize winner, alphabetically ordered by name for display.
    let mut doubles_eligible: Vec<MemberId> = prize_winners
        .iter()
        .map(|award| award.member_id)
        .chain(std::iter::once(winner))
        .collect();
    doubles_eligible.sort();
    doubles_eligible.dedup();
    doubles_eligible.sort_by(|a, b| {
        member_name(members, *a)
            .cmp(member_name(members, *b))
            .then(a.cmp(b))
    });

    Some(RoundOutcome {
        round_number: round.number,
        winner,
        winner_candidates,
        loser,
        loser_candidates,
        prize_winners,
        doubles_eligible,
    })
}

fn member_name(members: &[Member], id: MemberId) -> &str {
    members
        .iter()
        .find(|member| member.id == id)
        .map(|member| member.name.as_str())
        .unwrap_or("")
}

/// Narrows tied candidates by walking their point histories backward, one
/// round at a time, keeping only those matching the extreme value at each
/// step. Stops when a single candidate remains or history is exhausted.
/// Members with no recorded points for a step count as zero there.
pub fn narrow_by_history(
    candidates: &[MemberId],
    history: &PointsHistory,
    goal: TieGoal,
) -> Vec<MemberId> {
    let mut remaining: Vec<MemberId> = candidates.to_vec();
    if remaining.len() <= 1 {
        return remaining;
    }

    let depth = remaining
        .iter()
        .map(|id| history.get(id).map_or(0, Vec::len))
        .max()
        .unwrap_or(0);

    for offset in 1..=depth {
        let values: Vec<i32> = remaining
            .iter()
            .map(|id| points_at(history, *id, offset))
            .collect();
        let extreme = match goal {
            TieGoal::Highest => *values.iter().max().expect("non-empty candidate set"),
            TieGoal::Lowest => *values.iter().min().expect("non-empty candidate set"),
        };

        remaining = remaining
            .into_iter()
            .zip(values)
            .filter(|(_, value)| *value == extreme)
            .map(|(id, _)| id)
            .collect();

        if remaining.len() <= 1 {
            break;
        }
    }

    remaining
}

fn points_at(history: &PointsHistory, member: MemberId, offset: usize) -> i32 {
    history
        .get(&member)
        .and_then(|trail| trail.len().checked_sub(offset).map(|index| trail[index]))
        .unwrap_or(0)
}
