use std::io::Write;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::domain::{Member, MemberId, Prediction, Round, REGULAR_SLOTS};
use super::outcome::{self, PointsHistory, RoundOutcome};
use super::scoring::RuleHistory;
use super::season;

fn default_column_cost() -> f64 {
    0.75
}

fn default_doubles_cost() -> f64 {
    12.0
}

fn default_weekly_due() -> f64 {
    1.0
}

/// Fund ("bote") accounting knobs. A single mutable document in the config
/// collection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerConfig {
    #[serde(default = "default_column_cost", alias = "costeColumna")]
    pub column_cost: f64,
    #[serde(default = "default_doubles_cost", alias = "costeDobles")]
    pub doubles_cost: f64,
    #[serde(default = "default_weekly_due", alias = "aportacionSemanal")]
    pub weekly_due: f64,
    #[serde(default)]
    pub initial_fund: f64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            column_cost: default_column_cost(),
            doubles_cost: default_doubles_cost(),
            weekly_due: default_weekly_due(),
            initial_fund: 0.0,
        }
    }
}

/// Manual cash movement recorded by the treasurer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashEntry {
    pub id: String,
    #[serde(alias = "memberId")]
    pub member_id: MemberId,
    #[serde(alias = "fecha")]
    pub date: NaiveDate,
    #[serde(alias = "cantidad")]
    pub amount: f64,
}

/// One member's ledger line for one played round.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LedgerLine {
    pub member_id: MemberId,
    pub member_name: String,
    pub round_number: u32,
    pub round_date: String,
    pub hits: i32,
    pub weekly_due: f64,
    pub column_cost: f64,
    pub ones_penalty: f64,
    pub sellado: f64,
    pub prize: f64,
    pub manual_income: f64,
    pub total_income: f64,
    pub total_expense: f64,
    pub net: f64,
    pub cumulative: f64,
    pub exempt: bool,
    pub played_doubles: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LedgerReport {
    pub initial_fund: f64,
    pub final_fund: f64,
    pub lines: Vec<LedgerLine>,
}

/// Tiered surcharge for stacking home-win signs: ten or more "1" entries
/// across the 14 regular slots.
pub fn ones_penalty(ones: usize) -> f64 {
    match ones {
        0..=9 => 0.0,
        10 => 1.10,
        11 => 1.20,
        12 => 1.30,
        13 => 1.50,
        _ => 2.00,
    }
}

fn count_ones(prediction: &Prediction) -> usize {
    prediction
        .selection
        .iter()
        .take(REGULAR_SLOTS)
        .filter(|pick| pick.as_ref().is_some_and(|p| p.as_str() == "1"))
        .count()
}

/// Derives every member's weekly dues, exemptions, penalties, sellado
/// reimbursements, and manual income into per-round ledger lines with a
/// running net. Pure fold over the materialized snapshot.
pub fn compute_movements(
    members: &[Member],
    rounds: &[Round],
    predictions: &[Prediction],
    entries: &[CashEntry],
    config: &LedgerConfig,
    rule_history: &RuleHistory,
) -> LedgerReport {
    let mut ordered: Vec<&Round> = rounds.iter().filter(|round| round.is_played()).collect();
    ordered.sort_by_key(|round| round.number);

    // Resolve each round's outcome once, feeding the same evolving history
    // the tie-break rules expect.
    let mut history = PointsHistory::new();
    let mut outcomes: Vec<Option<RoundOutcome>> = Vec::with_capacity(ordered.len());
    let mut round_scores = Vec::with_capacity(ordered.len());
    for round in &ordered {
        let rules = rule_history.rules_for(round.date());
        let scores = season::score_round(round, members, predictions, &rules);
        outcomes.push(outcome::resolve(round, &scores, &history, members));
        for score in &scores {
            history.entry(score.member_id).or_default().push(score.points);
        }
        round_scores.push(scores);
    }

    let mut roster: Vec<&Member> = members.iter().collect();
    roster.sort_by_key(|member| member.id);

    let mut report = LedgerReport {
        initial_fund: config.initial_fund,
        ..LedgerReport::default()
    };

    for member in roster {
        let mut cumulative = 0.0;

        for (index, round) in ordered.iter().enumerate() {
            let scores = &round_scores[index];
            let hits = scores
                .iter()
                .find(|score| score.member_id == member.id)
                .map(|score| score.hits)
                .unwrap_or(super::scoring::NOT_SUBMITTED);

            // Exemption: a monetary prize in the immediately preceding
            // round of the sequence waives this week's costs.
            let previous = index.checked_sub(1).map(|i| (ordered[i], &round_scores[i]));
            let exempt = previous.is_some_and(|(prev_round, prev_scores)| {
                prev_scores
                    .iter()
                    .find(|score| score.member_id == member.id)
                    .is_some_and(|score| prev_round.prizes.amount_for(score.hits) > 0.0)
            });

            let previous_outcome = index
                .checked_sub(1)
                .and_then(|i| outcomes[i].as_ref());
            let played_doubles =
                previous_outcome.is_some_and(|outcome| outcome.winner == member.id);
            let sellado = if previous_outcome.is_some_and(|outcome| outcome.loser == member.id) {
                -((members.len() as f64 * config.column_cost) + config.doubles_cost)
            } else {
                0.0
            };

            let (weekly_due, column_cost) = if exempt {
                (0.0, 0.0)
            } else {
                (config.weekly_due, config.column_cost)
            };

            let penalty = if exempt {
                0.0
            } else {
                predictions
                    .iter()
                    .find(|prediction| {
                        prediction.round_id == round.id && prediction.member_id == member.id
                    })
                    .map(|prediction| ones_penalty(count_ones(prediction)))
                    .unwrap_or(0.0)
            };

            let prize = if hits >= 0 {
                round.prizes.amount_for(hits)
            } else {
                0.0
            };
            let manual_income = manual_income_for(member.id, round, entries);

            // Prize money stays in the communal pot; the member's running
            // fund nets manual income against dues, penalties, and sellado.
            let total_income = manual_income + prize;
            let total_expense = weekly_due + penalty;
            let net = manual_income - total_expense - sellado;
            cumulative += net;

            report.lines.push(LedgerLine {
                member_id: member.id,
                member_name: member.name.clone(),
                round_number: round.number,
                round_date: round.date.clone(),
                hits,
                weekly_due,
                column_cost,
                ones_penalty: penalty,
                sellado,
                prize,
                manual_income,
                total_income,
                total_expense,
                net,
                cumulative,
                exempt,
                played_doubles,
            });
        }
    }

    report.final_fund =
        report.initial_fund + report.lines.iter().map(|line| line.net).sum::<f64>();
    report
}

/// Manual cash entries count toward a round when dated within seven days of
/// it. An unparseable round date attributes nothing.
fn manual_income_for(member_id: MemberId, round: &Round, entries: &[CashEntry]) -> f64 {
    let Some(round_date) = round.date() else {
        return 0.0;
    };

    entries
        .iter()
        .filter(|entry| entry.member_id == member_id)
        .filter(|entry| (entry.date - round_date).num_days().abs() <= 7)
        .map(|entry| entry.amount)
        .sum()
}

const CSV_HEADER: [&str; 16] = [
    "member",
    "round",
    "date",
    "hits",
    "weekly_due",
    "column_cost",
    "ones_penalty",
    "sellado",
    "prize",
    "manual_income",
    "total_income",
    "total_expense",
    "net",
    "cumulative",
    "exempt",
    "doubles",
];

/// Writes the report in the fixed export column order.
pub fn export_csv<W: Write>(report: &LedgerReport, writer: W) -> Result<(), csv::Error> {
    let mut csv_writer = csv::Writer::from_writer(writer);
    csv_writer.write_record(CSV_HEADER)?;

    for line in &report.lines {
        let hits = if line.hits < 0 {
            "-".to_string()
        } else {
            line.hits.to_string()
        };
        csv_writer.write_record([
            line.member_name.clone(),
            line.round_number.to_string(),
            line.round_date.clone(),
            hits,
            format!("{:.2}", line.weekly_due),
            format!("{:.2}", line.column_cost),
            format!("{:.2}", line.ones_penalty),
            format!("{:.2}", line.sellado),
            format!("{:.2}", line.prize),
            format!("{:.2}", line.manual_income),
            format!("{:.2}", line.total_income),
            format!("{:.2}", line.total_expense),
            format!("{:.2}", line.net),
            format!("{:.2}", line.cumulative),
            line.exempt.to_string(),
            line.played_doubles.to_string(),
        ])?;
    }

    csv_writer.flush()?;
    Ok(())
}

pub fn export_csv_string(report: &LedgerReport) -> Result<String, csv::Error> {
    let mut buffer = Vec::new();
    export_csv(report, &mut buffer)?;
    Ok(String::from_utf8(buffer).expect("csv output is utf-8"))
}
