use std::cmp::Ordering;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use super::prizes::PrizeTable;

/// Slots on a quiniela ticket: 14 regular fixtures plus the Pleno al 15.
pub const SLOTS: usize = 15;
pub const REGULAR_SLOTS: usize = 14;

/// Goal count standing in for the `M`/`M+` high-margin marker.
const HIGH_MARGIN: u32 = 99;

/// Identifier wrapper for roster members. Assigned at roster creation and
/// used as the join key everywhere else.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct MemberId(pub u32);

impl fmt::Display for MemberId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nickname: Option<String>,
}

/// Identifier wrapper for rounds ("jornadas").
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoundId(pub String);

impl fmt::Display for RoundId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One fixture inside a round. `result` stays empty until the match is
/// played, then holds a sign or a literal score string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Fixture {
    pub home: String,
    pub away: String,
    #[serde(default)]
    pub result: String,
}

impl Fixture {
    pub fn official_result(&self) -> Option<OfficialResult> {
        OfficialResult::parse(&self.result)
    }
}

fn default_min_hits() -> u32 {
    10
}

fn default_active() -> bool {
    true
}

/// One week's set of 15 fixtures. Round numbers are season-unique but not
/// necessarily contiguous; placeholder numbers may exist with no round.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub number: u32,
    #[serde(default)]
    pub date: String,
    pub matches: Vec<Fixture>,
    #[serde(default = "default_active")]
    pub active: bool,
    #[serde(default = "default_min_hits", alias = "minHitsToWin")]
    pub min_hits_to_win: u32,
    #[serde(default, alias = "prizeRates")]
    pub prizes: PrizeTable,
}

impl Round {
    /// A round is played once every slot carries a non-pending result.
    pub fn is_played(&self) -> bool {
        self.matches.len() == SLOTS
            && self
                .matches
                .iter()
                .all(|fixture| !is_pending(&fixture.result))
    }

    pub fn results_known(&self) -> usize {
        self.matches
            .iter()
            .filter(|fixture| !is_pending(&fixture.result))
            .count()
    }

    pub fn official_results(&self) -> Vec<Option<OfficialResult>> {
        self.matches
            .iter()
            .map(Fixture::official_result)
            .collect()
    }

    pub fn date(&self) -> Option<NaiveDate> {
        parse_round_date(&self.date)
    }

    pub fn slot_kind(&self, index: usize) -> SlotKind {
        SlotKind::of(index)
    }
}

/// Explicit tag distinguishing the Pleno al 15 from the regular slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SlotKind {
    Regular,
    Pleno,
}

impl SlotKind {
    pub const fn of(index: usize) -> Self {
        if index == SLOTS - 1 {
            SlotKind::Pleno
        } else {
            SlotKind::Regular
        }
    }
}

/// Prediction symbol for a single fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Sign {
    Home,
    Draw,
    Away,
}

impl Sign {
    pub const fn as_char(self) -> char {
        match self {
            Sign::Home => '1',
            Sign::Draw => 'X',
            Sign::Away => '2',
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Sign::Home => "1",
            Sign::Draw => "X",
            Sign::Away => "2",
        }
    }

    pub fn from_char(value: char) -> Option<Self> {
        match value.to_ascii_uppercase() {
            '1' => Some(Sign::Home),
            'X' => Some(Sign::Draw),
            '2' => Some(Sign::Away),
            _ => None,
        }
    }
}

/// A published result, normalized to a sign while keeping the literal text
/// for exact Pleno comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OfficialResult {
    pub literal: String,
    pub sign: Sign,
}

impl OfficialResult {
    /// Parses a raw result cell. Returns `None` for pending sentinels and
    /// for text that cannot be normalized to a sign.
    pub fn parse(raw: &str) -> Option<Self> {
        if is_pending(raw) {
            return None;
        }

        let literal = raw.trim().to_uppercase();
        let sign = match literal.as_str() {
            "1" => Sign::Home,
            "X" => Sign::Draw,
            "2" => Sign::Away,
            text if text.contains('-') => {
                let mut parts = text.splitn(2, '-');
                let home = goal_value(parts.next().unwrap_or(""));
                let away = goal_value(parts.next().unwrap_or(""));
                match home.cmp(&away) {
                    Ordering::Greater => Sign::Home,
                    Ordering::Less => Sign::Away,
                    Ordering::Equal => Sign::Draw,
                }
            }
            _ => return None,
        };

        Some(Self { literal, sign })
    }
}

/// Pending sentinels used by the store for unplayed fixtures.
pub fn is_pending(raw: &str) -> bool {
    let trimmed = raw.trim();
    trimmed.is_empty() || trimmed == "-" || trimmed.eq_ignore_ascii_case("por definir")
}

fn goal_value(part: &str) -> u32 {
    let part = part.trim();
    if part == "M" || part == "M+" {
        HIGH_MARGIN
    } else {
        part.parse().unwrap_or(0)
    }
}

/// One slot of a member's selection: a sign, a multi-sign combination on a
/// reduced form ("1X"), or a literal scoreline on the Pleno slot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pick(String);

impl Pick {
    pub fn new(raw: impl Into<String>) -> Self {
        Self(raw.into().trim().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of signs when the pick is a pure sign combination; `None` for
    /// literal scorelines and anything else.
    pub fn sign_count(&self) -> Option<usize> {
        if self.0.is_empty() || !self.0.chars().all(|c| Sign::from_char(c).is_some()) {
            return None;
        }
        Some(self.0.chars().count())
    }

    /// Regular-slot hit test: the combination contains the official sign.
    pub fn covers(&self, official: &OfficialResult) -> bool {
        self.0.contains(official.sign.as_char())
    }

    /// Pleno hit test: exact literal match, or a plain-sign pleno matching
    /// the normalized sign.
    pub fn matches_pleno(&self, official: &OfficialResult) -> bool {
        self.0 == official.literal || self.0 == official.sign.as_str()
    }
}

impl fmt::Display for Pick {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A member's submitted column for one round. One per (round, member) pair;
/// the id doubles as the uniqueness key in the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub id: String,
    #[serde(alias = "jId", alias = "jornadaId")]
    pub round_id: RoundId,
    #[serde(alias = "mId", alias = "memberId")]
    pub member_id: MemberId,
    pub selection: Vec<Option<Pick>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub submitted_at: Option<NaiveDateTime>,
    #[serde(default)]
    pub late: bool,
    #[serde(default)]
    pub pardoned: bool,
}

impl Prediction {
    pub fn storage_id(round_id: &RoundId, member_id: MemberId) -> String {
        format!("{}_{}", round_id, member_id)
    }

    pub fn pick(&self, index: usize) -> Option<&Pick> {
        self.selection.get(index).and_then(Option::as_ref)
    }

    /// A late submission scores zero hits unless it has been pardoned.
    pub fn counts_as_late(&self) -> bool {
        self.late && !self.pardoned
    }
}

/// Validation failures for reduced (doubles/triples) forms. The only hard
/// precondition the core enforces before persisting.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReductionError {
    #[error("a reduced selection must cover all 15 slots (got {0})")]
    WrongLength(usize),
    #[error("slot {slot} holds '{pick}', which is not a sign combination")]
    InvalidPick { slot: usize, pick: String },
    #[error("too many double slots: {0} (maximum 7)")]
    TooManyDoubles(usize),
    #[error("too many triple slots: {0} (maximum 4)")]
    TooManyTriples(usize),
    #[error("doubles and triples cannot be mixed on one form ({doubles} doubles, {triples} triples)")]
    Mixed { doubles: usize, triples: usize },
    #[error("the Pleno slot must carry a single sign")]
    PlenoMultiSign,
}

/// Checks the reduction-size invariant: at most 7 doubles with no triples,
/// or at most 4 triples with no doubles, and a single-sign Pleno.
pub fn validate_reduction(selection: &[Option<Pick>]) -> Result<(), ReductionError> {
    if selection.len() != SLOTS {
        return Err(ReductionError::WrongLength(selection.len()));
    }

    let mut doubles = 0;
    let mut triples = 0;

    for (slot, pick) in selection.iter().take(REGULAR_SLOTS).enumerate() {
        let Some(pick) = pick else { continue };
        match pick.sign_count() {
            Some(1) => {}
            Some(2) => doubles += 1,
            Some(3) => triples += 1,
            _ => {
                return Err(ReductionError::InvalidPick {
                    slot: slot + 1,
                    pick: pick.as_str().to_string(),
                })
            }
        }
    }

    if let Some(Some(pleno)) = selection.get(SLOTS - 1) {
        if matches!(pleno.sign_count(), Some(n) if n > 1) {
            return Err(ReductionError::PlenoMultiSign);
        }
    }

    if doubles > 0 && triples > 0 {
        return Err(ReductionError::Mixed { doubles, triples });
    }
    if doubles > 7 {
        return Err(ReductionError::TooManyDoubles(doubles));
    }
    if triples > 4 {
        return Err(ReductionError::TooManyTriples(triples));
    }

    Ok(())
}

const SPANISH_MONTHS: [&str; 12] = [
    "enero",
    "febrero",
    "marzo",
    "abril",
    "mayo",
    "junio",
    "julio",
    "agosto",
    "septiembre",
    "octubre",
    "noviembre",
    "diciembre",
];

/// Flexible round-date parsing: "24/08/2025", "24-08-2025", and Spanish
/// text dates like "24 de agosto de 2025". Failures yield `None`, which
/// downstream logic treats as "cannot determine" rather than an error.
pub fn parse_round_date(raw: &str) -> Option<NaiveDate> {
    if is_pending(raw) {
        return None;
    }

    let trimmed = raw.trim();

    // Numeric day/month/year with / or - separators.
    let numeric: Vec<&str> = trimmed
        .split(['/', '-'])
        .map(str::trim)
        .collect();
    if numeric.len() == 3 && numeric.iter().all(|p| p.chars().all(|c| c.is_ascii_digit())) {
        let day: u32 = numeric[0].parse().ok()?;
        let month: u32 = numeric[1].parse().ok()?;
        let year: i32 = numeric[2].parse().ok()?;
        return NaiveDate::from_ymd_opt(year, month, day);
    }

    // Spanish text dates. Strip parenthesized suffixes and connectors first.
    let mut clean = trimmed.to_lowercase();
    if let Some(open) = clean.find('(') {
        clean.truncate(open);
    }
    let clean = clean.replace(',', " ");
    let words: Vec<&str> = clean
        .split_whitespace()
        .filter(|w| *w != "de" && *w != "del")
        .collect();

    let month = SPANISH_MONTHS
        .iter()
        .position(|name| words.iter().any(|w| w.contains(name)))?
        as u32
        + 1;
    let day: u32 = words
        .iter()
        .find(|w| w.len() <= 2 && w.chars().all(|c| c.is_ascii_digit()))?
        .parse()
        .ok()?;
    let year: i32 = words
        .iter()
        .find(|w| w.len() == 4 && w.chars().all(|c| c.is_ascii_digit()))?
        .parse()
        .ok()?;

    NaiveDate::from_ymd_opt(year, month, day)
}
