// Signal vocabulary, per-player signal records, and provider payloads.

pub mod identity;
pub mod normalizer;

use std::collections::BTreeMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::PlayerId;

// ---------------------------------------------------------------------------
// Signal names
// ---------------------------------------------------------------------------

/// One externally-sourced numeric indicator about a player's week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Signal {
    /// Over/under for the player's game.
    GameTotal,
    /// Point spread from the player's team's side; negative means favored.
    Spread,
    /// Anytime-touchdown American price.
    TdOdds,
    ReceptionLine,
    RushYardsLine,
    /// Over 1.5 passing TDs American price.
    PassTdsOdds,
    PassYardsLine,
    CompletionsLine,
    AttemptsLine,
    ProjectedPoints,
    /// Miles per hour at kickoff.
    WindSpeed,
    /// 0.0-1.0.
    PrecipitationChance,
    /// Degrees Fahrenheit.
    Temperature,
    /// 0.0-1.0 chance of suiting up; present only for injury-designated players.
    PlayProbability,
}

/// How repeated reports of one signal from a single provider collapse.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    /// Highest line across bookmakers.
    Max,
    /// Most favorable (lowest) price across bookmakers.
    Min,
    /// First report wins.
    First,
}

impl Signal {
    pub const ALL: [Signal; 14] = [
        Signal::GameTotal,
        Signal::Spread,
        Signal::TdOdds,
        Signal::ReceptionLine,
        Signal::RushYardsLine,
        Signal::PassTdsOdds,
        Signal::PassYardsLine,
        Signal::CompletionsLine,
        Signal::AttemptsLine,
        Signal::ProjectedPoints,
        Signal::WindSpeed,
        Signal::PrecipitationChance,
        Signal::Temperature,
        Signal::PlayProbability,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Signal::GameTotal => "game_total",
            Signal::Spread => "spread",
            Signal::TdOdds => "td_odds",
            Signal::ReceptionLine => "reception_line",
            Signal::RushYardsLine => "rush_yards_line",
            Signal::PassTdsOdds => "pass_tds_odds",
            Signal::PassYardsLine => "pass_yards_line",
            Signal::CompletionsLine => "completions_line",
            Signal::AttemptsLine => "attempts_line",
            Signal::ProjectedPoints => "projected_points",
            Signal::WindSpeed => "wind_speed",
            Signal::PrecipitationChance => "precipitation_chance",
            Signal::Temperature => "temperature",
            Signal::PlayProbability => "play_probability",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Signal::ALL.into_iter().find(|s| s.name() == name)
    }

    pub fn aggregation(&self) -> Aggregation {
        match self {
            Signal::ReceptionLine
            | Signal::RushYardsLine
            | Signal::PassYardsLine
            | Signal::CompletionsLine
            | Signal::AttemptsLine
            | Signal::ProjectedPoints => Aggregation::Max,
            Signal::TdOdds | Signal::PassTdsOdds => Aggregation::Min,
            Signal::GameTotal
            | Signal::Spread
            | Signal::WindSpeed
            | Signal::PrecipitationChance
            | Signal::Temperature
            | Signal::PlayProbability => Aggregation::First,
        }
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// SignalRecord
// ---------------------------------------------------------------------------

/// Per-player mapping from signal to value. A missing key means the provider
/// had no data, which is distinct from a reported zero.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SignalRecord {
    values: BTreeMap<Signal, f64>,
}

impl SignalRecord {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, signal: Signal) -> Option<f64> {
        self.values.get(&signal).copied()
    }

    pub fn contains(&self, signal: Signal) -> bool {
        self.values.contains_key(&signal)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Set a value unconditionally. Non-finite values are ignored so a bad
    /// provider number can never poison a score.
    pub fn set(&mut self, signal: Signal, value: f64) {
        if value.is_finite() {
            self.values.insert(signal, value);
        }
    }

    /// Fold another report of `signal` from the same provider into this
    /// record using the signal's aggregation policy.
    pub fn aggregate(&mut self, signal: Signal, value: f64) {
        if !value.is_finite() {
            return;
        }
        let merged = match (self.get(signal), signal.aggregation()) {
            (None, _) => value,
            (Some(old), Aggregation::Max) => old.max(value),
            (Some(old), Aggregation::Min) => old.min(value),
            (Some(old), Aggregation::First) => old,
        };
        self.values.insert(signal, merged);
    }

    /// Copy every field of `other` that is absent here. Present fields are
    /// never overwritten and never removed.
    pub fn fill_from(&mut self, other: &SignalRecord) {
        for (&signal, &value) in &other.values {
            self.values.entry(signal).or_insert(value);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (Signal, f64)> + '_ {
        self.values.iter().map(|(&s, &v)| (s, v))
    }
}

impl FromIterator<(Signal, f64)> for SignalRecord {
    fn from_iter<I: IntoIterator<Item = (Signal, f64)>>(iter: I) -> Self {
        let mut record = SignalRecord::new();
        for (signal, value) in iter {
            record.set(signal, value);
        }
        record
    }
}

// ---------------------------------------------------------------------------
// Provider payloads
// ---------------------------------------------------------------------------

/// How a provider identifies the player a row is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRef {
    /// Roster-provider id, when the provider shares ids with it.
    #[serde(default)]
    pub id: Option<PlayerId>,
    pub name: String,
    /// Teams the player may belong to. Props from a game carry both sides.
    #[serde(default)]
    pub teams: Vec<String>,
}

impl PlayerRef {
    pub fn named(name: impl Into<String>, team: impl Into<String>) -> Self {
        PlayerRef {
            id: None,
            name: name.into(),
            teams: vec![team.into()],
        }
    }
}

/// What a row's values apply to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RowTarget {
    Player(PlayerRef),
    /// Every player on the team (game lines, weather).
    Team(String),
}

/// One provider observation, week-tagged so the Normalizer can discard
/// anything outside the requested window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SignalRow {
    pub target: RowTarget,
    /// Kickoff of the game the row describes.
    #[serde(default)]
    pub kickoff: Option<DateTime<Utc>>,
    /// Week number the provider attributed the row to.
    #[serde(default)]
    pub week: Option<u32>,
    pub values: Vec<(Signal, f64)>,
}

/// Everything one provider returned for one week.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderPayload {
    pub provider: String,
    pub rows: Vec<SignalRow>,
}

impl ProviderPayload {
    pub fn new(provider: impl Into<String>) -> Self {
        ProviderPayload {
            provider: provider.into(),
            rows: Vec::new(),
        }
    }
}
