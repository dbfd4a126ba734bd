// Weekly lineups and the slot assigner.

pub mod assign;
pub mod changes;
pub mod shape;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::{PlayerId, Position};
use crate::scoring::ScoredPlayer;

pub use assign::assign;
pub use changes::{lineup_changes, CurrentLineup, LineupChange};
pub use shape::{RosterShape, SlotSpec};

/// Starters scoring below this confidence count as shaky.
const SHAKY_CONFIDENCE: f64 = 0.6;

/// How much the week's starters rest on thin or doubtful data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn display_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Medium => "MEDIUM",
            RiskLevel::High => "HIGH",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_str())
    }
}

/// A starting slot and whoever fills it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupSlot {
    pub name: String,
    pub accepts: Vec<Position>,
    /// `None` when no eligible candidate was left.
    pub player: Option<ScoredPlayer>,
}

/// One week's recommended starters, in roster-shape order, plus the bench.
///
/// No player appears in more than one slot, and every filled slot's player
/// can play one of the slot's accepted positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Lineup {
    pub slots: Vec<LineupSlot>,
    /// Eligible roster players not starting, best first.
    pub bench: Vec<ScoredPlayer>,
}

impl Lineup {
    pub fn slot(&self, name: &str) -> Option<&LineupSlot> {
        self.slots.iter().find(|s| s.name == name)
    }

    /// The player in slot `name`, if the slot exists and is filled.
    pub fn starter(&self, name: &str) -> Option<&ScoredPlayer> {
        self.slot(name).and_then(|s| s.player.as_ref())
    }

    pub fn starters(&self) -> impl Iterator<Item = &ScoredPlayer> {
        self.slots.iter().filter_map(|s| s.player.as_ref())
    }

    pub fn empty_slots(&self) -> impl Iterator<Item = &LineupSlot> {
        self.slots.iter().filter(|s| s.player.is_none())
    }

    pub fn filled_count(&self) -> usize {
        self.starters().count()
    }

    pub fn total_score(&self) -> f64 {
        self.starters().map(ScoredPlayer::value).sum()
    }

    pub fn is_starting(&self, id: &PlayerId) -> bool {
        self.starters().any(|sp| &sp.player.id == id)
    }

    /// Mean starter confidence, 0.0 with nobody starting.
    pub fn average_confidence(&self) -> f64 {
        let n = self.filled_count();
        if n == 0 {
            return 0.0;
        }
        self.starters().map(ScoredPlayer::confidence).sum::<f64>() / n as f64
    }

    /// LOW needs an average of at least 0.8 with at most a fifth of the
    /// starters shaky; MEDIUM needs 0.6 and at most two fifths. An empty
    /// lineup is HIGH.
    pub fn risk_level(&self) -> RiskLevel {
        let n = self.filled_count();
        if n == 0 {
            return RiskLevel::High;
        }
        let shaky = self
            .starters()
            .filter(|sp| sp.confidence() < SHAKY_CONFIDENCE)
            .count();
        let shaky_ratio = shaky as f64 / n as f64;
        let avg = self.average_confidence();
        if avg >= 0.8 && shaky_ratio <= 0.2 {
            RiskLevel::Low
        } else if avg >= 0.6 && shaky_ratio <= 0.4 {
            RiskLevel::Medium
        } else {
            RiskLevel::High
        }
    }
}
