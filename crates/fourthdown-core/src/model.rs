// Player identity, positions, and availability status.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Football positions used for roster slot assignment.
///
/// Flexible slots (FLEX, SUPER_FLEX) are not positions: they are slots in the
/// roster shape that accept several positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    Quarterback,
    RunningBack,
    WideReceiver,
    TightEnd,
    Kicker,
    Defense,
}

impl Position {
    pub const ALL: [Position; 6] = [
        Position::Quarterback,
        Position::RunningBack,
        Position::WideReceiver,
        Position::TightEnd,
        Position::Kicker,
        Position::Defense,
    ];

    /// Parse a position string into a Position enum.
    ///
    /// Handles the common provider spellings:
    /// - "DEF", "DST", "D/ST" -> Defense
    /// - "PK" -> Kicker
    pub fn from_str_pos(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "QB" => Some(Position::Quarterback),
            "RB" => Some(Position::RunningBack),
            "WR" => Some(Position::WideReceiver),
            "TE" => Some(Position::TightEnd),
            "K" | "PK" => Some(Position::Kicker),
            "DEF" | "DST" | "D/ST" => Some(Position::Defense),
            _ => None,
        }
    }

    /// Return the display string for this position.
    pub fn display_str(&self) -> &'static str {
        match self {
            Position::Quarterback => "QB",
            Position::RunningBack => "RB",
            Position::WideReceiver => "WR",
            Position::TightEnd => "TE",
            Position::Kicker => "K",
            Position::Defense => "DEF",
        }
    }

    /// Whether this position catches passes (reception props apply).
    pub fn is_pass_catcher(&self) -> bool {
        matches!(
            self,
            Position::RunningBack | Position::WideReceiver | Position::TightEnd
        )
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

impl TryFrom<String> for Position {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Position::from_str_pos(&value).ok_or_else(|| format!("unknown position `{value}`"))
    }
}

impl From<Position> for String {
    fn from(pos: Position) -> Self {
        pos.display_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Injury status
// ---------------------------------------------------------------------------

/// Game-availability designation for the requested week.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String", into = "String")]
pub enum InjuryStatus {
    #[default]
    Active,
    Questionable,
    Doubtful,
    Out,
    Bye,
}

impl InjuryStatus {
    /// Parse a provider injury designation.
    ///
    /// Injured-reserve style designations (IR, PUP, SUSP, NFI) are all OUT
    /// for lineup purposes. An empty string means no designation.
    pub fn from_str_status(s: &str) -> Option<Self> {
        match s.trim().to_uppercase().as_str() {
            "" | "ACTIVE" | "HEALTHY" | "A" => Some(InjuryStatus::Active),
            "QUESTIONABLE" | "Q" => Some(InjuryStatus::Questionable),
            "DOUBTFUL" | "D" => Some(InjuryStatus::Doubtful),
            "OUT" | "O" | "IR" | "PUP" | "PUP-R" | "SUSP" | "NFI" | "NA" => {
                Some(InjuryStatus::Out)
            }
            "BYE" => Some(InjuryStatus::Bye),
            _ => None,
        }
    }

    pub fn display_str(&self) -> &'static str {
        match self {
            InjuryStatus::Active => "ACTIVE",
            InjuryStatus::Questionable => "QUESTIONABLE",
            InjuryStatus::Doubtful => "DOUBTFUL",
            InjuryStatus::Out => "OUT",
            InjuryStatus::Bye => "BYE",
        }
    }

    /// Whether the designation makes a player unable to start this week.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, InjuryStatus::Out | InjuryStatus::Bye)
    }
}

impl fmt::Display for InjuryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_str())
    }
}

impl TryFrom<String> for InjuryStatus {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        InjuryStatus::from_str_status(&value)
            .ok_or_else(|| format!("unknown injury status `{value}`"))
    }
}

impl From<InjuryStatus> for String {
    fn from(status: InjuryStatus) -> Self {
        status.display_str().to_string()
    }
}

// ---------------------------------------------------------------------------
// Player
// ---------------------------------------------------------------------------

/// Roster provider player key (e.g. Yahoo `nfl.p.30123`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        PlayerId(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Whether the player belongs to the user's fantasy team.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RosterStatus {
    #[default]
    OnRoster,
    FreeAgent,
}

/// A player as reported by the roster provider for one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// NFL team abbreviation as reported by the roster provider.
    pub team: String,
    pub position: Position,
    /// Additional positions the league lets this player fill. The player's
    /// own position is always eligible and need not be repeated here.
    #[serde(default)]
    pub extra_positions: Vec<Position>,
    #[serde(default)]
    pub roster_status: RosterStatus,
    #[serde(default)]
    pub injury_status: InjuryStatus,
    /// Provider-reported chance of playing (0.0-1.0), if any.
    #[serde(default)]
    pub play_probability: Option<f64>,
    #[serde(default)]
    pub bye_week: Option<u32>,
}

impl Player {
    /// All positions this player may fill, own position first, deduplicated.
    pub fn eligible_positions(&self) -> Vec<Position> {
        let mut positions = vec![self.position];
        for &pos in &self.extra_positions {
            if !positions.contains(&pos) {
                positions.push(pos);
            }
        }
        positions
    }

    /// Whether any of this player's eligible positions is in `accepted`.
    pub fn can_fill(&self, accepted: &[Position]) -> bool {
        accepted.contains(&self.position)
            || self.extra_positions.iter().any(|p| accepted.contains(p))
    }

    pub fn is_on_roster(&self) -> bool {
        self.roster_status == RosterStatus::OnRoster
    }

    /// Effective availability for `week`, folding the bye week into the
    /// injury designation.
    pub fn status_for_week(&self, week: u32) -> InjuryStatus {
        if self.bye_week == Some(week) {
            InjuryStatus::Bye
        } else {
            self.injury_status
        }
    }
}
