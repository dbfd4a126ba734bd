// Cross-provider player identity alignment.
//
// Resolution order: exact roster id, then exact folded name plus canonical
// team. Anything less exact is left unlinked rather than guessed.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fmt;

use serde::Serialize;

use crate::model::{Player, PlayerId};
use crate::signals::PlayerRef;
use crate::teams::{canonical_team, fold};

/// Key for a record that could not be tied to a known player.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct UnlinkedKey {
    /// Folded name.
    pub name: String,
    /// Canonical team(s), `/`-joined when the provider reported several, or
    /// empty when it reported none.
    pub team: String,
}

impl fmt::Display for UnlinkedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.team.is_empty() {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{} ({})", self.name, self.team)
        }
    }
}

/// Why a reference stayed unlinked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnmatchedReason {
    NoTeam,
    NoCandidate,
    Ambiguous(usize),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Alignment {
    Linked(PlayerId),
    Unlinked(UnlinkedKey, UnmatchedReason),
}

/// Lookup tables over the run's known players (roster plus free agents).
#[derive(Debug, Default)]
pub struct PlayerIndex {
    ids: HashSet<PlayerId>,
    by_name_team: HashMap<(String, String), Vec<PlayerId>>,
    by_team: BTreeMap<String, Vec<PlayerId>>,
}

impl PlayerIndex {
    pub fn build(players: &[Player]) -> Self {
        let mut index = PlayerIndex::default();
        for p in players {
            if !index.ids.insert(p.id.clone()) {
                continue;
            }
            let team = canonical_team(&p.team);
            index
                .by_name_team
                .entry((fold(&p.name), team.clone()))
                .or_default()
                .push(p.id.clone());
            index.by_team.entry(team).or_default().push(p.id.clone());
        }
        index
    }

    pub fn contains(&self, id: &PlayerId) -> bool {
        self.ids.contains(id)
    }

    /// Known players on `team`, in insertion order.
    pub fn players_on_team(&self, team: &str) -> &[PlayerId] {
        self.by_team
            .get(&canonical_team(team))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn resolve(&self, player: &PlayerRef) -> Alignment {
        if let Some(id) = &player.id {
            if self.ids.contains(id) {
                return Alignment::Linked(id.clone());
            }
        }

        let name = fold(&player.name);
        let mut teams: Vec<String> = player.teams.iter().map(|t| canonical_team(t)).collect();
        teams.sort();
        teams.dedup();
        let key = UnlinkedKey {
            name: name.clone(),
            team: teams.join("/"),
        };

        if teams.is_empty() {
            return Alignment::Unlinked(key, UnmatchedReason::NoTeam);
        }

        let mut candidates: Vec<&PlayerId> = teams
            .iter()
            .filter_map(|t| self.by_name_team.get(&(name.clone(), t.clone())))
            .flatten()
            .collect();
        candidates.sort();
        candidates.dedup();

        match candidates.as_slice() {
            [only] => Alignment::Linked((*only).clone()),
            [] => Alignment::Unlinked(key, UnmatchedReason::NoCandidate),
            many => Alignment::Unlinked(key, UnmatchedReason::Ambiguous(many.len())),
        }
    }
}
