// Recommended starters compared with the ones currently set.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::model::PlayerId;
use crate::scoring::ScoredPlayer;

use super::Lineup;

/// Starters as currently set on the platform: slot name to player id.
pub type CurrentLineup = BTreeMap<String, PlayerId>;

/// One slot whose recommended starter differs from the current one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupChange {
    pub slot: String,
    /// Who starts there now; `None` for an empty slot or a player the run
    /// knows nothing about.
    pub previous: Option<ScoredPlayer>,
    pub recommended: Option<ScoredPlayer>,
    /// Recommended score minus previous score, empty counting as 0.
    pub delta: f64,
}

/// Slot-by-slot differences between `recommended` and `current`, in
/// roster-shape order.
///
/// `scored` must hold every player of the run, excluded ones included, so an
/// OUT starter being benched still shows with its score.
pub fn lineup_changes(
    recommended: &Lineup,
    current: &CurrentLineup,
    scored: &HashMap<PlayerId, ScoredPlayer>,
) -> Vec<LineupChange> {
    for slot in current.keys() {
        if recommended.slot(slot).is_none() {
            warn!(slot = %slot, "current lineup names a slot the league does not have");
        }
    }

    let mut changes = Vec::new();
    for slot in &recommended.slots {
        let current_id = current.get(&slot.name);
        let recommended_id = slot.player.as_ref().map(|sp| &sp.player.id);
        if current_id == recommended_id {
            continue;
        }

        let previous = current_id.and_then(|id| {
            let found = scored.get(id).cloned();
            if found.is_none() {
                warn!(slot = %slot.name, player = %id, "current starter not in this run's players");
            }
            found
        });
        let value = |sp: &Option<ScoredPlayer>| sp.as_ref().map_or(0.0, ScoredPlayer::value);
        changes.push(LineupChange {
            slot: slot.name.clone(),
            delta: value(&slot.player) - value(&previous),
            previous,
            recommended: slot.player.clone(),
        });
    }
    changes
}
