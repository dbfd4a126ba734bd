// The Eligibility Filter.
//
// OUT and BYE players are removed from every pool. QUESTIONABLE and DOUBTFUL
// players stay; their risk is already priced into the score. Free agents are
// kept apart for the waiver advisor.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::model::{InjuryStatus, PlayerId};
use crate::scoring::ScoredPlayer;

/// A player removed from consideration and the status that removed them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Exclusion {
    pub player_id: PlayerId,
    pub name: String,
    pub status: InjuryStatus,
    pub on_roster: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EligiblePools {
    /// On-roster players who can start this week.
    pub roster: Vec<ScoredPlayer>,
    /// Available free agents.
    pub free_agents: Vec<ScoredPlayer>,
    pub excluded: Vec<Exclusion>,
}

/// Split a scored pool for `week`.
pub fn filter_eligible(pool: Vec<ScoredPlayer>, week: u32) -> EligiblePools {
    let mut out = EligiblePools::default();
    for sp in pool {
        let status = sp.player.status_for_week(week);
        if status.is_unavailable() {
            debug!(player = %sp.player.name, %status, "excluded from week {week}");
            out.excluded.push(Exclusion {
                player_id: sp.player.id.clone(),
                name: sp.player.name.clone(),
                status,
                on_roster: sp.player.is_on_roster(),
            });
        } else if sp.player.is_on_roster() {
            out.roster.push(sp);
        } else {
            out.free_agents.push(sp);
        }
    }
    out
}
