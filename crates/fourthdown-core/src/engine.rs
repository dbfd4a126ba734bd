// The scoring-and-assignment engine: score -> filter -> assign -> advise.
//
// Everything here is synchronous and pure over already-fetched data.

use std::collections::HashMap;

use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::eligibility::{filter_eligible, Exclusion};
use crate::lineup::{
    assign, lineup_changes, CurrentLineup, Lineup, LineupChange, RiskLevel, RosterShape,
};
use crate::model::{Player, PlayerId, RosterStatus};
use crate::scoring::{score_pool, ScoredPlayer, ScoringRules};
use crate::signals::SignalRecord;
use crate::waiver::{self, WaiverPolicy, WaiverSuggestion};

/// One week's recommendation.
#[derive(Debug, Clone, Serialize)]
pub struct WeeklyPlan {
    pub week: u32,
    pub lineup: Lineup,
    pub waiver: Vec<WaiverSuggestion>,
    /// Roster players and free agents removed as OUT or BYE.
    pub excluded: Vec<Exclusion>,
    pub risk: RiskLevel,
    /// Mean starter confidence.
    pub confidence: f64,
    /// Differences from the starters currently set; `None` when the roster
    /// source did not report them.
    pub changes: Option<Vec<LineupChange>>,
}

/// Copies of `players` all marked `status`, whatever the source reported.
fn with_roster_status(players: &[Player], status: RosterStatus) -> Vec<Player> {
    players
        .iter()
        .cloned()
        .map(|mut p| {
            p.roster_status = status;
            p
        })
        .collect()
}

#[derive(Debug, Clone)]
pub struct Engine {
    pub shape: RosterShape,
    pub scoring: ScoringRules,
    pub waiver: WaiverPolicy,
}

impl Engine {
    pub fn new(shape: RosterShape, scoring: ScoringRules, waiver: WaiverPolicy) -> Self {
        Self {
            shape,
            scoring,
            waiver,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.shape.clone(),
            config.strategy.scoring.clone(),
            config.strategy.waiver.clone(),
        )
    }

    /// Best lineup from `roster` for `week`. Players marked as free agents
    /// are ignored here.
    pub fn compute_lineup(
        &self,
        roster: &[Player],
        signals: &HashMap<PlayerId, SignalRecord>,
        week: u32,
    ) -> Lineup {
        let pools = filter_eligible(score_pool(roster, signals, &self.scoring), week);
        assign(&pools.roster, &self.shape)
    }

    /// Free-agent pickups that beat a starter in `lineup`. Every player in
    /// `free_agents` is treated as available, whatever its roster status.
    pub fn compute_waiver_suggestions(
        &self,
        lineup: &Lineup,
        free_agents: &[Player],
        signals: &HashMap<PlayerId, SignalRecord>,
        week: u32,
    ) -> Vec<WaiverSuggestion> {
        let available = with_roster_status(free_agents, RosterStatus::FreeAgent);
        let pools = filter_eligible(score_pool(&available, signals, &self.scoring), week);
        let candidates: Vec<_> = pools
            .free_agents
            .into_iter()
            .filter(|fa| !lineup.is_starting(&fa.player.id))
            .collect();
        waiver::compute_waiver_suggestions(lineup, &candidates, &self.waiver)
    }

    /// Lineup, waiver suggestions, exclusions and risk in one pass.
    ///
    /// Membership comes from which list a player arrives in: `roster` players
    /// are treated as rostered and `free_agents` as available, whatever their
    /// own roster status says. An empty `current` skips the change list.
    pub fn plan_week(
        &self,
        roster: &[Player],
        free_agents: &[Player],
        signals: &HashMap<PlayerId, SignalRecord>,
        current: &CurrentLineup,
        week: u32,
    ) -> WeeklyPlan {
        let mut everyone = with_roster_status(roster, RosterStatus::OnRoster);
        everyone.extend(with_roster_status(free_agents, RosterStatus::FreeAgent));
        let scored = score_pool(&everyone, signals, &self.scoring);
        let by_id: HashMap<PlayerId, ScoredPlayer> = scored
            .iter()
            .filter(|sp| sp.player.is_on_roster())
            .map(|sp| (sp.player.id.clone(), sp.clone()))
            .collect();
        let pools = filter_eligible(scored, week);

        let lineup = assign(&pools.roster, &self.shape);
        let suggestions =
            waiver::compute_waiver_suggestions(&lineup, &pools.free_agents, &self.waiver);
        let changes =
            (!current.is_empty()).then(|| lineup_changes(&lineup, current, &by_id));
        let risk = lineup.risk_level();
        let confidence = lineup.average_confidence();

        info!(
            week,
            starters = lineup.filled_count(),
            slots = self.shape.len(),
            total = lineup.total_score(),
            %risk,
            changes = changes.as_ref().map_or(0, Vec::len),
            suggestions = suggestions.len(),
            excluded = pools.excluded.len(),
            "weekly plan computed"
        );

        WeeklyPlan {
            week,
            lineup,
            waiver: suggestions,
            excluded: pools.excluded,
            risk,
            confidence,
            changes,
        }
    }
}
