// The Waiver Advisor: free-agent pickups that beat a current starter.
//
// Reports only. Nothing here touches the roster.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::lineup::{Lineup, LineupSlot};
use crate::model::PlayerId;
use crate::scoring::ScoredPlayer;

/// Waiver policy from `[waiver]` in strategy.toml.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiverPolicy {
    /// A suggestion needs a score delta strictly greater than this.
    pub margin: f64,
    pub max_suggestions: usize,
    /// Slot names never evaluated (e.g. K, DEF).
    #[serde(default)]
    pub skip_slots: Vec<String>,
    /// Starters scoring at or above this are never challenged.
    #[serde(default)]
    pub protect_score_above: Option<f64>,
    /// Let an empty starting slot (baseline 0) attract a suggestion.
    #[serde(default)]
    pub include_empty_slots: bool,
}

impl Default for WaiverPolicy {
    fn default() -> Self {
        WaiverPolicy {
            margin: 1.0,
            max_suggestions: 5,
            skip_slots: Vec::new(),
            protect_score_above: None,
            include_empty_slots: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaiverSuggestion {
    pub slot: String,
    /// Current starter, `None` for an empty slot.
    pub current: Option<ScoredPlayer>,
    pub candidate: ScoredPlayer,
    /// Candidate score minus current score.
    pub delta: f64,
    /// Rostered player to release for the pickup: the weakest bench player
    /// not already named by a bigger suggestion, or the displaced starter
    /// when it scores lower. `None` only for an empty slot with no bench.
    #[serde(default)]
    pub drop_candidate: Option<ScoredPlayer>,
}

/// One free agent measured against one slot.
struct Pairing<'a> {
    slot_idx: usize,
    slot: &'a LineupSlot,
    candidate: &'a ScoredPlayer,
    delta: f64,
}

/// The value a free agent must beat in `slot`, or `None` when the slot is
/// not open to suggestions.
fn baseline(slot: &LineupSlot, policy: &WaiverPolicy) -> Option<f64> {
    if policy
        .skip_slots
        .iter()
        .any(|s| s.eq_ignore_ascii_case(&slot.name))
    {
        return None;
    }
    match &slot.player {
        Some(starter) => {
            if policy
                .protect_score_above
                .is_some_and(|t| starter.value() >= t)
            {
                debug!(slot = %slot.name, player = %starter.player.name, "starter protected");
                return None;
            }
            Some(starter.value())
        }
        None if policy.include_empty_slots => Some(0.0),
        None => None,
    }
}

/// Rank free agents against the lineup's starters.
///
/// `free_agents` must already be eligibility-filtered. Every (slot, free
/// agent) pair that clears the margin is a contender; contenders are taken
/// largest delta first, and each slot and each free agent is used at most
/// once. A slot whose favorite is claimed elsewhere falls back to its next
/// best unclaimed free agent.
pub fn compute_waiver_suggestions(
    lineup: &Lineup,
    free_agents: &[ScoredPlayer],
    policy: &WaiverPolicy,
) -> Vec<WaiverSuggestion> {
    let mut pairings = Vec::new();
    for (slot_idx, slot) in lineup.slots.iter().enumerate() {
        let Some(base) = baseline(slot, policy) else {
            continue;
        };
        pairings.extend(
            free_agents
                .iter()
                .filter(|fa| fa.player.can_fill(&slot.accepts))
                .map(|fa| Pairing {
                    slot_idx,
                    slot,
                    candidate: fa,
                    delta: fa.value() - base,
                })
                .filter(|p| p.delta > policy.margin),
        );
    }
    pairings.sort_by(|a, b| {
        b.delta
            .total_cmp(&a.delta)
            .then_with(|| a.slot_idx.cmp(&b.slot_idx))
            .then_with(|| a.candidate.player.id.cmp(&b.candidate.player.id))
    });

    let mut used_slots = HashSet::new();
    let mut claimed: HashSet<&PlayerId> = HashSet::new();
    // Bench players plus starters displaced by earlier suggestions.
    let mut spare: Vec<&ScoredPlayer> = lineup.bench.iter().collect();
    let mut suggestions = Vec::new();

    for pairing in pairings {
        if suggestions.len() == policy.max_suggestions {
            break;
        }
        if used_slots.contains(&pairing.slot_idx)
            || claimed.contains(&pairing.candidate.player.id)
        {
            continue;
        }
        used_slots.insert(pairing.slot_idx);
        claimed.insert(&pairing.candidate.player.id);

        let displaced = pairing.slot.player.as_ref();
        let drop_candidate = spare.iter().copied().chain(displaced).min_by(|a, b| {
            a.value()
                .total_cmp(&b.value())
                .then_with(|| a.player.id.cmp(&b.player.id))
        });
        if let Some(dropped) = drop_candidate {
            spare.retain(|s| s.player.id != dropped.player.id);
        }
        if let Some(starter) = displaced {
            if drop_candidate.is_some_and(|d| d.player.id != starter.player.id) {
                spare.push(starter);
            }
        }

        debug!(
            slot = %pairing.slot.name,
            candidate = %pairing.candidate.player.name,
            delta = pairing.delta,
            "waiver suggestion"
        );
        suggestions.push(WaiverSuggestion {
            slot: pairing.slot.name.clone(),
            current: pairing.slot.player.clone(),
            candidate: pairing.candidate.clone(),
            delta: pairing.delta,
            drop_candidate: drop_candidate.cloned(),
        });
    }
    suggestions
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lineup::{assign, RosterShape, SlotSpec};
    use crate::model::{InjuryStatus, Player, Position, RosterStatus};
    use crate::scoring::Score;

    fn sp(id: &str, pos: Position, roster: RosterStatus, total: f64) -> ScoredPlayer {
        ScoredPlayer {
            player: Player {
                id: PlayerId::new(id),
                name: id.to_uppercase(),
                team: "MIN".into(),
                position: pos,
                extra_positions: vec![],
                roster_status: roster,
                injury_status: InjuryStatus::Active,
                play_probability: None,
                bye_week: None,
            },
            score: Score {
                total,
                ..Score::default()
            },
        }
    }

    fn fa(id: &str, pos: Position, total: f64) -> ScoredPlayer {
        sp(id, pos, RosterStatus::FreeAgent, total)
    }

    fn shape() -> RosterShape {
        RosterShape::new(vec![
            SlotSpec::new("WR1", &[Position::WideReceiver]),
            SlotSpec::new("WR2", &[Position::WideReceiver]),
            SlotSpec::new("K", &[Position::Kicker]),
        ])
    }

    fn lineup() -> Lineup {
        use RosterStatus::OnRoster;
        assign(
            &[
                sp("wr10", Position::WideReceiver, OnRoster, 10.0),
                sp("wr2", Position::WideReceiver, OnRoster, 2.0),
            ],
            &shape(),
        )
    }

    fn drop_id(s: &WaiverSuggestion) -> Option<&str> {
        s.drop_candidate.as_ref().map(|d| d.player.id.as_str())
    }

    #[test]
    fn delta_must_exceed_margin() {
        let fas = vec![fa("fa3", Position::WideReceiver, 3.0)];
        let policy = WaiverPolicy {
            margin: 1.0,
            ..WaiverPolicy::default()
        };
        assert!(compute_waiver_suggestions(&lineup(), &fas, &policy).is_empty());

        let fas = vec![fa("fa4", Position::WideReceiver, 4.0)];
        let out = compute_waiver_suggestions(&lineup(), &fas, &policy);
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].slot, "WR2");
        assert_eq!(out[0].delta, 2.0);
    }

    #[test]
    fn free_agent_suggested_once_at_largest_delta() {
        let fas = vec![fa("fa15", Position::WideReceiver, 15.0)];
        let out = compute_waiver_suggestions(&lineup(), &fas, &WaiverPolicy::default());
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].slot, "WR2");
        assert_eq!(out[0].delta, 13.0);
    }

    #[test]
    fn slot_falls_back_when_its_favorite_is_claimed() {
        // Both free agents would rather replace WR2; WR1 still gets fa14.
        let fas = vec![
            fa("fa15", Position::WideReceiver, 15.0),
            fa("fa14", Position::WideReceiver, 14.0),
        ];
        let out = compute_waiver_suggestions(&lineup(), &fas, &WaiverPolicy::default());
        let picks: Vec<(&str, &str, f64)> = out
            .iter()
            .map(|s| (s.slot.as_str(), s.candidate.player.id.as_str(), s.delta))
            .collect();
        assert_eq!(picks, vec![("WR2", "fa15", 13.0), ("WR1", "fa14", 4.0)]);
    }

    #[test]
    fn sorted_by_delta_and_truncated() {
        let fas = vec![
            fa("fa15", Position::WideReceiver, 15.0),
            fa("fa12", Position::WideReceiver, 12.0),
            fa("k9", Position::Kicker, 9.0),
        ];
        let policy = WaiverPolicy {
            include_empty_slots: true,
            ..WaiverPolicy::default()
        };
        let out = compute_waiver_suggestions(&lineup(), &fas, &policy);
        let deltas: Vec<f64> = out.iter().map(|s| s.delta).collect();
        assert_eq!(deltas, vec![13.0, 9.0, 2.0]);
        assert!(out[1].current.is_none());
        assert_eq!(out[2].candidate.player.id.as_str(), "fa12");

        let policy = WaiverPolicy {
            include_empty_slots: true,
            max_suggestions: 1,
            ..WaiverPolicy::default()
        };
        assert_eq!(compute_waiver_suggestions(&lineup(), &fas, &policy).len(), 1);
    }

    #[test]
    fn skip_and_protect_rules() {
        let fas = vec![
            fa("fa30", Position::WideReceiver, 30.0),
            fa("k9", Position::Kicker, 9.0),
        ];
        let policy = WaiverPolicy {
            skip_slots: vec!["wr2".into(), "K".into()],
            protect_score_above: Some(10.0),
            include_empty_slots: true,
            ..WaiverPolicy::default()
        };
        assert!(compute_waiver_suggestions(&lineup(), &fas, &policy).is_empty());
    }

    #[test]
    fn weakest_bench_player_is_dropped_first() {
        use RosterStatus::OnRoster;
        let lineup = assign(
            &[
                sp("wr10", Position::WideReceiver, OnRoster, 10.0),
                sp("wr2", Position::WideReceiver, OnRoster, 2.0),
                sp("k5", Position::Kicker, OnRoster, 5.0),
                sp("k1", Position::Kicker, OnRoster, 1.0),
            ],
            &shape(),
        );
        assert_eq!(lineup.bench.len(), 1);

        let fas = vec![
            fa("fa15", Position::WideReceiver, 15.0),
            fa("fa14", Position::WideReceiver, 14.0),
        ];
        let out = compute_waiver_suggestions(&lineup, &fas, &WaiverPolicy::default());
        assert_eq!(out.len(), 2);
        // The benched kicker goes first, then the WR2 starter that fa15
        // pushed out, never the better WR1 starter.
        assert_eq!(drop_id(&out[0]), Some("k1"));
        assert_eq!(drop_id(&out[1]), Some("wr2"));
    }

    #[test]
    fn displaced_starter_is_dropped_without_a_bench() {
        let fas = vec![fa("fa4", Position::WideReceiver, 4.0)];
        let out = compute_waiver_suggestions(&lineup(), &fas, &WaiverPolicy::default());
        assert_eq!(drop_id(&out[0]), Some("wr2"));

        // An empty slot with nobody on the bench needs no release.
        let fas = vec![fa("k9", Position::Kicker, 9.0)];
        let policy = WaiverPolicy {
            include_empty_slots: true,
            ..WaiverPolicy::default()
        };
        let out = compute_waiver_suggestions(&lineup(), &fas, &policy);
        assert_eq!(out[0].slot, "K");
        assert_eq!(drop_id(&out[0]), None);
    }
}
