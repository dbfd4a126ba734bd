// The Slot Assigner.
//
// Greedy fill in `RosterShape::fill_order`: strict single-position slots
// first, then FLEX-style slots from narrowest to widest. Each slot takes the
// highest-scoring unassigned candidate it accepts, ties broken by player id.
// This is an approximation of the optimal matching: a flex slot can never
// steal the only candidate for a later strict slot, but greedy and optimal can
// still disagree when eligibility overlaps across several flex slots.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::debug;

use crate::scoring::ScoredPlayer;

use super::{Lineup, LineupSlot, RosterShape};

/// Best-first: higher score, then lower player id.
fn rank(a: &ScoredPlayer, b: &ScoredPlayer) -> Ordering {
    b.value()
        .total_cmp(&a.value())
        .then_with(|| a.player.id.cmp(&b.player.id))
}

/// Fill `shape` from `pool`. The pool must already be eligibility-filtered;
/// a player appearing twice in it is only considered once.
pub fn assign(pool: &[ScoredPlayer], shape: &RosterShape) -> Lineup {
    let mut candidates: Vec<&ScoredPlayer> = pool.iter().collect();
    candidates.sort_by(|a, b| rank(a, b));
    let mut seen = HashSet::new();
    candidates.retain(|sp| seen.insert(sp.player.id.clone()));

    let mut taken = vec![false; candidates.len()];
    let mut filled: Vec<Option<ScoredPlayer>> = vec![None; shape.len()];

    for slot_idx in shape.fill_order() {
        let slot = &shape.slots[slot_idx];
        // Candidates are pre-sorted best-first, so the first fit is the best.
        let pick = candidates
            .iter()
            .enumerate()
            .find(|(i, sp)| !taken[*i] && sp.player.can_fill(&slot.accepts));
        match pick {
            Some((i, sp)) => {
                taken[i] = true;
                filled[slot_idx] = Some((*sp).clone());
            }
            None => debug!(slot = %slot.name, "no eligible candidate, leaving slot empty"),
        }
    }

    let slots = shape
        .slots
        .iter()
        .zip(filled)
        .map(|(spec, player)| LineupSlot {
            name: spec.name.clone(),
            accepts: spec.accepts.clone(),
            player,
        })
        .collect();

    let bench = candidates
        .iter()
        .zip(&taken)
        .filter(|(_, t)| !**t)
        .map(|(sp, _)| (*sp).clone())
        .collect();

    Lineup { slots, bench }
}
