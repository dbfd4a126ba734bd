// Roster shape: the league's ordered set of starting slots.

use serde::{Deserialize, Serialize};

use crate::model::Position;

/// One named starting slot and the positions it accepts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotSpec {
    pub name: String,
    pub accepts: Vec<Position>,
}

impl SlotSpec {
    pub fn new(name: impl Into<String>, accepts: &[Position]) -> Self {
        SlotSpec {
            name: name.into(),
            accepts: accepts.to_vec(),
        }
    }

    /// Whether the slot takes more than one position (FLEX-style).
    pub fn is_flex(&self) -> bool {
        self.accepts.len() > 1
    }
}

/// The ordered slot list loaded from league config. Read-only to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RosterShape {
    pub slots: Vec<SlotSpec>,
}

impl RosterShape {
    pub fn new(slots: Vec<SlotSpec>) -> Self {
        RosterShape { slots }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Slot indices in fill order: narrowest eligibility first, declaration
    /// order within equal widths.
    pub fn fill_order(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.slots.len()).collect();
        order.sort_by_key(|&i| (self.slots[i].accepts.len(), i));
        order
    }

    /// Standard one-QB shape: QB, RB1, RB2, WR1, WR2, FLEX, TE, K, DEF.
    pub fn standard() -> Self {
        use Position::*;
        RosterShape::new(vec![
            SlotSpec::new("QB", &[Quarterback]),
            SlotSpec::new("RB1", &[RunningBack]),
            SlotSpec::new("RB2", &[RunningBack]),
            SlotSpec::new("WR1", &[WideReceiver]),
            SlotSpec::new("WR2", &[WideReceiver]),
            SlotSpec::new("FLEX", &[RunningBack, WideReceiver, TightEnd]),
            SlotSpec::new("TE", &[TightEnd]),
            SlotSpec::new("K", &[Kicker]),
            SlotSpec::new("DEF", &[Defense]),
        ])
    }
}
