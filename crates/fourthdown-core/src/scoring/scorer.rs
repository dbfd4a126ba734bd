// The Player Scorer: a pure function from one signal record to one score.

use std::collections::HashMap;

use crate::model::{Player, PlayerId, Position};
use crate::signals::{Signal, SignalRecord};

use super::{Contribution, Score, ScoredPlayer, ScoringRules};

/// Score one player's record.
///
/// Rules are applied in configured order and every applicable rule whose
/// signal is present contributes independently. Absent signals contribute
/// nothing, so an empty record scores exactly 0.
pub fn score(record: &SignalRecord, position: Position, rules: &ScoringRules) -> Score {
    let mut total = 0.0;
    let mut contributions = Vec::new();

    for rule in &rules.rules {
        if !rule.applies_to(position) {
            continue;
        }
        let Some(value) = record.get(rule.signal) else {
            continue;
        };
        let points = rule.points_for(value) * rules.weights.multiplier(rule.category);
        if points == 0.0 {
            continue;
        }
        total += points;
        contributions.push(Contribution {
            signal: rule.signal,
            category: rule.category,
            value,
            points,
        });
    }

    Score {
        total,
        contributions,
        confidence: confidence(record),
    }
}

// ---------------------------------------------------------------------------
// Confidence
// ---------------------------------------------------------------------------

// Shares are in hundredths so a fully covered record lands exactly on 1.0.
const BASE_CONFIDENCE: u32 = 30;

/// Signal groups and what each adds to confidence when any member is present.
const COVERAGE: [(&[Signal], u32); 4] = [
    (&[Signal::GameTotal, Signal::Spread], 15),
    (
        &[
            Signal::TdOdds,
            Signal::ReceptionLine,
            Signal::RushYardsLine,
            Signal::PassTdsOdds,
            Signal::PassYardsLine,
            Signal::CompletionsLine,
            Signal::AttemptsLine,
        ],
        15,
    ),
    (&[Signal::ProjectedPoints], 20),
    (
        &[
            Signal::WindSpeed,
            Signal::PrecipitationChance,
            Signal::Temperature,
        ],
        10,
    ),
];

/// A player with no injury designation carries no availability doubt.
const CLEAR_HEALTH: u32 = 10;

/// How completely `record` covers the signals a score can draw on, 0.0-1.0.
///
/// An empty record for a healthy player sits at 0.4; game lines, player
/// props, a projection and weather each raise it, and an injury designation
/// withholds the health share.
pub fn confidence(record: &SignalRecord) -> f64 {
    let covered: u32 = COVERAGE
        .iter()
        .filter(|(group, _)| group.iter().any(|&s| record.contains(s)))
        .map(|(_, share)| share)
        .sum();
    let health = if record.contains(Signal::PlayProbability) {
        0
    } else {
        CLEAR_HEALTH
    };
    f64::from((BASE_CONFIDENCE + covered + health).min(100)) / 100.0
}

/// Score every player, looking up records by id. Players without a record
/// score 0 and stay in the pool.
pub fn score_pool(
    players: &[Player],
    records: &HashMap<PlayerId, SignalRecord>,
    rules: &ScoringRules,
) -> Vec<ScoredPlayer> {
    let empty = SignalRecord::new();
    players
        .iter()
        .map(|p| {
            let record = records.get(&p.id).unwrap_or(&empty);
            ScoredPlayer {
                player: p.clone(),
                score: score(record, p.position, rules),
            }
        })
        .collect()
}
