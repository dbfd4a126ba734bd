// The Signal Normalizer.
//
// Turns provider payloads into one SignalRecord per known player. Rows are
// first week-filtered, then aligned to a player (or fanned out over a team),
// then aggregated within their provider. Providers are merged in priority
// order and a later provider only fills fields that are still absent.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::model::{InjuryStatus, Player, PlayerId};
use crate::signals::identity::{Alignment, PlayerIndex, UnlinkedKey, UnmatchedReason};
use crate::signals::{ProviderPayload, RowTarget, Signal, SignalRecord, SignalRow};
use crate::week::WeekWindow;

/// Play probability assumed for designated players whose provider gave none.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct InjuryDefaults {
    pub questionable: f64,
    pub doubtful: f64,
}

impl Default for InjuryDefaults {
    fn default() -> Self {
        InjuryDefaults {
            questionable: 0.6,
            doubtful: 0.25,
        }
    }
}

/// Row accounting for one normalization pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct NormalizeStats {
    pub rows: usize,
    pub out_of_window: usize,
    pub linked: usize,
    pub unlinked: usize,
    pub team_rows_without_players: usize,
}

#[derive(Debug, Clone, Default)]
pub struct NormalizedSignals {
    /// One record per known player, possibly empty.
    pub records: HashMap<PlayerId, SignalRecord>,
    /// Records no known player could be tied to, kept apart rather than
    /// merged on a guess.
    pub unlinked: BTreeMap<UnlinkedKey, SignalRecord>,
    pub stats: NormalizeStats,
}

impl NormalizedSignals {
    pub fn record(&self, id: &PlayerId) -> Option<&SignalRecord> {
        self.records.get(id)
    }
}

/// Normalize `payloads` (in priority order) for `players` and `window`.
pub fn normalize(
    payloads: &[ProviderPayload],
    players: &[Player],
    window: &WeekWindow,
    injury: &InjuryDefaults,
) -> NormalizedSignals {
    let index = PlayerIndex::build(players);
    let mut out = NormalizedSignals {
        records: players
            .iter()
            .map(|p| (p.id.clone(), SignalRecord::new()))
            .collect(),
        ..NormalizedSignals::default()
    };

    for payload in payloads {
        let mut linked: HashMap<PlayerId, SignalRecord> = HashMap::new();
        let mut unlinked: BTreeMap<UnlinkedKey, SignalRecord> = BTreeMap::new();
        let before = out.stats;

        for row in &payload.rows {
            out.stats.rows += 1;
            if !in_window(row, window) {
                out.stats.out_of_window += 1;
                continue;
            }
            match &row.target {
                RowTarget::Player(player_ref) => match index.resolve(player_ref) {
                    Alignment::Linked(id) => {
                        out.stats.linked += 1;
                        aggregate_row(linked.entry(id).or_default(), row);
                    }
                    Alignment::Unlinked(key, reason) => {
                        out.stats.unlinked += 1;
                        match reason {
                            UnmatchedReason::Ambiguous(n) => warn!(
                                provider = %payload.provider,
                                player = %key,
                                candidates = n,
                                "ambiguous player reference left unlinked"
                            ),
                            UnmatchedReason::NoTeam | UnmatchedReason::NoCandidate => debug!(
                                provider = %payload.provider,
                                player = %key,
                                ?reason,
                                "no matching player"
                            ),
                        }
                        aggregate_row(unlinked.entry(key).or_default(), row);
                    }
                },
                RowTarget::Team(team) => {
                    let ids = index.players_on_team(team);
                    if ids.is_empty() {
                        out.stats.team_rows_without_players += 1;
                        debug!(provider = %payload.provider, team = %team, "team row matches no known player");
                    }
                    for id in ids {
                        aggregate_row(linked.entry(id.clone()).or_default(), row);
                    }
                }
            }
        }

        for (id, record) in linked {
            out.records.entry(id).or_default().fill_from(&record);
        }
        for (key, record) in unlinked {
            out.unlinked.entry(key).or_default().fill_from(&record);
        }

        info!(
            provider = %payload.provider,
            rows = out.stats.rows - before.rows,
            out_of_window = out.stats.out_of_window - before.out_of_window,
            linked = out.stats.linked - before.linked,
            unlinked = out.stats.unlinked - before.unlinked,
            "normalized provider payload"
        );
    }

    apply_injury_signal(players, window.week, injury, &mut out.records);
    out
}

/// A row is kept unless its kickoff or its week says it belongs elsewhere.
/// Rows with no timing information are kept.
fn in_window(row: &SignalRow, window: &WeekWindow) -> bool {
    let kickoff_ok = row
        .kickoff
        .map_or(true, |k: DateTime<Utc>| window.contains(k));
    let week_ok = row.week.map_or(true, |w| w == window.week);
    kickoff_ok && week_ok
}

fn aggregate_row(record: &mut SignalRecord, row: &SignalRow) {
    for &(signal, value) in &row.values {
        record.aggregate(signal, value);
    }
}

/// QUESTIONABLE and DOUBTFUL players get a play probability when no provider
/// supplied one. ACTIVE players get nothing.
fn apply_injury_signal(
    players: &[Player],
    week: u32,
    defaults: &InjuryDefaults,
    records: &mut HashMap<PlayerId, SignalRecord>,
) {
    for p in players {
        let fallback = match p.status_for_week(week) {
            InjuryStatus::Questionable => defaults.questionable,
            InjuryStatus::Doubtful => defaults.doubtful,
            _ => continue,
        };
        let record = records.entry(p.id.clone()).or_default();
        if !record.contains(Signal::PlayProbability) {
            let prob = p.play_probability.unwrap_or(fallback).clamp(0.0, 1.0);
            record.set(Signal::PlayProbability, prob);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Position, RosterStatus};
    use crate::signals::PlayerRef;
    use chrono::{NaiveDate, TimeZone};

    fn window() -> WeekWindow {
        WeekWindow::for_week(NaiveDate::from_ymd_opt(2025, 9, 2).unwrap(), 6)
    }

    fn player(id: &str, name: &str, team: &str, pos: Position) -> Player {
        Player {
            id: PlayerId::new(id),
            name: name.into(),
            team: team.into(),
            position: pos,
            extra_positions: vec![],
            roster_status: RosterStatus::OnRoster,
            injury_status: InjuryStatus::Active,
            play_probability: None,
            bye_week: None,
        }
    }

    fn players() -> Vec<Player> {
        vec![
            player("1", "Patrick Mahomes", "KC", Position::Quarterback),
            player("2", "Travis Kelce", "KC", Position::TightEnd),
            player("3", "Josh Allen", "BUF", Position::Quarterback),
        ]
    }

    fn row(target: RowTarget, values: Vec<(Signal, f64)>) -> SignalRow {
        SignalRow {
            target,
            kickoff: None,
            week: None,
            values,
        }
    }

    fn player_row(name: &str, team: &str, values: Vec<(Signal, f64)>) -> SignalRow {
        row(RowTarget::Player(PlayerRef::named(name, team)), values)
    }

    fn payload(name: &str, rows: Vec<SignalRow>) -> ProviderPayload {
        ProviderPayload {
            provider: name.into(),
            rows,
        }
    }

    #[test]
    fn every_known_player_gets_a_record() {
        let out = normalize(&[], &players(), &window(), &InjuryDefaults::default());
        assert_eq!(out.records.len(), 3);
        assert!(out.records.values().all(SignalRecord::is_empty));
    }

    #[test]
    fn rows_outside_window_are_discarded() {
        let mut stale = player_row("Travis Kelce", "KC", vec![(Signal::ReceptionLine, 9.5)]);
        stale.kickoff = Some(Utc.with_ymd_and_hms(2025, 10, 2, 0, 15, 0).unwrap());
        let mut wrong_week = player_row("Travis Kelce", "KC", vec![(Signal::TdOdds, 120.0)]);
        wrong_week.week = Some(5);
        let mut current = player_row("Travis Kelce", "KC", vec![(Signal::ReceptionLine, 5.5)]);
        current.kickoff = Some(Utc.with_ymd_and_hms(2025, 10, 12, 20, 25, 0).unwrap());

        let out = normalize(
            &[payload("odds", vec![stale, wrong_week, current])],
            &players(),
            &window(),
            &InjuryDefaults::default(),
        );
        let kelce = out.record(&PlayerId::new("2")).unwrap();
        assert_eq!(kelce.get(Signal::ReceptionLine), Some(5.5));
        assert_eq!(kelce.get(Signal::TdOdds), None);
        assert_eq!(out.stats.out_of_window, 2);
    }

    #[test]
    fn first_provider_wins_and_later_ones_fill_gaps() {
        let first = payload(
            "odds",
            vec![player_row("Josh Allen", "BUF", vec![(Signal::PassYardsLine, 0.0)])],
        );
        let second = payload(
            "projections",
            vec![player_row(
                "Josh Allen",
                "BUF",
                vec![(Signal::PassYardsLine, 265.5), (Signal::ProjectedPoints, 22.1)],
            )],
        );
        let out = normalize(&[first, second], &players(), &window(), &InjuryDefaults::default());
        let allen = out.record(&PlayerId::new("3")).unwrap();
        assert_eq!(allen.get(Signal::PassYardsLine), Some(0.0));
        assert_eq!(allen.get(Signal::ProjectedPoints), Some(22.1));
    }

    #[test]
    fn failed_provider_leaves_other_fields_intact() {
        let odds = payload(
            "odds",
            vec![player_row("Patrick Mahomes", "KC", vec![(Signal::PassTdsOdds, -140.0)])],
        );
        let empty = payload("projections", vec![]);
        let out = normalize(&[odds, empty], &players(), &window(), &InjuryDefaults::default());
        assert_eq!(
            out.record(&PlayerId::new("1")).unwrap().get(Signal::PassTdsOdds),
            Some(-140.0)
        );
    }

    #[test]
    fn team_rows_fan_out_by_canonical_team() {
        let game = payload(
            "odds",
            vec![row(
                RowTarget::Team("Kansas City Chiefs".into()),
                vec![(Signal::GameTotal, 48.5), (Signal::Spread, -3.5)],
            )],
        );
        let out = normalize(&[game], &players(), &window(), &InjuryDefaults::default());
        for id in ["1", "2"] {
            assert_eq!(
                out.record(&PlayerId::new(id)).unwrap().get(Signal::GameTotal),
                Some(48.5)
            );
        }
        assert!(out.record(&PlayerId::new("3")).unwrap().is_empty());
    }

    #[test]
    fn bookmaker_duplicates_aggregate_within_provider() {
        let odds = payload(
            "odds",
            vec![
                player_row("Travis Kelce", "KC", vec![(Signal::ReceptionLine, 5.5), (Signal::TdOdds, 130.0)]),
                player_row("Travis Kelce", "KC", vec![(Signal::ReceptionLine, 6.5), (Signal::TdOdds, 115.0)]),
            ],
        );
        let out = normalize(&[odds], &players(), &window(), &InjuryDefaults::default());
        let kelce = out.record(&PlayerId::new("2")).unwrap();
        assert_eq!(kelce.get(Signal::ReceptionLine), Some(6.5));
        assert_eq!(kelce.get(Signal::TdOdds), Some(115.0));
    }

    #[test]
    fn unknown_players_become_unlinked_records() {
        let odds = payload(
            "odds",
            vec![player_row("Xavier Worthy", "KC", vec![(Signal::ReceptionLine, 3.5)])],
        );
        let out = normalize(&[odds], &players(), &window(), &InjuryDefaults::default());
        assert_eq!(out.unlinked.len(), 1);
        let (key, rec) = out.unlinked.iter().next().unwrap();
        assert_eq!(key.name, "xavier worthy");
        assert_eq!(rec.get(Signal::ReceptionLine), Some(3.5));
        assert_eq!(out.stats.unlinked, 1);
    }

    #[test]
    fn injury_designation_adds_play_probability() {
        let mut ps = players();
        ps[0].injury_status = InjuryStatus::Questionable;
        ps[1].injury_status = InjuryStatus::Doubtful;
        ps[1].play_probability = Some(0.1);
        let out = normalize(&[], &ps, &window(), &InjuryDefaults::default());
        assert_eq!(
            out.record(&PlayerId::new("1")).unwrap().get(Signal::PlayProbability),
            Some(0.6)
        );
        assert_eq!(
            out.record(&PlayerId::new("2")).unwrap().get(Signal::PlayProbability),
            Some(0.1)
        );
        assert!(out.record(&PlayerId::new("3")).unwrap().is_empty());
    }
}
