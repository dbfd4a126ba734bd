// JSON snapshot provider.
//
// A single file holding a week's roster, free agents, injury designations and
// any hand-entered signals. Serves as the roster source in place of a live
// fantasy platform, and as a signal provider for manual overrides.

use std::collections::{BTreeMap, HashMap};
use std::path::Path;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::debug;

use crate::cache::RunCache;
use crate::lineup::CurrentLineup;
use crate::model::{InjuryStatus, Player, PlayerId, RosterStatus};
use crate::signals::{PlayerRef, ProviderPayload, RowTarget, Signal, SignalRow};
use crate::week::WeekWindow;

use super::{ProviderError, RosterSource, SignalProvider};

const PROVIDER_NAME: &str = "snapshot";

#[derive(Debug, Deserialize)]
struct SnapshotFile {
    #[serde(default)]
    league_id: Option<String>,
    #[serde(default)]
    roster: Vec<Player>,
    #[serde(default)]
    free_agents: Vec<Player>,
    /// Starters as currently set, slot name to player id.
    #[serde(default)]
    current_lineup: CurrentLineup,
    /// Latest designations by player id, overriding the roster entries.
    #[serde(default)]
    injuries: HashMap<PlayerId, InjuryStatus>,
    #[serde(default)]
    signals: Vec<PlayerSignals>,
    #[serde(default)]
    team_signals: Vec<TeamSignals>,
}

#[derive(Debug, Deserialize)]
struct PlayerSignals {
    player: PlayerRef,
    #[serde(default)]
    kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    week: Option<u32>,
    values: BTreeMap<Signal, f64>,
}

#[derive(Debug, Deserialize)]
struct TeamSignals {
    team: String,
    #[serde(default)]
    kickoff: Option<DateTime<Utc>>,
    #[serde(default)]
    week: Option<u32>,
    values: BTreeMap<Signal, f64>,
}

pub struct SnapshotProvider {
    snapshot: SnapshotFile,
}

impl SnapshotProvider {
    pub fn load(path: &Path) -> Result<Self, ProviderError> {
        let text = std::fs::read_to_string(path).map_err(|source| ProviderError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, ProviderError> {
        let snapshot: SnapshotFile =
            serde_json::from_str(text).map_err(|e| ProviderError::Parse {
                what: "snapshot".into(),
                message: e.to_string(),
            })?;
        Ok(Self { snapshot })
    }

    fn rows(&self) -> Vec<SignalRow> {
        let players = self.snapshot.signals.iter().map(|s| SignalRow {
            target: RowTarget::Player(s.player.clone()),
            kickoff: s.kickoff,
            week: s.week,
            values: s.values.iter().map(|(&k, &v)| (k, v)).collect(),
        });
        let teams = self.snapshot.team_signals.iter().map(|s| SignalRow {
            target: RowTarget::Team(s.team.clone()),
            kickoff: s.kickoff,
            week: s.week,
            values: s.values.iter().map(|(&k, &v)| (k, v)).collect(),
        });
        players.chain(teams).collect()
    }

    fn with_status(players: &[Player], status: RosterStatus) -> Vec<Player> {
        players
            .iter()
            .cloned()
            .map(|mut p| {
                p.roster_status = status;
                p
            })
            .collect()
    }
}

#[async_trait]
impl RosterSource for SnapshotProvider {
    async fn fetch_roster(
        &self,
        league_id: &str,
        team_id: &str,
        week: u32,
    ) -> Result<Vec<Player>, ProviderError> {
        if let Some(snap_league) = &self.snapshot.league_id {
            if snap_league != league_id {
                debug!(snapshot = %snap_league, requested = league_id, "snapshot league id differs");
            }
        }
        debug!(team_id, week, players = self.snapshot.roster.len(), "roster from snapshot");
        Ok(Self::with_status(&self.snapshot.roster, RosterStatus::OnRoster))
    }

    async fn fetch_free_agents(
        &self,
        _league_id: &str,
        _week: u32,
    ) -> Result<Vec<Player>, ProviderError> {
        Ok(Self::with_status(
            &self.snapshot.free_agents,
            RosterStatus::FreeAgent,
        ))
    }

    async fn fetch_injury_status(
        &self,
        player_id: &PlayerId,
    ) -> Result<InjuryStatus, ProviderError> {
        if let Some(&status) = self.snapshot.injuries.get(player_id) {
            return Ok(status);
        }
        self.snapshot
            .roster
            .iter()
            .chain(&self.snapshot.free_agents)
            .find(|p| &p.id == player_id)
            .map(|p| p.injury_status)
            .ok_or_else(|| ProviderError::Parse {
                what: "injury status".into(),
                message: format!("player {player_id} not in snapshot"),
            })
    }

    async fn fetch_current_lineup(
        &self,
        _league_id: &str,
        _team_id: &str,
        _week: u32,
    ) -> Result<CurrentLineup, ProviderError> {
        Ok(self.snapshot.current_lineup.clone())
    }
}

#[async_trait]
impl SignalProvider for SnapshotProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_signals(
        &self,
        _window: &WeekWindow,
        _cache: &RunCache,
    ) -> Result<ProviderPayload, ProviderError> {
        Ok(ProviderPayload {
            provider: PROVIDER_NAME.into(),
            rows: self.rows(),
        })
    }
}
