// External data providers and concurrent signal gathering.
//
// Every signal source implements the same "fetch signals for week W"
// capability. Sources are queried concurrently, each under its own timeout,
// and any subset may fail without affecting the others.

pub mod odds_api;
pub mod projections_csv;
pub mod snapshot;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures_util::future::join_all;
use thiserror::Error;
use tracing::{info, warn};

use crate::cache::RunCache;
use crate::lineup::CurrentLineup;
use crate::model::{InjuryStatus, Player, PlayerId};
use crate::signals::ProviderPayload;
use crate::week::WeekWindow;

pub use odds_api::OddsApiProvider;
pub use projections_csv::ProjectionsCsvProvider;
pub use snapshot::SnapshotProvider;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{provider} returned HTTP {status}")]
    Status { provider: String, status: u16 },

    #[error("failed to parse {what}: {message}")]
    Parse { what: String, message: String },

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{0} is not configured")]
    NotConfigured(String),

    #[error("{provider} timed out after {secs}s")]
    Timeout { provider: String, secs: u64 },
}

// ---------------------------------------------------------------------------
// Capability traits
// ---------------------------------------------------------------------------

/// The fantasy platform: who is on the roster, who is available, and who is
/// hurt. Read-only; lineups are never submitted through it.
#[async_trait]
pub trait RosterSource: Send + Sync {
    async fn fetch_roster(
        &self,
        league_id: &str,
        team_id: &str,
        week: u32,
    ) -> Result<Vec<Player>, ProviderError>;

    async fn fetch_free_agents(
        &self,
        league_id: &str,
        week: u32,
    ) -> Result<Vec<Player>, ProviderError>;

    async fn fetch_injury_status(&self, player_id: &PlayerId)
        -> Result<InjuryStatus, ProviderError>;

    /// Starters currently set for `week`, by slot name. Sources that cannot
    /// tell report none.
    async fn fetch_current_lineup(
        &self,
        _league_id: &str,
        _team_id: &str,
        _week: u32,
    ) -> Result<CurrentLineup, ProviderError> {
        Ok(CurrentLineup::new())
    }
}

/// One independently-failable source of per-player signals.
#[async_trait]
pub trait SignalProvider: Send + Sync {
    fn name(&self) -> &str;

    /// Rows for `window`. Rows may carry kickoff or week tags; the
    /// normalizer drops anything outside the window.
    async fn fetch_signals(
        &self,
        window: &WeekWindow,
        cache: &RunCache,
    ) -> Result<ProviderPayload, ProviderError>;
}

/// Lets one shared source (e.g. the snapshot) sit in the provider list while
/// also serving as the roster source.
#[async_trait]
impl<T: SignalProvider + ?Sized> SignalProvider for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn fetch_signals(
        &self,
        window: &WeekWindow,
        cache: &RunCache,
    ) -> Result<ProviderPayload, ProviderError> {
        (**self).fetch_signals(window, cache).await
    }
}

// ---------------------------------------------------------------------------
// Gathering
// ---------------------------------------------------------------------------

/// Query every provider concurrently. Payloads come back in provider order;
/// failed or timed-out providers are logged and left out.
pub async fn gather_signals(
    providers: &[Box<dyn SignalProvider>],
    window: &WeekWindow,
    cache: &RunCache,
    timeout: Duration,
) -> Vec<ProviderPayload> {
    let fetches = providers.iter().map(|p| async move {
        let result = match tokio::time::timeout(timeout, p.fetch_signals(window, cache)).await {
            Ok(inner) => inner,
            Err(_) => Err(ProviderError::Timeout {
                provider: p.name().to_string(),
                secs: timeout.as_secs(),
            }),
        };
        (p.name(), result)
    });

    let mut payloads = Vec::new();
    for (name, result) in join_all(fetches).await {
        match result {
            Ok(payload) => {
                info!(provider = name, rows = payload.rows.len(), "signals fetched");
                payloads.push(payload);
            }
            Err(e) => warn!(provider = name, error = %e, "signal provider failed, continuing without it"),
        }
    }
    payloads
}

/// Refresh each player's injury designation from the roster source. A failed
/// lookup keeps the designation the roster already carried.
pub async fn refresh_injury_statuses(source: &dyn RosterSource, players: &mut [Player]) {
    let lookups = players
        .iter()
        .map(|p| source.fetch_injury_status(&p.id));
    let results = join_all(lookups).await;
    for (player, result) in players.iter_mut().zip(results) {
        match result {
            Ok(status) => player.injury_status = status,
            Err(e) => warn!(player = %player.name, error = %e, "injury lookup failed, keeping roster status"),
        }
    }
}
