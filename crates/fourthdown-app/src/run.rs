// One weekly run: fetch, gather, normalize, plan, persist.
//
// Each step is a separate function so the binary can print the report
// between planning and persistence, and so tests can drive a run against a
// snapshot file without a terminal.

use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use directories::ProjectDirs;
use serde_json::json;
use tracing::{info, warn};

use fourthdown_core::cache::RunCache;
use fourthdown_core::config::Config;
use fourthdown_core::db::{Database, NewDecision};
use fourthdown_core::engine::{Engine, WeeklyPlan};
use fourthdown_core::lineup::CurrentLineup;
use fourthdown_core::providers::{
    gather_signals, refresh_injury_statuses, OddsApiProvider, ProjectionsCsvProvider,
    RosterSource, SignalProvider, SnapshotProvider,
};
use fourthdown_core::signals::normalizer::{normalize, NormalizeStats};
use fourthdown_core::week::WeekWindow;

/// Environment variable that pins the week instead of deriving it from today.
pub const WEEK_ENV: &str = "FOURTHDOWN_WEEK";

const DB_FILE: &str = "fourthdown.db";

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

/// The week to plan: `override_week` (from `FOURTHDOWN_WEEK`) when set,
/// otherwise the week containing `now`.
pub fn resolve_week(
    config: &Config,
    override_week: Option<&str>,
    now: DateTime<Utc>,
) -> Result<WeekWindow> {
    let season_start = config.league.season_start;
    match override_week.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => {
            let week: u32 = raw
                .parse()
                .with_context(|| format!("{WEEK_ENV} must be a week number, got `{raw}`"))?;
            if week == 0 {
                bail!("{WEEK_ENV} must be 1 or greater");
            }
            Ok(WeekWindow::for_week(season_start, week))
        }
        None => Ok(WeekWindow::containing(season_start, now)),
    }
}

/// Configured database path, or `fourthdown.db` in the platform data
/// directory when the config leaves it empty.
pub fn resolve_db_path(config: &Config) -> Result<PathBuf> {
    if !config.db_path.is_empty() {
        return Ok(PathBuf::from(&config.db_path));
    }
    let dirs = ProjectDirs::from("", "", "fourthdown")
        .context("could not determine a data directory for the database")?;
    let data_dir = dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("failed to create {}", data_dir.display()))?;
    Ok(data_dir.join(DB_FILE))
}

/// The snapshot (roster source and first signal provider) plus every other
/// configured signal provider, in priority order.
pub struct Providers {
    pub roster: Arc<SnapshotProvider>,
    pub signals: Vec<Box<dyn SignalProvider>>,
}

/// Build providers from config. Relative paths resolve against `base_dir`.
pub fn build_providers(config: &Config, base_dir: &Path) -> Result<Providers> {
    let snapshot_path = base_dir.join(&config.providers.snapshot);
    let snapshot = Arc::new(
        SnapshotProvider::load(&snapshot_path)
            .with_context(|| format!("failed to load snapshot {}", snapshot_path.display()))?,
    );

    let mut signals: Vec<Box<dyn SignalProvider>> = vec![Box::new(Arc::clone(&snapshot))];

    match config
        .credentials
        .odds_api_key
        .as_deref()
        .filter(|k| !k.is_empty())
    {
        Some(key) => signals.push(Box::new(OddsApiProvider::new(
            key.to_string(),
            config.providers.odds_api_base_url.clone(),
            config.providers.odds_api_regions.clone(),
        ))),
        None => info!("no odds API key configured, skipping betting markets"),
    }

    if !config.providers.projections_csv.is_empty() {
        signals.push(Box::new(ProjectionsCsvProvider::new(
            base_dir.join(&config.providers.projections_csv),
        )));
    }

    info!(
        providers = ?signals.iter().map(|p| p.name()).collect::<Vec<_>>(),
        "signal providers ready"
    );

    Ok(Providers {
        roster: snapshot,
        signals,
    })
}

// ---------------------------------------------------------------------------
// The run
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub enum RunOutcome {
    Planned(Box<PlannedWeek>),
    /// Cancelled while gathering signals. Nothing was written.
    Cancelled,
}

#[derive(Debug)]
pub struct PlannedWeek {
    pub window: WeekWindow,
    pub plan: WeeklyPlan,
    pub stats: NormalizeStats,
}

/// Fetch everything for `window` and plan the week.
///
/// Signal gathering races `cancel`; if `cancel` finishes first the run stops
/// with [`RunOutcome::Cancelled`]. Roster fetch failures are fatal, signal
/// provider failures are not.
pub async fn plan_week<C>(
    config: &Config,
    providers: &Providers,
    window: WeekWindow,
    cancel: C,
) -> Result<RunOutcome>
where
    C: Future<Output = ()>,
{
    let league = &config.league;
    let week = window.week;

    let roster_source: &dyn RosterSource = &*providers.roster;
    let mut roster = roster_source
        .fetch_roster(&league.league_id, &league.team_id, week)
        .await
        .context("failed to fetch roster")?;
    let mut free_agents = roster_source
        .fetch_free_agents(&league.league_id, week)
        .await
        .context("failed to fetch free agents")?;
    refresh_injury_statuses(roster_source, &mut roster).await;
    refresh_injury_statuses(roster_source, &mut free_agents).await;
    let current = match roster_source
        .fetch_current_lineup(&league.league_id, &league.team_id, week)
        .await
    {
        Ok(current) => current,
        Err(e) => {
            warn!(error = %e, "current lineup unavailable, skipping change list");
            CurrentLineup::new()
        }
    };
    info!(
        week,
        roster = roster.len(),
        free_agents = free_agents.len(),
        current_starters = current.len(),
        "players fetched"
    );

    let cache = RunCache::new();
    let timeout = Duration::from_secs(config.providers.timeout_secs);
    let payloads = tokio::select! {
        payloads = gather_signals(&providers.signals, &window, &cache, timeout) => payloads,
        _ = cancel => {
            warn!(week, "run cancelled while gathering signals");
            return Ok(RunOutcome::Cancelled);
        }
    };

    let everyone: Vec<_> = roster.iter().chain(&free_agents).cloned().collect();
    let normalized = normalize(&payloads, &everyone, &window, &config.strategy.injury);
    if !normalized.unlinked.is_empty() {
        warn!(
            count = normalized.unlinked.len(),
            "signal records could not be tied to a known player"
        );
    }

    let plan = Engine::from_config(config).plan_week(
        &roster,
        &free_agents,
        &normalized.records,
        &current,
        week,
    );

    Ok(RunOutcome::Planned(Box::new(PlannedWeek {
        window,
        plan,
        stats: normalized.stats,
    })))
}

/// Row ids written by [`persist`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted {
    pub lineup_id: i64,
    pub decision_ids: Vec<i64>,
}

/// Store the lineup snapshot and one decision per recommendation.
pub fn persist(db: &Database, config: &Config, plan: &WeeklyPlan) -> Result<Persisted> {
    let season = config.league.season;
    let week = plan.week;

    let lineup_id = db
        .record_lineup(season, week, &config.league.league_id, &plan.lineup)
        .context("failed to store lineup")?;

    let mut decision_ids = Vec::with_capacity(plan.waiver.len() + 1);
    let starters: Vec<_> = plan
        .lineup
        .slots
        .iter()
        .map(|s| {
            json!({
                "slot": s.name,
                "player_id": s.player.as_ref().map(|p| p.player.id.as_str()),
                "score": s.player.as_ref().map(|p| p.value()),
                "confidence": s.player.as_ref().map(|p| p.confidence()),
            })
        })
        .collect();
    let changes: Option<Vec<_>> = plan.changes.as_ref().map(|changes| {
        changes
            .iter()
            .map(|c| {
                json!({
                    "slot": c.slot,
                    "previous_id": c.previous.as_ref().map(|p| p.player.id.as_str()),
                    "recommended_id": c.recommended.as_ref().map(|p| p.player.id.as_str()),
                    "delta": c.delta,
                })
            })
            .collect()
    });
    decision_ids.push(db.record_decision(&NewDecision {
        season,
        week,
        kind: "lineup".into(),
        summary: format!(
            "start {} of {} slots, projected score {:.1}, {} risk, {}",
            plan.lineup.filled_count(),
            plan.lineup.slots.len(),
            plan.lineup.total_score(),
            plan.risk,
            match &plan.changes {
                Some(c) if c.is_empty() => "no changes".to_string(),
                Some(c) => format!("{} changes", c.len()),
                None => "current lineup unknown".to_string(),
            }
        ),
        detail: json!({
            "lineup_id": lineup_id,
            "risk": plan.risk,
            "confidence": plan.confidence,
            "starters": starters,
            "changes": changes,
        }),
    })?);

    for s in &plan.waiver {
        let replacing = s
            .current
            .as_ref()
            .map_or_else(|| "empty slot".to_string(), |c| c.player.name.clone());
        decision_ids.push(db.record_decision(&NewDecision {
            season,
            week,
            kind: "waiver".into(),
            summary: format!(
                "add {} for {} ({}), +{:.1}, drop {}",
                s.candidate.player.name,
                s.slot,
                replacing,
                s.delta,
                s.drop_candidate
                    .as_ref()
                    .map_or("nobody", |d| d.player.name.as_str())
            ),
            detail: json!({
                "slot": s.slot,
                "candidate_id": s.candidate.player.id.as_str(),
                "current_id": s.current.as_ref().map(|c| c.player.id.as_str()),
                "drop_id": s.drop_candidate.as_ref().map(|d| d.player.id.as_str()),
                "delta": s.delta,
            }),
        })?);
    }

    info!(lineup_id, decisions = decision_ids.len(), "run persisted");
    Ok(Persisted {
        lineup_id,
        decision_ids,
    })
}
