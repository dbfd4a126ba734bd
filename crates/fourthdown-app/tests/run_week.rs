// Integration tests for a full weekly run against the core crate's fixtures.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use fourthdown_app::report;
use fourthdown_app::run::{self, RunOutcome};
use fourthdown_core::cache::RunCache;
use fourthdown_core::config::{load_config_from, Config};
use fourthdown_core::db::Database;
use fourthdown_core::model::InjuryStatus;
use fourthdown_core::providers::{ProviderError, SignalProvider};
use fourthdown_core::signals::ProviderPayload;
use fourthdown_core::week::WeekWindow;

// ===========================================================================
// Test helpers
// ===========================================================================

fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
}

fn core_fixture(name: &str) -> PathBuf {
    workspace_root()
        .join("crates/fourthdown-core/tests/fixtures")
        .join(name)
}

/// Default config pointed at the fixture snapshot and projections.
fn fixture_config(test_name: &str) -> (Config, PathBuf) {
    let dir = std::env::temp_dir().join(format!("fourthdown_app_{test_name}"));
    let _ = fs::remove_dir_all(&dir);
    fs::create_dir_all(dir.join("config")).unwrap();

    let defaults = workspace_root().join("defaults");
    fs::copy(defaults.join("league.toml"), dir.join("config/league.toml")).unwrap();
    let strategy = fs::read_to_string(defaults.join("strategy.toml"))
        .unwrap()
        .replace(
            "snapshot = \"data/snapshot.json\"",
            &format!("snapshot = {:?}", core_fixture("snapshot.json").to_string_lossy()),
        )
        .replace(
            "projections_csv = \"\"",
            &format!(
                "projections_csv = {:?}",
                core_fixture("projections.csv").to_string_lossy()
            ),
        );
    fs::write(dir.join("config/strategy.toml"), strategy).unwrap();

    let config = load_config_from(&dir).expect("fixture config should validate");
    (config, dir)
}

struct Stalled;

#[async_trait]
impl SignalProvider for Stalled {
    fn name(&self) -> &str {
        "stalled"
    }

    async fn fetch_signals(
        &self,
        _window: &WeekWindow,
        _cache: &RunCache,
    ) -> Result<ProviderPayload, ProviderError> {
        tokio::time::sleep(Duration::from_secs(86_400)).await;
        Ok(ProviderPayload::new("stalled"))
    }
}

// ===========================================================================
// Tests
// ===========================================================================

#[tokio::test]
async fn snapshot_run_plans_reports_and_persists() {
    let (config, dir) = fixture_config("full_run");
    let window = run::resolve_week(&config, Some("6"), Utc::now()).unwrap();
    let providers = run::build_providers(&config, &dir).unwrap();
    let names: Vec<_> = providers.signals.iter().map(|p| p.name()).collect();
    assert_eq!(names, vec!["snapshot", "projections_csv"]);

    let outcome = run::plan_week(&config, &providers, window, std::future::pending())
        .await
        .unwrap();
    let RunOutcome::Planned(planned) = outcome else {
        panic!("run should not be cancelled");
    };
    let plan = &planned.plan;

    assert_eq!(plan.week, 6);
    assert_eq!(plan.lineup.filled_count(), 9);
    assert_eq!(
        plan.lineup.starter("TE").unwrap().player.name,
        "Dalton Kincaid"
    );
    assert_eq!(plan.excluded.len(), 1);
    assert_eq!(plan.excluded[0].status, InjuryStatus::Out);
    assert_eq!(planned.stats.out_of_window, 1);

    let text = report::render(&config.league.name, &planned.window, plan, &planned.stats);
    assert!(text.contains("Dallas Goedert (roster): OUT"));
    assert!(text.contains("WAIVER SUGGESTIONS"));
    assert!(text.contains(&format!("risk: {} (starter confidence", plan.risk)));

    // The snapshot's current lineup still starts Goedert at TE.
    let changes = plan.changes.as_ref().unwrap();
    let te = changes.iter().find(|c| c.slot == "TE").unwrap();
    assert_eq!(te.previous.as_ref().unwrap().player.name, "Dallas Goedert");
    assert!(text.contains("CHANGES\n"));
    assert!(text.contains("  TE    Dallas Goedert ("));

    let db = Database::open(":memory:").unwrap();
    let persisted = run::persist(&db, &config, plan).unwrap();
    assert_eq!(persisted.decision_ids.len(), plan.waiver.len() + 1);

    let stored = db.latest_lineup(6, 2025).unwrap().unwrap();
    assert_eq!(stored.id, persisted.lineup_id);
    assert_eq!(stored.league_id, "423.l.123456");
    assert_eq!(stored.lineup, plan.lineup);

    let decisions = db.load_decisions(6, 2025).unwrap();
    assert_eq!(decisions[0].kind, "lineup");
    assert_eq!(decisions[0].detail["lineup_id"], persisted.lineup_id);
    assert!(decisions[1..].iter().all(|d| d.kind == "waiver"));
    let lineup_detail = &decisions[0].detail;
    assert!(lineup_detail["risk"].is_string());
    let stored_changes = lineup_detail["changes"].as_array().unwrap();
    assert_eq!(stored_changes.len(), changes.len());
    assert!(stored_changes
        .iter()
        .any(|c| c["slot"] == "TE" && c["previous_id"] == "nfl.p.31139"));
    assert!(decisions[1..]
        .iter()
        .all(|d| d.detail.get("drop_id").is_some()));
}

#[tokio::test(start_paused = true)]
async fn ctrl_c_during_gathering_cancels_the_run() {
    let (mut config, dir) = fixture_config("cancelled");
    config.providers.timeout_secs = 86_400;
    let mut providers = run::build_providers(&config, &dir).unwrap();
    providers.signals.push(Box::new(Stalled));

    let window = run::resolve_week(&config, Some("6"), Utc::now()).unwrap();
    let cancel = tokio::time::sleep(Duration::from_secs(1));
    let outcome = run::plan_week(&config, &providers, window, cancel)
        .await
        .unwrap();
    assert!(matches!(outcome, RunOutcome::Cancelled));
}

#[tokio::test]
async fn unknown_snapshot_player_status_keeps_roster_designation() {
    let (config, dir) = fixture_config("statuses");
    let providers = run::build_providers(&config, &dir).unwrap();
    let window = run::resolve_week(&config, Some("6"), Utc::now()).unwrap();
    let RunOutcome::Planned(planned) =
        run::plan_week(&config, &providers, window, std::future::pending())
            .await
            .unwrap()
    else {
        panic!("run should not be cancelled");
    };
    let brown = planned
        .plan
        .lineup
        .starters()
        .find(|sp| sp.player.name == "A.J. Brown")
        .unwrap();
    assert_eq!(brown.player.injury_status, InjuryStatus::Questionable);
    assert!(brown.score.contributions.iter().any(|c| c.points == -5.0));
}
