// fourthdown entry point: one weekly lineup run.
//
// Startup sequence:
// 1. Initialize tracing (log to file; stdout is reserved for the report)
// 2. Load config (fatal before anything is fetched)
// 3. Resolve the week
// 4. Open database
// 5. Build roster source and signal providers
// 6. Fetch players, gather signals (Ctrl+C cancels), plan the week
// 7. Print the report
// 8. Persist the lineup snapshot and decisions

use fourthdown_app::report;
use fourthdown_app::run::{self, RunOutcome, WEEK_ENV};
use fourthdown_core::config;
use fourthdown_core::db;

use anyhow::Context;
use tracing::{error, info};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // 1. Initialize tracing
    init_tracing()?;
    info!("fourthdown starting up");

    // 2. Load config
    let config = config::load_config().context("failed to load configuration")?;
    info!(
        "Config loaded: league={} ({}), team={}, {} slots, {} rules",
        config.league.name,
        config.league.league_id,
        config.league.team_id,
        config.shape.len(),
        config.strategy.scoring.rules.len()
    );

    // 3. Resolve the week
    let week_override = std::env::var(WEEK_ENV).ok();
    let window = run::resolve_week(&config, week_override.as_deref(), chrono::Utc::now())?;
    info!("Planning week {} ({} .. {})", window.week, window.start, window.end);

    // 4. Open database
    let db_path = run::resolve_db_path(&config)?;
    let db = db::Database::open(&db_path.to_string_lossy()).context("failed to open database")?;
    info!("Database opened at {}", db_path.display());

    // 5. Build providers
    let base_dir = std::env::current_dir().context("failed to read working directory")?;
    let providers = run::build_providers(&config, &base_dir)?;

    // 6. Fetch, gather, plan
    let cancel = async {
        if tokio::signal::ctrl_c().await.is_err() {
            // No signal handler available; never cancel.
            std::future::pending::<()>().await;
        }
    };
    let planned = match run::plan_week(&config, &providers, window, cancel).await {
        Ok(RunOutcome::Planned(planned)) => planned,
        Ok(RunOutcome::Cancelled) => {
            info!("Run cancelled; nothing was written");
            eprintln!("cancelled");
            return Ok(());
        }
        Err(e) => {
            error!("Run failed: {:#}", e);
            return Err(e);
        }
    };

    // 7. Print the report
    print!(
        "{}",
        report::render(
            &config.league.name,
            &planned.window,
            &planned.plan,
            &planned.stats
        )
    );

    // 8. Persist
    let persisted = run::persist(&db, &config, &planned.plan)?;
    info!(
        "Stored lineup {} and {} decisions",
        persisted.lineup_id,
        persisted.decision_ids.len()
    );

    info!("fourthdown finished");
    Ok(())
}

/// Initialize tracing to log to a file so the report on stdout stays clean.
fn init_tracing() -> anyhow::Result<()> {
    use tracing_subscriber::fmt;
    use tracing_subscriber::EnvFilter;

    let log_dir = std::env::current_dir()?.join("logs");
    std::fs::create_dir_all(&log_dir)?;

    let log_file = std::fs::File::create(log_dir.join("fourthdown.log"))?;

    let subscriber = fmt::Subscriber::builder()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("fourthdown=info,fourthdown_app=info,fourthdown_core=info,warn")
        }))
        .with_writer(log_file)
        .with_ansi(false)
        .with_target(true)
        .with_thread_ids(true)
        .with_line_number(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .context("failed to set tracing subscriber")?;

    Ok(())
}
