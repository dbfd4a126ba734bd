// SQLite persistence for lineup history and the decision log.
//
// Scores are never stored as authoritative state: a lineup row is a JSON
// snapshot of what was recommended, kept for later review.

use std::sync::{Mutex, MutexGuard};

use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use crate::lineup::Lineup;

/// A stored lineup recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineupRecord {
    pub id: i64,
    pub season: u32,
    pub week: u32,
    pub league_id: String,
    pub total_score: f64,
    pub lineup: Lineup,
    pub created_at: String,
}

/// A decision to log: what was recommended and why.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewDecision {
    pub season: u32,
    pub week: u32,
    /// e.g. "lineup", "waiver".
    pub kind: String,
    pub summary: String,
    pub detail: serde_json::Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecisionRecord {
    pub id: i64,
    pub season: u32,
    pub week: u32,
    pub kind: String,
    pub summary: String,
    pub detail: serde_json::Value,
    /// Filled in after the week is played (e.g. "started", "ignored").
    pub outcome: Option<String>,
    pub created_at: String,
}

pub struct Database {
    conn: Mutex<Connection>,
}

impl Database {
    /// Open (or create) a SQLite database at `path` and ensure all tables
    /// exist. Pass `":memory:"` for an ephemeral in-memory database.
    pub fn open(path: &str) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("failed to open database at {path}"))?;

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA busy_timeout = 5000;",
        )
        .context("failed to set database pragmas")?;

        conn.execute_batch(
            "
            CREATE TABLE IF NOT EXISTS lineup_history (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                season      INTEGER NOT NULL,
                week        INTEGER NOT NULL,
                league_id   TEXT NOT NULL,
                total_score REAL NOT NULL,
                lineup_json TEXT NOT NULL,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX IF NOT EXISTS idx_lineup_history_week
                ON lineup_history(season, week);

            CREATE TABLE IF NOT EXISTS decisions (
                id          INTEGER PRIMARY KEY AUTOINCREMENT,
                season      INTEGER NOT NULL,
                week        INTEGER NOT NULL,
                kind        TEXT NOT NULL,
                summary     TEXT NOT NULL,
                detail_json TEXT NOT NULL,
                outcome     TEXT,
                created_at  TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            );

            CREATE INDEX IF NOT EXISTS idx_decisions_week
                ON decisions(season, week);
            ",
        )
        .context("failed to create database schema")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| anyhow!("database mutex poisoned"))
    }

    // -----------------------------------------------------------------------
    // Lineup history
    // -----------------------------------------------------------------------

    /// Store a lineup snapshot. Returns the new row id.
    pub fn record_lineup(
        &self,
        season: u32,
        week: u32,
        league_id: &str,
        lineup: &Lineup,
    ) -> Result<i64> {
        let conn = self.conn()?;
        let json = serde_json::to_string(lineup).context("failed to serialize lineup")?;
        conn.execute(
            "INSERT INTO lineup_history (season, week, league_id, total_score, lineup_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![season, week, league_id, lineup.total_score(), json],
        )
        .context("failed to record lineup")?;
        Ok(conn.last_insert_rowid())
    }

    /// All lineups stored for a week, oldest first.
    pub fn load_lineups(&self, week: u32, season: u32) -> Result<Vec<LineupRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, season, week, league_id, total_score, lineup_json, created_at
                 FROM lineup_history WHERE season = ?1 AND week = ?2 ORDER BY id",
            )
            .context("failed to prepare load_lineups query")?;

        let raw = stmt
            .query_map(params![season, week], |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, u32>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, f64>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, String>(6)?,
                ))
            })
            .context("failed to query lineup history")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map lineup rows")?;

        raw.into_iter()
            .map(
                |(id, season, week, league_id, total_score, json, created_at)| -> Result<LineupRecord> {
                    let lineup: Lineup = serde_json::from_str(&json)
                        .with_context(|| format!("failed to decode lineup {id}"))?;
                    Ok(LineupRecord {
                        id,
                        season,
                        week,
                        league_id,
                        total_score,
                        lineup,
                        created_at,
                    })
                },
            )
            .collect()
    }

    /// The most recently stored lineup for a week, if any.
    pub fn latest_lineup(&self, week: u32, season: u32) -> Result<Option<LineupRecord>> {
        Ok(self.load_lineups(week, season)?.pop())
    }

    // -----------------------------------------------------------------------
    // Decision log
    // -----------------------------------------------------------------------

    pub fn record_decision(&self, decision: &NewDecision) -> Result<i64> {
        let conn = self.conn()?;
        let detail =
            serde_json::to_string(&decision.detail).context("failed to serialize decision detail")?;
        conn.execute(
            "INSERT INTO decisions (season, week, kind, summary, detail_json)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                decision.season,
                decision.week,
                decision.kind,
                decision.summary,
                detail
            ],
        )
        .context("failed to record decision")?;
        Ok(conn.last_insert_rowid())
    }

    pub fn load_decisions(&self, week: u32, season: u32) -> Result<Vec<DecisionRecord>> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare(
                "SELECT id, season, week, kind, summary, detail_json, outcome, created_at
                 FROM decisions WHERE season = ?1 AND week = ?2 ORDER BY id",
            )
            .context("failed to prepare load_decisions query")?;

        let decisions = stmt
            .query_map(params![season, week], |row| {
                let detail_json: String = row.get(5)?;
                Ok(DecisionRecord {
                    id: row.get(0)?,
                    season: row.get(1)?,
                    week: row.get(2)?,
                    kind: row.get(3)?,
                    summary: row.get(4)?,
                    detail: serde_json::from_str(&detail_json)
                        .unwrap_or(serde_json::Value::Null),
                    outcome: row.get(6)?,
                    created_at: row.get(7)?,
                })
            })
            .context("failed to query decisions")?
            .collect::<std::result::Result<Vec<_>, _>>()
            .context("failed to map decision rows")?;

        Ok(decisions)
    }

    /// Record what actually happened with a decision. Returns `false` if no
    /// decision has that id.
    pub fn mark_decision_outcome(&self, id: i64, outcome: &str) -> Result<bool> {
        let conn = self.conn()?;
        let updated = conn
            .execute(
                "UPDATE decisions SET outcome = ?1 WHERE id = ?2",
                params![outcome, id],
            )
            .context("failed to update decision outcome")?;
        Ok(updated > 0)
    }

    /// Outcome of a single decision, `None` if it has none yet or does not
    /// exist.
    pub fn decision_outcome(&self, id: i64) -> Result<Option<String>> {
        let conn = self.conn()?;
        let outcome: Option<Option<String>> = conn
            .query_row(
                "SELECT outcome FROM decisions WHERE id = ?1",
                params![id],
                |row| row.get(0),
            )
            .optional()
            .context("failed to query decision outcome")?;
        Ok(outcome.flatten())
    }
}
