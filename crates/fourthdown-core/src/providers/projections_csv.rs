// Weekly fantasy-point projections from a CSV export.
//
// Expected columns (extra columns are ignored):
//   Player (or Name), Team, FPTS (or Proj / Points), optional Pos, Week, Id.

use std::io::Read;
use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::warn;

use crate::cache::RunCache;
use crate::model::PlayerId;
use crate::signals::{PlayerRef, ProviderPayload, RowTarget, Signal, SignalRow};
use crate::week::WeekWindow;

use super::{ProviderError, SignalProvider};

const PROVIDER_NAME: &str = "projections_csv";

#[derive(Debug, Deserialize)]
#[allow(non_snake_case)]
struct RawProjection {
    #[serde(alias = "Name")]
    Player: String,
    #[serde(default)]
    Team: String,
    #[serde(alias = "Proj", alias = "Points")]
    FPTS: f64,
    #[serde(default)]
    Week: Option<u32>,
    #[serde(default)]
    Id: Option<String>,
}

/// Parse projection rows from any reader. Malformed or non-finite rows are
/// skipped with a warning.
pub fn parse_projections<R: Read>(rdr: R) -> Result<Vec<SignalRow>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut rows = Vec::new();
    for result in reader.deserialize::<RawProjection>() {
        match result {
            Ok(raw) => {
                if !raw.FPTS.is_finite() {
                    warn!("skipping projection for '{}': non-finite FPTS", raw.Player);
                    continue;
                }
                let teams = if raw.Team.is_empty() {
                    vec![]
                } else {
                    vec![raw.Team]
                };
                rows.push(SignalRow {
                    target: RowTarget::Player(PlayerRef {
                        id: raw.Id.filter(|s| !s.is_empty()).map(PlayerId),
                        name: raw.Player,
                        teams,
                    }),
                    kickoff: None,
                    week: raw.Week,
                    values: vec![(Signal::ProjectedPoints, raw.FPTS)],
                });
            }
            Err(e) => warn!("skipping malformed projection row: {}", e),
        }
    }
    Ok(rows)
}

pub struct ProjectionsCsvProvider {
    path: PathBuf,
}

impl ProjectionsCsvProvider {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl SignalProvider for ProjectionsCsvProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_signals(
        &self,
        _window: &WeekWindow,
        _cache: &RunCache,
    ) -> Result<ProviderPayload, ProviderError> {
        let text = tokio::fs::read_to_string(&self.path)
            .await
            .map_err(|source| ProviderError::Io {
                path: self.path.clone(),
                source,
            })?;
        Ok(ProviderPayload {
            provider: PROVIDER_NAME.into(),
            rows: parse_projections(text.as_bytes())?,
        })
    }
}
