// The Odds API (v4) client: game lines and player props.
//
// Game lines come from one `/odds` call. Props need one `/events/{id}/odds`
// call per game, so the event list is fetched first and narrowed to the week.
// Responses are parsed by pure functions so they can be tested offline.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures_util::future::join_all;
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::cache::RunCache;
use crate::signals::{PlayerRef, ProviderPayload, RowTarget, Signal, SignalRow};
use crate::week::WeekWindow;

use super::{ProviderError, SignalProvider};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const DEFAULT_BASE_URL: &str = "https://api.the-odds-api.com/v4";
const SPORT: &str = "americanfootball_nfl";
const GAME_MARKETS: &str = "spreads,totals";
const PROP_MARKETS: &str = "player_pass_tds,player_pass_yds,player_rush_yds,player_receptions,\
                            player_anytime_td,player_pass_completions,player_pass_attempts";
const PROVIDER_NAME: &str = "odds_api";

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
pub struct OddsEvent {
    pub id: String,
    pub commence_time: DateTime<Utc>,
    pub home_team: String,
    pub away_team: String,
    #[serde(default)]
    pub bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Bookmaker {
    pub key: String,
    #[serde(default)]
    pub markets: Vec<Market>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Market {
    pub key: String,
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Outcome {
    /// Team name for spreads, "Over"/"Under" for totals and lines, "Yes" for
    /// anytime TD.
    pub name: String,
    /// Player name on prop markets.
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub point: Option<f64>,
}

// ---------------------------------------------------------------------------
// Parsing
// ---------------------------------------------------------------------------

/// Team rows for spreads and totals. Every bookmaker's line becomes its own
/// row; the normalizer keeps the first.
pub fn parse_game_lines(events: &[OddsEvent]) -> Vec<SignalRow> {
    let mut rows = Vec::new();
    for event in events {
        let team_row = |team: &str, signal: Signal, value: f64| SignalRow {
            target: RowTarget::Team(team.to_string()),
            kickoff: Some(event.commence_time),
            week: None,
            values: vec![(signal, value)],
        };
        for book in &event.bookmakers {
            for market in &book.markets {
                match market.key.as_str() {
                    "spreads" => {
                        for o in &market.outcomes {
                            if let Some(point) = o.point {
                                rows.push(team_row(&o.name, Signal::Spread, point));
                            }
                        }
                    }
                    "totals" => {
                        let over = market
                            .outcomes
                            .iter()
                            .find(|o| o.name.eq_ignore_ascii_case("over"))
                            .and_then(|o| o.point);
                        if let Some(total) = over {
                            rows.push(team_row(&event.home_team, Signal::GameTotal, total));
                            rows.push(team_row(&event.away_team, Signal::GameTotal, total));
                        }
                    }
                    _ => {}
                }
            }
        }
    }
    rows
}

/// Signal and value for one prop outcome, if it is one we score.
fn prop_signal(market: &str, outcome: &Outcome) -> Option<(Signal, f64)> {
    let over = outcome.name.eq_ignore_ascii_case("over");
    match market {
        "player_receptions" if over => Some((Signal::ReceptionLine, outcome.point?)),
        "player_rush_yds" if over => Some((Signal::RushYardsLine, outcome.point?)),
        "player_pass_yds" if over => Some((Signal::PassYardsLine, outcome.point?)),
        "player_pass_completions" if over => Some((Signal::CompletionsLine, outcome.point?)),
        "player_pass_attempts" if over => Some((Signal::AttemptsLine, outcome.point?)),
        "player_pass_tds" if over && outcome.point == Some(1.5) => {
            Some((Signal::PassTdsOdds, outcome.price?))
        }
        "player_anytime_td" if outcome.name.eq_ignore_ascii_case("yes") => {
            Some((Signal::TdOdds, outcome.price?))
        }
        _ => None,
    }
}

/// Player rows for one event's props. The player could be on either side,
/// so both teams are offered to the identity matcher.
pub fn parse_player_props(event: &OddsEvent) -> Vec<SignalRow> {
    let mut rows = Vec::new();
    for book in &event.bookmakers {
        for market in &book.markets {
            for outcome in &market.outcomes {
                let Some(player) = outcome.description.as_deref() else {
                    continue;
                };
                let Some(value) = prop_signal(&market.key, outcome) else {
                    continue;
                };
                rows.push(SignalRow {
                    target: RowTarget::Player(PlayerRef {
                        id: None,
                        name: player.to_string(),
                        teams: vec![event.home_team.clone(), event.away_team.clone()],
                    }),
                    kickoff: Some(event.commence_time),
                    week: None,
                    values: vec![value],
                });
            }
        }
    }
    rows
}

fn decode<T: for<'de> Deserialize<'de>>(what: &str, value: Value) -> Result<T, ProviderError> {
    serde_json::from_value(value).map_err(|e| ProviderError::Parse {
        what: what.to_string(),
        message: e.to_string(),
    })
}

// ---------------------------------------------------------------------------
// OddsApiProvider
// ---------------------------------------------------------------------------

pub struct OddsApiProvider {
    http: reqwest::Client,
    base_url: String,
    api_key: String,
    regions: String,
}

impl OddsApiProvider {
    pub fn new(api_key: String, base_url: String, regions: String) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
            regions,
        }
    }

    /// GET `path` with `params`, served from the run cache when possible.
    async fn get_json(
        &self,
        cache: &RunCache,
        cache_key: &str,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<Value, ProviderError> {
        if let Some(hit) = cache.get(cache_key) {
            return Ok(hit);
        }

        let url = format!("{}{}", self.base_url, path);
        debug!(url = %url, "odds api request");
        let response = self
            .http
            .get(&url)
            .query(&[("apiKey", self.api_key.as_str())])
            .query(params)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ProviderError::Status {
                provider: PROVIDER_NAME.into(),
                status: response.status().as_u16(),
            });
        }

        let body: Value = response.json().await?;
        cache.insert(cache_key, body.clone());
        Ok(body)
    }

    async fn fetch_event_props(
        &self,
        cache: &RunCache,
        event_id: &str,
    ) -> Result<OddsEvent, ProviderError> {
        let path = format!("/sports/{SPORT}/events/{event_id}/odds");
        let body = self
            .get_json(
                cache,
                &format!("odds_api:props:{event_id}"),
                &path,
                &[
                    ("regions", self.regions.as_str()),
                    ("markets", PROP_MARKETS),
                    ("oddsFormat", "american"),
                    ("dateFormat", "iso"),
                ],
            )
            .await?;
        decode("event props", body)
    }
}

#[derive(Debug, Deserialize)]
struct EventSummary {
    id: String,
    commence_time: DateTime<Utc>,
}

#[async_trait]
impl SignalProvider for OddsApiProvider {
    fn name(&self) -> &str {
        PROVIDER_NAME
    }

    async fn fetch_signals(
        &self,
        window: &WeekWindow,
        cache: &RunCache,
    ) -> Result<ProviderPayload, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured("odds API key".into()));
        }

        let mut payload = ProviderPayload::new(PROVIDER_NAME);

        let odds_path = format!("/sports/{SPORT}/odds");
        let body = self
            .get_json(
                cache,
                "odds_api:game_lines",
                &odds_path,
                &[
                    ("regions", self.regions.as_str()),
                    ("markets", GAME_MARKETS),
                    ("oddsFormat", "american"),
                    ("dateFormat", "iso"),
                ],
            )
            .await?;
        let events: Vec<OddsEvent> = decode("game lines", body)?;
        payload.rows.extend(parse_game_lines(&events));

        let events_path = format!("/sports/{SPORT}/events");
        let body = self
            .get_json(cache, "odds_api:events", &events_path, &[("dateFormat", "iso")])
            .await?;
        let summaries: Vec<EventSummary> = decode("event list", body)?;
        let this_week: Vec<&EventSummary> = summaries
            .iter()
            .filter(|e| window.contains(e.commence_time))
            .collect();

        let props = join_all(this_week.iter().map(|e| self.fetch_event_props(cache, &e.id))).await;
        for (summary, result) in this_week.iter().zip(props) {
            match result {
                Ok(event) => payload.rows.extend(parse_player_props(&event)),
                // One game's props failing does not sink the rest.
                Err(e) => warn!(event = %summary.id, error = %e, "player props unavailable"),
            }
        }

        Ok(payload)
    }
}
