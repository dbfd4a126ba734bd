// Configuration loading and parsing (league.toml, strategy.toml, credentials.toml).

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::lineup::{RosterShape, SlotSpec};
use crate::model::Position;
use crate::scoring::{Bucket, BucketRule, Category, CategoryWeights, ScoringRules};
use crate::signals::normalizer::InjuryDefaults;
use crate::signals::Signal;
use crate::waiver::WaiverPolicy;

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {path}")]
    FileNotFound { path: PathBuf },

    #[error("failed to parse config file {path}: {source}")]
    ParseError {
        path: PathBuf,
        source: toml::de::Error,
    },

    #[error("validation error for field `{field}`: {message}")]
    ValidationError { field: String, message: String },

    #[error("failed to initialize config from defaults: {message}")]
    DefaultsCopyError { message: String },
}

fn invalid(field: impl Into<String>, message: impl Into<String>) -> ConfigError {
    ConfigError::ValidationError {
        field: field.into(),
        message: message.into(),
    }
}

// ---------------------------------------------------------------------------
// Top-level assembled Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Config {
    pub league: LeagueConfig,
    pub shape: RosterShape,
    pub strategy: StrategyConfig,
    pub providers: ProvidersConfig,
    pub credentials: CredentialsConfig,
    /// Empty means "use the platform data directory".
    pub db_path: String,
}

// ---------------------------------------------------------------------------
// league.toml structs
// ---------------------------------------------------------------------------

/// Wrapper for the top-level `[league]` table in league.toml.
#[derive(Debug, Clone, Deserialize)]
struct LeagueFile {
    league: RawLeague,
}

#[derive(Debug, Clone, Deserialize)]
struct RawLeague {
    name: String,
    platform: String,
    league_id: String,
    team_id: String,
    season: u32,
    season_start: NaiveDate,
    #[serde(default)]
    slots: Vec<RawSlot>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawSlot {
    name: String,
    #[serde(default)]
    accepts: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct LeagueConfig {
    pub name: String,
    pub platform: String,
    pub league_id: String,
    pub team_id: String,
    pub season: u32,
    /// The Tuesday that opens week 1.
    pub season_start: NaiveDate,
}

// ---------------------------------------------------------------------------
// strategy.toml structs
// ---------------------------------------------------------------------------

/// Raw deserialization target for the entire strategy.toml file.
#[derive(Debug, Clone, Deserialize)]
struct StrategyFile {
    weights: CategoryWeights,
    #[serde(default)]
    injury: InjuryDefaults,
    #[serde(default)]
    rules: Vec<RawRule>,
    waiver: WaiverPolicy,
    providers: ProvidersConfig,
    database: DatabaseSection,
}

#[derive(Debug, Clone, Deserialize)]
struct RawRule {
    signal: String,
    #[serde(default)]
    positions: Option<Vec<String>>,
    category: Category,
    #[serde(default)]
    buckets: Vec<Bucket>,
    #[serde(default)]
    ignore_above: Option<f64>,
}

#[derive(Debug, Clone, Deserialize)]
struct DatabaseSection {
    #[serde(default)]
    path: String,
}

/// The public strategy config assembled from the strategy.toml sections.
#[derive(Debug, Clone)]
pub struct StrategyConfig {
    pub scoring: ScoringRules,
    pub injury: InjuryDefaults,
    pub waiver: WaiverPolicy,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProvidersConfig {
    /// Per-provider fetch timeout.
    pub timeout_secs: u64,
    #[serde(default = "default_odds_base_url")]
    pub odds_api_base_url: String,
    #[serde(default = "default_odds_regions")]
    pub odds_api_regions: String,
    /// Empty disables the projections provider.
    #[serde(default)]
    pub projections_csv: String,
    /// Snapshot JSON serving as roster source and manual signal provider.
    pub snapshot: String,
}

fn default_odds_base_url() -> String {
    crate::providers::odds_api::DEFAULT_BASE_URL.to_string()
}

fn default_odds_regions() -> String {
    "us".to_string()
}

// ---------------------------------------------------------------------------
// credentials.toml structs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, Default)]
pub struct CredentialsConfig {
    pub odds_api_key: Option<String>,
}

// ---------------------------------------------------------------------------
// Loading logic
// ---------------------------------------------------------------------------

/// Load and validate configuration from `config/league.toml`,
/// `config/strategy.toml`, and (optionally) `config/credentials.toml`,
/// all relative to the given `base_dir`.
///
/// Does not copy defaults; `load_config()` does.
pub fn load_config_from(base_dir: &Path) -> Result<Config, ConfigError> {
    let config_dir = base_dir.join("config");

    // --- league.toml (required) ---
    let league_path = config_dir.join("league.toml");
    let league_text = read_file(&league_path)?;
    let league_file: LeagueFile =
        toml::from_str(&league_text).map_err(|e| ConfigError::ParseError {
            path: league_path.clone(),
            source: e,
        })?;
    let raw_league = league_file.league;

    // --- strategy.toml (required) ---
    let strategy_path = config_dir.join("strategy.toml");
    let strategy_text = read_file(&strategy_path)?;
    let strategy_file: StrategyFile =
        toml::from_str(&strategy_text).map_err(|e| ConfigError::ParseError {
            path: strategy_path.clone(),
            source: e,
        })?;

    // --- credentials.toml (optional) ---
    let credentials_path = config_dir.join("credentials.toml");
    let credentials = if credentials_path.exists() {
        let cred_text = read_file(&credentials_path)?;
        toml::from_str(&cred_text).map_err(|e| ConfigError::ParseError {
            path: credentials_path.clone(),
            source: e,
        })?
    } else {
        CredentialsConfig::default()
    };

    let shape = build_shape(&raw_league.slots)?;
    let rules = strategy_file
        .rules
        .iter()
        .enumerate()
        .map(|(i, r)| build_rule(i, r))
        .collect::<Result<Vec<_>, _>>()?;

    let config = Config {
        league: LeagueConfig {
            name: raw_league.name,
            platform: raw_league.platform,
            league_id: raw_league.league_id,
            team_id: raw_league.team_id,
            season: raw_league.season,
            season_start: raw_league.season_start,
        },
        shape,
        strategy: StrategyConfig {
            scoring: ScoringRules {
                weights: strategy_file.weights,
                rules,
            },
            injury: strategy_file.injury,
            waiver: strategy_file.waiver,
        },
        providers: strategy_file.providers,
        credentials,
        db_path: strategy_file.database.path,
    };

    validate(&config)?;

    Ok(config)
}

/// Ensure all config files exist by copying missing ones from `defaults/`.
/// Returns the list of files that were copied. Skips `.example` files.
pub fn ensure_config_files(base_dir: &Path) -> Result<Vec<PathBuf>, ConfigError> {
    let defaults_dir = base_dir.join("defaults");
    let config_dir = base_dir.join("config");

    if !defaults_dir.exists() {
        if !config_dir.exists() {
            return Err(ConfigError::DefaultsCopyError {
                message: format!(
                    "neither defaults/ nor config/ directory found in {}; \
                     run from the project root or ensure defaults/ is present",
                    base_dir.display()
                ),
            });
        }
        return Ok(vec![]);
    }

    std::fs::create_dir_all(&config_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to create config directory: {e}"),
    })?;

    let mut copied = Vec::new();

    let entries = std::fs::read_dir(&defaults_dir).map_err(|e| ConfigError::DefaultsCopyError {
        message: format!("failed to read defaults directory: {e}"),
    })?;

    for entry in entries {
        let entry = entry.map_err(|e| ConfigError::DefaultsCopyError {
            message: format!("failed to read defaults entry: {e}"),
        })?;
        let path = entry.path();

        if !path.is_file() {
            continue;
        }
        let Some(file_name) = path.file_name() else {
            continue;
        };
        if file_name.to_str().is_some_and(|n| n.ends_with(".example")) {
            continue;
        }
        let target = config_dir.join(file_name);

        match std::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
        {
            Ok(mut dest) => {
                let content = std::fs::read(&path).map_err(|e| ConfigError::DefaultsCopyError {
                    message: format!("failed to read {}: {e}", path.display()),
                })?;
                std::io::Write::write_all(&mut dest, &content).map_err(|e| {
                    ConfigError::DefaultsCopyError {
                        message: format!("failed to write {}: {e}", target.display()),
                    }
                })?;
                copied.push(target);
            }
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {}
            Err(e) => {
                return Err(ConfigError::DefaultsCopyError {
                    message: format!("failed to create {}: {e}", target.display()),
                });
            }
        }
    }

    Ok(copied)
}

/// Loads config relative to the current working directory, copying default
/// config files first.
pub fn load_config() -> Result<Config, ConfigError> {
    let cwd = std::env::current_dir().map_err(|_| ConfigError::FileNotFound {
        path: PathBuf::from("."),
    })?;
    ensure_config_files(&cwd)?;
    load_config_from(&cwd)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn read_file(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
        path: path.to_path_buf(),
    })
}

fn parse_positions(field: &str, raw: &[String]) -> Result<Vec<Position>, ConfigError> {
    raw.iter()
        .map(|s| {
            Position::from_str_pos(s).ok_or_else(|| invalid(field, format!("unknown position `{s}`")))
        })
        .collect()
}

fn build_shape(raw: &[RawSlot]) -> Result<RosterShape, ConfigError> {
    if raw.is_empty() {
        return Err(invalid("league.slots", "at least one slot is required"));
    }
    let mut seen = HashSet::new();
    let mut slots = Vec::with_capacity(raw.len());
    for (i, slot) in raw.iter().enumerate() {
        let field = format!("league.slots[{i}]");
        let name = slot.name.trim();
        if name.is_empty() {
            return Err(invalid(format!("{field}.name"), "must not be empty"));
        }
        if !seen.insert(name.to_uppercase()) {
            return Err(invalid(
                format!("{field}.name"),
                format!("duplicate slot name `{name}`"),
            ));
        }
        if slot.accepts.is_empty() {
            return Err(invalid(
                format!("{field}.accepts"),
                "must accept at least one position",
            ));
        }
        let accepts = parse_positions(&format!("{field}.accepts"), &slot.accepts)?;
        let mut distinct = HashSet::new();
        if let Some(dup) = accepts.iter().find(|p| !distinct.insert(**p)) {
            return Err(invalid(
                format!("{field}.accepts"),
                format!("position `{dup}` listed more than once"),
            ));
        }
        slots.push(SlotSpec {
            name: name.to_string(),
            accepts,
        });
    }
    Ok(RosterShape::new(slots))
}

fn build_rule(index: usize, raw: &RawRule) -> Result<BucketRule, ConfigError> {
    let field = format!("rules[{index}]");
    let signal = Signal::from_name(raw.signal.trim())
        .ok_or_else(|| invalid(format!("{field}.signal"), format!("unknown signal `{}`", raw.signal)))?;
    let positions = match &raw.positions {
        Some(ps) if ps.is_empty() => {
            return Err(invalid(
                format!("{field}.positions"),
                "omit the key to apply to every position",
            ))
        }
        Some(ps) => Some(parse_positions(&format!("{field}.positions"), ps)?),
        None => None,
    };
    Ok(BucketRule {
        signal,
        positions,
        category: raw.category,
        buckets: raw.buckets.clone(),
        ignore_above: raw.ignore_above,
    })
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

fn validate(config: &Config) -> Result<(), ConfigError> {
    // League validations
    if config.league.league_id.trim().is_empty() {
        return Err(invalid("league.league_id", "must not be empty"));
    }
    if config.league.team_id.trim().is_empty() {
        return Err(invalid("league.team_id", "must not be empty"));
    }

    // Category weights: each >= 0, summing to 1.0
    let w = &config.strategy.scoring.weights;
    for category in Category::ALL {
        let val = w.weight(category);
        if !val.is_finite() || val < 0.0 {
            return Err(invalid(
                format!("weights.{}", category.name()),
                format!("must be >= 0, got {val}"),
            ));
        }
    }
    let sum = w.sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(invalid("weights", format!("must sum to 1.0, got {sum}")));
    }

    // Bucket rules
    for (i, rule) in config.strategy.scoring.rules.iter().enumerate() {
        let field = format!("rules[{i}]");
        if rule.buckets.is_empty() {
            return Err(invalid(format!("{field}.buckets"), "at least one bucket is required"));
        }
        for (j, bucket) in rule.buckets.iter().enumerate() {
            bucket
                .check()
                .map_err(|m| invalid(format!("{field}.buckets[{j}]"), m))?;
        }
        if rule.ignore_above.is_some_and(|cap| !cap.is_finite()) {
            return Err(invalid(format!("{field}.ignore_above"), "must be finite"));
        }
        rule.check_monotonic()
            .map_err(|m| invalid(format!("{field}.buckets"), m))?;
    }

    // Injury defaults
    let injury = &config.strategy.injury;
    for (name, val) in [
        ("injury.questionable", injury.questionable),
        ("injury.doubtful", injury.doubtful),
    ] {
        if !(0.0..=1.0).contains(&val) {
            return Err(invalid(
                name,
                format!("must be between 0.0 and 1.0 inclusive, got {val}"),
            ));
        }
    }

    // Waiver policy
    let waiver = &config.strategy.waiver;
    if !waiver.margin.is_finite() || waiver.margin < 0.0 {
        return Err(invalid(
            "waiver.margin",
            format!("must be >= 0, got {}", waiver.margin),
        ));
    }
    if waiver.max_suggestions == 0 {
        return Err(invalid("waiver.max_suggestions", "must be > 0"));
    }
    for (i, name) in waiver.skip_slots.iter().enumerate() {
        if !config
            .shape
            .slots
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(name))
        {
            return Err(invalid(
                format!("waiver.skip_slots[{i}]"),
                format!("no slot named `{name}`"),
            ));
        }
    }

    // Providers
    if config.providers.timeout_secs == 0 {
        return Err(invalid("providers.timeout_secs", "must be > 0"));
    }
    if config.providers.snapshot.trim().is_empty() {
        return Err(invalid("providers.snapshot", "must not be empty"));
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    /// Workspace root, where `defaults/` lives.
    fn project_root() -> PathBuf {
        Path::new(env!("CARGO_MANIFEST_DIR")).join("../..")
    }

    fn default_text(name: &str) -> String {
        fs::read_to_string(project_root().join("defaults").join(name)).unwrap()
    }

    /// Write the given league/strategy text into a fresh temp config dir.
    fn temp_config(test_name: &str, league: &str, strategy: &str) -> PathBuf {
        let tmp = std::env::temp_dir().join(format!("fourthdown_config_{test_name}"));
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/league.toml"), league).unwrap();
        fs::write(tmp.join("config/strategy.toml"), strategy).unwrap();
        tmp
    }

    fn expect_validation(result: Result<Config, ConfigError>, expected_field: &str) {
        match result {
            Err(ConfigError::ValidationError { field, .. }) => {
                assert!(
                    field.starts_with(expected_field),
                    "expected field {expected_field}, got {field}"
                );
            }
            Err(other) => panic!("expected ValidationError, got {other}"),
            Ok(_) => panic!("expected ValidationError for {expected_field}, got Ok"),
        }
    }

    #[test]
    fn load_default_config() {
        let tmp = temp_config(
            "defaults",
            &default_text("league.toml"),
            &default_text("strategy.toml"),
        );
        let config = load_config_from(&tmp).expect("defaults should load");

        assert_eq!(config.league.platform, "yahoo");
        assert_eq!(config.league.season, 2025);
        assert_eq!(
            config.league.season_start,
            NaiveDate::from_ymd_opt(2025, 9, 2).unwrap()
        );
        assert_eq!(config.shape, RosterShape::standard());

        let weights = config.strategy.scoring.weights;
        assert!((weights.sum() - 1.0).abs() < 1e-9);
        assert!(!config.strategy.scoring.rules.is_empty());
        assert!(config
            .strategy
            .scoring
            .rules
            .iter()
            .any(|r| r.signal == Signal::PlayProbability));
        assert_eq!(config.strategy.injury, InjuryDefaults::default());
        assert!(config.strategy.waiver.max_suggestions > 0);
        assert!(config.providers.timeout_secs > 0);
        assert!(config.credentials.odds_api_key.is_none());
    }

    #[test]
    fn ensure_config_files_copies_defaults_but_not_examples() {
        let tmp = std::env::temp_dir().join("fourthdown_config_ensure");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("defaults")).unwrap();
        fs::write(tmp.join("defaults/league.toml"), default_text("league.toml")).unwrap();
        fs::write(tmp.join("defaults/credentials.toml.example"), "odds_api_key = \"x\"").unwrap();
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/league.toml"), "# user edited").unwrap();

        let copied = ensure_config_files(&tmp).unwrap();
        assert!(copied.is_empty());
        assert_eq!(
            fs::read_to_string(tmp.join("config/league.toml")).unwrap(),
            "# user edited"
        );
        assert!(!tmp.join("config/credentials.toml.example").exists());

        fs::remove_file(tmp.join("config/league.toml")).unwrap();
        let copied = ensure_config_files(&tmp).unwrap();
        assert_eq!(copied.len(), 1);
    }

    #[test]
    fn missing_defaults_and_config_is_an_error() {
        let tmp = std::env::temp_dir().join("fourthdown_config_nothing");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(&tmp).unwrap();
        assert!(matches!(
            ensure_config_files(&tmp),
            Err(ConfigError::DefaultsCopyError { .. })
        ));
    }

    #[test]
    fn missing_strategy_is_file_not_found() {
        let tmp = std::env::temp_dir().join("fourthdown_config_no_strategy");
        let _ = fs::remove_dir_all(&tmp);
        fs::create_dir_all(tmp.join("config")).unwrap();
        fs::write(tmp.join("config/league.toml"), default_text("league.toml")).unwrap();
        assert!(matches!(
            load_config_from(&tmp),
            Err(ConfigError::FileNotFound { .. })
        ));
    }

    #[test]
    fn credentials_are_read_when_present() {
        let tmp = temp_config(
            "creds",
            &default_text("league.toml"),
            &default_text("strategy.toml"),
        );
        fs::write(tmp.join("config/credentials.toml"), "odds_api_key = \"abc123\"\n").unwrap();
        let config = load_config_from(&tmp).unwrap();
        assert_eq!(config.credentials.odds_api_key.as_deref(), Some("abc123"));
    }

    #[test]
    fn weights_must_sum_to_one() {
        let strategy = default_text("strategy.toml").replace("market = 0.25", "market = 0.5");
        let tmp = temp_config("weights_sum", &default_text("league.toml"), &strategy);
        expect_validation(load_config_from(&tmp), "weights");
    }

    #[test]
    fn negative_weight_is_rejected() {
        let strategy = default_text("strategy.toml")
            .replace("market = 0.25", "market = -0.25")
            .replace("projection = 0.25", "projection = 0.75");
        let tmp = temp_config("weights_negative", &default_text("league.toml"), &strategy);
        expect_validation(load_config_from(&tmp), "weights.market");
    }

    #[test]
    fn unknown_slot_position_names_the_slot() {
        let league = default_text("league.toml").replace("accepts = [\"K\"]", "accepts = [\"LB\"]");
        let tmp = temp_config("bad_position", &league, &default_text("strategy.toml"));
        expect_validation(load_config_from(&tmp), "league.slots[7].accepts");
    }

    #[test]
    fn repeated_position_in_a_slot_is_rejected() {
        // Non-adjacent repeat, and a second spelling of the same position.
        for (case, accepts) in [
            ("nonadjacent", "accepts = [\"RB\", \"WR\", \"RB\"]"),
            ("alias", "accepts = [\"RB\", \"DEF\", \"DST\"]"),
        ] {
            let league =
                default_text("league.toml").replace("accepts = [\"RB\", \"WR\", \"TE\"]", accepts);
            let tmp = temp_config(&format!("dup_accepts_{case}"), &league, &default_text("strategy.toml"));
            expect_validation(load_config_from(&tmp), "league.slots[5].accepts");
        }
    }

    #[test]
    fn duplicate_slot_name_is_rejected() {
        let league = default_text("league.toml").replace("name = \"RB2\"", "name = \"RB1\"");
        let tmp = temp_config("dup_slot", &league, &default_text("strategy.toml"));
        expect_validation(load_config_from(&tmp), "league.slots[2].name");
    }

    #[test]
    fn unknown_signal_is_rejected() {
        let strategy = default_text("strategy.toml")
            .replacen("signal = \"game_total\"", "signal = \"vibes\"", 1);
        let tmp = temp_config("bad_signal", &default_text("league.toml"), &strategy);
        expect_validation(load_config_from(&tmp), "rules[0].signal");
    }

    #[test]
    fn non_monotonic_rule_is_rejected() {
        let strategy = format!(
            "{}\n[[rules]]\nsignal = \"temperature\"\ncategory = \"environment\"\nbuckets = [\n  {{ below = 20.0, points = -1.0 }},\n  {{ above = 90.0, points = -1.0 }},\n]\n",
            default_text("strategy.toml")
        );
        let tmp = temp_config("non_monotonic", &default_text("league.toml"), &strategy);
        expect_validation(load_config_from(&tmp), "rules[");
    }

    #[test]
    fn negative_waiver_margin_is_rejected() {
        let strategy = default_text("strategy.toml").replace("margin = 1.0", "margin = -1.0");
        let tmp = temp_config("bad_margin", &default_text("league.toml"), &strategy);
        expect_validation(load_config_from(&tmp), "waiver.margin");
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let strategy = default_text("strategy.toml").replace("timeout_secs = 15", "timeout_secs = 0");
        let tmp = temp_config("zero_timeout", &default_text("league.toml"), &strategy);
        expect_validation(load_config_from(&tmp), "providers.timeout_secs");
    }

    #[test]
    fn play_probability_out_of_range_is_rejected() {
        let strategy = default_text("strategy.toml").replace("questionable = 0.6", "questionable = 1.5");
        let tmp = temp_config("bad_prob", &default_text("league.toml"), &strategy);
        expect_validation(load_config_from(&tmp), "injury.questionable");
    }
}
