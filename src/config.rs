use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ConfigError;
use crate::stats::StatFamily;

const APP_DIR: &str = "mlb_daily_model";
const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub weights: ModelWeights,
    pub league: LeagueAverages,
    pub home_field_runs: f64,
    pub win_prob_scale: f64,
    pub betting: BettingConfig,
    pub cache: CacheConfig,
    pub http: HttpConfig,
    pub sources: SourcesConfig,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            weights: ModelWeights::default(),
            league: LeagueAverages::default(),
            home_field_runs: 0.0,
            win_prob_scale: 1.5,
            betting: BettingConfig::default(),
            cache: CacheConfig::default(),
            http: HttpConfig::default(),
            sources: SourcesConfig::default(),
        }
    }
}

/// Group weights split a side's expected runs between its own offense, the
/// opposing starter and the opposing bullpen. Each group's member weights are
/// normalized shares of that group.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelWeights {
    pub offense: f64,
    pub starter: f64,
    pub bullpen: f64,
    pub offense_members: OffenseWeights,
    pub starter_members: StarterWeights,
    pub bullpen_members: BullpenWeights,
    /// Blend of the home park factor into both sides: 0 ignores it, 1 applies it fully.
    pub park: f64,
}

impl Default for ModelWeights {
    fn default() -> Self {
        Self {
            offense: 0.4,
            starter: 0.5,
            bullpen: 0.1,
            offense_members: OffenseWeights::default(),
            starter_members: StarterWeights::default(),
            bullpen_members: BullpenWeights::default(),
            park: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OffenseWeights {
    pub runs_per_game: f64,
    pub on_base_pct: f64,
    pub power_rating: f64,
}

impl Default for OffenseWeights {
    fn default() -> Self {
        Self {
            runs_per_game: 1.0,
            on_base_pct: 0.0,
            power_rating: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct StarterWeights {
    pub era: f64,
    pub fip: f64,
    pub whip: f64,
}

impl Default for StarterWeights {
    fn default() -> Self {
        Self {
            era: 0.6,
            fip: 0.4,
            whip: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BullpenWeights {
    pub era: f64,
    pub whip: f64,
    pub runs_allowed_per_game: f64,
}

impl Default for BullpenWeights {
    fn default() -> Self {
        Self {
            era: 1.0,
            whip: 0.0,
            runs_allowed_per_game: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LeagueAverages {
    pub runs_per_game: f64,
    pub runs_allowed_per_game: f64,
    pub starter_era: f64,
    pub starter_fip: f64,
    pub starter_whip: f64,
    pub bullpen_era: f64,
    pub bullpen_whip: f64,
    pub on_base_pct: f64,
    pub park_factor: f64,
    pub power_rating: f64,
}

impl Default for LeagueAverages {
    fn default() -> Self {
        Self {
            runs_per_game: 4.45,
            runs_allowed_per_game: 4.45,
            starter_era: 4.20,
            starter_fip: 4.20,
            starter_whip: 1.28,
            bullpen_era: 4.05,
            bullpen_whip: 1.32,
            on_base_pct: 0.315,
            park_factor: 100.0,
            power_rating: 0.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BettingConfig {
    pub threshold: f64,
}

impl Default for BettingConfig {
    fn default() -> Self {
        Self { threshold: 2.0 }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub freshness_hours: f64,
    pub dir: Option<PathBuf>,
    /// Skip live fetches entirely; resolve from snapshots and fallbacks only.
    pub offline: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            freshness_hours: 24.0,
            dir: None,
            offline: false,
        }
    }
}

impl CacheConfig {
    pub fn resolved_dir(&self) -> Option<PathBuf> {
        self.dir.clone().or_else(app_cache_dir)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: "Mozilla/5.0 (Windows NT 10.0; Win64; x64)".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct SourceEndpoint {
    pub primary: Option<String>,
    #[serde(default)]
    pub fallback: Option<String>,
}

impl SourceEndpoint {
    fn new(primary: &str, fallback: Option<&str>) -> Self {
        Self {
            primary: Some(primary.to_string()),
            fallback: fallback.map(|s| s.to_string()),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub schedule: String,
    /// Season substituted for `{season}`; defaults to the schedule date's year.
    pub season: Option<i32>,
    pub runs_per_game: SourceEndpoint,
    pub runs_allowed_per_game: SourceEndpoint,
    pub bullpen: SourceEndpoint,
    pub starting_pitchers: SourceEndpoint,
    pub on_base: SourceEndpoint,
    pub park_factor: SourceEndpoint,
    pub power_rating: SourceEndpoint,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            schedule: "https://site.api.espn.com/apis/site/v2/sports/baseball/mlb/scoreboard?dates={date}"
                .to_string(),
            season: None,
            runs_per_game: SourceEndpoint::new(
                "https://www.teamrankings.com/mlb/stat/runs-per-game",
                None,
            ),
            runs_allowed_per_game: SourceEndpoint::new(
                "https://www.teamrankings.com/mlb/stat/opponent-runs-per-game",
                None,
            ),
            bullpen: SourceEndpoint::new(
                "https://www.covers.com/sport/baseball/mlb/statistics/team-bullpenera/{season}",
                None,
            ),
            starting_pitchers: SourceEndpoint::new(
                "https://www.fangraphs.com/leaders.aspx?pos=all&stats=sta&lg=all&qual=0&type=8&season={season}&month=0&season1={season}&ind=0&team=0&rost=0&age=0&filter=&players=0&sort=20,d&csv=1",
                None,
            ),
            on_base: SourceEndpoint::new(
                "https://www.teamrankings.com/mlb/stat/on-base-percentage",
                None,
            ),
            // Park factors barely move within a season; a checked-in sheet serves.
            park_factor: SourceEndpoint {
                primary: None,
                fallback: Some("data/park_factors.csv".to_string()),
            },
            power_rating: SourceEndpoint::new(
                "https://www.teamrankings.com/mlb/ranking/predictive-by-other",
                None,
            ),
        }
    }
}

impl SourcesConfig {
    pub fn endpoint(&self, family: StatFamily) -> &SourceEndpoint {
        match family {
            StatFamily::RunsPerGame => &self.runs_per_game,
            StatFamily::RunsAllowedPerGame => &self.runs_allowed_per_game,
            StatFamily::Bullpen => &self.bullpen,
            StatFamily::StartingPitchers => &self.starting_pitchers,
            StatFamily::OnBase => &self.on_base,
            StatFamily::ParkFactor => &self.park_factor,
            StatFamily::PowerRating => &self.power_rating,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut cfg = match path {
            Some(path) => Self::from_toml_file(path)?,
            None => Self::default(),
        };
        cfg.apply_env()?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn from_toml_file(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw)
    }

    pub fn from_toml_str(raw: &str) -> Result<Self, ConfigError> {
        toml::from_str(raw).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    fn apply_env(&mut self) -> Result<(), ConfigError> {
        if let Some(v) = env_f64("MODEL_THRESHOLD")? {
            self.betting.threshold = v;
        }
        if let Some(v) = env_f64("MODEL_CACHE_HOURS")? {
            self.cache.freshness_hours = v;
        }
        if let Some(v) = env_f64("MODEL_HTTP_TIMEOUT_SECS")? {
            self.http.timeout_secs = v.max(0.0) as u64;
        }
        if let Ok(dir) = env::var("MODEL_CACHE_DIR") {
            if !dir.trim().is_empty() {
                self.cache.dir = Some(PathBuf::from(dir.trim()));
            }
        }
        if env_bool("MODEL_OFFLINE", false) {
            self.cache.offline = true;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let w = &self.weights;
        check_group(
            "group",
            &[("offense", w.offense), ("starter", w.starter), ("bullpen", w.bullpen)],
        )?;
        let o = &w.offense_members;
        check_group(
            "offense",
            &[
                ("runs_per_game", o.runs_per_game),
                ("on_base_pct", o.on_base_pct),
                ("power_rating", o.power_rating),
            ],
        )?;
        let s = &w.starter_members;
        check_group("starter", &[("era", s.era), ("fip", s.fip), ("whip", s.whip)])?;
        let b = &w.bullpen_members;
        check_group(
            "bullpen",
            &[
                ("era", b.era),
                ("whip", b.whip),
                ("runs_allowed_per_game", b.runs_allowed_per_game),
            ],
        )?;
        if !(0.0..=1.0).contains(&w.park) {
            return Err(ConfigError::OutOfRange {
                name: "weights.park",
                value: w.park,
            });
        }
        if !self.betting.threshold.is_finite() || self.betting.threshold < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "betting.threshold",
                value: self.betting.threshold,
            });
        }
        if !self.win_prob_scale.is_finite() || self.win_prob_scale <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "win_prob_scale",
                value: self.win_prob_scale,
            });
        }
        if !self.home_field_runs.is_finite() {
            return Err(ConfigError::OutOfRange {
                name: "home_field_runs",
                value: self.home_field_runs,
            });
        }
        if !self.cache.freshness_hours.is_finite() || self.cache.freshness_hours < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "cache.freshness_hours",
                value: self.cache.freshness_hours,
            });
        }
        if self.http.timeout_secs == 0 {
            return Err(ConfigError::OutOfRange {
                name: "http.timeout_secs",
                value: 0.0,
            });
        }
        if self.league.park_factor <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "league.park_factor",
                value: self.league.park_factor,
            });
        }
        Ok(())
    }
}

fn check_group(group: &'static str, members: &[(&'static str, f64)]) -> Result<(), ConfigError> {
    for (name, value) in members {
        if !value.is_finite() || *value < 0.0 {
            return Err(ConfigError::NegativeWeight {
                group,
                name,
                value: *value,
            });
        }
    }
    let sum: f64 = members.iter().map(|(_, v)| v).sum();
    if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        return Err(ConfigError::WeightSum { group, sum });
    }
    Ok(())
}

fn env_f64(key: &'static str) -> Result<Option<f64>, ConfigError> {
    let Ok(raw) = env::var(key) else {
        return Ok(None);
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    raw.parse::<f64>()
        .map(Some)
        .map_err(|_| ConfigError::Env {
            key,
            value: raw.to_string(),
        })
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => matches!(
            v.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME") {
        if !base.trim().is_empty() {
            return Some(PathBuf::from(base).join(APP_DIR));
        }
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

pub fn expand_endpoint(template: &str, season: i32, date: chrono::NaiveDate) -> String {
    template
        .replace("{season}", &season.to_string())
        .replace("{date}", &date.format("%Y%m%d").to_string())
}
