use std::fs;

use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use reqwest::blocking::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{Diagnostic, SourceError};
use crate::http_client::fetch_text;
use crate::identity::{TeamKey, normalize_team};
use crate::sources::Location;

/// Placeholder for a probable pitcher that has not been announced.
pub const TBD: &str = "TBD";

#[derive(Debug, Clone, PartialEq)]
pub struct Game {
    pub id: String,
    pub start_utc: Option<DateTime<Utc>>,
    /// Local wall-clock start, e.g. `07:05 PM`.
    pub start_time: String,
    pub away_name: String,
    pub home_name: String,
    pub away: TeamKey,
    pub home: TeamKey,
    pub away_pitcher: String,
    pub home_pitcher: String,
    pub book_total: Option<f64>,
    pub away_score: Option<u32>,
    pub home_score: Option<u32>,
}

impl Game {
    pub fn label(&self) -> String {
        format!("{} @ {} {}", self.away, self.home, self.start_time)
            .trim_end()
            .to_string()
    }

    pub fn pitchers_known(&self) -> bool {
        is_known_pitcher(&self.away_pitcher) && is_known_pitcher(&self.home_pitcher)
    }
}

pub fn is_known_pitcher(name: &str) -> bool {
    let name = name.trim();
    !name.is_empty() && !name.eq_ignore_ascii_case(TBD)
}

/// Result of one schedule pull. A failed feed leaves `games` empty; events
/// that could not be read are skipped. Both are reported in `diagnostics`.
#[derive(Debug, Clone, Default)]
pub struct ScheduleFetch {
    pub games: Vec<Game>,
    pub diagnostics: Vec<Diagnostic>,
}

impl ScheduleFetch {
    pub fn unavailable(source: &str, err: &SourceError) -> Self {
        Self {
            games: Vec::new(),
            diagnostics: vec![Diagnostic::source_unavailable(format!("schedule <{source}>"), err)],
        }
    }
}

/// `source` is a scoreboard URL or a saved scoreboard file.
pub fn fetch_schedule(client: &Client, source: &str) -> ScheduleFetch {
    let body = match Location::parse(source) {
        Location::Url(url) => fetch_text(client, &url),
        Location::File(path) => {
            fs::read_to_string(&path).map_err(|err| SourceError::Io { path, source: err })
        }
    };
    match body.and_then(|body| parse_scoreboard_json(&body)) {
        Ok(slate) => {
            info!(
                games = slate.games.len(),
                skipped = slate.diagnostics.len(),
                "schedule loaded"
            );
            slate
        }
        Err(err) => {
            warn!(source, error = %err, "schedule unavailable");
            ScheduleFetch::unavailable(source, &err)
        }
    }
}

#[derive(Debug, Deserialize)]
struct Scoreboard {
    #[serde(default)]
    events: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ScoreboardEvent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    competitions: Vec<Competition>,
}

#[derive(Debug, Deserialize)]
struct Competition {
    #[serde(default)]
    date: Option<String>,
    #[serde(default)]
    competitors: Vec<Competitor>,
    #[serde(default)]
    odds: Vec<Odds>,
}

#[derive(Debug, Deserialize)]
struct Competitor {
    #[serde(rename = "homeAway", default)]
    home_away: Option<String>,
    #[serde(default)]
    score: Option<Value>,
    team: CompetitorTeam,
    #[serde(default)]
    probables: Vec<Probable>,
}

#[derive(Debug, Deserialize)]
struct CompetitorTeam {
    #[serde(rename = "displayName")]
    display_name: String,
}

#[derive(Debug, Deserialize)]
struct Probable {
    #[serde(default)]
    athlete: Option<Athlete>,
}

#[derive(Debug, Deserialize)]
struct Athlete {
    #[serde(rename = "displayName", default)]
    display_name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Odds {
    #[serde(rename = "overUnder", default)]
    over_under: Option<Value>,
}

/// An empty or `null` payload is a valid empty slate. Each event is read on
/// its own: one that cannot be turned into a game is skipped with an
/// `IncompleteGame` diagnostic and the rest of the slate is kept.
pub fn parse_scoreboard_json(raw: &str) -> Result<ScheduleFetch, SourceError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "null" {
        return Ok(ScheduleFetch::default());
    }
    let board: Scoreboard = serde_json::from_str(trimmed)?;
    let mut slate = ScheduleFetch::default();
    for (idx, value) in board.events.into_iter().enumerate() {
        let label = event_label(&value, idx);
        let parsed = serde_json::from_value::<ScoreboardEvent>(value)
            .map_err(|err| format!("malformed event: {err}"))
            .and_then(event_to_game);
        match parsed {
            Ok(game) => slate.games.push(game),
            Err(reason) => {
                warn!(event = %label, %reason, "scoreboard event skipped");
                slate.diagnostics.push(Diagnostic::IncompleteGame { game: label, reason });
            }
        }
    }
    Ok(slate)
}

fn event_label(value: &Value, idx: usize) -> String {
    fn text<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
        value
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }
    match (text(value, "shortName"), text(value, "id")) {
        (Some(name), _) => name.to_string(),
        (None, Some(id)) => format!("event {id}"),
        (None, None) => format!("event #{}", idx + 1),
    }
}

fn event_to_game(event: ScoreboardEvent) -> Result<Game, String> {
    let comp = event
        .competitions
        .into_iter()
        .next()
        .ok_or_else(|| "no competition listed".to_string())?;
    let (home, away) = split_sides(comp.competitors)
        .ok_or_else(|| "fewer than two competitors".to_string())?;

    let start_utc = comp
        .date
        .as_deref()
        .or(event.date.as_deref())
        .and_then(parse_espn_time);
    let start_time = start_utc
        .map(|t| t.with_timezone(&Local).format("%I:%M %p").to_string())
        .unwrap_or_default();
    let book_total = comp
        .odds
        .first()
        .and_then(|o| o.over_under.as_ref())
        .and_then(value_f64);

    Ok(Game {
        id: event.id,
        start_utc,
        start_time,
        away: normalize_team(&away.team.display_name),
        home: normalize_team(&home.team.display_name),
        away_pitcher: probable_name(&away),
        home_pitcher: probable_name(&home),
        away_score: away.score.as_ref().and_then(value_f64).map(|s| s as u32),
        home_score: home.score.as_ref().and_then(value_f64).map(|s| s as u32),
        away_name: away.team.display_name,
        home_name: home.team.display_name,
        book_total,
    })
}

/// Uses `homeAway` when present; otherwise the first competitor is home.
fn split_sides(mut competitors: Vec<Competitor>) -> Option<(Competitor, Competitor)> {
    if competitors.len() < 2 {
        return None;
    }
    let home_idx = competitors
        .iter()
        .position(|c| c.home_away.as_deref() == Some("home"))
        .unwrap_or(0);
    let home = competitors.remove(home_idx);
    let away_idx = competitors
        .iter()
        .position(|c| c.home_away.as_deref() == Some("away"))
        .unwrap_or(0);
    let away = competitors.remove(away_idx);
    Some((home, away))
}

fn probable_name(c: &Competitor) -> String {
    c.probables
        .first()
        .and_then(|p| p.athlete.as_ref())
        .and_then(|a| a.display_name.as_deref())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .unwrap_or(TBD)
        .to_string()
}

fn parse_espn_time(raw: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(&Utc));
    }
    let trimmed = raw.trim_end_matches('Z');
    ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(trimmed, fmt).ok())
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn value_f64(v: &Value) -> Option<f64> {
    let parsed = match v {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed.filter(|x| x.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    #[test]
    fn espn_minute_precision_timestamps_parse() {
        let t = parse_espn_time("2025-07-04T23:05Z").unwrap();
        assert_eq!((t.hour(), t.minute()), (23, 5));
        let t = parse_espn_time("2025-07-04T23:05:00Z").unwrap();
        assert_eq!(t.minute(), 5);
        assert!(parse_espn_time("tonight").is_none());
    }

    #[test]
    fn value_f64_accepts_numbers_and_strings() {
        assert_eq!(value_f64(&serde_json::json!(8.5)), Some(8.5));
        assert_eq!(value_f64(&serde_json::json!("3")), Some(3.0));
        assert_eq!(value_f64(&serde_json::json!(null)), None);
    }

    #[test]
    fn missing_probable_is_tbd() {
        let raw = r#"{"events":[{"id":"1","competitions":[{"date":"2025-07-04T23:05Z",
            "competitors":[
              {"homeAway":"home","team":{"displayName":"Boston Red Sox"},
               "probables":[{"athlete":{"displayName":"Brayan Bello"}}]},
              {"homeAway":"away","team":{"displayName":"New York Yankees"},"probables":[]}
            ]}]}]}"#;
        let games = parse_scoreboard_json(raw).unwrap().games;
        assert_eq!(games.len(), 1);
        assert_eq!(games[0].away_pitcher, TBD);
        assert_eq!(games[0].home_pitcher, "Brayan Bello");
        assert!(!games[0].pitchers_known());
        assert_eq!(games[0].book_total, None);
    }

    #[test]
    fn first_competitor_is_home_without_markers() {
        let raw = r#"{"events":[{"id":"9","competitions":[{"competitors":[
              {"team":{"displayName":"Chicago Cubs"}},
              {"team":{"displayName":"St. Louis Cardinals"}}
            ]}]}]}"#;
        let games = parse_scoreboard_json(raw).unwrap().games;
        assert_eq!(games[0].home.as_str(), "CHC");
        assert_eq!(games[0].away.as_str(), "STL");
        assert_eq!(games[0].start_time, "");
    }

    #[test]
    fn null_payload_is_empty_slate() {
        assert!(parse_scoreboard_json("null").unwrap().games.is_empty());
        assert!(parse_scoreboard_json(r#"{"events":[]}"#).unwrap().games.is_empty());
    }

    #[test]
    fn malformed_payload_is_parse_error() {
        assert!(matches!(
            parse_scoreboard_json("<html>rate limited</html>"),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn bad_event_is_skipped_and_the_rest_kept() {
        let raw = r#"{"events":[
            {"id":"1","shortName":"NYY @ BOS","competitions":[{"competitors":[
              {"homeAway":"home","team":{"displayName":"Boston Red Sox"}},
              {"homeAway":"away","team":{"displayName":"New York Yankees"}}]}]},
            {"id":"2","shortName":"LAD @ SF","competitions":[{"competitors":[
              {"homeAway":"home","team":{"abbreviation":"SF"}},
              {"homeAway":"away","team":{"displayName":"Los Angeles Dodgers"}}]}]}
        ]}"#;
        let slate = parse_scoreboard_json(raw).unwrap();
        assert_eq!(slate.games.len(), 1);
        assert_eq!(slate.games[0].home.as_str(), "BOS");
        assert_eq!(slate.diagnostics.len(), 1);
        assert!(matches!(
            &slate.diagnostics[0],
            Diagnostic::IncompleteGame { game, reason }
                if game == "LAD @ SF" && reason.contains("displayName")
        ));
    }

    #[test]
    fn events_without_two_teams_are_reported() {
        let raw = r#"{"events":[
            {"id":"7","competitions":[]},
            {"competitions":[{"competitors":[{"team":{"displayName":"Chicago Cubs"}}]}]},
            {"id":"9","competitions":[{"competitors":[
              {"team":{"displayName":"Chicago Cubs"}},
              {"team":{"displayName":"St. Louis Cardinals"}}]}]}
        ]}"#;
        let slate = parse_scoreboard_json(raw).unwrap();
        assert_eq!(slate.games.len(), 1);
        let reasons: Vec<String> = slate.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            reasons,
            vec![
                "[incomplete game] event 7: no competition listed".to_string(),
                "[incomplete game] event #2: fewer than two competitors".to_string(),
            ]
        );
    }
}
