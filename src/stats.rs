use std::collections::HashMap;
use std::fmt;

use crate::error::SourceError;
use crate::html_table::{self, parse_number};
use crate::identity::{TeamKey, normalize_team, pitcher_key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StatField {
    RunsPerGame,
    RunsAllowedPerGame,
    StarterEra,
    StarterFip,
    StarterWhip,
    BullpenEra,
    BullpenWhip,
    OnBasePct,
    ParkFactor,
    PowerRating,
}

impl StatField {
    pub const ALL: [StatField; 10] = [
        StatField::RunsPerGame,
        StatField::RunsAllowedPerGame,
        StatField::StarterEra,
        StatField::StarterFip,
        StatField::StarterWhip,
        StatField::BullpenEra,
        StatField::BullpenWhip,
        StatField::OnBasePct,
        StatField::ParkFactor,
        StatField::PowerRating,
    ];

    pub fn column(self) -> &'static str {
        match self {
            StatField::RunsPerGame => "runs_per_game",
            StatField::RunsAllowedPerGame => "runs_allowed_per_game",
            StatField::StarterEra => "starter_era",
            StatField::StarterFip => "starter_fip",
            StatField::StarterWhip => "starter_whip",
            StatField::BullpenEra => "bullpen_era",
            StatField::BullpenWhip => "bullpen_whip",
            StatField::OnBasePct => "on_base_pct",
            StatField::ParkFactor => "park_factor",
            StatField::PowerRating => "power_rating",
        }
    }

    fn header_aliases(self) -> &'static [&'static str] {
        match self {
            StatField::RunsPerGame => &["rpg", "r/g", "runs per game"],
            StatField::RunsAllowedPerGame => &["rapg", "ra/g", "opp rpg", "runs allowed per game"],
            StatField::StarterEra | StatField::BullpenEra => &["era"],
            StatField::StarterFip => &["fip"],
            StatField::StarterWhip | StatField::BullpenWhip => &["whip"],
            StatField::OnBasePct => &["obp", "on base pct", "on-base pct"],
            StatField::ParkFactor => &["pf", "park factor", "basic (5yr)", "basic"],
            StatField::PowerRating => &["rating", "power rating"],
        }
    }
}

impl fmt::Display for StatField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.column())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StatFamily {
    RunsPerGame,
    RunsAllowedPerGame,
    Bullpen,
    StartingPitchers,
    OnBase,
    ParkFactor,
    PowerRating,
}

impl StatFamily {
    pub const ALL: [StatFamily; 7] = [
        StatFamily::RunsPerGame,
        StatFamily::RunsAllowedPerGame,
        StatFamily::Bullpen,
        StatFamily::StartingPitchers,
        StatFamily::OnBase,
        StatFamily::ParkFactor,
        StatFamily::PowerRating,
    ];

    pub fn key(self) -> &'static str {
        match self {
            StatFamily::RunsPerGame => "runs_per_game",
            StatFamily::RunsAllowedPerGame => "runs_allowed_per_game",
            StatFamily::Bullpen => "bullpen",
            StatFamily::StartingPitchers => "starting_pitchers",
            StatFamily::OnBase => "on_base",
            StatFamily::ParkFactor => "park_factor",
            StatFamily::PowerRating => "power_rating",
        }
    }

    pub fn fields(self) -> &'static [StatField] {
        match self {
            StatFamily::RunsPerGame => &[StatField::RunsPerGame],
            StatFamily::RunsAllowedPerGame => &[StatField::RunsAllowedPerGame],
            StatFamily::Bullpen => &[StatField::BullpenEra, StatField::BullpenWhip],
            StatFamily::StartingPitchers => &[
                StatField::StarterEra,
                StatField::StarterFip,
                StatField::StarterWhip,
            ],
            StatFamily::OnBase => &[StatField::OnBasePct],
            StatFamily::ParkFactor => &[StatField::ParkFactor],
            StatFamily::PowerRating => &[StatField::PowerRating],
        }
    }

    pub fn is_pitcher(self) -> bool {
        matches!(self, StatFamily::StartingPitchers)
    }
}

impl fmt::Display for StatFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamStatRow {
    pub team: TeamKey,
    pub values: Vec<Option<f64>>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PitcherStatRow {
    pub pitcher: String,
    pub team: TeamKey,
    pub era: Option<f64>,
    pub fip: Option<f64>,
    pub whip: Option<f64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TeamStatTable {
    pub family: StatFamily,
    pub rows: Vec<TeamStatRow>,
}

impl TeamStatTable {
    pub fn empty(family: StatFamily) -> Self {
        Self {
            family,
            rows: Vec::new(),
        }
    }

    pub fn index(&self) -> HashMap<&TeamKey, &TeamStatRow> {
        let mut out = HashMap::with_capacity(self.rows.len());
        for row in &self.rows {
            out.entry(&row.team).or_insert(row);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct PitcherStatTable {
    pub rows: Vec<PitcherStatRow>,
}

impl PitcherStatTable {
    pub fn index(&self) -> HashMap<String, Vec<&PitcherStatRow>> {
        let mut out: HashMap<String, Vec<&PitcherStatRow>> = HashMap::new();
        for row in &self.rows {
            out.entry(pitcher_key(&row.pitcher)).or_default().push(row);
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatTable {
    Team(TeamStatTable),
    Pitcher(PitcherStatTable),
}

impl StatTable {
    pub fn empty(family: StatFamily) -> Self {
        if family.is_pitcher() {
            StatTable::Pitcher(PitcherStatTable::default())
        } else {
            StatTable::Team(TeamStatTable::empty(family))
        }
    }

    pub fn family(&self) -> StatFamily {
        match self {
            StatTable::Team(t) => t.family,
            StatTable::Pitcher(_) => StatFamily::StartingPitchers,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            StatTable::Team(t) => t.rows.len(),
            StatTable::Pitcher(t) => t.rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn from_tabular(
        family: StatFamily,
        grid: &Tabular,
        season: i32,
    ) -> Result<Self, SourceError> {
        let table = if family.is_pitcher() {
            StatTable::Pitcher(pitchers_from_grid(grid)?)
        } else {
            StatTable::Team(teams_from_grid(family, grid, season)?)
        };
        if table.is_empty() {
            return Err(SourceError::Empty);
        }
        Ok(table)
    }

    pub fn to_csv(&self) -> Result<String, SourceError> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        match self {
            StatTable::Team(t) => {
                let mut header = vec!["team"];
                header.extend(t.family.fields().iter().map(|f| f.column()));
                wtr.write_record(&header)?;
                for row in &t.rows {
                    let mut record = vec![row.team.as_str().to_string()];
                    record.extend(row.values.iter().map(|v| fmt_cell(*v)));
                    wtr.write_record(&record)?;
                }
            }
            StatTable::Pitcher(t) => {
                wtr.write_record(["pitcher", "team", "starter_era", "starter_fip", "starter_whip"])?;
                for row in &t.rows {
                    wtr.write_record([
                        row.pitcher.clone(),
                        row.team.as_str().to_string(),
                        fmt_cell(row.era),
                        fmt_cell(row.fip),
                        fmt_cell(row.whip),
                    ])?;
                }
            }
        }
        let bytes = wtr
            .into_inner()
            .map_err(|e| SourceError::Parse(e.to_string()))?;
        String::from_utf8(bytes).map_err(|e| SourceError::Parse(e.to_string()))
    }
}

fn fmt_cell(v: Option<f64>) -> String {
    v.map(|v| v.to_string()).unwrap_or_default()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tabular {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Tabular {
    pub fn sniff(body: &str) -> Result<Self, SourceError> {
        let trimmed = body.trim_start_matches('\u{feff}').trim_start();
        if trimmed.starts_with('<') {
            Self::from_html(trimmed)
        } else {
            Self::from_csv(trimmed)
        }
    }

    pub fn from_html(body: &str) -> Result<Self, SourceError> {
        let table = html_table::first_table(body)
            .ok_or_else(|| SourceError::Parse("no data table on page".to_string()))?;
        Ok(Self {
            headers: table.headers,
            rows: table.rows,
        })
    }

    pub fn from_csv(body: &str) -> Result<Self, SourceError> {
        let mut rdr = csv::ReaderBuilder::new()
            .flexible(true)
            .trim(csv::Trim::All)
            .from_reader(body.as_bytes());
        let headers = rdr
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').to_string())
            .collect();
        let mut rows = Vec::new();
        for record in rdr.records() {
            let record = record?;
            rows.push(record.iter().map(|c| c.to_string()).collect());
        }
        Ok(Self { headers, rows })
    }

    fn column_of(&self, names: &[&str]) -> Option<usize> {
        self.headers.iter().position(|h| {
            let h = h.trim().to_ascii_lowercase();
            names.iter().any(|n| h == *n)
        })
    }

    fn cell(&self, row: &[String], col: Option<usize>) -> Option<f64> {
        col.and_then(|c| row.get(c)).and_then(|s| parse_number(s))
    }
}

const TEAM_HEADERS: &[&str] = &["team", "tm", "club"];
const PITCHER_HEADERS: &[&str] = &["pitcher", "name", "player"];

fn teams_from_grid(
    family: StatFamily,
    grid: &Tabular,
    season: i32,
) -> Result<TeamStatTable, SourceError> {
    let team_col = grid
        .column_of(TEAM_HEADERS)
        .ok_or_else(|| SourceError::Parse(format!("{family}: no team column")))?;

    let season_header = season.to_string();
    let columns: Vec<Option<usize>> = family
        .fields()
        .iter()
        .map(|field| {
            let mut names: Vec<&str> = vec![field.column()];
            names.extend_from_slice(field.header_aliases());
            grid.column_of(&names)
                .or_else(|| single_value_column(family, grid, &season_header, team_col))
        })
        .collect();
    if columns.iter().all(Option::is_none) {
        return Err(SourceError::Parse(format!("{family}: no value columns")));
    }

    let mut rows = Vec::new();
    for raw in &grid.rows {
        let Some(name) = raw.get(team_col).filter(|s| !s.trim().is_empty()) else {
            continue;
        };
        let values = family
            .fields()
            .iter()
            .zip(&columns)
            .map(|(field, col)| scale_value(*field, grid.cell(raw, *col)))
            .collect();
        rows.push(TeamStatRow {
            team: normalize_team(name),
            values,
        });
    }
    Ok(TeamStatTable { family, rows })
}

/// Single-value pages label their value column by season ("2025"); failing
/// that, the first column after the team column is taken.
fn single_value_column(
    family: StatFamily,
    grid: &Tabular,
    season_header: &str,
    team_col: usize,
) -> Option<usize> {
    if family.fields().len() != 1 {
        return None;
    }
    grid.headers
        .iter()
        .position(|h| h.trim() == season_header)
        .or_else(|| (team_col + 1 < grid.headers.len()).then_some(team_col + 1))
}

fn scale_value(field: StatField, value: Option<f64>) -> Option<f64> {
    match (field, value) {
        // Some sites publish OBP as a percentage.
        (StatField::OnBasePct, Some(v)) if v > 1.0 => Some(v / 100.0),
        _ => value,
    }
}

fn pitchers_from_grid(grid: &Tabular) -> Result<PitcherStatTable, SourceError> {
    let name_col = grid
        .column_of(PITCHER_HEADERS)
        .ok_or_else(|| SourceError::Parse("starting_pitchers: no name column".to_string()))?;
    let team_col = grid.column_of(TEAM_HEADERS);
    let era = grid.column_of(&["starter_era", "era"]);
    let fip = grid.column_of(&["starter_fip", "fip"]);
    let whip = grid.column_of(&["starter_whip", "whip"]);
    if era.is_none() && fip.is_none() && whip.is_none() {
        return Err(SourceError::Parse(
            "starting_pitchers: no ERA/FIP/WHIP columns".to_string(),
        ));
    }

    let mut rows = Vec::new();
    for raw in &grid.rows {
        let Some(name) = raw.get(name_col).map(|s| s.trim()).filter(|s| !s.is_empty()) else {
            continue;
        };
        let team = team_col
            .and_then(|c| raw.get(c))
            .map(|s| normalize_team(s))
            .unwrap_or_else(|| normalize_team(""));
        rows.push(PitcherStatRow {
            pitcher: name.to_string(),
            team,
            era: grid.cell(raw, era),
            fip: grid.cell(raw, fip),
            whip: grid.cell(raw, whip),
        });
    }
    Ok(PitcherStatTable { rows })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn runs_per_game_page_uses_season_column() {
        let grid = Tabular {
            headers: vec!["Rank".into(), "Team".into(), "2025".into(), "Last 3".into()],
            rows: vec![
                vec!["1".into(), "NY Yankees".into(), "5.42".into(), "6.00".into()],
                vec!["2".into(), "Boston".into(), "5.10".into(), "3.33".into()],
            ],
        };
        let StatTable::Team(t) = StatTable::from_tabular(StatFamily::RunsPerGame, &grid, 2025).unwrap()
        else {
            panic!("expected team table");
        };
        assert_eq!(t.rows[0].team.as_str(), "NYY");
        assert_eq!(t.rows[0].values, vec![Some(5.42)]);
        assert_eq!(t.rows[1].team.as_str(), "BOS");
    }

    #[test]
    fn bullpen_columns_selected_by_header() {
        let grid = Tabular::from_csv("Team,W,ERA,WHIP\nRed Sox,30,3.91,1.25\nYankees,28,--,1.31\n")
            .unwrap();
        let StatTable::Team(t) = StatTable::from_tabular(StatFamily::Bullpen, &grid, 2025).unwrap()
        else {
            panic!("expected team table");
        };
        assert_eq!(t.rows[0].values, vec![Some(3.91), Some(1.25)]);
        assert_eq!(t.rows[1].values, vec![None, Some(1.31)]);
    }

    #[test]
    fn obp_percentages_are_rescaled() {
        let grid = Tabular::from_csv("Team,OBP\nBoston,32.5%\nNYY,0.331\n").unwrap();
        let StatTable::Team(t) = StatTable::from_tabular(StatFamily::OnBase, &grid, 2025).unwrap()
        else {
            panic!("expected team table");
        };
        assert!((t.rows[0].values[0].unwrap() - 0.325).abs() < 1e-9);
        assert_eq!(t.rows[1].values[0], Some(0.331));
    }

    #[test]
    fn pitchers_parse_from_fangraphs_style_csv() {
        let grid = Tabular::sniff(
            "\u{feff}\"Name\",\"Team\",\"W\",\"ERA\",\"FIP\",\"WHIP\"\n\
             \"Gerrit Cole\",\"NYY\",\"10\",\"3.10\",\"3.30\",\"1.05\"\n\
             \"Brayan Bello\",\"BOS\",\"8\",\"4.01\",\"\",\"1.30\"\n",
        )
        .unwrap();
        let StatTable::Pitcher(t) =
            StatTable::from_tabular(StatFamily::StartingPitchers, &grid, 2025).unwrap()
        else {
            panic!("expected pitcher table");
        };
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0].pitcher, "Gerrit Cole");
        assert_eq!(t.rows[0].team.as_str(), "NYY");
        assert_eq!(t.rows[1].fip, None);
    }

    #[test]
    fn header_only_payload_is_empty_error() {
        let grid = Tabular::from_csv("Team,RPG\n").unwrap();
        assert!(matches!(
            StatTable::from_tabular(StatFamily::RunsPerGame, &grid, 2025),
            Err(SourceError::Empty)
        ));
    }

    #[test]
    fn missing_team_column_is_parse_error() {
        let grid = Tabular::from_csv("Squad,RPG\nBoston,5.0\n").unwrap();
        assert!(matches!(
            StatTable::from_tabular(StatFamily::RunsPerGame, &grid, 2025),
            Err(SourceError::Parse(_))
        ));
    }

    #[test]
    fn snapshot_csv_reads_back_through_the_same_path() {
        let table = StatTable::Team(TeamStatTable {
            family: StatFamily::Bullpen,
            rows: vec![TeamStatRow {
                team: normalize_team("BOS"),
                values: vec![Some(3.9), None],
            }],
        });
        let csv = table.to_csv().unwrap();
        assert!(csv.starts_with("team,bullpen_era,bullpen_whip"));
        let back = StatTable::from_tabular(StatFamily::Bullpen, &Tabular::sniff(&csv).unwrap(), 2025)
            .unwrap();
        assert_eq!(back, table);
    }

    #[test]
    fn pitcher_index_keeps_duplicate_names() {
        let table = PitcherStatTable {
            rows: vec![
                PitcherStatRow {
                    pitcher: "Luis Garcia".into(),
                    team: normalize_team("HOU"),
                    era: Some(3.5),
                    fip: None,
                    whip: None,
                },
                PitcherStatRow {
                    pitcher: "Luis García".into(),
                    team: normalize_team("LAA"),
                    era: Some(4.5),
                    fip: None,
                    whip: None,
                },
                PitcherStatRow {
                    pitcher: "LUIS GARCIA".into(),
                    team: normalize_team("SD"),
                    era: Some(5.5),
                    fip: None,
                    whip: None,
                },
            ],
        };
        let idx = table.index();
        assert_eq!(idx.get("luis garcia").map(Vec::len), Some(2));
    }
}
