use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Format, Workbook, Worksheet};
use tabled::builder::Builder;
use tabled::settings::Style;
use tabled::Tabled;

use crate::error::Side;
use crate::scoring::ScoredGameRow;
use crate::stats::StatField;

#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct OutputRow {
    #[tabled(rename = "Game Time")]
    pub game_time: String,
    #[tabled(rename = "Away Team")]
    pub away_team: String,
    #[tabled(rename = "Away Score")]
    pub away_score: String,
    #[tabled(rename = "Home Team")]
    pub home_team: String,
    #[tabled(rename = "Home Score")]
    pub home_score: String,
    #[tabled(rename = "ML %")]
    pub win_prob: String,
    #[tabled(rename = "Book O/U")]
    pub book_total: String,
    #[tabled(rename = "Model O/U")]
    pub model_total: String,
    #[tabled(rename = "O/U Bet")]
    pub bet: String,
}

impl From<&ScoredGameRow> for OutputRow {
    fn from(row: &ScoredGameRow) -> Self {
        let game = &row.reconciled.game;
        Self {
            game_time: game.start_time.clone(),
            away_team: game.away_name.clone(),
            away_score: opt(game.away_score),
            home_team: game.home_name.clone(),
            home_score: opt(game.home_score),
            win_prob: row.win_prob_display(),
            book_total: one_decimal(game.book_total),
            model_total: one_decimal(row.model_total),
            bet: row.recommendation.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct OutputTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl OutputTable {
    pub fn summary(rows: &[ScoredGameRow]) -> Self {
        Self {
            headers: summary_headers(),
            rows: rows.iter().map(summary_cells).collect(),
        }
    }

    pub fn full(rows: &[ScoredGameRow]) -> Self {
        let mut headers = summary_headers();
        headers.extend(
            [
                "Game Id",
                "Away Pitcher",
                "Home Pitcher",
                "Away Exp Runs",
                "Home Exp Runs",
                "Away Win %",
                "Home Win %",
            ]
            .map(String::from),
        );
        for side in [Side::Away, Side::Home] {
            headers.extend(
                StatField::ALL
                    .iter()
                    .map(|f| format!("{}_{}", side.prefix(), f.column())),
            );
        }

        let rows = rows
            .iter()
            .map(|row| {
                let game = &row.reconciled.game;
                let mut cells = summary_cells(row);
                cells.push(game.id.clone());
                cells.push(game.away_pitcher.clone());
                cells.push(game.home_pitcher.clone());
                cells.push(two_decimals(row.away_expected_runs));
                cells.push(two_decimals(row.home_expected_runs));
                cells.push(percent(row.away_win_probability));
                cells.push(percent(row.home_win_probability));
                cells.extend(row.reconciled.columns().into_iter().map(|(_, v)| opt(v)));
                cells
            })
            .collect();
        Self { headers, rows }
    }

    pub fn render(&self) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.headers.iter().cloned());
        for row in &self.rows {
            builder.push_record(row.iter().cloned());
        }
        builder.build().with(Style::psql()).to_string()
    }

    pub fn to_csv_string(&self) -> Result<String> {
        let mut wtr = csv::Writer::from_writer(Vec::new());
        self.write_records(&mut wtr)?;
        let bytes = wtr.into_inner().context("flush csv buffer")?;
        String::from_utf8(bytes).context("csv output is not utf-8")
    }

    pub fn write_csv(&self, path: &Path) -> Result<()> {
        let mut wtr = csv::Writer::from_path(path)
            .with_context(|| format!("failed creating {}", path.display()))?;
        self.write_records(&mut wtr)?;
        wtr.flush()
            .with_context(|| format!("failed writing {}", path.display()))?;
        Ok(())
    }

    fn write_records<W: std::io::Write>(&self, wtr: &mut csv::Writer<W>) -> Result<()> {
        wtr.write_record(&self.headers).context("write csv header")?;
        for row in &self.rows {
            wtr.write_record(row).context("write csv row")?;
        }
        Ok(())
    }

    pub fn write_xlsx(&self, path: &Path, sheet_name: &str) -> Result<()> {
        let mut workbook = Workbook::new();
        {
            let sheet = workbook.add_worksheet();
            sheet.set_name(sheet_name)?;
            write_rows(sheet, &self.headers, &self.rows)?;
        }
        workbook
            .save(path)
            .with_context(|| format!("failed writing workbook to {}", path.display()))?;
        Ok(())
    }
}

fn summary_headers() -> Vec<String> {
    OutputRow::headers().into_iter().map(|h| h.into_owned()).collect()
}

fn summary_cells(row: &ScoredGameRow) -> Vec<String> {
    OutputRow::from(row)
        .fields()
        .into_iter()
        .map(|c| c.into_owned())
        .collect()
}

fn write_rows(worksheet: &mut Worksheet, headers: &[String], rows: &[Vec<String>]) -> Result<()> {
    let bold = Format::new().set_bold();
    for (col_idx, value) in headers.iter().enumerate() {
        worksheet
            .write_string_with_format(0, col_idx as u16, value, &bold)
            .with_context(|| format!("write header ({col_idx})"))?;
    }
    for (row_idx, row) in rows.iter().enumerate() {
        let xl_row = row_idx as u32 + 1;
        for (col_idx, value) in row.iter().enumerate() {
            let col = col_idx as u16;
            // Numbers stay numeric so the sheet can sort and sum them.
            let written = match value.parse::<f64>() {
                Ok(n) if n.is_finite() => worksheet.write_number(xl_row, col, n).map(|_| ()),
                _ => worksheet.write_string(xl_row, col, value).map(|_| ()),
            };
            written.with_context(|| format!("write cell ({xl_row},{col_idx})"))?;
        }
    }
    Ok(())
}

fn opt<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn one_decimal(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.1}")).unwrap_or_default()
}

fn two_decimals(value: Option<f64>) -> String {
    value.map(|v| format!("{v:.2}")).unwrap_or_default()
}

fn percent(value: Option<f64>) -> String {
    value.map(|v| format!("{:.1}", v * 100.0)).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PipelineConfig;
    use crate::identity::normalize_team;
    use crate::reconcile::reconcile;
    use crate::schedule::{Game, TBD};
    use crate::scoring::score;

    fn game(away_pitcher: &str) -> Game {
        Game {
            id: "401".to_string(),
            start_utc: None,
            start_time: "07:10 PM".to_string(),
            away_name: "New York Yankees".to_string(),
            home_name: "Boston Red Sox".to_string(),
            away: normalize_team("New York Yankees"),
            home: normalize_team("Boston Red Sox"),
            away_pitcher: away_pitcher.to_string(),
            home_pitcher: "Brayan Bello".to_string(),
            book_total: Some(9.0),
            away_score: Some(3),
            home_score: None,
        }
    }

    fn scored(away_pitcher: &str) -> ScoredGameRow {
        let row = reconcile(&[game(away_pitcher)], &[], &[]).rows.remove(0);
        score(row, &PipelineConfig::default())
    }

    #[test]
    fn summary_columns_are_fixed() {
        let empty = OutputTable::summary(&[]);
        assert_eq!(
            empty.headers,
            vec![
                "Game Time",
                "Away Team",
                "Away Score",
                "Home Team",
                "Home Score",
                "ML %",
                "Book O/U",
                "Model O/U",
                "O/U Bet"
            ]
        );
        assert!(empty.rows.is_empty());
        assert_eq!(OutputTable::summary(&[scored("Gerrit Cole")]).headers, empty.headers);
    }

    #[test]
    fn tbd_game_renders_blank_model_fields() {
        let table = OutputTable::summary(&[scored(TBD)]);
        let row = &table.rows[0];
        assert_eq!(row[2], "3");
        assert_eq!(row[4], "");
        assert_eq!(row[5], "");
        assert_eq!(row[6], "9.0");
        assert_eq!(row[7], "");
        assert_eq!(row[8], "TBD");
    }

    #[test]
    fn full_table_has_both_sides_for_every_field() {
        let table = OutputTable::full(&[scored("Gerrit Cole")]);
        assert_eq!(table.headers.len(), 9 + 7 + 2 * StatField::ALL.len());
        assert_eq!(table.rows[0].len(), table.headers.len());
        assert!(table.headers.contains(&"away_bullpen_era".to_string()));
        assert!(table.headers.contains(&"home_bullpen_era".to_string()));
    }

    #[test]
    fn csv_round_trips_header_and_rows() {
        let csv = OutputTable::summary(&[scored("Gerrit Cole")])
            .to_csv_string()
            .unwrap();
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("Game Time,Away Team,Away Score,Home Team,Home Score,ML %,Book O/U,Model O/U,O/U Bet")
        );
        let row = lines.next().unwrap();
        assert!(row.starts_with("07:10 PM,New York Yankees,3,Boston Red Sox,,"));
        assert!(row.ends_with(",9.0,8.6,NO_BET"));
    }

    #[test]
    fn xlsx_export_writes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("daily.xlsx");
        OutputTable::full(&[scored("Gerrit Cole"), scored(TBD)])
            .write_xlsx(&path, "Daily Model")
            .unwrap();
        assert!(path.metadata().unwrap().len() > 0);
    }

    #[test]
    fn rendered_table_includes_headers() {
        let text = OutputTable::summary(&[scored("Gerrit Cole")]).render();
        assert!(text.contains("Model O/U"));
        assert!(text.contains("NO_BET"));
        assert!(OutputTable::summary(&[]).render().contains("O/U Bet"));
    }
}
