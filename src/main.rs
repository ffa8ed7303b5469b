use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::Parser;
use tracing::info;

use mlb_daily_model::config::PipelineConfig;
use mlb_daily_model::http_client::build_client;
use mlb_daily_model::output::OutputTable;
use mlb_daily_model::pipeline;

#[derive(Parser, Debug)]
#[command(name = "mlb_daily_model", version)]
#[command(about = "Projects run totals for a day's MLB slate and flags over/under edges")]
struct Cli {
    /// Slate date (YYYY-MM-DD); defaults to today, local time
    #[arg(long)]
    date: Option<NaiveDate>,

    /// TOML config file
    #[arg(long, env = "MODEL_CONFIG")]
    config: Option<PathBuf>,

    /// Write the table as CSV
    #[arg(long)]
    csv: Option<PathBuf>,

    /// Write the table as an Excel workbook
    #[arg(long)]
    xlsx: Option<PathBuf>,

    /// Include pitchers, expected runs and every reconciled input column
    #[arg(long)]
    full: bool,

    /// Use cached snapshots and fallbacks only
    #[arg(long)]
    offline: bool,

    /// Print source, identity and incomplete-game diagnostics
    #[arg(long)]
    diagnostics: bool,
}

fn main() -> Result<()> {
    mlb_daily_model::load_dotenv();
    mlb_daily_model::init_logging();
    let cli = Cli::parse();

    let mut cfg = PipelineConfig::load(cli.config.as_deref()).context("invalid configuration")?;
    if cli.offline {
        cfg.cache.offline = true;
    }
    let date = cli.date.unwrap_or_else(|| Local::now().date_naive());
    let client = build_client(&cfg.http)?;

    let report = pipeline::run(&cfg, &client, date);
    for family in &report.families {
        info!(family = %family.family, from = ?family.from, rows = family.rows, "source");
    }

    let table = if cli.full {
        OutputTable::full(&report.rows)
    } else {
        OutputTable::summary(&report.rows)
    };

    println!("MLB daily model, {date}");
    println!("{}", table.render());

    if cli.diagnostics {
        println!();
        if report.diagnostics.is_empty() {
            println!("No diagnostics");
        }
        for d in &report.diagnostics {
            println!("{d}");
        }
        for gap in &report.missing {
            println!("[missing fields] {}: {}", gap.game, gap.fields.join(", "));
        }
    }

    if let Some(path) = &cli.csv {
        table.write_csv(path)?;
        info!(path = %path.display(), "csv written");
    }
    if let Some(path) = &cli.xlsx {
        table.write_xlsx(path, "Daily Model")?;
        info!(path = %path.display(), "workbook written");
    }
    Ok(())
}
