use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::{Context, Result};
use chrono::Local;
use clap::Parser;
use tracing::{error, info};

use mlb_daily_model::config::PipelineConfig;
use mlb_daily_model::http_client::build_client;
use mlb_daily_model::output::OutputTable;
use mlb_daily_model::pipeline;

/// Scheduled job: recompute today's slate and overwrite the model sheet.
#[derive(Parser, Debug)]
#[command(name = "update_models")]
struct Args {
    /// Output CSV path
    #[arg(long, default_value = "daily_model.csv")]
    out: PathBuf,

    /// TOML config file
    #[arg(long, env = "MODEL_CONFIG")]
    config: Option<PathBuf>,
}

fn main() -> ExitCode {
    mlb_daily_model::load_dotenv();
    mlb_daily_model::init_logging();
    let args = Args::parse();

    match update(&args) {
        Ok(path) => {
            info!("Daily model saved as {}", path.display());
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("Error generating daily model: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn update(args: &Args) -> Result<PathBuf> {
    let cfg = PipelineConfig::load(args.config.as_deref()).context("invalid configuration")?;
    let client = build_client(&cfg.http)?;
    let date = Local::now().date_naive();

    let report = pipeline::run(&cfg, &client, date);
    OutputTable::full(&report.rows).write_csv(&args.out)?;
    Ok(args.out.clone())
}
