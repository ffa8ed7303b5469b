pub mod betting;
pub mod config;
pub mod error;
pub mod html_table;
pub mod http_client;
pub mod identity;
pub mod output;
pub mod pipeline;
pub mod reconcile;
pub mod resolver;
pub mod schedule;
pub mod scoring;
pub mod snapshot_cache;
pub mod sources;
pub mod stats;

use tracing_subscriber::EnvFilter;

/// `RUST_LOG` wins; otherwise this crate logs at info.
pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,mlb_daily_model=info,update_models=info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

/// `.env.local` then `.env`; values already in the environment are kept.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}
