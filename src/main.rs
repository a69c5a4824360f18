use anyhow::Result;
use chrono::Utc;
use clap::Parser;
use tracing::{error, info};

mod config;
mod db;
mod error;
mod flow;
mod games;
mod players;
mod storage;
mod teams;
#[cfg(test)]
mod testing;

use config::{Config, Parameters};
use db::open_warehouse;
use storage::Bucket;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Initialise tracing / logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let config = Config::parse();
    config.validate()?;

    let params = Parameters::load(config.parameters.as_ref())?;
    match &config.parameters {
        Some(path) => info!("Parameters loaded: {}", path.display()),
        None => info!("No parameters file given, using built-in defaults"),
    }

    let bucket = Bucket::new(&config.bucket_root);
    info!("Bucket root: {}", bucket.root().display());

    let warehouse = if config.skip_export {
        info!("Warehouse export skipped");
        None
    } else {
        Some(open_warehouse(&config)?)
    };

    let started = Utc::now();
    let result = flow::season_stats(&params, &bucket, warehouse.as_deref()).await;

    if let Some(warehouse) = &warehouse {
        if let Err(e) = warehouse.close() {
            error!("Failed to close warehouse: {}", e);
        }
    }

    let output = result?;
    info!(
        "Player season stats: {} ({} rows)",
        output.player_stats_path, output.player_rows
    );
    info!(
        "Team season stats: {} ({} rows)",
        output.team_stats_path, output.team_rows
    );
    info!(
        "Season stats run finished in {} ms",
        (Utc::now() - started).num_milliseconds()
    );

    Ok(())
}
