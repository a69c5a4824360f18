use polars::prelude::*;
use tracing::info;

use crate::config::Parameters;
use crate::db::{Warehouse, PLAYER_SEASON_TABLE, TEAM_SEASON_TABLE};
use crate::error::{PipelineError, Result};
use crate::games::game_id_season;
use crate::players::PlayerSeasonProcessor;
use crate::storage::Bucket;
use crate::teams::TeamSeasonProcessor;

/// Where a run left its outputs
#[derive(Debug, Clone, PartialEq)]
pub struct SeasonStatsOutput {
    pub player_stats_path: String,
    pub player_rows: usize,
    pub team_stats_path: String,
    pub team_rows: usize,
}

/// Lazy plan for the player season table.
pub fn player_season_stats(bucket: &Bucket, params: &Parameters) -> Result<LazyFrame> {
    let game_stats = bucket.scan_parquet(&params.bucket_files.raw.player_stats)?;
    let games_detail = bucket.scan_parquet(&params.bucket_files.raw.games_detail)?;
    let scope_game_ids = game_id_season(games_detail);

    let processor = PlayerSeasonProcessor::new(params.player_metrics.clone());
    Ok(processor.run(game_stats, scope_game_ids))
}

/// Lazy plan for the team season table.
pub fn team_season_stats(bucket: &Bucket, params: &Parameters) -> Result<LazyFrame> {
    let games_detail = bucket.scan_parquet(&params.bucket_files.raw.games_detail)?;

    let processor = TeamSeasonProcessor::new(params.team_metrics.clone(), params.team_config());
    processor.run(games_detail)
}

/// Materialise both tables, then write them together. A failure in either
/// plan or either write leaves the bucket as it was before the run.
pub fn compute_season_stats(bucket: &Bucket, params: &Parameters) -> Result<SeasonStatsOutput> {
    let player_plan = player_season_stats(bucket, params)?;
    let team_plan = team_season_stats(bucket, params)?;

    let mut player_stats = player_plan.collect()?;
    info!("Player season table: {} rows", player_stats.height());
    let mut team_stats = team_plan.collect()?;
    info!("Team season table: {} rows", team_stats.height());

    let processed = &params.bucket_files.processed;
    let (player_rows, team_rows) = (player_stats.height(), team_stats.height());
    bucket.write_parquet_all(vec![
        (&mut player_stats, processed.player_season_stats.as_str()),
        (&mut team_stats, processed.team_season_stats.as_str()),
    ])?;

    Ok(SeasonStatsOutput {
        player_stats_path: bucket.path_of(&processed.player_season_stats).display().to_string(),
        player_rows,
        team_stats_path: bucket.path_of(&processed.team_season_stats).display().to_string(),
        team_rows,
    })
}

/// Load a processed parquet file into `table_name` and check the table
/// holds `expected_rows` rows.
pub async fn export_to_warehouse(
    warehouse: &dyn Warehouse,
    filepath: &str,
    table_name: &str,
    expected_rows: usize,
) -> Result<u64> {
    info!(
        "Exporting {} to {} warehouse table {}",
        filepath,
        warehouse.mode(),
        table_name
    );
    warehouse.create_table_from_file(filepath, table_name).await?;

    if !warehouse.table_exists(table_name).await? {
        return Err(PipelineError::Warehouse(format!(
            "table {table_name} missing after load"
        )));
    }
    let row_count = warehouse.table_row_count(table_name).await?;
    if row_count != expected_rows as u64 {
        return Err(PipelineError::Warehouse(format!(
            "table {table_name} holds {row_count} rows, expected {expected_rows}"
        )));
    }
    Ok(row_count)
}

/// One full run: both season tables to the bucket, then (optionally) to the warehouse.
pub async fn season_stats(
    params: &Parameters,
    bucket: &Bucket,
    warehouse: Option<&dyn Warehouse>,
) -> Result<SeasonStatsOutput> {
    let output = compute_season_stats(bucket, params)?;

    if let Some(warehouse) = warehouse {
        export_to_warehouse(
            warehouse,
            &output.player_stats_path,
            PLAYER_SEASON_TABLE,
            output.player_rows,
        )
        .await?;
        export_to_warehouse(
            warehouse,
            &output.team_stats_path,
            TEAM_SEASON_TABLE,
            output.team_rows,
        )
        .await?;
    }

    Ok(output)
}
