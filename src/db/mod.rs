use async_trait::async_trait;
use clap::ValueEnum;
use std::fmt;

pub mod remote;
pub mod sqlite;

pub use remote::RemoteWarehouse;
pub use sqlite::SqliteWarehouse;

use crate::config::Config;
use crate::error::{PipelineError, Result};

/// Warehouse table holding the player season table
pub const PLAYER_SEASON_TABLE: &str = "player_season_stats";
/// Warehouse table holding the team season table
pub const TEAM_SEASON_TABLE: &str = "team_season_stats";

/// Where derived tables are loaded
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum WarehouseMode {
    /// Local SQLite file
    Local,
    /// Remote SQL-over-HTTP warehouse, token authenticated
    Production,
}

impl fmt::Display for WarehouseMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WarehouseMode::Local => f.write_str("local"),
            WarehouseMode::Production => f.write_str("production"),
        }
    }
}

/// Analytical warehouse the processed parquet files are bulk-loaded into.
#[async_trait]
pub trait Warehouse: Send + Sync {
    /// Create (or replace) `table_name` from the parquet file at `filepath`.
    /// Returns the row count of the new table.
    async fn create_table_from_file(&self, filepath: &str, table_name: &str) -> Result<u64>;

    async fn table_exists(&self, table_name: &str) -> Result<bool>;

    /// Row count of `table_name`, 0 when the table does not exist.
    async fn table_row_count(&self, table_name: &str) -> Result<u64>;

    /// Release the underlying connection. Later calls fail.
    fn close(&self) -> Result<()>;

    fn mode(&self) -> WarehouseMode;
}

/// Build the warehouse selected by `config.warehouse_mode`.
pub fn open_warehouse(config: &Config) -> Result<Box<dyn Warehouse>> {
    match config.warehouse_mode {
        WarehouseMode::Local => Ok(Box::new(SqliteWarehouse::open(&config.warehouse_path)?)),
        WarehouseMode::Production => {
            let url = config.warehouse_url.as_deref().ok_or_else(|| {
                PipelineError::Config("WAREHOUSE_URL is required for production mode".into())
            })?;
            Ok(Box::new(RemoteWarehouse::new(
                url,
                &config.warehouse_database,
                config.warehouse_token.clone(),
            )?))
        }
    }
}

/// Table names are interpolated into SQL, so only `[A-Za-z0-9_]` is accepted.
pub fn validate_table_name(table_name: &str) -> Result<()> {
    let valid = !table_name.is_empty()
        && !table_name.starts_with(|c: char| c.is_ascii_digit())
        && table_name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(())
    } else {
        Err(PipelineError::Config(format!(
            "invalid warehouse table name '{table_name}'"
        )))
    }
}

/// Double-quote an identifier for SQL.
pub(crate) fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
