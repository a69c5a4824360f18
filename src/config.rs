use clap::Parser;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

use crate::db::WarehouseMode;
use crate::error::{PipelineError, Result};
use crate::players::default_player_metrics;
use crate::teams::{default_team_metrics, TeamConfigMap};

/// NBA season statistics pipeline
#[derive(Parser, Debug, Clone)]
#[command(name = "nba-season-stats", version, about)]
pub struct Config {
    /// TOML parameters file (bucket paths, metric mappings); built-in defaults when absent
    #[arg(long, env = "SEASON_STATS_PARAMETERS")]
    pub parameters: Option<PathBuf>,

    /// Root directory of the raw / processed datasets bucket
    #[arg(long, env = "BUCKET_ROOT", default_value = "data")]
    pub bucket_root: PathBuf,

    /// Warehouse destination: local SQLite file or remote warehouse
    #[arg(long, env = "WAREHOUSE_MODE", value_enum, default_value_t = WarehouseMode::Local)]
    pub warehouse_mode: WarehouseMode,

    /// SQLite database path (local mode)
    #[arg(long, env = "WAREHOUSE_PATH", default_value = "target/local.db")]
    pub warehouse_path: String,

    /// Remote warehouse base URL (production mode)
    #[arg(long, env = "WAREHOUSE_URL")]
    pub warehouse_url: Option<String>,

    /// Remote warehouse database name
    #[arg(long, env = "WAREHOUSE_DATABASE", default_value = "nba")]
    pub warehouse_database: String,

    /// Remote warehouse access token (required in production mode)
    #[arg(long, env = "WAREHOUSE_TOKEN", hide_env_values = true)]
    pub warehouse_token: Option<String>,

    /// Only write the parquet outputs, skip the warehouse load
    #[arg(long, env = "SKIP_EXPORT", default_value = "false")]
    pub skip_export: bool,
}

impl Config {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.warehouse_mode == WarehouseMode::Production && !self.skip_export {
            if self.warehouse_token.as_deref().map_or(true, str::is_empty) {
                anyhow::bail!(
                    "WAREHOUSE_TOKEN is required in production mode. Use --warehouse-mode local for a local SQLite warehouse."
                );
            }
            if self.warehouse_url.is_none() {
                anyhow::bail!("WAREHOUSE_URL is required in production mode.");
            }
        }
        if self.warehouse_database.is_empty() {
            anyhow::bail!("warehouse_database must not be empty");
        }
        Ok(())
    }
}

/// Raw dataset keys inside the bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketRaw {
    pub games_detail: String,
    pub player_stats: String,
}

/// Processed dataset keys inside the bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BucketProcessed {
    pub team_season_stats: String,
    pub player_season_stats: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BucketFiles {
    pub raw: BucketRaw,
    pub processed: BucketProcessed,
}

impl Default for BucketFiles {
    fn default() -> Self {
        BucketFiles {
            raw: BucketRaw {
                games_detail: "raw/games_detail.parquet".into(),
                player_stats: "raw/player_statistics.parquet".into(),
            },
            processed: BucketProcessed {
                team_season_stats: "processed/team_season_stats.parquet".into(),
                player_season_stats: "processed/player_season_stats.parquet".into(),
            },
        }
    }
}

/// Pipeline parameters, loaded once per run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    #[serde(default)]
    pub bucket_files: BucketFiles,
    /// Raw player column -> output alias
    #[serde(default = "default_player_metrics")]
    pub player_metrics: BTreeMap<String, String>,
    /// Base team metric names
    #[serde(default = "default_team_metrics")]
    pub team_metrics: Vec<String>,
    /// Per-side overrides; derived from `team_metrics` when absent
    #[serde(default)]
    pub teams: Option<TeamConfigMap>,
}

impl Default for Parameters {
    fn default() -> Self {
        Parameters {
            bucket_files: BucketFiles::default(),
            player_metrics: default_player_metrics(),
            team_metrics: default_team_metrics(),
            teams: None,
        }
    }
}

impl Parameters {
    /// Load and validate the parameters file, or the defaults when `path` is `None`.
    pub fn load(path: Option<&PathBuf>) -> Result<Self> {
        let params = match path {
            Some(path) => Self::from_toml(&std::fs::read_to_string(path)?)?,
            None => Parameters::default(),
        };
        params.validate()?;
        Ok(params)
    }

    pub fn from_toml(raw: &str) -> Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    /// Per-side team configuration in effect
    pub fn team_config(&self) -> TeamConfigMap {
        self.teams
            .clone()
            .unwrap_or_else(|| TeamConfigMap::from_metrics(&self.team_metrics))
    }

    pub fn validate(&self) -> Result<()> {
        if self.player_metrics.is_empty() {
            return Err(PipelineError::Config("player_metrics must not be empty".into()));
        }
        if self.team_metrics.is_empty() {
            return Err(PipelineError::Config("team_metrics must not be empty".into()));
        }
        self.team_config().validate(&self.team_metrics)
    }
}
