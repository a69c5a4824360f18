use polars::prelude::*;
use tracing::debug;

use super::{Side, TeamConfigMap};
use crate::error::Result;
use crate::games::{parse_game_date, season_id_season};

/// Group keys of the team season table.
pub const TEAM_DIMENSIONS: [&str; 4] = ["season_id", "team", "team_name", "season"];

/// Columns every perspective record starts with, before the side's mappings.
const BASE_COLUMNS: [&str; 5] = ["game_id", "season_id", "season_type", "game_date", "game_location"];

const PRE_SEASON: &str = "Pre Season";

/// Seasons before this year are left out of the team table.
const MIN_SEASON: i32 = 2015;

/// Builds per-season team records from raw game rows holding both sides.
#[derive(Debug, Clone)]
pub struct TeamSeasonProcessor {
    metrics: Vec<String>,
    config_map: TeamConfigMap,
}

impl TeamSeasonProcessor {
    pub fn new(metrics: Vec<String>, config_map: TeamConfigMap) -> Self {
        TeamSeasonProcessor {
            metrics,
            config_map,
        }
    }

    /// Output columns of one side's perspective table, in select order.
    pub fn side_columns(&self, side: Side) -> Vec<String> {
        let config = self.config_map.side(side);

        BASE_COLUMNS
            .iter()
            .map(|c| c.to_string())
            .chain(config.renaming.values().cloned())
            .chain(config.team_metrics.values().cloned())
            .chain(config.opponent_metrics.values().cloned())
            .collect()
    }

    /// Union of both sides' columns: home order first, then away-only columns.
    pub fn canonical_columns(&self) -> Vec<String> {
        let mut columns = self.side_columns(Side::Home);
        for column in self.side_columns(Side::Away) {
            if !columns.contains(&column) {
                columns.push(column);
            }
        }
        columns
    }

    /// Recast every non-preseason game from `side`'s point of view.
    pub fn get_transformed_games(&self, games_detail: LazyFrame, side: Side) -> LazyFrame {
        let applied_config = self.config_map.side(side);

        let mut columns = vec![
            col("game_id"),
            col("season_id"),
            col("season_type"),
            parse_game_date("game_date").alias("game_date"),
            lit(side.as_str()).alias("game_location"),
        ];
        columns.extend(
            applied_config
                .renaming
                .iter()
                .map(|(name, alias)| col(name.as_str()).alias(alias.as_str())),
        );
        columns.extend(applied_config.team_metrics.iter().map(|(name, alias)| {
            col(name.as_str())
                .cast(DataType::Float32)
                .alias(alias.as_str())
        }));
        columns.extend(applied_config.opponent_metrics.iter().map(|(name, alias)| {
            col(name.as_str())
                .cast(DataType::Float32)
                .alias(alias.as_str())
        }));

        games_detail
            .filter(col("season_type").neq(lit(PRE_SEASON)))
            .select(columns)
    }

    /// Project a side's perspective table onto `canonical`, null-filling the
    /// columns that side does not produce.
    fn align(&self, games: LazyFrame, side: Side, canonical: &[String]) -> LazyFrame {
        let own = self.side_columns(side);
        let columns: Vec<Expr> = canonical
            .iter()
            .map(|name| {
                if own.contains(name) {
                    col(name.as_str())
                } else {
                    debug!("Null-filling '{}' for {} perspective", name, side);
                    lit(NULL).alias(name.as_str())
                }
            })
            .collect();
        games.select(columns)
    }

    /// Stack home and away perspectives (two rows per game) and attach the
    /// season of each season identifier.
    ///
    /// The season is resolved over the whole of `games_detail`, preseason
    /// games included, before the `season >= 2015` cut.
    pub fn create_full_games(
        &self,
        home_games: LazyFrame,
        away_games: LazyFrame,
        games_detail: LazyFrame,
    ) -> Result<LazyFrame> {
        let canonical = self.canonical_columns();
        let game_season = season_id_season(games_detail);

        let stacked = concat(
            [
                self.align(home_games, Side::Home, &canonical),
                self.align(away_games, Side::Away, &canonical),
            ],
            UnionArgs {
                to_supertypes: true,
                ..Default::default()
            },
        )?;

        Ok(stacked
            .join(
                game_season,
                [col("season_id")],
                [col("season_id")],
                JoinArgs::new(JoinType::Left),
            )
            .filter(col("season").gt_eq(lit(MIN_SEASON))))
    }

    /// Wins, losses, games played and mean team / opponent metrics per team season.
    pub fn compute_team_season_stats(&self, full_games: LazyFrame) -> LazyFrame {
        let mut aggregations = vec![
            col("wins").sum(),
            col("losses").sum(),
            col("game_id").n_unique().alias("total_games"),
        ];
        aggregations.extend(
            self.metrics
                .iter()
                .map(|metric| col(&format!("team_{metric}")).mean()),
        );
        aggregations.extend(
            self.metrics
                .iter()
                .map(|metric| col(&format!("opponent_{metric}")).mean()),
        );

        full_games
            .with_columns([
                when(col("win_loss").eq(lit("W")))
                    .then(lit(1u32))
                    .otherwise(lit(0u32))
                    .alias("wins"),
                when(col("win_loss").eq(lit("L")))
                    .then(lit(1u32))
                    .otherwise(lit(0u32))
                    .alias("losses"),
            ])
            .group_by(TEAM_DIMENSIONS.into_iter().map(col).collect::<Vec<_>>())
            .agg(aggregations)
    }

    /// Full team plan. Nothing is evaluated until the result is collected.
    pub fn run(&self, games_detail: LazyFrame) -> Result<LazyFrame> {
        let home_games = self.get_transformed_games(games_detail.clone(), Side::Home);
        let away_games = self.get_transformed_games(games_detail.clone(), Side::Away);
        let full_games = self.create_full_games(home_games, away_games, games_detail)?;

        Ok(self.compute_team_season_stats(full_games))
    }
}
