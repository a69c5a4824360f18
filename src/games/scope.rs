//! Season scope resolution.
//!
//! Both resolvers derive a calendar year from `game_date` and keep the maximum
//! year per group. They disagree whenever a season identifier spans a calendar
//! year boundary, so each aggregator uses exactly one of them:
//!
//! - [`game_id_season`]: one row per (`season_id`, `game_id`), i.e. a game's own
//!   year. Used by the player pipeline.
//! - [`season_id_season`]: one row per `season_id`, the latest year among all
//!   of its games. Used by the team pipeline.

use polars::prelude::*;

use super::game_year;

/// Per-game scope: `season_id, game_id, season`.
pub fn game_id_season(games_detail: LazyFrame) -> LazyFrame {
    games_detail
        .with_columns([game_year("game_date").alias("year")])
        .group_by([col("season_id"), col("game_id")])
        .agg([col("year").max().alias("season")])
}

/// Per-season-identifier scope: `season_id, season`.
pub fn season_id_season(games_detail: LazyFrame) -> LazyFrame {
    games_detail
        .with_columns([game_year("game_date").alias("year")])
        .group_by([col("season_id")])
        .agg([col("year").max().alias("season")])
}
