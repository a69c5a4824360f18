use std::collections::BTreeMap;

use polars::prelude::*;

use crate::games::game_year;

/// Group keys of the player season table.
pub const PLAYER_DIMENSIONS: [&str; 5] = ["season", "firstName", "lastName", "personId", "gameType"];

/// Player games dated before this calendar year are ignored.
const MIN_GAME_YEAR: i32 = 2014;

/// Weight of free-throw attempts in true shooting attempts.
const FREE_THROW_WEIGHT: f64 = 0.44;

/// Builds the per-season player averages from raw player box scores.
#[derive(Debug, Clone)]
pub struct PlayerSeasonProcessor {
    /// Raw column -> output alias; only these metrics are aggregated.
    metrics: BTreeMap<String, String>,
}

impl PlayerSeasonProcessor {
    pub fn new(metrics: BTreeMap<String, String>) -> Self {
        PlayerSeasonProcessor { metrics }
    }

    /// Add `trueShootingAttempts` and `trueShootingPercentage`.
    ///
    /// Zero attempts are not guarded: the percentage becomes `inf` (or `NaN`
    /// for zero points) and is averaged as such.
    pub fn compute_true_shooting(player_stats: LazyFrame) -> LazyFrame {
        let ts_attempts =
            col("fieldGoalsAttempted") + lit(FREE_THROW_WEIGHT) * col("freeThrowsAttempted");
        let ts_percentage = col("points") / (lit(2.0) * ts_attempts.clone());

        player_stats.with_columns([
            ts_attempts.alias("trueShootingAttempts"),
            ts_percentage.alias("trueShootingPercentage"),
        ])
    }

    /// Keep games from 2014 on, then project the identity columns and the
    /// configured metrics under their aliases.
    pub fn filter_and_rename(&self, game_stats: LazyFrame) -> LazyFrame {
        let is_after_2014 = game_year("gameDate").gt_eq(lit(MIN_GAME_YEAR));

        let mut columns: Vec<Expr> = ["gameId", "firstName", "lastName", "personId", "gameType"]
            .into_iter()
            .map(col)
            .collect();
        columns.extend(
            self.metrics
                .iter()
                .map(|(source, alias)| col(source.as_str()).alias(alias.as_str())),
        );

        game_stats.filter(is_after_2014).select(columns)
    }

    /// Attach the season of every game and average per player and game type.
    ///
    /// `scope_game_ids` is the per-game scope (`game_id`, `season`); player
    /// games missing from it are dropped by the inner join.
    pub fn compute_season_avg(
        &self,
        players_stats: LazyFrame,
        scope_game_ids: LazyFrame,
    ) -> LazyFrame {
        let scope = scope_game_ids.select([col("game_id"), col("season")]);
        let games_played = col("gameId").n_unique().alias("GP");

        let mut aggregations = vec![games_played];
        aggregations.extend(
            self.metrics
                .values()
                .map(|alias| col(alias.as_str()).mean().round(1).alias(alias.as_str())),
        );

        players_stats
            .join(
                scope,
                [col("gameId")],
                [col("game_id")],
                JoinArgs::new(JoinType::Inner),
            )
            .group_by(PLAYER_DIMENSIONS.into_iter().map(col).collect::<Vec<_>>())
            .agg(aggregations)
    }

    /// Full player plan. Nothing is evaluated until the result is collected.
    pub fn run(&self, game_stats: LazyFrame, scope_game_ids: LazyFrame) -> LazyFrame {
        let consolidated_stats = Self::compute_true_shooting(game_stats);
        let prepared_stats = self.filter_and_rename(consolidated_stats);

        self.compute_season_avg(prepared_stats, scope_game_ids)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::games::game_id_season;
    use crate::testing::{f64_at, row_where_i64, u32_at};
    use approx::assert_relative_eq;

    fn metrics(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(s, a)| (s.to_string(), a.to_string()))
            .collect()
    }

    fn full_metrics() -> BTreeMap<String, String> {
        metrics(&[
            ("points", "PTS"),
            ("reboundsTotal", "REB"),
            ("fieldGoalsAttempted", "FGA"),
            ("freeThrowsAttempted", "FTA"),
            ("trueShootingAttempts", "TSA"),
            ("trueShootingPercentage", "TS%"),
        ])
    }

    fn game_stats() -> DataFrame {
        df!(
            "gameId" => [1i64, 2, 3, 4],
            "gameDate" => ["2023-10-01", "2023-01-01", "2023-10-21", "2023-12-01"],
            "firstName" => ["John", "John", "Jane", "Jane"],
            "lastName" => ["Doe", "Doe", "Smith", "Smith"],
            "personId" => [101i64, 101, 102, 102],
            "gameType" => ["Regular", "Regular", "Regular", "Regular"],
            "points" => [10i64, 20, 15, 25],
            "reboundsTotal" => [5i64, 7, 6, 8],
            "fieldGoalsAttempted" => [10i64, 12, 8, 10],
            "freeThrowsAttempted" => [2i64, 2, 2, 2],
        )
        .unwrap()
    }

    fn games_detail(game_ids: &[i64], dates: &[&str]) -> LazyFrame {
        df!(
            "game_id" => game_ids,
            "season_id" => vec![22023i64; game_ids.len()],
            "game_date" => dates,
        )
        .unwrap()
        .lazy()
    }

    fn scope() -> LazyFrame {
        game_id_season(games_detail(
            &[1, 2, 3, 4],
            &["2023-10-01", "2023-01-01", "2023-10-21", "2023-12-01"],
        ))
    }

    #[test]
    fn test_compute_true_shooting() {
        let stats = df!(
            "points" => [10i64, 20],
            "fieldGoalsAttempted" => [5i64, 8],
            "freeThrowsAttempted" => [2i64, 4],
        )
        .unwrap();

        let result = PlayerSeasonProcessor::compute_true_shooting(stats.lazy())
            .collect()
            .unwrap();

        assert_relative_eq!(f64_at(&result, "trueShootingAttempts", 0), 5.88, epsilon = 1e-9);
        assert_relative_eq!(
            f64_at(&result, "trueShootingPercentage", 0),
            10.0 / (2.0 * 5.88),
            epsilon = 1e-9
        );
        assert_relative_eq!(f64_at(&result, "trueShootingPercentage", 0), 0.8503, epsilon = 1e-4);
        assert_relative_eq!(f64_at(&result, "trueShootingAttempts", 1), 8.0 + 0.44 * 4.0, epsilon = 1e-9);
        // Raw columns are kept alongside the derived ones
        assert_eq!(result.width(), 5);
    }

    #[test]
    fn test_true_shooting_zero_attempts_is_not_finite() {
        let stats = df!(
            "points" => [4i64, 0],
            "fieldGoalsAttempted" => [0i64, 0],
            "freeThrowsAttempted" => [0i64, 0],
        )
        .unwrap();

        let result = PlayerSeasonProcessor::compute_true_shooting(stats.lazy())
            .collect()
            .unwrap();

        assert!(f64_at(&result, "trueShootingPercentage", 0).is_infinite());
        assert!(f64_at(&result, "trueShootingPercentage", 1).is_nan());
    }

    #[test]
    fn test_filter_and_rename_drops_old_games_and_unconfigured_columns() {
        let stats = df!(
            "gameId" => [1i64, 2],
            "gameDate" => ["2013-04-17 20:00:00", "2014-10-28 19:30:00"],
            "firstName" => ["John", "John"],
            "lastName" => ["Doe", "Doe"],
            "personId" => [101i64, 101],
            "gameType" => ["Regular", "Regular"],
            "points" => [10i64, 20],
            "assists" => [3i64, 4],
        )
        .unwrap();

        let processor = PlayerSeasonProcessor::new(metrics(&[("points", "PTS")]));
        let result = processor.filter_and_rename(stats.lazy()).collect().unwrap();

        assert_eq!(result.height(), 1);
        assert_eq!(
            result.get_column_names(),
            &["gameId", "firstName", "lastName", "personId", "gameType", "PTS"]
        );
        assert_relative_eq!(f64_at(&result, "PTS", 0), 20.0);
    }

    #[test]
    fn test_compute_season_avg() {
        let players_stats = df!(
            "gameId" => [1i64, 2],
            "firstName" => ["John", "John"],
            "lastName" => ["Doe", "Doe"],
            "personId" => [101i64, 101],
            "gameType" => ["Regular", "Regular"],
            "PTS" => [10i64, 20],
            "REB" => [5i64, 7],
        )
        .unwrap();

        let processor =
            PlayerSeasonProcessor::new(metrics(&[("points", "PTS"), ("rebounds", "REB")]));
        let result = processor
            .compute_season_avg(players_stats.lazy(), scope())
            .collect()
            .unwrap();

        assert_eq!(result.height(), 1);
        assert_eq!(u32_at(&result, "GP", 0), 2);
        assert_relative_eq!(f64_at(&result, "PTS", 0), 15.0);
        assert_relative_eq!(f64_at(&result, "REB", 0), 6.0);
        assert_relative_eq!(f64_at(&result, "season", 0), 2023.0);
    }

    #[test]
    fn test_run() {
        let processor = PlayerSeasonProcessor::new(full_metrics());
        let result = processor.run(game_stats().lazy(), scope()).collect().unwrap();

        assert_eq!(result.height(), 2);

        let john = row_where_i64(&result, "personId", 101);
        assert_eq!(u32_at(&result, "GP", john), 2);
        assert_relative_eq!(f64_at(&result, "PTS", john), 15.0);
        assert_relative_eq!(f64_at(&result, "REB", john), 6.0);
        assert_relative_eq!(f64_at(&result, "FGA", john), 11.0);
        assert_relative_eq!(f64_at(&result, "FTA", john), 2.0);
        assert_relative_eq!(f64_at(&result, "TSA", john), 11.9);
        assert_relative_eq!(f64_at(&result, "TS%", john), 0.6);

        let jane = row_where_i64(&result, "personId", 102);
        assert_eq!(u32_at(&result, "GP", jane), 2);
        assert_relative_eq!(f64_at(&result, "PTS", jane), 20.0);
        assert_relative_eq!(f64_at(&result, "REB", jane), 7.0);
        assert_relative_eq!(f64_at(&result, "TSA", jane), 9.9);
        assert_relative_eq!(f64_at(&result, "TS%", jane), 1.0);
    }

    #[test]
    fn test_run_drops_games_missing_from_scope() {
        let processor = PlayerSeasonProcessor::new(metrics(&[("points", "PTS")]));
        let partial_scope = game_id_season(games_detail(&[1, 3], &["2023-10-01", "2023-10-21"]));

        let result = processor
            .run(game_stats().lazy(), partial_scope)
            .collect()
            .unwrap();

        let john = row_where_i64(&result, "personId", 101);
        assert_eq!(u32_at(&result, "GP", john), 1);
        assert_relative_eq!(f64_at(&result, "PTS", john), 10.0);
    }

    #[test]
    fn test_run_is_order_independent() {
        let processor = PlayerSeasonProcessor::new(full_metrics());
        let reversed = game_stats().reverse();

        let a = processor.run(game_stats().lazy(), scope()).collect().unwrap();
        let b = processor.run(reversed.lazy(), scope()).collect().unwrap();

        for person_id in [101, 102] {
            let (ra, rb) = (row_where_i64(&a, "personId", person_id), row_where_i64(&b, "personId", person_id));
            for column in ["PTS", "REB", "TSA", "TS%"] {
                assert_relative_eq!(f64_at(&a, column, ra), f64_at(&b, column, rb));
            }
        }
    }

    #[test]
    fn test_run_fails_on_missing_source_column() {
        let processor = PlayerSeasonProcessor::new(metrics(&[("steals", "STL")]));
        assert!(processor.run(game_stats().lazy(), scope()).collect().is_err());
    }
}
