pub mod scope;

pub use scope::{game_id_season, season_id_season};

use polars::prelude::*;

/// Parse a raw date string column (`YYYY-MM-DD`, optionally with a time part)
/// into a datetime expression.
pub fn parse_game_date(column: &str) -> Expr {
    col(column).str().to_datetime(
        Some(TimeUnit::Microseconds),
        None,
        StrptimeOptions::default(),
        lit("raise"),
    )
}

/// Calendar year of a raw date string column.
pub fn game_year(column: &str) -> Expr {
    parse_game_date(column).dt().year()
}
