pub mod seasons;

pub use seasons::PlayerSeasonProcessor;

use std::collections::BTreeMap;

/// Default player metrics: raw column -> output alias.
pub const PLAYERS_METRICS: [(&str, &str); 14] = [
    ("numMinutes", "MIN"),
    ("points", "PTS"),
    ("reboundsTotal", "REB"),
    ("reboundsOffensive", "OREB"),
    ("reboundsDefensive", "DREB"),
    ("assists", "AST"),
    ("steals", "STL"),
    ("blocks", "BLK"),
    ("turnovers", "TOV"),
    ("fieldGoalsAttempted", "FGA"),
    ("threePointersAttempted", "3PA"),
    ("freeThrowsAttempted", "FTA"),
    ("trueShootingAttempts", "TSA"),
    ("trueShootingPercentage", "TS%"),
];

pub fn default_player_metrics() -> BTreeMap<String, String> {
    PLAYERS_METRICS
        .iter()
        .map(|(source, alias)| (source.to_string(), alias.to_string()))
        .collect()
}
