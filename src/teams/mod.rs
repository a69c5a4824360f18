pub mod seasons;

pub use seasons::TeamSeasonProcessor;

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use crate::error::{PipelineError, Result};

/// Base metric names; the raw games table carries `{metric}_home` and `{metric}_away`.
pub const TEAM_METRICS: [&str; 14] = [
    "pts", "fgm", "fga", "fg_pct", "fg3m", "fg3a", "fg3_pct", "ftm", "fta", "ft_pct", "oreb",
    "dreb", "reb", "ast",
];

/// Aliases every side's renaming map must produce.
const REQUIRED_ALIASES: [&str; 3] = ["team", "team_name", "win_loss"];

pub fn default_team_metrics() -> Vec<String> {
    TEAM_METRICS.iter().map(|m| m.to_string()).collect()
}

/// Which side of a game row a perspective record is built from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Home,
    Away,
}

impl Side {
    pub const ALL: [Side; 2] = [Side::Home, Side::Away];

    pub fn as_str(&self) -> &'static str {
        match self {
            Side::Home => "home",
            Side::Away => "away",
        }
    }

    pub fn opposite(&self) -> Side {
        match self {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Side {
    type Err = PipelineError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "home" => Ok(Side::Home),
            "away" => Ok(Side::Away),
            other => Err(PipelineError::UnknownSide(other.to_string())),
        }
    }
}

/// Column mappings used to recast one side of a game row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamSideConfig {
    /// Identity / result columns: raw name -> alias
    pub renaming: BTreeMap<String, String>,
    /// Raw metric column -> `team_<metric>`
    pub team_metrics: BTreeMap<String, String>,
    /// Raw metric column -> `opponent_<metric>`
    pub opponent_metrics: BTreeMap<String, String>,
}

impl TeamSideConfig {
    /// Mechanical mapping for `side`: its own columns become `team_*`, the
    /// other side's become `opponent_*`.
    pub fn for_side(side: Side, metrics: &[String]) -> Self {
        let own = side.as_str();
        let other = side.opposite().as_str();

        let renaming = [
            (format!("wl_{own}"), "win_loss"),
            (format!("team_abbreviation_{own}"), "team"),
            (format!("team_name_{own}"), "team_name"),
            (format!("team_abbreviation_{other}"), "opponent"),
            (format!("team_name_{other}"), "opponent_name"),
        ]
        .into_iter()
        .map(|(source, alias)| (source, alias.to_string()))
        .collect();

        TeamSideConfig {
            renaming,
            team_metrics: metrics
                .iter()
                .map(|m| (format!("{m}_{own}"), format!("team_{m}")))
                .collect(),
            opponent_metrics: metrics
                .iter()
                .map(|m| (format!("{m}_{other}"), format!("opponent_{m}")))
                .collect(),
        }
    }

    fn validate(&self, side: Side, metrics: &[String]) -> Result<()> {
        for alias in REQUIRED_ALIASES {
            if !self.renaming.values().any(|a| a == alias) {
                return Err(PipelineError::Config(format!(
                    "'{side}' renaming does not produce required column '{alias}'"
                )));
            }
        }
        for metric in metrics {
            let team_alias = format!("team_{metric}");
            if !self.team_metrics.values().any(|a| *a == team_alias) {
                return Err(PipelineError::Config(format!(
                    "'{side}' team_metrics has no source for '{team_alias}'"
                )));
            }
            let opponent_alias = format!("opponent_{metric}");
            if !self.opponent_metrics.values().any(|a| *a == opponent_alias) {
                return Err(PipelineError::Config(format!(
                    "'{side}' opponent_metrics has no source for '{opponent_alias}'"
                )));
            }
        }
        Ok(())
    }
}

/// Per-side team configuration. Exactly `home` and `away`; any other key is
/// rejected when deserializing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TeamConfigMap {
    pub home: TeamSideConfig,
    pub away: TeamSideConfig,
}

impl TeamConfigMap {
    pub fn from_metrics(metrics: &[String]) -> Self {
        TeamConfigMap {
            home: TeamSideConfig::for_side(Side::Home, metrics),
            away: TeamSideConfig::for_side(Side::Away, metrics),
        }
    }

    pub fn side(&self, side: Side) -> &TeamSideConfig {
        match side {
            Side::Home => &self.home,
            Side::Away => &self.away,
        }
    }

    /// Check that both sides produce every column the aggregation reads.
    pub fn validate(&self, metrics: &[String]) -> Result<()> {
        for side in Side::ALL {
            self.side(side).validate(side, metrics)?;
        }
        Ok(())
    }
}
