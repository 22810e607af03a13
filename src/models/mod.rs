use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A game with its posted lines. `spread` is home-signed: negative means the
/// home team is favored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    pub id: String,
    #[serde(default)]
    pub week: u32,
    #[serde(rename = "home")]
    pub home_team: String,
    #[serde(rename = "away")]
    pub away_team: String,
    pub spread: f64,
    pub total: f64,
    #[serde(rename = "date")]
    pub game_date: String, // "YYYY-MM-DD", US Eastern
    #[serde(rename = "time")]
    pub game_time: String, // "HH:MM", US Eastern
    #[serde(default)]
    pub is_over_under: bool,
    #[serde(default)]
    pub is_sec_matchup: bool,
    #[serde(default)]
    pub original_home_team: Option<String>,
    #[serde(default)]
    pub original_away_team: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct GameResult {
    pub game_id: String,
    pub home_score: u32,
    pub away_score: u32,
    pub is_final: bool,
}

/// A result joined with its game, as shown to admins.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ResultView {
    pub game_id: String,
    pub week: u32,
    pub home_team: String,
    pub away_team: String,
    pub home_score: u32,
    pub away_score: u32,
    pub is_final: bool,
    pub updated_at: String,
}

impl ResultView {
    pub fn score(&self) -> GameResult {
        GameResult {
            game_id: self.game_id.clone(),
            home_score: self.home_score,
            away_score: self.away_score,
            is_final: self.is_final,
        }
    }
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PendingGame {
    pub id: String,
    pub week: u32,
    pub home_team: String,
    pub away_team: String,
    pub game_date: String,
    pub game_time: String,
}

/// A stored pick joined with the teams and week of its game. The pick type,
/// selection and line are kept raw so bad rows can be reported instead of
/// failing the whole read.
#[derive(Debug, Clone, PartialEq, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PickEntry {
    pub user_name: String,
    pub game_id: String,
    pub week: u32,
    pub home_team: String,
    pub away_team: String,
    pub pick_type: String,
    pub selection: String,
    pub line: Option<f64>,
}

#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct UserPickCount {
    pub name: String,
    pub total_picks: i64,
}

/// Time window for standings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "scope", content = "week", rename_all = "lowercase")]
pub enum Scope {
    Week(u32),
    Season,
}

impl Scope {
    pub fn contains(&self, week: u32) -> bool {
        match self {
            Scope::Week(w) => *w == week,
            Scope::Season => true,
        }
    }

    pub fn week(&self) -> Option<u32> {
        match self {
            Scope::Week(w) => Some(*w),
            Scope::Season => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Standing {
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub pushes: u32,
    /// Picks in scope whose game has no final result yet.
    pub pending: u32,
    pub total_picks: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub win_percentage: Option<u32>,
    pub record: String,
}

/// A pick left out of the tallies because it could not be graded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SkippedPick {
    pub user_name: String,
    pub game_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StandingsReport {
    #[serde(flatten)]
    pub scope: Scope,
    pub standings: Vec<Standing>,
    pub skipped: Vec<SkippedPick>,
}

// API Response types
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
            timestamp: Utc::now(),
        }
    }
}
