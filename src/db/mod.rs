pub mod seed;
pub use seed::{seed_data, week_one_fallback};

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{sqlite::SqliteConnectOptions, SqlitePool};
use std::collections::{BTreeMap, HashMap};
use std::str::FromStr;

use crate::models::*;
use crate::services::grader::PickType;
use crate::services::standings::{ScopeData, StandingsSource};

pub async fn create_pool(database_url: &str) -> Result<SqlitePool> {
    // Strip the "sqlite:" prefix to get the file path, create parent dir if needed
    let file_path = database_url
        .strip_prefix("sqlite:///")
        .or_else(|| database_url.strip_prefix("sqlite://"))
        .or_else(|| database_url.strip_prefix("sqlite:"))
        .unwrap_or(database_url);

    if !file_path.starts_with(":memory:") {
        if let Some(parent) = std::path::Path::new(file_path).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await.ok();
            }
        }
    }

    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePool::connect_with(options).await?;
    Ok(pool)
}

pub async fn init_database(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL UNIQUE,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS games (
            id TEXT PRIMARY KEY,
            week INTEGER NOT NULL,
            home_team TEXT NOT NULL,
            away_team TEXT NOT NULL,
            spread REAL NOT NULL,
            total REAL NOT NULL,
            game_date TEXT NOT NULL,
            game_time TEXT NOT NULL,
            is_over_under BOOLEAN NOT NULL DEFAULT 0,
            is_sec_matchup BOOLEAN NOT NULL DEFAULT 0,
            original_home_team TEXT,
            original_away_team TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    // line is the spread or total frozen at submission
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS picks (
            id TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            game_id TEXT NOT NULL,
            pick_type TEXT NOT NULL,
            selection TEXT NOT NULL,
            line REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL,
            UNIQUE (user_id, game_id),
            FOREIGN KEY (user_id) REFERENCES users (id) ON DELETE CASCADE,
            FOREIGN KEY (game_id) REFERENCES games (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS results (
            game_id TEXT PRIMARY KEY,
            home_score INTEGER NOT NULL CHECK (home_score >= 0),
            away_score INTEGER NOT NULL CHECK (away_score >= 0),
            is_final BOOLEAN NOT NULL DEFAULT 0,
            updated_at TEXT NOT NULL,
            FOREIGN KEY (game_id) REFERENCES games (id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_games_week ON games(week)")
        .execute(pool)
        .await?;

    sqlx::query("CREATE INDEX IF NOT EXISTS idx_picks_game ON picks(game_id)")
        .execute(pool)
        .await?;

    tracing::info!("Database initialized successfully");
    Ok(())
}

pub async fn check_connection(pool: &SqlitePool) -> Result<String> {
    let now: String = sqlx::query_scalar("SELECT datetime('now')")
        .fetch_one(pool)
        .await?;
    Ok(now)
}

// User operations

/// Find or create a user by name, returning its id.
pub async fn upsert_user(pool: &SqlitePool, name: &str) -> Result<String> {
    let id: String = sqlx::query_scalar(
        r#"
        INSERT INTO users (id, name, created_at)
        VALUES (?, ?, ?)
        ON CONFLICT(name) DO UPDATE SET name = excluded.name
        RETURNING id
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(name)
    .bind(Utc::now().to_rfc3339())
    .fetch_one(pool)
    .await?;

    Ok(id)
}

/// Delete a user and every pick they made. Returns false if no such user.
pub async fn delete_user(pool: &SqlitePool, name: &str) -> Result<bool> {
    let mut tx = pool.begin().await?;

    let id: Option<String> = sqlx::query_scalar("SELECT id FROM users WHERE name = ?")
        .bind(name)
        .fetch_optional(&mut *tx)
        .await?;

    let Some(id) = id else {
        return Ok(false);
    };

    let picks = sqlx::query("DELETE FROM picks WHERE user_id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(&id)
        .execute(&mut *tx)
        .await?;
    tx.commit().await?;

    tracing::info!("Deleted user {} and {} picks", name, picks.rows_affected());
    Ok(true)
}

pub async fn get_pick_counts(pool: &SqlitePool) -> Result<Vec<UserPickCount>> {
    let counts = sqlx::query_as::<_, UserPickCount>(
        r#"
        SELECT u.name, COUNT(p.id) AS total_picks
        FROM users u
        LEFT JOIN picks p ON u.id = p.user_id
        GROUP BY u.name
        ORDER BY total_picks DESC, u.name ASC
        "#,
    )
    .fetch_all(pool)
    .await?;

    Ok(counts)
}

// Game operations

/// Insert a game, or refresh the lines and kickoff of an existing one. Picks
/// keep the line they were made against.
pub async fn upsert_game(pool: &SqlitePool, game: &Game) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO games
        (id, week, home_team, away_team, spread, total, game_date, game_time,
         is_over_under, is_sec_matchup, original_home_team, original_away_team, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(id) DO UPDATE SET
            spread     = excluded.spread,
            total      = excluded.total,
            game_date  = excluded.game_date,
            game_time  = excluded.game_time,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(&game.id)
    .bind(game.week)
    .bind(&game.home_team)
    .bind(&game.away_team)
    .bind(game.spread)
    .bind(game.total)
    .bind(&game.game_date)
    .bind(&game.game_time)
    .bind(game.is_over_under)
    .bind(game.is_sec_matchup)
    .bind(game.original_home_team.as_deref().unwrap_or(&game.home_team))
    .bind(game.original_away_team.as_deref().unwrap_or(&game.away_team))
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

const GAME_COLUMNS: &str = "id, week, home_team, away_team, spread, total, game_date, game_time, \
     is_over_under, is_sec_matchup, original_home_team, original_away_team";

pub async fn get_game(pool: &SqlitePool, game_id: &str) -> Result<Option<Game>> {
    let sql = format!("SELECT {} FROM games WHERE id = ?", GAME_COLUMNS);
    let game = sqlx::query_as::<_, Game>(&sql)
        .bind(game_id)
        .fetch_optional(pool)
        .await?;
    Ok(game)
}

pub async fn get_games_for_week(pool: &SqlitePool, week: u32) -> Result<Vec<Game>> {
    let sql = format!(
        "SELECT {} FROM games WHERE week = ? ORDER BY game_date, game_time, id",
        GAME_COLUMNS
    );
    let games = sqlx::query_as::<_, Game>(&sql)
        .bind(week)
        .fetch_all(pool)
        .await?;
    Ok(games)
}

// Pick operations

pub async fn upsert_pick(
    pool: &SqlitePool,
    user_id: &str,
    game_id: &str,
    pick_type: PickType,
    selection: &str,
    line: f64,
) -> Result<()> {
    let now = Utc::now().to_rfc3339();
    sqlx::query(
        r#"
        INSERT INTO picks (id, user_id, game_id, pick_type, selection, line, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        ON CONFLICT(user_id, game_id) DO UPDATE SET
            pick_type  = excluded.pick_type,
            selection  = excluded.selection,
            line       = excluded.line,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(uuid::Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(game_id)
    .bind(pick_type.as_str())
    .bind(selection)
    .bind(line)
    .bind(&now)
    .bind(&now)
    .execute(pool)
    .await?;

    Ok(())
}

/// A user's selections for one week, keyed by game id.
pub async fn get_user_picks(
    pool: &SqlitePool,
    user_name: &str,
    week: u32,
) -> Result<BTreeMap<String, String>> {
    let rows: Vec<(String, String)> = sqlx::query_as(
        r#"
        SELECT p.game_id, p.selection
        FROM picks p
        JOIN users u ON u.id = p.user_id
        JOIN games g ON g.id = p.game_id
        WHERE u.name = ? AND g.week = ?
        "#,
    )
    .bind(user_name)
    .bind(week)
    .fetch_all(pool)
    .await?;

    Ok(rows.into_iter().collect())
}

// Non-numeric lines come back as NULL so the grader can report them per pick.
const PICK_ENTRY_SELECT: &str = r#"
    SELECT u.name AS user_name, p.game_id, g.week, g.home_team, g.away_team,
           p.pick_type, p.selection,
           CASE WHEN typeof(p.line) IN ('real', 'integer') THEN CAST(p.line AS REAL) END AS line
    FROM picks p
    JOIN users u ON u.id = p.user_id
    JOIN games g ON g.id = p.game_id
"#;

pub async fn get_picks_for_game(pool: &SqlitePool, game_id: &str) -> Result<Vec<PickEntry>> {
    let sql = format!("{} WHERE p.game_id = ? ORDER BY u.name", PICK_ENTRY_SELECT);
    let picks = sqlx::query_as::<_, PickEntry>(&sql)
        .bind(game_id)
        .fetch_all(pool)
        .await?;
    Ok(picks)
}

// Result operations

/// Record a score. Repeating an identical result is a no-op; returns whether
/// anything changed.
pub async fn record_result(
    pool: &SqlitePool,
    game_id: &str,
    home_score: u32,
    away_score: u32,
    is_final: bool,
) -> Result<bool> {
    let done = sqlx::query(
        r#"
        INSERT INTO results (game_id, home_score, away_score, is_final, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(game_id) DO UPDATE SET
            home_score = excluded.home_score,
            away_score = excluded.away_score,
            is_final   = excluded.is_final,
            updated_at = excluded.updated_at
        WHERE results.home_score IS NOT excluded.home_score
           OR results.away_score IS NOT excluded.away_score
           OR results.is_final   IS NOT excluded.is_final
        "#,
    )
    .bind(game_id)
    .bind(home_score)
    .bind(away_score)
    .bind(is_final)
    .bind(Utc::now().to_rfc3339())
    .execute(pool)
    .await?;

    Ok(done.rows_affected() > 0)
}

pub async fn delete_result(pool: &SqlitePool, game_id: &str) -> Result<bool> {
    let done = sqlx::query("DELETE FROM results WHERE game_id = ?")
        .bind(game_id)
        .execute(pool)
        .await?;
    Ok(done.rows_affected() > 0)
}

const RESULT_VIEW_SELECT: &str = r#"
    SELECT r.game_id, g.week, g.home_team, g.away_team,
           r.home_score, r.away_score, r.is_final, r.updated_at
    FROM results r
    JOIN games g ON g.id = r.game_id
"#;

pub async fn get_result(pool: &SqlitePool, game_id: &str) -> Result<Option<ResultView>> {
    let sql = format!("{} WHERE r.game_id = ?", RESULT_VIEW_SELECT);
    let result = sqlx::query_as::<_, ResultView>(&sql)
        .bind(game_id)
        .fetch_optional(pool)
        .await?;
    Ok(result)
}

pub async fn get_results_for_week(pool: &SqlitePool, week: u32) -> Result<Vec<ResultView>> {
    let sql = format!(
        "{} WHERE g.week = ? ORDER BY g.game_date, g.game_time",
        RESULT_VIEW_SELECT
    );
    let results = sqlx::query_as::<_, ResultView>(&sql)
        .bind(week)
        .fetch_all(pool)
        .await?;
    Ok(results)
}

/// Games with no result yet, or only a provisional one.
pub async fn get_pending_games(pool: &SqlitePool) -> Result<Vec<PendingGame>> {
    let games = sqlx::query_as::<_, PendingGame>(
        r#"
        SELECT g.id, g.week, g.home_team, g.away_team, g.game_date, g.game_time
        FROM games g
        LEFT JOIN results r ON g.id = r.game_id
        WHERE r.game_id IS NULL OR r.is_final = 0
        ORDER BY g.week, g.game_date, g.game_time, g.id
        "#,
    )
    .fetch_all(pool)
    .await?;
    Ok(games)
}

// Standings inputs

/// Picks and results for a scope, read in one transaction so both halves
/// see the same state.
pub async fn load_scope(pool: &SqlitePool, scope: Scope) -> Result<ScopeData> {
    let mut tx = pool.begin().await?;

    let (picks, results) = match scope {
        Scope::Week(week) => {
            let sql = format!("{} WHERE g.week = ?", PICK_ENTRY_SELECT);
            let picks = sqlx::query_as::<_, PickEntry>(&sql)
                .bind(week)
                .fetch_all(&mut *tx)
                .await?;
            let results = sqlx::query_as::<_, GameResult>(
                r#"
                SELECT r.game_id, r.home_score, r.away_score, r.is_final
                FROM results r
                JOIN games g ON g.id = r.game_id
                WHERE g.week = ?
                "#,
            )
            .bind(week)
            .fetch_all(&mut *tx)
            .await?;
            (picks, results)
        }
        Scope::Season => {
            let picks = sqlx::query_as::<_, PickEntry>(PICK_ENTRY_SELECT)
                .fetch_all(&mut *tx)
                .await?;
            let results = sqlx::query_as::<_, GameResult>(
                "SELECT game_id, home_score, away_score, is_final FROM results",
            )
            .fetch_all(&mut *tx)
            .await?;
            (picks, results)
        }
    };

    tx.commit().await?;

    Ok(ScopeData {
        picks,
        results: index_results(results),
    })
}

/// A user's picks on games that have a final result, newest week first.
pub async fn load_user_graded(pool: &SqlitePool, user_name: &str) -> Result<ScopeData> {
    let mut tx = pool.begin().await?;

    let sql = format!(
        "{} JOIN results r ON r.game_id = p.game_id \
         WHERE u.name = ? AND r.is_final = 1 \
         ORDER BY g.week DESC, g.game_date DESC, g.game_time DESC",
        PICK_ENTRY_SELECT
    );
    let picks = sqlx::query_as::<_, PickEntry>(&sql)
        .bind(user_name)
        .fetch_all(&mut *tx)
        .await?;

    let results = sqlx::query_as::<_, GameResult>(
        r#"
        SELECT r.game_id, r.home_score, r.away_score, r.is_final
        FROM results r
        JOIN picks p ON p.game_id = r.game_id
        JOIN users u ON u.id = p.user_id
        WHERE u.name = ? AND r.is_final = 1
        "#,
    )
    .bind(user_name)
    .fetch_all(&mut *tx)
    .await?;

    tx.commit().await?;

    Ok(ScopeData {
        picks,
        results: index_results(results),
    })
}

fn index_results(results: Vec<GameResult>) -> HashMap<String, GameResult> {
    results
        .into_iter()
        .map(|r| (r.game_id.clone(), r))
        .collect()
}

#[async_trait]
impl StandingsSource for SqlitePool {
    async fn load_scope(&self, scope: Scope) -> Result<ScopeData> {
        load_scope(self, scope).await
    }
}
