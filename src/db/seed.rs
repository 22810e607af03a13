use anyhow::Result;
use sqlx::SqlitePool;

use crate::db::upsert_game;
use crate::models::Game;
use crate::services::odds_ingest::{is_sec_team, over_under_team};

/// Week-one slate used when the odds feed is unavailable.
///
/// Spreads are home-signed like every stored line: Ohio State -3.5 means the
/// home Buckeyes give 3.5.
pub fn week_one_fallback() -> Vec<Game> {
    // (id, away, home, date, time, spread, total)
    let slate: Vec<(&str, &str, &str, &str, &str, f64, f64)> = vec![
        ("week1_centralarks_missouri",      "Central Arkansas",    "Missouri",       "2025-08-28", "19:30", -24.5, 56.5),
        ("week1_auburn_baylor",             "Auburn",              "Baylor",         "2025-08-29", "20:00",   2.5, 55.5),
        ("week1_texas_ohiostate",           "Texas",               "Ohio State",     "2025-08-30", "12:00",  -3.5, 52.5),
        ("week1_msstate_southernmiss",      "Mississippi State",   "Southern Miss",  "2025-08-30", "12:00",   7.5, 49.5),
        ("week1_syracuse_tennessee",        "Syracuse",            "Tennessee",      "2025-08-30", "12:00", -17.5, 56.5),
        ("week1_toledo_kentucky",           "Toledo",              "Kentucky",       "2025-08-30", "12:45", -14.5, 52.5),
        ("week1_alabamaam_arkansas",        "Alabama A&M",         "Arkansas",       "2025-08-30", "15:15", -42.5, 64.5),
        ("week1_alabama_floridastate",      "Alabama",             "Florida State",  "2025-08-30", "15:30",  10.5, 59.5),
        ("week1_marshall_georgia",          "Marshall",            "Georgia",        "2025-08-30", "15:30", -28.5, 61.5),
        ("week1_illinoisstate_oklahoma",    "Illinois State",      "Oklahoma",       "2025-08-30", "18:00", -35.5, 61.5),
        ("week1_utsa_texasam",              "UTSA",                "Texas A&M",      "2025-08-30", "19:00", -21.5, 54.5),
        ("week1_charleston_vanderbilt",     "Charleston Southern", "Vanderbilt",     "2025-08-30", "19:00", -35.5, 58.5),
        ("week1_liu_florida",               "LIU",                 "Florida",        "2025-08-30", "19:00", -48.5, 67.5),
        ("week1_georgiastate_olemiss",      "Georgia State",       "Ole Miss",       "2025-08-30", "19:45", -28.5, 63.5),
        ("week1_southcarolina_virginiatech","South Carolina",      "Virginia Tech",  "2025-08-31", "15:00",  -1.5, 48.5),
    ];

    slate
        .into_iter()
        .map(|(id, away, home, date, time, spread, total)| Game {
            id: id.to_string(),
            week: 1,
            home_team: home.to_string(),
            away_team: away.to_string(),
            spread,
            total,
            game_date: date.to_string(),
            game_time: time.to_string(),
            is_over_under: over_under_team(home) || over_under_team(away),
            is_sec_matchup: is_sec_team(home) && is_sec_team(away),
            original_home_team: None,
            original_away_team: None,
        })
        .collect()
}

pub async fn seed_data(pool: &SqlitePool) -> Result<()> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM games")
        .fetch_one(pool)
        .await?;

    if count > 0 {
        tracing::info!("Database already seeded ({} games found), skipping.", count);
        return Ok(());
    }

    tracing::info!("Seeding database with the week one slate...");

    let games = week_one_fallback();
    for game in &games {
        upsert_game(pool, game).await?;
    }

    tracing::info!("Database seeded with {} games.", games.len());
    Ok(())
}
