use std::path::Path;

use anyhow::{bail, Result};
use sqlx::SqlitePool;

use crate::config::Settings;
use crate::db::{
    create_pool, get_game, get_picks_for_game, get_result, init_database, record_result, seed_data,
};
use crate::models::{Scope, Standing, StandingsReport};
use crate::services::odds_ingest::SlateSource;
use crate::services::{grade_entry, refresh_week, standings_for};

async fn open_pool(settings: &Settings) -> Result<SqlitePool> {
    let pool = create_pool(&settings.database_url).await?;
    init_database(&pool).await?;
    Ok(pool)
}

pub async fn init_db(settings: &Settings) -> Result<()> {
    println!("🗄️  Initializing database at {}...", settings.database_url);
    open_pool(settings).await?;
    println!("✅ Database ready!");
    Ok(())
}

pub async fn seed(settings: &Settings) -> Result<()> {
    let pool = open_pool(settings).await?;
    println!("🌱 Seeding the week one slate...");
    seed_data(&pool).await?;
    println!("✅ Done!");
    Ok(())
}

pub async fn fetch_games(settings: &Settings, week: Option<u32>) -> Result<()> {
    let pool = open_pool(settings).await?;

    println!("🏈 Fetching games...");
    let slate = refresh_week(&pool, settings, week).await?;

    match slate.source {
        SlateSource::Api => println!("📥 Week {}: {} games from the odds feed", slate.week, slate.count),
        SlateSource::Fallback => println!(
            "⚠️  Week {}: odds feed unavailable, stored {} fallback games",
            slate.week, slate.count
        ),
        SlateSource::Error => {
            println!("❌ Week {}: no games stored", slate.week);
        }
    }
    if let Some(error) = &slate.error {
        println!("   Reason: {}", error);
    }

    for game in &slate.games {
        let line = if game.is_over_under {
            format!("O/U {}", game.total)
        } else {
            format!("{} {:+}", game.home_team, game.spread)
        };
        println!(
            "   • {} {} | {} @ {} | {}",
            game.game_date, game.game_time, game.away_team, game.home_team, line
        );
    }

    Ok(())
}

pub async fn enter_result(
    settings: &Settings,
    game_id: &str,
    home_score: u32,
    away_score: u32,
    is_final: bool,
) -> Result<()> {
    let pool = open_pool(settings).await?;

    let Some(game) = get_game(&pool, game_id).await? else {
        bail!("Game {} not found", game_id);
    };

    let changed = record_result(&pool, game_id, home_score, away_score, is_final).await?;
    let status = if is_final { "final" } else { "in progress" };

    if changed {
        println!(
            "✅ {} {} - {} {} ({})",
            game.home_team, home_score, away_score, game.away_team, status
        );
    } else {
        println!("📭 Result for {} unchanged", game_id);
    }
    Ok(())
}

pub async fn show_standings(
    settings: &Settings,
    week: Option<u32>,
    season: bool,
    csv_path: Option<&Path>,
) -> Result<()> {
    let scope = match (week, season) {
        (Some(0), _) => bail!("Week must be at least 1"),
        (Some(week), _) => Scope::Week(week),
        (None, true) => Scope::Season,
        (None, false) => Scope::Week(settings.season.week_for(chrono::Utc::now())),
    };

    let pool = open_pool(settings).await?;
    let report = standings_for(&pool, scope).await?;

    match scope.week() {
        Some(week) => println!("🏆 Week {} standings", week),
        None => println!("🏆 Season standings"),
    }

    if report.standings.is_empty() {
        println!("📭 No graded picks yet.");
    }

    for (i, standing) in report.standings.iter().enumerate() {
        let pct = standing
            .win_percentage
            .map_or_else(|| "-".to_string(), |p| format!("{}%", p));
        println!(
            "{:>3}. {:<20} {:>8} {:>5}   ({} pending)",
            i + 1,
            standing.name,
            standing.record,
            pct,
            standing.pending
        );
    }

    if !report.skipped.is_empty() {
        println!("\n⚠️  {} picks could not be graded:", report.skipped.len());
        for skipped in &report.skipped {
            println!("   • {} on {}: {}", skipped.user_name, skipped.game_id, skipped.reason);
        }
    }

    if let Some(path) = csv_path {
        write_standings_csv(&report, path)?;
        println!("\n💾 Exported {} rows to {}", report.standings.len(), path.display());
    }

    Ok(())
}

fn write_standings_csv(report: &StandingsReport, path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)?;
    write_standings_rows(&mut writer, &report.standings)?;
    writer.flush()?;
    Ok(())
}

fn write_standings_rows<W: std::io::Write>(
    writer: &mut csv::Writer<W>,
    standings: &[Standing],
) -> Result<()> {
    writer.write_record([
        "rank", "name", "wins", "losses", "pushes", "pending", "total_picks", "win_percentage",
        "record",
    ])?;

    for (i, s) in standings.iter().enumerate() {
        writer.write_record([
            (i + 1).to_string(),
            s.name.clone(),
            s.wins.to_string(),
            s.losses.to_string(),
            s.pushes.to_string(),
            s.pending.to_string(),
            s.total_picks.to_string(),
            s.win_percentage.map(|p| p.to_string()).unwrap_or_default(),
            s.record.clone(),
        ])?;
    }
    Ok(())
}

pub async fn grade_game(settings: &Settings, game_id: &str) -> Result<()> {
    let pool = open_pool(settings).await?;

    let Some(game) = get_game(&pool, game_id).await? else {
        bail!("Game {} not found", game_id);
    };

    println!(
        "🔍 {} @ {} (spread {:+}, total {})",
        game.away_team, game.home_team, game.spread, game.total
    );

    let result = get_result(&pool, game_id).await?.map(|r| r.score());

    match &result {
        Some(r) => println!(
            "   Score: {} {} - {} {}{}",
            game.home_team,
            r.home_score,
            r.away_score,
            game.away_team,
            if r.is_final { "" } else { " (in progress)" }
        ),
        None => println!("   No result recorded yet"),
    }

    let picks = get_picks_for_game(&pool, game_id).await?;
    if picks.is_empty() {
        println!("📭 No picks on this game.");
        return Ok(());
    }

    println!();
    for pick in &picks {
        let line = pick.line.map_or_else(|| "?".to_string(), |l| l.to_string());
        let verdict = match grade_entry(pick, result.as_ref()) {
            Ok(Some(outcome)) => outcome.as_str().to_uppercase(),
            Ok(None) => "pending".to_string(),
            Err(e) => format!("ungradable: {}", e),
        };
        println!(
            "   • {:<20} {:<6} {:<20} @ {:<6} → {}",
            pick.user_name, pick.pick_type, pick.selection, line, verdict
        );
    }

    Ok(())
}
