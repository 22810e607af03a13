//! Pulls the week's college football lines from The Odds API and turns them
//! into canonical `Game` records.
//!
//! ## Line convention
//! The spread stored on a game is the home team's handicap as quoted by the
//! bookmaker: `-7.5` means the home team is favored by 7.5. Picks freeze this
//! value for either side and the grader adds it to the home margin.
//!
//! ## Credit budget
//! One request per call (spreads and totals share a single request), limited to a
//! single bookmaker and the Thursday to Tuesday window of the requested week.

use std::collections::HashSet;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;

use crate::config::Settings;
use crate::db::{get_games_for_week, upsert_game, week_one_fallback};
use crate::models::Game;
use crate::utils::eastern_date_time;

const ODDS_API_URL: &str = "https://api.the-odds-api.com/v4/sports/americanfootball_ncaaf/odds/";
const USER_AGENT: &str = "SEC-Pickem/1.0";

// (school, mascot) as the feed spells them
const SEC_TEAMS: &[(&str, &str)] = &[
    ("Alabama", "Crimson Tide"),
    ("Arkansas", "Razorbacks"),
    ("Auburn", "Tigers"),
    ("Florida", "Gators"),
    ("Georgia", "Bulldogs"),
    ("Kentucky", "Wildcats"),
    ("LSU", "Tigers"),
    ("Ole Miss", "Rebels"),
    ("Mississippi State", "Bulldogs"),
    ("Missouri", "Tigers"),
    ("Oklahoma", "Sooners"),
    ("South Carolina", "Gamecocks"),
    ("Tennessee", "Volunteers"),
    ("Texas", "Longhorns"),
    ("Texas A&M", "Aggies"),
    ("Vanderbilt", "Commodores"),
];

// Mascots trimmed from non-conference names
const MASCOT_SUFFIXES: &[&str] = &[
    "Crimson Tide",
    "Razorbacks",
    "Tigers",
    "Gators",
    "Bulldogs",
    "Wildcats",
    "Rebels",
    "Volunteers",
    "Longhorns",
    "Aggies",
    "Commodores",
    "Sooners",
    "Gamecocks",
];

// Games involving this team are over/under picks instead of spread picks.
const OVER_UNDER_TEAM: &str = "South Carolina";

const FUZZY_MATCH_THRESHOLD: f64 = 0.95;

// ── Odds API response types ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct OddsEvent {
    #[serde(default)]
    id: String,
    commence_time: DateTime<Utc>,
    home_team: String,
    away_team: String,
    #[serde(default)]
    bookmakers: Vec<Bookmaker>,
}

#[derive(Debug, Deserialize)]
struct Bookmaker {
    key: String,
    #[serde(default)]
    markets: Vec<Market>,
}

#[derive(Debug, Deserialize)]
struct Market {
    key: String,
    #[serde(default)]
    outcomes: Vec<Outcome>,
}

#[derive(Debug, Deserialize)]
struct Outcome {
    name: String,
    point: Option<f64>,
}

// ── Week slate ────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SlateSource {
    Api,
    Fallback,
    Error,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekSlate {
    pub week: u32,
    pub games: Vec<Game>,
    pub source: SlateSource,
    pub count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub date_from: DateTime<Utc>,
    pub date_to: DateTime<Utc>,
}

/// Fetch the slate for `week` (current week when `None`). Feed failures are
/// folded into the slate: week one falls back to the built-in games, later
/// weeks come back empty with the error attached.
pub async fn load_week(settings: &Settings, week: Option<u32>) -> WeekSlate {
    let calendar = settings.season;
    let week = calendar.clamp_week(week.unwrap_or_else(|| calendar.week_for(Utc::now())));
    let (date_from, date_to) = calendar.week_range(week);

    tracing::info!("Fetching games for week {}: {} to {}", week, date_from, date_to);

    let fetched = match settings.odds_api_key.as_deref() {
        Some(api_key) => fetch_events(api_key, &settings.bookmaker, date_from, date_to)
            .await
            .map(|events| transform_events(&events, week, &settings.bookmaker)),
        None => Err(anyhow!("ODDS_API_KEY not set")),
    };

    let (games, source, error) = match fetched {
        Ok(games) => (games, SlateSource::Api, None),
        Err(e) if week == 1 => {
            tracing::warn!("Odds fetch failed for week 1, using fallback slate: {}", e);
            (week_one_fallback(), SlateSource::Fallback, Some(e.to_string()))
        }
        Err(e) => {
            tracing::error!("Odds fetch failed for week {}: {}", week, e);
            (Vec::new(), SlateSource::Error, Some(e.to_string()))
        }
    };

    WeekSlate {
        week,
        count: games.len(),
        games,
        source,
        error,
        date_from,
        date_to,
    }
}

/// Load the week and store its games so picks can freeze their lines.
///
/// Feed games are always stored. The fallback slate only fills a week with no
/// stored games, since its ids differ from the feed's; otherwise the stored
/// games are returned in its place.
pub async fn refresh_week(pool: &SqlitePool, settings: &Settings, week: Option<u32>) -> Result<WeekSlate> {
    let mut slate = load_week(settings, week).await;

    if slate.source == SlateSource::Fallback {
        let stored = get_games_for_week(pool, slate.week).await?;
        if !stored.is_empty() {
            tracing::info!(
                "Week {} already has {} stored games, not storing the fallback slate",
                slate.week,
                stored.len()
            );
            slate.count = stored.len();
            slate.games = stored;
            return Ok(slate);
        }
    }

    for game in &slate.games {
        upsert_game(pool, game).await?;
    }
    if !slate.games.is_empty() {
        tracing::info!("Stored {} games for week {}", slate.games.len(), slate.week);
    }

    Ok(slate)
}

async fn fetch_events(
    api_key: &str,
    bookmaker: &str,
    from: DateTime<Utc>,
    to: DateTime<Utc>,
) -> Result<Vec<OddsEvent>> {
    let from = from.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);
    let to = to.to_rfc3339_opts(chrono::SecondsFormat::Secs, true);

    let client = reqwest::Client::new();
    let resp = client
        .get(ODDS_API_URL)
        .query(&[
            ("apiKey", api_key),
            ("regions", "us"),
            ("markets", "spreads,totals"),
            ("oddsFormat", "american"),
            ("dateFormat", "iso"),
            ("bookmakers", bookmaker),
            ("commenceTimeFrom", from.as_str()),
            ("commenceTimeTo", to.as_str()),
        ])
        .header(reqwest::header::USER_AGENT, USER_AGENT)
        .timeout(std::time::Duration::from_secs(30))
        .send()
        .await?;

    let status = resp.status();
    if status == 401 {
        return Err(anyhow!("Odds API: invalid API key (401)"));
    }
    if status == 422 {
        return Err(anyhow!("Odds API: request rejected (422)"));
    }
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(anyhow!("Odds API HTTP {}: {}", status, body));
    }

    let events: Vec<OddsEvent> = resp.json().await?;
    tracing::info!("Received {} games from the Odds API", events.len());
    Ok(events)
}

/// Keep conference games with both lines posted, normalise them, drop
/// duplicates and order by kickoff.
pub fn transform_events(events: &[OddsEvent], week: u32, bookmaker: &str) -> Vec<Game> {
    let mut seen = HashSet::new();
    let mut games: Vec<Game> = events
        .iter()
        .filter_map(|event| to_game(event, week, bookmaker))
        .filter(|g| {
            seen.insert(format!(
                "{}|{}|{}|{}",
                g.home_team, g.away_team, g.game_date, g.game_time
            ))
        })
        .collect();

    games.sort_by(|a, b| {
        a.game_date
            .cmp(&b.game_date)
            .then_with(|| a.game_time.cmp(&b.game_time))
    });

    tracing::info!("Normalised {} conference games for week {}", games.len(), week);
    games
}

fn to_game(event: &OddsEvent, week: u32, bookmaker: &str) -> Option<Game> {
    let home = canonical_team_name(&event.home_team);
    let away = canonical_team_name(&event.away_team);
    if !is_sec_team(&home) && !is_sec_team(&away) {
        return None;
    }

    let Some((spread, total)) = lines(event, bookmaker) else {
        tracing::debug!(
            "Odds: skipping {} at {}, lines not posted",
            event.away_team,
            event.home_team
        );
        return None;
    };

    let (date, time) = eastern_date_time(event.commence_time);
    let id = if event.id.is_empty() {
        format!("{}@{}_{}_{}", away, home, date, time)
    } else {
        event.id.clone()
    };

    Some(Game {
        id,
        week,
        is_over_under: over_under_team(&home) || over_under_team(&away),
        is_sec_matchup: is_sec_team(&home) && is_sec_team(&away),
        original_home_team: Some(event.home_team.clone()),
        original_away_team: Some(event.away_team.clone()),
        home_team: home,
        away_team: away,
        spread,
        total,
        game_date: date,
        game_time: time,
    })
}

/// Home spread and game total from the configured bookmaker, or the first one listed.
fn lines(event: &OddsEvent, bookmaker: &str) -> Option<(f64, f64)> {
    let book = event
        .bookmakers
        .iter()
        .find(|b| b.key == bookmaker)
        .or_else(|| event.bookmakers.first())?;

    let market = |key: &str| book.markets.iter().find(|m| m.key == key);

    let spread = market("spreads")?
        .outcomes
        .iter()
        .find(|o| o.name == event.home_team)?
        .point?;
    let total = market("totals")?.outcomes.first()?.point?;

    (spread.is_finite() && total.is_finite()).then_some((spread, total))
}

pub fn is_sec_team(name: &str) -> bool {
    SEC_TEAMS.iter().any(|(school, _)| *school == name)
}

pub fn over_under_team(name: &str) -> bool {
    name == OVER_UNDER_TEAM
}

/// Map a feed name like "Texas A&M Aggies" to the short name used for picks.
pub fn canonical_team_name(raw: &str) -> String {
    let wanted = normalize(raw);

    for (school, mascot) in SEC_TEAMS {
        if wanted == normalize(school) || wanted == normalize(&format!("{} {}", school, mascot)) {
            return school.to_string();
        }
    }

    let best = SEC_TEAMS
        .iter()
        .map(|(school, mascot)| {
            let full = normalize(&format!("{} {}", school, mascot));
            (school, strsim::jaro_winkler(&wanted, &full))
        })
        .max_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
    if let Some((school, score)) = best {
        if score >= FUZZY_MATCH_THRESHOLD {
            return school.to_string();
        }
    }

    let mut name = raw.trim().to_string();
    for mascot in MASCOT_SUFFIXES {
        if name.len() > mascot.len() && name.to_lowercase().ends_with(&format!(" {}", mascot.to_lowercase())) {
            name.truncate(name.len() - mascot.len() - 1);
            break;
        }
    }
    if let Some(rest) = name.strip_prefix("Miss ") {
        name = format!("Mississippi {}", rest);
    }
    name.trim().to_string()
}

/// Fuzzy team-name key: lowercase, "A & M" folded to "a&m", punctuation dropped.
fn normalize(s: &str) -> String {
    s.to_lowercase()
        .replace(" & ", "&")
        .replace('.', "")
        .replace('-', " ")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
