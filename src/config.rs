//! Runtime configuration, read from the environment (and `.env`) once at startup.

use std::env;

use chrono::{DateTime, Utc};

use crate::utils::SeasonCalendar;

const DEFAULT_DATABASE_URL: &str = "sqlite:../data/pickem.db";
const DEFAULT_SEASON_START: &str = "2025-08-28T00:00:00-04:00";
const DEFAULT_BOOKMAKER: &str = "draftkings";
const DEFAULT_MAX_WEEK: u32 = 15;

#[derive(Debug, Clone)]
pub struct Settings {
    pub database_url: String,
    /// Shared secret for result entry and user deletion. Admin actions are
    /// refused while unset.
    pub admin_password: Option<String>,
    pub odds_api_key: Option<String>,
    /// The Odds API bookmaker key lines are taken from.
    pub bookmaker: String,
    pub season: SeasonCalendar,
}

impl Settings {
    pub fn from_env() -> Self {
        let database_url =
            env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string());

        let admin_password = non_empty_var("ADMIN_PASSWORD");
        let odds_api_key = non_empty_var("ODDS_API_KEY");

        let bookmaker =
            non_empty_var("ODDS_BOOKMAKER").unwrap_or_else(|| DEFAULT_BOOKMAKER.to_string());

        let start = env::var("SEASON_START")
            .ok()
            .and_then(|v| match parse_season_start(&v) {
                Some(start) => Some(start),
                None => {
                    tracing::warn!("Ignoring invalid SEASON_START '{}'", v);
                    None
                }
            })
            .or_else(|| parse_season_start(DEFAULT_SEASON_START))
            .unwrap_or_else(Utc::now);

        let max_week = env::var("MAX_WEEK")
            .ok()
            .and_then(|v| v.parse::<u32>().ok())
            .filter(|w| *w > 0)
            .unwrap_or(DEFAULT_MAX_WEEK);

        Settings {
            database_url,
            admin_password,
            odds_api_key,
            bookmaker,
            season: SeasonCalendar { start, max_week },
        }
    }

    /// True when `given` matches the configured admin secret.
    pub fn is_admin(&self, given: Option<&str>) -> bool {
        match (self.admin_password.as_deref(), given) {
            (Some(expected), Some(given)) => expected == given,
            _ => false,
        }
    }
}

impl Default for Settings {
    fn default() -> Self {
        Settings {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            admin_password: None,
            odds_api_key: None,
            bookmaker: DEFAULT_BOOKMAKER.to_string(),
            season: SeasonCalendar {
                start: parse_season_start(DEFAULT_SEASON_START).unwrap_or_else(Utc::now),
                max_week: DEFAULT_MAX_WEEK,
            },
        }
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn parse_season_start(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}
