use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, Utc};

/// Win percentage over decided picks, rounded to a whole number. Pushes are
/// not decided, so they stay out of the denominator.
pub fn win_percentage(wins: u32, losses: u32) -> Option<u32> {
    let decided = wins + losses;
    if decided == 0 {
        return None;
    }
    Some((100.0 * f64::from(wins) / f64::from(decided)).round() as u32)
}

/// Validate a user display name
pub fn validate_user_name(name: &str) -> bool {
    !name.trim().is_empty() && name.len() <= 100
}

/// Season weeks run Thursday through Tuesday, starting from `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SeasonCalendar {
    pub start: DateTime<Utc>,
    pub max_week: u32,
}

impl SeasonCalendar {
    pub fn clamp_week(&self, week: u32) -> u32 {
        week.max(1).min(self.max_week.max(1))
    }

    /// The week `now` falls in. Dates before the season map to week 1.
    pub fn week_for(&self, now: DateTime<Utc>) -> u32 {
        if now < self.start {
            return 1;
        }
        let weeks = (now - self.start).num_weeks();
        self.clamp_week(u32::try_from(weeks + 1).unwrap_or(u32::MAX))
    }

    /// Thursday start of `week` through the following Tuesday.
    pub fn week_range(&self, week: u32) -> (DateTime<Utc>, DateTime<Utc>) {
        let offset = i64::from(self.clamp_week(week) - 1) * 7;
        let start = self.start + Duration::days(offset);
        (start, start + Duration::days(5))
    }
}

/// Kickoff as a US Eastern `("YYYY-MM-DD", "HH:MM")` pair.
pub fn eastern_date_time(utc: DateTime<Utc>) -> (String, String) {
    let hours = if in_us_dst(utc) { 4 } else { 5 };
    let local = utc.naive_utc() - Duration::hours(hours);
    (
        local.format("%Y-%m-%d").to_string(),
        local.format("%H:%M").to_string(),
    )
}

// DST runs from 2am on the second Sunday of March to 2am on the first Sunday of November.
fn in_us_dst(utc: DateTime<Utc>) -> bool {
    let t = utc.naive_utc();
    us_dst_bounds(utc.year()).is_some_and(|(start, end)| t >= start && t < end)
}

fn us_dst_bounds(year: i32) -> Option<(NaiveDateTime, NaiveDateTime)> {
    let start = nth_sunday(year, 3, 2)?.and_hms_opt(7, 0, 0)?;
    let end = nth_sunday(year, 11, 1)?.and_hms_opt(6, 0, 0)?;
    Some((start, end))
}

fn nth_sunday(year: i32, month: u32, n: u32) -> Option<NaiveDate> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let to_sunday = (7 - first.weekday().num_days_from_sunday()) % 7;
    first.checked_add_signed(Duration::days(i64::from(to_sunday + 7 * (n - 1))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn calendar() -> SeasonCalendar {
        SeasonCalendar {
            start: DateTime::parse_from_rfc3339("2025-08-28T00:00:00-04:00")
                .unwrap()
                .with_timezone(&Utc),
            max_week: 15,
        }
    }

    #[test]
    fn test_win_percentage() {
        assert_eq!(win_percentage(3, 1), Some(75));
        assert_eq!(win_percentage(2, 1), Some(67));
        assert_eq!(win_percentage(1, 2), Some(33));
        assert_eq!(win_percentage(1, 1), Some(50));
        assert_eq!(win_percentage(0, 4), Some(0));
        assert_eq!(win_percentage(0, 0), None);
    }

    #[test]
    fn test_validate_user_name() {
        assert!(validate_user_name("Kirby"));
        assert!(!validate_user_name("   "));
        assert!(!validate_user_name(&"x".repeat(101)));
    }

    #[test]
    fn test_week_for() {
        let cal = calendar();
        assert_eq!(cal.week_for(Utc.with_ymd_and_hms(2025, 8, 1, 12, 0, 0).unwrap()), 1);
        assert_eq!(cal.week_for(Utc.with_ymd_and_hms(2025, 8, 30, 16, 0, 0).unwrap()), 1);
        assert_eq!(cal.week_for(Utc.with_ymd_and_hms(2025, 9, 4, 5, 0, 0).unwrap()), 2);
        assert_eq!(cal.week_for(Utc.with_ymd_and_hms(2025, 10, 18, 20, 0, 0).unwrap()), 8);
        assert_eq!(cal.week_for(Utc.with_ymd_and_hms(2026, 3, 1, 0, 0, 0).unwrap()), 15);
    }

    #[test]
    fn test_week_range() {
        let cal = calendar();
        let (start, end) = cal.week_range(2);
        assert_eq!(start, Utc.with_ymd_and_hms(2025, 9, 4, 4, 0, 0).unwrap());
        assert_eq!(end, Utc.with_ymd_and_hms(2025, 9, 9, 4, 0, 0).unwrap());

        // Out-of-range weeks clamp to the season.
        assert_eq!(cal.week_range(0), cal.week_range(1));
        assert_eq!(cal.week_range(40), cal.week_range(15));
    }

    #[test]
    fn test_eastern_date_time() {
        // EDT in early September
        let kickoff = Utc.with_ymd_and_hms(2025, 9, 6, 23, 30, 0).unwrap();
        assert_eq!(eastern_date_time(kickoff), ("2025-09-06".to_string(), "19:30".to_string()));

        // Late kickoff rolls back across midnight
        let kickoff = Utc.with_ymd_and_hms(2025, 9, 7, 0, 15, 0).unwrap();
        assert_eq!(eastern_date_time(kickoff), ("2025-09-06".to_string(), "20:15".to_string()));

        // EST after the first Sunday of November
        let kickoff = Utc.with_ymd_and_hms(2025, 11, 15, 17, 0, 0).unwrap();
        assert_eq!(eastern_date_time(kickoff), ("2025-11-15".to_string(), "12:00".to_string()));
    }
}
