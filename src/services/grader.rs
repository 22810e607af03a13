use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::models::GameResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PickType {
    Spread,
    Total,
}

impl PickType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PickType::Spread => "spread",
            PickType::Total => "total",
        }
    }

    /// Over/under selections are total picks, anything else names a team.
    pub fn for_selection(selection: &str) -> Self {
        if selection.eq_ignore_ascii_case("over") || selection.eq_ignore_ascii_case("under") {
            PickType::Total
        } else {
            PickType::Spread
        }
    }
}

impl fmt::Display for PickType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PickType {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "spread" => Ok(PickType::Spread),
            "total" => Ok(PickType::Total),
            other => Err(GradeError::UnknownPickType(other.to_string())),
        }
    }
}

/// The side of the line a pick takes, resolved against the game's teams.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
    Over,
    Under,
}

impl Side {
    pub fn resolve(
        pick_type: PickType,
        selection: &str,
        home_team: &str,
        away_team: &str,
    ) -> Result<Self, GradeError> {
        let selection = selection.trim();
        match pick_type {
            PickType::Total => {
                if selection.eq_ignore_ascii_case("over") {
                    Ok(Side::Over)
                } else if selection.eq_ignore_ascii_case("under") {
                    Ok(Side::Under)
                } else {
                    Err(GradeError::SelectionMismatch {
                        pick_type,
                        selection: selection.to_string(),
                    })
                }
            }
            PickType::Spread => {
                if selection.eq_ignore_ascii_case("over") || selection.eq_ignore_ascii_case("under") {
                    Err(GradeError::SelectionMismatch {
                        pick_type,
                        selection: selection.to_string(),
                    })
                } else if selection == home_team {
                    Ok(Side::Home)
                } else if selection == away_team {
                    Ok(Side::Away)
                } else {
                    Err(GradeError::UnknownTeam {
                        selection: selection.to_string(),
                        home: home_team.to_string(),
                        away: away_team.to_string(),
                    })
                }
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Win,
    Loss,
    Push,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Win => "win",
            Outcome::Loss => "loss",
            Outcome::Push => "push",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reasons a stored pick cannot be graded at all.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GradeError {
    #[error("unknown pick type '{0}'")]
    UnknownPickType(String),

    #[error("selection '{selection}' is not valid for a {pick_type} pick")]
    SelectionMismatch { pick_type: PickType, selection: String },

    #[error("selection '{selection}' matches neither {away} nor {home}")]
    UnknownTeam {
        selection: String,
        home: String,
        away: String,
    },

    #[error("line is missing or not numeric")]
    MissingLine,

    #[error("line {0} is not a finite number")]
    NonFiniteLine(f64),
}

/// A validated pick: the side taken and the line frozen when it was submitted.
///
/// Spread lines are home-signed: `-3.5` means the home team gives 3.5 points,
/// regardless of which side the pick is on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradablePick {
    pub side: Side,
    pub line: f64,
}

impl GradablePick {
    pub fn new(side: Side, line: f64) -> Result<Self, GradeError> {
        if !line.is_finite() {
            return Err(GradeError::NonFiniteLine(line));
        }
        Ok(Self { side, line })
    }

    /// Validate a pick as stored: raw type and selection strings plus the frozen line.
    pub fn from_raw(
        pick_type: &str,
        selection: &str,
        line: Option<f64>,
        home_team: &str,
        away_team: &str,
    ) -> Result<Self, GradeError> {
        let pick_type = pick_type.parse::<PickType>()?;
        let side = Side::resolve(pick_type, selection, home_team, away_team)?;
        let line = line.ok_or(GradeError::MissingLine)?;
        Self::new(side, line)
    }
}

/// Grade a pick against a result. `None` means the game is not final yet.
pub fn grade_pick(pick: &GradablePick, result: &GameResult) -> Option<Outcome> {
    if !result.is_final {
        return None;
    }

    let home = f64::from(result.home_score);
    let away = f64::from(result.away_score);

    let outcome = match pick.side {
        Side::Home | Side::Away => {
            let adjusted = home - away + pick.line;
            if adjusted == 0.0 {
                Outcome::Push
            } else if (pick.side == Side::Home) == (adjusted > 0.0) {
                Outcome::Win
            } else {
                Outcome::Loss
            }
        }
        Side::Over | Side::Under => {
            let points = home + away;
            if points == pick.line {
                Outcome::Push
            } else if (pick.side == Side::Over) == (points > pick.line) {
                Outcome::Win
            } else {
                Outcome::Loss
            }
        }
    };

    Some(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;

    // The opposite side of the same line.
    fn flipped(side: Side) -> Side {
        match side {
            Side::Home => Side::Away,
            Side::Away => Side::Home,
            Side::Over => Side::Under,
            Side::Under => Side::Over,
        }
    }

    fn final_score(home: u32, away: u32) -> GameResult {
        GameResult {
            game_id: "g1".to_string(),
            home_score: home,
            away_score: away,
            is_final: true,
        }
    }

    fn pick(side: Side, line: f64) -> GradablePick {
        GradablePick::new(side, line).unwrap()
    }

    #[test]
    fn home_favorite_covers_by_half_a_point() {
        let result = final_score(24, 20);
        assert_eq!(grade_pick(&pick(Side::Home, -3.5), &result), Some(Outcome::Win));
        assert_eq!(grade_pick(&pick(Side::Away, -3.5), &result), Some(Outcome::Loss));
    }

    #[test]
    fn total_under_hits_when_points_fall_short() {
        let result = final_score(24, 20);
        assert_eq!(grade_pick(&pick(Side::Over, 50.0), &result), Some(Outcome::Loss));
        assert_eq!(grade_pick(&pick(Side::Under, 50.0), &result), Some(Outcome::Win));
    }

    #[test]
    fn home_underdog_line_is_added_to_margin() {
        // Home team getting 7 and winning by 7: adjusted margin is 14.
        let result = final_score(10, 3);
        assert_eq!(grade_pick(&pick(Side::Home, 7.0), &result), Some(Outcome::Win));
        assert_eq!(grade_pick(&pick(Side::Away, 7.0), &result), Some(Outcome::Loss));
    }

    #[test]
    fn away_favorite_covers_on_the_road() {
        // Away team favored by 7.5 (home +7.5) and wins by 10.
        let result = final_score(17, 27);
        assert_eq!(grade_pick(&pick(Side::Away, 7.5), &result), Some(Outcome::Win));
        assert_eq!(grade_pick(&pick(Side::Home, 7.5), &result), Some(Outcome::Loss));
    }

    #[test]
    fn spread_push_for_either_side() {
        for home in 0..40u32 {
            for away in 0..40u32 {
                let line = f64::from(away) - f64::from(home);
                let result = final_score(home, away);
                assert_eq!(grade_pick(&pick(Side::Home, line), &result), Some(Outcome::Push));
                assert_eq!(grade_pick(&pick(Side::Away, line), &result), Some(Outcome::Push));
            }
        }
    }

    #[test]
    fn total_push_for_either_side() {
        for home in 0..40u32 {
            for away in 0..40u32 {
                let line = f64::from(home + away);
                let result = final_score(home, away);
                assert_eq!(grade_pick(&pick(Side::Over, line), &result), Some(Outcome::Push));
                assert_eq!(grade_pick(&pick(Side::Under, line), &result), Some(Outcome::Push));
            }
        }
    }

    #[test]
    fn flipping_the_side_flips_win_and_loss() {
        let lines = [-14.5, -7.0, -3.5, -1.0, 0.0, 2.5, 3.0, 10.5, 41.5, 52.0, 55.5];
        for home in (0..50u32).step_by(3) {
            for away in (0..50u32).step_by(4) {
                let result = final_score(home, away);
                for side in [Side::Home, Side::Over] {
                    for line in lines {
                        let a = grade_pick(&pick(side, line), &result).unwrap();
                        let b = grade_pick(&pick(flipped(side), line), &result).unwrap();
                        match a {
                            Outcome::Push => assert_eq!(b, Outcome::Push),
                            Outcome::Win => assert_eq!(b, Outcome::Loss),
                            Outcome::Loss => assert_eq!(b, Outcome::Win),
                        }
                    }
                }
            }
        }
    }

    #[test]
    fn non_final_result_is_not_gradable() {
        let result = GameResult {
            game_id: "g1".to_string(),
            home_score: 35,
            away_score: 0,
            is_final: false,
        };
        assert_eq!(grade_pick(&pick(Side::Home, -3.5), &result), None);
        assert_eq!(grade_pick(&pick(Side::Under, 50.0), &result), None);
    }

    #[test]
    fn from_raw_resolves_team_names() {
        let p = GradablePick::from_raw("spread", "Georgia", Some(-28.5), "Georgia", "Marshall").unwrap();
        assert_eq!(p.side, Side::Home);
        let p = GradablePick::from_raw("spread", "Marshall", Some(-28.5), "Georgia", "Marshall").unwrap();
        assert_eq!(p.side, Side::Away);
        let p = GradablePick::from_raw("total", "Over", Some(61.5), "Georgia", "Marshall").unwrap();
        assert_eq!(p.side, Side::Over);
    }

    #[test]
    fn from_raw_rejects_malformed_picks() {
        assert_eq!(
            GradablePick::from_raw("moneyline", "Georgia", Some(1.0), "Georgia", "Marshall"),
            Err(GradeError::UnknownPickType("moneyline".to_string()))
        );
        assert!(matches!(
            GradablePick::from_raw("spread", "over", Some(-3.0), "Georgia", "Marshall"),
            Err(GradeError::SelectionMismatch { pick_type: PickType::Spread, .. })
        ));
        assert!(matches!(
            GradablePick::from_raw("total", "Georgia", Some(50.0), "Georgia", "Marshall"),
            Err(GradeError::SelectionMismatch { pick_type: PickType::Total, .. })
        ));
        assert!(matches!(
            GradablePick::from_raw("spread", "Alabama", Some(-3.0), "Georgia", "Marshall"),
            Err(GradeError::UnknownTeam { .. })
        ));
        assert_eq!(
            GradablePick::from_raw("spread", "Georgia", None, "Georgia", "Marshall"),
            Err(GradeError::MissingLine)
        );
        assert!(matches!(
            GradablePick::from_raw("total", "under", Some(f64::NAN), "Georgia", "Marshall"),
            Err(GradeError::NonFiniteLine(_))
        ));
    }

    #[test]
    fn pick_type_follows_selection() {
        assert_eq!(PickType::for_selection("over"), PickType::Total);
        assert_eq!(PickType::for_selection("UNDER"), PickType::Total);
        assert_eq!(PickType::for_selection("Texas A&M"), PickType::Spread);
    }
}
