use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use anyhow::Result;
use async_trait::async_trait;

use crate::models::{GameResult, PickEntry, Scope, SkippedPick, Standing, StandingsReport};
use crate::services::grader::{grade_pick, GradablePick, GradeError, Outcome};
use crate::utils::win_percentage;

/// Everything one standings computation reads, fetched together.
#[derive(Debug, Clone, Default)]
pub struct ScopeData {
    pub picks: Vec<PickEntry>,
    pub results: HashMap<String, GameResult>,
}

/// Read access to picks and results. The SQLite pool implements this; tests
/// use in-memory fixtures.
#[async_trait]
pub trait StandingsSource: Send + Sync {
    async fn load_scope(&self, scope: Scope) -> Result<ScopeData>;
}

/// Load the scope from `source` and rank it. Only a failed read is an error;
/// bad picks end up in `skipped`.
pub async fn standings_for<S>(source: &S, scope: Scope) -> Result<StandingsReport>
where
    S: StandingsSource + ?Sized,
{
    let data = source.load_scope(scope).await?;
    let report = compute_standings(&data.picks, &data.results, scope);

    tracing::info!(
        "Computed {:?} standings: {} ranked users, {} skipped picks",
        scope,
        report.standings.len(),
        report.skipped.len()
    );

    Ok(report)
}

#[derive(Debug, Default)]
struct Tally {
    wins: u32,
    losses: u32,
    pushes: u32,
    pending: u32,
    total_picks: u32,
}

impl Tally {
    fn graded(&self) -> u32 {
        self.wins + self.losses + self.pushes
    }

    fn record(&self) -> String {
        if self.pushes > 0 {
            format!("{}-{}-{}", self.wins, self.losses, self.pushes)
        } else {
            format!("{}-{}", self.wins, self.losses)
        }
    }

    fn into_standing(self, name: String) -> Standing {
        Standing {
            record: self.record(),
            win_percentage: win_percentage(self.wins, self.losses),
            name,
            wins: self.wins,
            losses: self.losses,
            pushes: self.pushes,
            pending: self.pending,
            total_picks: self.total_picks,
        }
    }
}

/// Grade one stored pick. `Ok(None)` means there is no final result yet.
pub fn grade_entry(
    entry: &PickEntry,
    result: Option<&GameResult>,
) -> Result<Option<Outcome>, GradeError> {
    let pick = GradablePick::from_raw(
        &entry.pick_type,
        &entry.selection,
        entry.line,
        &entry.home_team,
        &entry.away_team,
    )?;
    Ok(result.and_then(|r| grade_pick(&pick, r)))
}

/// Grade every pick in scope and rank users by their records.
pub fn compute_standings(
    picks: &[PickEntry],
    results: &HashMap<String, GameResult>,
    scope: Scope,
) -> StandingsReport {
    let mut tallies: BTreeMap<&str, Tally> = BTreeMap::new();
    let mut skipped = Vec::new();

    for entry in picks.iter().filter(|p| scope.contains(p.week)) {
        let tally = tallies.entry(entry.user_name.as_str()).or_default();
        tally.total_picks += 1;

        let outcome = match grade_entry(entry, results.get(&entry.game_id)) {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(
                    "Skipping pick by {} on game {}: {}",
                    entry.user_name,
                    entry.game_id,
                    e
                );
                skipped.push(SkippedPick {
                    user_name: entry.user_name.clone(),
                    game_id: entry.game_id.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        match outcome {
            Some(Outcome::Win) => tally.wins += 1,
            Some(Outcome::Loss) => tally.losses += 1,
            Some(Outcome::Push) => tally.pushes += 1,
            None => tally.pending += 1,
        }
    }

    let mut standings: Vec<Standing> = tallies
        .into_iter()
        .filter(|(_, tally)| tally.graded() > 0)
        .map(|(name, tally)| tally.into_standing(name.to_string()))
        .collect();
    standings.sort_by(rank_order);

    skipped.sort_by(|a, b| {
        a.user_name
            .cmp(&b.user_name)
            .then_with(|| a.game_id.cmp(&b.game_id))
    });

    StandingsReport {
        scope,
        standings,
        skipped,
    }
}

/// Most wins first, then fewest losses, then most pushes; name breaks full ties.
pub fn rank_order(a: &Standing, b: &Standing) -> Ordering {
    b.wins
        .cmp(&a.wins)
        .then_with(|| a.losses.cmp(&b.losses))
        .then_with(|| b.pushes.cmp(&a.pushes))
        .then_with(|| a.name.cmp(&b.name))
}
